//! Core integrity layer
//!
//! The transaction protocol, balance reservation, and the proof-of-work
//! engine together with the minimal block it runs over.

pub mod block;
pub mod mining;
pub mod proof_of_work;
pub mod reservation;
pub mod transaction;

pub use block::Block;
pub use mining::MiningControl;
pub use proof_of_work::{PowSubject, ProofOfWork};
pub use reservation::{refund, release_transfer, reserve_transfer, settle_transfer};
pub use transaction::Transaction;
