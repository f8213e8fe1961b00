//! Balance reservation.
//!
//! Constructing a transfer holds back `amount` from the sender (`blocked -=
//! amount`) and tentatively credits the receiver (`blocked += amount`) until an
//! external settlement moves the value into confirmed balances. This is a
//! per-address counter model, not a transaction-graph ledger: it prevents
//! concurrent constructions from overcommitting a wallet, nothing more.
//!
//! Two wallets are always locked in address order, so concurrent A→B and B→A
//! transfers cannot deadlock.

use crate::core::Transaction;
use crate::error::{BlockchainError, Result};
use crate::wallet::{Funds, Wallet, Wallets};
use std::sync::MutexGuard;

type FundsGuard<'a> = MutexGuard<'a, Funds>;

/// Lock the funds of `from` and `to`, returning the guards in that role order.
/// A self-transfer yields a single guard.
fn lock_pair<'a>(from: &'a Wallet, to: &'a Wallet) -> Result<(FundsGuard<'a>, Option<FundsGuard<'a>>)> {
    if from.get_address() == to.get_address() {
        return Ok((from.lock_funds()?, None));
    }
    if from.get_address() < to.get_address() {
        let from_funds = from.lock_funds()?;
        let to_funds = to.lock_funds()?;
        Ok((from_funds, Some(to_funds)))
    } else {
        let to_funds = to.lock_funds()?;
        let from_funds = from.lock_funds()?;
        Ok((from_funds, Some(to_funds)))
    }
}

/// Apply `sender(funds)` and `receiver(funds)` to the two wallets under their
/// locks. Both results are computed before either wallet is written.
fn update_pair<S, R>(from: &Wallet, to: &Wallet, sender: S, receiver: R) -> Result<()>
where
    S: Fn(Funds) -> Result<Funds>,
    R: Fn(Funds) -> Result<Funds>,
{
    let (mut from_funds, to_funds) = lock_pair(from, to)?;
    match to_funds {
        Some(mut to_funds) => {
            let next_from = sender(*from_funds)?;
            let next_to = receiver(*to_funds)?;
            *from_funds = next_from;
            *to_funds = next_to;
        }
        None => {
            *from_funds = receiver(sender(*from_funds)?)?;
        }
    }
    Ok(())
}

/// Check that `from` can spend `amount` and reserve it on both wallets, all
/// under the wallets' locks. Nothing is mutated on failure.
pub fn reserve_transfer(from: &Wallet, to: &Wallet, amount: i64) -> Result<()> {
    if amount <= 0 {
        return Err(BlockchainError::Transaction(format!(
            "Amount must be positive, got {amount}"
        )));
    }

    update_pair(
        from,
        to,
        |funds| {
            let available = funds.spendable();
            if available < amount {
                log::warn!(
                    "Rejecting transfer of {amount} from {}: only {available} spendable",
                    from.get_address()
                );
                return Err(BlockchainError::InsufficientFunds {
                    required: amount,
                    available,
                });
            }
            funds.reserved(amount)
        },
        |funds| funds.reserved(-amount),
    )?;
    log::debug!(
        "Reserved {amount} from {} to {}",
        from.get_address(),
        to.get_address()
    );
    Ok(())
}

/// Exact inverse of [`reserve_transfer`], without a funds check.
pub fn release_transfer(from: &Wallet, to: &Wallet, amount: i64) -> Result<()> {
    update_pair(
        from,
        to,
        |funds| funds.reserved(-amount),
        |funds| funds.reserved(amount),
    )?;
    log::debug!(
        "Released {amount} from {} to {}",
        from.get_address(),
        to.get_address()
    );
    Ok(())
}

fn transfer_wallets(
    tx: &Transaction,
    wallets: &Wallets,
) -> Result<(std::sync::Arc<Wallet>, std::sync::Arc<Wallet>)> {
    Ok((
        wallets.require_wallet(tx.get_from())?,
        wallets.require_wallet(tx.get_to())?,
    ))
}

/// Reverse both reservations of a transfer that is being discarded. Each
/// constructed transfer can be refunded or settled once; later attempts fail
/// without touching either wallet.
pub fn refund(tx: &Transaction, wallets: &Wallets) -> Result<()> {
    if tx.is_coinbase() {
        return Err(BlockchainError::Transaction(
            "Coinbase transactions hold no reservation to refund".to_string(),
        ));
    }
    let (from, to) = transfer_wallets(tx, wallets)?;
    from.take_reservation(tx.get_id())?;
    if let Err(e) = release_transfer(&from, &to, tx.get_value()) {
        from.track_reservation(tx.get_id())?;
        return Err(e);
    }
    log::info!("Refunded transfer of {} from {}", tx.get_value(), tx.get_from());
    Ok(())
}

/// Turn a mined transaction into confirmed balance changes.
///
/// A transfer moves its value out of the sender's balance and into the
/// receiver's while releasing both reservations, so spendable amounts do not
/// change. A coinbase credits its recipient directly.
pub fn settle_transfer(tx: &Transaction, wallets: &Wallets) -> Result<()> {
    if tx.is_coinbase() {
        return wallets.require_wallet(tx.get_to())?.credit(tx.get_value());
    }
    let value = tx.get_value();
    let (from, to) = transfer_wallets(tx, wallets)?;
    from.take_reservation(tx.get_id())?;
    if let Err(e) = update_pair(
        &from,
        &to,
        |funds| funds.settled(-value),
        |funds| funds.settled(value),
    ) {
        from.track_reservation(tx.get_id())?;
        return Err(e);
    }
    log::info!(
        "Settled transfer of {value} from {} to {}",
        tx.get_from(),
        tx.get_to()
    );
    Ok(())
}
