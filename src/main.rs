// Entry point for the keystone CLI
// Everything here is glue: parse arguments, load wallets through the repository,
// call into the library, save wallets back.
use clap::Parser;
use data_encoding::HEXLOWER;
use keystone_chain::{
    settle_transfer, validate_address, Block, BlockchainError, Command, FileWalletRepository,
    MiningControl, Opt, Settings, Transaction, WalletRepository, GLOBAL_CONFIG,
};
use log::{error, info, LevelFilter};
use std::process;
use std::time::Duration;

fn main() {
    env_logger::builder().filter_level(LevelFilter::Info).init();

    let opt = Opt::parse();

    if let Err(e) = run(opt) {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn run(opt: Opt) -> Result<(), Box<dyn std::error::Error>> {
    // A settings file replaces the defaults; environment variables still win over it
    if let Some(path) = &opt.config {
        let settings = Settings::from_toml_file(path)?.with_env_overrides()?;
        GLOBAL_CONFIG.replace(settings)?;
        info!("Loaded settings from {}", path.display());
    }
    run_command(opt.command, &FileWalletRepository::from_config())
}

fn run_command(
    command: Command,
    repository: &impl WalletRepository,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Createwallet => {
            let mut wallets = repository.load()?;
            let address = wallets.create_wallet()?;
            repository.save(&wallets)?;
            println!("Your new address: {address}")
        }
        Command::ListAddresses => {
            let wallets = repository.load()?;
            for address in wallets.get_addresses() {
                println!("{address}")
            }
        }
        Command::ValidateAddress { address } => match validate_address(&address) {
            Ok(true) => println!("{address} is valid"),
            Ok(false) => println!("{address} has a bad checksum"),
            Err(e) => println!("{address} is malformed: {e}"),
        },
        Command::GetBalance { address } => {
            if !validate_address(&address)? {
                return Err(format!("Invalid address: {address}").into());
            }
            let wallets = repository.load()?;
            let wallet = wallets.require_wallet(&address)?;
            let funds = wallet.funds()?;
            println!(
                "Balance of '{address}': {} (confirmed {}, reserved {})",
                funds.spendable(),
                funds.balance,
                funds.blocked
            );
        }
        Command::Mine { address, timeout } => {
            let coinbase = Transaction::new_coinbase_tx(&address)?;
            let mut control = MiningControl::new();
            if let Some(secs) = timeout {
                control = control.with_timeout(Duration::from_secs(secs));
            }

            let block = Block::new_block(
                vec![],
                &[coinbase.clone()],
                GLOBAL_CONFIG.get_difficulty(),
                &control,
            )?;
            println!("Nonce: {}", block.get_nonce());
            println!("Hash: {}", block.get_hash_hex());

            // Settlement for local wallets: credit the subsidy right away
            let wallets = repository.load()?;
            if wallets.get_wallet(&address).is_some() {
                settle_transfer(&coinbase, &wallets)?;
                repository.save(&wallets)?;
                println!("Credited {} to {address}", coinbase.get_value());
            }
        }
        Command::Send {
            from,
            to,
            amount,
            discard,
        } => {
            let wallets = repository.load()?;
            let transaction = Transaction::new_transfer_between(&wallets, &from, &to, amount)?;
            if !transaction.verify()? {
                transaction.refund(&wallets)?;
                repository.save(&wallets)?;
                return Err(BlockchainError::Transaction(
                    "Freshly signed transaction failed verification".to_string(),
                )
                .into());
            }

            println!("Transaction: {}", HEXLOWER.encode(transaction.get_id()));
            println!("{}", serde_json::to_string_pretty(&transaction)?);

            if discard {
                transaction.refund(&wallets)?;
                println!("Discarded, reservation refunded");
            }
            repository.save(&wallets)?;
            println!("Success!")
        }
    }
    Ok(())
}
