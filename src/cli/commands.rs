use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "keystone")]
pub struct Opt {
    #[arg(long = "config", global = true, help = "TOML settings file")]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(name = "createwallet", about = "Create a new wallet")]
    Createwallet,
    #[command(name = "listaddresses", about = "Print local wallet addresses")]
    ListAddresses,
    #[command(name = "validateaddress", about = "Check an address checksum")]
    ValidateAddress {
        #[arg(help = "The address to check")]
        address: String,
    },
    #[command(
        name = "getbalance",
        about = "Get the spendable amount of a local wallet"
    )]
    GetBalance {
        #[arg(help = "The wallet address")]
        address: String,
    },
    #[command(name = "mine", about = "Mine a coinbase block paying ADDRESS")]
    Mine {
        #[arg(help = "The address to send the block reward to")]
        address: String,
        #[arg(long = "timeout", help = "Give up after this many seconds")]
        timeout: Option<u64>,
    },
    #[command(name = "send", about = "Construct and sign a transfer between local wallets")]
    Send {
        #[arg(help = "Source wallet address")]
        from: String,
        #[arg(help = "Destination wallet address")]
        to: String,
        #[arg(help = "Amount to send")]
        amount: i64,
        #[arg(long = "discard", help = "Refund the reservation right after construction")]
        discard: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_send() {
        let opt = Opt::try_parse_from(["keystone", "send", "A", "B", "5", "--discard"]).unwrap();
        match opt.command {
            Command::Send {
                from,
                to,
                amount,
                discard,
            } => {
                assert_eq!((from.as_str(), to.as_str(), amount, discard), ("A", "B", 5, true));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_mine_with_timeout_and_config() {
        let opt = Opt::try_parse_from([
            "keystone", "mine", "ADDR", "--timeout", "30", "--config", "k.toml",
        ])
        .unwrap();
        assert_eq!(opt.config, Some(PathBuf::from("k.toml")));
        assert!(matches!(
            opt.command,
            Command::Mine { timeout: Some(30), .. }
        ));
    }

    #[test]
    fn test_rejects_unknown_command() {
        assert!(Opt::try_parse_from(["keystone", "printchain"]).is_err());
    }
}
