use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "hashlink-ledger", about = "Single-node proof-of-work ledger")]
pub struct Opt {
    #[arg(long, global = true, help = "Path to a TOML configuration file")]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    #[command(name = "createchain", about = "Create a new blockchain")]
    Createchain {
        #[arg(help = "The address to send the genesis subsidy to")]
        address: String,
    },
    #[command(name = "getbalance", about = "Get the balance of an address")]
    GetBalance {
        #[arg(help = "The address to query")]
        address: String,
    },
    #[command(name = "send", about = "Send value between addresses")]
    Send {
        #[arg(help = "Source address")]
        from: String,
        #[arg(help = "Destination address")]
        to: String,
        #[arg(help = "Amount to send")]
        amount: u64,
    },
    #[command(name = "printchain", about = "Print all blocks in the blockchain")]
    Printchain,
    #[command(name = "verifychain", about = "Check proof-of-work of every block")]
    Verifychain,
}
