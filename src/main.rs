use clap::Parser;
use data_encoding::HEXLOWER;
use hashlink_ledger::{
    Block, Blockchain, Command, Config, Opt, ProofOfWork, Transaction, UTXOSet,
};
use log::{error, LevelFilter};
use std::process;

fn main() {
    env_logger::builder()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let opt = Opt::parse();

    if let Err(e) = run_command(opt) {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn run_command(opt: Opt) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load(opt.config.as_deref())?;

    match opt.command {
        Command::Createchain { address } => {
            Blockchain::create_blockchain(&address, &config)?;
            println!("Done!");
        }
        Command::GetBalance { address } => {
            let utxo_set = UTXOSet::new(Blockchain::new_blockchain(&config)?);
            let balance = utxo_set.get_balance(&address)?;
            println!("Balance of {address}: {balance}");
        }
        Command::Send { from, to, amount } => {
            let blockchain = Blockchain::new_blockchain(&config)?;
            let utxo_set = UTXOSet::new(blockchain.clone());
            let transaction = Transaction::new_utxo_transaction(&from, &to, amount, &utxo_set)?;
            blockchain.add_block(&[transaction])?;
            println!("Success!");
        }
        Command::Printchain => {
            let blockchain = Blockchain::new_blockchain(&config)?;
            for block in blockchain.iterator() {
                print_block(&block?, &blockchain);
            }
        }
        Command::Verifychain => {
            let length = Blockchain::new_blockchain(&config)?.verify_chain()?;
            println!("Chain valid: {length} blocks");
        }
    }
    Ok(())
}

fn print_block(block: &Block, blockchain: &Blockchain) {
    println!("Prev. hash: {}", HEXLOWER.encode(block.get_pre_block_hash()));
    println!("Hash: {}", block.get_hash_hex());
    println!("Nonce: {}", block.get_nonce());

    for tx in block.get_transactions() {
        println!("- Transaction {}", tx.get_id_hex());
        if !tx.is_coinbase() {
            for input in tx.get_vin() {
                println!(
                    "-- Input txid = {}, vout = {}, from = {}",
                    HEXLOWER.encode(input.get_txid()),
                    input.get_vout(),
                    input.get_unlock_proof(),
                );
            }
        }
        for output in tx.get_vout() {
            println!(
                "-- Output value = {}, to = {}",
                output.get_value(),
                output.get_owner()
            );
        }
    }
    println!(
        "PoW: {}",
        ProofOfWork::validate(block, blockchain.get_settings())
    );
    println!();
}
