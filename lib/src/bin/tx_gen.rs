use ledgerlib::types::Transaction;
use ledgerlib::util::Saveable;
use std::env;
use std::process::exit;
fn main() {
    let path = if let Some(arg) = env::args().nth(1) {
        arg
    } else {
        eprintln!("Usage: tx_gen <output_transaction_file_path>");
        exit(1);
    };
    let transaction = Transaction::originate("tx-gen", br#"{"reading":42}"#.to_vec());
    transaction
        .save_to_file(path)
        .expect("Failed to save transaction");
}
