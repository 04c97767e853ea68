//! # haulwise-quote Entry Point
//!
//! Setup and command dispatch live in lib.rs for testability.

fn main() {
    if let Err(err) = haulwise_quote::run() {
        eprintln!("{}", err.report());
        tracing::debug!(code = err.code(), error = ?err, "Command failed");
        std::process::exit(1);
    }
}
