//! # CLI Commands
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs        ◄─── You are here (dispatch, input reading)
//! ├── calculate.rs  ◄─── Quote totals
//! ├── formula.rs    ◄─── eval
//! ├── rules.rs      ◄─── Calculated-field rules
//! ├── estimate.rs   ◄─── Built-in estimates
//! └── config.rs     ◄─── config show | path | init
//! ```
//!
//! Every command returns its output as a `String`; `run()` prints it.
//! Keeping stdout out of the commands lets tests assert on exact output.

pub mod calculate;
pub mod config;
pub mod estimate;
pub mod formula;
pub mod rules;

use std::io::Read;

use crate::error::CliResult;

/// Reads a whole input file, or stdin when `source` is `-`.
pub fn read_input(source: &str) -> CliResult<String> {
    if source == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(std::fs::read_to_string(source)?)
    }
}
