//! `estimate`: built-in estimate formulas with the configured coefficients.

use haulwise_core::money::format_currency;
use haulwise_core::PricingConfig;

use crate::cli::EstimateCommand;
use crate::error::CliResult;

pub fn execute(command: &EstimateCommand, config: &PricingConfig) -> CliResult<String> {
    let coefficients = &config.estimates;
    let money = |amount| format_currency(amount, &config.currency);

    let output = match *command {
        EstimateCommand::Volume { rooms } => {
            format!("{} cu ft", coefficients.packed_volume(rooms)?.normalize())
        }
        EstimateCommand::Moving { volume, distance } => {
            money(coefficients.moving_cost(volume, distance)?)
        }
        EstimateCommand::Labor { hours, workers } => money(coefficients.labor_cost(hours, workers)?),
        EstimateCommand::Storage { cubic_feet, months } => {
            money(coefficients.storage_cost(cubic_feet, months)?)
        }
    };
    Ok(output)
}
