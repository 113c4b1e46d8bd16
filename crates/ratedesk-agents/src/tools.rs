//! Mocked rate tools. Each returns a random rate in tenths of a percent.

use rand::Rng;
use rust_decimal::Decimal;
use tracing::info;

/// A zero-argument tool that quotes an interest rate.
pub trait RateTool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn call(&self) -> Decimal;
}

/// Uniform draw from `1..=max_tenths`, scaled to one decimal place.
fn random_tenths(max_tenths: i64) -> Decimal {
    let tenths = rand::thread_rng().gen_range(1..=max_tenths);
    Decimal::new(tenths, 1)
}

/// Saving account rate: 0.1 to 0.7.
#[derive(Debug, Clone, Copy, Default)]
pub struct SavingInterestRate;

impl RateTool for SavingInterestRate {
    fn name(&self) -> &'static str {
        "saving_interest_rate"
    }

    fn description(&self) -> &'static str {
        "Return the saving interest rate."
    }

    fn call(&self) -> Decimal {
        let rate = random_tenths(7);
        info!(tool = self.name(), %rate, "[TOOL]");
        rate
    }
}

/// CD rate: 0.1 to 0.4.
#[derive(Debug, Clone, Copy, Default)]
pub struct CdInterestRate;

impl RateTool for CdInterestRate {
    fn name(&self) -> &'static str {
        "cd_interest_rate"
    }

    fn description(&self) -> &'static str {
        "Return the CD interest rate."
    }

    fn call(&self) -> Decimal {
        let rate = random_tenths(4);
        info!(tool = self.name(), %rate, "[TOOL]");
        rate
    }
}
