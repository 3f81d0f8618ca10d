//! Fixed-rate conversion of ad-side money fields into USD.

use crate::domain::AdRow;
use std::collections::HashMap;
use tracing::warn;

pub const BASE_CURRENCY: &str = "USD";

/// Units of each currency per one USD.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeRates {
    rates: HashMap<String, f64>,
}

impl ExchangeRates {
    pub fn new(rates: HashMap<String, f64>) -> Self {
        let rates = rates
            .into_iter()
            .map(|(code, rate)| (code.trim().to_ascii_uppercase(), rate))
            .collect();
        Self { rates }
    }

    /// Parse `CODE=rate` pairs separated by commas, e.g. `CNY=7.2,EUR=0.92`.
    pub fn parse(spec: &str) -> Result<Self, String> {
        let mut rates = HashMap::new();
        for pair in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (code, rate) = pair
                .split_once('=')
                .ok_or_else(|| format!("expected CODE=rate, got {}", pair))?;
            let rate: f64 = rate
                .trim()
                .parse()
                .map_err(|_| format!("invalid rate for {}", code.trim()))?;
            if !(rate.is_finite() && rate > 0.0) {
                return Err(format!("rate for {} must be positive", code.trim()));
            }
            rates.insert(code.to_string(), rate);
        }
        Ok(Self::new(rates))
    }

    pub fn rate(&self, code: &str) -> Option<f64> {
        let code = code.trim().to_ascii_uppercase();
        if code == BASE_CURRENCY {
            return Some(1.0);
        }
        self.rates.get(&code).copied()
    }
}

impl Default for ExchangeRates {
    fn default() -> Self {
        Self::new(HashMap::from([
            ("CNY".to_string(), 7.2),
            ("EUR".to_string(), 0.92),
            ("GBP".to_string(), 0.79),
            ("HKD".to_string(), 7.8),
            ("JPY".to_string(), 150.0),
        ]))
    }
}

/// Result of [`apply_exchange_rate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Conversion {
    /// Row was already in USD or carried no currency.
    Unchanged,
    Converted { rate: f64 },
    /// Currency code had no configured rate; values left as-is.
    UnknownCurrency,
}

/// Divide cost, CPC, max CPC and budget by the row currency's rate.
///
/// A converted row is relabelled `USD`, so applying this twice is a no-op.
pub fn apply_exchange_rate(row: &mut AdRow, rates: &ExchangeRates) -> Conversion {
    let Some(code) = row.currency.as_deref().map(str::trim).filter(|c| !c.is_empty()) else {
        return Conversion::Unchanged;
    };
    if code.eq_ignore_ascii_case(BASE_CURRENCY) {
        return Conversion::Unchanged;
    }
    let Some(rate) = rates.rate(code) else {
        warn!(
            currency = %code,
            campaign = %row.campaign_name,
            "No exchange rate configured, keeping amounts unconverted"
        );
        return Conversion::UnknownCurrency;
    };

    row.cost /= rate;
    row.cpc /= rate;
    row.budget /= rate;
    row.max_cpc = row.max_cpc.map(|m| m / rate);
    row.currency = Some(BASE_CURRENCY.to_string());
    Conversion::Converted { rate }
}
