use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use crate::error::{EtlError, Result};

const CURRENCY_COLUMN: &str = "Currency";
const RATE_COLUMN: &str = "Rate";

/// Target currencies derived from the USD base value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Currency {
    Gbp,
    Eur,
    Inr,
}

impl Currency {
    pub fn code(self) -> &'static str {
        match self {
            Currency::Gbp => "GBP",
            Currency::Eur => "EUR",
            Currency::Inr => "INR",
        }
    }
}

/// Currency code → units per US dollar.
#[derive(Debug, Clone, Default)]
pub struct ExchangeRates {
    rates: HashMap<String, f64>,
}

/// Rates for the three target currencies, resolved up front.
#[derive(Debug, Clone, Copy)]
pub struct TargetRates {
    pub gbp: f64,
    pub eur: f64,
    pub inr: f64,
}

impl ExchangeRates {
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Header must name both `Currency` and `Rate`; checked before any row is read.
    /// Each currency code may appear once.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = rdr.headers()?.clone();
        let position = |name: &'static str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or(EtlError::RateSchema { missing: name })
        };
        let code_idx = position(CURRENCY_COLUMN)?;
        let rate_idx = position(RATE_COLUMN)?;

        let mut rates = HashMap::new();
        for record in rdr.records() {
            let record = record?;
            let code = record.get(code_idx).unwrap_or_default().to_string();
            let raw = record.get(rate_idx).unwrap_or_default();
            let rate = raw
                .parse::<f64>()
                .ok()
                .filter(|r| r.is_finite() && *r > 0.0)
                .ok_or_else(|| EtlError::InvalidRate {
                    code: code.clone(),
                    value: raw.to_string(),
                })?;
            match rates.entry(code) {
                Entry::Occupied(e) => {
                    return Err(EtlError::DuplicateCurrency {
                        code: e.key().clone(),
                    })
                }
                Entry::Vacant(e) => {
                    e.insert(rate);
                }
            }
        }
        Ok(ExchangeRates { rates })
    }

    pub fn get(&self, currency: Currency) -> Result<f64> {
        self.rates
            .get(currency.code())
            .copied()
            .ok_or(EtlError::CurrencyLookup {
                code: currency.code(),
            })
    }

    pub fn targets(&self) -> Result<TargetRates> {
        Ok(TargetRates {
            gbp: self.get(Currency::Gbp)?,
            eur: self.get(Currency::Eur)?,
            inr: self.get(Currency::Inr)?,
        })
    }

    pub fn currency_count(&self) -> usize {
        self.rates.len()
    }
}

impl FromIterator<(String, f64)> for ExchangeRates {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        ExchangeRates {
            rates: iter.into_iter().collect(),
        }
    }
}
