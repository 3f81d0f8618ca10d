//! Cell-level normalization: numbers, percentages, dates, currency.

pub mod currency;
pub mod date;
pub mod number;

pub use currency::{apply_exchange_rate, Conversion, ExchangeRates};
pub use date::{to_date, to_datetime};
pub use number::{resolve_separators, share_percent, to_number, to_percent, try_number};
