pub mod company;
pub mod history;
pub mod macro_series;
pub mod options;
pub mod quotes;

use chrono::{DateTime, NaiveDate, Utc};

use mercato_core::{DataRequest, MarketData, MercatoError};

/// Fixture lookup for a normalized request, attributed to `source`.
pub fn lookup(source: &str, req: &DataRequest) -> Result<MarketData, MercatoError> {
    let found = match req {
        DataRequest::Quote { symbol } => quotes::by_symbol(source, symbol).map(MarketData::from),
        DataRequest::History { symbol, query } => {
            history::by_symbol(source, symbol, query.interval).map(MarketData::from)
        }
        DataRequest::Info { symbol } => company::info(source, symbol).map(MarketData::from),
        DataRequest::Fundamentals { symbol } => {
            company::fundamentals(source, symbol).map(MarketData::from)
        }
        DataRequest::OptionsChain { symbol, expiry } => {
            options::chain(source, symbol, *expiry).map(MarketData::from)
        }
        DataRequest::OptionsExpirations { symbol } => {
            options::expirations(source, symbol).map(MarketData::from)
        }
        DataRequest::Earnings { symbol } => company::earnings(source, symbol).map(MarketData::from),
        DataRequest::Macro { series_id } => {
            macro_series::by_id(source, series_id).map(MarketData::from)
        }
    };
    found.ok_or_else(|| MercatoError::not_found(req.describe()))
}

fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

fn midnight(y: i32, m: u32, d: u32) -> Option<DateTime<Utc>> {
    Some(date(y, m, d)?.and_hms_opt(0, 0, 0)?.and_utc())
}
