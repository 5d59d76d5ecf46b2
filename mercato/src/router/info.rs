use mercato_core::{CompanyInfo, DataRequest, Fundamentals, MercatoError, TickerData};

use crate::MarketDataService;
use crate::mercato_router_method;

impl MarketDataService {
    mercato_router_method! {
        /// Fetch the company profile.
        method: get_info(symbol: &str) -> CompanyInfo,
        with: get_info_with,
        request: DataRequest::Info { symbol: symbol.to_string() }
    }

    mercato_router_method! {
        /// Fetch valuation ratios and fundamentals.
        method: get_fundamentals(symbol: &str) -> Fundamentals,
        with: get_fundamentals_with,
        request: DataRequest::Fundamentals { symbol: symbol.to_string() }
    }

    /// Build the flattened quote + profile + fundamentals record.
    ///
    /// Behavior and trade-offs:
    /// - Runs the three requests concurrently through the normal pipeline, so
    ///   each part is cached and deduplicated on its own.
    /// - Parts that fail are left empty; `sources` names the provider of each part
    ///   that was merged.
    ///
    /// # Errors
    /// Returns the quote's error only when all three parts fail.
    pub async fn get_ticker_data(&self, symbol: &str) -> Result<TickerData, MercatoError> {
        let (quote, info, fundamentals) = tokio::join!(
            self.get_quote(symbol),
            self.get_info(symbol),
            self.get_fundamentals(symbol),
        );
        if let (Err(e), Err(_), Err(_)) = (&quote, &info, &fundamentals) {
            return Err(e.clone());
        }
        for (part, res) in [
            ("info", info.as_ref().err()),
            ("fundamentals", fundamentals.as_ref().err()),
            ("quote", quote.as_ref().err()),
        ] {
            if let Some(e) = res {
                tracing::debug!(target: "mercato::service", symbol, part, error = %e, "ticker part missing");
            }
        }
        let symbol = symbol.trim().to_ascii_uppercase();
        Ok(TickerData::merge(
            symbol,
            quote.as_ref().ok(),
            info.as_ref().ok(),
            fundamentals.as_ref().ok(),
        ))
    }
}
