use mercato_core::{DataRequest, MercatoError, Quote};

use crate::MarketDataService;
use crate::mercato_router_method;

impl MarketDataService {
    mercato_router_method! {
        /// Fetch a point-in-time quote.
        ///
        /// Behavior and trade-offs:
        /// - Served from cache while the answering provider's quote TTL lasts.
        /// - Concurrent identical calls share one upstream fetch.
        method: get_quote(symbol: &str) -> Quote,
        with: get_quote_with,
        request: DataRequest::Quote { symbol: symbol.to_string() }
    }

    /// Fetch quotes for several symbols.
    ///
    /// Behavior and trade-offs:
    /// - Runs single-quote requests concurrently; each symbol has its own cache
    ///   entry and dedup key.
    /// - Returns `(quotes, failures)` so one bad symbol does not fail the batch.
    pub async fn get_quotes(&self, symbols: &[&str]) -> (Vec<Quote>, Vec<(String, MercatoError)>) {
        if symbols.is_empty() {
            return (vec![], vec![]);
        }

        let tasks = symbols.iter().map(|s| async move { (*s, self.get_quote(s).await) });
        let results = futures::future::join_all(tasks).await;

        let mut ok_quotes: Vec<Quote> = Vec::new();
        let mut failures: Vec<(String, MercatoError)> = Vec::new();
        for (symbol, res) in results {
            match res {
                Ok(q) => ok_quotes.push(q),
                Err(e) => failures.push((symbol.to_string(), e)),
            }
        }
        (ok_quotes, failures)
    }
}
