use mercato_core::{DataRequest, History, HistoryQuery};

use crate::MarketDataService;
use crate::mercato_router_method;

impl MarketDataService {
    mercato_router_method! {
        /// Fetch historical bars for a window and interval.
        ///
        /// Behavior and trade-offs:
        /// - The query is part of the cache key, so different windows never share entries.
        /// - Only one provider answers; series are not merged across providers.
        method: get_history(symbol: &str, query: HistoryQuery) -> History,
        with: get_history_with,
        request: DataRequest::History { symbol: symbol.to_string(), query }
    }
}
