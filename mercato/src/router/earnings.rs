use mercato_core::{DataRequest, Earnings, MacroSeries};

use crate::MarketDataService;
use crate::mercato_router_method;

impl MarketDataService {
    mercato_router_method! {
        /// Fetch the earnings calendar and recent history.
        method: get_earnings(symbol: &str) -> Earnings,
        with: get_earnings_with,
        request: DataRequest::Earnings { symbol: symbol.to_string() }
    }

    mercato_router_method! {
        /// Fetch a macroeconomic series by id (e.g. `DGS10`).
        method: get_macro(series_id: &str) -> MacroSeries,
        with: get_macro_with,
        request: DataRequest::Macro { series_id: series_id.to_string() }
    }
}
