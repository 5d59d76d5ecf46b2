use mercato_core::{DataRequest, NaiveDate, OptionsChain, OptionsExpirations};

use crate::MarketDataService;
use crate::mercato_router_method;

impl MarketDataService {
    mercato_router_method! {
        /// Fetch the option chain for one expiry.
        ///
        /// Behavior and trade-offs:
        /// - Chains are keyed by expiry; the short default TTL keeps greeks fresh.
        method: get_options_chain(symbol: &str, expiry: NaiveDate) -> OptionsChain,
        with: get_options_chain_with,
        request: DataRequest::OptionsChain { symbol: symbol.to_string(), expiry }
    }

    mercato_router_method! {
        /// Fetch the listed option expirations.
        method: get_options_expirations(symbol: &str) -> OptionsExpirations,
        with: get_options_expirations_with,
        request: DataRequest::OptionsExpirations { symbol: symbol.to_string() }
    }
}
