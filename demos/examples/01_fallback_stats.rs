use std::sync::Arc;

use mercato::{JsonLineSink, MarketDataServiceBuilder, ServiceConfig};
use mercato_demos::common::mock_factory;

const CONFIG: &str = r#"{
    "provider_timeout_ms": 2000,
    "providers": [
        { "name": "alpha", "priority": 10,
          "credentials": { "extra": { "fail": "true" } } },
        { "name": "bravo", "priority": 20, "cache_ttl_seconds": { "quote": 30 } },
        { "name": "charlie", "priority": 30 }
    ]
}"#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServiceConfig::from_json_str(CONFIG)?;
    // Every finished call is echoed as one JSON line.
    let svc = MarketDataServiceBuilder::new()
        .with_config(config, &mock_factory(&["alpha", "bravo", "charlie"]))?
        .with_call_sink(Arc::new(JsonLineSink::stdout()))
        .build()?;

    // alpha always fails, so bravo serves and the call counts as a fallback.
    for symbol in ["AAPL", "MSFT", "AAPL"] {
        let q = svc.get_quote(symbol).await?;
        println!("{symbol}: {} via {}", q.price, q.source);
    }
    let _ = svc.get_ticker_data("TSLA").await?;

    println!("{}", serde_json::to_string_pretty(&svc.get_stats())?);

    let p = svc.get_latency_percentiles(Some("bravo"));
    println!("bravo p50={:.1}ms p99={:.1}ms", p.p50, p.p99);
    Ok(())
}
