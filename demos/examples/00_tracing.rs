use mercato::{BarInterval, HistoryPeriod, HistoryQuery};
use mercato_demos::common::simple_service;
use tracing_subscriber::fmt::format::FmtSpan;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Suggested: RUST_LOG=info,mercato=debug
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .try_init();

    let svc = simple_service()?;

    let _ = svc.get_quote("AAPL").await?;
    // Served from cache; the call event reports cache_hit=true.
    let _ = svc.get_quote("AAPL").await?;

    let _ = svc
        .get_history("AAPL", HistoryQuery::period(HistoryPeriod::M6, BarInterval::D1))
        .await?;

    // Unknown symbols walk the whole chain and surface as NotFound.
    if let Err(e) = svc.get_quote("NOPE").await {
        tracing::warn!(error = %e, "expected failure");
    }

    Ok(())
}
