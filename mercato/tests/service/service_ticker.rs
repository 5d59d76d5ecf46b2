use std::sync::Arc;

use mercato::{DataType, DataTypes, MercatoError, NaiveDate};
use mercato_mock::MockProvider;
use rust_decimal::Decimal;

use crate::helpers::{AAPL, MISSING, XYZ, erroring, mock, service};

#[tokio::test]
async fn ticker_data_merges_all_parts() {
    let a = mock("a");
    let svc = service(&[(&a, 1)]);

    let t = svc.get_ticker_data("aapl").await.unwrap();
    assert_eq!(t.symbol, AAPL);
    assert_eq!(t.price, Some(Decimal::new(15_000, 2)));
    assert_eq!(t.name.as_deref(), Some("Apple Inc."));
    assert!(t.pe_ratio.is_some());
    assert_eq!(t.sources.len(), 3);
    assert_eq!(a.calls(DataType::Quote), 1);
    assert_eq!(a.calls(DataType::Info), 1);
    assert_eq!(a.calls(DataType::Fundamentals), 1);
}

#[tokio::test]
async fn ticker_data_tolerates_missing_parts() {
    let quotes = Arc::new(MockProvider::new("quotes").with_data_types(DataTypes::QUOTE));
    let profile = erroring("profile", DataType::Fundamentals, MercatoError::provider("profile", "down"));
    let svc = service(&[(&quotes, 1), (&profile, 2)]);

    // XYZ has a quote fixture but no company profile.
    let t = svc.get_ticker_data(XYZ).await.unwrap();
    assert_eq!(t.price, Some(Decimal::new(6_125, 2)));
    assert!(t.name.is_none());
    assert!(t.pe_ratio.is_none());
    assert_eq!(t.sources.get(&DataType::Quote).map(String::as_str), Some("quotes"));
    assert_eq!(t.sources.len(), 1);
}

#[tokio::test]
async fn ticker_data_fails_when_nothing_is_available() {
    let a = mock("a");
    let svc = service(&[(&a, 1)]);

    let err = svc.get_ticker_data(MISSING).await.unwrap_err();
    assert!(matches!(err, MercatoError::NotFound { .. }), "{err:?}");
}

#[tokio::test]
async fn remaining_typed_operations_route_through_the_service() {
    let a = mock("a");
    let svc = service(&[(&a, 1)]);

    let exp = svc.get_options_expirations(AAPL).await.unwrap();
    let first = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
    assert!(exp.expirations.contains(&first));

    let chain = svc.get_options_chain(AAPL, first).await.unwrap();
    assert_eq!(chain.source, "a");
    let unlisted = NaiveDate::from_ymd_opt(2024, 5, 17).unwrap();
    assert!(matches!(
        svc.get_options_chain(AAPL, unlisted).await.unwrap_err(),
        MercatoError::NotFound { .. }
    ));

    assert!(!svc.get_fundamentals(AAPL).await.unwrap().source.is_empty());
    assert_eq!(svc.get_earnings(AAPL).await.unwrap().source, "a");

    let series = svc.get_macro("dgs10").await.unwrap();
    assert_eq!(series.series_id, "DGS10");
    assert!(!series.observations.is_empty());
}
