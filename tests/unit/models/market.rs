//! Unit tests for market update payloads

use serde_json::json;
use sigflow::models::{AssetContext, MarketUpdate};

#[test]
fn test_asset_context_parses_decimal_strings() {
    let ctx = AssetContext {
        open_interest: Some("1100000".to_string()),
        funding: Some("-0.0002".to_string()),
        mark_px: Some("64250.5".to_string()),
        ..Default::default()
    };

    assert_eq!(ctx.open_interest(), Some(1_100_000.0));
    assert_eq!(ctx.funding_rate(), Some(-0.0002));
    assert_eq!(ctx.mark_price(), Some(64250.5));
}

#[test]
fn test_absent_fields_read_as_none() {
    let ctx = AssetContext::default();

    assert_eq!(ctx.open_interest(), None);
    assert_eq!(ctx.funding_rate(), None);
    assert_eq!(ctx.mid_price(), None);
    assert_eq!(ctx.day_notional_volume(), None);
}

#[test]
fn test_unparseable_fields_read_as_none() {
    let ctx = AssetContext {
        open_interest: Some("not-a-number".to_string()),
        funding: Some("".to_string()),
        ..Default::default()
    };

    assert_eq!(ctx.open_interest(), None);
    assert_eq!(ctx.funding_rate(), None);
}

#[test]
fn test_update_decodes_wire_payload() {
    let update: MarketUpdate = serde_json::from_value(json!({
        "asset_ctx": {
            "openInterest": "900000.5",
            "funding": "0.0001",
            "markPx": "64250.0",
            "oraclePx": "64251.5",
            "midPx": "64250.75",
            "premium": "0.00002",
            "dayNtlVlm": "1500000000"
        }
    }))
    .expect("decode update");

    assert_eq!(update.asset_ctx.open_interest(), Some(900_000.5));
    assert_eq!(update.asset_ctx.funding_rate(), Some(0.0001));
    assert_eq!(update.asset_ctx.oracle_price(), Some(64251.5));
    assert_eq!(update.asset_ctx.premium(), Some(0.00002));
    assert_eq!(update.asset_ctx.day_notional_volume(), Some(1_500_000_000.0));
}

#[test]
fn test_update_without_asset_context_decodes_empty() {
    let update: MarketUpdate = serde_json::from_value(json!({})).expect("decode empty update");
    assert_eq!(update.asset_ctx.open_interest(), None);
}
