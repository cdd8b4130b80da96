//! Inbound market update payloads.
//!
//! Updates arrive in the upstream exchange wire format: numeric fields are
//! decimal strings, absent when the venue has nothing to report. Accessors
//! coerce leniently; an unparseable field reads as absent, never an error.

use serde::{Deserialize, Serialize};

/// Per-symbol market update consumed by the detector.
///
/// A payload without an asset context still decodes; its embedded metrics
/// simply read as absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketUpdate {
    #[serde(default)]
    pub asset_ctx: AssetContext,
}

/// Exchange asset context snapshot (camelCase on the wire).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_interest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub funding: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mark_px: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oracle_px: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mid_px: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub premium: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_ntl_vlm: Option<String>,
}

impl AssetContext {
    pub fn open_interest(&self) -> Option<f64> {
        parse_decimal(self.open_interest.as_deref())
    }

    pub fn funding_rate(&self) -> Option<f64> {
        parse_decimal(self.funding.as_deref())
    }

    pub fn mark_price(&self) -> Option<f64> {
        parse_decimal(self.mark_px.as_deref())
    }

    pub fn oracle_price(&self) -> Option<f64> {
        parse_decimal(self.oracle_px.as_deref())
    }

    pub fn mid_price(&self) -> Option<f64> {
        parse_decimal(self.mid_px.as_deref())
    }

    pub fn premium(&self) -> Option<f64> {
        parse_decimal(self.premium.as_deref())
    }

    pub fn day_notional_volume(&self) -> Option<f64> {
        parse_decimal(self.day_ntl_vlm.as_deref())
    }
}

fn parse_decimal(raw: Option<&str>) -> Option<f64> {
    raw.filter(|s| !s.is_empty()).and_then(|s| s.parse().ok())
}
