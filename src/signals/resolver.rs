//! Metric resolution: payload-embedded values or indicator-store lookups.

use crate::models::{IndicatorKind, MarketUpdate, Metric, MetricSource, Period, TimeWindow};
use crate::services::IndicatorStore;
use std::sync::Arc;
use tracing::warn;

pub struct MetricResolver {
    indicators: Arc<dyn IndicatorStore>,
}

impl MetricResolver {
    pub fn new(indicators: Arc<dyn IndicatorStore>) -> Self {
        Self { indicators }
    }

    /// Current value of `metric` for `symbol`, or `None` when unavailable.
    ///
    /// Store failures are contained here: they log a warning and read as
    /// absent, so a bad lookup skips one signal for one cycle instead of
    /// failing the batch.
    pub async fn resolve(
        &self,
        metric: Metric,
        symbol: &str,
        update: &MarketUpdate,
        window: TimeWindow,
    ) -> Option<f64> {
        match metric.source() {
            MetricSource::Embedded => match metric {
                Metric::Oi => update.asset_ctx.open_interest(),
                Metric::FundingRate => update.asset_ctx.funding_rate(),
                _ => None,
            },
            MetricSource::Indicator(kind) => {
                self.lookup_indicator(symbol, kind, window.period()).await
            }
        }
    }

    async fn lookup_indicator(
        &self,
        symbol: &str,
        kind: IndicatorKind,
        period: Period,
    ) -> Option<f64> {
        match self.indicators.resolve_indicator(symbol, kind, period).await {
            Ok(value) => value,
            Err(e) => {
                warn!(
                    symbol = %symbol,
                    indicator = %kind,
                    period = %period,
                    error = %e,
                    "Indicator lookup failed: {}",
                    e
                );
                None
            }
        }
    }
}
