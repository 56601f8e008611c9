use chrono::{DateTime, Utc};
use serde::Serialize;
use crate::data::types::PriceInference;

/// Combined BTC/ETH prediction with the derived yield score.
#[derive(Debug, Clone, Serialize)]
pub struct YieldResult {
    pub btc: PriceInference,
    pub eth: PriceInference,
    pub yield_score: f64,
}

/// Risk assessment built from risk-related topics.
///
/// A failed risk check does not fail the request: the score pins to the
/// maximum and `error` carries the cause instead.
#[derive(Debug, Clone, Serialize)]
pub struct RiskResult {
    pub risk_factors: Vec<PriceInference>,
    pub risk_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The full strategy recommendation returned to API clients.
///
/// `high_yield` and `low_risk` are derived from the scores in the same
/// object and always recomputed with them.
#[derive(Debug, Clone, Serialize)]
pub struct StrategySignal {
    pub timestamp: DateTime<Utc>,
    pub yield_data: YieldResult,
    pub risk_data: RiskResult,
    pub high_yield: bool,
    pub low_risk: bool,
}
