use std::sync::Arc;
use chrono::Utc;
use futures::{join, try_join};
use tracing::{info, warn};
use crate::data::allora::AlloraApi;
use crate::data::types::{Asset, PriceInference, Timeframe};
use crate::strategies::types::{RiskResult, StrategySignal, YieldResult};

// Hand-picked calibration constants; changing any of them changes the
// signal output.
const YIELD_DIVISOR: f64 = 200_000.0;
const HIGH_YIELD_THRESHOLD: f64 = 0.1;
const LOW_RISK_THRESHOLD: f64 = 0.5;
const NEUTRAL_RISK_SCORE: f64 = 0.5;
const MAX_RISK_SCORE: f64 = 1.0;
const RISK_FACTOR_DIVISOR: f64 = 10.0;

const RISK_KEYWORD: &str = "risk";

#[derive(Debug, thiserror::Error)]
pub enum StrategyError {
    #[error("Inference request failed: {0}")]
    Inference(#[from] anyhow::Error),
}

/// Derives a strategy signal from live Allora predictions: a yield score
/// from the BTC/ETH pair and a risk score from risk-related topics.
pub struct YieldRiskStrategy {
    network: Arc<dyn AlloraApi>,
}

impl YieldRiskStrategy {
    pub fn new(network: Arc<dyn AlloraApi>) -> Self {
        Self { network }
    }

    /// Fetch both 8-hour price inferences and derive the yield score.
    ///
    /// The two calls run concurrently and both must succeed; a partial pair
    /// is never scored.
    pub async fn predict_yield(&self) -> Result<YieldResult, StrategyError> {
        let (btc, eth) = try_join!(
            self.network.price_inference(Asset::Btc, Timeframe::EightHours),
            self.network.price_inference(Asset::Eth, Timeframe::EightHours),
        )?;

        let yield_score = compute_yield_score(btc.normalized, eth.normalized);

        info!(
            "Yield prediction: btc={:.2}, eth={:.2}, score={:.4}",
            btc.normalized, eth.normalized, yield_score
        );

        Ok(YieldResult {
            btc,
            eth,
            yield_score,
        })
    }

    /// Score risk from topics whose name mentions "risk".
    ///
    /// Fail-safe: any upstream failure downgrades to the maximum risk score
    /// instead of failing the request. A broken risk check must never report
    /// low risk.
    pub async fn analyze_risk(&self) -> RiskResult {
        match self.collect_risk_factors().await {
            Ok(risk_factors) => {
                let risk_score = compute_risk_score(risk_factors.len());

                info!(
                    "Risk analysis: {} factors, score={:.2}",
                    risk_factors.len(),
                    risk_score
                );

                RiskResult {
                    risk_factors,
                    risk_score,
                    error: None,
                }
            }
            Err(e) => {
                warn!("Risk analysis failed, assuming maximum risk: {:#}", e);

                RiskResult {
                    risk_factors: Vec::new(),
                    risk_score: MAX_RISK_SCORE,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    async fn collect_risk_factors(&self) -> anyhow::Result<Vec<PriceInference>> {
        let topics = self.network.all_topics().await?;
        let mut risk_factors = Vec::new();

        for topic in topics {
            if topic.name.to_lowercase().contains(RISK_KEYWORD) {
                let inference = self.network.inference_by_topic(topic.id).await?;
                risk_factors.push(inference);
            }
        }

        Ok(risk_factors)
    }

    /// Run yield prediction and risk analysis concurrently and combine them.
    ///
    /// Yield failures propagate; risk failures were already absorbed into a
    /// conservative score. The boolean flags are recomputed from the scores
    /// every time, never carried over.
    pub async fn strategy_signals(&self) -> Result<StrategySignal, StrategyError> {
        let (yield_data, risk_data) = join!(self.predict_yield(), self.analyze_risk());
        let yield_data = yield_data?;

        let high_yield = yield_data.yield_score > HIGH_YIELD_THRESHOLD;
        let low_risk = risk_data.risk_score < LOW_RISK_THRESHOLD;

        info!(
            "Strategy signals: yield={:.4}, risk={:.2}, high_yield={}, low_risk={}",
            yield_data.yield_score, risk_data.risk_score, high_yield, low_risk
        );

        Ok(StrategySignal {
            timestamp: Utc::now(),
            yield_data,
            risk_data,
            high_yield,
            low_risk,
        })
    }
}

fn compute_yield_score(btc_normalized: f64, eth_normalized: f64) -> f64 {
    (btc_normalized + eth_normalized) / YIELD_DIVISOR
}

fn compute_risk_score(factor_count: usize) -> f64 {
    if factor_count > 0 {
        factor_count as f64 / RISK_FACTOR_DIVISOR
    } else {
        NEUTRAL_RISK_SCORE
    }
}
