use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::data::allora::AlloraApi;
use crate::strategies::types::StrategySignal;
use crate::strategies::yield_risk::YieldRiskStrategy;

const SERVICE_NAME: &str = "Allora Strategy API";

#[derive(Clone)]
pub struct ApiState {
    pub strategy: Arc<YieldRiskStrategy>,
    pub network: Arc<dyn AlloraApi>,
    pub chain: String,
}

#[derive(Debug, Serialize)]
struct ServiceStatus {
    status: &'static str,
    service: &'static str,
    chain: String,
}

#[derive(Debug, Serialize)]
struct HealthStatus {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    allora_connected: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
    detail: String,
}

pub async fn serve(addr: String, state: ApiState) -> Result<()> {
    let app = router(state);

    let addr: SocketAddr = addr
        .parse()
        .with_context(|| format!("Invalid listen address: {}", addr))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/strategy/signals", post(strategy_signals))
        .route("/health", get(health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down...");
    }
}

async fn root(State(state): State<ApiState>) -> Json<ServiceStatus> {
    Json(ServiceStatus {
        status: "online",
        service: SERVICE_NAME,
        chain: state.chain.clone(),
    })
}

async fn strategy_signals(
    State(state): State<ApiState>,
) -> Result<Json<StrategySignal>, (StatusCode, Json<ErrorDetail>)> {
    match state.strategy.strategy_signals().await {
        Ok(signal) => Ok(Json(signal)),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorDetail {
                detail: e.to_string(),
            }),
        )),
    }
}

/// Probe the upstream network with a topics listing. Always answers 200;
/// connectivity problems are reported in the status field.
async fn health(State(state): State<ApiState>) -> Json<HealthStatus> {
    match state.network.all_topics().await {
        Ok(_) => Json(HealthStatus {
            status: "healthy",
            allora_connected: Some(true),
            error: None,
        }),
        Err(e) => Json(HealthStatus {
            status: "unhealthy",
            allora_connected: None,
            error: Some(e.to_string()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use crate::data::types::{Asset, PriceInference, Timeframe, Topic};

    struct StubNetwork {
        connected: bool,
    }

    #[async_trait]
    impl AlloraApi for StubNetwork {
        async fn price_inference(
            &self,
            asset: Asset,
            _timeframe: Timeframe,
        ) -> anyhow::Result<PriceInference> {
            if !self.connected {
                return Err(anyhow!("{} price inference failed: connection refused", asset));
            }

            let normalized = match asset {
                Asset::Btc => 50000.0,
                Asset::Eth => 3000.0,
            };

            Ok(PriceInference {
                asset: Some(asset),
                price: format!("{}", normalized),
                normalized,
                confidence_percentiles: vec![10.0, 50.0, 90.0],
            })
        }

        async fn all_topics(&self) -> anyhow::Result<Vec<Topic>> {
            if self.connected {
                Ok(Vec::new())
            } else {
                Err(anyhow!("Failed to fetch topics: connection refused"))
            }
        }

        async fn inference_by_topic(&self, topic_id: u64) -> anyhow::Result<PriceInference> {
            Err(anyhow!("Inference for topic {} failed", topic_id))
        }
    }

    fn state(connected: bool) -> ApiState {
        let network: Arc<dyn AlloraApi> = Arc::new(StubNetwork { connected });
        ApiState {
            strategy: Arc::new(YieldRiskStrategy::new(network.clone())),
            network,
            chain: "testnet".to_string(),
        }
    }

    #[tokio::test]
    async fn test_root_reports_chain() {
        let Json(status) = root(State(state(true))).await;

        assert_eq!(status.status, "online");
        assert_eq!(status.service, "Allora Strategy API");
        assert_eq!(status.chain, "testnet");
    }

    #[tokio::test]
    async fn test_health_when_connected() {
        let Json(health) = health(State(state(true))).await;

        assert_eq!(health.status, "healthy");
        assert_eq!(health.allora_connected, Some(true));
        assert!(health.error.is_none());
    }

    #[tokio::test]
    async fn test_health_absorbs_upstream_failure() {
        let Json(health) = health(State(state(false))).await;

        assert_eq!(health.status, "unhealthy");
        assert!(health.allora_connected.is_none());
        assert!(health.error.as_deref().unwrap().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_signals_success_returns_full_signal() {
        let Json(signal) = strategy_signals(State(state(true))).await.unwrap();

        assert!((signal.yield_data.yield_score - 0.265).abs() < 1e-12);
        assert!(signal.high_yield);
        // No topics match, so risk sits at the neutral default
        assert_eq!(signal.risk_data.risk_score, 0.5);
    }

    #[tokio::test]
    async fn test_signals_failure_maps_to_server_error() {
        let (code, Json(body)) = strategy_signals(State(state(false))).await.unwrap_err();

        assert_eq!(code, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.detail.contains("connection refused"));
    }
}
