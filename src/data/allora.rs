use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use crate::config::{AlloraConfig, EnvConfig};
use crate::data::types::{Asset, PriceInference, Timeframe, Topic};

/// Async interface to the Allora inference network.
///
/// The strategy and HTTP layers hold this as `Arc<dyn AlloraApi>` so the
/// concrete client stays a startup-time detail and tests can inject failures.
#[async_trait]
pub trait AlloraApi: Send + Sync {
    /// Fetch the network prediction for an asset over a timeframe.
    async fn price_inference(&self, asset: Asset, timeframe: Timeframe) -> Result<PriceInference>;

    /// List every topic the network currently tracks.
    async fn all_topics(&self) -> Result<Vec<Topic>>;

    /// Fetch the latest inference published for a single topic.
    async fn inference_by_topic(&self, topic_id: u64) -> Result<PriceInference>;
}

pub struct AlloraClient {
    client: Client,
    base_url: String,
    chain: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct InferenceResponse {
    data: InferencePayload,
}

#[derive(Debug, Deserialize)]
struct InferencePayload {
    #[allow(dead_code)]
    #[serde(default)]
    signature: Option<String>,
    inference_data: InferenceData,
}

#[derive(Debug, Deserialize)]
struct InferenceData {
    network_inference: String,
    network_inference_normalized: String,
    #[serde(default)]
    confidence_interval_percentiles: Vec<String>,
    #[allow(dead_code)]
    #[serde(default)]
    topic_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TopicsResponse {
    data: TopicsPage,
}

#[derive(Debug, Deserialize)]
struct TopicsPage {
    #[serde(default)]
    topics: Vec<AlloraTopic>,
}

#[derive(Debug, Deserialize)]
struct AlloraTopic {
    topic_id: u64,
    #[serde(default)]
    topic_name: Option<String>,
    #[allow(dead_code)]
    #[serde(default)]
    description: Option<String>,
    #[allow(dead_code)]
    #[serde(default)]
    is_active: Option<bool>,
}

impl AlloraClient {
    pub fn new(config: &AlloraConfig, env: &EnvConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            chain: env.allora_chain.clone(),
            api_key: env.allora_api_key.clone(),
        })
    }

    async fn fetch_inference(&self, url: &str, asset: Option<Asset>) -> Result<PriceInference> {
        let response: InferenceResponse = self.client
            .get(url)
            .header("x-api-key", &self.api_key)
            .send()
            .await
            .context("Inference request failed")?
            .error_for_status()
            .context("Inference request rejected")?
            .json()
            .await
            .context("Failed to parse inference response")?;

        convert_inference(response.data.inference_data, asset)
    }
}

#[async_trait]
impl AlloraApi for AlloraClient {
    async fn price_inference(&self, asset: Asset, timeframe: Timeframe) -> Result<PriceInference> {
        let url = format!(
            "{}/allora/consumer/price/{}/{}/{}",
            self.base_url,
            self.chain,
            asset.symbol(),
            timeframe.as_str()
        );

        self.fetch_inference(&url, Some(asset))
            .await
            .with_context(|| format!("{} price inference failed", asset))
    }

    async fn all_topics(&self) -> Result<Vec<Topic>> {
        let url = format!("{}/allora/topics", self.base_url);

        let response: TopicsResponse = self.client
            .get(&url)
            .header("x-api-key", &self.api_key)
            .send()
            .await
            .context("Failed to fetch topics")?
            .error_for_status()
            .context("Topics request rejected")?
            .json()
            .await
            .context("Failed to parse topics response")?;

        Ok(response.data.topics.into_iter().map(convert_topic).collect())
    }

    async fn inference_by_topic(&self, topic_id: u64) -> Result<PriceInference> {
        let url = format!(
            "{}/allora/consumer/{}?allora_topic_id={}",
            self.base_url, self.chain, topic_id
        );

        self.fetch_inference(&url, None)
            .await
            .with_context(|| format!("Inference for topic {} failed", topic_id))
    }
}

/// Convert the vendor inference payload to our internal type.
///
/// The normalized value must parse: the yield score is computed from it, so a
/// malformed payload is an upstream failure rather than a silent zero.
/// Percentiles are advisory and parsed leniently.
fn convert_inference(data: InferenceData, asset: Option<Asset>) -> Result<PriceInference> {
    let normalized = data.network_inference_normalized
        .parse::<f64>()
        .with_context(|| {
            format!(
                "Malformed normalized inference value: {}",
                data.network_inference_normalized
            )
        })?;

    let confidence_percentiles = data.confidence_interval_percentiles
        .iter()
        .filter_map(|p| p.parse::<f64>().ok())
        .collect();

    Ok(PriceInference {
        asset,
        price: data.network_inference,
        normalized,
        confidence_percentiles,
    })
}

fn convert_topic(topic: AlloraTopic) -> Topic {
    Topic {
        id: topic.topic_id,
        // Topics without a name can never match a keyword filter
        name: topic.topic_name.unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_inference_parses_vendor_strings() {
        let data = InferenceData {
            network_inference: "3372867357745907000".to_string(),
            network_inference_normalized: "3372.867357745907".to_string(),
            confidence_interval_percentiles: vec![
                "10".to_string(),
                "25".to_string(),
                "not-a-number".to_string(),
                "90".to_string(),
            ],
            topic_id: None,
        };

        let inference = convert_inference(data, Some(Asset::Eth)).unwrap();
        assert_eq!(inference.asset, Some(Asset::Eth));
        assert_eq!(inference.price, "3372867357745907000");
        assert!((inference.normalized - 3372.867357745907).abs() < 1e-9);
        assert_eq!(inference.confidence_percentiles, vec![10.0, 25.0, 90.0]);
    }

    #[test]
    fn test_convert_inference_rejects_bad_normalized() {
        let data = InferenceData {
            network_inference: "1".to_string(),
            network_inference_normalized: "garbage".to_string(),
            confidence_interval_percentiles: vec![],
            topic_id: None,
        };

        assert!(convert_inference(data, None).is_err());
    }

    #[test]
    fn test_convert_topic_without_name() {
        let topic: AlloraTopic = serde_json::from_str(r#"{"topic_id": 7}"#).unwrap();
        let topic = convert_topic(topic);

        assert_eq!(topic.id, 7);
        assert!(topic.name.is_empty());
    }

    #[test]
    fn test_topics_response_shape() {
        let raw = r#"{
            "data": {
                "topics": [
                    {"topic_id": 1, "topic_name": "BTC 10min Prediction", "is_active": true},
                    {"topic_id": 4, "topic_name": "Market Risk Index"}
                ]
            }
        }"#;

        let response: TopicsResponse = serde_json::from_str(raw).unwrap();
        let topics: Vec<Topic> = response.data.topics.into_iter().map(convert_topic).collect();

        assert_eq!(topics.len(), 2);
        assert_eq!(topics[1].name, "Market Risk Index");
    }
}
