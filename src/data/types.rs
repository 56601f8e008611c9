use serde::{Deserialize, Serialize};
use std::fmt;

/// Assets the strategy trades signals for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Asset {
    Btc,
    Eth,
}

impl Asset {
    /// Token symbol as the Allora consumer API expects it in request paths.
    pub fn symbol(&self) -> &'static str {
        match self {
            Asset::Btc => "BTC",
            Asset::Eth => "ETH",
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Prediction horizons offered by the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeframe {
    #[allow(dead_code)]
    FiveMin,
    EightHours,
}

impl Timeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::FiveMin => "5m",
            Timeframe::EightHours => "8h",
        }
    }
}

/// A single price prediction returned by the network.
///
/// `price` keeps the vendor's raw decimal string untouched; `normalized` is
/// the parsed human-scale value the strategy actually computes with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceInference {
    pub asset: Option<Asset>,
    pub price: String,
    pub normalized: f64,
    pub confidence_percentiles: Vec<f64>,
}

/// A named prediction market tracked by the network. Vendor fields beyond
/// id and name are dropped at conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    pub id: u64,
    pub name: String,
}
