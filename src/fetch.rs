use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};

use crate::config::AppConfig;
use crate::error::UpstreamError;
use crate::model::CoinSnapshot;

pub const TOP_COINS: u32 = 10;

const API_KEY_HEADER: &str = "x-cg-demo-api-key";

/// Source of live market data.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Top coins by market cap, priced in USD, in provider order.
    async fn fetch_top_coins(&self) -> Result<Vec<CoinSnapshot>, UpstreamError>;
}

/// CoinGecko `/coins/markets` client. One attempt per call, no retries.
pub struct CoinGeckoClient {
    client: reqwest::Client,
    base_url: String,
}

impl CoinGeckoClient {
    pub fn new(base_url: &str, api_key: Option<&str>) -> Result<Self, UpstreamError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(concat!("coin-history-api/", env!("CARGO_PKG_VERSION"))));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(key) = api_key {
            headers.insert(API_KEY_HEADER, HeaderValue::from_str(key)?);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, UpstreamError> {
        Self::new(&config.market_data_url, config.market_data_api_key.as_deref())
    }

    fn markets_url(&self) -> String {
        format!(
            "{}/coins/markets?vs_currency=usd&order=market_cap_desc&per_page={}&page=1&sparkline=false",
            self.base_url, TOP_COINS
        )
    }
}

#[async_trait]
impl MarketData for CoinGeckoClient {
    async fn fetch_top_coins(&self) -> Result<Vec<CoinSnapshot>, UpstreamError> {
        let url = self.markets_url();
        tracing::debug!(%url, "fetching top coins");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let coins: Vec<CoinSnapshot> = response.json().await?;
        tracing::debug!(count = coins.len(), "received top coins");
        Ok(coins)
    }
}
