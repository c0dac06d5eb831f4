use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One coin as reported by the market-data provider. Serializes back out in
/// the same shape for the live listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinSnapshot {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub current_price: f64,
    pub market_cap: Option<f64>,
    pub price_change_percentage_24h: Option<f64>,
    pub last_updated: Option<String>,
}

/// One stored history entry, projected down to what the history endpoint returns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryPoint {
    pub price: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "change24h")]
    pub change_24h: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotSaved {
    pub success: bool,
    pub message: String,
    pub records_count: usize,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub coin_id: String,
    pub records_count: usize,
    pub data: Vec<HistoryPoint>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub database: &'static str,
    pub endpoints: Endpoints,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoints {
    pub coins: &'static str,
    pub save_history: &'static str,
    pub get_history: &'static str,
    pub health: &'static str,
}

impl Endpoints {
    pub const ALL: Endpoints = Endpoints {
        coins: "GET /api/coins - live top 10 coins by market cap",
        save_history: "POST /api/history - store a snapshot of the current top 10",
        get_history: "GET /api/history/:coinId?limit=24 - stored snapshots for one coin, oldest first",
        health: "GET /api/health - service and database status",
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn decodes_provider_payload_with_nulls() {
        let raw = json!({
            "id": "tether",
            "symbol": "usdt",
            "name": "Tether",
            "image": "https://example.com/usdt.png",
            "current_price": 1.0,
            "market_cap": null,
            "market_cap_rank": 3,
            "price_change_percentage_24h": -0.012,
            "last_updated": "2024-05-01T12:00:00.000Z"
        });

        let coin: CoinSnapshot = serde_json::from_value(raw).unwrap();
        assert_eq!(coin.id, "tether");
        assert_eq!(coin.market_cap, None);
        assert_eq!(coin.price_change_percentage_24h, Some(-0.012));
    }

    #[test]
    fn rejects_coin_without_price() {
        let raw = json!({ "id": "ghost", "name": "Ghost", "symbol": "gst" });
        assert!(serde_json::from_value::<CoinSnapshot>(raw).is_err());
    }

    #[test]
    fn rejects_coin_without_name_or_symbol() {
        let no_name = json!({ "id": "ghost", "symbol": "gst", "current_price": 1.0 });
        assert!(serde_json::from_value::<CoinSnapshot>(no_name).is_err());

        let no_symbol = json!({ "id": "ghost", "name": "Ghost", "current_price": 1.0 });
        assert!(serde_json::from_value::<CoinSnapshot>(no_symbol).is_err());
    }

    #[test]
    fn history_point_uses_public_field_names() {
        let point = HistoryPoint {
            price: 65000.0,
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            change_24h: 1.5,
        };
        let value = serde_json::to_value(&point).unwrap();
        assert_eq!(value["price"], 65000.0);
        assert_eq!(value["change24h"], 1.5);
        assert_eq!(value["timestamp"], "2024-05-01T12:00:00Z");
    }
}
