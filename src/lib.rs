pub mod api;
pub mod config;
pub mod database;
pub mod error;
pub mod fetch;
pub mod model;
pub mod telemetry;

pub use api::{create_router, start_server, AppState};
pub use config::AppConfig;
pub use database::Database;
pub use fetch::{CoinGeckoClient, MarketData};
pub use model::{CoinSnapshot, HistoryPoint};
