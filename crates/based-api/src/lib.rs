pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod ledger;
pub mod middleware;
pub mod routes;
pub mod service;
pub mod single_flight;
pub mod state;

pub use app::build_router;
pub use error::{ApiError, ApiResult};
pub use ledger::BalanceLedger;
pub use service::{ChatService, ProcessedMessage};
pub use single_flight::{PendingGuard, SingleFlightGuard};
pub use state::AppState;
