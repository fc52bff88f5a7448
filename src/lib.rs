// Typed Google Calendar and Gmail client

pub mod auth;
pub mod calendar;
pub mod client;
pub mod config;
pub mod error;
pub mod gmail;
pub mod models;

pub use calendar::CalendarService;
pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use gmail::MailService;

/// Install the fmt subscriber filtered by `RUST_LOG`. Later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
