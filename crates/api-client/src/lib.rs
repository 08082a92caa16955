pub mod client;
pub mod error;
pub mod gateway;

pub use callboard_api;
pub use client::ApiClient;
pub use error::{GatewayError, Result};
pub use gateway::CallGateway;
