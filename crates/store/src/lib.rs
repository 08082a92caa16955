pub mod async_ops;
pub mod auth;
pub mod calls;
pub mod gate;
pub mod session;
pub mod status;
pub mod store;
pub mod token;

pub use async_ops::{execute, AsyncCommand, CommandResult};
pub use auth::{AuthState, RefreshFailurePolicy};
pub use calls::CallsState;
pub use status::RequestStatus;
pub use store::{Action, Store, StoreOptions};
pub use token::RefreshTiming;

/// Current wall-clock time in epoch milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
