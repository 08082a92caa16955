pub mod call;
pub mod filter;
pub mod format;
pub mod pagination;
pub mod validate;

pub use call::*;
pub use filter::CallFilter;
pub use pagination::{PageRange, Pagination};

#[cfg(any(test, feature = "testing"))]
pub mod testing;
