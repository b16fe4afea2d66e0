//! Test infrastructure for registry integration tests
//!
//! Provides TestRegistryCtx which binds an in-memory datastore into a
//! scope, along with fluent builders for making HTTP requests.

mod ctx;
mod request;
mod response;

pub use ctx::*;
pub use request::*;
pub use response::*;
