//! Caller identity resolution for the follow API.

mod http;
#[cfg(feature = "test-util")]
pub mod mock;

pub use follow_types::{Caller, IdentityError, IdentityResolver};
pub use http::HttpIdentityResolver;

#[cfg(feature = "test-util")]
pub use mock::StaticIdentityResolver;
