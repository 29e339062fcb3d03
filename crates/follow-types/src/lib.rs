//! Core types and traits for the follow relationship service.
//!
//! Request/response DTOs keep the JSON field names of the public follow API (`userId`).

mod dto;
mod traits;

pub use dto::*;
pub use traits::*;
