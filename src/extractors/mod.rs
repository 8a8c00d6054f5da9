//! Request extractors.

mod caller;
mod json;

pub use json::JsonBody;
