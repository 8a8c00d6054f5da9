//! ResourceService: the five operations over one configured resource.

mod crud;
mod validation;
pub use crud::{ListQuery, ResourceService};
pub use validation::RequestValidator;
