//! HTTP handlers for resource CRUD and forms.

pub mod form;
pub mod resource;
