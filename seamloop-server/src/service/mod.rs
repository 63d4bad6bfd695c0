//! Service Module
//!
//! Business logic between the HTTP handlers and the render pipeline.

pub mod render;

pub use render as render_service;
