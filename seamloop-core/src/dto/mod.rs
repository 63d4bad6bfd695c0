//! Data Transfer Objects
//!
//! Wire representations of render requests and responses, shared by the
//! HTTP service, the client library and the CLI.

pub mod error;
pub mod render;
