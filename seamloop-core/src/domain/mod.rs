//! Core domain types
//!
//! These types describe a single render job from request arrival to the
//! engine invocation. They are shared between the engine (which produces
//! them) and the server (which reports on them).

pub mod clip;
pub mod graph;
pub mod job;
pub mod schedule;
