//! Seamloop Core
//!
//! Core types and pure computation for the Seamloop loop renderer.
//!
//! This crate contains:
//! - Domain types: Job, ClipMetadata, LoopSchedule, TransformGraphSpec
//! - Planner: crossfade schedule computation
//! - Compiler: translation of a schedule into a transform graph
//! - DTOs: request and response bodies shared by server, client and CLI
//!
//! Nothing in here performs I/O. Fetching, probing and encoding live in
//! `seamloop-engine`.

pub mod compiler;
pub mod domain;
pub mod dto;
pub mod planner;
