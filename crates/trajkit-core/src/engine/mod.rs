//! # Engine Module
//!
//! Stateful pieces shared by the workflows.
//!
//! - **Simulation** ([`simulation`]) - A topology paired with its trajectory cursor
//! - **Configuration** ([`config`]) - Workflow settings and their builders
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events
//! - **Error Handling** ([`error`]) - The error type returned by workflows

pub mod config;
pub mod error;
pub mod progress;
pub mod simulation;
