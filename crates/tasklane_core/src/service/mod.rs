//! Use-case orchestration services.
//!
//! # Responsibility
//! - Validate external input, load minimal state, delegate rules to the
//!   engines, and issue grouped store writes.
//! - Keep callers decoupled from storage and engine details.

pub mod task_service;
