//! Use-case services over the repositories.
//!
//! # Responsibility
//! - Combine repository calls into caller-facing flows.
//! - Acquire sessions from the injected `ConnectionProvider`.

pub mod roster_service;
