//! Application Layer - Use Cases
//!
//! This layer orchestrates domain logic and infrastructure.
//! Contains use case implementations.

pub mod config;
pub mod request_challenge;
pub mod sweep;
pub mod validate_session;
pub mod verify_and_issue;
