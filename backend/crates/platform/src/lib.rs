//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (Keccak-256, HMAC-SHA256, Base64, hex)
//! - Client identification and bearer-token extraction
//! - Rate limiting infrastructure
//! - Clock abstraction for time-dependent logic

pub mod client;
pub mod crypto;
pub mod rate_limit;
pub mod time;
