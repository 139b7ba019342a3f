//! Domain Layer - Business logic and entities
//!
//! This layer contains:
//! - Domain entities (Challenge, WalletSession)
//! - Domain value objects (WalletAddress, Nonce, ChainId)
//! - Domain services (sign-in message, signature recovery, session tokens)
//! - Repository traits (interfaces)

pub mod entities;
pub mod message;
pub mod repository;
pub mod signature;
pub mod token;
pub mod value_objects;
