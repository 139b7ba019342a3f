//! Wallet Sign-In Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, message/signature/token services, repository traits
//! - `application/` - Use cases
//! - `infra/` - In-memory and PostgreSQL implementations
//! - `presentation/` - HTTP handlers, middleware, router
//!
//! ## Security Model
//! - The server is the sole authority on nonce validity; a nonce is consumed
//!   atomically and at most once
//! - The signed message is re-rendered from the stored challenge and must
//!   match byte-for-byte
//! - The signer is recovered from the signature, never taken from the client
//! - Session tokens are HMAC-signed and carry their own expiry

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::{SessionSecret, WalletAuthConfig};
pub use domain::entities::AuthenticatedWallet;
pub use domain::repository::WalletAuthRepository;
pub use domain::value_objects::WalletAddress;
pub use error::{AuthError, AuthResult};
pub use infra::memory::MemoryWalletAuthRepository;
pub use infra::postgres::PgWalletAuthRepository;
pub use presentation::handlers::WalletAuthState;
pub use presentation::middleware::require_wallet_session;
pub use presentation::router::{wallet_auth_router, wallet_auth_router_with_state};
