//! Shared Kernel - Domain-crossing minimal core
//!
//! Vocabulary shared by every backend crate:
//! - Unified error type ([`error::app_error::AppError`]) and its HTTP classification
//! - Typed identifiers for entities that cross crate boundaries
//!
//! Only things whose meaning is identical in every domain belong here.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
