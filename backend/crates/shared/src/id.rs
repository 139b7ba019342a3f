//! Identifiers shared across crates.

use std::fmt;
use uuid::Uuid;

/// Identifier of an issued wallet session; the `sid` claim of a session token
/// and the key of a revocation.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct WalletSessionId(Uuid);

impl WalletSessionId {
    /// Fresh random id (UUID v4)
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub const fn into_uuid(self) -> Uuid {
        self.0
    }
}

impl Default for WalletSessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for WalletSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WalletSessionId({})", self.0)
    }
}

impl fmt::Display for WalletSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ids_differ() {
        assert_ne!(WalletSessionId::new(), WalletSessionId::new());
    }

    #[test]
    fn test_uuid_roundtrip_and_display() {
        let uuid = Uuid::new_v4();
        let id = WalletSessionId::from_uuid(uuid);
        assert_eq!(id.into_uuid(), uuid);
        assert_eq!(id.to_string(), uuid.to_string());
    }
}
