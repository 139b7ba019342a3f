//! Sign-In Message Builder
//!
//! Renders and parses the EIP-4361 ("Sign-In with Ethereum") challenge
//! message. Rendering is deterministic: the same fields always produce the
//! same bytes, which is what lets verification re-derive exactly what the
//! wallet signed.

use crate::domain::value_objects::{ChainId, Nonce, WalletAddress};
use crate::error::{AuthError, AuthResult};
use chrono::{DateTime, SecondsFormat};

const HEADER_SUFFIX: &str = " wants you to sign in with your Ethereum account:";
const URI_TAG: &str = "URI: ";
const VERSION_TAG: &str = "Version: ";
const CHAIN_ID_TAG: &str = "Chain ID: ";
const NONCE_TAG: &str = "Nonce: ";
const ISSUED_AT_TAG: &str = "Issued At: ";
const EXPIRATION_TAG: &str = "Expiration Time: ";

const LINE_COUNT: usize = 11;

/// Every field that goes into a challenge message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeFields {
    /// RFC 3986 authority requesting the signature
    pub domain: String,
    pub address: WalletAddress,
    pub statement: String,
    pub uri: String,
    pub version: String,
    pub chain_id: u64,
    pub nonce: Nonce,
    pub issued_at_ms: i64,
    pub expires_at_ms: i64,
}

impl ChallengeFields {
    /// Render the canonical message
    pub fn build(&self) -> AuthResult<String> {
        require_token(&self.domain, "domain")?;
        require_token(&self.uri, "uri")?;
        require_token(&self.version, "version")?;
        if self.statement.trim().is_empty() {
            return Err(invalid("statement"));
        }
        if self.statement.contains(['\n', '\r']) {
            return Err(invalid("statement"));
        }
        let chain_id = ChainId::new(self.chain_id).ok_or_else(|| invalid("chain_id"))?;
        if Nonce::parse(self.nonce.as_str()).is_none() {
            return Err(invalid("nonce"));
        }
        if self.expires_at_ms <= self.issued_at_ms {
            return Err(invalid("expiration_time"));
        }
        let issued_at = format_timestamp(self.issued_at_ms, "issued_at")?;
        let expires_at = format_timestamp(self.expires_at_ms, "expiration_time")?;

        let lines = [
            format!("{}{HEADER_SUFFIX}", self.domain),
            self.address.to_checksum(),
            String::new(),
            self.statement.clone(),
            String::new(),
            format!("{URI_TAG}{}", self.uri),
            format!("{VERSION_TAG}{}", self.version),
            format!("{CHAIN_ID_TAG}{chain_id}"),
            format!("{NONCE_TAG}{}", self.nonce),
            format!("{ISSUED_AT_TAG}{issued_at}"),
            format!("{EXPIRATION_TAG}{expires_at}"),
        ];
        Ok(lines.join("\n"))
    }

    /// Parse a message produced by [`ChallengeFields::build`]
    ///
    /// Anything that does not re-render byte-for-byte to `message` is
    /// rejected, so a successful parse is always canonical.
    pub fn parse(message: &str) -> AuthResult<Self> {
        let lines: Vec<&str> = message.split('\n').collect();
        if lines.len() != LINE_COUNT || !lines[2].is_empty() || !lines[4].is_empty() {
            return Err(AuthError::MalformedMessage);
        }

        let domain = lines[0]
            .strip_suffix(HEADER_SUFFIX)
            .ok_or(AuthError::MalformedMessage)?;
        let address = WalletAddress::parse(lines[1]).map_err(|_| AuthError::MalformedMessage)?;
        let uri = tagged(lines[5], URI_TAG)?;
        let version = tagged(lines[6], VERSION_TAG)?;
        let chain_id = tagged(lines[7], CHAIN_ID_TAG)?
            .parse::<u64>()
            .map_err(|_| AuthError::MalformedMessage)?;
        let nonce = Nonce::parse(tagged(lines[8], NONCE_TAG)?).ok_or(AuthError::MalformedMessage)?;
        let issued_at_ms = parse_timestamp(tagged(lines[9], ISSUED_AT_TAG)?)?;
        let expires_at_ms = parse_timestamp(tagged(lines[10], EXPIRATION_TAG)?)?;

        let fields = Self {
            domain: domain.to_string(),
            address,
            statement: lines[3].to_string(),
            uri: uri.to_string(),
            version: version.to_string(),
            chain_id,
            nonce,
            issued_at_ms,
            expires_at_ms,
        };

        match fields.build() {
            Ok(rebuilt) if rebuilt == message => Ok(fields),
            _ => Err(AuthError::MalformedMessage),
        }
    }
}

fn invalid(field: &str) -> AuthError {
    AuthError::InvalidField(field.to_string())
}

/// Non-empty and free of whitespace
fn require_token(value: &str, field: &str) -> AuthResult<()> {
    if value.is_empty() || value.chars().any(char::is_whitespace) {
        return Err(invalid(field));
    }
    Ok(())
}

fn tagged<'a>(line: &'a str, tag: &str) -> AuthResult<&'a str> {
    line.strip_prefix(tag).ok_or(AuthError::MalformedMessage)
}

/// RFC 3339, millisecond precision, `Z` suffix
pub fn format_timestamp(ms: i64, field: &str) -> AuthResult<String> {
    DateTime::from_timestamp_millis(ms)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
        .ok_or_else(|| invalid(field))
}

fn parse_timestamp(s: &str) -> AuthResult<i64> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.timestamp_millis())
        .map_err(|_| AuthError::MalformedMessage)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> ChallengeFields {
        ChallengeFields {
            domain: "example.com".to_string(),
            address: WalletAddress::parse("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed").unwrap(),
            statement: "Sign in to Example.".to_string(),
            uri: "https://example.com".to_string(),
            version: "1".to_string(),
            chain_id: 1,
            nonce: Nonce::parse("32891756abcdef01").unwrap(),
            issued_at_ms: 1_700_000_000_000,
            expires_at_ms: 1_700_000_300_000,
        }
    }

    #[test]
    fn test_build_canonical_layout() {
        let message = fields().build().unwrap();
        let expected = "example.com wants you to sign in with your Ethereum account:\n\
            0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed\n\
            \n\
            Sign in to Example.\n\
            \n\
            URI: https://example.com\n\
            Version: 1\n\
            Chain ID: 1\n\
            Nonce: 32891756abcdef01\n\
            Issued At: 2023-11-14T22:13:20.000Z\n\
            Expiration Time: 2023-11-14T22:18:20.000Z";
        assert_eq!(message, expected);
    }

    #[test]
    fn test_build_is_deterministic() {
        assert_eq!(fields().build().unwrap(), fields().build().unwrap());
    }

    #[test]
    fn test_parse_inverts_build() {
        let original = fields();
        let parsed = ChallengeFields::parse(&original.build().unwrap()).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_build_rejects_empty_fields() {
        let mut f = fields();
        f.domain = String::new();
        assert!(matches!(f.build(), Err(AuthError::InvalidField(name)) if name == "domain"));

        let mut f = fields();
        f.statement = "   ".to_string();
        assert!(matches!(f.build(), Err(AuthError::InvalidField(name)) if name == "statement"));

        let mut f = fields();
        f.statement = "line one\nline two".to_string();
        assert!(matches!(f.build(), Err(AuthError::InvalidField(name)) if name == "statement"));

        let mut f = fields();
        f.chain_id = 0;
        assert!(matches!(f.build(), Err(AuthError::InvalidField(name)) if name == "chain_id"));

        let mut f = fields();
        f.expires_at_ms = f.issued_at_ms;
        assert!(f.build().is_err());
    }

    #[test]
    fn test_parse_rejects_non_canonical() {
        let message = fields().build().unwrap();

        // Trailing newline
        assert!(matches!(
            ChallengeFields::parse(&format!("{message}\n")),
            Err(AuthError::MalformedMessage)
        ));

        // Lowercase address is a valid address but not the canonical rendering
        let lower = message.replace(
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed",
        );
        assert!(matches!(
            ChallengeFields::parse(&lower),
            Err(AuthError::MalformedMessage)
        ));

        // Timestamp without milliseconds
        let seconds = message.replace("22:13:20.000Z", "22:13:20Z");
        assert!(matches!(
            ChallengeFields::parse(&seconds),
            Err(AuthError::MalformedMessage)
        ));

        assert!(matches!(
            ChallengeFields::parse("hello"),
            Err(AuthError::MalformedMessage)
        ));
    }

    #[test]
    fn test_parse_keeps_tampered_but_canonical_fields() {
        let message = fields().build().unwrap().replace("Chain ID: 1", "Chain ID: 137");
        let parsed = ChallengeFields::parse(&message).unwrap();
        assert_eq!(parsed.chain_id, 137);
    }
}
