//! Token generation, hashing and header parsing.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};

use crate::error::AuthError;

/// Random bytes per token.
pub const TOKEN_BYTES: usize = 32;

/// Length of an encoded token (unpadded base64 of [`TOKEN_BYTES`]).
pub const TOKEN_LEN: usize = 43;

/// Fresh random token, URL-safe base64 without padding.
pub fn generate() -> String {
    let bytes: [u8; TOKEN_BYTES] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Hex SHA-256 digest stored in `access_tokens.token_hash`.
pub fn digest(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

/// Check the shape of a presented token.
pub fn parse(raw: &str) -> Result<&str, AuthError> {
    let token = raw.trim();
    if token.len() != TOKEN_LEN {
        return Err(AuthError::MalformedToken);
    }
    match URL_SAFE_NO_PAD.decode(token) {
        Ok(bytes) if bytes.len() == TOKEN_BYTES => Ok(token),
        _ => Err(AuthError::MalformedToken),
    }
}

/// Extract the credential from an `Authorization` header value.
///
/// The scheme is matched case-insensitively. Anything other than
/// `Bearer <credential>` is malformed.
pub fn bearer_credential(header: &str) -> Result<&str, AuthError> {
    let (scheme, credential) = header
        .trim()
        .split_once(' ')
        .ok_or(AuthError::MalformedToken)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MalformedToken);
    }
    let credential = credential.trim();
    if credential.is_empty() {
        return Err(AuthError::MalformedToken);
    }
    Ok(credential)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_tokens_parse() {
        let token = generate();
        assert_eq!(token.len(), TOKEN_LEN);
        assert_eq!(parse(&token).unwrap(), token);
    }

    #[test]
    fn generated_tokens_differ() {
        assert_ne!(generate(), generate());
    }

    #[test]
    fn digest_is_hex_sha256() {
        assert_eq!(
            digest("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(digest(&generate()).len(), 64);
    }

    #[test]
    fn parse_rejects_bad_shapes() {
        assert!(matches!(parse("short"), Err(AuthError::MalformedToken)));
        assert!(matches!(
            parse(&"*".repeat(TOKEN_LEN)),
            Err(AuthError::MalformedToken)
        ));
        assert!(matches!(parse(""), Err(AuthError::MalformedToken)));
    }

    #[test]
    fn bearer_header_parsing() {
        assert_eq!(bearer_credential("Bearer abc").unwrap(), "abc");
        assert_eq!(bearer_credential("bearer   abc ").unwrap(), "abc");
        assert!(bearer_credential("Basic abc").is_err());
        assert!(bearer_credential("Bearer").is_err());
        assert!(bearer_credential("Bearer ").is_err());
    }
}
