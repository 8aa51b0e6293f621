//! Raw token generation, hashing and link building.

use rand::RngCore;
use sha2::{Digest, Sha256};
use url::Url;

use crate::{Result, VerigateError};

/// Random bytes per token (256 bits).
pub const TOKEN_BYTES: usize = 32;

/// Generate a raw verification token: 32 random bytes, hex encoded.
///
/// Only the link in the email carries this value; the database stores
/// [`hash_token`] of it.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// SHA-256 of the raw token, hex encoded.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// `{base_url}{verify_path}?token={token}`, keeping any path prefix on the base.
pub fn build_verify_url(base_url: &str, verify_path: &str, token: &str) -> Result<String> {
    let base = base_url.trim_end_matches('/');
    let path = if verify_path.starts_with('/') {
        verify_path.to_string()
    } else {
        format!("/{verify_path}")
    };

    let mut url = Url::parse(&format!("{base}{path}"))
        .map_err(|e| VerigateError::Config(format!("invalid verification base URL: {e}")))?;
    url.query_pairs_mut().append_pair("token", token);
    Ok(url.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_token_shape() {
        let token = generate_token();
        assert_eq!(token.len(), TOKEN_BYTES * 2);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generate_token_unique() {
        let tokens: HashSet<_> = (0..100).map(|_| generate_token()).collect();
        assert_eq!(tokens.len(), 100);
    }

    #[test]
    fn test_hash_token_known_value() {
        assert_eq!(
            hash_token("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_ne!(hash_token("abc"), hash_token("abd"));
    }

    #[test]
    fn test_build_verify_url() {
        assert_eq!(
            build_verify_url("https://example.org", "/verification/verify", "ab12").unwrap(),
            "https://example.org/verification/verify?token=ab12"
        );
        assert_eq!(
            build_verify_url("https://example.org/app/", "verify", "ab12").unwrap(),
            "https://example.org/app/verify?token=ab12"
        );
    }

    #[test]
    fn test_build_verify_url_invalid_base() {
        assert!(matches!(
            build_verify_url("not a url", "/verify", "t"),
            Err(VerigateError::Config(_))
        ));
    }
}
