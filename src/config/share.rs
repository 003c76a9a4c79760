//! Shareable-link codec for the credential configuration.
//!
//! A shared link carries the configuration in three query parameters:
//!
//! - `n` - base64 of the access token
//! - `a` - base64 of the catalog key
//! - `d` - the collection id, literal so the receiver can read and edit it
//!
//! All three are required together; partial links decode as "nothing shared".

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;
use url::Url;

use super::Configuration;

const TOKEN_PARAM: &str = "n";
const CATALOG_KEY_PARAM: &str = "a";
const COLLECTION_PARAM: &str = "d";

/// Errors decoding a shared link. Callers treat every variant as "no shared configuration".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShareDecodeError {
    /// A required parameter is absent or empty.
    #[error("shared link is missing the '{0}' parameter")]
    MissingParameter(&'static str),

    /// A secret parameter is not valid base64.
    #[error("shared link parameter '{param}' is not valid base64")]
    InvalidEncoding {
        /// Offending parameter name.
        param: &'static str,
    },

    /// A secret parameter decoded to bytes that are not UTF-8 text.
    #[error("shared link parameter '{param}' does not decode to text")]
    InvalidUtf8 {
        /// Offending parameter name.
        param: &'static str,
    },
}

/// Encodes `config` as `?n=<b64 token>&a=<b64 key>&d=<collection id>`.
///
/// Secrets are trimmed before encoding so stray whitespace never produces an unusable link.
#[must_use]
pub fn encode_shared_query(config: &Configuration) -> String {
    let token = STANDARD.encode(config.access_token.trim().as_bytes());
    let catalog_key = STANDARD.encode(config.catalog_key.trim().as_bytes());
    format!(
        "?{TOKEN_PARAM}={}&{CATALOG_KEY_PARAM}={}&{COLLECTION_PARAM}={}",
        urlencoding::encode(&token),
        urlencoding::encode(&catalog_key),
        urlencoding::encode(&config.target_collection_id),
    )
}

/// Builds a full shareable link from `base_url`, dropping any query or fragment it already carries.
#[must_use]
pub fn build_share_link(base_url: &str, config: &Configuration) -> String {
    let base = base_url.split(['?', '#']).next().unwrap_or_default();
    format!("{base}{}", encode_shared_query(config))
}

/// Decodes a shared link (full URL or bare query string) into a configuration.
///
/// # Errors
///
/// Returns [`ShareDecodeError`] when any parameter is missing or a secret fails to decode.
pub fn decode_shared_query(input: &str) -> Result<Configuration, ShareDecodeError> {
    let pairs = query_pairs(input.trim());

    let token_b64 = required_param(&pairs, TOKEN_PARAM)?;
    let catalog_key_b64 = required_param(&pairs, CATALOG_KEY_PARAM)?;
    let collection_id = required_param(&pairs, COLLECTION_PARAM)?;

    Ok(Configuration {
        access_token: decode_secret(TOKEN_PARAM, token_b64)?,
        target_collection_id: collection_id.to_string(),
        catalog_key: decode_secret(CATALOG_KEY_PARAM, catalog_key_b64)?,
    })
}

fn query_pairs(input: &str) -> Vec<(String, String)> {
    if let Ok(url) = Url::parse(input)
        && !url.cannot_be_a_base()
    {
        return url.query_pairs().into_owned().collect();
    }

    // A '?' after the first parameter belongs to a value, not to a path.
    let query = match input.split_once('?') {
        Some((prefix, query)) if !prefix.contains(['=', '&']) => query,
        _ => input,
    };
    let query = query.split('#').next().unwrap_or_default();
    url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect()
}

fn required_param<'a>(
    pairs: &'a [(String, String)],
    name: &'static str,
) -> Result<&'a str, ShareDecodeError> {
    pairs
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
        .filter(|value| !value.is_empty())
        .ok_or(ShareDecodeError::MissingParameter(name))
}

fn decode_secret(param: &'static str, encoded: &str) -> Result<String, ShareDecodeError> {
    // Form decoding turns an unescaped '+' into a space; base64 never contains spaces.
    let restored = encoded.replace(' ', "+");
    let bytes = STANDARD
        .decode(restored.trim().as_bytes())
        .map_err(|_| ShareDecodeError::InvalidEncoding { param })?;
    String::from_utf8(bytes).map_err(|_| ShareDecodeError::InvalidUtf8 { param })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> Configuration {
        Configuration::new(
            "secret_Abc123+/xyz",
            "0f1e2d3c-4b5a-6978-8796-a5b4c3d2e1f0",
            "ttbkey0123456789",
        )
    }

    #[test]
    fn test_round_trip_preserves_configuration() {
        let config = sample();
        let encoded = encode_shared_query(&config);
        assert_eq!(decode_shared_query(&encoded).unwrap(), config);
    }

    #[test]
    fn test_round_trip_with_non_ascii_values() {
        let config = Configuration::new("토큰-값", "컬렉션", "키?&=");
        let encoded = encode_shared_query(&config);
        assert_eq!(decode_shared_query(&encoded).unwrap(), config);
    }

    #[test]
    fn test_encode_leaves_collection_id_readable() {
        let encoded = encode_shared_query(&sample());
        assert!(encoded.starts_with("?n="));
        assert!(encoded.contains("&d=0f1e2d3c-4b5a-6978-8796-a5b4c3d2e1f0"));
        assert!(!encoded.contains("secret_Abc123"));
        assert!(!encoded.contains("ttbkey0123456789"));
    }

    #[test]
    fn test_encode_trims_secret_whitespace() {
        let padded = Configuration::new("  secret_token \n", "db", "\tkey ");
        let decoded = decode_shared_query(&encode_shared_query(&padded)).unwrap();
        assert_eq!(decoded.access_token, "secret_token");
        assert_eq!(decoded.catalog_key, "key");
        assert_eq!(decoded.target_collection_id, "db");
    }

    #[test]
    fn test_decode_accepts_full_url() {
        let link = build_share_link("https://example.com/widget/?old=1#frag", &sample());
        assert!(link.starts_with("https://example.com/widget/?n="));
        assert_eq!(decode_shared_query(&link).unwrap(), sample());
    }

    #[test]
    fn test_decode_accepts_query_without_question_mark() {
        let encoded = encode_shared_query(&sample());
        let bare = encoded.trim_start_matches('?');
        assert_eq!(decode_shared_query(bare).unwrap(), sample());
    }

    #[test]
    fn test_decode_bare_query_keeps_question_mark_in_value() {
        let n = STANDARD.encode("token");
        let a = STANDARD.encode("key");
        let decoded = decode_shared_query(&format!("n={n}&a={a}&d=db?x")).unwrap();
        assert_eq!(decoded, Configuration::new("token", "db?x", "key"));

        let schemeless = format!("archiver.example.com/widget?n={n}&a={a}&d=db?x");
        assert_eq!(
            decode_shared_query(&schemeless).unwrap(),
            Configuration::new("token", "db?x", "key")
        );
    }

    #[test]
    fn test_decode_restores_unescaped_plus() {
        // Encodes to "++++"; left unescaped the way a hand-copied link carries it.
        let token = STANDARD.encode([0xfb_u8, 0xef, 0xbe]);
        assert_eq!(token, "++++");
        let query = format!("?n={token}&a={}&d=db", STANDARD.encode("key"));
        let decoded = decode_shared_query(&query);
        // Not valid UTF-8, but it must get past base64 decoding.
        assert_eq!(
            decoded,
            Err(ShareDecodeError::InvalidUtf8 { param: TOKEN_PARAM })
        );
    }

    #[test]
    fn test_decode_missing_parameter_fails() {
        let n = STANDARD.encode("token");
        let a = STANDARD.encode("key");
        assert_eq!(
            decode_shared_query(&format!("?n={n}&a={a}")),
            Err(ShareDecodeError::MissingParameter("d"))
        );
        assert_eq!(
            decode_shared_query(&format!("?n={n}&d=db")),
            Err(ShareDecodeError::MissingParameter("a"))
        );
        assert_eq!(
            decode_shared_query(&format!("?a={a}&d=db")),
            Err(ShareDecodeError::MissingParameter("n"))
        );
        assert_eq!(
            decode_shared_query(""),
            Err(ShareDecodeError::MissingParameter("n"))
        );
    }

    #[test]
    fn test_decode_empty_parameter_counts_as_missing() {
        let a = STANDARD.encode("key");
        assert_eq!(
            decode_shared_query(&format!("?n=&a={a}&d=db")),
            Err(ShareDecodeError::MissingParameter("n"))
        );
    }

    #[test]
    fn test_decode_invalid_base64_fails() {
        let a = STANDARD.encode("key");
        assert_eq!(
            decode_shared_query(&format!("?n=%%%not-base64%%%&a={a}&d=db")),
            Err(ShareDecodeError::InvalidEncoding { param: "n" })
        );
    }
}
