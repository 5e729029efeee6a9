//! Secret normalisation: textual secrets in, raw key bytes out.
//!
//! Secrets arrive however the issuing service and the user's clipboard left
//! them: hex dumps, base32 with or without padding in either case, raw
//! passphrases, and any of those sprinkled with spaces or dashes for
//! readability. Cleaning strips the separators, then an ordered classifier
//! picks the first encoding whose character set matches and that decoder
//! runs. Anything that fits no table entry is taken as a literal ASCII key.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::otp::types::{OtpError, OtpErrorKind};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Classification
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Textual encodings a secret can arrive in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretEncoding {
    Hex,
    Base32,
    Ascii,
}

impl fmt::Display for SecretEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hex => write!(f, "hex"),
            Self::Base32 => write!(f, "base32"),
            Self::Ascii => write!(f, "ascii"),
        }
    }
}

/// Classifier table, tried in order. The first predicate that matches picks
/// the decoder; nothing matching falls through to [`SecretEncoding::Ascii`].
const CLASSIFIERS: &[(SecretEncoding, fn(&str) -> bool)] = &[
    (SecretEncoding::Hex, is_hex),
    (SecretEncoding::Base32, is_base32),
];

impl SecretEncoding {
    /// Classify an already-cleaned secret.
    ///
    /// Hex is tried before base32 because every hex string is also valid
    /// base32 input; a string satisfying both is read as hex. Callers that
    /// want base32 semantics for such a string must re-encode, not rely on
    /// the tie-break going the other way.
    pub fn detect(cleaned: &str) -> Self {
        for (encoding, matches) in CLASSIFIERS {
            if matches(cleaned) {
                return *encoding;
            }
        }
        Self::Ascii
    }
}

fn is_hex(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_hexdigit())
}

fn is_base32(s: &str) -> bool {
    // Padding is only meaningful at the end; '=' anywhere else is not base32.
    let body = s.trim_end_matches('=');
    !body.is_empty()
        && body
            .chars()
            .all(|c| matches!(c, 'A'..='Z' | 'a'..='z' | '2'..='7'))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Decoding
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Normalise a textual secret into raw key bytes.
///
/// Strips whitespace and dashes, classifies the remainder and decodes it.
/// Equivalent spellings of the same secret ("JBSW Y3DP", "jbswy3dp",
/// "JBSWY3DP====") all produce the same key. A secret that is empty after
/// cleaning is an error; a decodable secret always succeeds, even when the
/// decoded key is shorter than any sane deployment would use.
pub fn decode_secret(secret: &str) -> Result<Vec<u8>, OtpError> {
    let cleaned = clean(secret);
    if cleaned.is_empty() {
        return Err(OtpError::new(OtpErrorKind::EmptySecret, "Secret is empty"));
    }

    let encoding = SecretEncoding::detect(&cleaned);
    let input_len = cleaned.len();
    let key = match encoding {
        SecretEncoding::Hex => decode_hex(&cleaned)?,
        SecretEncoding::Base32 => decode_base32(&cleaned)?,
        SecretEncoding::Ascii => cleaned.into_bytes(),
    };
    log::trace!(
        "secret normalised as {} ({} chars -> {} key bytes)",
        encoding,
        input_len,
        key.len()
    );
    Ok(key)
}

/// Strip cosmetic separators: all whitespace plus dashes.
fn clean(secret: &str) -> String {
    secret
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

/// Hex decoder. Two characters per byte; a trailing odd character carries
/// only half a byte and is dropped.
fn decode_hex(cleaned: &str) -> Result<Vec<u8>, OtpError> {
    let even = &cleaned[..cleaned.len() - cleaned.len() % 2];
    hex::decode(even).map_err(|e| {
        OtpError::new(OtpErrorKind::InvalidSecret, "Invalid hex secret").with_detail(e.to_string())
    })
}

/// Base32 decoder (RFC 4648 alphabet). Case-insensitive, padding optional.
/// Leftover bits that do not fill a whole byte are discarded, so degenerate
/// one-character inputs decode to an empty key rather than failing.
fn decode_base32(cleaned: &str) -> Result<Vec<u8>, OtpError> {
    let body = cleaned.trim_end_matches('=').to_uppercase();
    base32::decode(base32::Alphabet::Rfc4648 { padding: false }, &body)
        .ok_or_else(|| OtpError::new(OtpErrorKind::InvalidSecret, "Invalid base32 secret"))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Encoding / secret generation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Encode raw key bytes as unpadded uppercase base32, the form issuing
/// services put in QR codes.
pub fn encode_secret(bytes: &[u8]) -> String {
    base32::encode(base32::Alphabet::Rfc4648 { padding: false }, bytes)
}

/// Generate a random secret of `byte_length` bytes, base32-encoded.
pub fn generate_secret(byte_length: usize) -> String {
    use rand::RngCore;
    let mut bytes = vec![0u8; byte_length];
    rand::thread_rng().fill_bytes(&mut bytes);
    encode_secret(&bytes)
}
