//! HOTP engine: RFC 4226 HMAC-based one-time passwords.
//!
//! Everything here is deterministic: key bytes and a counter in, a
//! zero-padded digit string out. The TOTP driver layers time on top.

use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Sha256, Sha512};

use crate::otp::normalize;
use crate::otp::types::{Algorithm, OtpError, OtpErrorKind};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  HOTP (RFC 4226)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Compute an HOTP code from raw key bytes.
///
/// The counter is serialised as 8 big-endian bytes (RFC 4226 §5.2), keyed
/// through HMAC, dynamically truncated and reduced modulo `10^digits`. The
/// result is zero-padded to exactly `digits` characters. `digits` must be
/// in `1..=9` so the modulus fits in a `u32`.
pub fn hotp_raw(
    key: &[u8],
    counter: u64,
    digits: u8,
    algorithm: Algorithm,
) -> Result<String, OtpError> {
    if digits == 0 || digits > 9 {
        return Err(OtpError::new(
            OtpErrorKind::InvalidDigits,
            format!("Digit count must be 1 to 9, got {}", digits),
        ));
    }
    let hmac = compute_hmac(key, &counter.to_be_bytes(), algorithm)?;
    Ok(truncate(&hmac, digits))
}

/// Compute an HOTP code from a textual secret in any supported encoding.
pub fn generate_hotp(
    secret: &str,
    counter: u64,
    digits: u8,
    algorithm: Algorithm,
) -> Result<String, OtpError> {
    let key = normalize::decode_secret(secret)?;
    hotp_raw(&key, counter, digits, algorithm)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Primitives
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// HMAC the message with the requested hash. Failures from the MAC
/// primitive propagate instead of panicking.
fn compute_hmac(key: &[u8], message: &[u8], algorithm: Algorithm) -> Result<Vec<u8>, OtpError> {
    let digest = match algorithm {
        Algorithm::Sha1 => {
            let mut mac = Hmac::<Sha1>::new_from_slice(key).map_err(hmac_err)?;
            mac.update(message);
            mac.finalize().into_bytes().to_vec()
        }
        Algorithm::Sha256 => {
            let mut mac = Hmac::<Sha256>::new_from_slice(key).map_err(hmac_err)?;
            mac.update(message);
            mac.finalize().into_bytes().to_vec()
        }
        Algorithm::Sha512 => {
            let mut mac = Hmac::<Sha512>::new_from_slice(key).map_err(hmac_err)?;
            mac.update(message);
            mac.finalize().into_bytes().to_vec()
        }
    };
    Ok(digest)
}

fn hmac_err(e: impl std::fmt::Display) -> OtpError {
    OtpError::new(OtpErrorKind::HmacFailed, "HMAC computation failed").with_detail(e.to_string())
}

/// Dynamic truncation (RFC 4226 §5.3).
///
/// The offset comes from the low 4 bits of the final digest byte, so the
/// four bytes read stay inside any digest of 20 bytes or more. Masking the
/// top bit keeps the value an unambiguous 31-bit positive integer.
fn truncate(hmac: &[u8], digits: u8) -> String {
    let offset = (hmac[hmac.len() - 1] & 0x0f) as usize;
    let binary = ((hmac[offset] as u32 & 0x7f) << 24)
        | ((hmac[offset + 1] as u32) << 16)
        | ((hmac[offset + 2] as u32) << 8)
        | (hmac[offset + 3] as u32);
    let code = binary % 10u32.pow(digits as u32);
    format!("{:0>width$}", code, width = digits as usize)
}
