//! Core types for TOTP/HOTP code generation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default time-step window in seconds (RFC 6238 recommended value).
pub const DEFAULT_TIME_STEP: u32 = 30;

/// Default number of digits in a generated code.
pub const DEFAULT_DIGITS: u8 = 6;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Algorithm
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Hash algorithm used for the HMAC step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Algorithm {
    Sha1,
    Sha256,
    Sha512,
}

impl Default for Algorithm {
    fn default() -> Self {
        Self::Sha1
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha1 => write!(f, "SHA1"),
            Self::Sha256 => write!(f, "SHA256"),
            Self::Sha512 => write!(f, "SHA512"),
        }
    }
}

impl Algorithm {
    /// Parse from a case-insensitive string.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "SHA1" | "SHA-1" | "HMACSHA1" | "HMAC-SHA1" => Some(Self::Sha1),
            "SHA256" | "SHA-256" | "HMACSHA256" | "HMAC-SHA256" => Some(Self::Sha256),
            "SHA512" | "SHA-512" | "HMACSHA512" | "HMAC-SHA512" => Some(Self::Sha512),
            _ => None,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  OTP kind
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Time-based or counter-based one-time password.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpKind {
    Totp,
    Hotp,
}

impl Default for OtpKind {
    fn default() -> Self {
        Self::Totp
    }
}

impl fmt::Display for OtpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Totp => write!(f, "totp"),
            Self::Hotp => write!(f, "hotp"),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Generation parameters
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The parameters that define a code stream for one identity.
///
/// This is a plain value object: callers that manage many identities keep
/// one of these per secret and hand it to [`generate_code`] or
/// [`verify_code`] whenever a fresh code is needed. Nothing here is mutated
/// by the generator, including the HOTP `counter` (advancing it after a
/// successful verification is the caller's job).
///
/// [`generate_code`]: crate::otp::totp::generate_code
/// [`verify_code`]: crate::otp::totp::verify_code
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpParams {
    /// Secret in any supported textual encoding (hex, base32, ASCII),
    /// separators tolerated. Decoded fresh on every call.
    pub secret: String,
    /// Hash algorithm.
    #[serde(default)]
    pub algorithm: Algorithm,
    /// Number of digits in the generated code (1 to 9, normally 6 or 8).
    #[serde(default = "default_digits")]
    pub digits: u8,
    /// Time-step window in seconds (TOTP only).
    #[serde(default = "default_period")]
    pub period: u32,
    /// Time-based or counter-based.
    #[serde(default)]
    pub kind: OtpKind,
    /// Counter value (HOTP only).
    #[serde(default)]
    pub counter: u64,
}

fn default_digits() -> u8 {
    DEFAULT_DIGITS
}

fn default_period() -> u32 {
    DEFAULT_TIME_STEP
}

impl Default for OtpParams {
    fn default() -> Self {
        Self::new("")
    }
}

impl OtpParams {
    /// Create TOTP parameters with the default window, digits and algorithm.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            algorithm: Algorithm::default(),
            digits: DEFAULT_DIGITS,
            period: DEFAULT_TIME_STEP,
            kind: OtpKind::Totp,
            counter: 0,
        }
    }

    /// Builder: set algorithm.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Builder: set digit count.
    pub fn with_digits(mut self, digits: u8) -> Self {
        self.digits = digits;
        self
    }

    /// Builder: set the time-step window.
    pub fn with_period(mut self, period: u32) -> Self {
        self.period = period;
        self
    }

    /// Builder: switch to counter-based HOTP at the given counter.
    pub fn as_hotp(mut self, counter: u64) -> Self {
        self.kind = OtpKind::Hotp;
        self.counter = counter;
        self
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Generated code result
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A generated code plus the timing callers need for countdown display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedCode {
    /// The code string, zero-padded to its digit count (e.g. "004957").
    pub code: String,
    /// Seconds left in the current window, in `1..=period` (TOTP only).
    pub remaining_seconds: u32,
    /// The window the code belongs to, in seconds (TOTP only).
    pub period: u32,
    /// Fraction of the window already elapsed, 0.0 fresh to 1.0 expiring.
    pub progress: f64,
    /// The time step (TOTP) or counter (HOTP) the code was derived from.
    pub counter: u64,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Verification result
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Result of checking a submitted code against [`OtpParams`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResult {
    pub valid: bool,
    /// How many time steps or counters off the match was (0 = exact).
    pub drift: i64,
    /// The counter value that matched (if any).
    pub matched_counter: Option<u64>,
}

impl VerifyResult {
    /// The "nothing matched" result.
    pub fn no_match() -> Self {
        Self {
            valid: false,
            drift: 0,
            matched_counter: None,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Error type
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Error kind for this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OtpErrorKind {
    EmptySecret,
    InvalidSecret,
    InvalidDigits,
    InvalidPeriod,
    HmacFailed,
}

/// Crate-level error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpError {
    pub kind: OtpErrorKind,
    pub message: String,
    pub detail: Option<String>,
}

impl fmt::Display for OtpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.kind, self.message)?;
        if let Some(d) = &self.detail {
            write!(f, " ({})", d)?;
        }
        Ok(())
    }
}

impl std::error::Error for OtpError {}

impl OtpError {
    pub fn new(kind: OtpErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            message: msg.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl From<OtpError> for String {
    fn from(e: OtpError) -> String {
        e.to_string()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Display helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Format a code with a space in the middle (e.g. "123 456").
pub fn format_code_display(code: &str) -> String {
    if code.len() <= 4 {
        return code.to_string();
    }
    let mid = code.len() / 2;
    format!("{} {}", &code[..mid], &code[mid..])
}
