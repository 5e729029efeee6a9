//! # otpkit: TOTP / HOTP one-time password generation
//!
//! An RFC 6238 / RFC 4226 code engine:
//!
//! - **Secret normalisation**: hex, base32 (any case, padding optional) and
//!   raw ASCII secrets, with spaces and dashes tolerated anywhere
//! - **HOTP** (RFC 4226): SHA-1/SHA-256/SHA-512, dynamic truncation,
//!   1 to 9 digits
//! - **TOTP** (RFC 6238): time-step counters, expiry countdown and progress
//!   helpers that never report a dead window
//! - **Verification**: drift-window checking with constant-time comparison
//!
//! Time-dependent operations come in pairs: a wall-clock form and an
//! `*_at(unix_seconds)` form for deterministic callers and tests.
//!
//! ```
//! use otpkit::otp::{generate_code, OtpParams};
//!
//! let params = OtpParams::new("JBSW Y3DP-EHPK 3PXP");
//! let generated = generate_code(&params)?;
//! println!("{} ({}s left)", generated.code, generated.remaining_seconds);
//! # Ok::<(), otpkit::otp::OtpError>(())
//! ```

pub mod otp;
