//! TOTP driver: RFC 6238 time-based codes on top of the HOTP engine, plus
//! countdown helpers and drift-window verification.
//!
//! Every time-dependent operation has a wall-clock form and an
//! `*_at(unix_seconds)` form. The `_at` forms are the real implementation;
//! the wall-clock forms just sample the system clock and delegate, which
//! keeps all the interesting logic deterministic and testable.

use crate::otp::hotp;
use crate::otp::normalize;
use crate::otp::types::{
    Algorithm, GeneratedCode, OtpError, OtpErrorKind, OtpKind, OtpParams, VerifyResult,
};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Time-step arithmetic
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Current Unix time in seconds. A clock before the epoch reads as 0.
fn current_unix_time() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// The TOTP counter for the current time.
pub fn time_step(period: u32) -> u64 {
    time_step_at(current_unix_time(), period)
}

/// The TOTP counter for a given Unix timestamp: `unix_seconds / period`.
/// A zero period is clamped to one second here; the fallible generation
/// and verification entry points reject it instead.
pub fn time_step_at(unix_seconds: u64, period: u32) -> u64 {
    unix_seconds / period.max(1) as u64
}

/// Seconds until the current code expires, for the current time.
pub fn time_remaining(period: u32) -> u32 {
    time_remaining_at(current_unix_time(), period)
}

/// Seconds until the code for `unix_seconds` expires.
///
/// Always in `1..=period`, never 0: on an exact window boundary a fresh
/// window has just begun, so the full period is returned. Countdown
/// displays rely on this and never have to special-case a zero.
pub fn time_remaining_at(unix_seconds: u64, period: u32) -> u32 {
    let period = period.max(1) as u64;
    (period - unix_seconds % period) as u32
}

/// Fraction of the current window already elapsed, for the current time.
pub fn progress_fraction(period: u32) -> f64 {
    progress_fraction_at(current_unix_time(), period)
}

/// Fraction of the window elapsed at `unix_seconds`: 0.0 at a fresh window,
/// approaching 1.0 as the code expires.
pub fn progress_fraction_at(unix_seconds: u64, period: u32) -> f64 {
    let period = period.max(1) as u64;
    (unix_seconds % period) as f64 / period as f64
}

fn check_period(period: u32) -> Result<(), OtpError> {
    if period == 0 {
        return Err(OtpError::new(
            OtpErrorKind::InvalidPeriod,
            "Time step must be at least one second",
        ));
    }
    Ok(())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  TOTP generation (RFC 6238)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Generate a TOTP code for the current time.
pub fn generate_totp(
    secret: &str,
    digits: u8,
    period: u32,
    algorithm: Algorithm,
) -> Result<String, OtpError> {
    generate_totp_at(secret, digits, period, algorithm, current_unix_time())
}

/// Generate a TOTP code for an explicit Unix timestamp.
pub fn generate_totp_at(
    secret: &str,
    digits: u8,
    period: u32,
    algorithm: Algorithm,
    unix_seconds: u64,
) -> Result<String, OtpError> {
    check_period(period)?;
    hotp::generate_hotp(secret, time_step_at(unix_seconds, period), digits, algorithm)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Parameter-driven generation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Generate the current code plus countdown data for a parameter set.
pub fn generate_code(params: &OtpParams) -> Result<GeneratedCode, OtpError> {
    generate_code_at(params, current_unix_time())
}

/// [`generate_code`] at an explicit Unix timestamp.
///
/// For HOTP parameter sets the time is ignored and the countdown fields
/// come back zeroed; the caller owns advancing the counter.
pub fn generate_code_at(params: &OtpParams, unix_seconds: u64) -> Result<GeneratedCode, OtpError> {
    match params.kind {
        OtpKind::Totp => {
            check_period(params.period)?;
            let counter = time_step_at(unix_seconds, params.period);
            let code =
                hotp::generate_hotp(&params.secret, counter, params.digits, params.algorithm)?;
            Ok(GeneratedCode {
                code,
                remaining_seconds: time_remaining_at(unix_seconds, params.period),
                period: params.period,
                progress: progress_fraction_at(unix_seconds, params.period),
                counter,
            })
        }
        OtpKind::Hotp => {
            let code = hotp::generate_hotp(
                &params.secret,
                params.counter,
                params.digits,
                params.algorithm,
            )?;
            Ok(GeneratedCode {
                code,
                remaining_seconds: 0,
                period: 0,
                progress: 0.0,
                counter: params.counter,
            })
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Verification
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Verify a submitted code against a parameter set at the current time.
pub fn verify_code(
    params: &OtpParams,
    code: &str,
    drift_window: u32,
) -> Result<VerifyResult, OtpError> {
    verify_code_at(params, code, drift_window, current_unix_time())
}

/// [`verify_code`] at an explicit Unix timestamp.
///
/// TOTP checks `drift_window` steps either side of the current one; HOTP
/// only looks ahead of the stored counter, since a counter never moves
/// backwards. A malformed code (wrong length, non-digits) verifies false
/// without touching the HMAC; bad parameters still error. Comparison is
/// constant-time per candidate.
pub fn verify_code_at(
    params: &OtpParams,
    code: &str,
    drift_window: u32,
    unix_seconds: u64,
) -> Result<VerifyResult, OtpError> {
    let code = code.trim();
    if code.len() != params.digits as usize || !code.chars().all(|c| c.is_ascii_digit()) {
        return Ok(VerifyResult::no_match());
    }

    let key = normalize::decode_secret(&params.secret)?;
    let base = match params.kind {
        OtpKind::Totp => {
            check_period(params.period)?;
            time_step_at(unix_seconds, params.period)
        }
        OtpKind::Hotp => params.counter,
    };
    let start = match params.kind {
        OtpKind::Totp => base.saturating_sub(drift_window as u64),
        OtpKind::Hotp => base,
    };
    let end = base.saturating_add(drift_window as u64);

    for candidate in start..=end {
        let expected = hotp::hotp_raw(&key, candidate, params.digits, params.algorithm)?;
        if constant_time_eq(expected.as_bytes(), code.as_bytes()) {
            let drift = candidate as i64 - base as i64;
            log::debug!("code verified, drift {} steps", drift);
            return Ok(VerifyResult {
                valid: true,
                drift,
                matched_counter: Some(candidate),
            });
        }
    }

    log::debug!("code rejected within a window of {} steps", drift_window);
    Ok(VerifyResult::no_match())
}

/// Byte comparison whose timing does not depend on where a mismatch sits.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 6238 Appendix B seeds. The SHA-1 seed is the RFC 4226 key, ASCII
    // "12345678901234567890", spelled in base32; the longer hashes stretch
    // the same digit pattern to 32 and 64 bytes.
    const SEED_SHA1_B32: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";
    const SEED_SHA256: &[u8] = b"12345678901234567890123456789012";
    const SEED_SHA512: &[u8] =
        b"1234567890123456789012345678901234567890123456789012345678901234";

    // ── RFC 6238 test vectors (Appendix B) ───────────────────────

    #[test]
    fn rfc6238_sha1_vectors() {
        let cases = [
            (59u64, "94287082"),
            (1111111109, "07081804"),
            (1111111111, "14050471"),
            (1234567890, "89005924"),
            (2000000000, "69279037"),
            (20000000000, "65353130"),
        ];
        for (time, want) in cases {
            let code = generate_totp_at(SEED_SHA1_B32, 8, 30, Algorithm::Sha1, time).unwrap();
            assert_eq!(code, want, "time {}", time);
        }
    }

    #[test]
    fn rfc6238_sha256_vectors() {
        let secret = normalize::encode_secret(SEED_SHA256);
        let cases = [(59u64, "46119246"), (20000000000, "77737706")];
        for (time, want) in cases {
            let code = generate_totp_at(&secret, 8, 30, Algorithm::Sha256, time).unwrap();
            assert_eq!(code, want, "time {}", time);
        }
    }

    #[test]
    fn rfc6238_sha512_vectors() {
        let secret = normalize::encode_secret(SEED_SHA512);
        let cases = [(59u64, "90693936"), (20000000000, "47863826")];
        for (time, want) in cases {
            let code = generate_totp_at(&secret, 8, 30, Algorithm::Sha512, time).unwrap();
            assert_eq!(code, want, "time {}", time);
        }
    }

    #[test]
    fn hex_secret_reaches_the_same_vectors() {
        // The RFC seed spelled as hex must classify as hex and decode to
        // the identical key bytes.
        let hex = "3132333435363738393031323334353637383930";
        let code = generate_totp_at(hex, 8, 30, Algorithm::Sha1, 59).unwrap();
        assert_eq!(code, "94287082");
    }

    #[test]
    fn ascii_secret_uses_literal_bytes() {
        let secret = "correct horse battery staple!";
        let cleaned = b"correcthorsebatterystaple!";
        let via_driver = generate_totp_at(secret, 6, 30, Algorithm::Sha1, 1234567890).unwrap();
        let via_engine = hotp::hotp_raw(cleaned, 1234567890 / 30, 6, Algorithm::Sha1).unwrap();
        assert_eq!(via_driver, via_engine);
    }

    #[test]
    fn leading_zeros_are_preserved() {
        let code = generate_totp_at(SEED_SHA1_B32, 8, 30, Algorithm::Sha1, 1111111109).unwrap();
        assert!(code.starts_with('0'));
        assert_eq!(code.len(), 8);
    }

    // ── Windows ──────────────────────────────────────────────────

    #[test]
    fn codes_are_stable_within_a_window() {
        let first = generate_totp_at(SEED_SHA1_B32, 6, 30, Algorithm::Sha1, 0).unwrap();
        for t in 1..30 {
            let code = generate_totp_at(SEED_SHA1_B32, 6, 30, Algorithm::Sha1, t).unwrap();
            assert_eq!(code, first, "time {}", t);
        }
        let next = generate_totp_at(SEED_SHA1_B32, 6, 30, Algorithm::Sha1, 30).unwrap();
        assert_ne!(next, first);
    }

    #[test]
    fn totp_counter_0_matches_hotp_counter_0() {
        // Inside the first window TOTP is exactly HOTP at counter 0.
        let code = generate_totp_at(SEED_SHA1_B32, 6, 30, Algorithm::Sha1, 15).unwrap();
        assert_eq!(code, "755224");
    }

    #[test]
    fn time_step_division() {
        assert_eq!(time_step_at(0, 30), 0);
        assert_eq!(time_step_at(29, 30), 0);
        assert_eq!(time_step_at(30, 30), 1);
        assert_eq!(time_step_at(59, 30), 1);
        assert_eq!(time_step_at(60, 30), 2);
        assert_eq!(time_step_at(1111111109, 30), 37037036);
        assert_eq!(time_step_at(90, 45), 2);
    }

    // ── Countdown ────────────────────────────────────────────────

    #[test]
    fn time_remaining_counts_down_and_wraps_to_full_period() {
        assert_eq!(time_remaining_at(0, 30), 30);
        assert_eq!(time_remaining_at(1, 30), 29);
        assert_eq!(time_remaining_at(29, 30), 1);
        assert_eq!(time_remaining_at(30, 30), 30);
        assert_eq!(time_remaining_at(59, 30), 1);
        assert_eq!(time_remaining_at(60, 30), 30);
    }

    #[test]
    fn time_remaining_is_never_zero() {
        for t in 0..=300 {
            let remaining = time_remaining_at(t, 30);
            assert!((1..=30).contains(&remaining), "time {}", t);
        }
        for t in 0..=120 {
            let remaining = time_remaining_at(t, 60);
            assert!((1..=60).contains(&remaining), "time {}", t);
        }
    }

    #[test]
    fn time_remaining_handles_zero_period() {
        // Clamped to a one-second window instead of dividing by zero.
        assert_eq!(time_remaining_at(12345, 0), 1);
    }

    #[test]
    fn progress_fraction_spans_the_window() {
        assert_eq!(progress_fraction_at(0, 30), 0.0);
        assert_eq!(progress_fraction_at(15, 30), 0.5);
        let late = progress_fraction_at(29, 30);
        assert!(late > 0.96 && late < 1.0);
        for t in 0..300 {
            let p = progress_fraction_at(t, 30);
            assert!((0.0..1.0).contains(&p), "time {}", t);
        }
    }

    // ── Error paths ──────────────────────────────────────────────

    #[test]
    fn empty_secret_is_rejected() {
        let err = generate_totp_at("", 6, 30, Algorithm::Sha1, 59).unwrap_err();
        assert_eq!(err.kind, OtpErrorKind::EmptySecret);
        assert!(err.message.to_lowercase().contains("empty"));
    }

    #[test]
    fn zero_period_is_rejected() {
        let err = generate_totp_at(SEED_SHA1_B32, 6, 0, Algorithm::Sha1, 59).unwrap_err();
        assert_eq!(err.kind, OtpErrorKind::InvalidPeriod);
    }

    #[test]
    fn bad_digit_count_propagates() {
        let err = generate_totp_at(SEED_SHA1_B32, 0, 30, Algorithm::Sha1, 59).unwrap_err();
        assert_eq!(err.kind, OtpErrorKind::InvalidDigits);
    }

    // ── Parameter-driven generation ──────────────────────────────

    #[test]
    fn generate_code_totp_fields() {
        let params = OtpParams::new(SEED_SHA1_B32);
        let generated = generate_code_at(&params, 59).unwrap();
        assert_eq!(generated.code, "287082");
        assert_eq!(generated.remaining_seconds, 1);
        assert_eq!(generated.period, 30);
        assert_eq!(generated.counter, 1);
        assert!(generated.progress > 0.9);
    }

    #[test]
    fn generate_code_fresh_window() {
        let params = OtpParams::new(SEED_SHA1_B32);
        let generated = generate_code_at(&params, 60).unwrap();
        assert_eq!(generated.remaining_seconds, 30);
        assert_eq!(generated.counter, 2);
        assert_eq!(generated.progress, 0.0);
    }

    #[test]
    fn generate_code_hotp_ignores_time() {
        let params = OtpParams::new(SEED_SHA1_B32).as_hotp(3);
        let at_59 = generate_code_at(&params, 59).unwrap();
        let at_60 = generate_code_at(&params, 60).unwrap();
        assert_eq!(at_59.code, "969429");
        assert_eq!(at_59.code, at_60.code);
        assert_eq!(at_59.counter, 3);
        assert_eq!(at_59.remaining_seconds, 0);
        assert_eq!(at_59.period, 0);
        assert_eq!(at_59.progress, 0.0);
    }

    #[test]
    fn generate_code_respects_digits_and_algorithm() {
        let params = OtpParams::new(SEED_SHA1_B32)
            .with_digits(8)
            .with_algorithm(Algorithm::Sha1);
        let generated = generate_code_at(&params, 59).unwrap();
        assert_eq!(generated.code, "94287082");
    }

    // ── Verification ─────────────────────────────────────────────

    #[test]
    fn verify_exact_match() {
        let params = OtpParams::new(SEED_SHA1_B32);
        let result = verify_code_at(&params, "287082", 0, 59).unwrap();
        assert!(result.valid);
        assert_eq!(result.drift, 0);
        assert_eq!(result.matched_counter, Some(1));
    }

    #[test]
    fn verify_accepts_previous_window_within_drift() {
        let params = OtpParams::new(SEED_SHA1_B32);
        // "755224" belongs to step 0; at time 59 we are in step 1.
        let strict = verify_code_at(&params, "755224", 0, 59).unwrap();
        assert!(!strict.valid);
        let relaxed = verify_code_at(&params, "755224", 1, 59).unwrap();
        assert!(relaxed.valid);
        assert_eq!(relaxed.drift, -1);
        assert_eq!(relaxed.matched_counter, Some(0));
    }

    #[test]
    fn verify_accepts_next_window_within_drift() {
        let params = OtpParams::new(SEED_SHA1_B32);
        // "359152" belongs to step 2; at time 59 we are in step 1.
        let result = verify_code_at(&params, "359152", 1, 59).unwrap();
        assert!(result.valid);
        assert_eq!(result.drift, 1);
        assert_eq!(result.matched_counter, Some(2));
    }

    #[test]
    fn verify_rejects_wrong_code() {
        let params = OtpParams::new(SEED_SHA1_B32);
        let result = verify_code_at(&params, "000000", 3, 59).unwrap();
        assert!(!result.valid);
        assert_eq!(result.matched_counter, None);
    }

    #[test]
    fn verify_rejects_malformed_codes_without_erroring() {
        let params = OtpParams::new(SEED_SHA1_B32);
        assert!(!verify_code_at(&params, "12345", 1, 59).unwrap().valid);
        assert!(!verify_code_at(&params, "1234567", 1, 59).unwrap().valid);
        assert!(!verify_code_at(&params, "28708a", 1, 59).unwrap().valid);
        assert!(!verify_code_at(&params, "", 1, 59).unwrap().valid);
    }

    #[test]
    fn verify_trims_surrounding_whitespace() {
        let params = OtpParams::new(SEED_SHA1_B32);
        let result = verify_code_at(&params, " 287082\n", 0, 59).unwrap();
        assert!(result.valid);
    }

    #[test]
    fn verify_hotp_exact_counter() {
        let params = OtpParams::new(SEED_SHA1_B32).as_hotp(0);
        let result = verify_code_at(&params, "755224", 0, 0).unwrap();
        assert!(result.valid);
        assert_eq!(result.matched_counter, Some(0));
    }

    #[test]
    fn verify_hotp_looks_ahead_only() {
        // Counter at 2: the code for 5 is inside a look-ahead of 3, the
        // code for 1 is behind the counter and never matches.
        let params = OtpParams::new(SEED_SHA1_B32).as_hotp(2);
        let ahead = verify_code_at(&params, "254676", 3, 0).unwrap();
        assert!(ahead.valid);
        assert_eq!(ahead.drift, 3);
        assert_eq!(ahead.matched_counter, Some(5));
        let behind = verify_code_at(&params, "287082", 3, 0).unwrap();
        assert!(!behind.valid);
    }

    #[test]
    fn verify_empty_secret_errors() {
        let params = OtpParams::new("");
        let err = verify_code_at(&params, "123456", 1, 59).unwrap_err();
        assert_eq!(err.kind, OtpErrorKind::EmptySecret);
    }

    // ── Constant-time comparison ─────────────────────────────────

    #[test]
    fn constant_time_eq_basics() {
        assert!(constant_time_eq(b"123456", b"123456"));
        assert!(!constant_time_eq(b"123456", b"123457"));
        assert!(!constant_time_eq(b"123456", b"12345"));
        assert!(constant_time_eq(b"", b""));
    }
}
