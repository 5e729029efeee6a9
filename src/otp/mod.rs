//! One-time password generation: types, secret normalisation, the HOTP
//! engine and the TOTP driver.

pub mod hotp;
pub mod normalize;
pub mod totp;
pub mod types;

pub use hotp::{generate_hotp, hotp_raw};
pub use normalize::{decode_secret, encode_secret, generate_secret, SecretEncoding};
pub use totp::{
    generate_code, generate_code_at, generate_totp, generate_totp_at, progress_fraction,
    progress_fraction_at, time_remaining, time_remaining_at, time_step, time_step_at, verify_code,
    verify_code_at,
};
pub use types::*;
