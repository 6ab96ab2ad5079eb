//! One-time password generation.

use rand::Rng;

/// Number of digits in an OTP.
pub const OTP_DIGITS: usize = 4;

/// Generates a numeric OTP of [`OTP_DIGITS`] digits.
///
/// Each digit is drawn independently from `0..=9`, so leading zeros are kept.
pub fn generate_otp() -> String {
    let mut rng = rand::rng();
    (0..OTP_DIGITS)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}

/// Returns true if `candidate` looks like an OTP this service could have issued.
pub fn is_well_formed(candidate: &str) -> bool {
    candidate.len() == OTP_DIGITS && candidate.bytes().all(|b| b.is_ascii_digit())
}
