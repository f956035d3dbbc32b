//! Security code: the printed-only second factor
//!
//! 8 symbols from a 70-symbol alphabet (26 upper, 26 lower, 10 digits,
//! 8 specials), with at least one symbol from each class.
//!
//! Sampling is unbiased: a random byte is accepted only when it is below
//! 210 (the largest multiple of 70 that fits in a byte), otherwise it is
//! redrawn. About 82% of bytes are accepted.
//!
//! Class coverage is enforced by discarding whole candidates. With the
//! class weights above roughly 39% of 8-symbol candidates cover all four
//! classes, so a code takes about 2.6 candidates on average. The loop is
//! capped at [`MAX_CANDIDATES`]; hitting the cap means the random source
//! is broken.

use rand::rngs::OsRng;
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use sharer_core::{SharerError, SharerResult};
use zeroize::Zeroize;

use crate::CODE_LEN;

pub const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
pub const DIGITS: &str = "0123456789";
pub const SPECIAL: &str = "!@#$%^&*";

const ALPHABET_LEN: usize = 70;

/// All 70 symbols, class by class.
pub const ALPHABET: &[u8; ALPHABET_LEN] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*";

/// Upper bound on discarded candidates before giving up.
pub const MAX_CANDIDATES: usize = 1024;

/// Bytes at or above this value are rejected to avoid modulo bias.
const ACCEPT_BELOW: u8 = (256 - 256 % ALPHABET_LEN) as u8;

/// A security code, either generated or typed in by a user.
pub struct SecurityCode(SecretString);

impl Clone for SecurityCode {
    fn clone(&self) -> Self {
        Self(SecretString::from(self.expose().to_string()))
    }
}

impl SecurityCode {
    /// Validate a manually entered code: exactly 8 alphabet symbols.
    ///
    /// Class coverage is not checked here; a well-formed but wrong code is
    /// rejected later by authentication, like any other wrong guess.
    pub fn parse(input: &str) -> SharerResult<Self> {
        let trimmed = input.trim();
        let len = trimmed.chars().count();
        if len != CODE_LEN {
            return Err(SharerError::InvalidSecurityCode(format!(
                "expected {CODE_LEN} characters, got {len}"
            )));
        }
        if let Some(bad) = trimmed.chars().find(|c| !is_alphabet_symbol(*c)) {
            let class = if bad.is_whitespace() { "whitespace" } else { "symbol" };
            return Err(SharerError::InvalidSecurityCode(format!(
                "unsupported {class} in code"
            )));
        }
        Ok(Self(SecretString::from(trimmed.to_string())))
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for SecurityCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecurityCode([REDACTED])")
    }
}

fn is_alphabet_symbol(c: char) -> bool {
    c.is_ascii() && ALPHABET.contains(&(c as u8))
}

#[derive(Default)]
struct Coverage {
    upper: bool,
    lower: bool,
    digit: bool,
    special: bool,
}

impl Coverage {
    fn mark(&mut self, symbol: u8) {
        match symbol {
            b'A'..=b'Z' => self.upper = true,
            b'a'..=b'z' => self.lower = true,
            b'0'..=b'9' => self.digit = true,
            _ => self.special = true,
        }
    }

    fn complete(&self) -> bool {
        self.upper && self.lower && self.digit && self.special
    }
}

/// Draw one alphabet index without modulo bias.
pub fn sample_index<R: RngCore + ?Sized>(rng: &mut R) -> SharerResult<usize> {
    let mut byte = [0u8; 1];
    loop {
        rng.try_fill_bytes(&mut byte)
            .map_err(|e| SharerError::EntropyUnavailable(e.to_string()))?;
        if byte[0] < ACCEPT_BELOW {
            return Ok(byte[0] as usize % ALPHABET_LEN);
        }
    }
}

/// Generate a code from the OS entropy source.
pub fn generate_security_code() -> SharerResult<SecurityCode> {
    generate_security_code_with(&mut OsRng)
}

/// Generate a code from `rng`. No state is kept between calls.
pub fn generate_security_code_with<R: RngCore + ?Sized>(rng: &mut R) -> SharerResult<SecurityCode> {
    let mut candidate = [0u8; CODE_LEN];

    for attempt in 1..=MAX_CANDIDATES {
        let mut coverage = Coverage::default();
        for slot in candidate.iter_mut() {
            *slot = ALPHABET[sample_index(rng)?];
            coverage.mark(*slot);
        }

        if coverage.complete() {
            let code: String = candidate.iter().map(|&b| b as char).collect();
            candidate.zeroize();
            tracing::trace!(attempt, "security code generated");
            return Ok(SecurityCode(SecretString::from(code)));
        }
    }

    candidate.zeroize();
    Err(SharerError::EntropyUnavailable(format!(
        "no class-complete security code after {MAX_CANDIDATES} candidates"
    )))
}
