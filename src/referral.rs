//! Referral codes
//!
//! Codes are five characters from `A-Z0-9`. Referrer codes supplied by users
//! are checked against the same shape before anything is sent to the service.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::entropy;

pub const REFERRAL_CODE_LEN: usize = 5;

const ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

static REFERRAL_CODE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z0-9]{5}$").unwrap_or_else(|e| panic!("invalid referral regex: {}", e))
});

/// Whether `code` has the shape of a referral code (case-sensitive)
pub fn is_valid_referral_code(code: &str) -> bool {
    REFERRAL_CODE_RE.is_match(code)
}

/// Random code for display when the service could not assign one
pub fn generate_referral_code() -> String {
    let mut bytes = [0u8; REFERRAL_CODE_LEN];
    entropy::fill_random(&mut bytes);
    bytes
        .iter()
        .map(|&b| ALPHABET[b as usize % ALPHABET.len()] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_codes() {
        assert!(is_valid_referral_code("AB12C"));
        assert!(is_valid_referral_code("00000"));
        assert!(is_valid_referral_code("ZZZZZ"));
    }

    #[test]
    fn test_invalid_codes() {
        assert!(!is_valid_referral_code(""));
        assert!(!is_valid_referral_code("ab12c"));
        assert!(!is_valid_referral_code("AB12"));
        assert!(!is_valid_referral_code("AB12CD"));
        assert!(!is_valid_referral_code("AB-2C"));
        assert!(!is_valid_referral_code(" AB12C"));
    }

    #[test]
    fn test_generated_codes_are_valid() {
        for _ in 0..100 {
            let code = generate_referral_code();
            assert_eq!(code.len(), REFERRAL_CODE_LEN);
            assert!(is_valid_referral_code(&code), "bad code {}", code);
        }
    }
}
