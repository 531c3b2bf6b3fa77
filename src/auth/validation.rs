use lazy_static::lazy_static;
use regex::Regex;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Spanish DNI/NIE shape: `X`, `Y`, `Z` or a digit, seven digits, then a
/// control letter other than I, O, U. Either ASCII case is accepted; the
/// control letter itself is not checked.
pub(crate) fn is_valid_national_id(value: &str) -> bool {
    lazy_static! {
        static ref NATIONAL_ID_RE: Regex =
            Regex::new(r"^[XYZxyz0-9][0-9]{7}[A-HJ-NP-TV-Za-hj-np-tv-z]$").unwrap();
    }
    NATIONAL_ID_RE.is_match(value)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
