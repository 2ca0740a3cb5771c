use regex::Regex;
use lazy_static::lazy_static;

lazy_static! {
    static ref URL_CREDENTIALS_REGEX: Regex = Regex::new(r"(?i)\b([a-z][a-z0-9+.-]*://)[^/\s:@]+:[^/\s@]+@").unwrap();
    static ref EMAIL_REGEX: Regex = Regex::new(r"(?i)[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,4}").unwrap();
}

/// Masks connection-string credentials first so their host part is not read as an e-mail.
pub fn mask_pii(input: &str) -> String {
    let masked = URL_CREDENTIALS_REGEX.replace_all(input, "${1}***:***@");
    EMAIL_REGEX.replace_all(&masked, "***@***.***").to_string()
}
