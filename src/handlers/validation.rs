use crate::errors::ApiError;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref EMAIL: Option<Regex> = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok();
}

const COUNTRY_CODE: &str = "55";

pub fn valid_email(email: &str) -> bool {
    EMAIL.as_ref().map_or(false, |re| re.is_match(email))
}

fn all_digits(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_digit())
}

/// Member phones are entered as area code + number (11 digits) and stored
/// with the country code prefix. Already-prefixed numbers are kept.
pub fn normalize_member_phone(raw: &str) -> Result<String, ApiError> {
    let phone = raw.trim();
    match phone.len() {
        11 if all_digits(phone) => Ok(format!("{}{}", COUNTRY_CODE, phone)),
        13 if all_digits(phone) && phone.starts_with(COUNTRY_CODE) => Ok(phone.to_string()),
        _ => Err(ApiError::validation(
            "Phone number must have 11 digits (area code + number)",
        )),
    }
}

/// Partner phones are stored as given and must already carry the country code.
pub fn validate_partner_phone(raw: &str) -> Result<String, ApiError> {
    let phone = raw.trim();
    if phone.len() == 13 && all_digits(phone) {
        Ok(phone.to_string())
    } else {
        Err(ApiError::validation("Phone number must have 13 digits"))
    }
}

pub fn require(value: &str, field: &str) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ApiError::validation(format!("{} is required", field)))
    } else {
        Ok(trimmed.to_string())
    }
}
