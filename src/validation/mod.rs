use bigdecimal::BigDecimal;
use std::fmt;
use std::str::FromStr;

pub const PHONE_NUMBER_LEN: usize = 10;
/// Upper bound on the textual length of an amount. This is a length check,
/// not a numeric range: "0.00000001" passes while "12345678901" does not.
pub const AMOUNT_INPUT_MAX_LEN: usize = 10;
pub const AMOUNT_SCALE: i64 = 2;

pub const PHONE_REQUIRED: &str = "Phone number is required";
pub const PHONE_INVALID: &str = "Invalid phone number format. Use format: 09xxxxxxx or 07xxxxxxx";
pub const AMOUNT_REQUIRED: &str = "Amount is required";
pub const AMOUNT_INVALID: &str = "Invalid amount. Amount must be a positive number";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), ValidationError>;

/// A field counts as missing when it is blank or the literal `"0"`.
pub fn is_missing(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value == "0"
}

pub fn validate_required(field: &'static str, value: &str, message: &str) -> ValidationResult {
    if is_missing(value) {
        return Err(ValidationError::new(field, message));
    }

    Ok(())
}

/// Local mobile-subscriber numbers: ten digits, `0` then `7` or `9`.
pub fn validate_phone_number(phone: &str) -> bool {
    let bytes = phone.as_bytes();

    bytes.len() == PHONE_NUMBER_LEN
        && bytes[0] == b'0'
        && matches!(bytes[1], b'7' | b'9')
        && bytes[2..].iter().all(u8::is_ascii_digit)
}

pub fn validate_amount(amount: &str) -> bool {
    parse_positive(amount).is_some() && amount.len() <= AMOUNT_INPUT_MAX_LEN
}

/// Parses an intake amount, rounding to two fractional digits.
pub fn parse_amount(amount: &str) -> Result<BigDecimal, ValidationError> {
    if !validate_amount(amount) {
        return Err(ValidationError::new("amount", AMOUNT_INVALID));
    }

    parse_positive(amount)
        .map(|value| value.round(AMOUNT_SCALE).with_scale(AMOUNT_SCALE))
        .ok_or_else(|| ValidationError::new("amount", AMOUNT_INVALID))
}

fn parse_positive(amount: &str) -> Option<BigDecimal> {
    BigDecimal::from_str(amount)
        .ok()
        .filter(|value| value > &BigDecimal::from(0))
}

/// Runs the intake checks in order and returns the normalised amount.
pub fn validate_intake(phone: &str, amount: &str) -> Result<BigDecimal, ValidationError> {
    validate_required("phone", phone, PHONE_REQUIRED)?;
    if !validate_phone_number(phone) {
        return Err(ValidationError::new("phone", PHONE_INVALID));
    }

    validate_required("amount", amount, AMOUNT_REQUIRED)?;
    parse_amount(amount)
}
