use crate::error::PhoneError;
use crate::variations::TOKEN_DIGITS;

const EXTENSION_MARKERS: [char; 5] = ['x', 'X', '#', ';', ','];

/// A phone number reduced to its digit run.
///
/// `digits` never starts with `0`; the international prefix (`+`) is only
/// recorded, never kept in the digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPhone {
    pub digits: String,
    pub has_plus_prefix: bool,
}

impl NormalizedPhone {
    pub fn len(&self) -> usize {
        self.digits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }

    /// Trailing `len` digits, if the number is at least that long.
    pub fn suffix(&self, len: usize) -> Option<&str> {
        let total = self.digits.len();
        if total < len {
            return None;
        }
        Some(&self.digits[total - len..])
    }
}

pub fn normalize_phone(raw: &str) -> Result<NormalizedPhone, PhoneError> {
    let trimmed = strip_extension(raw).trim();
    if trimmed.is_empty() {
        return Err(PhoneError::EmptyInput);
    }

    let has_plus_prefix = trimmed.starts_with('+');
    let digits = digits_only(trimmed);
    let digits = digits.trim_start_matches('0').to_string();

    Ok(NormalizedPhone {
        digits,
        has_plus_prefix,
    })
}

/// The dialable part of `raw`: everything before the first extension marker.
/// A marker ahead of any digit leaves nothing dialable.
pub fn strip_extension(raw: &str) -> &str {
    match raw.find(EXTENSION_MARKERS) {
        Some(at) if raw[..at].chars().any(|ch| ch.is_ascii_digit()) => &raw[..at],
        Some(_) => "",
        None => raw,
    }
}

pub fn digits_only(value: &str) -> String {
    value.chars().filter(|ch| ch.is_ascii_digit()).collect()
}

pub fn digit_count(value: &str) -> usize {
    value.chars().filter(|ch| ch.is_ascii_digit()).count()
}

/// Form stored for a registered user.
///
/// Always one of the variation tokens generated for the same raw input:
/// `+digits` for international input (`+` or `00`), `0digits` for trunk
/// prefixed input, bare digits otherwise. `None` when the dialable part is
/// outside the matchable digit range.
pub fn canonical_phone(value: &str) -> Option<String> {
    let phone = normalize_phone(value).ok()?;
    if !TOKEN_DIGITS.contains(&phone.len()) {
        return None;
    }

    let raw_digits = digits_only(strip_extension(value));
    let canonical = if phone.has_plus_prefix || raw_digits.starts_with("00") {
        format!("+{}", phone.digits)
    } else if raw_digits.starts_with('0') && phone.len() < *TOKEN_DIGITS.end() {
        format!("0{}", phone.digits)
    } else {
        phone.digits
    };
    Some(canonical)
}
