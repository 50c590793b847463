use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

pub const DEFAULT_MAX_CONTACTS: usize = 5000;

/// One address-book entry as uploaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawContact {
    pub name: String,
    pub phone: String,
}

impl RawContact {
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
        }
    }
}

/// Validates an upload body of the form `{"contacts": [{"name", "phone"}, ...]}`.
///
/// The whole upload is rejected on the first malformed entry.
pub fn parse_upload(body: &Value, max_contacts: usize) -> Result<Vec<RawContact>, ValidationError> {
    let contacts = match body.get("contacts") {
        None | Some(Value::Null) => return Err(ValidationError::MissingContacts),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(ValidationError::ContactsNotAList),
    };

    if contacts.is_empty() {
        return Err(ValidationError::EmptyContacts);
    }
    if contacts.len() > max_contacts {
        return Err(ValidationError::TooManyContacts {
            count: contacts.len(),
            max: max_contacts,
        });
    }

    contacts
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            parse_contact(entry).ok_or(ValidationError::InvalidContact { index })
        })
        .collect()
}

fn parse_contact(entry: &Value) -> Option<RawContact> {
    let name = match entry.get("name")? {
        Value::String(name) if !name.trim().is_empty() => name.clone(),
        _ => return None,
    };
    let phone = match entry.get("phone")? {
        Value::String(phone) if !phone.trim().is_empty() => phone.clone(),
        Value::Number(number) => render_number(number)?,
        _ => return None,
    };
    Some(RawContact { name, phone })
}

/// Integral numbers render without a fraction, so `4155551234.0` reads as `4155551234`.
fn render_number(number: &Number) -> Option<String> {
    if !number.is_f64() {
        return Some(number.to_string());
    }
    let value = number.as_f64()?;
    if value.fract() != 0.0 || value.abs() >= 1e15 {
        return None;
    }
    Some(format!("{value:.0}"))
}
