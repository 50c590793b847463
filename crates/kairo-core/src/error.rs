use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("phone number is required")]
    EmptyPhone,
    #[error("phone number has no digits: {0}")]
    InvalidPhone(String),
    #[error("invalid gender: {0}")]
    InvalidGender(String),
    #[error("invalid date of birth: {0}")]
    InvalidDateOfBirth(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PhoneError {
    #[error("phone number is empty")]
    EmptyInput,
}

#[derive(Debug, Error)]
pub enum DialingTableError {
    #[error("invalid calling code: {0:?}")]
    InvalidCode(String),
    #[error("duplicate calling code: {0}")]
    DuplicateCode(String),
    #[error("invalid strip length {strip_length} for calling code {code}")]
    InvalidStripLength { code: String, strip_length: usize },
    #[error("invalid local length {length} for calling code {code}")]
    InvalidLocalLength { code: String, length: usize },
    #[error("calling code {0} accepts no local lengths")]
    MissingLocalLengths(String),
    #[error("invalid fallback calling code: {0:?}")]
    InvalidFallbackCode(String),
    #[error("failed to read dialing codes {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse dialing codes: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("contacts array is required")]
    MissingContacts,
    #[error("contacts must be an array")]
    ContactsNotAList,
    #[error("contacts array cannot be empty")]
    EmptyContacts,
    #[error("too many contacts: {count} (max {max})")]
    TooManyContacts { count: usize, max: usize },
    #[error("contact at index {index} must have both name and phone")]
    InvalidContact { index: usize },
}

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("directory unavailable: {0}")]
    Unavailable(String),
    #[error("directory backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl DirectoryError {
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        DirectoryError::Backend(Box::new(err))
    }
}

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("directory lookup failed in batch {batch}: {source}")]
    DirectoryUnavailable {
        batch: usize,
        #[source]
        source: DirectoryError,
    },
    #[error("failed to start matcher workers: {0}")]
    Workers(#[from] rayon::ThreadPoolBuildError),
}
