pub mod contact;
pub mod ids;
pub mod phone;
pub mod user;

pub use contact::{parse_upload, RawContact, DEFAULT_MAX_CONTACTS};
pub use ids::UserId;
pub use phone::{
    canonical_phone, digit_count, digits_only, normalize_phone, strip_extension, NormalizedPhone,
};
pub use user::{parse_date_of_birth, DirectoryUser, Gender};
