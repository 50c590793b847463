use crate::domain::DirectoryUser;
use crate::error::DirectoryError;

/// How many trailing digits of a pattern are also tried as a bare suffix.
pub const PATTERN_TAIL_DIGITS: usize = 10;

/// Read-only view of the registered-user directory.
///
/// Implementations return users ordered by registration time, then id, so
/// repeated runs against an unchanged directory see the same order.
pub trait Directory: Send + Sync {
    /// Users whose canonical phone equals one of `tokens` verbatim.
    fn find_by_exact_phone_set(&self, tokens: &[String])
        -> Result<Vec<DirectoryUser>, DirectoryError>;

    /// Up to `limit` users whose canonical phone starts with, ends with or
    /// contains `digits`, or ends with its last ten digits.
    fn find_by_phone_pattern(
        &self,
        digits: &str,
        limit: usize,
    ) -> Result<Vec<DirectoryUser>, DirectoryError>;

    /// One result list per pattern, aligned with `patterns`.
    fn find_by_phone_patterns(
        &self,
        patterns: &[String],
        limit: usize,
    ) -> Result<Vec<Vec<DirectoryUser>>, DirectoryError> {
        patterns
            .iter()
            .map(|digits| self.find_by_phone_pattern(digits, limit))
            .collect()
    }
}

impl<T: Directory + ?Sized> Directory for &T {
    fn find_by_exact_phone_set(
        &self,
        tokens: &[String],
    ) -> Result<Vec<DirectoryUser>, DirectoryError> {
        (**self).find_by_exact_phone_set(tokens)
    }

    fn find_by_phone_pattern(
        &self,
        digits: &str,
        limit: usize,
    ) -> Result<Vec<DirectoryUser>, DirectoryError> {
        (**self).find_by_phone_pattern(digits, limit)
    }

    fn find_by_phone_patterns(
        &self,
        patterns: &[String],
        limit: usize,
    ) -> Result<Vec<Vec<DirectoryUser>>, DirectoryError> {
        (**self).find_by_phone_patterns(patterns, limit)
    }
}

/// In-memory evaluation of the pattern semantics shared by every backend.
pub fn phone_matches_pattern(phone: &str, digits: &str) -> bool {
    if digits.is_empty() {
        return false;
    }
    let tail = &digits[digits.len().saturating_sub(PATTERN_TAIL_DIGITS)..];
    phone.contains(digits) || phone.ends_with(tail)
}

/// A directory held in memory, ordered like the persistent store.
#[derive(Debug, Clone, Default)]
pub struct MemoryDirectory {
    users: Vec<DirectoryUser>,
}

impl MemoryDirectory {
    pub fn new(mut users: Vec<DirectoryUser>) -> Self {
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Self { users }
    }

    pub fn users(&self) -> &[DirectoryUser] {
        &self.users
    }
}

impl Directory for MemoryDirectory {
    fn find_by_exact_phone_set(
        &self,
        tokens: &[String],
    ) -> Result<Vec<DirectoryUser>, DirectoryError> {
        Ok(self
            .users
            .iter()
            .filter(|user| tokens.iter().any(|token| *token == user.phone_number))
            .cloned()
            .collect())
    }

    fn find_by_phone_pattern(
        &self,
        digits: &str,
        limit: usize,
    ) -> Result<Vec<DirectoryUser>, DirectoryError> {
        Ok(self
            .users
            .iter()
            .filter(|user| phone_matches_pattern(&user.phone_number, digits))
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::{phone_matches_pattern, Directory, MemoryDirectory};
    use crate::domain::{DirectoryUser, UserId};

    fn user(phone: &str, created_at: i64) -> DirectoryUser {
        DirectoryUser {
            id: UserId::new(),
            name: None,
            phone_number: phone.to_string(),
            profile_picture: None,
            date_of_birth: None,
            gender: None,
            created_at,
        }
    }

    #[test]
    fn pattern_matches_prefix_suffix_and_substring() {
        assert!(phone_matches_pattern("+14155551234", "1415555"));
        assert!(phone_matches_pattern("+14155551234", "5551234"));
        assert!(phone_matches_pattern("+14155551234", "4155551"));
        assert!(!phone_matches_pattern("+14155551234", "9995551"));
        assert!(!phone_matches_pattern("+14155551234", ""));
    }

    #[test]
    fn pattern_tail_matches_shorter_stored_numbers() {
        // the stored number lacks the leading calling code of the pattern
        assert!(phone_matches_pattern("4155551234", "9914155551234"));
    }

    #[test]
    fn memory_directory_orders_by_registration() {
        let late = user("+14155550002", 20);
        let early = user("+14155550001", 10);
        let directory = MemoryDirectory::new(vec![late.clone(), early.clone()]);

        let found = directory.find_by_phone_pattern("415555", 10).unwrap();
        assert_eq!(found, vec![early.clone(), late]);

        let limited = directory.find_by_phone_pattern("415555", 1).unwrap();
        assert_eq!(limited, vec![early]);
    }

    #[test]
    fn exact_lookup_is_verbatim() {
        let directory = MemoryDirectory::new(vec![user("+14155551234", 1)]);
        let hit = directory
            .find_by_exact_phone_set(&["+14155551234".to_string()])
            .unwrap();
        assert_eq!(hit.len(), 1);
        let miss = directory
            .find_by_exact_phone_set(&["14155551234".to_string()])
            .unwrap();
        assert!(miss.is_empty());
    }
}
