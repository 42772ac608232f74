//! Input validation shared by every surface entry point.

use thiserror::Error;

/// Reserved as the on-disk field separator in `users.txt` and
/// `chatrooms.txt`; usernames, passwords, and chatroom names may not
/// contain it.
pub const FIELD_SEPARATOR: char = ':';

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Names may not contain ':'")]
    ReservedCharacter,
}

/// Rejects any field value that would corrupt the on-disk line format.
pub fn validate_name(value: &str) -> Result<(), ValidationError> {
    if value.contains(FIELD_SEPARATOR) {
        return Err(ValidationError::ReservedCharacter);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_names_pass() {
        assert_eq!(validate_name("sample_user"), Ok(()));
        assert_eq!(validate_name("room-42"), Ok(()));
        assert_eq!(validate_name(""), Ok(()));
    }

    #[test]
    fn separator_is_rejected_anywhere() {
        assert_eq!(
            validate_name("sample:user"),
            Err(ValidationError::ReservedCharacter)
        );
        assert_eq!(validate_name(":lead"), Err(ValidationError::ReservedCharacter));
        assert_eq!(validate_name("tail:"), Err(ValidationError::ReservedCharacter));
    }
}
