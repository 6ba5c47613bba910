//! Validation helpers for DTOs.

use validator::ValidationError;

/// Maximum accepted display-name length.
const DISPLAY_NAME_MAX: usize = 20;
/// Maximum accepted player-identifier length.
const PLAYER_ID_MAX: usize = 64;

/// Validates that a display name is non-blank and at most 20 characters.
pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("display_name_blank");
        err.message = Some("Display name must not be blank".into());
        return Err(err);
    }

    if name.chars().count() > DISPLAY_NAME_MAX {
        let mut err = ValidationError::new("display_name_length");
        err.message = Some(
            format!("Display name must be at most {DISPLAY_NAME_MAX} characters").into(),
        );
        return Err(err);
    }

    Ok(())
}

/// Validates an externally assigned player identifier: non-blank, at most 64
/// characters, no whitespace.
pub fn validate_player_id(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() || id.len() > PLAYER_ID_MAX {
        let mut err = ValidationError::new("player_id_length");
        err.message = Some(
            format!("Player id must be between 1 and {PLAYER_ID_MAX} characters").into(),
        );
        return Err(err);
    }

    if id.chars().any(char::is_whitespace) {
        let mut err = ValidationError::new("player_id_format");
        err.message = Some("Player id must not contain whitespace".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_display_name_valid() {
        assert!(validate_display_name("Ada").is_ok());
        assert!(validate_display_name("a name with spaces").is_ok());
    }

    #[test]
    fn test_validate_display_name_invalid() {
        assert!(validate_display_name("").is_err());
        assert!(validate_display_name("   ").is_err());
        assert!(validate_display_name(&"x".repeat(21)).is_err());
    }

    #[test]
    fn test_validate_player_id_valid() {
        assert!(validate_player_id("user-42").is_ok());
        assert!(validate_player_id("9b2e6a7c").is_ok());
    }

    #[test]
    fn test_validate_player_id_invalid() {
        assert!(validate_player_id("").is_err());
        assert!(validate_player_id("has space").is_err());
        assert!(validate_player_id(&"x".repeat(65)).is_err());
    }
}
