//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::dao::catalog::query::is_decade;

/// Validates a display color written as `#RGB` or `#RRGGBB`. Empty means "no color".
///
/// # Examples
///
/// ```ignore
/// validate_color_hex("#1DB954") // Ok
/// validate_color_hex("#fff")    // Ok
/// validate_color_hex("1DB954")  // Err - missing '#'
/// ```
pub fn validate_color_hex(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(());
    }

    let Some(digits) = value.strip_prefix('#') else {
        let mut err = ValidationError::new("color_hex_prefix");
        err.message = Some("Color must start with '#'".into());
        return Err(err);
    };

    if !matches!(digits.len(), 3 | 6) || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        let mut err = ValidationError::new("color_hex_format");
        err.message = Some(
            format!("Color must be #RGB or #RRGGBB hexadecimal (got {value})").into(),
        );
        return Err(err);
    }

    Ok(())
}

/// Validates that a team name is not blank once trimmed.
pub fn validate_team_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("team_name_blank");
        err.message = Some("Team name must not be empty".into());
        return Err(err);
    }
    Ok(())
}

/// Validates an avatar link: empty, or an absolute http(s) URL.
pub fn validate_avatar_url(url: &str) -> Result<(), ValidationError> {
    let url = url.trim();
    if url.is_empty() || url.starts_with("https://") || url.starts_with("http://") {
        return Ok(());
    }
    let mut err = ValidationError::new("avatar_url_scheme");
    err.message = Some("Avatar URL must start with http:// or https://".into());
    Err(err)
}

/// Validates a list of decades, each written like `1990s`.
pub fn validate_decades(decades: &[String]) -> Result<(), ValidationError> {
    for decade in decades {
        let decade = decade.trim();
        if !is_decade(decade) {
            let mut err = ValidationError::new("decade_format");
            err.message = Some(format!("Decade must look like 1990s (got {decade})").into());
            return Err(err);
        }
    }
    Ok(())
}
