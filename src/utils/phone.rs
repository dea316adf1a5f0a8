use anyhow::{bail, Result};

pub const MIN_PHONE_NUMBER_LENGTH: usize = 10;
pub const MAX_PHONE_NUMBER_LENGTH: usize = 16;

/// Strip everything but digits and check the 10-16 digit length window.
/// Stored phone numbers and incoming invitee numbers both go through this,
/// so external invitations can be matched against user rows digit-for-digit.
pub fn normalize_phone(raw: &str) -> Result<String> {
    let cleaned: String = raw.chars().filter(char::is_ascii_digit).collect();

    if cleaned.is_empty() {
        bail!("Phone number contains no digits");
    }

    if cleaned.len() < MIN_PHONE_NUMBER_LENGTH || cleaned.len() > MAX_PHONE_NUMBER_LENGTH {
        bail!(
            "Phone number must be between {} and {} digits, got {}",
            MIN_PHONE_NUMBER_LENGTH,
            MAX_PHONE_NUMBER_LENGTH,
            cleaned.len()
        );
    }

    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_formatting_characters() {
        assert_eq!(normalize_phone("(555) 123-4567").unwrap(), "5551234567");
        assert_eq!(normalize_phone("+1 555 123 4567").unwrap(), "15551234567");
    }

    #[test]
    fn rejects_too_short_numbers() {
        assert!(normalize_phone("555-1234").is_err());
    }

    #[test]
    fn rejects_too_long_numbers() {
        assert!(normalize_phone("12345678901234567").is_err());
    }

    #[test]
    fn rejects_digitless_input() {
        assert!(normalize_phone("call me maybe").is_err());
    }

    #[test]
    fn accepts_boundary_lengths() {
        assert!(normalize_phone("1234567890").is_ok());
        assert!(normalize_phone("1234567890123456").is_ok());
    }
}
