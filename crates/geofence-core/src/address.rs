//! Address qualification before geocoding.

/// Suffix that biases lookups toward the supported administrative region.
pub const REGION_QUALIFIER: &str = ", Tamil Nadu";

/// Trim user input and append [`REGION_QUALIFIER`].
///
/// Returns `None` for blank input.
#[must_use]
pub fn qualify_address(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(format!("{trimmed}{REGION_QUALIFIER}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualifies_trimmed_input() {
        assert_eq!(
            qualify_address("  Andipatti \n").as_deref(),
            Some("Andipatti, Tamil Nadu")
        );
    }

    #[test]
    fn test_blank_input() {
        assert_eq!(qualify_address(""), None);
        assert_eq!(qualify_address("   \t"), None);
    }
}
