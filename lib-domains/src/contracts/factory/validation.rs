//! TLD name validation
//!
//! Checks run in a fixed order so each malformed name reports one
//! well-defined reason. Length minimum counts characters, maximum counts
//! bytes.

use crate::errors::{ContractError, ContractResult};

pub fn validate_tld_name(name: &str, min_length: usize, max_length: usize) -> ContractResult<()> {
    let chars = name.chars().count();
    if chars < min_length {
        return Err(ContractError::TldTooShort {
            min: min_length,
            actual: chars,
        });
    }
    if name.len() > max_length {
        return Err(ContractError::TldTooLong {
            max: max_length,
            actual: name.len(),
        });
    }

    let dots = name.matches('.').count();
    if dots != 1 {
        return Err(ContractError::TldDotCount { dots });
    }
    if !name.starts_with('.') {
        return Err(ContractError::TldMissingLeadingDot);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(name: &str) -> ContractResult<()> {
        validate_tld_name(name, 2, 40)
    }

    #[test]
    fn test_valid_names() {
        assert!(check(".web3").is_ok());
        assert!(check(".x").is_ok());
        assert!(check(&format!(".{}", "a".repeat(39))).is_ok());
        // case is preserved, not rejected
        assert!(check(".WEB3").is_ok());
    }

    #[test]
    fn test_length_bounds() {
        assert_eq!(check(""), Err(ContractError::TldTooShort { min: 2, actual: 0 }));
        assert_eq!(check("."), Err(ContractError::TldTooShort { min: 2, actual: 1 }));
        assert_eq!(
            check(&format!(".{}", "a".repeat(40))),
            Err(ContractError::TldTooLong { max: 40, actual: 41 })
        );
    }

    #[test]
    fn test_dot_rules() {
        assert_eq!(check("web3"), Err(ContractError::TldDotCount { dots: 0 }));
        assert_eq!(check(".web.3"), Err(ContractError::TldDotCount { dots: 2 }));
        assert_eq!(check("web3."), Err(ContractError::TldMissingLeadingDot));
        assert_eq!(check("w.eb3"), Err(ContractError::TldMissingLeadingDot));
    }

    #[test]
    fn test_multibyte_counts_chars_for_minimum() {
        // two characters, four bytes
        assert!(check(".é").is_ok());
        assert_eq!(
            validate_tld_name(".éé", 2, 4),
            Err(ContractError::TldTooLong { max: 4, actual: 5 })
        );
    }
}
