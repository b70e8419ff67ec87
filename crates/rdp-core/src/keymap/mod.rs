//! Keycode resolution: symbolic names, literal codes, and characters to
//! Windows Virtual Key codes.
//!
//! Resolution order for a [`KeySpec`]:
//!
//! 1. an integer specifier is used verbatim iff it is positive;
//! 2. a string specifier is uppercased and looked up in
//!    [`windows_vk::VK_NAME_TABLE`];
//! 3. a string of decimal digits is parsed as a literal VK code;
//! 4. a single-character string resolves to the character's ordinal value;
//! 5. anything else fails with [`KeymapError::UnknownKey`].
//!
//! A resolved code of zero or below is never produced; such specifiers fail
//! resolution instead, so no input is ever sent for them.

pub mod windows_vk;

use thiserror::Error;

/// Error type for key resolution.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeymapError {
    /// The specifier matched no resolution rule, or resolved to a
    /// non-positive code.
    #[error("unknown key specifier: {0:?}")]
    UnknownKey(String),
}

/// A key specifier as supplied by the operator or a scripted caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySpec<'a> {
    /// A numeric VK code, used verbatim when positive.
    Code(i32),
    /// A symbolic name ("ENTER"), a digits-only literal ("13"), or a single
    /// character ("a").
    Name(&'a str),
}

impl<'a> From<i32> for KeySpec<'a> {
    fn from(code: i32) -> Self {
        KeySpec::Code(code)
    }
}

impl<'a> From<&'a str> for KeySpec<'a> {
    fn from(name: &'a str) -> Self {
        KeySpec::Name(name)
    }
}

/// Resolves a key specifier to a Windows Virtual Key code.
///
/// Resolution is stable: repeated calls with the same specifier always yield
/// the same code. Name lookup is case-insensitive.
///
/// # Errors
///
/// Returns [`KeymapError::UnknownKey`] when no rule applies or the resolved
/// code would be zero or negative.
pub fn resolve(spec: KeySpec<'_>) -> Result<u16, KeymapError> {
    match spec {
        KeySpec::Code(code) => {
            if code > 0 {
                u16::try_from(code).map_err(|_| KeymapError::UnknownKey(code.to_string()))
            } else {
                Err(KeymapError::UnknownKey(code.to_string()))
            }
        }
        KeySpec::Name(name) => resolve_name(name),
    }
}

fn resolve_name(name: &str) -> Result<u16, KeymapError> {
    let upper = name.to_uppercase();

    if let Some(code) = windows_vk::name_to_vk(&upper) {
        return Ok(code);
    }

    // Digits-only specifiers are literal VK codes, in agreement with the
    // integer form: resolve("5") == resolve(5).
    if !upper.is_empty() && upper.chars().all(|c| c.is_ascii_digit()) {
        return match upper.parse::<u16>() {
            Ok(code) if code > 0 => Ok(code),
            _ => Err(KeymapError::UnknownKey(name.to_string())),
        };
    }

    // A single character resolves to its ordinal. Uppercasing above already
    // folded 'a'..'z' onto the VK_A..VK_Z table entries.
    let mut chars = upper.chars();
    if let (Some(ch), None) = (chars.next(), chars.next()) {
        if let Ok(code) = u16::try_from(ch as u32) {
            if code > 0 {
                return Ok(code);
            }
        }
    }

    Err(KeymapError::UnknownKey(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_symbolic_names_is_case_insensitive() {
        for name in ["ENTER", "enter", "Enter", "eNtEr"] {
            assert_eq!(resolve(KeySpec::Name(name)), Ok(0x0D), "specifier {name:?}");
        }
    }

    #[test]
    fn test_resolve_is_stable_across_repeated_calls() {
        for &(name, code) in windows_vk::VK_NAME_TABLE {
            let first = resolve(KeySpec::Name(name));
            let second = resolve(KeySpec::Name(name));
            assert_eq!(first, Ok(code));
            assert_eq!(first, second, "resolution of {name} must be idempotent");
        }
    }

    #[test]
    fn test_positive_integer_codes_resolve_verbatim() {
        assert_eq!(resolve(KeySpec::Code(0x0D)), Ok(0x0D));
        assert_eq!(resolve(KeySpec::Code(1)), Ok(1));
        assert_eq!(resolve(KeySpec::Code(255)), Ok(255));
    }

    #[test]
    fn test_zero_and_negative_codes_never_resolve() {
        assert!(resolve(KeySpec::Code(0)).is_err());
        assert!(resolve(KeySpec::Code(-1)).is_err());
        assert!(resolve(KeySpec::Name("0")).is_err());
    }

    #[test]
    fn test_digit_strings_take_the_literal_parse_path() {
        // "5" is a literal code, not a symbolic digit entry, so the string and
        // integer forms agree for every digit.
        for digit in 1..=9 {
            let text = digit.to_string();
            assert_eq!(
                resolve(KeySpec::Name(&text)),
                resolve(KeySpec::Code(digit)),
                "string and integer specifiers must agree for {digit}"
            );
        }
    }

    #[test]
    fn test_multi_digit_strings_parse_as_literal_codes() {
        assert_eq!(resolve(KeySpec::Name("13")), Ok(13));
        assert_eq!(resolve(KeySpec::Name("112")), Ok(112)); // VK_F1
    }

    #[test]
    fn test_single_characters_resolve_to_their_ordinal() {
        assert_eq!(resolve(KeySpec::Name("a")), Ok(0x41)); // folds onto VK_A
        assert_eq!(resolve(KeySpec::Name("Z")), Ok(0x5A));
        assert_eq!(resolve(KeySpec::Name("!")), Ok('!' as u16));
        assert_eq!(resolve(KeySpec::Name(".")), Ok('.' as u16));
    }

    #[test]
    fn test_unknown_multi_character_names_fail() {
        let result = resolve(KeySpec::Name("NOT_A_KEY"));
        assert_eq!(result, Err(KeymapError::UnknownKey("NOT_A_KEY".to_string())));
    }

    #[test]
    fn test_empty_specifier_fails() {
        assert!(resolve(KeySpec::Name("")).is_err());
    }

    #[test]
    fn test_code_above_u16_range_fails() {
        assert!(resolve(KeySpec::Code(0x1_0000)).is_err());
    }
}
