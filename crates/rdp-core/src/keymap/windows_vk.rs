//! Symbolic key name to Windows Virtual Key (VK) code translation table.
//!
//! Reference: Windows Virtual-Key Codes (winuser.h).
//!
//! `VK_NAME_TABLE` is a compile-time constant slice of (name, code) pairs.
//! Lookups uppercase the requested name first, so resolution is
//! case-insensitive. The table is immutable and process-wide; there is no
//! mutation path.
//!
//! Bare digit names ("0"–"9") are deliberately absent: a digits-only
//! specifier is parsed as a literal VK code by the resolver, so `"5"` means
//! VK code 5, exactly as the integer specifier `5` does.

/// Symbolic name → VK code mapping.
///
/// Entries cover the keys the controller's operators script against:
/// editing and navigation keys, modifiers, the alphabet, and F1–F10.
pub const VK_NAME_TABLE: &[(&str, u16)] = &[
    // ── Editing / control keys ───────────────────────────────────────────────
    ("BACKSPACE", 0x08),
    ("TAB", 0x09),
    ("ENTER", 0x0D),
    ("SHIFT", 0x10),
    ("CTRL", 0x11),
    ("ALT", 0x12),
    ("ESC", 0x1B),
    ("SPACE", 0x20),
    ("DELETE", 0x2E),
    // ── Arrow keys ────────────────────────────────────────────────────────────
    ("LEFT", 0x25),
    ("UP", 0x26),
    ("RIGHT", 0x27),
    ("DOWN", 0x28),
    // ── Alphabet (VK_A=0x41 … VK_Z=0x5A) ─────────────────────────────────────
    ("A", 0x41),
    ("B", 0x42),
    ("C", 0x43),
    ("D", 0x44),
    ("E", 0x45),
    ("F", 0x46),
    ("G", 0x47),
    ("H", 0x48),
    ("I", 0x49),
    ("J", 0x4A),
    ("K", 0x4B),
    ("L", 0x4C),
    ("M", 0x4D),
    ("N", 0x4E),
    ("O", 0x4F),
    ("P", 0x50),
    ("Q", 0x51),
    ("R", 0x52),
    ("S", 0x53),
    ("T", 0x54),
    ("U", 0x55),
    ("V", 0x56),
    ("W", 0x57),
    ("X", 0x58),
    ("Y", 0x59),
    ("Z", 0x5A),
    // ── Windows keys ──────────────────────────────────────────────────────────
    ("LWIN", 0x5B),
    ("RWIN", 0x5C),
    // ── Function keys (VK_F1=0x70 … VK_F10=0x79) ─────────────────────────────
    ("F1", 0x70),
    ("F2", 0x71),
    ("F3", 0x72),
    ("F4", 0x73),
    ("F5", 0x74),
    ("F6", 0x75),
    ("F7", 0x76),
    ("F8", 0x77),
    ("F9", 0x78),
    ("F10", 0x79),
];

/// Looks up an already-uppercased symbolic name in the table.
///
/// Returns `None` when the name is not a known symbolic key. The table is
/// small enough that a linear scan beats building a map at startup.
pub fn name_to_vk(upper_name: &str) -> Option<u16> {
    VK_NAME_TABLE
        .iter()
        .find(|(name, _)| *name == upper_name)
        .map(|&(_, code)| code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_keys_map_to_expected_vk_codes() {
        assert_eq!(name_to_vk("ENTER"), Some(0x0D));
        assert_eq!(name_to_vk("SPACE"), Some(0x20));
        assert_eq!(name_to_vk("ESC"), Some(0x1B));
        assert_eq!(name_to_vk("LWIN"), Some(0x5B));
        assert_eq!(name_to_vk("F10"), Some(0x79));
    }

    #[test]
    fn test_all_26_letters_are_mapped_contiguously() {
        for (offset, letter) in ('A'..='Z').enumerate() {
            let code = name_to_vk(&letter.to_string());
            assert_eq!(
                code,
                Some(0x41 + offset as u16),
                "letter {letter} must map to VK 0x{:02X}",
                0x41 + offset
            );
        }
    }

    #[test]
    fn test_letter_vk_codes_equal_their_ascii_ordinals() {
        // The character-ordinal fallback in the resolver relies on this.
        for letter in 'A'..='Z' {
            assert_eq!(name_to_vk(&letter.to_string()), Some(letter as u16));
        }
    }

    #[test]
    fn test_bare_digits_are_not_in_the_symbolic_table() {
        // Digits-only specifiers take the literal-parse path in the resolver.
        for digit in '0'..='9' {
            assert_eq!(name_to_vk(&digit.to_string()), None);
        }
    }

    #[test]
    fn test_lookup_is_exact_on_uppercased_names() {
        assert_eq!(name_to_vk("enter"), None, "callers must uppercase first");
        assert_eq!(name_to_vk("ENTER "), None);
    }

    #[test]
    fn test_no_entry_has_a_zero_code() {
        for &(name, code) in VK_NAME_TABLE {
            assert!(code > 0, "table entry {name} must have a positive VK code");
        }
    }

    #[test]
    fn test_table_names_are_unique() {
        for (i, &(name, _)) in VK_NAME_TABLE.iter().enumerate() {
            let duplicates = VK_NAME_TABLE[i + 1..].iter().filter(|(n, _)| *n == name);
            assert_eq!(duplicates.count(), 0, "duplicate table entry: {name}");
        }
    }
}
