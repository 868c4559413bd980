//! Sheet name rules
//!
//! Sheet names may not contain `: \ ? [ ] / *`. Templates authored with an
//! IME often carry the full-width forms of the same characters, so the
//! sanitizer strips both widths.

use crate::MAX_SHEET_NAME_LEN;

/// Characters removed by [`sanitize_sheet_name`], half-width and full-width
pub const FORBIDDEN_SHEET_NAME_CHARS: [char; 14] = [
    ':', '：', '\\', '￥', '?', '？', '[', ']', '［', '］', '/', '／', '*', '＊',
];

/// Characters the file format itself rejects
pub(crate) const INVALID_SHEET_NAME_CHARS: [char; 7] = [':', '\\', '/', '?', '*', '[', ']'];

/// Remove every forbidden character from a sheet name
///
/// # Examples
/// ```
/// use stencil_sheets_core::sanitize_sheet_name;
///
/// assert_eq!(sanitize_sheet_name("A:B/C*D"), "ABCD");
/// assert_eq!(sanitize_sheet_name("Ａ：Ｂ"), "ＡＢ");
/// ```
pub fn sanitize_sheet_name(name: &str) -> String {
    name.chars()
        .filter(|c| !FORBIDDEN_SHEET_NAME_CHARS.contains(c))
        .collect()
}

/// Check that a name is non-empty, short enough and free of forbidden characters
pub fn is_valid_sheet_name(name: &str) -> bool {
    !name.is_empty()
        && name.chars().count() <= MAX_SHEET_NAME_LEN
        && !name.chars().any(|c| FORBIDDEN_SHEET_NAME_CHARS.contains(&c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sanitize_half_width() {
        assert_eq!(sanitize_sheet_name("A:B/C*D"), "ABCD");
        assert_eq!(sanitize_sheet_name("[2024]\\Q?"), "2024Q");
    }

    #[test]
    fn test_sanitize_full_width() {
        assert_eq!(sanitize_sheet_name("Ａ：Ｂ"), "ＡＢ");
        assert_eq!(sanitize_sheet_name("売上［４月］／￥？＊"), "売上４月");
    }

    #[test]
    fn test_sanitize_removes_every_occurrence() {
        assert_eq!(sanitize_sheet_name("a::b::c"), "abc");
        assert_eq!(sanitize_sheet_name("：：x／／"), "x");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let clean = "Invoice 2024-04";
        assert_eq!(sanitize_sheet_name(clean), clean);

        let once = sanitize_sheet_name("a:b［c］");
        assert_eq!(sanitize_sheet_name(&once), once);
    }

    #[test]
    fn test_is_valid_sheet_name() {
        assert!(is_valid_sheet_name("Data"));
        assert!(!is_valid_sheet_name(""));
        assert!(!is_valid_sheet_name("a/b"));
        assert!(!is_valid_sheet_name("a＊b"));
        assert!(!is_valid_sheet_name(&"x".repeat(MAX_SHEET_NAME_LEN + 1)));
        assert!(is_valid_sheet_name(&"日".repeat(MAX_SHEET_NAME_LEN)));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn sanitized_names_have_no_forbidden_chars(name in "\\PC{0,40}") {
                let clean = sanitize_sheet_name(&name);
                prop_assert!(!clean.chars().any(|c| FORBIDDEN_SHEET_NAME_CHARS.contains(&c)));
                prop_assert_eq!(sanitize_sheet_name(&clean), clean.clone());
            }

            #[test]
            fn sanitizing_keeps_allowed_chars_in_order(name in "[a-zA-Z0-9 :/*?]{0,40}") {
                let expected: String = name.chars().filter(|c| c.is_alphanumeric() || *c == ' ').collect();
                prop_assert_eq!(sanitize_sheet_name(&name), expected);
            }
        }
    }
}
