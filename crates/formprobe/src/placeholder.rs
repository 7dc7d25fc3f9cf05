//! Placeholder expansion for boundary-length inputs.
//!
//! A token `${<letter><count>}` expands to `<letter>` repeated `<count>`
//! times, so a CSV can encode "256 letters A" as `${A256}`.

use std::borrow::Cow;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use tracing::warn;

/// Longest expansion a single token may produce (1 MiB)
pub const MAX_PLACEHOLDER_LEN: usize = 1 << 20;

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z])(\d+)\}").expect("placeholder pattern is valid")
    })
}

/// Expand every placeholder token in `input`.
///
/// Tokens asking for more than [`MAX_PLACEHOLDER_LEN`] characters are left
/// untouched. Strings without tokens are returned borrowed.
#[must_use]
pub fn expand_placeholders(input: &str) -> Cow<'_, str> {
    expand_placeholders_within(input, MAX_PLACEHOLDER_LEN)
}

/// Expand placeholder tokens, leaving any token longer than `max_len` as is
#[must_use]
pub fn expand_placeholders_within(input: &str, max_len: usize) -> Cow<'_, str> {
    placeholder_pattern().replace_all(input, |caps: &Captures<'_>| {
        match caps[2].parse::<usize>() {
            Ok(count) if count <= max_len => caps[1].repeat(count),
            _ => {
                warn!(token = &caps[0], max_len, "placeholder exceeds limit, left unexpanded");
                caps[0].to_string()
            }
        }
    })
}

/// Check whether `input` still contains an expandable token
#[must_use]
pub fn has_placeholder(input: &str) -> bool {
    placeholder_pattern().is_match(input)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_expands_single_token() {
        assert_eq!(expand_placeholders("${A5}"), "AAAAA");
    }

    #[test]
    fn test_expands_embedded_tokens() {
        assert_eq!(expand_placeholders("x${b3}y${Z2}"), "xbbbyZZ");
    }

    #[test]
    fn test_zero_count_removes_token() {
        assert_eq!(expand_placeholders("a${A0}b"), "ab");
    }

    #[test]
    fn test_long_boundary_value() {
        let expanded = expand_placeholders("${A256}");
        assert_eq!(expanded.len(), 256);
        assert!(expanded.chars().all(|c| c == 'A'));
    }

    #[test]
    fn test_no_token_is_borrowed() {
        let out = expand_placeholders("Popescu");
        assert!(matches!(out, Cow::Borrowed("Popescu")));
    }

    #[test]
    fn test_malformed_tokens_untouched() {
        for input in ["${A}", "${5}", "$A5", "{A5}", "${AB5}", "${A5"] {
            assert_eq!(expand_placeholders(input), input);
        }
    }

    #[test]
    fn test_overflowing_count_untouched() {
        let input = "${A99999999999999999999999}";
        assert_eq!(expand_placeholders(input), input);
    }

    #[test]
    fn test_count_near_usize_max_untouched() {
        let input = "${A18446744073709551615}";
        assert_eq!(expand_placeholders(input), input);
    }

    #[test]
    fn test_count_over_limit_untouched() {
        let over = format!("${{A{}}}", MAX_PLACEHOLDER_LEN + 1);
        assert_eq!(expand_placeholders(&over), over);
        let at = format!("${{A{MAX_PLACEHOLDER_LEN}}}");
        assert_eq!(expand_placeholders(&at).len(), MAX_PLACEHOLDER_LEN);
    }

    #[test]
    fn test_custom_limit() {
        assert_eq!(expand_placeholders_within("x${A4}", 3), "x${A4}");
        assert_eq!(expand_placeholders_within("x${A3}", 3), "xAAA");
    }

    #[test]
    fn test_has_placeholder() {
        assert!(has_placeholder("x${A2}"));
        assert!(!has_placeholder("AAAA"));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_expansion_length(letter in "[A-Za-z]", count in 0usize..500) {
                let token = format!("${{{letter}{count}}}");
                let expanded = expand_placeholders(&token);
                prop_assert_eq!(expanded.chars().count(), count);
            }

            #[test]
            fn prop_expansion_idempotent(prefix in "[a-z ]{0,8}", count in 0usize..64) {
                let once = expand_placeholders(&format!("{prefix}${{A{count}}}")).into_owned();
                let twice = expand_placeholders(&once).into_owned();
                prop_assert_eq!(once, twice);
            }
        }
    }
}
