use regex::Regex;

/// Pull the first run of digits out of the first match of `pattern`.
///
/// Returns 0 when the text is absent, nothing matches, the pattern does not
/// compile, or the digits overflow.
pub fn extract_number(text: Option<&str>, pattern: &str) -> u64 {
    let Some(text) = text else {
        return 0;
    };
    let Ok(required) = Regex::new(pattern) else {
        return 0;
    };
    let Some(found) = required.find(text) else {
        return 0;
    };
    found
        .as_str()
        .split(|c: char| !c.is_ascii_digit())
        .find(|run| !run.is_empty())
        .and_then(|digits| digits.parse().ok())
        .unwrap_or(0)
}

/// [`extract_number`] with the default pattern (any run of digits).
pub fn first_number(text: &str) -> u64 {
    extract_number(Some(text), r"\d+")
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(Some("level 12 reached"), r"\d+", 12)]
    #[case(Some("x=3 y=40"), r"y=\d+", 40)]
    #[case(Some("no digits"), r"\d+", 0)]
    #[case(None, r"\d+", 0)]
    #[case(Some("42"), r"(", 0)]
    #[case(Some("99999999999999999999999"), r"\d+", 0)]
    fn extraction(#[case] text: Option<&str>, #[case] pattern: &str, #[case] expected: u64) {
        assert_eq!(extract_number(text, pattern), expected);
    }

    #[test]
    fn first_number_default_pattern() {
        assert_eq!(first_number("votes: 7"), 7);
    }
}
