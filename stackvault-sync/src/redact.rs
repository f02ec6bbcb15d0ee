//! Secret masking for `KEY=VALUE` env file content.

use std::borrow::Cow;

use stackvault_core::MASK;

/// Key substrings (matched case-insensitively) whose values are masked.
pub const SENSITIVE_KEYWORDS: &[&str] = &["token", "key", "password", "secret", "apikey", "api_key"];

/// Mask the value of every `KEY=VALUE` line whose key contains a sensitive
/// keyword. Every other line, and every line ending, is kept byte-identical.
pub fn redact(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    for line in content.split_inclusive('\n') {
        let (body, ending) = split_line_ending(line);
        out.push_str(&redact_line(body));
        out.push_str(ending);
    }
    out
}

/// Redact a single line without its line terminator.
pub fn redact_line(line: &str) -> Cow<'_, str> {
    let Some((key, _value)) = line.split_once('=') else {
        return Cow::Borrowed(line);
    };
    if is_sensitive_key(key) {
        Cow::Owned(format!("{key}={MASK}"))
    } else {
        Cow::Borrowed(line)
    }
}

/// `true` when `key` contains any of [`SENSITIVE_KEYWORDS`], ignoring case.
pub fn is_sensitive_key(key: &str) -> bool {
    let lower = key.to_lowercase();
    SENSITIVE_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}

fn split_line_ending(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, "\n")
    } else {
        (line, "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_password_and_keeps_plain_lines() {
        assert_eq!(
            redact("DB_PASSWORD=hunter2\nPORT=8080"),
            "DB_PASSWORD=XXXXX\nPORT=8080"
        );
    }

    #[test]
    fn substring_match_masks_compound_keys() {
        assert_eq!(redact("APIKEYHOLDER=abc"), "APIKEYHOLDER=XXXXX");
        assert_eq!(redact("monkey=banana"), "monkey=XXXXX");
    }

    #[test]
    fn only_first_separator_splits() {
        assert_eq!(redact("JWT_SECRET=a=b=c\n"), "JWT_SECRET=XXXXX\n");
    }

    #[test]
    fn keyword_in_value_only_is_not_masked() {
        assert_eq!(redact("MODE=token"), "MODE=token");
    }

    #[test]
    fn lines_without_separator_pass_through() {
        let input = "# password rotation notes\n\nexport\r\nTOKEN=x\r\n";
        assert_eq!(
            redact(input),
            "# password rotation notes\n\nexport\r\nTOKEN=XXXXX\r\n"
        );
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(redact(""), "");
    }
}
