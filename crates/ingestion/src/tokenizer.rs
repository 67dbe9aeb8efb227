//! Tokenizer - key=value line grammar
//!
//! A key is `[a-z_]+` followed by `=`, at line start or after a space. The
//! value runs until the next key. One layer of surrounding double quotes is
//! stripped; anything else is passed through untouched.

use std::sync::LazyLock;

use contracts::Record;
use regex::Regex;

static KEY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"(?:^| )([a-z_]+)=").expect("key pattern is a valid regex")
});

/// Parse one line into an ordered record of text fields
///
/// Lines without any key yield an empty record. A repeated key keeps its
/// first position and its last value.
pub fn tokenize(line: &str) -> Record {
    let mut record = Record::new();
    let mut pending: Option<(&str, usize)> = None;

    for caps in KEY_PATTERN.captures_iter(line) {
        let (Some(token), Some(key)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if let Some((prev_key, value_start)) = pending.take() {
            record.insert(prev_key, strip_quotes(&line[value_start..token.start()]));
        }
        pending = Some((key.as_str(), token.end()));
    }

    if let Some((key, value_start)) = pending {
        record.insert(key, strip_quotes(&line[value_start..]));
    }

    record
}

/// Strip one layer of surrounding double quotes
fn strip_quotes(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(record: &Record) -> Vec<(&str, &str)> {
        record
            .iter()
            .map(|(k, v)| (k, v.as_text().unwrap()))
            .collect()
    }

    #[test]
    fn test_fortigate_line() {
        let line = r#"date=2024-01-02 time=03:04:05 devname="FW-01" logid="0000000013" type="traffic" srcip=10.0.0.1 action="deny" msg="blocked by policy""#;
        let record = tokenize(line);
        assert_eq!(
            pairs(&record),
            vec![
                ("date", "2024-01-02"),
                ("time", "03:04:05"),
                ("devname", "FW-01"),
                ("logid", "0000000013"),
                ("type", "traffic"),
                ("srcip", "10.0.0.1"),
                ("action", "deny"),
                ("msg", "blocked by policy"),
            ]
        );
    }

    #[test]
    fn test_no_tokens_yields_empty_record() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("garbage without pairs").is_empty());
        assert!(tokenize("UPPER=case").is_empty());
    }

    #[test]
    fn test_value_may_contain_spaces_and_equals() {
        let record = tokenize(r#"msg="a=b c" level=info"#);
        assert_eq!(record.get_text("msg"), Some("a=b c"));
        assert_eq!(record.get_text("level"), Some("info"));
    }

    #[test]
    fn test_only_one_quote_layer_stripped() {
        let record = tokenize(r#"a=""x"" b="open c=close""#);
        assert_eq!(record.get_text("a"), Some(r#""x""#));
        assert_eq!(record.get_text("b"), Some(r#""open"#));
        assert_eq!(record.get_text("c"), Some(r#"close""#));
    }

    #[test]
    fn test_leading_text_is_ignored() {
        let record = tokenize("<189>prefix a=1");
        assert_eq!(pairs(&record), vec![("a", "1")]);
    }

    #[test]
    fn test_key_must_follow_space() {
        let record = tokenize("a=x,b=2");
        assert_eq!(pairs(&record), vec![("a", "x,b=2")]);
    }

    #[test]
    fn test_empty_value() {
        let record = tokenize("a= b=2");
        assert_eq!(pairs(&record), vec![("a", ""), ("b", "2")]);
    }

    #[test]
    fn test_repeated_key_last_value_wins() {
        let record = tokenize("a=1 b=2 a=3");
        assert_eq!(pairs(&record), vec![("a", "3"), ("b", "2")]);
    }
}
