//! The on-disk entry format: an HTTP-like header block, one blank line,
//! then the raw body.
//!
//! ```text
//! title: A post about nothing
//! tags: misc, meta
//! date: 2024-05-01 10:00:00
//!
//! Body text, unbounded.
//! ```

/// A header value about to be serialized. Container values never reach the
/// disk format; only scalars round-trip through the header block.
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderValue {
    Scalar(String),
    List(Vec<String>),
}

/// Splits raw file text into (header block, body) at the first blank line.
/// When no blank line exists the whole text is the header block and the
/// body is empty.
pub fn split_source(source: &str) -> (&str, &str) {
    match source.split_once("\n\n") {
        Some((headers, body)) => (headers, body),
        None => (source, ""),
    }
}

/// Parses a header block into key/value pairs, in file order. Lines are
/// split on the first `": "`; lines without the separator are skipped.
pub fn parse_headers(block: &str) -> Vec<(String, String)> {
    let mut headers = vec![];
    for line in block.lines() {
        if let Some((key, value)) = line.split_once(": ") {
            headers.push((key.to_string(), value.to_string()));
        }
    }
    headers
}

/// Dumps key/value pairs as a header block, one `Key: Value` line each.
/// List values are left out entirely.
pub fn dump_headers(headers: &[(String, HeaderValue)]) -> String {
    let mut block = String::new();
    for (key, value) in headers {
        if let HeaderValue::Scalar(value) = value {
            block.push_str(key);
            block.push_str(": ");
            block.push_str(value);
            block.push('\n');
        }
    }
    block
}

/// Splits a comma-joined tag string back into a list, dropping empty items.
pub fn split_tags(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|tag| tag.trim())
        .filter(|tag| !tag.is_empty())
        .map(|tag| tag.to_string())
        .collect()
}

/// Flattens a tag list to the comma-joined scalar written to disk.
pub fn join_tags(tags: &[String]) -> String {
    tags.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_source() {
        let (headers, body) = split_source("Title: Hi\nTags: a, b\n\nThe body.\n\nWith a break.");
        assert_eq!(headers, "Title: Hi\nTags: a, b");
        assert_eq!(body, "The body.\n\nWith a break.");
    }

    #[test]
    fn test_split_source_without_blank_line() {
        // A file with no blank line is all header block, body empty.
        let (headers, body) = split_source("Title: Hi\nTags: a");
        assert_eq!(headers, "Title: Hi\nTags: a");
        assert_eq!(body, "");
    }

    #[test]
    fn test_parse_headers() {
        let parsed = parse_headers("Title: Hello: World\nDate: 2024-05-01 10:00:00\nnot a header\nTags: a, b");
        assert_eq!(parsed, vec![
            ("Title".to_string(), "Hello: World".to_string()),
            ("Date".to_string(), "2024-05-01 10:00:00".to_string()),
            ("Tags".to_string(), "a, b".to_string()),
        ]);
    }

    #[test]
    fn test_parse_headers_skips_separator_less_lines() {
        let parsed = parse_headers("plain text\nkey:no-space\n");
        assert!(parsed.is_empty());
    }

    #[test]
    fn test_dump_headers_skips_lists() {
        let headers = vec![
            ("Title".to_string(), HeaderValue::Scalar("Hi".to_string())),
            ("Tags".to_string(), HeaderValue::List(vec!["a".to_string()])),
            ("Author".to_string(), HeaderValue::Scalar("me".to_string())),
        ];
        assert_eq!(dump_headers(&headers), "Title: Hi\nAuthor: me\n");
    }

    #[test]
    fn test_dump_parse_round_trip() {
        let headers = vec![
            ("Title".to_string(), HeaderValue::Scalar("A post".to_string())),
            ("Date".to_string(), HeaderValue::Scalar("2024-05-01 10:00:00".to_string())),
            ("Custom-Key".to_string(), HeaderValue::Scalar("some value".to_string())),
        ];
        let dumped = dump_headers(&headers);
        let parsed = parse_headers(&dumped);
        assert_eq!(parsed.len(), headers.len());
        for ((key, value), (pk, pv)) in headers.iter().zip(parsed.iter()) {
            assert_eq!(key, pk);
            assert_eq!(value, &HeaderValue::Scalar(pv.clone()));
        }
    }

    #[test]
    fn test_tags_round_trip() {
        let tags = vec!["rust".to_string(), "blog engines".to_string()];
        assert_eq!(split_tags(&join_tags(&tags)), tags);
        assert_eq!(split_tags("a,b ,  c"), ["a", "b", "c"]);
        assert_eq!(split_tags(""), Vec::<String>::new());
    }
}
