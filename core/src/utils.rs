//! Utility functions and types.

use std::fmt::Debug;
use std::fmt::Display;

/// Redacts a string by replacing all but the first and last three characters with asterisks.
///
/// - If the input string has fewer than 12 characters, it should be entirely redacted.
/// - If the input string has 12 or more characters, only the first three and the last three.
///
/// This allows users to tell different redacted strings apart without
/// leaking sensitive information.
#[derive(Clone, Copy)]
pub struct Redact<'a>(&'a str);

impl<'a> From<&'a str> for Redact<'a> {
    fn from(value: &'a str) -> Self {
        Redact(value)
    }
}

impl<'a> From<&'a String> for Redact<'a> {
    fn from(value: &'a String) -> Self {
        Redact(value.as_str())
    }
}

impl<'a> From<&'a Option<String>> for Redact<'a> {
    fn from(value: &'a Option<String>) -> Self {
        match value {
            None => Redact(""),
            Some(v) => Redact(v),
        }
    }
}

impl Debug for Redact<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let length = self.0.len();
        if length == 0 {
            f.write_str("EMPTY")
        } else if length < 12 || !self.0.is_char_boundary(3) || !self.0.is_char_boundary(length - 3)
        {
            f.write_str("***")
        } else {
            f.write_str(&self.0[..3])?;
            f.write_str("***")?;
            f.write_str(&self.0[length - 3..])
        }
    }
}

impl Display for Redact<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(self, f)
    }
}

/// Query keys whose values are secrets in presigned urls.
const SENSITIVE_QUERY_KEYS: &[&str] = &[
    "Signature",
    "X-Amz-Signature",
    "X-Amz-Security-Token",
    "x-amz-security-token",
];

/// Mask signature and token values in a url so it can be logged.
///
/// ```
/// use s3sign_core::utils::redact_url;
///
/// assert_eq!(
///     redact_url("https://b.example.com:443/k?X-Amz-Date=20130524T000000Z&X-Amz-Signature=aeeed9bbccd4d02ee5c0"),
///     "https://b.example.com:443/k?X-Amz-Date=20130524T000000Z&X-Amz-Signature=aee***5c0",
/// );
/// ```
pub fn redact_url(url: &str) -> String {
    let Some((base, query)) = url.split_once('?') else {
        return url.to_string();
    };

    let query = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) if SENSITIVE_QUERY_KEYS.contains(&k) => {
                format!("{k}={:?}", Redact::from(v))
            }
            _ => pair.to_string(),
        })
        .collect::<Vec<_>>()
        .join("&");

    format!("{base}?{query}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact() {
        let cases = vec![
            ("Short", "***"),
            ("Hello World!", "Hel***ld!"),
            ("wJalrXUtnFEMI/K7MDENG/bPxRfiCYEXAMPLEKEY", "wJa***KEY"),
            ("", "EMPTY"),
            ("HelloWorld", "***"),
        ];

        for (input, expected) in cases {
            assert_eq!(
                format!("{:?}", Redact(input)),
                expected,
                "Failed on input: {}",
                input
            );
        }
    }

    #[test]
    fn test_redact_url_without_query() {
        assert_eq!(
            redact_url("https://s3.example.com:443/mybucket"),
            "https://s3.example.com:443/mybucket"
        );
    }

    #[test]
    fn test_redact_url_v2() {
        assert_eq!(
            redact_url("http://s3.example.com:80/b/k?AWSAccessKeyId=AKID&Expires=60&Signature=VtYnciUKOSY7ASayIrBAD5xMFNo%3D"),
            "http://s3.example.com:80/b/k?AWSAccessKeyId=AKID&Expires=60&Signature=VtY***%3D"
        );
    }
}
