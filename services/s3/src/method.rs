use std::fmt::{Display, Formatter};
use std::str::FromStr;

use s3sign_core::{Error, Result};

/// HTTP verbs understood by the signer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// `GET`
    Get,
    /// `PUT`
    Put,
    /// `POST`
    Post,
    /// `DELETE`
    Delete,
    /// `HEAD`
    Head,
}

impl Method {
    /// Upper-cased method name, as it appears in the string to sign.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Post => "POST",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
        }
    }
}

impl Display for Method {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = Error;

    /// Parse a method name, ignoring case.
    fn from_str(s: &str) -> Result<Self> {
        const METHODS: [Method; 5] = [
            Method::Get,
            Method::Put,
            Method::Post,
            Method::Delete,
            Method::Head,
        ];

        METHODS
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::unsupported_method(format!("method {s:?} is not supported")))
    }
}

impl TryFrom<&http::Method> for Method {
    type Error = Error;

    fn try_from(m: &http::Method) -> Result<Self> {
        match *m {
            http::Method::GET => Ok(Method::Get),
            http::Method::PUT => Ok(Method::Put),
            http::Method::POST => Ok(Method::Post),
            http::Method::DELETE => Ok(Method::Delete),
            http::Method::HEAD => Ok(Method::Head),
            _ => Err(Error::unsupported_method(format!(
                "method {m} is not supported"
            ))),
        }
    }
}

impl From<Method> for http::Method {
    fn from(m: Method) -> Self {
        match m {
            Method::Get => http::Method::GET,
            Method::Put => http::Method::PUT,
            Method::Post => http::Method::POST,
            Method::Delete => http::Method::DELETE,
            Method::Head => http::Method::HEAD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use s3sign_core::ErrorKind;
    use test_case::test_case;

    #[test_case("GET", Method::Get; "upper")]
    #[test_case("put", Method::Put; "lower")]
    #[test_case("Delete", Method::Delete; "mixed")]
    #[test_case("HEAD", Method::Head; "head")]
    #[test_case("post", Method::Post; "post")]
    fn test_parse(input: &str, expected: Method) {
        assert_eq!(input.parse::<Method>().unwrap(), expected);
    }

    #[test_case("PATCH"; "patch")]
    #[test_case(""; "empty")]
    #[test_case("GETS"; "suffix")]
    fn test_parse_unsupported(input: &str) {
        let err = input.parse::<Method>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedMethod);
    }

    #[test]
    fn test_http_method_conversion() {
        assert_eq!(Method::try_from(&http::Method::HEAD).unwrap(), Method::Head);
        assert_eq!(http::Method::from(Method::Put), http::Method::PUT);
        assert_eq!(
            Method::try_from(&http::Method::OPTIONS).unwrap_err().kind(),
            ErrorKind::UnsupportedMethod
        );
    }
}
