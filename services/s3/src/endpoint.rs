use std::fmt::{Debug, Display, Formatter};
use std::net::Ipv6Addr;
use std::str::FromStr;

use s3sign_core::utils::Redact;
use s3sign_core::{Error, Result};

use crate::constants::DEFAULT_DOMAIN;

/// URL scheme of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// `http`
    Http,
    /// `https`
    Https,
}

impl Scheme {
    /// Scheme name without `://`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }

    /// Port used when none is given.
    pub fn default_port(&self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }
}

impl FromStr for Scheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("http") {
            Ok(Scheme::Http)
        } else if s.eq_ignore_ascii_case("https") {
            Ok(Scheme::Https)
        } else {
            Err(Error::invalid_host_format(format!("unknown scheme {s:?}")))
        }
    }
}

impl Display for Scheme {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Address family of the endpoint domain.
///
/// Hostnames count as [`AddressFamily::V4`]; only bracketed IPv6 literals
/// are [`AddressFamily::V6`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    /// Hostname or IPv4 literal.
    V4,
    /// IPv6 literal.
    V6,
}

/// A normalized storage endpoint.
///
/// Build it with [`Endpoint::parse`]; it never changes afterwards, the
/// `with_*` methods return a new value.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    scheme: Scheme,
    /// Domain without brackets, even for IPv6.
    domain: String,
    port: u16,
    address_family: AddressFamily,
    userinfo: Option<String>,
}

impl Default for Endpoint {
    /// `https://s3.amazonaws.com:443`
    fn default() -> Self {
        Self {
            scheme: Scheme::Https,
            domain: DEFAULT_DOMAIN.to_string(),
            port: Scheme::Https.default_port(),
            address_family: AddressFamily::V4,
            userinfo: None,
        }
    }
}

impl Endpoint {
    /// Normalize a raw host specification.
    ///
    /// Recognized shapes, in priority order:
    ///
    /// - `[addr]`, optionally preceded by `scheme://` and followed by `:port`
    /// - `scheme://domain:port`
    /// - `scheme://domain`
    /// - `domain:port`
    /// - `domain`
    ///
    /// Without a scheme, port 80 means `http` and everything else `https`.
    /// Without a port, the scheme decides: `https` → 443, `http` → 80.
    /// Anything else fails with [`s3sign_core::ErrorKind::InvalidHostFormat`].
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = |reason: &str| {
            Error::invalid_host_format(reason.to_string()).with_context(format!("host: {raw:?}"))
        };

        let (scheme, rest) = match raw.split_once("://") {
            Some((s, rest)) => (
                Some(Scheme::from_str(s).map_err(|_| invalid("unknown scheme"))?),
                rest,
            ),
            None => (None, raw),
        };

        let (domain, address_family, port) = if let Some(bracketed) = rest.strip_prefix('[') {
            let (addr, tail) = bracketed
                .split_once(']')
                .ok_or_else(|| invalid("unclosed ipv6 bracket"))?;
            Ipv6Addr::from_str(addr).map_err(|_| invalid("invalid ipv6 address"))?;
            let port = match tail {
                "" => None,
                tail => Some(
                    tail.strip_prefix(':')
                        .ok_or_else(|| invalid("unexpected characters after ipv6 address"))?,
                ),
            };
            (addr, AddressFamily::V6, port)
        } else {
            match rest.split_once(':') {
                None => (rest, AddressFamily::V4, None),
                Some((domain, port)) if !port.contains(':') => {
                    (domain, AddressFamily::V4, Some(port))
                }
                Some(_) => return Err(invalid("multiple colons outside of ipv6 brackets")),
            }
        };

        if domain.is_empty() {
            return Err(invalid("empty domain"));
        }
        if domain
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '/' | '?' | '#' | '@' | '[' | ']'))
        {
            return Err(invalid("domain contains invalid characters"));
        }

        let port = port
            .map(|p| {
                let digits = !p.is_empty()
                    && !p.starts_with('0')
                    && p.bytes().all(|b| b.is_ascii_digit());
                match p.parse::<u16>() {
                    Ok(p) if digits => Ok(p),
                    _ => Err(invalid("port must be an integer in 1..=65535")),
                }
            })
            .transpose()?;

        let scheme = match (scheme, port) {
            (Some(scheme), _) => scheme,
            (None, Some(80)) => Scheme::Http,
            (None, _) => Scheme::Https,
        };

        Ok(Self {
            scheme,
            domain: domain.to_string(),
            port: port.unwrap_or_else(|| scheme.default_port()),
            address_family,
            userinfo: None,
        })
    }

    /// Attach the user-info rendered before the domain in composed urls.
    ///
    /// The value is used as-is: encode reserved characters before passing it.
    pub fn with_userinfo(mut self, userinfo: impl Into<String>) -> Self {
        self.userinfo = Some(userinfo.into());
        self
    }

    /// Scheme of this endpoint.
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Domain without brackets.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Port, always explicit.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Address family of the domain.
    pub fn address_family(&self) -> AddressFamily {
        self.address_family
    }

    /// User-info, if any.
    pub fn userinfo(&self) -> Option<&str> {
        self.userinfo.as_deref()
    }

    /// Domain as it appears in a url: IPv6 literals are bracket-wrapped.
    pub fn host(&self) -> String {
        match self.address_family {
            AddressFamily::V4 => self.domain.clone(),
            AddressFamily::V6 => format!("[{}]", self.domain),
        }
    }

    /// `host:port`.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host(), self.port)
    }

    /// Whether the port is the default one of the scheme.
    pub fn is_default_port(&self) -> bool {
        self.port == self.scheme.default_port()
    }
}

impl FromStr for Endpoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Endpoint::parse(s)
    }
}

impl Display for Endpoint {
    /// `scheme://host:port`, user-info left out.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://{}", self.scheme, self.authority())
    }
}

impl Debug for Endpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("scheme", &self.scheme)
            .field("domain", &self.domain)
            .field("port", &self.port)
            .field("address_family", &self.address_family)
            .field("userinfo", &self.userinfo.as_ref().map(Redact::from))
            .finish()
    }
}
