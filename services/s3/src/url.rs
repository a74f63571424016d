//! Url composition for virtual-hosted and path-style buckets.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use percent_encoding::utf8_percent_encode;
use s3sign_core::{Error, Result};

use crate::constants::AWS_URI_ENCODE_SET;
use crate::Endpoint;

/// How the bucket name is addressed in urls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AddressingStyle {
    /// Bucket as a DNS subdomain: `https://bucket.s3.example.com:443`.
    #[default]
    VirtualHosted,
    /// Bucket as first path segment: `https://s3.example.com:443/bucket`.
    Path,
}

impl FromStr for AddressingStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "virtual" | "virtual_hosted" | "virtual-hosted" | "vhost" => {
                Ok(AddressingStyle::VirtualHosted)
            }
            "path" => Ok(AddressingStyle::Path),
            _ => Err(Error::config_invalid(format!(
                "unknown addressing style {s:?}, expect `virtual` or `path`"
            ))),
        }
    }
}

impl Display for AddressingStyle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AddressingStyle::VirtualHosted => f.write_str("virtual"),
            AddressingStyle::Path => f.write_str("path"),
        }
    }
}

/// Compose a fully-qualified url for `resource`.
///
/// - `VirtualHosted`: `scheme://[userinfo@]{resource}.{domain}:{port}`
/// - `Path`: `scheme://[userinfo@]{domain}:{port}/{resource}`
///
/// An empty resource drops the subdomain or path segment. The port is
/// always rendered so equal inputs give byte-identical urls.
pub fn compose(endpoint: &Endpoint, style: AddressingStyle, resource: &str) -> String {
    let mut s = String::with_capacity(64);
    s.push_str(endpoint.scheme().as_str());
    s.push_str("://");
    if let Some(userinfo) = endpoint.userinfo() {
        s.push_str(userinfo);
        s.push('@');
    }

    match style {
        AddressingStyle::VirtualHosted => {
            if !resource.is_empty() {
                s.push_str(resource);
                s.push('.');
            }
            s.push_str(&endpoint.authority());
        }
        AddressingStyle::Path => {
            s.push_str(&endpoint.authority());
            if !resource.is_empty() {
                s.push('/');
                s.push_str(resource);
            }
        }
    }

    s
}

/// Percent-encode a bucket or key, keeping unreserved characters and `/`.
pub fn encode_loose(s: &str) -> String {
    utf8_percent_encode(s, &AWS_URI_ENCODE_SET).to_string()
}

/// Where an object lives: the url to call and the resource to sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLocation {
    /// Url without query, e.g. `https://bucket.s3.example.com:443/key`.
    pub url: String,
    /// Bucket name for the v2 host segment; empty for path-style.
    pub host: String,
    /// Encoded path as sent on the wire, always starting with `/`.
    pub path: String,
}

impl ObjectLocation {
    /// Locate `key` inside `bucket`. Both are encoded with [`encode_loose`].
    pub fn new(endpoint: &Endpoint, style: AddressingStyle, bucket: &str, key: &str) -> Self {
        let bucket = encode_loose(bucket);
        let key = encode_loose(key.trim_start_matches('/'));

        match style {
            AddressingStyle::VirtualHosted => Self {
                url: format!("{}/{key}", compose(endpoint, style, &bucket)),
                host: bucket,
                path: format!("/{key}"),
            },
            AddressingStyle::Path => {
                let path = if bucket.is_empty() {
                    format!("/{key}")
                } else {
                    format!("/{bucket}/{key}")
                };
                Self {
                    url: format!("{}{path}", compose(endpoint, style, "")),
                    host: String::new(),
                    path,
                }
            }
        }
    }

    /// Canonical resource for v2 signing: `/bucket/key`.
    pub fn canonical_resource(&self) -> String {
        if self.host.is_empty() {
            self.path.clone()
        } else {
            format!("/{}{}", self.host, self.path)
        }
    }
}
