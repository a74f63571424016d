use std::collections::BTreeMap;
use std::fmt::Write;
use std::time::Duration;

use log::debug;
use percent_encoding::utf8_percent_encode;
use s3sign_core::hash::{hex_hmac_sha256, hex_sha256, hmac_sha256};
use s3sign_core::time::{format_date, format_iso8601, DateTime};
use s3sign_core::{Error, Result};

use crate::constants::*;
use crate::{AddressingStyle, Config, Credential, Endpoint, ExpirationWindow, Method, ObjectLocation};

/// A request to presign with SigV4.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignRequest {
    /// HTTP method the url is valid for.
    pub method: Method,
    /// Bucket name, unencoded.
    pub bucket: String,
    /// Object key, unencoded.
    pub key: String,
    /// Requested lifetime.
    pub expires_in: Duration,
    /// Extra query parameters, unencoded. They are signed.
    pub params: Vec<(String, String)>,
    /// Headers the caller promises to send. They are signed next to `host`.
    pub headers: Vec<(String, String)>,
}

impl PresignRequest {
    /// Presign `method` on `bucket/key` for `expires_in`.
    pub fn new(
        method: Method,
        bucket: impl Into<String>,
        key: impl Into<String>,
        expires_in: Duration,
    ) -> Self {
        Self {
            method,
            bucket: bucket.into(),
            key: key.into(),
            expires_in,
            params: Vec::new(),
            headers: Vec::new(),
        }
    }

    /// Add a signed query parameter such as `response-content-type`.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Add a signed header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Presign `req` with `anchor` as signing time.
///
/// The lifetime must be within `1..=604800` seconds, otherwise the call
/// fails with [`s3sign_core::ErrorKind::RequestInvalid`].
pub fn presign_v4(
    config: &Config,
    cred: &Credential,
    req: &PresignRequest,
    anchor: DateTime,
) -> Result<String> {
    presign_v4_for(config, cred, req, anchor, req.expires_in.as_secs())
}

/// Presign `req` with its lifetime aligned to the configured expiration window.
///
/// Urls built for the same request inside one window are identical. The
/// aligned lifetime is capped at 604800 seconds. Without a configured window
/// this is [`presign_v4`] signed at `now`.
pub fn presign_v4_aligned(
    config: &Config,
    cred: &Credential,
    req: &PresignRequest,
    now: DateTime,
) -> Result<String> {
    match config.expiration_window {
        Some(window_size) => {
            let window = ExpirationWindow::align(now, req.expires_in.as_secs(), window_size);
            debug!("presign aligned to window {window:?}");
            presign_v4_for(config, cred, req, window.anchor(), window_expires(&window))
        }
        None => presign_v4(config, cred, req, now),
    }
}

/// `X-Amz-Expires` for an aligned window, capped at the SigV4 maximum.
pub(crate) fn window_expires(window: &ExpirationWindow) -> u64 {
    window.lifetime().as_secs().min(MAX_PRESIGN_EXPIRES_SECS)
}

fn presign_v4_for(
    config: &Config,
    cred: &Credential,
    req: &PresignRequest,
    anchor: DateTime,
    expires: u64,
) -> Result<String> {
    let loc = ObjectLocation::new(&config.endpoint, config.addressing_style, &req.bucket, &req.key);

    let mut headers = req
        .headers
        .iter()
        .map(|(k, v)| (k.to_ascii_lowercase(), v.trim().to_string()))
        .collect::<BTreeMap<_, _>>();
    headers.insert(
        "host".to_string(),
        host_header(&config.endpoint, config.addressing_style, &loc.host),
    );

    let query = sign_query(
        cred,
        config.region(),
        req.method.as_str(),
        &loc.path,
        &headers,
        req.params.clone(),
        anchor,
        expires,
    )?;

    Ok(format!("{}?{}", loc.url, join_query(&query)))
}

/// `k1=v1&k2=v2`, order kept.
pub(crate) fn join_query(query: &[(String, String)]) -> String {
    query
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// `Host` as hyper sends it: the default port is left out.
fn host_header(endpoint: &Endpoint, style: AddressingStyle, bucket: &str) -> String {
    let mut host = match style {
        AddressingStyle::VirtualHosted if !bucket.is_empty() => {
            format!("{bucket}.{}", endpoint.host())
        }
        _ => endpoint.host(),
    };
    if !endpoint.is_default_port() {
        host = format!("{host}:{}", endpoint.port());
    }
    host
}

/// Compute SigV4 presigned query parameters.
///
/// - `path` is the encoded request path.
/// - `headers` are lower-cased and must contain `host`.
/// - `query` holds the caller's unencoded parameters.
///
/// Returns every query pair encoded, `X-Amz-Signature` included.
#[allow(clippy::too_many_arguments)]
pub(crate) fn sign_query(
    cred: &Credential,
    region: &str,
    method: &str,
    path: &str,
    headers: &BTreeMap<String, String>,
    mut query: Vec<(String, String)>,
    anchor: DateTime,
    expires: u64,
) -> Result<Vec<(String, String)>> {
    if expires == 0 || expires > MAX_PRESIGN_EXPIRES_SECS {
        return Err(Error::request_invalid(format!(
            "presign lifetime must be within 1..={MAX_PRESIGN_EXPIRES_SECS} seconds"
        ))
        .with_context(format!("expires: {expires}")));
    }

    // Scope: "20220313/<region>/<service>/aws4_request"
    let scope = format!("{}/{region}/{S3_SERVICE}/aws4_request", format_date(anchor));
    debug!("calculated scope: {scope}");

    let signed_headers = headers.keys().map(String::as_str).collect::<Vec<_>>().join(";");

    query.push((X_AMZ_ALGORITHM.into(), AWS4_HMAC_SHA256.into()));
    query.push((
        X_AMZ_CREDENTIAL.into(),
        format!("{}/{scope}", cred.access_key_id),
    ));
    query.push((X_AMZ_DATE.into(), format_iso8601(anchor)));
    query.push((X_AMZ_EXPIRES.into(), expires.to_string()));
    query.push((X_AMZ_SIGNED_HEADERS.into(), signed_headers.clone()));
    if let Some(token) = &cred.session_token {
        query.push((X_AMZ_SECURITY_TOKEN_QUERY.into(), token.into()));
    }

    let mut query = query
        .iter()
        .map(|(k, v)| {
            (
                utf8_percent_encode(k, &AWS_QUERY_ENCODE_SET).to_string(),
                utf8_percent_encode(v, &AWS_QUERY_ENCODE_SET).to_string(),
            )
        })
        .collect::<Vec<_>>();
    // Sort by encoded param name
    query.sort();

    let creq = {
        let mut f = String::with_capacity(256);
        writeln!(f, "{method}")?;
        writeln!(f, "{path}")?;
        writeln!(f, "{}", join_query(&query))?;
        for (k, v) in headers {
            writeln!(f, "{k}:{v}")?;
        }
        writeln!(f)?;
        writeln!(f, "{signed_headers}")?;
        write!(f, "{UNSIGNED_PAYLOAD}")?;
        f
    };
    debug!("calculated canonical request: {creq}");

    // StringToSign:
    //
    // AWS4-HMAC-SHA256
    // 20220313T072004Z
    // 20220313/<region>/<service>/aws4_request
    // <hashed_canonical_request>
    let string_to_sign = {
        let mut f = String::new();
        writeln!(f, "{AWS4_HMAC_SHA256}")?;
        writeln!(f, "{}", format_iso8601(anchor))?;
        writeln!(f, "{scope}")?;
        write!(f, "{}", hex_sha256(creq.as_bytes()))?;
        f
    };
    debug!("calculated string to sign: {string_to_sign}");

    let signing_key = generate_signing_key(&cred.secret_access_key, anchor, region, S3_SERVICE);
    let signature = hex_hmac_sha256(&signing_key, string_to_sign.as_bytes());
    query.push((X_AMZ_SIGNATURE.into(), signature));

    Ok(query)
}

fn generate_signing_key(secret: &str, time: DateTime, region: &str, service: &str) -> Vec<u8> {
    // Sign secret
    let secret = format!("AWS4{secret}");
    // Sign date
    let sign_date = hmac_sha256(secret.as_bytes(), format_date(time).as_bytes());
    // Sign region
    let sign_region = hmac_sha256(sign_date.as_slice(), region.as_bytes());
    // Sign service
    let sign_service = hmac_sha256(sign_region.as_slice(), service.as_bytes());
    // Sign request
    hmac_sha256(sign_service.as_slice(), "aws4_request".as_bytes())
}
