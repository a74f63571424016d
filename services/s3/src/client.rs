use std::collections::BTreeMap;
use std::num::NonZeroU64;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::header::{HeaderName, AUTHORIZATION, CONTENT_TYPE, DATE};
use http::{HeaderMap, HeaderValue};
use percent_encoding::utf8_percent_encode;
use s3sign_core::hash::base64_md5;
use s3sign_core::time::{format_http_date, now, DateTime};
use s3sign_core::{Context, Error, Result, SigningRequest};

use crate::constants::*;
use crate::dispatch::{dispatch, dispatch_checked, Response, SignedRequest};
use crate::presign_v4::{presign_v4_aligned, PresignRequest};
use crate::sign_v2::{presign_v2, sign_v2, SignableRequest};
use crate::{Config, ExpirationWindow, Method, ObjectLocation};

/// Client ties endpoint, signing and dispatch together.
///
/// It holds no mutable state: clone it freely and share it across tasks.
#[derive(Debug, Clone)]
pub struct Client {
    ctx: Context,
    config: Arc<Config>,
}

impl Client {
    /// Create a client that sends through `ctx`.
    pub fn new(ctx: Context, config: Config) -> Self {
        Self {
            ctx,
            config: Arc::new(config),
        }
    }

    /// Config used by this client.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Context used by this client.
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Start a v2 signed request on `bucket/key`.
    ///
    /// An empty key addresses the bucket itself.
    pub fn request(&self, method: Method, bucket: &str, key: &str) -> RequestBuilder<'_> {
        RequestBuilder {
            client: self,
            method,
            bucket: bucket.to_string(),
            key: key.to_string(),
            subresource: None,
            content_type: None,
            amz_headers: BTreeMap::new(),
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    /// Presign `method` on `bucket/key` with SigV4.
    ///
    /// With an expiration window configured, the url is aligned so callers
    /// in the same window share it.
    pub fn presign_url(
        &self,
        method: Method,
        bucket: &str,
        key: &str,
        ttl: Duration,
    ) -> Result<String> {
        self.presign(&PresignRequest::new(method, bucket, key, ttl))
    }

    /// Presign a fully described request with SigV4.
    pub fn presign(&self, req: &PresignRequest) -> Result<String> {
        let cred = self.config.credential()?;
        presign_v4_aligned(&self.config, &cred, req, now())
    }

    /// Presign `method` on `bucket/key` with the legacy v2 query string.
    pub fn presign_v2_url(
        &self,
        method: Method,
        bucket: &str,
        key: &str,
        ttl: Duration,
    ) -> Result<String> {
        let cred = self.config.credential()?;
        let loc = ObjectLocation::new(
            &self.config.endpoint,
            self.config.addressing_style,
            bucket,
            key,
        );
        // A one second window keeps `now` as is.
        let window_size = self.config.expiration_window.unwrap_or(NonZeroU64::MIN);
        let window = ExpirationWindow::align(now(), ttl.as_secs(), window_size);

        presign_v2(&cred, method, &loc, &window)
    }
}

/// Builder of a single v2 signed request.
#[derive(Debug)]
pub struct RequestBuilder<'a> {
    client: &'a Client,
    method: Method,
    bucket: String,
    key: String,
    subresource: Option<String>,
    content_type: Option<String>,
    amz_headers: BTreeMap<String, String>,
    headers: Vec<(String, String)>,
    body: Bytes,
}

impl RequestBuilder<'_> {
    /// Set the subresource, unencoded: `acl`, `uploadId=2~1`.
    ///
    /// Pairs are sorted by name before signing.
    pub fn subresource(mut self, subresource: impl Into<String>) -> Self {
        self.subresource = Some(subresource.into());
        self
    }

    /// Set `Content-Type`.
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Add a signed `x-amz-*` header.
    ///
    /// Other names fail at [`RequestBuilder::build`], use
    /// [`RequestBuilder::header`] for them.
    pub fn amz_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.amz_headers
            .insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Add an unsigned header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the body. A non-empty body gets a `Content-MD5`.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Sign the request as of `now`.
    pub fn build(self, now: DateTime) -> Result<SignedRequest> {
        let config = &self.client.config;
        let cred = config.credential()?;
        if let Some(name) = self
            .amz_headers
            .keys()
            .find(|k| !k.starts_with(X_AMZ_PREFIX))
        {
            return Err(Error::request_invalid(format!(
                "amz header {name:?} must start with `{X_AMZ_PREFIX}`"
            )));
        }
        let loc = ObjectLocation::new(
            &config.endpoint,
            config.addressing_style,
            &self.bucket,
            &self.key,
        );

        let mut signable = SignableRequest::new(self.method, loc.path.as_str(), format_http_date(now))
            .with_host(loc.host.as_str());
        signable.subresource = self
            .subresource
            .as_deref()
            .map(sort_subresource)
            .filter(|v| !v.is_empty());
        signable.content_type = self.content_type;
        signable.amz_headers = self.amz_headers;
        signable.extra_headers = self.headers;
        if !self.body.is_empty() {
            signable.content_md5 = Some(base64_md5(&self.body));
        }
        if let Some(token) = &cred.session_token {
            signable
                .amz_headers
                .insert(X_AMZ_SECURITY_TOKEN.to_string(), token.clone());
        }

        let signed = sign_v2(&cred, &signable)?;

        let mut url = loc.url;
        if let Some(sub) = &signable.subresource {
            url.push('?');
            url.push_str(&encode_subresource(sub));
        }

        let mut headers = HeaderMap::new();
        headers.insert(DATE, signable.date.parse()?);
        if let Some(v) = &signable.content_md5 {
            headers.insert(HeaderName::from_static(CONTENT_MD5), v.parse()?);
        }
        if let Some(v) = &signable.content_type {
            headers.insert(CONTENT_TYPE, v.parse()?);
        }
        for (k, v) in &signable.amz_headers {
            let mut value = HeaderValue::from_str(v)?;
            value.set_sensitive(k == X_AMZ_SECURITY_TOKEN);
            headers.insert(HeaderName::from_bytes(k.as_bytes())?, value);
        }
        for (k, v) in &signable.extra_headers {
            headers.append(HeaderName::from_bytes(k.as_bytes())?, v.parse()?);
        }
        let mut authorization = HeaderValue::from_str(&signed.authorization)?;
        authorization.set_sensitive(true);
        headers.insert(AUTHORIZATION, authorization);

        Ok(SignedRequest {
            method: self.method,
            url,
            headers,
            body: self.body,
        })
    }

    /// Sign and send; any non-2xx status fails.
    pub async fn send(self) -> Result<Response> {
        let client = self.client;
        dispatch(&client.ctx, self.build(now())?).await
    }

    /// Like [`RequestBuilder::send`], also failing on an XML error envelope.
    pub async fn send_checked(self) -> Result<Response> {
        let client = self.client;
        dispatch_checked(&client.ctx, self.build(now())?).await
    }
}

/// `uploadId=2&partNumber=1` → `partNumber=1&uploadId=2`
fn sort_subresource(sub: &str) -> String {
    let pairs = sub
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) => (k.to_string(), v.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .collect();
    SigningRequest::query_to_string(pairs, "=", "&")
}

/// `uploadId=a b&partNumber=1` → `uploadId=a%20b&partNumber=1`
fn encode_subresource(sub: &str) -> String {
    sub.split('&')
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) => format!(
                "{}={}",
                utf8_percent_encode(k, &AWS_QUERY_ENCODE_SET),
                utf8_percent_encode(v, &AWS_QUERY_ENCODE_SET)
            ),
            None => utf8_percent_encode(pair, &AWS_QUERY_ENCODE_SET).to_string(),
        })
        .collect::<Vec<_>>()
        .join("&")
}
