use std::collections::BTreeMap;

use bytes::Bytes;
use http::{HeaderMap, StatusCode, Version};
use log::debug;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;
use s3sign_core::utils::redact_url;
use s3sign_core::{Context, Error, Result};

use crate::Method;

/// A signed request, ready to send.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    /// HTTP method.
    pub method: Method,
    /// Fully qualified url, query included.
    pub url: String,
    /// Headers, `Authorization` included.
    pub headers: HeaderMap,
    /// Request body.
    pub body: Bytes,
}

impl SignedRequest {
    /// Convert into an `http::Request`.
    ///
    /// `HEAD` goes out as HTTP/1.0 so the reply is never parsed as chunked.
    pub fn into_http(self) -> Result<http::Request<Bytes>> {
        let mut req = http::Request::builder()
            .method(http::Method::from(self.method))
            .uri(self.url.as_str());
        if self.method == Method::Head {
            req = req.version(Version::HTTP_10);
        }

        let mut req = req
            .body(self.body)
            .map_err(|e| Error::request_invalid("failed to build request").with_source(e))?;
        *req.headers_mut() = self.headers;
        Ok(req)
    }
}

/// A successful response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Status, always in `200..=299`.
    pub status: StatusCode,
    /// Headers keyed by lower-cased name. Repeated headers are joined with `,`.
    pub headers: BTreeMap<String, String>,
    /// Body, untouched.
    pub body: Bytes,
}

impl Response {
    fn new(status: StatusCode, headers: &HeaderMap, body: Bytes) -> Self {
        let mut canonical = BTreeMap::<String, String>::new();
        for (name, value) in headers {
            let value = String::from_utf8_lossy(value.as_bytes());
            canonical
                .entry(name.as_str().to_ascii_lowercase())
                .and_modify(|v| {
                    v.push(',');
                    v.push_str(&value);
                })
                .or_insert_with(|| value.into_owned());
        }

        Self {
            status,
            headers: canonical,
            body,
        }
    }

    /// Look up a header ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Send `req` and classify the outcome.
///
/// - Transport failures come back as returned by the [`s3sign_core::HttpSend`].
/// - Any status outside `200..=299` fails with [`s3sign_core::ErrorKind::Http`]
///   carrying status, headers and body.
pub async fn dispatch(ctx: &Context, req: SignedRequest) -> Result<Response> {
    let method = req.method;
    let url = redact_url(&req.url);
    debug!("dispatching {method} {url}");

    let resp = ctx.http_send(req.into_http()?).await?;
    let (parts, body) = resp.into_parts();
    debug!("{method} {url} got response status {}", parts.status);

    if !parts.status.is_success() {
        return Err(Error::http(parts.status, parts.headers, body)
            .with_context(format!("method: {method}"))
            .with_context(format!("url: {url}")));
    }

    Ok(Response::new(parts.status, &parts.headers, body))
}

/// [`dispatch`], then treat an XML `Error` envelope in a 2xx body as failure.
///
/// Some endpoints answer `200 OK` with an error document, this catches them
/// as [`s3sign_core::ErrorKind::ServiceErrorInBody`].
pub async fn dispatch_checked(ctx: &Context, req: SignedRequest) -> Result<Response> {
    let resp = dispatch(ctx, req).await?;
    check_error_envelope(&resp.body)?;
    Ok(resp)
}

#[derive(Default, Debug, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct ErrorEnvelope {
    code: String,
    message: String,
}

/// Fail with [`s3sign_core::ErrorKind::ServiceErrorInBody`] if `body` is an XML
/// document whose root element is `Error`.
///
/// Bodies that are not XML pass. An `Error` root that fails to parse still
/// fails, with empty code and message.
pub fn check_error_envelope(body: &[u8]) -> Result<()> {
    if !is_error_envelope(body) {
        return Ok(());
    }

    let envelope = std::str::from_utf8(body)
        .map_err(|e| e.to_string())
        .and_then(|s| quick_xml::de::from_str::<ErrorEnvelope>(s).map_err(|e| e.to_string()))
        .unwrap_or_else(|e| {
            debug!("failed to parse error envelope: {e}");
            ErrorEnvelope::default()
        });

    Err(Error::service_error_in_body(envelope.code, envelope.message))
}

fn is_error_envelope(body: &[u8]) -> bool {
    let mut reader = Reader::from_reader(body);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return e.local_name().as_ref() == b"Error";
            }
            Ok(Event::Eof) | Err(_) => return false,
            // Declarations, comments and whitespace before the root.
            Ok(Event::Decl(_))
            | Ok(Event::Comment(_))
            | Ok(Event::DocType(_))
            | Ok(Event::PI(_)) => continue,
            Ok(Event::Text(t)) if t.iter().all(u8::is_ascii_whitespace) => continue,
            Ok(_) => return false,
        }
    }
}
