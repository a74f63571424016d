use std::env;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use http::header::{AUTHORIZATION, CONTENT_TYPE, DATE};
use http::StatusCode;
use log::warn;
use pretty_assertions::assert_eq;
use s3sign_core::hash::base64_md5;
use s3sign_core::{Context, ErrorKind, HttpSend, Signer, StaticEnv};
use s3sign_http_send_reqwest::ReqwestHttpSend;
use s3sign_s3::url::compose;
use s3sign_s3::{
    sign_v2, AddressingStyle, Client, Config, ConfigCredentialProvider, Credential, Endpoint,
    Method, RequestSigner, SignableRequest,
};
use test_case::test_case;

/// Records every request and answers with a fixed status and body.
#[derive(Debug, Clone)]
struct RecordingHttpSend {
    status: StatusCode,
    body: &'static str,
    requests: Arc<Mutex<Vec<http::Request<Bytes>>>>,
}

impl RecordingHttpSend {
    fn new(status: StatusCode, body: &'static str) -> Self {
        Self {
            status,
            body,
            requests: Arc::default(),
        }
    }

    fn last(&self) -> http::Request<Bytes> {
        let requests = self.requests.lock().unwrap();
        let req = requests.last().expect("a request must be recorded");

        let mut cloned = http::Request::builder()
            .method(req.method().clone())
            .uri(req.uri().clone())
            .version(req.version())
            .body(req.body().clone())
            .unwrap();
        *cloned.headers_mut() = req.headers().clone();
        cloned
    }
}

#[async_trait]
impl HttpSend for RecordingHttpSend {
    async fn http_send(
        &self,
        req: http::Request<Bytes>,
    ) -> s3sign_core::Result<http::Response<Bytes>> {
        self.requests.lock().unwrap().push(req);
        Ok(http::Response::builder()
            .status(self.status)
            .header("ETag", "\"5d41402abc4b2a76b9719d911017c592\"")
            .body(Bytes::from_static(self.body.as_bytes()))?)
    }
}

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test_case("https://s3.example.com:9000", "https", "s3.example.com", 9000; "scheme domain port")]
#[test_case("http://s3.example.com", "http", "s3.example.com", 80; "scheme domain")]
#[test_case("s3.example.com:80", "http", "s3.example.com", 80; "domain port")]
#[test_case("s3.example.com", "https", "s3.example.com", 443; "domain")]
#[test_case("[2001:db8::1]:9000", "https", "[2001:db8::1]", 9000; "ipv6")]
fn test_normalize_then_compose(raw: &str, scheme: &str, host: &str, port: u16) -> Result<()> {
    let endpoint = Endpoint::parse(raw)?;

    let url = compose(&endpoint, AddressingStyle::Path, "mybucket");
    assert_eq!(url, format!("{scheme}://{host}:{port}/mybucket"));
    Ok(())
}

#[tokio::test]
async fn test_client_send_signs_and_dispatches() -> Result<()> {
    init_logger();

    let http = RecordingHttpSend::new(StatusCode::OK, "");
    let ctx = Context::new().with_http_send(http.clone());
    let config = Config::new(Endpoint::parse("s3.example.com")?)
        .with_credential("AKID", "secret")
        .with_addressing_style(AddressingStyle::VirtualHosted);
    let client = Client::new(ctx, config);

    let resp = client
        .request(Method::Put, "mybucket", "hello.txt")
        .content_type("text/plain")
        .amz_header("x-amz-meta-owner", "alice")
        .body("hello")
        .send()
        .await?;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(
        resp.header("etag"),
        Some("\"5d41402abc4b2a76b9719d911017c592\"")
    );

    let req = http.last();
    assert_eq!(req.method(), http::Method::PUT);
    assert_eq!(
        req.uri().to_string(),
        "https://mybucket.s3.example.com:443/hello.txt"
    );
    assert_eq!(req.body(), &Bytes::from_static(b"hello"));

    // The server side recomputes the signature from what it received.
    let headers = req.headers();
    let expected = sign_v2(
        &Credential::new("AKID", "secret"),
        &SignableRequest::new(Method::Put, "/hello.txt", headers[DATE].to_str()?)
            .with_host("mybucket")
            .with_content_md5(base64_md5(b"hello"))
            .with_content_type(headers[CONTENT_TYPE].to_str()?)
            .with_amz_header("x-amz-meta-owner", headers["x-amz-meta-owner"].to_str()?),
    )?;
    assert_eq!(headers[AUTHORIZATION], expected.authorization.as_str());
    Ok(())
}

#[tokio::test]
async fn test_client_send_http_error() -> Result<()> {
    let ctx = Context::new().with_http_send(RecordingHttpSend::new(
        StatusCode::NOT_FOUND,
        "<Error><Code>NoSuchKey</Code></Error>",
    ));
    let config = Config::new(Endpoint::parse("s3.example.com")?).with_credential("AKID", "secret");
    let client = Client::new(ctx, config);

    let err = client
        .request(Method::Get, "mybucket", "missing.txt")
        .send()
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Http);
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    assert_eq!(
        err.response_body(),
        Some(&Bytes::from_static(b"<Error><Code>NoSuchKey</Code></Error>"))
    );
    Ok(())
}

#[tokio::test]
async fn test_client_send_checked_error_in_body() -> Result<()> {
    let ctx = Context::new().with_http_send(RecordingHttpSend::new(
        StatusCode::OK,
        "<Error><Code>InternalError</Code><Message>We encountered an internal error.</Message></Error>",
    ));
    let config = Config::new(Endpoint::parse("s3.example.com")?).with_credential("AKID", "secret");
    let client = Client::new(ctx, config);

    let err = client
        .request(Method::Post, "mybucket", "big.bin")
        .subresource("uploads")
        .send_checked()
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ServiceErrorInBody);
    assert_eq!(err.service_code(), Some("InternalError"));
    Ok(())
}

#[tokio::test]
async fn test_client_head_uses_http10() -> Result<()> {
    let http = RecordingHttpSend::new(StatusCode::OK, "");
    let ctx = Context::new().with_http_send(http.clone());
    let config = Config::new(Endpoint::parse("s3.example.com")?).with_credential("AKID", "secret");
    let client = Client::new(ctx, config);

    client.request(Method::Head, "mybucket", "a.txt").send().await?;
    assert_eq!(http.last().version(), http::Version::HTTP_10);
    Ok(())
}

#[tokio::test]
async fn test_signer_from_env_config() -> Result<()> {
    init_logger();

    let ctx = Context::new().with_env(StaticEnv::from_iter([
        ("AWS_ACCESS_KEY_ID", "AKID"),
        ("AWS_SECRET_ACCESS_KEY", "secret"),
        ("S3SIGN_ENDPOINT", "http://127.0.0.1:9000"),
        ("S3SIGN_ADDRESSING_STYLE", "path"),
    ]));
    let config = Arc::new(Config::default().from_env(&ctx)?);
    let signer = Signer::new(
        ctx,
        ConfigCredentialProvider::new(config.clone()),
        RequestSigner::new(config),
    );

    let (mut parts, _) = http::Request::get("http://127.0.0.1:9000/bucket/key")
        .header(DATE, "Tue, 27 Mar 2024 12:00:00 GMT")
        .body(())?
        .into_parts();
    signer.sign(&mut parts, None).await?;
    assert_eq!(
        parts.headers[AUTHORIZATION],
        "AWS AKID:VtYnciUKOSY7ASayIrBAD5xMFNo="
    );

    let (mut parts, _) = http::Request::get("http://127.0.0.1:9000/bucket/key")
        .body(())?
        .into_parts();
    signer
        .sign(&mut parts, Some(Duration::from_secs(600)))
        .await?;
    let uri = parts.uri.to_string();
    assert!(uri.contains("X-Amz-Expires=600"), "{uri}");
    assert_eq!(parts.headers[http::header::HOST], "127.0.0.1:9000");
    Ok(())
}

/// Runs against a live S3-compatible service when `S3SIGN_TEST=on`.
///
/// Needs `S3SIGN_ENDPOINT`, `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY` and
/// `S3SIGN_TEST_BUCKET`.
#[tokio::test]
async fn test_live_put_get_presign() -> Result<()> {
    init_logger();

    if env::var("S3SIGN_TEST").ok().as_deref() != Some("on") {
        warn!("S3SIGN_TEST is not set, skip live test");
        return Ok(());
    }

    let bucket = env::var("S3SIGN_TEST_BUCKET").expect("env S3SIGN_TEST_BUCKET must set");
    let ctx = Context::new()
        .with_http_send(ReqwestHttpSend::default())
        .with_env(s3sign_core::OsEnv);
    let config = Config::default()
        .with_addressing_style(AddressingStyle::Path)
        .from_env(&ctx)?;
    let client = Client::new(ctx.clone(), config);

    client
        .request(Method::Put, &bucket, "s3sign/live.txt")
        .content_type("text/plain")
        .body("hello, world")
        .send_checked()
        .await?;

    let resp = client
        .request(Method::Get, &bucket, "s3sign/live.txt")
        .send()
        .await?;
    assert_eq!(resp.body, Bytes::from_static(b"hello, world"));

    let head = client
        .request(Method::Head, &bucket, "s3sign/live.txt")
        .send()
        .await?;
    assert_eq!(head.header("content-length"), Some("12"));

    let url = client.presign_url(Method::Get, &bucket, "s3sign/live.txt", Duration::from_secs(60))?;
    let resp = ctx
        .http_send(http::Request::get(url.as_str()).body(Bytes::new())?)
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.body(), &Bytes::from_static(b"hello, world"));

    client
        .request(Method::Delete, &bucket, "s3sign/live.txt")
        .send()
        .await?;
    Ok(())
}
