use anyhow::Result;
use bytes::Bytes;
use reqwest::Client;
use s3sign_core::Context;
use s3sign_http_send_reqwest::ReqwestHttpSend;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    let client = Client::builder()
        .timeout(Duration::from_secs(30))
        .pool_max_idle_per_host(10)
        .user_agent("s3sign-example/1.0")
        .build()?;

    let ctx = Context::new().with_http_send(ReqwestHttpSend::new(client));

    // Anonymous HEAD against a public endpoint: only checks the transport.
    let req = http::Request::head("https://s3.amazonaws.com:443/")
        .version(http::Version::HTTP_10)
        .body(Bytes::new())?;

    match ctx.http_send(req).await {
        Ok(resp) => println!("status: {}", resp.status()),
        Err(e) => println!("transport failed: {e}"),
    }

    Ok(())
}
