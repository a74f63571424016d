use anyhow::Result;
use s3sign::default_context;
use s3sign::s3::{AddressingStyle, Client, Config, Method};
use std::env;
use std::num::NonZeroU64;
use std::time::Duration;

/// Print a presigned url for `s3://{bucket}/{key}`.
///
/// ```shell
/// S3SIGN_ENDPOINT=127.0.0.1:9000 AWS_ACCESS_KEY_ID=minioadmin AWS_SECRET_ACCESS_KEY=minioadmin \
///     cargo run --example presign -- bucket key
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let mut args = env::args().skip(1);
    let (Some(bucket), Some(key)) = (args.next(), args.next()) else {
        anyhow::bail!("usage: presign <bucket> <key>");
    };

    let config = Config::default()
        .with_addressing_style(AddressingStyle::Path)
        .with_expiration_window(NonZeroU64::new(60).expect("60 is not zero"));
    let ctx = default_context(&config)?;
    let config = config.from_env(&ctx)?;
    let client = Client::new(ctx, config);

    let url = client.presign_url(Method::Get, &bucket, &key, Duration::from_secs(300))?;
    println!("{url}");

    let resp = client.request(Method::Head, &bucket, &key).send().await?;
    println!("{} bytes", resp.header("content-length").unwrap_or("?"));
    Ok(())
}
