use log::debug;
use reqwest::Client;
use s3sign_core::{Context, Error, OsEnv, Result};
use s3sign_http_send_reqwest::ReqwestHttpSend;
use s3sign_s3::Config;

/// Build a [`Context`] that sends with `reqwest` and reads the OS environment.
///
/// `config.ssl_options` is applied to the underlying client.
pub fn default_context(config: &Config) -> Result<Context> {
    if config.ssl_options.accept_invalid_certs {
        debug!("certificate verification is disabled");
    }

    let client = Client::builder()
        .danger_accept_invalid_certs(config.ssl_options.accept_invalid_certs)
        .build()
        .map_err(|e| Error::config_invalid("failed to build http client").with_source(e))?;

    Ok(Context::new()
        .with_http_send(ReqwestHttpSend::new(client))
        .with_env(OsEnv))
}

#[cfg(test)]
mod tests {
    use super::*;
    use s3sign_s3::SslOptions;

    #[test]
    fn test_default_context() -> anyhow::Result<()> {
        let config = Config::default().with_ssl_options(SslOptions {
            accept_invalid_certs: true,
        });
        let ctx = default_context(&config)?;
        assert_eq!(ctx.env_var("PATH"), std::env::var("PATH").ok());
        Ok(())
    }
}
