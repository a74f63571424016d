//! Signing, presigning and dispatch for S3-compatible object storage.
//!
//! The pipeline runs leaf first:
//!
//! - [`Endpoint::parse`] normalizes a raw host into scheme, domain, port and address family.
//! - [`url::compose`] and [`ObjectLocation`] build urls for virtual-hosted or path-style buckets.
//! - [`ExpirationWindow::align`] quantizes presign time so urls can be cached.
//! - [`sign_v2`], [`presign_v2`] and [`presign_v4`] compute signatures.
//! - [`dispatch`] sends a [`SignedRequest`] and classifies the response.
//!
//! [`Client`] wires them together, while [`RequestSigner`] plugs the same
//! signing into [`s3sign_core::Signer`] for plain `http::Request`s.
//!
//! ## Example
//!
//! ```no_run
//! use s3sign_core::{Context, Result};
//! use s3sign_s3::{AddressingStyle, Client, Config, Endpoint, Method};
//! use std::time::Duration;
//!
//! # fn example() -> Result<()> {
//! let config = Config::new(Endpoint::parse("127.0.0.1:9000")?)
//!     .with_credential("minioadmin", "minioadmin")
//!     .with_addressing_style(AddressingStyle::Path);
//! let client = Client::new(Context::new(), config);
//!
//! let url = client.presign_url(Method::Get, "bucket", "photos/cat.jpg", Duration::from_secs(300))?;
//! println!("{url}");
//! # Ok(())
//! # }
//! ```

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

mod constants;

mod method;
pub use method::Method;

mod endpoint;
pub use endpoint::{AddressFamily, Endpoint, Scheme};

pub mod url;
pub use url::{AddressingStyle, ObjectLocation};

mod window;
pub use window::ExpirationWindow;

mod credential;
pub use credential::Credential;

mod config;
pub use config::{Config, SslOptions};

mod provide_credential;
pub use provide_credential::*;

mod sign_v2;
pub use sign_v2::{presign_v2, sign_v2, SignableRequest, SignedV2};

mod presign_v4;
pub use presign_v4::{presign_v4, presign_v4_aligned, PresignRequest};

mod sign_request;
pub use sign_request::RequestSigner;

mod dispatch;
pub use dispatch::{check_error_envelope, dispatch, dispatch_checked, Response, SignedRequest};

mod client;
pub use client::{Client, RequestBuilder};
