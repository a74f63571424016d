#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub use s3sign_core::*;

#[cfg(feature = "default-context")]
mod context;
#[cfg(feature = "default-context")]
pub use context::default_context;

/// Signing and dispatch for S3-compatible services.
pub mod s3 {
    pub use s3sign_s3::*;
}
