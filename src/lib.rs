//! Thin S3 client bound to a single bucket
//!
//! This crate wraps the AWS S3 API in a small typed surface for one
//! bucket/region pair:
//! - [`client::BucketClient`] - upload/download, listing, metadata,
//!   hashing and deletion
//! - [`credentials`] - access-key loading from plain files
//! - [`types`] - descriptors returned by listings
//! - [`error`] - one error kind per failure mode, no catch-all
//!
//! Credentials come from explicit configuration or from `~/.s3/key` and
//! `~/.s3/private_key`. Every operation is a single request/response
//! exchange with the service; there is no retry, caching or pagination
//! layer on top of it.

pub mod client;
pub mod credentials;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use client::{BucketClient, BucketClientConfig};
pub use credentials::{default_credentials_dir, Credentials};
pub use error::{DeleteFailure, Error, Result};
pub use types::{Bucket, RemoteObject};
