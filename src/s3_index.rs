//! Object store listing used once at startup to build the catalog.

use std::future::Future;

use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::{Client, error::DisplayErrorContext};
use log::debug;

use crate::{
    config::S3Config,
    error::{Result, ServeError},
};

/// Source of object keys for the catalog.
pub trait ObjectLister {
    /// List every servable object key, in store order.
    fn list_keys(&self) -> impl Future<Output = Result<Vec<String>>> + Send;
}

#[derive(Debug)]
pub struct S3Index {
    client: Client,
    bucket: String,
    prefix: String,
}

impl S3Index {
    /// Build an S3 client for the configured region and optional endpoint.
    pub async fn new(config: &S3Config) -> Self {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(config.region.clone()));
        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let shared_config = loader.load().await;

        Self {
            client: Client::new(&shared_config),
            bucket: config.bucket.clone(),
            prefix: config.prefix.clone(),
        }
    }

    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

impl ObjectLister for S3Index {
    async fn list_keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(&self.prefix)
            .into_paginator()
            .send();

        while let Some(page) = pages.next().await {
            let response =
                page.map_err(|e| ServeError::S3List(DisplayErrorContext(&e).to_string()))?;
            let before = keys.len();
            keys.extend(
                response
                    .contents()
                    .iter()
                    .filter_map(|object| object.key())
                    .filter(|key| is_servable_key(key))
                    .map(ToString::to_string),
            );
            debug!("Listed {} keys from page", keys.len() - before);
        }

        Ok(keys)
    }
}

/// Directory markers carry no bytes to serve.
fn is_servable_key(key: &str) -> bool {
    !key.is_empty() && !key.ends_with('/')
}
