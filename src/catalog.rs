//! Startup catalog of public image links.

use std::fmt;

use log::{error, info};

use crate::{
    config::S3Config,
    error::{Result, ServeError},
    s3_index::ObjectLister,
};

/// Public URL of one stored object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Link(String);

impl Link {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Link {
    fn from(value: String) -> Self {
        Link(value)
    }
}

/// Formats object keys into public links.
#[derive(Debug, Clone)]
pub struct LinkFormatter {
    base: String,
}

impl LinkFormatter {
    /// Virtual-hosted S3 style: `https://{bucket}.s3-{region}.amazonaws.com`.
    #[must_use]
    pub fn s3(bucket: &str, region: &str) -> Self {
        Self {
            base: format!("https://{bucket}.s3-{region}.amazonaws.com"),
        }
    }

    #[must_use]
    pub fn with_base(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    #[must_use]
    pub fn from_config(config: &S3Config) -> Self {
        match &config.public_base_url {
            Some(base) => Self::with_base(base),
            None => Self::s3(&config.bucket, &config.region),
        }
    }

    #[must_use]
    pub fn link(&self, key: &str) -> Link {
        Link(format!("{}/{}", self.base, key))
    }
}

/// Ordered, non-empty list of links. Read-only once built.
#[derive(Debug, Clone)]
pub struct Catalog {
    links: Vec<Link>,
}

impl Catalog {
    /// Wrap a list of links.
    ///
    /// # Errors
    ///
    /// Returns [`ServeError::EmptyCatalog`] if `links` is empty.
    pub fn new(links: Vec<Link>) -> Result<Self> {
        if links.is_empty() {
            return Err(ServeError::EmptyCatalog);
        }
        Ok(Self { links })
    }

    /// List the store once and format a link per key, preserving listing order.
    ///
    /// # Errors
    ///
    /// Returns an error if listing fails or yields no objects.
    pub async fn build<L: ObjectLister>(lister: &L, formatter: &LinkFormatter) -> Result<Self> {
        let keys = lister.list_keys().await?;
        let catalog = Self::new(keys.iter().map(|key| formatter.link(key)).collect())?;
        info!("Loaded {} image links", catalog.len());
        Ok(catalog)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Link> {
        self.links.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Link> {
        self.links.iter()
    }
}

/// Outcome of the startup build. A failure is kept for the whole process lifetime.
#[derive(Debug, Clone)]
pub enum CatalogState {
    Ready(Catalog),
    Unavailable(String),
}

impl CatalogState {
    /// Run the build, recording any failure instead of propagating it.
    pub async fn load<L: ObjectLister>(lister: &L, formatter: &LinkFormatter) -> Self {
        match Catalog::build(lister, formatter).await {
            Ok(catalog) => CatalogState::Ready(catalog),
            Err(e) => {
                error!("Image catalog unavailable, every request will fail: {e}");
                CatalogState::Unavailable(e.to_string())
            }
        }
    }

    /// # Errors
    ///
    /// Returns [`ServeError::CatalogUnavailable`] if the build failed.
    pub fn catalog(&self) -> Result<&Catalog> {
        match self {
            CatalogState::Ready(catalog) => Ok(catalog),
            CatalogState::Unavailable(reason) => {
                Err(ServeError::CatalogUnavailable(reason.clone()))
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) struct FakeLister {
        pub(crate) keys: Option<Vec<String>>,
    }

    impl FakeLister {
        pub(crate) fn with_keys(keys: &[&str]) -> Self {
            Self {
                keys: Some(keys.iter().map(ToString::to_string).collect()),
            }
        }

        pub(crate) fn failing() -> Self {
            Self { keys: None }
        }
    }

    impl ObjectLister for FakeLister {
        async fn list_keys(&self) -> Result<Vec<String>> {
            self.keys
                .clone()
                .ok_or_else(|| ServeError::S3List("dispatch failure: connection refused".into()))
        }
    }

    #[test]
    fn formats_s3_links() {
        let formatter = LinkFormatter::s3("pics", "eu-west-1");
        assert_eq!(
            formatter.link("cats/a.png").as_str(),
            "https://pics.s3-eu-west-1.amazonaws.com/cats/a.png"
        );
    }

    #[test]
    fn public_base_url_overrides_s3_format() {
        let config = S3Config {
            region: "auto".to_string(),
            bucket: "pics".to_string(),
            prefix: String::new(),
            endpoint: None,
            public_base_url: Some("https://cdn.example.com/".to_string()),
        };
        let formatter = LinkFormatter::from_config(&config);
        assert_eq!(formatter.link("a.png").as_str(), "https://cdn.example.com/a.png");
    }

    #[tokio::test]
    async fn builds_links_in_listing_order() -> Result<()> {
        let lister = FakeLister::with_keys(&["b.jpg", "a.png"]);
        let catalog = Catalog::build(&lister, &LinkFormatter::s3("pics", "us-east-1")).await?;
        let links: Vec<&str> = catalog.iter().map(Link::as_str).collect();
        assert_eq!(
            links,
            [
                "https://pics.s3-us-east-1.amazonaws.com/b.jpg",
                "https://pics.s3-us-east-1.amazonaws.com/a.png",
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn empty_listing_is_unavailable() {
        let state = CatalogState::load(
            &FakeLister::with_keys(&[]),
            &LinkFormatter::s3("pics", "us-east-1"),
        )
        .await;
        assert!(matches!(state, CatalogState::Unavailable(_)));
        assert!(matches!(
            state.catalog(),
            Err(ServeError::CatalogUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn listing_failure_is_recorded_not_raised() {
        let state =
            CatalogState::load(&FakeLister::failing(), &LinkFormatter::s3("pics", "us-east-1"))
                .await;
        let Err(ServeError::CatalogUnavailable(reason)) = state.catalog() else {
            panic!("expected catalog to be unavailable");
        };
        assert!(reason.contains("connection refused"));
    }
}
