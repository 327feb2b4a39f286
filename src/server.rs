//! HTTP trigger: each `GET /` is one invocation of the selector.

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use log::{error, info};
use serde::Serialize;
use tokio::net::TcpListener;

use crate::{
    catalog::CatalogState,
    error::Result,
    media::ImageFetcher,
    selector::{ImageService, IndexPicker},
    types::GatewayResponse,
};

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    catalog_size: usize,
    cached: usize,
}

/// Build the router around a shared service.
pub fn build_router<F, P>(service: Arc<ImageService<F, P>>) -> Router
where
    F: ImageFetcher + Send + Sync + 'static,
    P: IndexPicker + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(invoke::<F, P>))
        .route("/health", get(health::<F, P>))
        .with_state(service)
}

async fn invoke<F, P>(State(service): State<Arc<ImageService<F, P>>>) -> Json<GatewayResponse>
where
    F: ImageFetcher + Send + Sync + 'static,
    P: IndexPicker + Send + Sync + 'static,
{
    Json(service.invoke().await)
}

async fn health<F, P>(State(service): State<Arc<ImageService<F, P>>>) -> Json<Health>
where
    F: ImageFetcher + Send + Sync + 'static,
    P: IndexPicker + Send + Sync + 'static,
{
    let (status, catalog_size) = match service.catalog_state() {
        CatalogState::Ready(catalog) => ("ok", catalog.len()),
        CatalogState::Unavailable(_) => ("degraded", 0),
    };
    Json(Health {
        status,
        catalog_size,
        cached: service.cache().len().await,
    })
}

/// Serve until Ctrl-C.
///
/// # Errors
///
/// Returns an error if binding or serving fails.
pub async fn serve(addr: &str, router: Router) -> Result<()> {
    let listener = TcpListener::bind(addr).await.map_err(|e| {
        error!("Failed to bind to address {addr}: {e}");
        e
    })?;
    info!("Listening on http://{addr}");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutdown signal received, shutting down...");
            }
        })
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::Request};
    use base64::{Engine, engine::general_purpose::STANDARD};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    use super::*;
    use crate::{
        catalog::{Catalog, LinkFormatter, tests::FakeLister},
        config::{FailedFetchPolicy, SelectionMode},
        media::HttpFetcher,
        selector::RandomPicker,
    };

    type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

    async fn get_json(
        router: Router,
        uri: &str,
    ) -> std::result::Result<Value, Box<dyn std::error::Error>> {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty())?)
            .await?;
        assert_eq!(response.status(), axum::http::StatusCode::OK);
        let body = response.into_body().collect().await?.to_bytes();
        Ok(serde_json::from_slice(&body)?)
    }

    async fn service_over(server: &MockServer, keys: &[&str]) -> Result<Arc<ImageService>> {
        let formatter = LinkFormatter::with_base(&server.uri());
        let catalog = Catalog::build(&FakeLister::with_keys(keys), &formatter).await?;
        Ok(Arc::new(ImageService::new(
            CatalogState::Ready(catalog),
            HttpFetcher::new(None)?,
            RandomPicker,
            SelectionMode::Full,
            FailedFetchPolicy::Skip,
        )))
    }

    #[tokio::test]
    async fn invocation_returns_gateway_envelope() -> TestResult {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cat.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"png-bytes".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let service = service_over(&server, &["cat.png"]).await?;
        let router = build_router(Arc::clone(&service));

        for _ in 0..3 {
            let value = get_json(router.clone(), "/").await?;
            assert_eq!(
                value,
                json!({
                    "statusCode": 200,
                    "headers": { "Content-Type": "image/png" },
                    "body": STANDARD.encode(b"png-bytes"),
                    "isBase64Encoded": true
                })
            );
        }

        let health = get_json(router, "/health").await?;
        assert_eq!(health, json!({ "status": "ok", "catalog_size": 1, "cached": 1 }));
        Ok(())
    }

    #[tokio::test]
    async fn store_error_returns_bare_failure() -> TestResult {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let router = build_router(service_over(&server, &["cat.jpg"]).await?);
        let value = get_json(router, "/").await?;

        assert_eq!(value, json!({ "statusCode": 400 }));
        Ok(())
    }

    #[tokio::test]
    async fn unavailable_catalog_reports_degraded() -> TestResult {
        let state = CatalogState::load(
            &FakeLister::failing(),
            &LinkFormatter::s3("pics", "eu-west-1"),
        )
        .await;
        let service = Arc::new(ImageService::new(
            state,
            HttpFetcher::new(None)?,
            RandomPicker,
            SelectionMode::Full,
            FailedFetchPolicy::Skip,
        ));
        let router = build_router(service);

        assert_eq!(get_json(router.clone(), "/").await?, json!({ "statusCode": 400 }));
        assert_eq!(
            get_json(router, "/health").await?,
            json!({ "status": "degraded", "catalog_size": 0, "cached": 0 })
        );
        Ok(())
    }
}
