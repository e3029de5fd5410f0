use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::debug;

use super::domain::{City, Institution};
use super::store::CatalogStore;
use crate::error::AppError;

pub const CITIES_PATH: &str = "/api/v1/cities";
pub const INSTITUTIONS_PATH: &str = "/api/v1/institutions";

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SearchParams {
    #[serde(default)]
    pub(crate) search: Option<String>,
    #[serde(default)]
    pub(crate) city_id: Option<u32>,
    #[serde(default)]
    pub(crate) limit: Option<usize>,
}

/// Router exposing the read-only catalog search endpoints.
pub fn catalog_router(store: Arc<CatalogStore>) -> Router {
    Router::new()
        .route(CITIES_PATH, get(cities_handler))
        .route(INSTITUTIONS_PATH, get(institutions_handler))
        .with_state(store)
}

pub(crate) async fn cities_handler(
    State(store): State<Arc<CatalogStore>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<City>>, AppError> {
    let search = params.search.unwrap_or_default();
    debug!(search = %search, "city search");
    let cities = store.search_cities(&search, params.limit)?;
    Ok(Json(cities))
}

pub(crate) async fn institutions_handler(
    State(store): State<Arc<CatalogStore>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Institution>>, AppError> {
    let search = params.search.unwrap_or_default();
    debug!(search = %search, city_id = ?params.city_id, "institution search");
    let institutions = store.search_institutions(&search, params.city_id, params.limit)?;
    Ok(Json(institutions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    async fn get_json(uri: &str) -> (StatusCode, Value) {
        let router = catalog_router(Arc::new(CatalogStore::builtin()));
        let response = router
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn city_route_returns_matches() {
        let (status, body) = get_json("/api/v1/cities?search=medell").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["name"], "Medellín");
        assert_eq!(body[0]["department"], "Antioquia");
    }

    #[tokio::test]
    async fn zero_matches_is_an_empty_list() {
        let (status, body) = get_json("/api/v1/cities?search=Xyzzyx").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::Array(Vec::new()));
    }

    #[tokio::test]
    async fn missing_search_is_bad_request() {
        let (status, body) = get_json("/api/v1/cities").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let message = body["error"].as_str().unwrap();
        assert!(message.starts_with("catalog error:"));
        assert!(message.contains("blank"));
    }

    #[tokio::test]
    async fn institution_route_honors_city_scope() {
        let (status, body) = get_json("/api/v1/institutions?search=javeriana&city_id=76001").await;
        assert_eq!(status, StatusCode::OK);
        let items = body.as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["city_name"], "Cali");
        assert_eq!(items[0]["kind"], "university");
    }

    #[tokio::test]
    async fn institution_route_rejects_unknown_city() {
        let (status, body) = get_json("/api/v1/institutions?search=uni&city_id=1").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().starts_with("catalog error:"));
    }
}
