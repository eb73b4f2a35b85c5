// Web surface
// HTML dashboard at `/` plus a read-only JSON API under `/api`

use crate::annotations::{self, AuditEntry};
use crate::data::Dataset;
use crate::error::SelectionError;
use crate::html;
use crate::page::Page;
use crate::selection::{Selection, View};
use crate::views;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::debug;

/// Shared application state. Nothing here changes after start-up.
#[derive(Clone)]
pub struct AppState {
    dataset: Arc<Dataset>,
    items: Arc<Vec<String>>,
    audit: Arc<Vec<AuditEntry>>,
}

impl AppState {
    pub fn new(dataset: Dataset) -> Self {
        let audit = annotations::audit(&dataset);
        Self {
            items: Arc::new(dataset.items()),
            audit: Arc::new(audit),
            dataset: Arc::new(dataset),
        }
    }

    pub fn audit(&self) -> &[AuditEntry] {
        &self.audit
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    fn err(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// Rejected query parameters.
struct BadRequest(SelectionError);

impl IntoResponse for BadRequest {
    fn into_response(self) -> Response {
        debug!(error = %self.0, "Rejected selection");
        (StatusCode::BAD_REQUEST, Json(ApiResponse::err(self.0.to_string()))).into_response()
    }
}

impl From<SelectionError> for BadRequest {
    fn from(err: SelectionError) -> Self {
        Self(err)
    }
}

/// `?view=&metric=&granularity=&item=`; absent or empty values take defaults.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    view: Option<String>,
    metric: Option<String>,
    granularity: Option<String>,
    item: Option<String>,
}

impl PageQuery {
    pub fn selection(&self, items: &[String]) -> Result<Selection, SelectionError> {
        fn given(value: &Option<String>) -> Option<&str> {
            value.as_deref().map(str::trim).filter(|v| !v.is_empty())
        }

        let mut selection = Selection::default();
        if let Some(view) = given(&self.view) {
            selection.view = view.parse()?;
        }
        if let Some(metric) = given(&self.metric) {
            selection.metric = metric.parse()?;
        }
        if let Some(granularity) = given(&self.granularity) {
            selection.granularity = granularity.parse()?;
        }
        if let Some(item) = given(&self.item) {
            if !items.iter().any(|i| i == item) {
                return Err(SelectionError::UnknownItem(item.to_string()));
            }
            selection.item = Some(item.to_string());
        }
        Ok(selection)
    }
}

#[derive(Serialize)]
struct ViewResponse {
    slug: &'static str,
    label: &'static str,
}

#[derive(Serialize)]
struct PageResponse {
    selection: Selection,
    page: Page,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/views - Navigation entries in sidebar order
async fn get_views() -> impl IntoResponse {
    let views: Vec<ViewResponse> = View::ALL
        .iter()
        .map(|v| ViewResponse {
            slug: v.slug(),
            label: v.label(),
        })
        .collect();
    Json(ApiResponse::ok(views))
}

/// GET /api/items - Item selector options
async fn get_items(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(state.items.as_ref().clone()))
}

/// GET /api/page - Page model for a selection
async fn get_page(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<PageResponse>>, BadRequest> {
    let selection = query.selection(&state.items)?;
    let page = views::render(&state.dataset, &selection);
    Ok(Json(ApiResponse::ok(PageResponse { selection, page })))
}

/// GET /api/annotations - Frozen caption audit
async fn get_annotations(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(state.audit.as_ref().clone()))
}

/// GET / - Dashboard page
async fn serve_dashboard(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Html<String>, BadRequest> {
    let selection = query.selection(&state.items)?;
    let page = views::render(&state.dataset, &selection);
    Ok(Html(html::render_document(
        &page,
        &selection,
        &state.items,
        &annotations::summary(&state.audit),
    )))
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/views", get(get_views))
        .route("/items", get(get_items))
        .route("/page", get(get_page))
        .route("/annotations", get(get_annotations))
        .with_state(state.clone());

    Router::new()
        .route("/", get(serve_dashboard))
        .with_state(state)
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{AffordabilityRecord, FoodPriceRecord};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use chrono::NaiveDate;
    use tower::ServiceExt;

    fn create_test_state() -> AppState {
        let affordability = (1..=12u32)
            .map(|month| AffordabilityRecord {
                date: NaiveDate::from_ymd_opt(2024, month, 1).unwrap(),
                basket_cost_euro: 300.0,
                affordability_ratio: 7.3,
                affordability_index: 79.17,
            })
            .collect();
        let food_prices = ["Full Fat Milk", "Eggs"]
            .iter()
            .map(|item| FoodPriceRecord {
                item: item.to_string(),
                date: "2024-01-01".to_string(),
                price: Some(1.5),
                tag: "Healthy".to_string(),
            })
            .collect();
        AppState::new(Dataset {
            affordability,
            food_prices,
            ..Dataset::default()
        })
    }

    async fn send(uri: &str) -> (StatusCode, Vec<u8>) {
        let response = router(create_test_state())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    async fn get_json(uri: &str) -> (StatusCode, serde_json::Value) {
        let (status, body) = send(uri).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[test]
    fn test_query_defaults_and_parsing() {
        let items = vec!["Eggs".to_string()];
        let selection = PageQuery::default().selection(&items).unwrap();
        assert_eq!(selection, Selection::default());

        let query = PageQuery {
            view: Some("category".into()),
            metric: Some("median".into()),
            granularity: Some("".into()),
            item: Some("Eggs".into()),
        };
        let selection = query.selection(&items).unwrap();
        assert_eq!(selection.view, View::CategoryLevel);
        assert_eq!(selection.item.as_deref(), Some("Eggs"));
    }

    #[test]
    fn test_query_rejects_unknown_item() {
        let query = PageQuery {
            item: Some("Caviar".into()),
            ..PageQuery::default()
        };
        assert_eq!(
            query.selection(&["Eggs".to_string()]),
            Err(SelectionError::UnknownItem("Caviar".into()))
        );
    }

    #[tokio::test]
    async fn test_health() {
        let (status, json) = get_json("/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"], "OK");
    }

    #[tokio::test]
    async fn test_views_in_sidebar_order() {
        let (_, json) = get_json("/api/views").await;
        let slugs: Vec<&str> = json["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["slug"].as_str().unwrap())
            .collect();
        assert_eq!(slugs, vec!["overview", "affordability", "item", "category"]);
    }

    #[tokio::test]
    async fn test_items_sorted() {
        let (_, json) = get_json("/api/items").await;
        assert_eq!(json["data"], serde_json::json!(["Eggs", "Full Fat Milk"]));
    }

    #[tokio::test]
    async fn test_page_for_item_view() {
        let (status, json) = get_json("/api/page?view=item&item=Full%20Fat%20Milk").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["selection"]["item"], "Full Fat Milk");
        assert_eq!(json["data"]["page"]["title"], "Item-Level Analysis");
    }

    #[tokio::test]
    async fn test_invalid_params_are_bad_request() {
        for uri in ["/api/page?view=settings", "/api/page?metric=mode", "/?granularity=weekly", "/?item=Caviar"] {
            let (status, json) = get_json(uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(json["success"], false);
        }
    }

    #[tokio::test]
    async fn test_annotations_listed() {
        let (_, json) = get_json("/api/annotations").await;
        assert_eq!(json["data"].as_array().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_dashboard_html() {
        let (status, body) = send("/?view=affordability&granularity=Annual").await;
        assert_eq!(status, StatusCode::OK);
        let html = String::from_utf8(body).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<svg"));
    }
}
