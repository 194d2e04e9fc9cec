// HTTP request handlers
use crate::application::error::DashboardError;
use crate::application::story_service::StoryChapter;
use crate::domain::artifact::Document;
use crate::domain::filter::{Choice, FilterSelection};
use crate::domain::performance::PerformanceMetric;
use crate::domain::violation::{UnknownWeekday, Weekday};
use crate::infrastructure::html;
use crate::infrastructure::http_response::{
    accepts_brotli, encoded_response, html_response, json_response,
};
use crate::presentation::app_state::AppState;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
pub struct FilterQuery {
    pub month: Option<String>,
    pub weekday: Option<String>,
    pub route: Option<String>,
    pub violation_type: Option<String>,
}

impl FilterQuery {
    pub fn selection(&self) -> Result<FilterSelection, UnknownWeekday> {
        Ok(FilterSelection {
            month: Choice::<String>::parse(self.month.as_deref()),
            weekday: Choice::<Weekday>::parse(self.weekday.as_deref())?,
            route: Choice::<String>::parse(self.route.as_deref()),
            violation_type: Choice::<String>::parse(self.violation_type.as_deref()),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PerformanceQuery {
    pub route: Option<String>,
    pub metric: Option<String>,
}

impl PerformanceQuery {
    pub fn metric(&self) -> Result<PerformanceMetric, String> {
        match self.metric.as_deref().map(str::trim) {
            None | Some("") => Ok(PerformanceMetric::default()),
            Some(metric) => metric.parse(),
        }
    }

    pub fn route(&self) -> Option<&str> {
        self.route.as_deref().map(str::trim).filter(|r| !r.is_empty())
    }
}

fn respond(result: Result<Response<Body>, StatusCode>) -> Response {
    result.unwrap_or_else(|status| status.into_response())
}

fn error_page(status: StatusCode, message: &str) -> Response {
    let title = status.canonical_reason().unwrap_or("Error");
    (status, Html(html::error_page(title, message))).into_response()
}

fn error_status(error: &DashboardError) -> StatusCode {
    match error {
        DashboardError::MissingArtifact { .. } => StatusCode::NOT_FOUND,
        DashboardError::MalformedInput { .. } | DashboardError::Io { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn home(headers: HeaderMap) -> Response {
    respond(html_response(html::home_page(), accepts_brotli(&headers)).await)
}

/// Violations overview for the selected filters
pub async fn overview(
    Query(query): Query<FilterQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let selection = match query.selection() {
        Ok(selection) => selection,
        Err(e) => return error_page(StatusCode::BAD_REQUEST, &e.to_string()),
    };

    let page = state.overview_service.overview(&selection).await;
    respond(html_response(html::overview_page(&page), accepts_brotli(&headers)).await)
}

pub async fn api_overview(
    Query(query): Query<FilterQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let selection = match query.selection() {
        Ok(selection) => selection,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    let page = state.overview_service.overview(&selection).await;
    respond(json_response(&page, accepts_brotli(&headers)).await)
}

/// Bus performance before and after ACE enforcement
pub async fn performance(
    Query(query): Query<PerformanceQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let metric = match query.metric() {
        Ok(metric) => metric,
        Err(e) => return error_page(StatusCode::BAD_REQUEST, &e),
    };

    let page = state
        .performance_service
        .performance(query.route(), metric)
        .await;
    respond(html_response(html::performance_page(&page), accepts_brotli(&headers)).await)
}

pub async fn api_performance(
    Query(query): Query<PerformanceQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let metric = match query.metric() {
        Ok(metric) => metric,
        Err(e) => return (StatusCode::BAD_REQUEST, e).into_response(),
    };

    let page = state
        .performance_service
        .performance(query.route(), metric)
        .await;
    respond(json_response(&page, accepts_brotli(&headers)).await)
}

/// One chapter of the ClearLane story
pub async fn story(
    Path(chapter): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let chapter = match chapter.parse::<StoryChapter>() {
        Ok(chapter) => chapter,
        Err(e) => return error_page(StatusCode::NOT_FOUND, &e),
    };

    let page = state.story_service.page(chapter).await;
    respond(html_response(html::story_page(&page), accepts_brotli(&headers)).await)
}

pub async fn map(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let bus_map = state.story_service.bus_map().await;
    respond(html_response(html::map_page(&bus_map), accepts_brotli(&headers)).await)
}

/// Serve a pre-rendered map or chart image verbatim
pub async fn artifact(
    Path(name): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let Some(document) = Document::from_file_name(&name) else {
        return error_page(StatusCode::NOT_FOUND, &format!("unknown artifact '{name}'"));
    };

    match state.repository.document(document).await {
        Ok(bytes) => {
            // PNGs are already compressed.
            let compress = accepts_brotli(&headers) && !document.is_image();
            respond(encoded_response(bytes.to_vec(), document.content_type(), compress).await)
        }
        Err(e) => {
            tracing::warn!("Artifact {} unavailable: {}", name, e);
            error_page(error_status(&e), &e.to_notice().message)
        }
    }
}

/// The scored ClearLane target list
pub async fn api_targets(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    match state.repository.target_list().await {
        Ok(targets) => respond(json_response(targets.as_ref(), accepts_brotli(&headers)).await),
        Err(e) => {
            tracing::warn!("Target list unavailable: {}", e);
            (error_status(&e), e.to_string()).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::overview_service::tests::{MemoryRepository, sample_tables};
    use crate::presentation::router;
    use axum::http::{Request, header};
    use bytes::Bytes;
    use tower::ServiceExt;

    fn state(repository: MemoryRepository) -> Arc<AppState> {
        Arc::new(AppState::new(Arc::new(repository), 10))
    }

    async fn get(state: Arc<AppState>, uri: &str) -> Response {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        router(state).oneshot(request).await.unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_filter_query_selection() {
        let query = FilterQuery {
            weekday: Some("tuesday".to_string()),
            route: Some("All".to_string()),
            ..Default::default()
        };
        let selection = query.selection().unwrap();
        assert_eq!(selection.weekday, Choice::Only(Weekday::Tuesday));
        assert!(selection.route.is_all());
        assert!(selection.month.is_all());

        let query = FilterQuery {
            weekday: Some("Caturday".to_string()),
            ..Default::default()
        };
        assert!(query.selection().is_err());
    }

    #[test]
    fn test_performance_query_defaults() {
        let query = PerformanceQuery::default();
        assert_eq!(query.metric(), Ok(PerformanceMetric::RoadSpeed));
        assert_eq!(query.route(), None);

        let query = PerformanceQuery {
            route: Some(" M15 ".to_string()),
            metric: Some("travel_time".to_string()),
        };
        assert_eq!(query.metric(), Ok(PerformanceMetric::TravelTime));
        assert_eq!(query.route(), Some("M15"));
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = get(state(MemoryRepository::with_tables(sample_tables())), "/healthz").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "ok");
    }

    #[tokio::test]
    async fn test_api_overview_applies_filters() {
        let state = state(MemoryRepository::with_tables(sample_tables()));
        let response = get(state, "/api/overview?route=M15&month=All").await;
        assert_eq!(response.status(), StatusCode::OK);

        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["summary"]["status"], "ready");
        assert_eq!(json["summary"]["data"]["total_violations"], 40);
        assert_eq!(json["summary"]["data"]["peak"]["hour"], 8);
        assert_eq!(json["selection"]["route"], "M15");
        assert_eq!(json["selection"]["month"], "All");
    }

    #[tokio::test]
    async fn test_bad_weekday_is_rejected() {
        let state = state(MemoryRepository::with_tables(sample_tables()));
        let response = get(state.clone(), "/api/overview?weekday=Someday").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = get(state, "/overview?weekday=Someday").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_overview_page_renders_with_missing_tables() {
        let mut tables = sample_tables();
        tables.remove(&crate::domain::violation::TableKind::Stop);
        let response = get(state(MemoryRepository::with_tables(tables)), "/overview").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/html; charset=utf-8");

        let html = body_text(response).await;
        assert!(html.contains("Total Violations"));
        assert!(html.contains("stop_counts.csv was not found"));
    }

    #[tokio::test]
    async fn test_brotli_when_accepted() {
        let request = Request::builder()
            .uri("/")
            .header(header::ACCEPT_ENCODING, "gzip, br")
            .body(Body::empty())
            .unwrap();
        let state = state(MemoryRepository::with_tables(sample_tables()));
        let response = router(state).oneshot(request).await.unwrap();
        assert_eq!(response.headers()[header::CONTENT_ENCODING], "br");
    }

    #[tokio::test]
    async fn test_story_chapters() {
        let state = state(MemoryRepository::with_tables(sample_tables()));
        let response = get(state.clone(), "/story/rolling-study-hall").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("Protecting the Rolling Study Hall"));

        let response = get(state, "/story/epilogue").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_artifacts() {
        let mut repo = MemoryRepository::with_tables(sample_tables());
        repo.documents
            .insert(Document::BusMap, Bytes::from_static(b"<html>map</html>"));
        let state = state(repo);

        let response = get(state.clone(), "/artifacts/bus_map.html").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "<html>map</html>");

        let response = get(state.clone(), "/artifacts/exempt_violations_by_day.png").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = get(state.clone(), "/artifacts/secrets.txt").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = get(state, "/map").await;
        assert!(body_text(response).await.contains("/artifacts/bus_map.html"));
    }

    #[tokio::test]
    async fn test_performance_routes() {
        let state = state(MemoryRepository::with_tables(sample_tables()));
        let response = get(state.clone(), "/api/performance?metric=bogus").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = get(state.clone(), "/api/performance").await;
        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["comparison"]["status"], "unavailable");

        let response = get(state, "/performance?metric=travel_time").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_target_list_is_not_found() {
        let response = get(state(MemoryRepository::with_tables(sample_tables())), "/api/targets").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
