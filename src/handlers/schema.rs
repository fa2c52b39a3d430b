//! Feature schema handler

use axum::{extract::State, Json};

use crate::AppState;
use crate::features::LayoutInfo;

/// Column layout the model expects
pub async fn get(State(state): State<AppState>) -> Json<LayoutInfo> {
    Json(state.schema.layout_info())
}

#[cfg(test)]
mod tests {
    use crate::model::ModelState;
    use crate::{create_router, AppState};
    use axum::{body::Body, http::Request};
    use serde_json::Value;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_schema_lists_columns_in_order() {
        let app = create_router(AppState::for_tests(ModelState::unavailable("not needed")));
        let req = Request::builder().uri("/api/v1/schema").body(Body::empty()).unwrap();
        let response = app.oneshot(req).await.unwrap();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["feature_count"], 34);
        assert_eq!(body["hash"].as_str().unwrap().len(), 8);
        assert_eq!(body["columns"][0]["name"], "school");
        assert_eq!(body["columns"][0]["required"], true);
        assert_eq!(body["columns"][2]["kind"], "numeric");
        assert_eq!(body["columns"][6]["default"], "none");
    }
}
