#[cfg(test)]
mod api_routes_tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use crate::api::routes::tests::create_test_app;

    #[tokio::test]
    async fn test_openapi_document_is_served() {
        let app = create_test_app().await;

        let request = Request::builder()
            .uri("/api-docs/openapi.json")
            .method("GET")
            .body(Body::empty())
            .unwrap();

        let response = app.router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let doc: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(doc["info"]["title"], "StatResponder API");
        assert!(doc["paths"]["/api/v1/contacts"].is_object());
    }

    #[tokio::test]
    async fn test_cors_preflight_is_allowed() {
        let app = create_test_app().await;

        let request = Request::builder()
            .uri("/api/v1/contacts")
            .method("OPTIONS")
            .header("origin", "http://localhost:9002")
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .unwrap();

        let response = app.router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let app = create_test_app().await;

        let request = Request::builder()
            .uri("/api/v1/appointments")
            .body(Body::empty())
            .unwrap();

        let response = app.router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
