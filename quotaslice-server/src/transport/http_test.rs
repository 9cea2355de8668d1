#[cfg(test)]
mod tests {
    use super::super::http::{HttpErrorResponse, HttpTransport, router};
    use crate::actor::QuotaActor;
    use crate::types::CheckResponse;
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request, StatusCode};
    use axum::response::Response;
    use chrono::{TimeZone, Utc};
    use quotaslice::{PeriodConfig, QuotaRegistry, ScriptedClock, UsagePeriod, UsageSnapshot};
    use serde::de::DeserializeOwned;
    use tower::ServiceExt;

    fn app() -> axum::Router {
        let clock = ScriptedClock::starting_at(Utc.with_ymd_and_hms(2024, 6, 3, 10, 0, 0).unwrap());
        let config = PeriodConfig::new("search", "DAY", 2)
            .with_granularity("HOUR")
            .clock_aligned(true);
        let registry: QuotaRegistry<ScriptedClock> =
            [UsagePeriod::with_clock(config, clock).unwrap()].into_iter().collect();

        router(QuotaActor::spawn(16, registry))
    }

    async fn send(app: &axum::Router, method: Method, uri: &str) -> Response {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        app.clone().oneshot(request).await.unwrap()
    }

    async fn json<T: DeserializeOwned>(response: Response) -> T {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_check_admits_then_refuses() {
        let app = app();

        let response = send(&app, Method::POST, "/check/search").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: CheckResponse = json(response).await;
        assert!(body.allowed);
        assert_eq!(body.limit, 2);
        assert_eq!(body.remaining, 1);
        assert!(body.reset_at.is_some());

        let response = send(&app, Method::POST, "/check/search").await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(&app, Method::POST, "/check/search").await;
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let body: CheckResponse = json(response).await;
        assert!(!body.allowed);
        assert_eq!(body.remaining, 0);
    }

    #[tokio::test]
    async fn test_reset_and_usage() {
        let app = app();

        send(&app, Method::POST, "/check/search").await;
        send(&app, Method::POST, "/check/search").await;

        let response = send(&app, Method::GET, "/usage/search").await;
        assert_eq!(response.status(), StatusCode::OK);
        let usage: UsageSnapshot = json(response).await;
        assert_eq!(usage.total_count, 2);
        assert_eq!(usage.slices, 1);

        let response = send(&app, Method::POST, "/reset/search").await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let usage: UsageSnapshot = json(send(&app, Method::GET, "/usage/search").await).await;
        assert_eq!(usage.total_count, 0);
        assert_eq!(usage.slices, 0);

        let response = send(&app, Method::POST, "/check/search").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_subject() {
        let app = app();

        for (method, uri) in [
            (Method::POST, "/check/missing"),
            (Method::POST, "/reset/missing"),
            (Method::GET, "/usage/missing"),
        ] {
            let response = send(&app, method, uri).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
            let body: HttpErrorResponse = json(response).await;
            assert!(body.error.contains("missing"));
        }
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let app = app();
        for _ in 0..3 {
            send(&app, Method::POST, "/check/search").await;
        }
        send(&app, Method::POST, "/check/missing").await;

        let response = send(&app, Method::GET, "/metrics").await;
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(body.contains("quotaslice_checks_total 4\n"));
        assert!(body.contains("quotaslice_requests_allowed 2\n"));
        assert!(body.contains("quotaslice_requests_refused 1\n"));
        assert!(body.contains("quotaslice_unknown_subjects 1\n"));
    }

    #[tokio::test]
    async fn test_health() {
        let app = app();
        let response = send(&app, Method::GET, "/health").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_check_response_omits_missing_reset() {
        let response = CheckResponse {
            subject: "search".to_string(),
            allowed: true,
            limit: 10,
            remaining: 9,
            reset_at: None,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("reset_at"));

        let parsed: CheckResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, response);
    }

    #[test]
    fn test_invalid_address() {
        assert!(HttpTransport::new("not an address", 80).is_err());
        assert!(HttpTransport::new("127.0.0.1", 8080).is_ok());
    }
}
