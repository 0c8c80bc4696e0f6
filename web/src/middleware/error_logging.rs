//! Persist server errors.

use crate::error::ErrorRecord;
use crate::error_log::{ErrorLogBackend, ErrorLogService, RequestContext};
use crate::extractors::{ClientIp, CorrelationId, UserAgent};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

/// Record every 5xx response that carries an [`ErrorRecord`].
///
/// Only the path is kept: query strings can hold login-link signatures and
/// bearer tokens.
pub async fn error_logging_middleware(
    State(logs): State<ErrorLogService<ErrorLogBackend>>,
    CorrelationId(correlation_id): CorrelationId,
    client_ip: ClientIp,
    user_agent: UserAgent,
    req: Request,
    next: Next,
) -> Response {
    let method = req.method().to_string();
    let url = req.uri().path().to_string();

    let response = next.run(req).await;

    if response.status().is_server_error() {
        if let Some(record) = response.extensions().get::<ErrorRecord>() {
            let context = RequestContext {
                url,
                method,
                ip: client_ip.0.to_string(),
                user_agent: user_agent.0,
                user_id: record.user_id.clone(),
                correlation_id: correlation_id.to_string(),
                timestamp: chrono::Utc::now(),
            };
            logs.log_error(record, &context).await;
        }
    }

    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::error_log::InMemoryErrorLogRepository;
    use axum::extract::ConnectInfo;
    use axum::{Router, body::Body, http::StatusCode, middleware::from_fn_with_state, routing::get};
    use std::net::SocketAddr;
    use tower::ServiceExt;

    fn app(logs: ErrorLogService<ErrorLogBackend>) -> Router {
        Router::new()
            .route("/boom", get(|| async { Err::<(), _>(AppError::internal("database exploded")) }))
            .route("/missing", get(|| async { Err::<(), _>(AppError::not_found("nope")) }))
            .layer(from_fn_with_state(logs, error_logging_middleware))
    }

    fn logs() -> (ErrorLogService<ErrorLogBackend>, InMemoryErrorLogRepository) {
        let repo = InMemoryErrorLogRepository::new();
        (
            ErrorLogService::with_host(ErrorLogBackend::Memory(repo.clone()), "test-host", 7),
            repo,
        )
    }

    #[tokio::test]
    async fn test_server_error_is_persisted_with_context() {
        let (service, repo) = logs();
        let mut request = Request::builder()
            .uri("/boom?email=a%40b.co&signature=secret&bearerToken=live")
            .header("User-Agent", "integration")
            .header("X-Forwarded-For", "203.0.113.9")
            .header("X-Correlation-ID", "0b6f1d2e-3c4a-4b5d-8e6f-7a8b9c0d1e2f")
            .body(Body::empty())
            .unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))));

        let response = app(service).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let entries = repo.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "database exploded");
        assert_eq!(entries[0].hostname, "test-host");
        assert_eq!(entries[0].context["url"], "/boom");
        assert!(!entries[0].context.to_string().contains("secret"));
        assert_eq!(entries[0].context["method"], "GET");
        assert_eq!(entries[0].context["ip"], "203.0.113.9");
        assert_eq!(entries[0].context["userAgent"], "integration");
        assert_eq!(
            entries[0].context["correlationId"],
            "0b6f1d2e-3c4a-4b5d-8e6f-7a8b9c0d1e2f"
        );
    }

    #[tokio::test]
    async fn test_client_error_is_not_persisted() {
        let (service, repo) = logs();
        let request = Request::builder().uri("/missing").body(Body::empty()).unwrap();

        let response = app(service).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(repo.entries().is_empty());
    }
}
