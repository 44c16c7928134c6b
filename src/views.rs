use axum::{
    extract::{Path, Request, State},
    http::{self, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use axum_prometheus::PrometheusMetricLayer;
use std::sync::Arc;
use tower_http::trace::{self, TraceLayer};
use tracing::Level;

use crate::{
    config::CONFIG,
    services::{
        bots::{RoundRobinBot, TelegramMessageSource},
        filename::SystemClock,
        resolve_file_id, resolve_file_properties, MessageSource,
    },
};


pub type Source = Arc<TelegramMessageSource>;

//

async fn get_file_properties<S: MessageSource>(
    Path((chat_id, message_id)): Path<(i64, i32)>,
    State(source): State<Arc<S>>,
) -> impl IntoResponse {
    match resolve_file_properties(source.as_ref(), chat_id, message_id, &SystemClock).await {
        Ok(properties) => Json(properties).into_response(),
        Err(err) => (StatusCode::NOT_FOUND, err.0).into_response(),
    }
}

async fn get_file_id<S: MessageSource>(
    Path((chat_id, message_id)): Path<(i64, i32)>,
    State(source): State<Arc<S>>,
) -> impl IntoResponse {
    match resolve_file_id(source.as_ref(), chat_id, message_id).await {
        Ok(file_id) => Json(file_id).into_response(),
        Err(err) => (StatusCode::NOT_FOUND, err.0).into_response(),
    }
}

//


async fn auth(
    State(api_key): State<Arc<str>>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = req.headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok());

    let auth_header = if let Some(auth_header) = auth_header {
        auth_header
    } else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    if auth_header != api_key.as_ref() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(next.run(req).await)
}


fn files_router<S>(source: Arc<S>) -> Router
where
    S: MessageSource + Send + Sync + 'static,
{
    Router::new()
        .route("/files/{chat_id}/{message_id}", get(get_file_properties::<S>))
        .route("/files/{chat_id}/{message_id}/file_id", get(get_file_id::<S>))
        .with_state(source)
}


fn app_router<S>(source: Arc<S>, api_key: Arc<str>) -> Router
where
    S: MessageSource + Send + Sync + 'static,
{
    let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();

    let api_router = files_router(source)
        .layer(middleware::from_fn_with_state(api_key, auth))
        .layer(prometheus_layer);

    let metric_router = Router::new()
        .route("/metrics", get(|| async move { metric_handle.render() }));

    Router::new()
        .nest("/api/v1", api_router)
        .merge(metric_router)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new()
                    .level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new()
                    .level(Level::INFO)),
        )
}


pub async fn get_router() -> Router {
    let source: Source = Arc::new(TelegramMessageSource::new(
        RoundRobinBot::new(&CONFIG.bot_tokens),
        CONFIG.dump_chat_id,
    ));

    app_router(source, Arc::from(CONFIG.api_key.as_str()))
}


#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use tower::ServiceExt;

    use super::*;
    use crate::services::{
        file_id::types::{FileId, FileLocation, FileType},
        media::{Media, MediaKind, MediaMessage},
        FetchError,
    };

    struct StaticSource(Option<MediaMessage>);

    impl MessageSource for StaticSource {
        async fn get_message(
            &self,
            _chat_id: i64,
            _message_id: i32,
        ) -> Result<Option<MediaMessage>, FetchError> {
            Ok(self.0.clone())
        }
    }

    fn audio_message() -> MediaMessage {
        let file_id = FileId::new(
            FileType::Audio,
            1,
            FileLocation::Document {
                file_reference: vec![],
                media_id: 11,
                access_hash: 12,
            },
        );

        MediaMessage::with_media(Media {
            file_id: Some(file_id.encode()),
            file_unique_id: Some("AgADaudio".to_string()),
            file_size: Some(321),
            file_name: Some("track.mp3".to_string()),
            ..Media::new(MediaKind::Audio)
        })
    }

    async fn send(
        router: Router,
        request: http::Request<Body>,
    ) -> (StatusCode, serde_json::Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        (status, serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null))
    }

    async fn get(router: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        send(router, http::Request::builder().uri(uri).body(Body::empty()).unwrap()).await
    }

    fn get_with_key(uri: &str, api_key: &str) -> http::Request<Body> {
        http::Request::builder()
            .uri(uri)
            .header(http::header::AUTHORIZATION, api_key)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_file_properties_endpoint() {
        let router = files_router(Arc::new(StaticSource(Some(audio_message()))));

        let (status, body) = get(router, "/files/-100/5").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["file_name"], "track.mp3");
        assert_eq!(body["hash"], "AgADau");
        assert_eq!(body["file_size"], 321);
        assert_eq!(body["file_id"]["file_type"], "audio");
        assert_eq!(body["file_id"]["location"]["kind"], "document");
    }

    #[tokio::test]
    async fn test_file_id_endpoint() {
        let router = files_router(Arc::new(StaticSource(Some(audio_message()))));

        let (status, body) = get(router, "/files/-100/5/file_id").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["dc_id"], 1);
        assert_eq!(body["location"]["media_id"], 11);
    }

    #[tokio::test]
    async fn test_missing_message_is_404() {
        let router = files_router(Arc::new(StaticSource(None)));

        let (status, _) = get(router.clone(), "/files/-100/5").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = get(router, "/files/-100/5/file_id").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    // The Prometheus recorder is process-global, so the full router is built once.
    #[tokio::test]
    async fn test_api_key_and_metrics() {
        let router = app_router(
            Arc::new(StaticSource(Some(audio_message()))),
            Arc::from("secret"),
        );

        let (status, _) = get(router.clone(), "/api/v1/files/-100/5").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(router.clone(), get_with_key("/api/v1/files/-100/5", "wrong")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) =
            send(router.clone(), get_with_key("/api/v1/files/-100/5", "secret")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["file_name"], "track.mp3");

        let (status, _) = get(router, "/metrics").await;
        assert_eq!(status, StatusCode::OK);
    }
}
