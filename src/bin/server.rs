use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use panel_optimizer::api::{OptimizeRequest, OptimizeResponse};
use panel_optimizer::{OptimizeError, Optimizer, Options};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Applied when a request sets no timeout, and the most a request may ask for.
const MAX_TIMEOUT_MS: u64 = 30_000;

fn with_timeout_cap(mut options: Options) -> Options {
    let ms = options.timeout_ms.map_or(MAX_TIMEOUT_MS, |ms| ms.min(MAX_TIMEOUT_MS));
    options.timeout_ms = Some(ms);
    options
}

fn status_for(err: &OptimizeError) -> StatusCode {
    match err {
        OptimizeError::InvalidOptions(_) => StatusCode::BAD_REQUEST,
        OptimizeError::InvalidBoard(_) | OptimizeError::AllStrategiesFailed(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        OptimizeError::Cancelled | OptimizeError::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
    }
}

async fn optimize(
    Json(req): Json<OptimizeRequest>,
) -> Result<Json<OptimizeResponse>, (StatusCode, String)> {
    tracing::info!(
        body = serde_json::to_string(&req).unwrap_or_default(),
        "POST /optimize"
    );

    if req.board.width == 0 || req.board.height == 0 {
        return Err((
            StatusCode::BAD_REQUEST,
            "board dimensions must be non-zero".to_string(),
        ));
    }

    let OptimizeRequest {
        pieces,
        board,
        options,
    } = req;
    let optimizer = Optimizer::new(board, with_timeout_cap(options));
    let solution = tokio::task::spawn_blocking(move || optimizer.optimize(&pieces))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(|e| {
            tracing::warn!(error = %e, "optimization failed");
            (status_for(&e), e.to_string())
        })?;

    Ok(Json(OptimizeResponse::from(&solution)))
}

#[tokio::main]
async fn main() {
    let _sentry = std::env::var("SENTRY_DSN").ok().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open("development.log")
        .expect("failed to open development.log");

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_target(false)
        .with_ansi(false)
        .with_max_level(Level::INFO)
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3001".to_string());
    let addr = format!("0.0.0.0:{port}");

    let app = Router::new()
        .route("/up", get(|| async { "ok" }))
        .route("/optimize", post(optimize))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind listener");
    eprintln!("Listening on {addr}");
    axum::serve(listener, app).await.expect("server error");
}
