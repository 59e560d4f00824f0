use crate::{AppState, simulation::SimulationClosed};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use lifecanvas_shared::Point;
use serde::{Deserialize, Serialize};
use tracing::debug;

// The AppError enum covers every way an API request can fail.
#[derive(Debug)]
pub enum AppError {
    SimulationClosed(SimulationClosed),
    InvalidRequest(String),
}

// Converts our custom AppError into a user-friendly HTTP response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::SimulationClosed(e) => {
                tracing::error!("Simulation error: {:?}", e);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Simulation unavailable".to_string(),
                )
            }
            AppError::InvalidRequest(reason) => {
                debug!("Rejected request: {}", reason);
                (StatusCode::BAD_REQUEST, reason)
            }
        };
        (status, error_message).into_response()
    }
}

impl From<SimulationClosed> for AppError {
    fn from(err: SimulationClosed) -> Self {
        AppError::SimulationClosed(err)
    }
}

// Current board contents, as returned by `GET /api/board`.
// `width`/`height` are null when the board is unbounded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub generation: u64,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub cells: Vec<Point>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedRequest {
    pub count: usize,
    pub spread: u32,
}

pub async fn health() -> &'static str {
    "ok"
}

/// Handler to fetch the latest frame.
pub async fn get_board(State(state): State<AppState>) -> Json<BoardSnapshot> {
    let frame = state.simulation.current();
    let dimensions = state.simulation.topology().dimensions();

    Json(BoardSnapshot {
        generation: frame.generation,
        width: dimensions.map(|(width, _)| width),
        height: dimensions.map(|(_, height)| height),
        cells: frame.points.clone(),
    })
}

/// Handler to bring a batch of cells to life, the HTTP twin of a websocket batch.
pub async fn add_cells(
    State(state): State<AppState>,
    Json(points): Json<Vec<Point>>,
) -> Result<StatusCode, AppError> {
    check_batch_size(points.len(), state.config.max_batch_points)?;
    if !points.is_empty() {
        debug!("Adding {} cells over HTTP", points.len());
        state.simulation.add_cells(points).await?;
    }
    Ok(StatusCode::ACCEPTED)
}

/// Handler to scatter random cells near the origin.
pub async fn seed_board(
    State(state): State<AppState>,
    Json(request): Json<SeedRequest>,
) -> Result<StatusCode, AppError> {
    if request.count == 0 || request.spread == 0 {
        return Err(AppError::InvalidRequest(
            "count and spread must both be positive".to_string(),
        ));
    }
    check_batch_size(request.count, state.config.max_batch_points)?;

    state
        .simulation
        .seed(request.count, request.spread)
        .await?;
    Ok(StatusCode::ACCEPTED)
}

fn check_batch_size(len: usize, max: usize) -> Result<(), AppError> {
    if len > max {
        return Err(AppError::InvalidRequest(format!(
            "batch of {} cells exceeds the limit of {}",
            len, max
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, life::Board, router, simulation};
    use axum::{
        Router,
        body::Body,
        http::{Request, header},
    };
    use clap::Parser;
    use http_body_util::BodyExt;
    use std::{sync::Arc, time::Duration};
    use tokio::task::JoinHandle;
    use tower::ServiceExt;

    fn test_app(extra_args: &[&str]) -> (Router, AppState, JoinHandle<()>) {
        let args = ["lifecanvas_backend", "--static-dir", "no-such-static-dir"]
            .iter()
            .chain(extra_args);
        let config = Config::try_parse_from(args).unwrap();
        // Ticks never fire during a test.
        let (simulation, task) =
            simulation::spawn(Board::new(config.topology()), Duration::from_secs(3600));
        let state = AppState {
            simulation,
            config: Arc::new(config),
        };
        (router(state.clone()), state, task)
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (app, _, _task) = test_app(&[]);
        let response = app.oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "ok");
    }

    #[tokio::test]
    async fn posted_cells_show_up_on_the_board() {
        let (app, state, _task) = test_app(&[]);
        let mut frames = state.simulation.subscribe();

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/board/cells",
                r#"[{"x":1,"y":1},{"x":2,"y":1},{"x":1,"y":2},{"x":2,"y":2}]"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        frames.changed().await.unwrap();

        let response = app.oneshot(get("/api/board")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let snapshot: BoardSnapshot = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(snapshot.generation, 0);
        assert_eq!(snapshot.width, Some(600));
        assert_eq!(snapshot.height, Some(600));
        assert_eq!(
            snapshot.cells,
            vec![
                Point::new(1, 1),
                Point::new(2, 1),
                Point::new(1, 2),
                Point::new(2, 2)
            ]
        );
    }

    #[tokio::test]
    async fn unbounded_board_has_no_dimensions() {
        let (app, _, _task) = test_app(&["--unbounded"]);
        let response = app.oneshot(get("/api/board")).await.unwrap();
        let snapshot: BoardSnapshot = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(snapshot.width, None);
        assert_eq!(snapshot.height, None);
        assert!(snapshot.cells.is_empty());
    }

    #[tokio::test]
    async fn oversized_batches_are_rejected() {
        let (app, _, _task) = test_app(&["--max-batch-points", "2"]);
        let response = app
            .oneshot(post_json(
                "/api/board/cells",
                r#"[{"x":1,"y":1},{"x":2,"y":1},{"x":3,"y":1}]"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_cells_are_a_client_error() {
        let (app, _, _task) = test_app(&[]);
        let response = app
            .oneshot(post_json("/api/board/cells", r#"[{"x":"one","y":1}]"#))
            .await
            .unwrap();
        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn seed_validates_its_arguments() {
        let (app, state, _task) = test_app(&[]);

        for body in [r#"{"count":0,"spread":10}"#, r#"{"count":10,"spread":0}"#] {
            let response = app
                .clone()
                .oneshot(post_json("/api/board/seed", body))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }

        let mut frames = state.simulation.subscribe();
        let response = app
            .oneshot(post_json("/api/board/seed", r#"{"count":25,"spread":5}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        frames.changed().await.unwrap();
        assert!(!state.simulation.current().points.is_empty());
    }

    #[tokio::test]
    async fn stopped_simulation_is_unavailable() {
        let (app, _, task) = test_app(&[]);
        task.abort();
        let _ = task.await;

        let response = app
            .oneshot(post_json("/api/board/cells", r#"[{"x":1,"y":1}]"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn unknown_paths_fall_through_to_static_files() {
        let (app, _, _task) = test_app(&[]);
        let response = app.oneshot(get("/index.html")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
