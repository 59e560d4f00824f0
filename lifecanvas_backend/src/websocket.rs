use crate::{AppState, simulation::SimulationHandle};
use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use lifecanvas_shared::{decode_points, encode_points};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn};

static NEXT_SESSION: AtomicU64 = AtomicU64::new(1);

/// The entry point for WebSocket connections.
/// This function handles the initial upgrade from HTTP to WebSocket.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// The main logic for a single WebSocket connection.
///
/// Outbound, the client gets the whole board every frame interval, but only
/// when it changed since the previous send. Inbound, every text message is a
/// batch of drawn points for the simulation.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let session = NEXT_SESSION.fetch_add(1, Ordering::Relaxed);
    info!("New WebSocket session {}", session);

    let mut frames = state.simulation.subscribe();
    // New clients paint the current board straight away.
    frames.mark_changed();

    // Split the WebSocket into a sender and receiver.
    let (mut sender, mut receiver) = socket.split();

    // Task to push frames to the client.
    let frame_interval = state.config.frame_interval();
    let mut send_task = tokio::spawn(async move {
        let mut ticker = time::interval(frame_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            match frames.has_changed() {
                Ok(true) => {}
                Ok(false) => continue,
                Err(_) => break,
            }

            let frame = frames.borrow_and_update().clone();
            let text = match encode_points(&frame.points) {
                Ok(text) => text,
                Err(e) => {
                    error!("Session {}: could not encode frame: {}", session, e);
                    break;
                }
            };
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    // Task to handle incoming batches from the client.
    let simulation = state.simulation.clone();
    let max_batch_points = state.config.max_batch_points;
    let mut recv_task = tokio::spawn(async move {
        while let Some(message) = receiver.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    if !forward_batch(&simulation, text.as_str(), max_batch_points, session).await
                    {
                        break;
                    }
                }
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    debug!("Session {}: receive failed: {}", session, e);
                    break;
                }
            }
        }
    });

    // Wait for either task to finish. If one does, the other should be aborted.
    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    info!("WebSocket session {} closed", session);
}

/// Hands one inbound message to the simulation. Bad batches are logged and
/// dropped without ending the session; returns `false` only once the
/// simulation is gone.
async fn forward_batch(
    simulation: &SimulationHandle,
    text: &str,
    max_batch_points: usize,
    session: u64,
) -> bool {
    let points = match decode_points(text) {
        Ok(points) => points,
        Err(e) => {
            warn!("Session {}: ignoring message: {}", session, e);
            return true;
        }
    };

    if points.is_empty() {
        return true;
    }
    if points.len() > max_batch_points {
        warn!(
            "Session {}: ignoring batch of {} points (limit {})",
            session,
            points.len(),
            max_batch_points
        );
        return true;
    }

    debug!("Session {}: {} points", session, points.len());
    simulation.add_cells(points).await.is_ok()
}
