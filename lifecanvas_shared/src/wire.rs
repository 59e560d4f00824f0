//! JSON codec for the websocket messages.
//!
//! Both directions carry the same payload: a JSON array of `{"x": .., "y": ..}`
//! objects. Client → server it is a batch of freshly drawn points; server →
//! client it is the complete set of live cells.

use crate::Point;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("malformed point list: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn encode_points(points: &[Point]) -> Result<String, WireError> {
    Ok(serde_json::to_string(points)?)
}

pub fn decode_points(text: &str) -> Result<Vec<Point>, WireError> {
    Ok(serde_json::from_str(text)?)
}
