//! Types shared by the LifeCanvas server, CLI and browser client.
//!
//! Everything that crosses the websocket lives here: the [`Point`] type and
//! its JSON codec, the debounced [`InputBatcher`] that turns drag events into
//! outbound batches, and the [`PixelBuffer`] that turns an inbound frame into
//! RGBA bytes for the canvas.

pub mod batch;
pub mod frame;
pub mod point;
pub mod wire;

pub use batch::{canvas_point, run_debounced, InputBatcher, FLUSH_QUIET_PERIOD};
pub use frame::{PixelBuffer, RenderStats};
pub use point::Point;
pub use wire::{decode_points, encode_points, WireError};

/// Width of the browser canvas, in pixels.
pub const CANVAS_WIDTH: u32 = 600;
/// Height of the browser canvas, in pixels.
pub const CANVAS_HEIGHT: u32 = 600;
