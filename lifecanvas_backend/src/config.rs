use crate::life::Topology;
use clap::Parser;
use std::{path::PathBuf, time::Duration};

/// Shared Game of Life canvas served over HTTP and websockets.
///
/// Every option can also be set through the environment variable shown next
/// to it.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Address the HTTP server listens on.
    #[arg(long, env = "LIFECANVAS_ADDRESS", default_value = "0.0.0.0:8080")]
    pub address: String,

    /// Directory holding the built web client.
    #[arg(long, env = "LIFECANVAS_STATIC_DIR", default_value = "static")]
    pub static_dir: PathBuf,

    /// Board width; coordinates wrap around at this column.
    #[arg(long, env = "LIFECANVAS_WIDTH", default_value_t = 600, value_parser = clap::value_parser!(u32).range(1..))]
    pub width: u32,

    /// Board height; coordinates wrap around at this row.
    #[arg(long, env = "LIFECANVAS_HEIGHT", default_value_t = 600, value_parser = clap::value_parser!(u32).range(1..))]
    pub height: u32,

    /// Let the board grow without bounds instead of wrapping.
    #[arg(long, env = "LIFECANVAS_UNBOUNDED")]
    pub unbounded: bool,

    /// Milliseconds between generations.
    #[arg(long, env = "LIFECANVAS_TICK_MS", default_value_t = 50, value_parser = clap::value_parser!(u64).range(1..))]
    pub tick_ms: u64,

    /// Milliseconds between frames pushed to each client.
    #[arg(long, env = "LIFECANVAS_FRAME_MS", default_value_t = 100, value_parser = clap::value_parser!(u64).range(1..))]
    pub frame_ms: u64,

    /// Largest point batch accepted from a single message.
    #[arg(long, env = "LIFECANVAS_MAX_BATCH_POINTS", default_value_t = 10_000)]
    pub max_batch_points: usize,

    /// Random cells placed on the board at startup.
    #[arg(long, env = "LIFECANVAS_SEED_CELLS", default_value_t = 0)]
    pub seed_cells: usize,

    /// Side of the square, anchored at the origin, that startup cells land in.
    #[arg(long, env = "LIFECANVAS_SEED_SPREAD", default_value_t = 100, value_parser = clap::value_parser!(u32).range(1..))]
    pub seed_spread: u32,
}

impl Config {
    pub fn topology(&self) -> Topology {
        if self.unbounded {
            Topology::Unbounded
        } else {
            Topology::Toroidal {
                width: self.width,
                height: self.height,
            }
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_ms)
    }
}
