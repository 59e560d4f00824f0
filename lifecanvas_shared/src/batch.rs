//! Debounced batching of drawn points.
//!
//! Every drag event appends a point and restarts a quiet-period timer; once
//! no point has arrived for [`FLUSH_QUIET_PERIOD`] the pending points go out
//! as one batch. The batcher is plain per-session state, and the timer is a
//! sleep future owned by [`run_debounced`], so nothing here is global and
//! nothing depends on a particular async runtime.

use crate::Point;
use futures_util::future::{select, Either};
use futures_util::{Stream, StreamExt};
use log::debug;
use std::future::Future;
use std::pin::pin;
use std::time::Duration;

/// How long input has to stay quiet before pending points are flushed.
pub const FLUSH_QUIET_PERIOD: Duration = Duration::from_millis(100);

/// Points drawn since the last flush, in the order they were drawn.
#[derive(Debug, Default, Clone)]
pub struct InputBatcher {
    pending: Vec<Point>,
}

impl InputBatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, point: Point) {
        self.pending.push(point);
    }

    /// Takes everything pending, or `None` if nothing was drawn since the
    /// last flush. Empty batches are never sent.
    pub fn take_batch(&mut self) -> Option<Vec<Point>> {
        if self.pending.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.pending))
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Converts canvas-relative coordinates into a [`Point`], or `None` when the
/// position lies outside a `width` x `height` canvas.
pub fn canvas_point(x: f64, y: f64, width: u32, height: u32) -> Option<Point> {
    let (x, y) = (x.floor(), y.floor());
    if !(0.0..f64::from(width)).contains(&x) || !(0.0..f64::from(height)).contains(&y) {
        return None;
    }
    Some(Point::new(x as i64, y as i64))
}

/// Drives one session's [`InputBatcher`].
///
/// Points are read from `points`; after each one a fresh `sleep(quiet)` is
/// raced against the next point, so a new point cancels the pending flush and
/// schedules another. When the timer wins, the batch is handed to `flush`.
/// Returns once `flush` reports the receiving side is gone, or once `points`
/// ends (after flushing whatever is still pending).
pub async fn run_debounced<S, F, Fut, K>(mut points: S, quiet: Duration, sleep: F, mut flush: K)
where
    S: Stream<Item = Point> + Unpin,
    F: Fn(Duration) -> Fut,
    Fut: Future<Output = ()>,
    K: FnMut(Vec<Point>) -> bool,
{
    let mut batcher = InputBatcher::new();

    loop {
        if batcher.is_empty() {
            match points.next().await {
                Some(point) => batcher.push(point),
                None => return,
            }
            continue;
        }

        let timer = pin!(sleep(quiet));
        match select(points.next(), timer).await {
            Either::Left((Some(point), _)) => batcher.push(point),
            Either::Left((None, _)) => {
                if let Some(batch) = batcher.take_batch() {
                    debug!("input closed, flushing {} remaining points", batch.len());
                    flush(batch);
                }
                return;
            }
            Either::Right(((), _)) => {
                if let Some(batch) = batcher.take_batch() {
                    debug!("flushing {} points", batch.len());
                    if !flush(batch) {
                        return;
                    }
                }
            }
        }
    }
}
