use crate::life::{Board, Frame, Topology};
use lifecanvas_shared::Point;
use std::{sync::Arc, time::Duration};
use thiserror::Error;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tracing::{debug, info};

const COMMAND_BUFFER: usize = 256;

/// Requests sent to the task that owns the board.
#[derive(Debug)]
pub enum Command {
    AddCells(Vec<Point>),
    Seed { count: usize, spread: u32 },
}

/// The simulation task is gone, so the command was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("simulation task has stopped")]
pub struct SimulationClosed;

/// Cheap, cloneable access to the running simulation.
///
/// Commands go through a bounded channel to the one task that owns the
/// [`Board`]; the latest frame is always available through a watch channel.
#[derive(Debug, Clone)]
pub struct SimulationHandle {
    commands: mpsc::Sender<Command>,
    frames: watch::Receiver<Arc<Frame>>,
    topology: Topology,
}

impl SimulationHandle {
    pub async fn add_cells(&self, points: Vec<Point>) -> Result<(), SimulationClosed> {
        self.send(Command::AddCells(points)).await
    }

    pub async fn seed(&self, count: usize, spread: u32) -> Result<(), SimulationClosed> {
        self.send(Command::Seed { count, spread }).await
    }

    /// A receiver that is notified whenever the set of live cells changes.
    /// Generations that leave the board as it was update the frame silently.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Frame>> {
        self.frames.clone()
    }

    pub fn current(&self) -> Arc<Frame> {
        self.frames.borrow().clone()
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    async fn send(&self, command: Command) -> Result<(), SimulationClosed> {
        self.commands.send(command).await.map_err(|_| SimulationClosed)
    }
}

/// Starts the simulation task. It advances `board` every `tick` and stops
/// once every [`SimulationHandle`] has been dropped.
pub fn spawn(board: Board, tick: Duration) -> (SimulationHandle, JoinHandle<()>) {
    let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
    let (frames_tx, frames_rx) = watch::channel(Arc::new(board.frame()));

    let handle = SimulationHandle {
        commands: commands_tx,
        frames: frames_rx,
        topology: board.topology(),
    };
    let task = tokio::spawn(run(board, commands_rx, frames_tx, tick));
    (handle, task)
}

async fn run(
    mut board: Board,
    mut commands: mpsc::Receiver<Command>,
    frames: watch::Sender<Arc<Frame>>,
    tick: Duration,
) {
    let mut rng = fastrand::Rng::new();
    let mut ticker = time::interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    info!(
        "Simulation started with {} live cells ({:?}, tick {:?})",
        board.len(),
        board.topology(),
        tick
    );

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::AddCells(points)) => {
                    let submitted = points.len();
                    let added = board.add_cells(points);
                    debug!("Added {} of {} submitted cells", added, submitted);
                }
                Some(Command::Seed { count, spread }) => {
                    let added = board.seed(count, spread, &mut rng);
                    info!("Seeded {} cells over a {}x{} square", added, spread, spread);
                }
                None => break,
            },
            _ = ticker.tick() => board.step(),
        }

        publish(&frames, board.frame());
    }

    info!("Simulation stopped at generation {}", board.generation());
}

// Stores `next` as the latest frame, waking subscribers only when the live
// cells differ from the previous frame.
fn publish(frames: &watch::Sender<Arc<Frame>>, next: Frame) {
    frames.send_if_modified(|current| {
        let changed = current.points != next.points;
        *current = Arc::new(next);
        changed
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_millis(50);

    fn torus() -> Board {
        Board::new(Topology::Toroidal {
            width: 64,
            height: 64,
        })
    }

    fn blinker() -> Vec<Point> {
        vec![Point::new(4, 5), Point::new(5, 5), Point::new(6, 5)]
    }

    #[tokio::test(start_paused = true)]
    async fn added_cells_are_published_before_the_next_tick() {
        let (handle, _task) = spawn(torus(), TICK);
        let mut frames = handle.subscribe();
        assert!(handle.current().points.is_empty());

        handle.add_cells(blinker()).await.unwrap();
        frames.changed().await.unwrap();

        let frame = frames.borrow_and_update().clone();
        assert_eq!(frame.generation, 0);
        assert_eq!(frame.points, blinker());
    }

    #[tokio::test(start_paused = true)]
    async fn board_advances_every_tick() {
        let (handle, _task) = spawn(torus(), TICK);
        handle.add_cells(blinker()).await.unwrap();

        time::sleep(Duration::from_millis(60)).await;
        let frame = handle.current();
        assert_eq!(frame.generation, 1);
        assert_eq!(
            frame.points,
            vec![Point::new(5, 4), Point::new(5, 5), Point::new(5, 6)]
        );

        time::sleep(TICK).await;
        let frame = handle.current();
        assert_eq!(frame.generation, 2);
        assert_eq!(frame.points, blinker());
    }

    #[tokio::test(start_paused = true)]
    async fn seeding_places_cells_inside_the_spread() {
        let (handle, _task) = spawn(torus(), TICK);
        let mut frames = handle.subscribe();

        handle.seed(40, 8).await.unwrap();
        frames.changed().await.unwrap();

        let frame = frames.borrow_and_update().clone();
        assert!(!frame.points.is_empty());
        assert!(frame
            .points
            .iter()
            .all(|p| (0..8).contains(&p.x) && (0..8).contains(&p.y)));
    }

    #[tokio::test(start_paused = true)]
    async fn unchanged_board_does_not_wake_subscribers() {
        let block = vec![
            Point::new(1, 1),
            Point::new(2, 1),
            Point::new(1, 2),
            Point::new(2, 2),
        ];
        let (handle, _task) = spawn(torus(), TICK);
        let mut frames = handle.subscribe();

        handle.add_cells(block.clone()).await.unwrap();
        frames.changed().await.unwrap();
        let _ = frames.borrow_and_update();

        time::sleep(Duration::from_secs(1)).await;
        assert!(!frames.has_changed().unwrap());

        // The generation still moves on for readers of the latest frame.
        let frame = handle.current();
        assert!(frame.generation >= 19);
        assert_eq!(frame.points, block);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_board_publishes_nothing() {
        let (handle, _task) = spawn(Board::new(Topology::Unbounded), TICK);
        let frames = handle.subscribe();

        time::sleep(Duration::from_secs(1)).await;
        assert!(!frames.has_changed().unwrap());
        assert!(handle.current().generation >= 19);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_spread_seed_leaves_the_task_running() {
        let (handle, task) = spawn(torus(), TICK);
        let mut frames = handle.subscribe();

        handle.seed(5, 0).await.unwrap();
        handle.add_cells(blinker()).await.unwrap();
        frames.changed().await.unwrap();

        assert!(!task.is_finished());
        assert_eq!(frames.borrow_and_update().points, blinker());
    }

    #[tokio::test(start_paused = true)]
    async fn stops_when_every_handle_is_dropped() {
        let (handle, task) = spawn(torus(), TICK);
        let other = handle.clone();
        drop(handle);
        drop(other);
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn commands_fail_once_the_task_is_gone() {
        let (handle, task) = spawn(torus(), TICK);
        task.abort();
        let _ = task.await;

        assert_eq!(handle.add_cells(blinker()).await, Err(SimulationClosed));
        assert_eq!(handle.seed(1, 1).await, Err(SimulationClosed));
    }
}
