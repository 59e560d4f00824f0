use clap::{Parser, Subcommand};
use comfy_table::Table;
use lifecanvas_shared::{Point, decode_points};
use serde::{Deserialize, Serialize};
use spinners::{Spinner, Spinners};
use std::io::{self, Read}; // Import Read for stdin

// The server used when neither --server nor LIFECANVAS_SERVER is given.
const DEFAULT_SERVER: &str = "http://127.0.0.1:8080";

/// A CLI for inspecting and feeding a LifeCanvas board.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Base URL of the LifeCanvas server.
    #[arg(long, global = true, env = "LIFECANVAS_SERVER", default_value = DEFAULT_SERVER)]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the current generation and live cells.
    Status,
    /// Scatter random cells in a square at the origin.
    Seed {
        /// How many cells to place.
        #[arg(long, default_value_t = 100)]
        count: usize,
        /// Side of the square the cells land in.
        #[arg(long, default_value_t = 100)]
        spread: u32,
    },
    /// Bring cells to life.
    /// Example: lifecanvas add 10,10 11,10 12,10
    /// Example: echo '[{"x":1,"y":2}]' | lifecanvas add --stdin
    Add {
        /// Cells as `x,y` pairs.
        #[arg(value_parser = parse_point, required_unless_present = "stdin")]
        points: Vec<Point>,
        /// Read a JSON array of points from standard input instead.
        #[arg(long, conflicts_with = "points")]
        stdin: bool,
    },
}

// This struct is used to deserialize the JSON response from the backend.
#[derive(Deserialize, Debug)]
struct BoardSnapshot {
    generation: u64,
    width: Option<u32>,
    height: Option<u32>,
    cells: Vec<Point>,
}

#[derive(Serialize, Debug)]
struct SeedRequest {
    count: usize,
    spread: u32,
}

// Parses an `x,y` pair from the command line.
fn parse_point(s: &str) -> Result<Point, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected x,y but got `{}`", s))?;
    let x = x.trim().parse().map_err(|e| format!("bad x in `{}`: {}", s, e))?;
    let y = y.trim().parse().map_err(|e| format!("bad y in `{}`: {}", s, e))?;
    Ok(Point::new(x, y))
}

// Helper function to join the server URL and an API path.
fn api_url(server: &str, path: &str) -> String {
    format!("{}{}", server.trim_end_matches('/'), path)
}

// Smallest rectangle containing every cell, as (top left, bottom right).
fn bounding_box(cells: &[Point]) -> Option<(Point, Point)> {
    let first = *cells.first()?;
    Some(cells.iter().fold((first, first), |(min, max), p| {
        (
            Point::new(min.x.min(p.x), min.y.min(p.y)),
            Point::new(max.x.max(p.x), max.y.max(p.y)),
        )
    }))
}

fn status_table(snapshot: &BoardSnapshot) -> Table {
    let size = match (snapshot.width, snapshot.height) {
        (Some(width), Some(height)) => format!("{} x {} (wrapping)", width, height),
        _ => "unbounded".to_string(),
    };
    let bounds = match bounding_box(&snapshot.cells) {
        Some((min, max)) => format!("{} .. {}", min, max),
        None => "-".to_string(),
    };

    let mut table = Table::new();
    table.set_header(vec!["Board", "Value"]);
    table.add_row(vec!["Generation".to_string(), snapshot.generation.to_string()]);
    table.add_row(vec!["Size".to_string(), size]);
    table.add_row(vec!["Live cells".to_string(), snapshot.cells.len().to_string()]);
    table.add_row(vec!["Bounds".to_string(), bounds]);
    table
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Status => {
            let api_url = api_url(&cli.server, "/api/board");

            match client.get(&api_url).send().await {
                Ok(res) => {
                    if res.status().is_success() {
                        let snapshot = res.json::<BoardSnapshot>().await?;
                        println!("{}", status_table(&snapshot));
                    } else {
                        eprintln!("Error: Failed to fetch the board (Status: {})", res.status());
                    }
                }
                Err(e) => {
                    eprintln!("Error: Could not connect to the server: {}", e);
                }
            }
        }
        Commands::Seed { count, spread } => {
            let mut sp = Spinner::new(Spinners::Dots9, "Seeding the board...".into());

            let api_url = api_url(&cli.server, "/api/board/seed");
            let response = client
                .post(&api_url)
                .json(&SeedRequest { count, spread })
                .send()
                .await;

            match response {
                Ok(res) => {
                    if res.status().is_success() {
                        sp.stop_with_message(format!("✓ Seeded up to {} cells!", count));
                    } else {
                        let status = res.status();
                        let reason = res.text().await.unwrap_or_default();
                        sp.stop_with_message(format!(
                            "✗ Error: Failed to seed (Status: {}) {}",
                            status, reason
                        ));
                    }
                }
                Err(e) => {
                    sp.stop_with_message(format!(
                        "✗ Error: Could not connect to the server: {}",
                        e
                    ));
                }
            }
        }
        Commands::Add { points, stdin } => {
            let points = if stdin {
                // Read all content from standard input.
                let mut buffer = String::new();
                io::stdin().read_to_string(&mut buffer)?;
                decode_points(&buffer)?
            } else {
                points
            };

            if points.is_empty() {
                eprintln!("✗ No cells provided.");
                return Ok(());
            }

            let mut sp = Spinner::new(Spinners::Dots9, "Sending cells...".into());

            let api_url = api_url(&cli.server, "/api/board/cells");
            let response = client.post(&api_url).json(&points).send().await;

            match response {
                Ok(res) => {
                    if res.status().is_success() {
                        sp.stop_with_message(format!("✓ Sent {} cells!", points.len()));
                    } else {
                        let status = res.status();
                        let reason = res.text().await.unwrap_or_default();
                        sp.stop_with_message(format!(
                            "✗ Error: Failed to add cells (Status: {}) {}",
                            status, reason
                        ));
                    }
                }
                Err(e) => {
                    sp.stop_with_message(format!(
                        "✗ Error: Could not connect to the server: {}",
                        e
                    ));
                }
            }
        }
    }

    Ok(())
}
