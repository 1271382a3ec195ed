mod classifier;
mod display;
mod error;
mod pipeline;
mod session;
mod surface;

use anyhow::{Context, Result};
use clap::Parser;
use display::TerminalSink;
use image::Rgba;
use pipeline::CycleController;
use session::Session;
use std::io::{self, BufRead};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the trained digit classifier (ONNX file)
    #[arg(short, long)]
    model: String,

    /// Inference tick period in milliseconds
    #[arg(long, default_value_t = 100)]
    tick_ms: u64,

    /// Drawable surface size in pixels (square)
    #[arg(long, default_value_t = 280)]
    surface_size: u32,

    /// Pen stroke width in pixels
    #[arg(long, default_value_t = 20)]
    pen_width: u32,

    /// Print an ASCII bar chart of the class distribution with each prediction
    #[arg(long)]
    chart: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    tracing::info!("Inkpad starting");
    tracing::info!("Surface: {}x{}", args.surface_size, args.surface_size);
    tracing::info!("Tick period: {}ms", args.tick_ms);

    let classifier = classifier::create_default_classifier(&args.model)
        .context("Failed to load classifier")?;

    let session = Arc::new(Session::new(
        args.surface_size,
        args.surface_size,
        args.pen_width,
    ));
    let sink = Box::new(TerminalSink::new(args.chart));

    let mut controller = CycleController::new(
        session.clone(),
        classifier,
        sink,
        Duration::from_millis(args.tick_ms),
    );
    let worker = std::thread::spawn(move || controller.run());

    run_input_loop(&session)?;

    session.shutdown();
    if worker.join().is_err() {
        tracing::error!("Inference worker panicked");
    }

    Ok(())
}

/// Drive the surface from a stdin line protocol, standing in for a pointer
/// event source.
fn run_input_loop(session: &Session) -> Result<()> {
    tracing::info!("Commands: move X Y | up | color #RRGGBB | reset | status | quit");

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("Failed to read input")?;
        let mut parts = line.split_whitespace();

        match parts.next() {
            Some("move") => {
                let x = parts.next().and_then(|v| v.parse::<f32>().ok());
                let y = parts.next().and_then(|v| v.parse::<f32>().ok());
                match (x, y) {
                    (Some(x), Some(y)) => session.pointer_moved(x, y),
                    _ => tracing::warn!("Usage: move X Y"),
                }
            }
            Some("up") => session.pointer_released(),
            Some("color") => match parts.next().and_then(parse_hex_color) {
                Some(color) => session.set_pen_color(color),
                None => tracing::warn!("Usage: color #RRGGBB"),
            },
            Some("reset") => session.reset(),
            Some("status") => {
                let prediction = session
                    .last_result()
                    .map(|r| r.digit.to_string())
                    .unwrap_or_else(|| "?".to_string());
                tracing::info!(
                    "dirty={}, last prediction={}",
                    session.is_dirty(),
                    prediction
                );
            }
            Some("quit") => break,
            Some(other) => tracing::warn!("Unknown command: {other}"),
            None => {}
        }
    }

    Ok(())
}

/// Parse a `#RRGGBB` hex color into an opaque RGBA pen color.
fn parse_hex_color(s: &str) -> Option<Rgba<u8>> {
    let hex = s.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Rgba([r, g, b, 255]))
}
