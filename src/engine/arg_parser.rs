use clap::Parser;
use std::path::PathBuf;

use crate::types::DisplaySize;

struct DefaultArgs;

impl DefaultArgs {
    pub const PAGE: &'static str = "1";
}

/// Streaming image search: thumbnails load in parallel, failures are skipped and logged.
#[derive(Clone, Parser)]
#[command(name = "websift")]
#[command(about = "Search images and stream a page of thumbnails; --select analyzes one result.")]
pub struct Cli {
    /// Search terms. Joined with spaces.
    #[arg(value_name = "QUERY", required = true, num_args = 1..)]
    pub query: Vec<String>,

    /// Result page to load (1-based).
    #[arg(long, short, default_value = DefaultArgs::PAGE, value_parser = clap::value_parser!(u32))]
    pub page: u32,

    /// Results per page (10 or over). Default: 50, or `page_size` in .websift.toml.
    #[arg(long, short = 'n', value_parser = clap::value_parser!(u32))]
    pub page_size: Option<u32>,

    /// Cap on concurrent thumbnail downloads. Default: one per result.
    #[arg(long, short = 'j', value_parser = clap::value_parser!(usize))]
    pub max_concurrency: Option<usize>,

    /// After the page loads, fetch the full image and analysis for result N (1-based).
    #[arg(long, short = 's', value_parser = clap::value_parser!(usize))]
    pub select: Option<usize>,

    /// Write the face overlay of the selected result to this PNG. Requires --select.
    #[arg(long, short = 'o', requires = "select")]
    pub overlay: Option<PathBuf>,

    /// Display area for the overlay, as WIDTHxHEIGHT. Default: the image's own size.
    #[arg(long, value_parser = parse_display)]
    pub display: Option<DisplaySize>,

    /// Verbose output.
    #[arg(long, short = 'v', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub verbose: Option<bool>,
}

impl Cli {
    pub fn query_string(&self) -> String {
        self.query.join(" ")
    }
}

/// Parse `WIDTHxHEIGHT` (e.g. `800x600`).
pub fn parse_display(s: &str) -> Result<DisplaySize, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
    let width: f64 = w.trim().parse().map_err(|_| format!("bad width {w:?}"))?;
    let height: f64 = h.trim().parse().map_err(|_| format!("bad height {h:?}"))?;
    let size = DisplaySize::new(width, height);
    if size.is_degenerate() {
        return Err(format!("display size must be positive, got {s:?}"));
    }
    Ok(size)
}
