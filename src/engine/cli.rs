//! CLI command handler: run one search page, print it, and optionally detail one result.

use anyhow::{Context, Result, anyhow, bail};
use colored::Colorize;
use log::{debug, warn};
use std::path::Path;
use std::sync::Arc;

use crate::engine::arg_parser::Cli;
use crate::engine::progress::{create_percent_bar, drive_bar};
use crate::pipeline::{DetailPipeline, ImageStore, RunOutcome};
use crate::services::Services;
use crate::types::{DisplaySize, Entry, RunOpts};
use crate::utils::config::{DEFAULT_PAGE_SIZE, PackagePaths, ServiceConfig};
use crate::utils::logger::{FacadeLogger, Logger};
use crate::utils::websift_toml::{
    WebsiftToml, apply_file_to_config, apply_file_to_settings, load_websift_toml,
};
use crate::utils::{resolve_key, setup_logging};

/// Run settings after merging `.websift.toml` and CLI flags (flags win).
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub page_size: u32,
    pub max_concurrency: Option<usize>,
    pub display: Option<DisplaySize>,
    pub verbose: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_concurrency: None,
            display: None,
            verbose: false,
        }
    }
}

fn setup_settings(cli: &Cli, file: Option<&WebsiftToml>) -> Settings {
    let mut settings = Settings::default();
    if let Some(f) = file {
        apply_file_to_settings(f, &mut settings);
    }
    if let Some(n) = cli.page_size {
        settings.page_size = n;
    }
    if cli.max_concurrency.is_some() {
        settings.max_concurrency = cli.max_concurrency;
    }
    if cli.display.is_some() {
        settings.display = cli.display;
    }
    if let Some(v) = cli.verbose {
        settings.verbose = v;
    }
    settings
}

fn setup_services(dir: &Path, file: Option<&WebsiftToml>) -> Result<Services> {
    let paths = PackagePaths::get();
    let mut config = ServiceConfig::default();
    if let Some(f) = file {
        apply_file_to_config(f, &mut config);
    }
    config.search_key = resolve_key(
        dir,
        paths.search_key_env(),
        file.and_then(WebsiftToml::search_key),
        "search key",
        true,
    )?;
    if config.search_key.is_empty() {
        bail!("A search key is required (set {})", paths.search_key_env());
    }
    config.vision_key = resolve_key(
        dir,
        paths.vision_key_env(),
        file.and_then(WebsiftToml::vision_key),
        "vision key",
        false,
    )?;
    if config.vision_key.is_empty() {
        warn!(
            "No vision key set ({}); image analysis will fail",
            paths.vision_key_env()
        );
    }
    debug!("request timeout: {:?}", config.request_timeout);
    Services::http(&config).context("build HTTP client")
}

/// Search, print the page, then detail `--select` if given. Ctrl-C cancels the run.
pub fn handle_run(cli: &Cli) -> Result<()> {
    let dir = std::env::current_dir().context("current directory")?;
    let file = load_websift_toml(&dir);
    let settings = setup_settings(cli, file.as_ref());
    setup_logging(settings.verbose);
    debug!("{:#?}", settings);

    let services = setup_services(&dir, file.as_ref())?;
    let logger: Arc<dyn Logger> = Arc::new(FacadeLogger);
    let store = Arc::new(ImageStore::new(
        services.clone(),
        Arc::clone(&logger),
        RunOpts {
            max_concurrency: settings.max_concurrency,
        },
    ));

    {
        let store = Arc::clone(&store);
        if let Err(e) = ctrlc::set_handler(move || store.cancel()) {
            warn!("Ctrl-C handler not installed: {}", e);
        }
    }

    let query = cli.query_string();
    let bar = settings.verbose.then(|| create_percent_bar("Loading"));
    let feeder = bar
        .as_ref()
        .map(|b| drive_bar(b, store.progress().subscribe_percent()));

    let handle = store.run(&query, cli.page, settings.page_size)?;
    let outcome = handle.wait()?;
    if let Some(f) = feeder
        && outcome != RunOutcome::Cancelled
    {
        let _ = f.join();
        eprintln!();
    }

    match outcome {
        RunOutcome::Cancelled => return Err(anyhow!("Search cancelled by user")),
        RunOutcome::SearchFailed => bail!("Image search failed for \"{}\"", query),
        RunOutcome::Completed { added, failed } => {
            debug!("{} added, {} failed", added, failed);
        }
    }

    let entries = store.images().snapshot();
    for (i, entry) in entries.iter().enumerate() {
        print_entry(i + 1, entry);
    }

    if let Some(n) = cli.select {
        let entry = n
            .checked_sub(1)
            .and_then(|i| entries.get(i))
            .ok_or_else(|| anyhow!("--select {} is out of range (1..={})", n, entries.len()))?;
        detail_entry(&services, logger, entry, settings.display, cli.overlay.as_deref())?;
    }
    Ok(())
}

fn print_entry(n: usize, entry: &Entry) {
    let item = entry.item();
    let size = match (item.width, item.height) {
        (Some(w), Some(h)) => format!("{w}×{h}"),
        _ => "?".to_string(),
    };
    println!(
        "{:>3}. {} {} {}",
        n,
        item.title.bold(),
        format!("({size})").dimmed(),
        item.source_url
    );
}

fn detail_entry(
    services: &Services,
    logger: Arc<dyn Logger>,
    entry: &Entry,
    display: Option<DisplaySize>,
    overlay_path: Option<&Path>,
) -> Result<()> {
    let pipeline = DetailPipeline::new(services, logger);
    // Without an explicit display area, draw at the image's own size.
    let item_size = match (entry.item().width, entry.item().height) {
        (Some(w), Some(h)) => Some(DisplaySize::new(w as f64, h as f64)),
        _ => None,
    };
    if let Some(size) = display.or(item_size) {
        pipeline.set_display_size(size);
    }
    let outcome = pipeline.process(entry);
    debug!("{:?}", outcome);

    if let Some(analysis) = entry.analysis() {
        println!("\n{}", analysis.report(&entry.item().media_url));
    }

    if let Some(path) = overlay_path {
        let overlay = entry
            .overlay()
            .ok_or_else(|| anyhow!("No overlay for the selected image"))?;
        overlay
            .image
            .save(path)
            .with_context(|| format!("write {}", path.display()))?;
        println!(
            "Overlay with {} face(s) written to {}",
            overlay.faces.len(),
            path.display()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_flags_override_file() {
        let file = crate::utils::websift_toml::parse_websift_toml(
            "[run]\npage_size = 20\nmax_concurrency = 2\n",
        )
        .unwrap();
        let cli = Cli::try_parse_from(["websift", "cats", "-n", "30"]).unwrap();
        let settings = setup_settings(&cli, Some(&file));
        assert_eq!(settings.page_size, 30);
        assert_eq!(settings.max_concurrency, Some(2));
        assert!(!settings.verbose);
    }

    #[test]
    fn test_settings_default_page_size() {
        let cli = Cli::try_parse_from(["websift", "cats"]).unwrap();
        assert_eq!(setup_settings(&cli, None).page_size, DEFAULT_PAGE_SIZE);
    }
}
