use anyhow::{Context, Result};
use catalog_browser::api_client::CatalogApiClient;
use catalog_browser::config::Config;
use catalog_browser::data::{CatalogSource, StaticCatalogSource};
use catalog_browser::ui::run_catalog_tui;
use catalog_browser::utils::logging::init_tracing;
use crossterm::style::Stylize;
use std::sync::Arc;
use tracing::info;

fn print_help() {
    println!("{}", "Catalog Browser".blue().bold());
    println!("Page through a remote product catalog, search it and chart a selection.");
    println!();
    println!("{}", "Usage:".yellow());
    println!("  catalog-browser [options]");
    println!();
    println!("{}", "Options:".yellow());
    println!("  {}  - Catalog service root URL", "--url <URL>".green());
    println!("  {}  - Rows per page", "--page-size <N>".green());
    println!("  {}   - Maximum number of pages to offer", "--page-cap <N>".green());
    println!("  {}            - Use the built-in offline catalog", "--demo".green());
    println!("  {} - Write a commented config file", "--generate-config".green());
    println!("  {}            - Show this help", "--help".green());
    println!();
    println!("{}", "Keys:".yellow());
    println!("  {}  search    {}  toggle row   {}  previous/next page", "/".green(), "Space".green(), "←/→".green());
    println!("  {}  retry     {}  refresh      {}  clear selection", "r".green(), "R".green(), "c".green());
    println!("  {}  logs     {}  quit", "F5".green(), "q".green());
    println!();
    println!("Set {} to change log verbosity (see F5 inside the app).", "RUST_LOG".cyan());
}

/// Value following `flag`, if present
fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|arg| arg == flag)
        .and_then(|pos| args.get(pos + 1))
        .map(|s| s.as_str())
}

fn parse_count(args: &[String], flag: &str) -> Result<Option<usize>> {
    flag_value(args, flag)
        .map(|value| {
            value
                .parse::<usize>()
                .with_context(|| format!("{} expects a number, got '{}'", flag, value))
        })
        .transpose()
}

fn generate_config() -> Result<()> {
    let path = Config::get_config_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Error creating config directory {}", parent.display()))?;
    }
    std::fs::write(&path, Config::create_default_with_comments())
        .with_context(|| format!("Error writing config file {}", path.display()))?;
    println!("Configuration file created at: {:?}", path);
    println!("Edit this file to customize the catalog browser.");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        print_help();
        return Ok(());
    }

    if args.contains(&"--generate-config".to_string()) {
        return generate_config();
    }

    let logs = init_tracing();

    let mut config = Config::load()?;
    if let Some(url) = flag_value(&args, "--url") {
        config.source.base_url = url.to_string();
    }
    if let Some(size) = parse_count(&args, "--page-size")? {
        config.browser.page_size = size;
    }
    if let Some(cap) = parse_count(&args, "--page-cap")? {
        config.browser.page_cap = Some(cap);
    }
    config.validate()?;

    let source: Arc<dyn CatalogSource> = if args.contains(&"--demo".to_string()) {
        info!(target: "system", "Using the built-in demo catalog");
        Arc::new(StaticCatalogSource::demo())
    } else {
        Arc::new(CatalogApiClient::new(&config.source)?)
    };
    info!(target: "system", "Catalog source: {}", source.describe());

    run_catalog_tui(source, &config, logs)
}
