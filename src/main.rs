use bindery::{BinderyError, Engine, EngineConfig, Page};
use serde_json::json;
use std::env;
use std::fs;

/// Renders a page document and prints the rendered component tree as JSON.
fn main() -> Result<(), BinderyError> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if !(2..=3).contains(&args.len()) {
        eprintln!("Resolves the bindings of a page and expands its repeaters.");
        eprintln!();
        eprintln!("Usage: {} <path/to/page.json> [path/to/config.json]", args[0]);
        eprintln!();
        eprintln!("A page holds 'state', 'user', 'currentUser', 'tables' and 'components'.");
        std::process::exit(1);
    }

    let page_path = &args[1];
    log::info!("Loading page from {}", page_path);
    let page = Page::from_file(page_path)?;

    let config = match args.get(2) {
        Some(config_path) => {
            log::info!("Loading config from {}", config_path);
            EngineConfig::from_json(&fs::read_to_string(config_path)?)?
        }
        None => EngineConfig::default(),
    };

    let engine = Engine::for_page(&page, config)?;
    let components = engine.render_page(&page)?;
    log::info!(
        "Rendered {} root component(s), {} node(s) in total",
        components.len(),
        components.iter().map(|c| c.node_count()).sum::<usize>()
    );

    println!(
        "{}",
        serde_json::to_string_pretty(&json!({ "components": components }))?
    );
    Ok(())
}
