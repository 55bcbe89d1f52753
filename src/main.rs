mod cli;

use tubeforge::{config, uri, Catalog, Collection, Entity, Item};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;
use std::sync::Arc;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "tubeforge=debug,tubeforge_api=debug,tubeforge_common=debug".to_string()
        } else {
            "tubeforge=warn,tubeforge_api=warn".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Search { query } => search(&query.join(" "), cli.config.as_deref()),
        Commands::Lookup { reference } => lookup(&reference, cli.config.as_deref()),
        Commands::Stream { reference } => stream(&reference, cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("tubeforge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn open_catalog(config_path: Option<&Path>) -> Result<Catalog> {
    let config = config::load_config_or_default(config_path)?;
    config::validate_config(&config)?;
    Catalog::from_config(&config)
}

fn resolve(catalog: &Catalog, reference: &str) -> Result<Entity> {
    catalog
        .lookup(reference)
        .with_context(|| format!("Not a recognizable reference: {reference}"))
}

fn or_unknown(value: Option<String>) -> String {
    value.unwrap_or_else(|| "<unavailable>".to_string())
}

fn format_length(seconds: u64) -> String {
    let (h, m, s) = (seconds / 3600, (seconds / 60) % 60, seconds % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

fn search(query: &str, config_path: Option<&Path>) -> Result<()> {
    let catalog = open_catalog(config_path)?;
    let results = catalog.search(query)?;

    if results.is_empty() {
        println!("No results for \"{query}\"");
        return Ok(());
    }

    // Fetch every result's details up front so they arrive in a few batched calls.
    let items: Vec<Arc<Item>> = results.iter().filter_map(|e| e.as_item().cloned()).collect();
    let collections: Vec<Arc<Collection>> = results
        .iter()
        .filter_map(|e| e.as_collection().cloned())
        .collect();
    catalog.load_items(&items);
    catalog.load_collections(&collections);

    for entity in &results {
        let title = or_unknown(entity.title().read());
        let channel = or_unknown(entity.channel().read());
        let detail = match entity {
            Entity::Item(item) => item
                .length_seconds()
                .read()
                .map(format_length)
                .unwrap_or_else(|| "?".to_string()),
            Entity::Collection(collection) => match collection.item_count().read() {
                Some(count) => format!("{count} items"),
                None => "? items".to_string(),
            },
        };
        println!(
            "[{:<10}] {} - {} ({})",
            entity.kind(),
            title,
            channel,
            detail
        );
        println!("             {}", uri::entity_uri(entity.kind(), &title, entity.id()));
    }

    Ok(())
}

fn print_item(item: &Arc<Item>) {
    println!("Title:    {}", or_unknown(item.title().read()));
    println!("Channel:  {}", or_unknown(item.channel().read()));
    if let Some(seconds) = item.length_seconds().read() {
        println!("Length:   {}", format_length(seconds));
    }
    println!("URL:      {}", uri::watch_url(item.id()));
    for thumbnail in item.thumbnails().read().unwrap_or_default() {
        println!("Image:    {thumbnail}");
    }
}

fn lookup(reference: &str, config_path: Option<&Path>) -> Result<()> {
    let catalog = open_catalog(config_path)?;

    match resolve(&catalog, reference)? {
        Entity::Item(item) => print_item(&item),
        Entity::Collection(collection) => {
            println!("Title:    {}", or_unknown(collection.title().read()));
            println!("Channel:  {}", or_unknown(collection.channel().read()));
            if let Some(count) = collection.item_count().read() {
                println!("Items:    {count}");
            }

            let members = collection
                .members()
                .read()
                .with_context(|| format!("Collection {} has no members", collection.id()))?;

            println!("\nMembers: {}", members.len());
            for (i, member) in members.iter().enumerate() {
                let length = member
                    .length_seconds()
                    .read()
                    .map(format_length)
                    .unwrap_or_else(|| "?".to_string());
                println!(
                    "  {:>3}. {} ({})",
                    i + 1,
                    or_unknown(member.title().read()),
                    length
                );
            }
        }
    }

    Ok(())
}

fn stream(reference: &str, config_path: Option<&Path>) -> Result<()> {
    let catalog = open_catalog(config_path)?;

    let item = match resolve(&catalog, reference)? {
        Entity::Item(item) => item,
        Entity::Collection(collection) => {
            anyhow::bail!("{} is a collection, not an item", collection.id())
        }
    };

    let locator = item
        .audio_locator()
        .read()
        .with_context(|| format!("No playable audio stream for {}", item.id()))?;
    println!("{locator}");

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            config::load_config(p)?
        }
        None => {
            println!("No config file specified, searching default locations");
            let config = config::load_config_or_default(None)?;
            config::validate_config(&config)?;
            config
        }
    };

    println!("✓ Configuration is valid");
    println!("  Endpoint: {}", config.youtube.endpoint);
    println!("  Max members: {}", config.catalog.max_members);
    println!("  Search results: {}", config.catalog.search_results);
    println!("  Max workers: {}", config.catalog.max_workers);
    println!("  Cache capacity: {}", config.catalog.cache_capacity);
    match config.resolver.yt_dlp_path {
        Some(ref p) => println!("  yt-dlp: {}", p.display()),
        None => println!("  yt-dlp: (from PATH)"),
    }

    Ok(())
}
