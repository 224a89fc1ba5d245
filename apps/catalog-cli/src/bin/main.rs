use std::env;
use std::path::PathBuf;

use anyhow::bail;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use catalog_core::config::{resolve_with_base, Backend, Config, Settings};
use catalog_core::traits::IndexEngine;
use catalog_core::Cancel;
use catalog_index::{ElasticIndex, MemoryIndex};
use catalog_inference::InferenceClient;
use catalog_search::ingest::{list_json_files, read_products};
use catalog_search::seed::{sample_products, seed_catalog};
use catalog_search::{InferenceExplainer, ProductSearch};

const USAGE: &str = "Usage: catalog-cli <seed | ingest [dir] | search <query> | hybrid <query> | explain <query>>";

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() { eprintln!("{USAGE}"); std::process::exit(1); }
    let cmd = args.remove(0);
    (cmd, args)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

/// Cancel token fired by Ctrl-C.
fn interrupt_token() -> Cancel {
    let (handle, cancel) = Cancel::pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() { handle.cancel(); }
    });
    cancel
}

fn query_arg(cmd: &str, args: &[String]) -> anyhow::Result<String> {
    if args.is_empty() { bail!("Usage: catalog-cli {cmd} \"<query>\""); }
    Ok(args.join(" "))
}

async fn ingest<E: IndexEngine>(search: &ProductSearch<E>, dir: PathBuf, cancel: &Cancel) -> anyhow::Result<()> {
    info!(dir = %dir.display(), "ingesting products");
    search.create_index_if_not_exists(cancel).await?;
    let mut products = Vec::new();
    for file in list_json_files(&dir) {
        match read_products(&file) {
            Ok(mut batch) => products.append(&mut batch),
            Err(e) => warn!(file = %file.display(), error = %e, "skipping unreadable product file"),
        }
    }
    let pb = ProgressBar::new(products.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} products ({percent}%) {msg}")?
            .progress_chars("#>-"),
    );
    let mut indexed = 0;
    for product in &products {
        match search.index_product(product, cancel).await {
            Ok(()) => indexed += 1,
            Err(e) if e.is_cancelled() => { pb.abandon(); return Err(e.into()); }
            Err(e) => warn!(id = %product.id, error = %e, "failed to index product"),
        }
        pb.inc(1);
    }
    pb.finish_with_message("done");
    println!("Ingest complete ({indexed}/{} products)", products.len());
    Ok(())
}

async fn run<E: IndexEngine>(explainer: InferenceExplainer<E>, settings: &Settings, cmd: &str, args: &[String]) -> anyhow::Result<()> {
    let cancel = interrupt_token();
    let search = explainer.search();
    match cmd {
        "seed" => {
            let n = seed_catalog(search, &sample_products(), &cancel).await?;
            println!("Seeded {n} products into '{}'", search.index());
        }
        "ingest" => {
            let dir = match (args.first(), settings.data.products_dir.as_deref()) {
                (Some(dir), _) => PathBuf::from(dir),
                // relative to where the config was loaded from
                (None, Some(dir)) => resolve_with_base(&env::current_dir()?, dir),
                (None, None) => bail!("Usage: catalog-cli ingest <dir> (or set data.products_dir)"),
            };
            ingest(search, dir, &cancel).await?;
        }
        "search" => {
            let products = search.semantic_search(&query_arg(cmd, args)?, &cancel).await?;
            println!("{}", serde_json::to_string_pretty(&products)?);
        }
        "hybrid" => {
            let products = search.hybrid_search(&query_arg(cmd, args)?, &cancel).await?;
            println!("{}", serde_json::to_string_pretty(&products)?);
        }
        "explain" => {
            let explanation = explainer.explain(&query_arg(cmd, args)?, &cancel).await?;
            println!("{}", serde_json::to_string_pretty(&explanation)?);
        }
        _ => { eprintln!("Unknown command: {cmd}\n{USAGE}"); std::process::exit(1); }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {e}"); e })?;
    let settings = config.settings()?;
    let (cmd, args) = parse_args();
    let tokens = InferenceClient::from_settings(&settings)?;
    let index = settings.engine.index.clone();
    match settings.engine.backend {
        Backend::Elasticsearch => {
            let search = ProductSearch::new(ElasticIndex::from_settings(&settings.engine)?, index);
            run(InferenceExplainer::new(search, tokens), &settings, &cmd, &args).await
        }
        Backend::Memory => {
            // nothing persists between runs, so start from the demo catalog
            let search = ProductSearch::new(MemoryIndex::new(), index);
            seed_catalog(&search, &sample_products(), &Cancel::never()).await?;
            run(InferenceExplainer::new(search, tokens), &settings, &cmd, &args).await
        }
    }
}
