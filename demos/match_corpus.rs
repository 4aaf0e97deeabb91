//! Builds a signature store from a directory of fragment scans and ranks every pair.
//!
//! Usage: `cargo run --example match_corpus -- <fragment_dir> [output_dir] [config.json]`
//!
//! Writes `store.json` and `matches.json` to the output directory (default `tear_output`).

use log::{info, warn};
use std::path::PathBuf;
use std::time::Instant;
use tear_matching::{DirectoryCorpus, JsonFile, MatchExporter, SignatureStore, TearMatchingConfig, TearPipeline};

/// Number of ranked pairs printed to stdout
const TOP_MATCHES: usize = 10;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let Some(corpus_dir) = args.next().map(PathBuf::from) else {
        eprintln!("usage: match_corpus <fragment_dir> [output_dir] [config.json]");
        std::process::exit(2);
    };
    let output_dir = args.next().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("tear_output"));
    let config = match args.next() {
        Some(path) => TearMatchingConfig::from_json_file(path)?,
        None => TearMatchingConfig::default(),
    };

    let pipeline = TearPipeline::new(config)?;
    let start_time = Instant::now();

    let mut store = SignatureStore::new();
    let corpus = DirectoryCorpus::new(&corpus_dir, pipeline.mask_options().clone());
    let report = store.bulk_build(corpus, &pipeline);
    for failure in &report.failures {
        warn!("{}", failure);
    }
    info!(
        "Built {} signatures from {} in {:.3}s",
        report.built.len(),
        corpus_dir.display(),
        start_time.elapsed().as_secs_f64()
    );

    let matches = pipeline.engine().match_all_pairs(&store);
    let partners = pipeline.engine().best_partners(&store);

    store.save(&JsonFile::new(output_dir.join("store.json")))?;
    JsonFile::new(output_dir.join("matches.json")).export_matches(&matches)?;

    println!("Closest pairs:");
    for result in matches.iter().take(TOP_MATCHES) {
        println!(
            "  {:>10.6}  {} <-> {}  {:?}",
            result.distance, result.query, result.candidate, result.alignment
        );
    }
    println!("Best partner of each fragment:");
    for (identifier, best) in &partners {
        println!("  {} -> {} ({:.6})", identifier, best.candidate, best.distance);
    }

    info!(
        "Finished {} records, {} pairs in {:.3}s",
        store.len(),
        matches.len(),
        start_time.elapsed().as_secs_f64()
    );
    Ok(())
}
