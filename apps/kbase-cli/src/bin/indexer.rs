use std::{env, path::PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use kbase_core::config::Config;
use kbase_core::ingest::DocumentProcessor;
use kbase_core::traits::EmbeddingIndex;
use kbase_embed::embedder_from_config;
use kbase_index::MemoryIndex;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;

    let args: Vec<String> = env::args().skip(1).collect();
    let mut data_dir = None;
    let mut snapshot = None;
    let mut limit = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--out" | "-o" => {
                if i + 1 < args.len() {
                    snapshot = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                } else {
                    eprintln!("Error: --out requires a path");
                    std::process::exit(1);
                }
            }
            "--limit" => {
                if let Some(n) = args.get(i + 1).and_then(|v| v.parse::<usize>().ok()) {
                    limit = Some(n);
                    i += 1;
                } else {
                    eprintln!("Error: --limit requires a number");
                    std::process::exit(1);
                }
            }
            _ if !args[i].starts_with('-') => data_dir = Some(PathBuf::from(&args[i])),
            _ => {}
        }
        i += 1;
    }
    let data_dir = data_dir.unwrap_or_else(|| {
        let dir: String = config
            .get("data.docs_dir")
            .unwrap_or_else(|_| "./data/docs".to_string());
        PathBuf::from(dir)
    });
    let snapshot = snapshot.unwrap_or_else(|| {
        let path: String = config
            .get("data.snapshot_path")
            .unwrap_or_else(|_| "./data/index.json".to_string());
        PathBuf::from(path)
    });

    println!("kbase Indexer\n=============");
    println!("Documents directory: {}", data_dir.display());
    println!("Snapshot: {}", snapshot.display());

    let processor = DocumentProcessor::new();
    let chunks = if let Some(limit) = limit {
        println!("🔢 Limiting indexing to {} files", limit);
        processor.process_directory_limited(&data_dir, limit)?
    } else {
        processor.process_directory(&data_dir)?
    };
    if chunks.is_empty() {
        println!("No chunks to index, nothing written.");
        return Ok(());
    }

    let embedder = embedder_from_config(&config)?;
    let pb = ProgressBar::new(chunks.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}")?
            .progress_chars("#>-"),
    );
    let mut embeddings = Vec::with_capacity(chunks.len());
    for chunk in &chunks {
        embeddings.push(embedder.embed(&chunk.content)?);
        pb.inc(1);
    }
    pb.finish_with_message("embeddings done");

    let index = MemoryIndex::new();
    index.index(&chunks, &embeddings)?;
    if let Some(parent) = snapshot.parent() {
        std::fs::create_dir_all(parent)?;
    }
    index.save(&snapshot)?;

    let stats = index.stats()?;
    println!("\n✅ Indexing completed successfully!");
    println!(
        "📊 {} chunks from {} documents (dim {})",
        stats.total_chunks,
        stats.total_documents,
        stats.dim.unwrap_or(0)
    );
    println!("\n💡 To search, use: cargo run --bin kbase-search '<query>'");
    Ok(())
}
