use std::env;
use std::path::PathBuf;

use kbase_core::config::Config;
use kbase_core::types::Meta;
use kbase_embed::embedder_from_config;
use kbase_hybrid::{assemble, rerank, HybridRetriever, DEFAULT_KEYWORD_WEIGHT};
use kbase_index::MemoryIndex;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let config = Config::load()?;

    let args: Vec<String> = env::args().skip(1).collect();
    let mut query = None;
    let mut snapshot = None;
    let mut top_k: usize = config.get("search.top_k").unwrap_or(5);
    let mut keyword_weight: f32 = config
        .get("search.keyword_weight")
        .unwrap_or(DEFAULT_KEYWORD_WEIGHT);
    let mut document = None;
    let mut show_context = false;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--snapshot" | "-s" => {
                if i + 1 < args.len() {
                    snapshot = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--top-k" | "-k" => {
                if let Some(n) = args.get(i + 1).and_then(|v| v.parse::<usize>().ok()) {
                    top_k = n;
                    i += 1;
                } else {
                    eprintln!("Error: --top-k requires a number");
                    std::process::exit(1);
                }
            }
            "--keyword-weight" | "-w" => {
                if let Some(w) = args.get(i + 1).and_then(|v| v.parse::<f32>().ok()) {
                    keyword_weight = w;
                    i += 1;
                } else {
                    eprintln!("Error: --keyword-weight requires a number in [0,1]");
                    std::process::exit(1);
                }
            }
            "--document" | "-d" => {
                if i + 1 < args.len() {
                    document = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--context" => show_context = true,
            _ if !args[i].starts_with('-') => query = Some(args[i].clone()),
            _ => {}
        }
        i += 1;
    }
    let Some(query) = query else {
        eprintln!("Usage: kbase-search <query> [--snapshot path] [--top-k N] [--keyword-weight W] [--document DOC_ID] [--context]");
        std::process::exit(1);
    };
    let snapshot = snapshot.unwrap_or_else(|| {
        let path: String = config
            .get("data.snapshot_path")
            .unwrap_or_else(|_| "./data/index.json".to_string());
        PathBuf::from(path)
    });

    println!("🔍 kbase-search\n===============");
    println!("Query: {}", query);
    println!("Snapshot: {}", snapshot.display());

    let index = MemoryIndex::load(&snapshot)?;
    let embedder = embedder_from_config(&config)?;
    let retriever = HybridRetriever::new(index, embedder);

    let filter = document.map(|doc_id| {
        let mut f = Meta::new();
        f.insert("document_id".to_string(), doc_id);
        f
    });
    let results = retriever.hybrid_search(&query, top_k, filter.as_ref(), keyword_weight)?;
    let ranked = rerank(&query, results);
    let answer = assemble(&ranked);

    if ranked.is_empty() {
        println!("\nNo relevant documents were found for: \"{}\"", query);
        return Ok(());
    }

    println!("\n🔍 Found {} results (keyword weight {:.2})", ranked.len(), keyword_weight);
    for (i, r) in ranked.iter().enumerate() {
        println!(
            "\n  {}. combined={:.4}  semantic={:.4}  keyword={:.1}  id={}  source={}",
            i + 1,
            r.combined_score,
            r.semantic_score,
            r.keyword_score,
            r.id,
            r.source
        );
        let preview: String = r.content.chars().take(120).collect();
        println!("     📝 {}", preview);
    }

    println!("\n📚 Sources:");
    for c in &answer.citations {
        println!("  {} (relevance {:.2})  [{}]", c.source, c.relevance, c.doc_id);
    }
    println!("\n🎯 Confidence: {:.2}", answer.confidence);
    if show_context {
        println!("\n--- context ---\n{}", answer.context);
    }
    Ok(())
}
