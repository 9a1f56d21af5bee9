//! Document ingestion: walks a directory of plain-text files and turns each
//! file into identified, chunked [`Chunk`]s ready for embedding.
//!
//! Document identity is content-addressed: the digest of the filename plus
//! the first 1000 characters of text. Re-ingesting an unchanged file yields
//! the same `doc_id`; renaming or editing it yields a new one.

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

use crate::types::{Chunk, Meta};

/// Characters of leading text hashed into the document id.
const DOC_ID_HEAD_CHARS: usize = 1000;

#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    /// Paragraphs above this word count are split with overlap.
    pub max_words: usize,
    pub overlap_percent: f32,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { max_words: 300, overlap_percent: 0.2 }
    }
}

#[derive(Default)]
pub struct DocumentProcessor {
    chunking: ChunkingConfig,
}

impl DocumentProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(chunking: ChunkingConfig) -> Self {
        Self { chunking }
    }

    /// Process every `.txt`/`.md` file under `data_dir` (sorted for
    /// determinism). Unreadable files are reported and skipped.
    pub fn process_directory(&self, data_dir: &Path) -> Result<Vec<Chunk>> {
        let files = self.list_text_files(data_dir);
        if files.is_empty() {
            info!("no text files found under {}", data_dir.display());
            return Ok(vec![]);
        }
        let mut all_chunks = Vec::new();
        let mut processed = 0usize;
        for file_path in &files {
            match self.process_file(file_path) {
                Ok(chunks) => {
                    debug!("{} -> {} chunks", file_path.display(), chunks.len());
                    all_chunks.extend(chunks);
                    processed += 1;
                }
                Err(e) => warn!("skipping {}: {e}", file_path.display()),
            }
        }
        info!("processed {} files into {} chunks", processed, all_chunks.len());
        Ok(all_chunks)
    }

    /// Like [`process_directory`](Self::process_directory) but stops after
    /// `limit` files.
    pub fn process_directory_limited(&self, data_dir: &Path, limit: usize) -> Result<Vec<Chunk>> {
        let mut files = self.list_text_files(data_dir);
        if files.len() > limit {
            files.truncate(limit);
            info!("limited to first {} files", limit);
        }
        let mut all_chunks = Vec::new();
        for file_path in &files {
            match self.process_file(file_path) {
                Ok(chunks) => all_chunks.extend(chunks),
                Err(e) => warn!("skipping {}: {e}", file_path.display()),
            }
        }
        Ok(all_chunks)
    }

    /// Process a single file into chunks. Empty files produce no chunks.
    pub fn process_file(&self, file_path: &Path) -> Result<Vec<Chunk>> {
        let content = read_file_content(file_path)?;
        let source = file_path.to_string_lossy().to_string();
        Ok(self.process_text(&content, &source))
    }

    /// Chunk raw text under the given source name. The unit of splitting is
    /// the paragraph; oversized paragraphs are split by word count with
    /// overlap so context survives the cut.
    pub fn process_text(&self, text: &str, source: &str) -> Vec<Chunk> {
        let filename = Path::new(source)
            .file_name()
            .map_or_else(|| source.to_string(), |n| n.to_string_lossy().to_string());
        let doc_id = document_id(&filename, text);
        let indexed_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        let mut chunks = Vec::new();
        let mut chunk_index = 0usize;
        for paragraph in text.split("\n\n") {
            let paragraph = paragraph.trim();
            if paragraph.is_empty() {
                continue;
            }
            for piece in self.split_paragraph(paragraph) {
                let mut metadata = Meta::new();
                metadata.insert("filename".to_string(), filename.clone());
                metadata.insert("indexed_at".to_string(), indexed_at.to_string());
                chunks.push(Chunk {
                    id: format!("{doc_id}_{chunk_index}"),
                    doc_id: doc_id.clone(),
                    source: source.to_string(),
                    content: piece,
                    chunk_index,
                    metadata,
                });
                chunk_index += 1;
            }
        }
        chunks
    }

    fn split_paragraph(&self, paragraph: &str) -> Vec<String> {
        let words: Vec<&str> = paragraph.split_whitespace().collect();
        if words.len() <= self.chunking.max_words {
            return vec![paragraph.to_string()];
        }
        let per_chunk = self.chunking.max_words;
        let overlap = ((per_chunk as f32) * self.chunking.overlap_percent) as usize;
        let step = per_chunk.saturating_sub(overlap).max(1);
        let mut pieces = Vec::new();
        let mut start = 0usize;
        while start < words.len() {
            let end = (start + per_chunk).min(words.len());
            pieces.push(words[start..end].join(" "));
            if end >= words.len() {
                break;
            }
            start += step;
        }
        pieces
    }

    fn list_text_files(&self, root: &Path) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for entry in walkdir::WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            match path.extension().and_then(|s| s.to_str()) {
                Some("txt" | "md") => files.push(path.to_path_buf()),
                _ => {}
            }
        }
        files.sort();
        files
    }
}

/// Content-addressed document identity: digest of `{filename}:{head}` where
/// head is the first [`DOC_ID_HEAD_CHARS`] characters of the text.
pub fn document_id(filename: &str, text: &str) -> String {
    let head: String = text.chars().take(DOC_ID_HEAD_CHARS).collect();
    let mut hasher = blake3::Hasher::new();
    hasher.update(filename.as_bytes());
    hasher.update(b":");
    hasher.update(head.as_bytes());
    // 128-bit hex prefix keeps chunk ids readable
    hasher.finalize().to_hex().as_str()[..32].to_string()
}

fn read_file_content(file_path: &Path) -> Result<String> {
    match fs::read_to_string(file_path) {
        Ok(content) => Ok(content),
        Err(_) => Ok(String::from_utf8_lossy(&fs::read(file_path)?).to_string()),
    }
}
