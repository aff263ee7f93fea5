//! Document discovery and paragraph chunking.

use crate::config::RetrievalConfig;
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// One retrievable paragraph. `text` starts with a `Source: <label> (<file>)` header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    pub source_label: String,
    pub origin_file: String,
}

impl Chunk {
    pub fn new(body: &str, source_label: &str, origin_file: &str) -> Self {
        Self {
            text: format!("Source: {source_label} ({origin_file})\n{body}"),
            source_label: source_label.to_string(),
            origin_file: origin_file.to_string(),
        }
    }

    /// Paragraph text without the provenance header.
    pub fn body(&self) -> &str {
        self.text.split_once('\n').map(|(_, body)| body).unwrap_or("")
    }
}

/// Loader output: chunks in discovery order plus the files they came from.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    pub chunks: Vec<Chunk>,
    pub files: Vec<PathBuf>,
}

impl Corpus {
    pub fn is_empty(&self) -> bool { self.chunks.is_empty() }
}

#[derive(Debug, Clone)]
pub struct CorpusLoader {
    recursive_extension: String,
    legacy_extension: String,
    citation_prefix: String,
}

impl Default for CorpusLoader {
    fn default() -> Self { Self::from_config(&RetrievalConfig::default()) }
}

impl CorpusLoader {
    pub fn from_config(config: &RetrievalConfig) -> Self {
        Self {
            recursive_extension: config.recursive_extension.clone(),
            legacy_extension: config.legacy_extension.clone(),
            citation_prefix: config.citation_prefix.clone(),
        }
    }

    /// Reads every matching document under `root` and splits it into chunks.
    ///
    /// A missing root yields an empty corpus. Any unreadable file aborts the whole load.
    pub fn load<P: AsRef<Path>>(&self, root: P) -> Result<Corpus> {
        let root = root.as_ref();
        let files = self.discover(root)?;
        let mut chunks = Vec::new();
        for path in &files {
            let text = fs::read_to_string(path).map_err(|e| Error::corpus(path, e))?;
            let text = normalize_newlines(&text);
            let filename = path.file_name().map(|f| f.to_string_lossy().into_owned()).unwrap_or_default();
            let label = source_label(&filename, &self.citation_prefix);
            let before = chunks.len();
            chunks.extend(split_paragraphs(&text).map(|p| Chunk::new(p, &label, &filename)));
            tracing::debug!(file = %path.display(), chunks = chunks.len() - before, "chunked document");
        }
        tracing::info!(root = %root.display(), num_files = files.len(), num_chunks = chunks.len(), "loaded corpus");
        Ok(Corpus { chunks, files })
    }

    /// Recursive matches sorted by path, followed by top-level legacy matches sorted by name.
    pub fn discover(&self, root: &Path) -> Result<Vec<PathBuf>> {
        if !root.is_dir() {
            tracing::warn!(root = %root.display(), "corpus directory not found");
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e));
        for entry in walker {
            let entry = entry.map_err(|e| walk_error(root, e))?;
            // Symlinked documents count; `path().is_file()` follows the link.
            if entry.path().is_file() && has_extension(entry.path(), &self.recursive_extension) {
                files.push(entry.into_path());
            }
        }

        let mut legacy = Vec::new();
        for entry in fs::read_dir(root).map_err(|e| Error::corpus(root, e))? {
            let entry = entry.map_err(|e| Error::corpus(root, e))?;
            let path = entry.path();
            let hidden = entry.file_name().to_string_lossy().starts_with('.');
            if !hidden && path.is_file() && has_extension(&path, &self.legacy_extension) {
                legacy.push(path);
            }
        }
        legacy.sort();
        files.extend(legacy);
        Ok(files)
    }
}

/// `Doc3_grace_period.md` becomes `[Doc3]`; other filenames are used as-is.
pub fn source_label(filename: &str, citation_prefix: &str) -> String {
    if filename.starts_with(citation_prefix) {
        let id = filename.split('_').next().unwrap_or(filename);
        format!("[{id}]")
    } else {
        filename.to_string()
    }
}

/// Blank-line separated paragraphs, trimmed, empties dropped.
pub fn split_paragraphs(text: &str) -> impl Iterator<Item = &str> {
    text.split("\n\n").map(str::trim).filter(|p| !p.is_empty())
}

/// CRLF and lone CR line endings become `\n`, so paragraph breaks look the same everywhere.
pub fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

fn walk_error(root: &Path, err: walkdir::Error) -> Error {
    let path = err.path().unwrap_or(root).to_path_buf();
    Error::corpus(path, err.into())
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().and_then(|s| s.to_str()) == Some(ext)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_str().map(|s| s.starts_with('.')).unwrap_or(false)
}
