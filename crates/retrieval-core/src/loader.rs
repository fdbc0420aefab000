use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::error::{Error, Result};
use crate::traits::FileLoader;
use crate::types::{sanitize_id, Document};

/// Reads `.txt` and `.md` files, decoding invalid UTF-8 lossily.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextLoader;

impl FileLoader for PlainTextLoader {
    fn supports(&self, path: &Path) -> bool {
        matches!(path.extension().and_then(|s| s.to_str()), Some("txt" | "md"))
    }

    fn extract(&self, path: &Path) -> anyhow::Result<String> {
        let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        match String::from_utf8(bytes) {
            Ok(text) => Ok(text),
            Err(e) => Ok(String::from_utf8_lossy(e.as_bytes()).into_owned()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct LoadReport {
    pub documents: Vec<Document>,
    pub skipped: Vec<SkippedFile>,
}

/// Collect documents from a single file or a directory tree.
///
/// Files the loader does not support are ignored; files it fails to extract
/// are reported in [`LoadReport::skipped`] and do not abort the walk.
pub fn load_documents(root: &Path, loader: &dyn FileLoader) -> Result<LoadReport> {
    if !root.exists() {
        return Err(Error::NotFound(root.display().to_string()));
    }
    let mut report = LoadReport::default();
    for path in list_files(root, loader) {
        match loader.extract(&path) {
            Ok(text) => report.documents.push(Document { id: document_id(root, &path), text }),
            Err(e) => report.skipped.push(SkippedFile { path, reason: format!("{e:#}") }),
        }
    }
    Ok(report)
}

fn list_files(root: &Path, loader: &dyn FileLoader) -> Vec<PathBuf> {
    if root.is_file() {
        return if loader.supports(root) { vec![root.to_path_buf()] } else { vec![] };
    }
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && loader.supports(e.path()))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

/// Path relative to `root` without extension; a lone file uses its stem.
fn document_id(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).ok().filter(|p| !p.as_os_str().is_empty());
    let id = match relative {
        Some(rel) => rel.with_extension("").to_string_lossy().into_owned(),
        None => path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default(),
    };
    sanitize_id(&id)
}
