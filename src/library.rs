//! Page listing for a manga folder and how much of it has been translated.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use crate::consts::IMAGE_EXTENSIONS;

/// Whether `path` has one of the recognised image extensions.
pub fn is_page(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Image files directly inside `folder`, sorted by path.
pub fn list_pages(folder: &Path) -> io::Result<Vec<PathBuf>> {
    let mut pages = Vec::new();
    for entry in std::fs::read_dir(folder)? {
        let path = entry?.path();
        if path.is_file() && is_page(&path) {
            pages.push(path);
        }
    }
    pages.sort();
    Ok(pages)
}

/// Pages whose file name contains `query`, ignoring case.
pub fn filter_pages<'a>(pages: &'a [PathBuf], query: &str) -> Vec<&'a PathBuf> {
    let query = query.trim().to_lowercase();
    pages
        .iter()
        .filter(|page| {
            query.is_empty()
                || page
                    .file_name()
                    .map(|name| name.to_string_lossy().to_lowercase().contains(&query))
                    .unwrap_or(false)
        })
        .collect()
}

/// Where the engine writes the translated version of `page`.
pub fn translated_output_for(output_dir: &Path, page: &Path) -> Option<PathBuf> {
    page.file_name().map(|name| output_dir.join(name))
}

/// Translated pages out of the total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub done: usize,
    pub total: usize,
}

impl Progress {
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.done == self.total
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.done, self.total)
    }
}

/// Count pages that already have a translated counterpart in `output_dir`.
pub fn progress(pages: &[PathBuf], output_dir: &Path) -> Progress {
    let done = pages
        .iter()
        .filter_map(|page| translated_output_for(output_dir, page))
        .filter(|out| out.exists())
        .count();
    Progress {
        done,
        total: pages.len(),
    }
}
