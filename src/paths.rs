//! Path normalisation for anything handed to the engine.
//!
//! The engine may run from its own checkout directory, so every path on its
//! command line must already be absolute. [`resolve`] never fails: paths that
//! do not exist yet (an output folder, say) are still made absolute, with the
//! existing part of the path canonicalised.

use std::path::{Component, Path, PathBuf};

/// Replace a leading `~` with the user's home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(first)) if first == "~" => match dirs::home_dir() {
            Some(home) => home.join(components.as_path()),
            None => path.to_path_buf(),
        },
        _ => path.to_path_buf(),
    }
}

/// Expand, absolutise and canonicalise `path` as far as the filesystem allows.
pub fn resolve(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    let path = if path.as_os_str().is_empty() {
        Path::new(".")
    } else {
        path
    };

    let expanded = expand_home(path);
    let absolute = std::path::absolute(&expanded).unwrap_or(expanded);
    canonicalize_existing_prefix(&absolute)
}

/// Canonicalise the longest existing ancestor, so symlinks are followed
/// before any `..` after them, then fold the missing remainder onto it.
fn canonicalize_existing_prefix(path: &Path) -> PathBuf {
    for ancestor in path.ancestors() {
        if let Ok(canonical) = ancestor.canonicalize() {
            return match path.strip_prefix(ancestor) {
                Ok(rest) => fold(canonical, rest),
                Err(_) => canonical,
            };
        }
    }
    fold(PathBuf::new(), path)
}

/// Push `rest` onto `base`, dropping `.` and popping on `..`.
fn fold(mut base: PathBuf, rest: &Path) -> PathBuf {
    for component in rest.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                base.pop();
            }
            other => base.push(other.as_os_str()),
        }
    }
    base
}
