use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};
use walkdir::WalkDir;

use super::language::Language;
use super::SkippedFile;

/// Extensions that are never worth reading, whatever the census says.
const BINARY_EXTENSIONS: &[&str] = &[
    "exe", "dll", "so", "dylib", "bin", "o", "a", "jar", "zip", "tar", "gz", "bz2", "xz", "7z",
    "pdf", "jpg", "jpeg", "png", "gif", "ico", "svg", "webp", "mp3", "mp4", "woff", "woff2",
    "ttf", "otf", "wasm",
];

/// Tunable traversal limits; defaults match common project hygiene.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkerConfig {
    pub max_depth: usize,
    pub max_file_size: u64,
    pub exclude_dirs: Vec<String>,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            max_depth: 64,
            max_file_size: 2 * 1024 * 1024,
            exclude_dirs: vec![
                ".git".to_string(),
                "node_modules".to_string(),
                "target".to_string(),
                "__pycache__".to_string(),
                ".venv".to_string(),
                "venv".to_string(),
                "dist".to_string(),
                "build".to_string(),
                "vendor".to_string(),
            ],
        }
    }
}

/// One enumerated file. `language` is set when the extension belongs to a
/// supported language; marker manifests and other text files carry `None`
/// but still feed the census.
#[derive(Debug, Clone)]
pub struct WalkedFile {
    pub path: PathBuf,
    /// Path relative to the scan root, `/`-separated.
    pub rel_path: String,
    pub language: Option<Language>,
}

/// Everything the walk produced: candidate files plus entries that could
/// not be visited.
#[derive(Debug, Default)]
pub struct WalkListing {
    pub files: Vec<WalkedFile>,
    pub skipped: Vec<SkippedFile>,
}

/// Enumerates candidate files under a root directory.
///
/// The walker only lists; it never reads file content. Entries it cannot
/// stat are recorded as skipped, not raised.
pub struct FileWalker {
    config: WalkerConfig,
}

impl FileWalker {
    pub fn new(config: WalkerConfig) -> Self {
        Self { config }
    }

    fn is_excluded_dir(&self, name: &str) -> bool {
        self.config.exclude_dirs.iter().any(|d| d == name)
    }

    fn is_binary(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| BINARY_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
            .unwrap_or(false)
    }

    /// Walk the tree, collecting source files, marker manifests and
    /// skipped entries. Results are sorted by relative path so downstream
    /// phases see a stable order.
    #[instrument(skip(self), fields(root = %root.display(), max_depth = self.config.max_depth))]
    pub fn walk(&self, root: &Path) -> WalkListing {
        let mut listing = WalkListing::default();

        let walker = WalkDir::new(root)
            .max_depth(self.config.max_depth)
            .into_iter()
            .filter_entry(|entry| {
                if entry.depth() == 0 || !entry.file_type().is_dir() {
                    return true;
                }
                match entry.file_name().to_str() {
                    Some(name) if self.is_excluded_dir(name) => {
                        trace!(directory = %name, "excluding directory");
                        false
                    }
                    _ => true,
                }
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let file = err
                        .path()
                        .map(|p| rel_display(root, p))
                        .unwrap_or_else(|| root.display().to_string());
                    listing.skipped.push(SkippedFile {
                        file,
                        reason: err.to_string(),
                    });
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if Self::is_binary(path) {
                trace!(file = %path.display(), "skipping binary file");
                continue;
            }
            let rel_path = rel_display(root, path);
            let language = Language::from_path(path);
            if language.is_some() {
                match entry.metadata() {
                    Ok(meta) if meta.len() > self.config.max_file_size => {
                        trace!(file = %rel_path, size = meta.len(), "file exceeds size limit");
                        listing.skipped.push(SkippedFile {
                            file: rel_path,
                            reason: format!(
                                "file size exceeds limit of {} bytes",
                                self.config.max_file_size
                            ),
                        });
                        continue;
                    }
                    Ok(_) => {}
                    Err(err) => {
                        listing.skipped.push(SkippedFile {
                            file: rel_path,
                            reason: err.to_string(),
                        });
                        continue;
                    }
                }
            }
            listing.files.push(WalkedFile {
                path: path.to_path_buf(),
                rel_path,
                language,
            });
        }

        listing.files.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
        listing.skipped.sort_by(|a, b| a.file.cmp(&b.file));
        debug!(
            files = listing.files.len(),
            skipped = listing.skipped.len(),
            "directory walk completed"
        );
        listing
    }
}

fn rel_display(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let display = rel.display().to_string();
    if std::path::MAIN_SEPARATOR == '/' {
        display
    } else {
        display.replace(std::path::MAIN_SEPARATOR, "/")
    }
}
