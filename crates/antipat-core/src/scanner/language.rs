use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Source languages the scanner ships rule catalogues for.
///
/// Declaration order is lexicographic on display name; the derived `Ord`
/// is what breaks residual detection ties deterministically.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Go,
    JavaScript,
    Python,
    Rust,
}

impl Language {
    pub const ALL: [Language; 4] = [
        Language::Go,
        Language::JavaScript,
        Language::Python,
        Language::Rust,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Language::Go => "Go",
            Language::JavaScript => "JavaScript",
            Language::Python => "Python",
            Language::Rust => "Rust",
        }
    }

    /// File extensions counted toward this language.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Language::Go => &["go"],
            Language::JavaScript => &["js", "jsx", "ts", "tsx", "mjs", "cjs"],
            Language::Python => &["py", "pyi"],
            Language::Rust => &["rs"],
        }
    }

    /// Ecosystem manifest filenames used to disambiguate count ties.
    pub fn marker_files(&self) -> &'static [&'static str] {
        match self {
            Language::Go => &["go.mod", "go.sum"],
            Language::JavaScript => &["package.json"],
            Language::Python => &["pyproject.toml", "setup.py", "requirements.txt"],
            Language::Rust => &["Cargo.toml"],
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_lowercase();
        Language::ALL
            .into_iter()
            .find(|lang| lang.extensions().contains(&ext.as_str()))
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Language::from_extension)
    }

    fn marker_for_file_name(name: &str) -> Option<Self> {
        Language::ALL
            .into_iter()
            .find(|lang| lang.marker_files().contains(&name))
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of the dominant-language census over a walked tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageCensus {
    /// Source-file counts per language; languages with zero files are
    /// omitted.
    pub counts: BTreeMap<Language, usize>,
    /// Languages for which an ecosystem marker file was seen.
    pub markers: Vec<Language>,
    /// The single selected language, if any source files were recognized.
    pub selected: Option<Language>,
    /// True when the top count was shared and a tie-break was applied.
    pub ambiguous: bool,
}

/// Count recognized source files and marker manifests, then select the
/// dominant language.
///
/// The language with the strictly highest source-file count wins. On a
/// tie, a language that is the only tied candidate with a marker file
/// present wins; otherwise the lexicographically smallest name does. Both
/// tie cases set `ambiguous`.
pub fn census<'a, I>(paths: I) -> LanguageCensus
where
    I: IntoIterator<Item = &'a Path>,
{
    let mut counts: BTreeMap<Language, usize> = BTreeMap::new();
    let mut markers: Vec<Language> = Vec::new();

    for path in paths {
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if let Some(lang) = Language::marker_for_file_name(name) {
                if !markers.contains(&lang) {
                    markers.push(lang);
                }
            }
        }
        if let Some(lang) = Language::from_path(path) {
            *counts.entry(lang).or_insert(0) += 1;
        }
    }
    markers.sort();

    let top = counts.values().copied().max().unwrap_or(0);
    if top == 0 {
        return LanguageCensus {
            counts,
            markers,
            selected: None,
            ambiguous: false,
        };
    }

    let tied: Vec<Language> = counts
        .iter()
        .filter(|(_, count)| **count == top)
        .map(|(lang, _)| *lang)
        .collect();

    let (selected, ambiguous) = if tied.len() == 1 {
        (tied[0], false)
    } else {
        let with_marker: Vec<Language> = tied
            .iter()
            .copied()
            .filter(|lang| markers.contains(lang))
            .collect();
        let pick = if with_marker.len() == 1 {
            with_marker[0]
        } else {
            // BTreeMap iteration already yields languages in name order.
            tied[0]
        };
        (pick, true)
    };

    debug!(language = %selected, files = top, ambiguous, "language census completed");

    LanguageCensus {
        counts,
        markers,
        selected: Some(selected),
        ambiguous,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn recognizes_extensions_case_insensitively() {
        assert_eq!(Language::from_extension("PY"), Some(Language::Python));
        assert_eq!(Language::from_extension("tsx"), Some(Language::JavaScript));
        assert_eq!(Language::from_extension("rs"), Some(Language::Rust));
        assert_eq!(Language::from_extension("toml"), None);
    }

    #[test]
    fn selects_strictly_dominant_language() {
        let files = paths(&["a.py", "b.py", "lib/c.py", "util.js"]);
        let census = census(files.iter().map(PathBuf::as_path));
        assert_eq!(census.selected, Some(Language::Python));
        assert!(!census.ambiguous);
        assert_eq!(census.counts[&Language::Python], 3);
        assert_eq!(census.counts[&Language::JavaScript], 1);
    }

    #[test]
    fn empty_tree_selects_nothing() {
        let files = paths(&["README.md", "notes.txt"]);
        let census = census(files.iter().map(PathBuf::as_path));
        assert_eq!(census.selected, None);
        assert!(census.counts.is_empty());
    }

    #[test]
    fn marker_file_breaks_tie() {
        let files = paths(&["a.py", "b.js", "go.mod", "package.json"]);
        let census = census(files.iter().map(PathBuf::as_path));
        // Python and JavaScript tie at one file each; only JavaScript has
        // a marker among the tied candidates.
        assert_eq!(census.selected, Some(Language::JavaScript));
        assert!(census.ambiguous);
    }

    #[test]
    fn unresolved_tie_falls_back_to_name_order() {
        let files = paths(&["a.py", "b.rs"]);
        let census = census(files.iter().map(PathBuf::as_path));
        assert_eq!(census.selected, Some(Language::Python));
        assert!(census.ambiguous);
    }

    #[test]
    fn tie_break_is_stable_across_runs() {
        let files = paths(&["one.go", "two.go", "three.py", "four.py"]);
        let first = census(files.iter().map(PathBuf::as_path));
        let second = census(files.iter().map(PathBuf::as_path));
        assert_eq!(first, second);
        assert_eq!(first.selected, Some(Language::Go));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn arbitrary_paths() -> impl Strategy<Value = Vec<PathBuf>> {
            let ext = prop_oneof![
                Just("py"),
                Just("rs"),
                Just("go"),
                Just("js"),
                Just("md"),
                Just("txt"),
            ];
            proptest::collection::vec(
                ("[a-z]{1,8}", ext).prop_map(|(stem, ext)| PathBuf::from(format!("{stem}.{ext}"))),
                0..24,
            )
        }

        proptest! {
            #[test]
            fn census_is_order_independent(mut files in arbitrary_paths()) {
                let forward = census(files.iter().map(PathBuf::as_path));
                files.reverse();
                let reversed = census(files.iter().map(PathBuf::as_path));
                prop_assert_eq!(forward, reversed);
            }

            #[test]
            fn selected_language_always_holds_the_top_count(files in arbitrary_paths()) {
                let result = census(files.iter().map(PathBuf::as_path));
                match result.selected {
                    None => prop_assert!(result.counts.is_empty()),
                    Some(selected) => {
                        let top = *result.counts.values().max().unwrap();
                        prop_assert_eq!(result.counts[&selected], top);
                    }
                }
            }
        }
    }

    #[test]
    fn marker_files_are_recorded_without_counting_as_sources() {
        let files = paths(&["Cargo.toml", "src/main.rs"]);
        let census = census(files.iter().map(PathBuf::as_path));
        assert_eq!(census.selected, Some(Language::Rust));
        assert_eq!(census.counts[&Language::Rust], 1);
        assert_eq!(census.markers, vec![Language::Rust]);
    }
}
