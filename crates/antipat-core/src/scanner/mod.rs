use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result as AnyResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod catalogue;
pub mod engine;
pub mod language;
pub mod matcher;
pub mod walker;

pub use language::{Language, LanguageCensus};

/// Ordinal severity of a rule. Declaration order doubles as report sort
/// order, so `Critical` sorts first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Risk {
    Critical,
    High,
    Medium,
}

impl std::fmt::Display for Risk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Risk::Critical => write!(f, "critical"),
            Risk::High => write!(f, "high"),
            Risk::Medium => write!(f, "medium"),
        }
    }
}

/// False-positive suppression predicate attached to a rule.
///
/// Exclusions are evaluated in the order listed on the rule; the first one
/// that holds suppresses the candidate and no further exclusions run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Exclusion {
    /// A line inside the matched span contains the literal needle
    /// (ASCII case-insensitive).
    LineContains { needle: String },
    /// A line inside the bounded window the match was found in contains
    /// the literal needle.
    WindowContains { needle: String },
    /// Any line of the enclosing file contains the literal needle.
    FileContains { needle: String },
    /// The file path (relative to the scan root) matches the glob.
    PathMatches { glob: String },
    /// The line immediately above the match satisfies the regex.
    PrecedingLineMatches { pattern: String },
}

/// Definition of a single anti-pattern detection rule.
///
/// Rules are static catalogue data: duplicated per language, immutable once
/// loaded. Cross-language pattern families reuse the same `id`, but each
/// `(language, id)` pair is a distinct record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    /// Stable identifier, unique within one language's rule set.
    pub id: String,
    /// Human-readable name shown in reports.
    pub display_name: String,
    /// Severity bucket, used only for report ordering.
    pub risk: Risk,
    /// The source language this record applies to.
    pub language: Language,
    /// Filename globs the rule is eligible to scan.
    pub file_globs: Vec<String>,
    /// Regex source evaluated per line, or over a bounded window when
    /// `multiline` is set.
    pub pattern: String,
    /// Whether matches may span multiple source lines.
    pub multiline: bool,
    /// Ordered suppression heuristics.
    pub exclusions: Vec<Exclusion>,
    /// Illustrative offending snippet, embedded verbatim in reports.
    pub before_example: String,
    /// Illustrative fixed snippet, embedded verbatim in reports.
    pub after_example: String,
    /// Prose fix guidance, embedded verbatim in the mitigation document.
    pub guidance: String,
}

impl Rule {
    /// Validate structural invariants of the definition.
    ///
    /// Pattern and glob syntax is checked separately when the rule is
    /// compiled at catalogue load, so a catalogue defect fails the run
    /// before any file is read.
    pub fn validate(&self) -> Result<(), RuleValidationError> {
        if self.id.trim().is_empty() {
            return Err(RuleValidationError::EmptyId);
        }
        if self.pattern.is_empty() {
            return Err(RuleValidationError::EmptyPattern {
                rule_id: self.id.clone(),
            });
        }
        if self.file_globs.is_empty() {
            return Err(RuleValidationError::NoFileGlobs {
                rule_id: self.id.clone(),
            });
        }
        if self.display_name.trim().is_empty() {
            return Err(RuleValidationError::EmptyDisplayName {
                rule_id: self.id.clone(),
            });
        }
        Ok(())
    }
}

/// Errors emitted while validating or compiling rule definitions.
#[derive(Debug, Error, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleValidationError {
    #[error("rule id must not be blank")]
    EmptyId,
    #[error("rule `{rule_id}` pattern must not be empty")]
    EmptyPattern { rule_id: String },
    #[error("rule `{rule_id}` must declare at least one file glob")]
    NoFileGlobs { rule_id: String },
    #[error("rule `{rule_id}` display name must not be blank")]
    EmptyDisplayName { rule_id: String },
    #[error("rule `{rule_id}` has an invalid match pattern: {detail}")]
    InvalidPattern { rule_id: String, detail: String },
    #[error("rule `{rule_id}` has an invalid file glob `{glob}`: {detail}")]
    InvalidGlob {
        rule_id: String,
        glob: String,
        detail: String,
    },
    #[error("rule `{rule_id}` has an invalid exclusion: {detail}")]
    InvalidExclusion { rule_id: String, detail: String },
    #[error("duplicate rule id `{rule_id}` for language {language}")]
    DuplicateId { rule_id: String, language: Language },
}

/// One confirmed, non-excluded match of a rule against a file location.
///
/// Findings are created during a scan pass and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub rule_id: String,
    /// Path relative to the scan root, with `/` separators.
    pub file: String,
    /// 1-based first line of the match.
    pub line: usize,
    /// 1-based last line; equals `line` for single-line matches.
    pub end_line: usize,
    /// Verbatim matched source line(s).
    pub snippet: String,
    pub language: Language,
}

impl Finding {
    /// Validate line-range invariants.
    pub fn validate(&self) -> Result<(), FindingValidationError> {
        if self.line == 0 || self.end_line < self.line {
            return Err(FindingValidationError::InvalidLines {
                rule_id: self.rule_id.clone(),
                line: self.line,
                end_line: self.end_line,
            });
        }
        if self.snippet.is_empty() {
            return Err(FindingValidationError::EmptySnippet {
                rule_id: self.rule_id.clone(),
            });
        }
        Ok(())
    }
}

/// Validation errors for findings emitted by the matcher.
#[derive(Debug, Error, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FindingValidationError {
    #[error("finding for rule `{rule_id}` has invalid line range {line}..={end_line}")]
    InvalidLines {
        rule_id: String,
        line: usize,
        end_line: usize,
    },
    #[error("finding for rule `{rule_id}` carries an empty snippet")]
    EmptySnippet { rule_id: String },
}

/// All findings for one rule within a finished scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleReport {
    pub rule: Rule,
    /// Sorted by (file, line) at aggregation time.
    pub findings: Vec<Finding>,
}

impl RuleReport {
    pub fn occurrence_count(&self) -> usize {
        self.findings.len()
    }
}

/// A file the scan could not read; recorded, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub file: String,
    pub reason: String,
}

/// Aggregate result of one scan-and-report cycle.
///
/// A report is a pure function of the tree snapshot, the catalogue and the
/// detected language; re-running over an unchanged tree yields an identical
/// report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    /// Scan root as given by the caller.
    pub root: String,
    /// The single selected language.
    pub language: Language,
    /// Per-language file counts and tie information.
    pub census: LanguageCensus,
    /// Number of files whose content was matched.
    pub scanned_files: usize,
    pub skipped: Vec<SkippedFile>,
    /// Rules with at least one finding, ordered by risk, then occurrence
    /// count descending, then rule id.
    pub matched: Vec<RuleReport>,
    /// Rules that produced zero findings, in the same ordering.
    pub clean: Vec<Rule>,
}

impl ScanReport {
    pub fn total_findings(&self) -> usize {
        self.matched.iter().map(RuleReport::occurrence_count).sum()
    }

    /// Source-file counts per language, for report headers.
    pub fn file_counts(&self) -> &BTreeMap<Language, usize> {
        &self.census.counts
    }
}

/// Terminal state of a scan run. Every variant maps to a distinct
/// user-visible status; there are no silent outcomes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScanOutcome {
    /// The pipeline ran to completion (findings or clean).
    Report(Box<ScanReport>),
    /// No recognized-language files exist under the root.
    NoLanguageDetected { root: String },
    /// Cancellation was requested; partial results were discarded.
    Cancelled,
}

/// Abstraction over rule catalogues so backends (static tables, files,
/// test doubles) can be swapped transparently.
#[async_trait]
pub trait RuleCatalogue: Send + Sync {
    /// All rules defined for the language, in catalogue order. A language
    /// with no rule set yields an empty vector, not an error.
    async fn rules_for(&self, language: Language) -> AnyResult<Vec<Rule>>;

    /// Fetch a single rule by identifier within a language.
    async fn get_rule(&self, language: Language, rule_id: &str) -> AnyResult<Option<Rule>>;
}

/// Primary scanning interface: root directory in, terminal outcome out.
#[async_trait]
pub trait Scanner: Send + Sync {
    async fn scan(&self, root: &Path) -> AnyResult<ScanOutcome>;
}
