use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use rayon::prelude::*;
use tracing::{debug, instrument, trace};

use super::catalogue::StaticCatalogue;
use super::language::census;
use super::matcher::CompiledRule;
use super::walker::{FileWalker, WalkerConfig};
use super::{
    Finding, RuleCatalogue, RuleReport, ScanOutcome, ScanReport, Scanner, SkippedFile,
};

/// Cooperative cancellation handle for an in-flight scan. Cancelling stops
/// dispatch of new per-file units; partial results are discarded.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

enum FileScan {
    Scanned(Vec<Finding>),
    Skipped(SkippedFile),
    Cancelled,
}

/// Scanner implementation driving the full pipeline: walk, census, rule
/// compilation, parallel per-file matching, deterministic aggregation.
pub struct DefaultScanner<C: RuleCatalogue> {
    catalogue: Arc<C>,
    walker_config: WalkerConfig,
    cancel: CancelFlag,
}

impl<C: RuleCatalogue> DefaultScanner<C> {
    pub fn new(catalogue: Arc<C>) -> Self {
        Self {
            catalogue,
            walker_config: WalkerConfig::default(),
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Handle callers can use to abort the scan from another task.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }
}

impl DefaultScanner<StaticCatalogue> {
    /// Scanner over the built-in rule catalogue.
    pub fn builtin() -> Self {
        Self::new(Arc::new(StaticCatalogue::new()))
    }
}

#[async_trait::async_trait]
impl<C> Scanner for DefaultScanner<C>
where
    C: RuleCatalogue + 'static,
{
    #[instrument(name = "scan_tree", skip(self, root), fields(root = %root.display()))]
    async fn scan(&self, root: &Path) -> Result<ScanOutcome> {
        let listing = FileWalker::new(self.walker_config.clone()).walk(root);
        let census = census(listing.files.iter().map(|file| file.path.as_path()));

        let Some(language) = census.selected else {
            debug!("no recognized-language files under root");
            return Ok(ScanOutcome::NoLanguageDetected {
                root: root.display().to_string(),
            });
        };

        let rules = self.catalogue.rules_for(language).await?;
        trace!(language = %language, rules = rules.len(), "loaded rule set");
        // Compile before any file content is read so a catalogue defect
        // fails the run once, not once per file.
        let compiled = rules
            .into_iter()
            .map(CompiledRule::compile)
            .collect::<Result<Vec<_>, _>>()?;

        let targets: Vec<_> = listing
            .files
            .iter()
            .filter(|file| file.language == Some(language))
            .collect();

        let cancel = &self.cancel;
        let per_file: Vec<FileScan> = targets
            .par_iter()
            .map(|file| {
                if cancel.is_cancelled() {
                    return FileScan::Cancelled;
                }
                match fs::read_to_string(&file.path) {
                    Err(err) => FileScan::Skipped(SkippedFile {
                        file: file.rel_path.clone(),
                        reason: err.to_string(),
                    }),
                    Ok(content) => {
                        let findings = compiled
                            .iter()
                            .filter(|rule| rule.eligible(&file.rel_path))
                            .flat_map(|rule| rule.match_file(&file.rel_path, &content))
                            .collect();
                        FileScan::Scanned(findings)
                    }
                }
            })
            .collect();

        if cancel.is_cancelled() {
            debug!("scan cancelled; discarding partial results");
            return Ok(ScanOutcome::Cancelled);
        }

        let mut skipped = listing.skipped;
        let mut findings = Vec::new();
        let mut scanned_files = 0usize;
        for result in per_file {
            match result {
                FileScan::Scanned(file_findings) => {
                    scanned_files += 1;
                    findings.extend(file_findings);
                }
                FileScan::Skipped(skip) => skipped.push(skip),
                FileScan::Cancelled => {}
            }
        }
        skipped.sort_by(|a, b| a.file.cmp(&b.file));

        // Ordering is imposed here, independent of completion order.
        findings.sort_by(|a, b| {
            a.rule_id
                .cmp(&b.rule_id)
                .then_with(|| a.file.cmp(&b.file))
                .then_with(|| a.line.cmp(&b.line))
        });
        let mut grouped: BTreeMap<String, Vec<Finding>> = BTreeMap::new();
        for finding in findings {
            grouped.entry(finding.rule_id.clone()).or_default().push(finding);
        }

        let mut matched = Vec::new();
        let mut clean = Vec::new();
        for rule in compiled.into_iter().map(|compiled| compiled.rule) {
            match grouped.remove(&rule.id) {
                Some(rule_findings) => matched.push(RuleReport {
                    rule,
                    findings: rule_findings,
                }),
                None => clean.push(rule),
            }
        }
        matched.sort_by(|a, b| {
            a.rule
                .risk
                .cmp(&b.rule.risk)
                .then_with(|| b.findings.len().cmp(&a.findings.len()))
                .then_with(|| a.rule.id.cmp(&b.rule.id))
        });
        clean.sort_by(|a, b| a.risk.cmp(&b.risk).then_with(|| a.id.cmp(&b.id)));

        debug!(
            language = %language,
            scanned = scanned_files,
            findings = matched.iter().map(RuleReport::occurrence_count).sum::<usize>(),
            skipped = skipped.len(),
            "scan completed"
        );

        Ok(ScanOutcome::Report(Box::new(ScanReport {
            root: root.display().to_string(),
            language,
            census,
            scanned_files,
            skipped,
            matched,
            clean,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::Language;
    use std::path::PathBuf;

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    fn scan(root: &Path) -> ScanOutcome {
        let scanner = DefaultScanner::builtin();
        futures_block_on(scanner.scan(root)).unwrap()
    }

    // Small current-thread executor shim so unit tests stay sync.
    fn futures_block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(future)
    }

    #[test]
    fn empty_tree_reports_no_language() {
        let temp = tempfile::tempdir().unwrap();
        write(temp.path(), "README.md", "# nothing to see\n");
        let outcome = scan(temp.path());
        assert!(matches!(outcome, ScanOutcome::NoLanguageDetected { .. }));
    }

    #[test]
    fn secret_fixture_yields_exactly_one_finding() {
        let temp = tempfile::tempdir().unwrap();
        write(
            temp.path(),
            "src/config.py",
            "import os\npassword = \"super-secret-password\"\n",
        );
        let ScanOutcome::Report(report) = scan(temp.path()) else {
            panic!("expected a report");
        };
        assert_eq!(report.language, Language::Python);
        let secret = report
            .matched
            .iter()
            .find(|r| r.rule.id == "HARDCODED_SECRET")
            .expect("secret rule should fire");
        assert_eq!(secret.occurrence_count(), 1);
        assert_eq!(secret.findings[0].file, "src/config.py");
        assert_eq!(secret.findings[0].line, 2);
    }

    #[test]
    fn env_lookup_variant_is_not_flagged() {
        let temp = tempfile::tempdir().unwrap();
        write(
            temp.path(),
            "src/config.py",
            "import os\npassword = os.environ[\"DB_PASSWORD\"]\n",
        );
        let ScanOutcome::Report(report) = scan(temp.path()) else {
            panic!("expected a report");
        };
        assert!(report
            .matched
            .iter()
            .all(|r| r.rule.id != "HARDCODED_SECRET"));
        assert!(report.clean.iter().any(|r| r.id == "HARDCODED_SECRET"));
    }

    #[test]
    fn every_loaded_rule_lands_in_matched_or_clean() {
        let temp = tempfile::tempdir().unwrap();
        write(temp.path(), "lib.py", "def add(a, b):\n    return a + b\n");
        let ScanOutcome::Report(report) = scan(temp.path()) else {
            panic!("expected a report");
        };
        let total = report.matched.len() + report.clean.len();
        let python_rules = crate::scanner::catalogue::all_rules()
            .iter()
            .filter(|r| r.language == Language::Python)
            .count();
        assert_eq!(total, python_rules);
    }

    #[test]
    fn rescanning_unchanged_tree_is_deterministic() {
        let temp = tempfile::tempdir().unwrap();
        write(
            temp.path(),
            "a.py",
            "password = \"super-secret-password\"\nfrom utils import *\n",
        );
        write(
            temp.path(),
            "b.py",
            "token = \"abcd1234efgh\"\ndef f(xs=[]):\n    return xs\n",
        );
        let first = scan(temp.path());
        let second = scan(temp.path());
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn matched_rules_are_ordered_by_risk_then_count() {
        let temp = tempfile::tempdir().unwrap();
        // One critical finding, two medium wildcard imports.
        write(
            temp.path(),
            "app.py",
            "from utils import *\nfrom helpers import *\npassword = \"super-secret-password\"\n",
        );
        let ScanOutcome::Report(report) = scan(temp.path()) else {
            panic!("expected a report");
        };
        let ids: Vec<_> = report.matched.iter().map(|r| r.rule.id.as_str()).collect();
        assert_eq!(ids, vec!["HARDCODED_SECRET", "WILDCARD_IMPORT"]);
    }

    #[test]
    fn unreadable_file_is_skipped_not_fatal() {
        let temp = tempfile::tempdir().unwrap();
        write(temp.path(), "ok.py", "x = 1\n");
        // Invalid UTF-8 makes read_to_string fail for this one file.
        fs::write(temp.path().join("garbled.py"), [0xFF, 0xFE, 0x00, 0x80]).unwrap();

        let ScanOutcome::Report(report) = scan(temp.path()) else {
            panic!("expected a report");
        };
        assert_eq!(report.scanned_files, 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].file, "garbled.py");
        assert!(!report.skipped[0].reason.is_empty());
    }

    #[test]
    fn cancelled_scan_discards_partial_results() {
        let temp = tempfile::tempdir().unwrap();
        write(temp.path(), "a.py", "x = 1\n");
        let scanner = DefaultScanner::builtin();
        scanner.cancel_flag().cancel();
        let outcome = futures_block_on(scanner.scan(temp.path())).unwrap();
        assert!(matches!(outcome, ScanOutcome::Cancelled));
    }

    #[test]
    fn findings_use_relative_paths() {
        let temp = tempfile::tempdir().unwrap();
        write(
            temp.path(),
            "deep/nested/mod.py",
            "secret = \"super-secret-value\"\n",
        );
        let ScanOutcome::Report(report) = scan(temp.path()) else {
            panic!("expected a report");
        };
        let finding = &report.matched[0].findings[0];
        assert_eq!(finding.file, "deep/nested/mod.py");
        assert_eq!(PathBuf::from(&finding.file), PathBuf::from("deep/nested/mod.py"));
    }
}
