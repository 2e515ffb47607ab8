pub mod report;
pub mod scanner;

pub use report::{render_mitigation, render_summary, OutputFormat, MITIGATION_FILE_NAME};
pub use scanner::{
    catalogue::StaticCatalogue, engine::CancelFlag, engine::DefaultScanner,
    walker::WalkerConfig, Exclusion, Finding, FindingValidationError, Language, LanguageCensus,
    Risk, Rule, RuleCatalogue, RuleReport, RuleValidationError, ScanOutcome, ScanReport,
    Scanner, SkippedFile,
};
