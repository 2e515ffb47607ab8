use std::fmt::Write;

use crate::scanner::{Finding, RuleReport, ScanOutcome, ScanReport};

/// Name of the generated mitigation artifact, written to the scan root
/// and overwritten on each run.
pub const MITIGATION_FILE_NAME: &str = "NEGATIVE_PATTERNS_MITIGATION.md";

/// Cap on `file:line` locations listed per rule in the console summary.
/// When the cap applies, the omitted count is printed alongside it. The
/// mitigation document is never capped.
pub const MAX_LOCATIONS_LISTED: usize = 50;

/// Format styles supported by the summary renderer.
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Render the console-facing findings summary for a scan outcome.
pub fn render_summary(outcome: &ScanOutcome, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(outcome)?),
        OutputFormat::Human => match outcome {
            ScanOutcome::Report(report) => render_human(report),
            ScanOutcome::NoLanguageDetected { root } => Ok(format!(
                "No supported language detected under {root}; nothing to scan.\n"
            )),
            ScanOutcome::Cancelled => {
                Ok("Scan cancelled before completion; no report produced.\n".to_string())
            }
        },
    }
}

fn location(finding: &Finding) -> String {
    if finding.end_line > finding.line {
        format!("{}:{}-{}", finding.file, finding.line, finding.end_line)
    } else {
        format!("{}:{}", finding.file, finding.line)
    }
}

fn render_human(report: &ScanReport) -> anyhow::Result<String> {
    let mut out = String::new();

    write!(out, "Language: {}", report.language)?;
    if report.census.ambiguous {
        write!(out, " (file counts tied; selection is deterministic)")?;
    }
    writeln!(out)?;

    let counts = report
        .file_counts()
        .iter()
        .map(|(lang, count)| format!("{lang}: {count}"))
        .collect::<Vec<_>>()
        .join(", ");
    writeln!(out, "Source files: {counts}")?;
    writeln!(
        out,
        "Scanned {} file(s), skipped {}.",
        report.scanned_files,
        report.skipped.len()
    )?;
    writeln!(
        out,
        "Findings: {} across {} pattern(s).",
        report.total_findings(),
        report.matched.len()
    )?;
    writeln!(out)?;

    if report.matched.is_empty() {
        writeln!(out, "No negative patterns detected.")?;
    }
    for section in &report.matched {
        writeln!(
            out,
            "[{risk}] {name} ({id}): {count} occurrence(s)",
            risk = section.rule.risk,
            name = section.rule.display_name,
            id = section.rule.id,
            count = section.occurrence_count(),
        )?;
        for finding in section.findings.iter().take(MAX_LOCATIONS_LISTED) {
            writeln!(out, "    {}", location(finding))?;
        }
        let omitted = section.findings.len().saturating_sub(MAX_LOCATIONS_LISTED);
        if omitted > 0 {
            writeln!(
                out,
                "    (first {MAX_LOCATIONS_LISTED} shown, {omitted} more omitted)"
            )?;
        }
    }

    writeln!(out)?;
    writeln!(out, "Patterns not found:")?;
    if report.clean.is_empty() {
        writeln!(out, "    (none)")?;
    }
    for rule in &report.clean {
        writeln!(
            out,
            "    [{risk}] {name} ({id})",
            risk = rule.risk,
            name = rule.display_name,
            id = rule.id,
        )?;
    }

    if !report.skipped.is_empty() {
        writeln!(out)?;
        writeln!(out, "Skipped files:")?;
        for skip in &report.skipped {
            writeln!(out, "    {}: {}", skip.file, skip.reason)?;
        }
    }

    Ok(out)
}

/// Render the advisory mitigation document for a finished scan.
///
/// Every embedded snippet is the verbatim text captured from the scanned
/// tree; examples and guidance come verbatim from the rule catalogue.
pub fn render_mitigation(report: &ScanReport) -> String {
    let mut out = String::new();
    let fence_lang = report.language.name().to_lowercase();

    out.push_str("# Negative Patterns Mitigation\n\n");
    let _ = writeln!(
        out,
        "Scan of `{root}`: language {language}, {scanned} file(s) scanned, \
         {total} finding(s) across {patterns} pattern(s).",
        root = report.root,
        language = report.language,
        scanned = report.scanned_files,
        total = report.total_findings(),
        patterns = report.matched.len(),
    );
    out.push('\n');

    if report.matched.is_empty() {
        out.push_str("No negative patterns were detected. No action required.\n");
    }

    for section in &report.matched {
        render_mitigation_section(&mut out, section, &fence_lang);
    }

    if !report.clean.is_empty() {
        out.push_str("## Patterns not detected\n\n");
        for rule in &report.clean {
            let _ = writeln!(out, "- {} (`{}`)", rule.display_name, rule.id);
        }
        out.push('\n');
    }

    if !report.skipped.is_empty() {
        out.push_str("## Skipped files\n\n");
        for skip in &report.skipped {
            let _ = writeln!(out, "- `{}`: {}", skip.file, skip.reason);
        }
    }

    out
}

fn render_mitigation_section(out: &mut String, section: &RuleReport, fence_lang: &str) {
    let rule = &section.rule;
    let risk = capitalize(&rule.risk.to_string());
    let _ = writeln!(out, "## [{risk}] {} (`{}`)", rule.display_name, rule.id);
    out.push('\n');
    out.push_str(&rule.guidance);
    out.push_str("\n\n");

    let _ = writeln!(out, "Found at {} location(s):", section.occurrence_count());
    out.push('\n');
    for finding in &section.findings {
        let _ = writeln!(out, "- `{}`", location(finding));
        out.push('\n');
        let _ = writeln!(out, "  ```{fence_lang}");
        for line in finding.snippet.lines() {
            let _ = writeln!(out, "  {line}");
        }
        out.push_str("  ```\n\n");
    }

    out.push_str("Avoid:\n\n");
    let _ = writeln!(out, "```{fence_lang}");
    out.push_str(&rule.before_example);
    out.push_str("\n```\n\n");
    out.push_str("Prefer:\n\n");
    let _ = writeln!(out, "```{fence_lang}");
    out.push_str(&rule.after_example);
    out.push_str("\n```\n\n");
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
