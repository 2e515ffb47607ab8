use aho_corasick::AhoCorasick;
use globset::{Glob, GlobMatcher};
use regex::Regex;
use tracing::trace;

use super::{Exclusion, Finding, Rule, RuleValidationError};

/// Upper bound, in lines, for a multiline match window. A block construct
/// whose pattern spans more than this many lines is never reported; the
/// cap keeps multiline rules from matching across whole files.
pub const MULTILINE_WINDOW_LINES: usize = 32;

/// A raw candidate match, before exclusion filtering. Line indexes are
/// 0-based and inclusive.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    start: usize,
    end: usize,
    /// Last line of the window the candidate was found in; equals `end`
    /// for single-line rules.
    window_end: usize,
}

#[derive(Debug)]
enum CompiledExclusion {
    LineContains(AhoCorasick),
    WindowContains(AhoCorasick),
    FileContains(AhoCorasick),
    PathMatches(GlobMatcher),
    PrecedingLineMatches(Regex),
}

/// A rule with its pattern, globs and exclusions compiled. Compilation
/// happens once per run, right after catalogue load, so a malformed
/// pattern fails the run before any file is read.
#[derive(Debug)]
pub struct CompiledRule {
    pub rule: Rule,
    regex: Regex,
    globs: Vec<GlobMatcher>,
    exclusions: Vec<CompiledExclusion>,
}

impl CompiledRule {
    pub fn compile(rule: Rule) -> Result<Self, RuleValidationError> {
        rule.validate()?;
        let regex = Regex::new(&rule.pattern).map_err(|err| {
            RuleValidationError::InvalidPattern {
                rule_id: rule.id.clone(),
                detail: err.to_string(),
            }
        })?;
        let mut globs = Vec::with_capacity(rule.file_globs.len());
        for glob in &rule.file_globs {
            globs.push(compile_glob(&rule.id, glob)?);
        }
        let mut exclusions = Vec::with_capacity(rule.exclusions.len());
        for exclusion in &rule.exclusions {
            exclusions.push(match exclusion {
                Exclusion::LineContains { needle } => {
                    CompiledExclusion::LineContains(needle_automaton(&rule.id, needle)?)
                }
                Exclusion::WindowContains { needle } => {
                    CompiledExclusion::WindowContains(needle_automaton(&rule.id, needle)?)
                }
                Exclusion::FileContains { needle } => {
                    CompiledExclusion::FileContains(needle_automaton(&rule.id, needle)?)
                }
                Exclusion::PathMatches { glob } => CompiledExclusion::PathMatches(
                    compile_glob(&rule.id, glob).map_err(|_| {
                        RuleValidationError::InvalidExclusion {
                            rule_id: rule.id.clone(),
                            detail: format!("bad path glob `{glob}`"),
                        }
                    })?,
                ),
                Exclusion::PrecedingLineMatches { pattern } => {
                    CompiledExclusion::PrecedingLineMatches(Regex::new(pattern).map_err(
                        |err| RuleValidationError::InvalidExclusion {
                            rule_id: rule.id.clone(),
                            detail: err.to_string(),
                        },
                    )?)
                }
            });
        }
        Ok(Self {
            rule,
            regex,
            globs,
            exclusions,
        })
    }

    /// Whether the rule's file globs admit this path.
    pub fn eligible(&self, rel_path: &str) -> bool {
        self.globs.iter().any(|glob| glob.is_match(rel_path))
    }

    /// Run the rule over one file's content, yielding confirmed findings.
    /// Read-only: the matcher never touches the filesystem.
    pub fn match_file(&self, rel_path: &str, content: &str) -> Vec<Finding> {
        let lines: Vec<&str> = content.lines().collect();
        let candidates = if self.rule.multiline {
            self.multiline_candidates(&lines)
        } else {
            self.single_line_candidates(&lines)
        };

        let mut findings = Vec::new();
        for candidate in candidates {
            if self.is_excluded(rel_path, content, &lines, candidate) {
                trace!(rule_id = %self.rule.id, file = %rel_path, line = candidate.start + 1, "candidate suppressed by exclusion");
                continue;
            }
            findings.push(Finding {
                rule_id: self.rule.id.clone(),
                file: rel_path.to_string(),
                line: candidate.start + 1,
                end_line: candidate.end + 1,
                snippet: lines[candidate.start..=candidate.end].join("\n"),
                language: self.rule.language,
            });
        }
        findings
    }

    fn single_line_candidates(&self, lines: &[&str]) -> Vec<Candidate> {
        lines
            .iter()
            .enumerate()
            .filter(|(_, line)| self.regex.is_match(line))
            .map(|(idx, _)| Candidate {
                start: idx,
                end: idx,
                window_end: idx,
            })
            .collect()
    }

    /// Slide a window of at most [`MULTILINE_WINDOW_LINES`] lines over the
    /// file, accepting only matches anchored at the window's first line so
    /// each match is produced exactly once and never spans past the cap.
    fn multiline_candidates(&self, lines: &[&str]) -> Vec<Candidate> {
        let mut candidates = Vec::new();
        for start in 0..lines.len() {
            let window_end = (start + MULTILINE_WINDOW_LINES).min(lines.len());
            let window = lines[start..window_end].join("\n");
            let Some(found) = self.regex.find(&window) else {
                continue;
            };
            // A match beginning on a later line is picked up by the window
            // anchored at that line.
            if window[..found.start()].contains('\n') {
                continue;
            }
            let span_lines = window[found.start()..found.end()].matches('\n').count();
            candidates.push(Candidate {
                start,
                end: start + span_lines,
                window_end: window_end - 1,
            });
        }
        candidates
    }

    /// Evaluate exclusions in the order they were listed on the rule; the
    /// first one that holds suppresses the candidate.
    fn is_excluded(
        &self,
        rel_path: &str,
        content: &str,
        lines: &[&str],
        candidate: Candidate,
    ) -> bool {
        self.exclusions.iter().any(|exclusion| match exclusion {
            CompiledExclusion::LineContains(needle) => lines[candidate.start..=candidate.end]
                .iter()
                .any(|line| needle.is_match(line)),
            CompiledExclusion::WindowContains(needle) => lines
                [candidate.start..=candidate.window_end]
                .iter()
                .any(|line| needle.is_match(line)),
            CompiledExclusion::FileContains(needle) => needle.is_match(content),
            CompiledExclusion::PathMatches(glob) => glob.is_match(rel_path),
            CompiledExclusion::PrecedingLineMatches(regex) => {
                candidate.start > 0 && regex.is_match(lines[candidate.start - 1])
            }
        })
    }
}

fn needle_automaton(rule_id: &str, needle: &str) -> Result<AhoCorasick, RuleValidationError> {
    AhoCorasick::builder()
        .ascii_case_insensitive(true)
        .build([needle])
        .map_err(|err| RuleValidationError::InvalidExclusion {
            rule_id: rule_id.to_string(),
            detail: err.to_string(),
        })
}

fn compile_glob(rule_id: &str, glob: &str) -> Result<GlobMatcher, RuleValidationError> {
    Ok(Glob::new(glob)
        .map_err(|err| RuleValidationError::InvalidGlob {
            rule_id: rule_id.to_string(),
            glob: glob.to_string(),
            detail: err.to_string(),
        })?
        .compile_matcher())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{Language, Risk};

    fn rule(pattern: &str, multiline: bool, exclusions: Vec<Exclusion>) -> Rule {
        Rule {
            id: "TEST_RULE".into(),
            display_name: "Test rule".into(),
            risk: Risk::High,
            language: Language::Python,
            file_globs: vec!["*.py".into()],
            pattern: pattern.into(),
            multiline,
            exclusions,
            before_example: "bad".into(),
            after_example: "good".into(),
            guidance: "fix it".into(),
        }
    }

    #[test]
    fn single_line_rule_reports_line_and_snippet() {
        let compiled = CompiledRule::compile(rule(
            r#"(?i)password\s*=\s*["'][^"']+["']"#,
            false,
            vec![],
        ))
        .unwrap();
        let content = "import os\npassword = \"super-secret-password\"\nprint(x)\n";
        let findings = compiled.match_file("src/app.py", content);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, 2);
        assert_eq!(findings[0].end_line, 2);
        assert_eq!(findings[0].snippet, "password = \"super-secret-password\"");
    }

    #[test]
    fn line_contains_exclusion_suppresses_candidate() {
        let compiled = CompiledRule::compile(rule(
            r#"(?i)password\s*=\s*"#,
            false,
            vec![Exclusion::LineContains {
                needle: "os.environ".into(),
            }],
        ))
        .unwrap();
        let content = "password = os.environ[\"DB_PASSWORD\"]\n";
        assert!(compiled.match_file("src/app.py", content).is_empty());
    }

    #[test]
    fn candidate_failing_every_exclusion_is_kept() {
        let compiled = CompiledRule::compile(rule(
            r#"password\s*="#,
            false,
            vec![
                Exclusion::LineContains {
                    needle: "os.environ".into(),
                },
                Exclusion::PathMatches {
                    glob: "*test*".into(),
                },
            ],
        ))
        .unwrap();
        let findings = compiled.match_file("src/app.py", "password = load()\n");
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn path_exclusion_suppresses_test_files() {
        let compiled = CompiledRule::compile(rule(
            r#"password\s*="#,
            false,
            vec![Exclusion::PathMatches {
                glob: "*test*".into(),
            }],
        ))
        .unwrap();
        assert!(compiled
            .match_file("tests/test_app.py", "password = \"x\"\n")
            .is_empty());
        assert_eq!(
            compiled.match_file("src/app.py", "password = \"x\"\n").len(),
            1
        );
    }

    #[test]
    fn preceding_line_exclusion_checks_line_above() {
        let compiled = CompiledRule::compile(rule(
            r#"\beval\("#,
            false,
            vec![Exclusion::PrecedingLineMatches {
                pattern: r"eslint-disable-next-line".into(),
            }],
        ))
        .unwrap();
        let suppressed = "// eslint-disable-next-line no-eval\neval(code)\n";
        assert!(compiled.match_file("app.py", suppressed).is_empty());
        let kept = "let x = 1\neval(code)\n";
        assert_eq!(compiled.match_file("app.py", kept).len(), 1);
    }

    #[test]
    fn multiline_match_spans_lines_within_window() {
        let compiled = CompiledRule::compile(rule(
            r"for\s[^\n]*:(?:\n[^\n]*){0,5}\n\s*await\s",
            true,
            vec![],
        ))
        .unwrap();
        let content = "for item in items:\n    x = prep(item)\n    await send(item)\n";
        let findings = compiled.match_file("src/app.py", content);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, 1);
        assert_eq!(findings[0].end_line, 3);
        assert!(findings[0].snippet.contains("await send(item)"));
    }

    #[test]
    fn multiline_match_is_bounded_by_window_cap() {
        let compiled = CompiledRule::compile(rule(
            r"(?s)BEGIN.*END",
            true,
            vec![],
        ))
        .unwrap();

        // Construct inside the cap: BEGIN, filler, END within 32 lines.
        let mut inside = String::from("BEGIN\n");
        for _ in 0..(MULTILINE_WINDOW_LINES - 2) {
            inside.push_str("filler\n");
        }
        inside.push_str("END\n");
        assert_eq!(compiled.match_file("a.py", &inside).len(), 1);

        // One line past the cap: no match may cross the boundary.
        let mut outside = String::from("BEGIN\n");
        for _ in 0..(MULTILINE_WINDOW_LINES - 1) {
            outside.push_str("filler\n");
        }
        outside.push_str("END\n");
        assert!(compiled.match_file("a.py", &outside).is_empty());
    }

    #[test]
    fn window_contains_exclusion_sees_lines_after_match() {
        let compiled = CompiledRule::compile(rule(
            r"for\s[^\n]*:(?:\n[^\n]*){0,5}\n\s*await\s",
            true,
            vec![Exclusion::WindowContains {
                needle: "asyncio.gather".into(),
            }],
        ))
        .unwrap();
        let content = "\
for item in items:
    await send(item)
results = await asyncio.gather(*tasks)
";
        assert!(compiled.match_file("src/app.py", content).is_empty());
    }

    #[test]
    fn overlapping_windows_report_each_match_once() {
        let compiled = CompiledRule::compile(rule(
            r"start\n\s*finish",
            true,
            vec![],
        ))
        .unwrap();
        let content = "start\n  finish\nstart\n  finish\n";
        let findings = compiled.match_file("a.py", content);
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].line, 1);
        assert_eq!(findings[1].line, 3);
    }

    #[test]
    fn snippet_is_verbatim_slice_of_content() {
        let compiled =
            CompiledRule::compile(rule(r"token\s*=", false, vec![])).unwrap();
        let content = "a = 1\ntoken = \"abcd1234\"  # rotate me\nb = 2\n";
        let findings = compiled.match_file("cfg.py", content);
        assert!(content.contains(&findings[0].snippet));
    }

    #[test]
    fn bad_regex_fails_compilation() {
        let err = CompiledRule::compile(rule(r"([unclosed", false, vec![]))
            .expect_err("unbalanced pattern should not compile");
        assert!(matches!(
            err,
            RuleValidationError::InvalidPattern { rule_id, .. } if rule_id == "TEST_RULE"
        ));
    }

    #[test]
    fn glob_eligibility_respects_extension() {
        let compiled = CompiledRule::compile(rule(r"x", false, vec![])).unwrap();
        assert!(compiled.eligible("src/deep/nested/app.py"));
        assert!(!compiled.eligible("src/app.go"));
    }
}
