//! Go anti-pattern rules.

use crate::scanner::{Exclusion, Language, Risk, Rule};

fn globs() -> Vec<String> {
    vec!["*.go".to_string()]
}

pub(super) fn rules() -> Vec<Rule> {
    vec![
        Rule {
            id: "HARDCODED_SECRET".to_string(),
            display_name: "Hardcoded secret".to_string(),
            risk: Risk::Critical,
            language: Language::Go,
            file_globs: globs(),
            pattern: r#"(?i)(password|secret|apikey|api_key|token)\s*:?=\s*"[^"]{4,}""#
                .to_string(),
            multiline: false,
            exclusions: vec![
                Exclusion::LineContains {
                    needle: "os.Getenv".to_string(),
                },
                Exclusion::PathMatches {
                    glob: "*_test.go".to_string(),
                },
                Exclusion::LineContains {
                    needle: "nolint".to_string(),
                },
            ],
            before_example: "password := \"super-secret-password\"".to_string(),
            after_example: "password := os.Getenv(\"DB_PASSWORD\")".to_string(),
            guidance: "A credential committed to source control stays valid long after \
                       the commit is forgotten and ships inside every binary built from \
                       it. Read secrets from the environment at startup and rotate any \
                       value that was ever committed."
                .to_string(),
        },
        Rule {
            id: "SQL_STRING_BUILD".to_string(),
            display_name: "SQL built by string interpolation".to_string(),
            risk: Risk::Critical,
            language: Language::Go,
            file_globs: globs(),
            pattern: r#"\.(Query|QueryRow|Exec)\w*\(\s*(fmt\.Sprintf|"[^"]*"\s*\+)"#.to_string(),
            multiline: false,
            exclusions: vec![
                Exclusion::LineContains {
                    needle: "nolint".to_string(),
                },
                Exclusion::PathMatches {
                    glob: "*_test.go".to_string(),
                },
            ],
            before_example: "db.Query(fmt.Sprintf(\"SELECT * FROM users WHERE name = '%s'\", name))"
                .to_string(),
            after_example: "db.Query(\"SELECT * FROM users WHERE name = $1\", name)".to_string(),
            guidance: "Formatting values into a SQL string hands query structure to the \
                       caller. Use placeholder parameters so the driver sends values \
                       out-of-band and the database never parses them as SQL."
                .to_string(),
        },
        Rule {
            id: "IGNORED_ERROR".to_string(),
            display_name: "Error discarded with blank identifier".to_string(),
            risk: Risk::High,
            language: Language::Go,
            file_globs: globs(),
            pattern: r"(,\s*_\s*:?=|^\s*_\s*=)\s*\w".to_string(),
            multiline: false,
            exclusions: vec![
                Exclusion::LineContains {
                    needle: "nolint".to_string(),
                },
                Exclusion::PathMatches {
                    glob: "*_test.go".to_string(),
                },
            ],
            before_example: "data, _ := os.ReadFile(path)".to_string(),
            after_example: "data, err := os.ReadFile(path)\nif err != nil {\n    return fmt.Errorf(\"read %s: %w\", path, err)\n}"
                .to_string(),
            guidance: "Discarding an error with the blank identifier lets the program \
                       continue on garbage state and erases the only evidence of the \
                       failure. Check the error and wrap it with context, or document \
                       why ignoring it is safe."
                .to_string(),
        },
        Rule {
            id: "EMPTY_ERR_CHECK".to_string(),
            display_name: "Empty error check body".to_string(),
            risk: Risk::High,
            language: Language::Go,
            file_globs: globs(),
            pattern: r"if\s+err\s*!=\s*nil\s*\{\s*\}".to_string(),
            multiline: true,
            exclusions: vec![Exclusion::LineContains {
                needle: "nolint".to_string(),
            }],
            before_example: "if err != nil {\n}".to_string(),
            after_example: "if err != nil {\n    return fmt.Errorf(\"save order: %w\", err)\n}"
                .to_string(),
            guidance: "An empty err != nil body acknowledges the failure and then drops \
                       it, which is worse than not checking at all because it reads as \
                       handled. Return, wrap, or log the error inside the block."
                .to_string(),
        },
        Rule {
            id: "PANIC_IN_LIB".to_string(),
            display_name: "panic in library code".to_string(),
            risk: Risk::High,
            language: Language::Go,
            file_globs: globs(),
            pattern: r"\bpanic\s*\(".to_string(),
            multiline: false,
            exclusions: vec![
                Exclusion::PathMatches {
                    glob: "*_test.go".to_string(),
                },
                Exclusion::PathMatches {
                    glob: "**/main.go".to_string(),
                },
                Exclusion::LineContains {
                    needle: "nolint".to_string(),
                },
            ],
            before_example: "panic(\"unexpected message type\")".to_string(),
            after_example: "return fmt.Errorf(\"unexpected message type %T\", msg)".to_string(),
            guidance: "A panic in package code crashes every caller that forgot to \
                       recover, taking the recoverability decision away from them. \
                       Return an error and let main decide what is fatal."
                .to_string(),
        },
        Rule {
            id: "FMT_PRINT_DEBUG".to_string(),
            display_name: "fmt.Print debugging".to_string(),
            risk: Risk::Medium,
            language: Language::Go,
            file_globs: globs(),
            pattern: r"fmt\.Print(ln|f)?\(".to_string(),
            multiline: false,
            exclusions: vec![
                Exclusion::PathMatches {
                    glob: "**/main.go".to_string(),
                },
                Exclusion::PathMatches {
                    glob: "**/cmd/**".to_string(),
                },
                Exclusion::PathMatches {
                    glob: "*_test.go".to_string(),
                },
                Exclusion::LineContains {
                    needle: "nolint".to_string(),
                },
            ],
            before_example: "fmt.Println(\"got response\", resp.Status)".to_string(),
            after_example: "slog.Debug(\"got response\", \"status\", resp.Status)".to_string(),
            guidance: "fmt.Print writes unstructured text to stdout where no collector \
                       will find it, and it cannot be filtered by level. Route \
                       diagnostics through the project's logger."
                .to_string(),
        },
    ]
}
