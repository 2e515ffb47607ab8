//! Rust anti-pattern rules.

use crate::scanner::{Exclusion, Language, Risk, Rule};

fn globs() -> Vec<String> {
    vec!["*.rs".to_string()]
}

pub(super) fn rules() -> Vec<Rule> {
    vec![
        Rule {
            id: "HARDCODED_SECRET".to_string(),
            display_name: "Hardcoded secret".to_string(),
            risk: Risk::Critical,
            language: Language::Rust,
            file_globs: globs(),
            pattern: r#"(?i)(password|secret|api_?key|token)\s*[:=]\s*"[^"]{4,}""#.to_string(),
            multiline: false,
            exclusions: vec![
                Exclusion::LineContains {
                    needle: "env::var".to_string(),
                },
                Exclusion::LineContains {
                    needle: "env!".to_string(),
                },
                Exclusion::PathMatches {
                    glob: "*test*".to_string(),
                },
            ],
            before_example: "let api_key = \"sk-live-4242424242\";".to_string(),
            after_example: "let api_key = std::env::var(\"API_KEY\")?;".to_string(),
            guidance: "A credential committed to source control stays valid long after \
                       the commit is forgotten and ships inside every binary built from \
                       it. Read secrets from the environment at startup and rotate any \
                       value that was ever committed."
                .to_string(),
        },
        Rule {
            id: "UNCHECKED_UNWRAP".to_string(),
            display_name: "Unchecked unwrap".to_string(),
            risk: Risk::High,
            language: Language::Rust,
            file_globs: globs(),
            pattern: r"\.unwrap\(\)".to_string(),
            multiline: false,
            exclusions: vec![
                Exclusion::PathMatches {
                    glob: "*test*".to_string(),
                },
                Exclusion::PrecedingLineMatches {
                    pattern: r"#\[allow".to_string(),
                },
            ],
            before_example: "let config = load_config().unwrap();".to_string(),
            after_example: "let config = load_config().context(\"failed to load config\")?;"
                .to_string(),
            guidance: "unwrap turns every recoverable error into a panic at a call site \
                       that gives the operator no context. Propagate with ? and attach \
                       context at the boundary, or handle the error where it occurs; \
                       unwrap belongs in tests and provably-infallible spots."
                .to_string(),
        },
        Rule {
            id: "PANIC_IN_LIB".to_string(),
            display_name: "panic! in library code".to_string(),
            risk: Risk::High,
            language: Language::Rust,
            file_globs: globs(),
            pattern: r"\bpanic!\s*\(".to_string(),
            multiline: false,
            exclusions: vec![
                Exclusion::PathMatches {
                    glob: "*test*".to_string(),
                },
                Exclusion::PathMatches {
                    glob: "**/build.rs".to_string(),
                },
                Exclusion::PrecedingLineMatches {
                    pattern: r"#\[allow".to_string(),
                },
            ],
            before_example: "panic!(\"unexpected frame type: {kind}\");".to_string(),
            after_example: "return Err(FrameError::UnexpectedKind { kind });".to_string(),
            guidance: "A panic in library code aborts the caller's thread and takes the \
                       decision about recoverability away from them. Return a typed \
                       error and let the application decide whether the condition is \
                       fatal."
                .to_string(),
        },
        Rule {
            id: "BLOCKING_SLEEP_ASYNC".to_string(),
            display_name: "Blocking sleep inside async function".to_string(),
            risk: Risk::High,
            language: Language::Rust,
            file_globs: globs(),
            pattern: r"async\s+fn\s[^\n]*\{(?:\n[^\n]*){0,20}?\n[^\n]*thread::sleep\("
                .to_string(),
            multiline: true,
            exclusions: vec![Exclusion::PathMatches {
                glob: "*test*".to_string(),
            }],
            before_example: "async fn poll() {\n    std::thread::sleep(Duration::from_secs(5));\n}"
                .to_string(),
            after_example: "async fn poll() {\n    tokio::time::sleep(Duration::from_secs(5)).await;\n}"
                .to_string(),
            guidance: "thread::sleep parks the executor thread, stalling every task \
                       scheduled on it. Inside async code, await the runtime's timer so \
                       the executor keeps driving other tasks."
                .to_string(),
        },
        Rule {
            id: "SEQUENTIAL_AWAIT".to_string(),
            display_name: "Sequential awaits in a loop".to_string(),
            risk: Risk::High,
            language: Language::Rust,
            file_globs: globs(),
            pattern: r"for\s[^\n]*\{(?:\n[^\n]*){0,5}?\n[^\n]*\.await".to_string(),
            multiline: true,
            exclusions: vec![
                Exclusion::WindowContains {
                    needle: "join_all".to_string(),
                },
                Exclusion::WindowContains {
                    needle: "JoinSet".to_string(),
                },
                Exclusion::WindowContains {
                    needle: "FuturesUnordered".to_string(),
                },
            ],
            before_example: "for url in urls {\n    results.push(fetch(url).await?);\n}"
                .to_string(),
            after_example: "let results = futures::future::join_all(urls.into_iter().map(fetch)).await;"
                .to_string(),
            guidance: "Awaiting one future per iteration serializes I/O that could run \
                       concurrently. When iterations are independent, build the futures \
                       first and drive them together with join_all or a JoinSet."
                .to_string(),
        },
        Rule {
            id: "CLONE_IN_LOOP".to_string(),
            display_name: "Clone inside a hot loop".to_string(),
            risk: Risk::Medium,
            language: Language::Rust,
            file_globs: globs(),
            pattern: r"for\s[^\n]*\{(?:\n[^\n]*){0,3}?\n[^\n]*\.clone\(\)".to_string(),
            multiline: true,
            exclusions: vec![
                Exclusion::LineContains {
                    needle: "Arc::".to_string(),
                },
                Exclusion::LineContains {
                    needle: "Rc::".to_string(),
                },
                Exclusion::PathMatches {
                    glob: "*test*".to_string(),
                },
            ],
            before_example: "for item in &items {\n    send(config.clone(), item);\n}".to_string(),
            after_example: "for item in &items {\n    send(&config, item);\n}".to_string(),
            guidance: "Cloning inside a loop repeats an allocation per iteration that a \
                       borrow usually avoids. Pass a reference, or hoist the clone out \
                       of the loop when ownership really is required."
                .to_string(),
        },
    ]
}
