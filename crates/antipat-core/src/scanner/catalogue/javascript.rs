//! JavaScript and TypeScript anti-pattern rules.

use crate::scanner::{Exclusion, Language, Risk, Rule};

fn globs() -> Vec<String> {
    ["*.js", "*.jsx", "*.ts", "*.tsx", "*.mjs", "*.cjs"]
        .iter()
        .map(|g| g.to_string())
        .collect()
}

pub(super) fn rules() -> Vec<Rule> {
    vec![
        Rule {
            id: "HARDCODED_SECRET".to_string(),
            display_name: "Hardcoded secret".to_string(),
            risk: Risk::Critical,
            language: Language::JavaScript,
            file_globs: globs(),
            pattern: r#"(?i)(password|secret|api_?key|token)\s*[:=]\s*["'`][^"'`]{4,}["'`]"#
                .to_string(),
            multiline: false,
            exclusions: vec![
                Exclusion::LineContains {
                    needle: "process.env".to_string(),
                },
                Exclusion::PrecedingLineMatches {
                    pattern: "eslint-disable-next-line".to_string(),
                },
                Exclusion::PathMatches {
                    glob: "*test*".to_string(),
                },
            ],
            before_example: "const apiKey = \"sk-live-4242424242\";".to_string(),
            after_example: "const apiKey = process.env.API_KEY;".to_string(),
            guidance: "A credential committed to source control stays valid long after the \
                       commit is forgotten and ships to every clone of the repository. \
                       Read secrets from process.env (or a secret manager) and rotate any \
                       value that was ever committed."
                .to_string(),
        },
        Rule {
            id: "EVAL_USAGE".to_string(),
            display_name: "Dynamic code evaluation".to_string(),
            risk: Risk::Critical,
            language: Language::JavaScript,
            file_globs: globs(),
            pattern: r"\beval\s*\(|new\s+Function\s*\(".to_string(),
            multiline: false,
            exclusions: vec![
                Exclusion::PrecedingLineMatches {
                    pattern: "eslint-disable-next-line".to_string(),
                },
                Exclusion::PathMatches {
                    glob: "*test*".to_string(),
                },
            ],
            before_example: "const result = eval(userInput);".to_string(),
            after_example: "const result = JSON.parse(userInput);".to_string(),
            guidance: "eval and the Function constructor execute arbitrary strings with \
                       the caller's privileges, turning any injected text into code. \
                       Parse data with JSON.parse, or dispatch through an explicit map of \
                       allowed operations."
                .to_string(),
        },
        Rule {
            id: "SEQUENTIAL_AWAIT".to_string(),
            display_name: "Sequential awaits in a loop".to_string(),
            risk: Risk::High,
            language: Language::JavaScript,
            file_globs: globs(),
            pattern: r"for\s*\([^\n]*\)\s*\{(?:\n[^\n]*){0,5}?\n[^\n]*\bawait\s".to_string(),
            multiline: true,
            exclusions: vec![
                Exclusion::WindowContains {
                    needle: "Promise.all".to_string(),
                },
                Exclusion::WindowContains {
                    needle: "Promise.allSettled".to_string(),
                },
            ],
            before_example: "for (const url of urls) {\n  results.push(await fetch(url));\n}"
                .to_string(),
            after_example: "const results = await Promise.all(urls.map((url) => fetch(url)));"
                .to_string(),
            guidance: "Awaiting inside the loop serializes requests that could run \
                       concurrently, so total latency grows with the number of items. \
                       Start the promises together and await Promise.all when iterations \
                       are independent."
                .to_string(),
        },
        Rule {
            id: "EMPTY_CATCH".to_string(),
            display_name: "Empty catch block".to_string(),
            risk: Risk::High,
            language: Language::JavaScript,
            file_globs: globs(),
            pattern: r"catch\s*(\([^)]*\))?\s*\{\s*\}".to_string(),
            multiline: true,
            exclusions: vec![
                Exclusion::PrecedingLineMatches {
                    pattern: "eslint-disable-next-line".to_string(),
                },
                Exclusion::PathMatches {
                    glob: "*test*".to_string(),
                },
            ],
            before_example: "try {\n  save(payload);\n} catch (err) {}".to_string(),
            after_example: "try {\n  save(payload);\n} catch (err) {\n  logger.warn(\"save failed\", err);\n}"
                .to_string(),
            guidance: "An empty catch discards the error object entirely, so failures \
                       leave no trace in logs or telemetry. Log the error, rethrow it, \
                       or handle it explicitly; if ignoring is genuinely correct, say so \
                       in a comment."
                .to_string(),
        },
        Rule {
            id: "INNERHTML_ASSIGN".to_string(),
            display_name: "Direct innerHTML assignment".to_string(),
            risk: Risk::High,
            language: Language::JavaScript,
            file_globs: globs(),
            pattern: r"\.innerHTML\s*=".to_string(),
            multiline: false,
            exclusions: vec![
                Exclusion::LineContains {
                    needle: "DOMPurify".to_string(),
                },
                Exclusion::LineContains {
                    needle: "sanitize".to_string(),
                },
                Exclusion::PrecedingLineMatches {
                    pattern: "eslint-disable-next-line".to_string(),
                },
            ],
            before_example: "container.innerHTML = userComment;".to_string(),
            after_example: "container.textContent = userComment;".to_string(),
            guidance: "Assigning unsanitized markup to innerHTML executes any script the \
                       value carries, which is the classic stored-XSS path. Use \
                       textContent for plain text, or sanitize the markup first."
                .to_string(),
        },
        Rule {
            id: "VAR_DECLARATION".to_string(),
            display_name: "var declaration".to_string(),
            risk: Risk::Medium,
            language: Language::JavaScript,
            file_globs: globs(),
            pattern: r"^\s*var\s+\w+".to_string(),
            multiline: false,
            exclusions: vec![Exclusion::LineContains {
                needle: "eslint-disable".to_string(),
            }],
            before_example: "var count = 0;".to_string(),
            after_example: "let count = 0;".to_string(),
            guidance: "var is function-scoped and hoisted, so a declaration deep in a \
                       block is visible (as undefined) before it runs. Use const by \
                       default and let where reassignment is needed."
                .to_string(),
        },
    ]
}
