//! Python anti-pattern rules.

use crate::scanner::{Exclusion, Language, Risk, Rule};

fn globs() -> Vec<String> {
    vec!["*.py".to_string()]
}

pub(super) fn rules() -> Vec<Rule> {
    vec![
        Rule {
            id: "HARDCODED_SECRET".to_string(),
            display_name: "Hardcoded secret".to_string(),
            risk: Risk::Critical,
            language: Language::Python,
            file_globs: globs(),
            pattern: r#"(?i)(password|passwd|secret|api_key|apikey|token|private_key)\s*=\s*["'][^"']{4,}["']"#
                .to_string(),
            multiline: false,
            exclusions: vec![
                Exclusion::LineContains {
                    needle: "os.environ".to_string(),
                },
                Exclusion::LineContains {
                    needle: "os.getenv".to_string(),
                },
                Exclusion::LineContains {
                    needle: "getpass".to_string(),
                },
                Exclusion::PathMatches {
                    glob: "*test*".to_string(),
                },
                Exclusion::LineContains {
                    needle: "noqa".to_string(),
                },
            ],
            before_example: "password = \"super-secret-password\"".to_string(),
            after_example: "password = os.environ[\"DB_PASSWORD\"]".to_string(),
            guidance: "A credential committed to source control stays valid long after the \
                       commit is forgotten and is visible to everyone with repository access. \
                       Read secrets from the environment or a secret manager at startup and \
                       keep only the lookup in code; rotate any value that was ever committed."
                .to_string(),
        },
        Rule {
            id: "SQL_STRING_BUILD".to_string(),
            display_name: "SQL built by string interpolation".to_string(),
            risk: Risk::Critical,
            language: Language::Python,
            file_globs: globs(),
            pattern: r#"(?i)\.execute\w*\(\s*(f["']|["'][^"']*["']\s*[%+])"#.to_string(),
            multiline: false,
            exclusions: vec![
                Exclusion::LineContains {
                    needle: "nosec".to_string(),
                },
                Exclusion::PathMatches {
                    glob: "*test*".to_string(),
                },
            ],
            before_example: "cursor.execute(f\"SELECT * FROM users WHERE name = '{name}'\")"
                .to_string(),
            after_example: "cursor.execute(\"SELECT * FROM users WHERE name = %s\", (name,))"
                .to_string(),
            guidance: "Interpolating values into a SQL string hands query structure to the \
                       caller. Pass values through the driver's parameter binding instead; \
                       the database then treats them as data, never as SQL."
                .to_string(),
        },
        Rule {
            id: "SEQUENTIAL_AWAIT".to_string(),
            display_name: "Sequential awaits in a loop".to_string(),
            risk: Risk::High,
            language: Language::Python,
            file_globs: globs(),
            pattern: r"for\s[^\n]*:(?:\n[^\n]*){0,5}?\n[^\n]*\bawait\s".to_string(),
            multiline: true,
            exclusions: vec![
                Exclusion::WindowContains {
                    needle: "asyncio.gather".to_string(),
                },
                Exclusion::WindowContains {
                    needle: "create_task".to_string(),
                },
                Exclusion::WindowContains {
                    needle: "TaskGroup".to_string(),
                },
            ],
            before_example: "for url in urls:\n    results.append(await fetch(url))".to_string(),
            after_example: "results = await asyncio.gather(*(fetch(url) for url in urls))"
                .to_string(),
            guidance: "Awaiting one call per loop iteration serializes I/O that could run \
                       concurrently, so total latency grows linearly with the number of \
                       items. Launch the coroutines together and gather the results when \
                       the iterations are independent."
                .to_string(),
        },
        Rule {
            id: "SWALLOWED_ERROR".to_string(),
            display_name: "Exception swallowed with pass".to_string(),
            risk: Risk::High,
            language: Language::Python,
            file_globs: globs(),
            pattern: r"except(\s[^\n]*)?:\s*\n\s*pass\b".to_string(),
            multiline: true,
            exclusions: vec![
                Exclusion::LineContains {
                    needle: "noqa".to_string(),
                },
                Exclusion::PathMatches {
                    glob: "*test*".to_string(),
                },
            ],
            before_example: "try:\n    cleanup()\nexcept Exception:\n    pass".to_string(),
            after_example: "try:\n    cleanup()\nexcept OSError:\n    logger.warning(\"cleanup failed\", exc_info=True)"
                .to_string(),
            guidance: "An except block that only passes hides failures from both users and \
                       logs, and the broad catch keeps even programming errors invisible. \
                       Catch the narrowest exception the code can actually handle and log \
                       or re-raise everything else."
                .to_string(),
        },
        Rule {
            id: "BLOCKING_SLEEP_ASYNC".to_string(),
            display_name: "Blocking sleep inside async function".to_string(),
            risk: Risk::High,
            language: Language::Python,
            file_globs: globs(),
            pattern: r"async\s+def\s[^\n]*:(?:\n[^\n]*){0,20}?\n[^\n]*time\.sleep\(".to_string(),
            multiline: true,
            exclusions: vec![
                Exclusion::LineContains {
                    needle: "noqa".to_string(),
                },
                Exclusion::PathMatches {
                    glob: "*test*".to_string(),
                },
            ],
            before_example: "async def poll():\n    time.sleep(5)".to_string(),
            after_example: "async def poll():\n    await asyncio.sleep(5)".to_string(),
            guidance: "time.sleep blocks the event loop thread, stalling every task \
                       scheduled on it, not just the caller. Inside async code, always \
                       await asyncio.sleep so the loop keeps servicing other tasks."
                .to_string(),
        },
        Rule {
            id: "MUTABLE_DEFAULT_ARG".to_string(),
            display_name: "Mutable default argument".to_string(),
            risk: Risk::Medium,
            language: Language::Python,
            file_globs: globs(),
            pattern: r"def\s+\w+\s*\([^)]*=\s*(\[\]|\{\}|set\(\))".to_string(),
            multiline: false,
            exclusions: vec![Exclusion::LineContains {
                needle: "noqa".to_string(),
            }],
            before_example: "def collect(items=[]):\n    items.append(1)".to_string(),
            after_example: "def collect(items=None):\n    items = [] if items is None else items"
                .to_string(),
            guidance: "Default values are evaluated once at definition time, so a mutable \
                       default is shared across every call and accumulates state between \
                       them. Default to None and construct the container inside the body."
                .to_string(),
        },
        Rule {
            id: "WILDCARD_IMPORT".to_string(),
            display_name: "Wildcard import".to_string(),
            risk: Risk::Medium,
            language: Language::Python,
            file_globs: globs(),
            pattern: r"^\s*from\s+[\w.]+\s+import\s+\*".to_string(),
            multiline: false,
            exclusions: vec![
                Exclusion::LineContains {
                    needle: "noqa".to_string(),
                },
                Exclusion::PathMatches {
                    glob: "**/__init__.py".to_string(),
                },
            ],
            before_example: "from utils import *".to_string(),
            after_example: "from utils import parse_config, retry".to_string(),
            guidance: "Star imports make a module's namespace depend on whatever the \
                       source module happens to export, which breaks silently when that \
                       set changes. Import the names you use explicitly."
                .to_string(),
        },
    ]
}
