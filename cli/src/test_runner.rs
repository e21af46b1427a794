use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use scenario::ScenarioDiagnostic;

const TEST_SUFFIX: &str = ".test.toml";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpectedWarning {
    /// Substring that must appear in the warning message.
    pub contains: String,

    /// If set, the warning's span must start on this 1-based source line.
    #[serde(default)]
    pub line: Option<usize>,
}

/// The `[test]` table of a scenario test file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestConfig {
    #[serde(default)]
    pub description: Option<String>,

    /// Expected chain report (trimmed comparison).
    #[serde(default)]
    pub expect_output: Option<String>,

    /// The error's Display string must contain this substring. Parse errors
    /// count.
    #[serde(default)]
    pub expect_error: Option<String>,

    /// If present (even empty), warning count and content are checked.
    #[serde(default)]
    pub expect_warnings: Option<Vec<ExpectedWarning>>,
}

#[derive(Debug, Deserialize)]
struct TestFile {
    #[serde(default)]
    test: TestConfig,
}

#[derive(Debug, PartialEq)]
pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

impl TestResult {
    fn label(&self) -> &str {
        self.description.as_deref().unwrap_or_else(|| {
            self.path
                .file_name()
                .and_then(|s| s.to_str())
                .map(|s| s.trim_end_matches(TEST_SUFFIX))
                .unwrap_or("?")
        })
    }
}

fn run_single_test(path: &Path) -> TestResult {
    let (description, outcome) = match std::fs::read_to_string(path) {
        Ok(source) => check_source(&source),
        Err(e) => (None, TestOutcome::Fail(format!("cannot read file: {}", e))),
    };
    TestResult {
        path: path.to_path_buf(),
        description,
        outcome,
    }
}

/// Run one test file's scenario and compare it with its `[test]` table.
fn check_source(source: &str) -> (Option<String>, TestOutcome) {
    let config = match toml::from_str::<TestFile>(source) {
        Ok(file) => file.test,
        Err(e) => {
            return (
                None,
                TestOutcome::Fail(format!("invalid test file: {}", e.message())),
            );
        }
    };
    let description = config.description.clone();

    let result = scenario::execute_source(source, 0);
    tracing::debug!(test = ?description, ok = result.is_ok(), "scenario test ran");

    let failure = match (&config.expect_error, &result) {
        (Some(expected), Err(err)) => {
            let message = err.to_string();
            (!message.contains(expected.as_str())).then(|| {
                format!(
                    "expected error containing \"{}\", got: {}",
                    expected, message
                )
            })
        }
        (Some(expected), Ok(_)) => Some(format!(
            "expected error containing \"{}\", but the scenario succeeded",
            expected
        )),
        (None, Err(err)) => Some(format!("unexpected error: {}", err)),
        (None, Ok(execution)) => config.expect_output.as_ref().and_then(|expected| {
            let actual = execution.render();
            let (actual, expected) = (actual.trim(), expected.trim());
            (actual != expected).then(|| {
                format!(
                    "output mismatch\n  expected:\n{}\n  actual:\n{}",
                    indent(expected),
                    indent(actual)
                )
            })
        }),
    };
    if let Some(reason) = failure {
        return (description, TestOutcome::Fail(reason));
    }

    if let (Some(expected), Ok(execution)) = (&config.expect_warnings, &result) {
        if let Some(reason) = check_warnings(source, &execution.warnings, expected) {
            return (description, TestOutcome::Fail(reason));
        }
    }

    (description, TestOutcome::Pass)
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|l| format!("    {}", l))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Convert a byte offset in `source` to a 1-based line number.
fn byte_offset_to_line(source: &str, offset: usize) -> usize {
    source[..offset.min(source.len())]
        .bytes()
        .filter(|&b| b == b'\n')
        .count()
        + 1
}

/// Check that actual warnings match expectations. Returns `Some(reason)` on mismatch.
fn check_warnings(
    source: &str,
    warnings: &[ScenarioDiagnostic],
    expected: &[ExpectedWarning],
) -> Option<String> {
    if warnings.len() != expected.len() {
        let actual = if warnings.is_empty() {
            "    (none)".to_string()
        } else {
            warnings
                .iter()
                .map(|w| format!("  - {}", w))
                .collect::<Vec<_>>()
                .join("\n")
        };
        return Some(format!(
            "expected {} warning(s), got {}\n  actual warnings:\n{}",
            expected.len(),
            warnings.len(),
            actual
        ));
    }

    for (i, (actual, expected)) in warnings.iter().zip(expected).enumerate() {
        let message = actual.to_string();
        if !message.contains(&expected.contains) {
            return Some(format!(
                "warning[{}]: expected message containing \"{}\", got: {}",
                i, expected.contains, message
            ));
        }

        let Some(expected_line) = expected.line else {
            continue;
        };
        match &actual.span {
            Some(span) => {
                let actual_line = byte_offset_to_line(source, span.start);
                if actual_line != expected_line {
                    return Some(format!(
                        "warning[{}]: expected on line {}, but span is on line {}",
                        i, expected_line, actual_line
                    ));
                }
            }
            None => {
                return Some(format!(
                    "warning[{}]: expected on line {}, but warning has no span",
                    i, expected_line
                ));
            }
        }
    }

    None
}

/// Discover test files grouped by category (subfolder relative to root).
/// Files directly in `root` get category "".
fn discover_categorized(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    collect_tests(root, root, &mut categories);
    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn collect_tests(dir: &Path, root: &Path, out: &mut BTreeMap<String, Vec<PathBuf>>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_tests(&path, root, out);
            continue;
        }
        let is_test = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(TEST_SUFFIX));
        if is_test {
            let category = path
                .parent()
                .and_then(|p| p.strip_prefix(root).ok())
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .unwrap_or_default();
            out.entry(category).or_default().push(path);
        }
    }
}

/// Keep the requested categories and their subcategories.
fn select_categories<'a>(
    all: &'a BTreeMap<String, Vec<PathBuf>>,
    requested: &[String],
) -> BTreeMap<&'a str, &'a [PathBuf]> {
    if requested.is_empty() {
        return all.iter().map(|(k, v)| (k.as_str(), v.as_slice())).collect();
    }
    let mut selected = BTreeMap::new();
    for request in requested {
        let request = request.trim_matches('/');
        let prefix = format!("{}/", request);
        let before = selected.len();
        for (category, files) in all {
            if category == request || category.starts_with(&prefix) {
                selected.insert(category.as_str(), files.as_slice());
            }
        }
        if selected.len() == before {
            eprintln!(
                "warning: category '{}' not found (available: {})",
                request,
                all.keys()
                    .map(|k| category_label(k))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
    }
    selected
}

fn category_label(category: &str) -> &str {
    if category.is_empty() {
        "(root)"
    } else {
        category
    }
}

pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }

    let categories = discover_categorized(path);
    if categories.is_empty() {
        eprintln!("no {} files found in {}", TEST_SUFFIX, path.display());
        return;
    }

    eprintln!("available categories:");
    for (category, files) in &categories {
        eprintln!("  {} ({} tests)", category_label(category), files.len());
    }
}

fn paint(text: &str, code: &str, no_color: bool) -> String {
    if no_color {
        text.to_string()
    } else {
        format!("\x1b[{}m{}\x1b[0m", code, text)
    }
}

/// Run every test file under `path` (or a single file), restricted to
/// `categories` when non-empty. Returns the exit code.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let groups: Vec<(String, Vec<PathBuf>)> = if path.is_file() {
        vec![(String::new(), vec![path.to_path_buf()])]
    } else {
        let all = discover_categorized(path);
        if all.is_empty() {
            eprintln!("no {} files found in {}", TEST_SUFFIX, path.display());
            return 1;
        }
        let selected = select_categories(&all, categories);
        if selected.is_empty() {
            eprintln!("no matching categories found");
            return 1;
        }
        selected
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_vec()))
            .collect()
    };
    let single = path.is_file();

    let mut passed = 0usize;
    let mut failures: Vec<TestResult> = Vec::new();

    for (category, files) in &groups {
        if !single {
            eprintln!();
            eprintln!("{}", paint(category_label(category), "1", no_color));
        }
        for file in files {
            let result = run_single_test(file);
            match result.outcome {
                TestOutcome::Pass => {
                    passed += 1;
                    eprintln!("  {}  {}", paint("PASS", "32", no_color), result.label());
                }
                TestOutcome::Fail(_) => {
                    eprintln!("  {}  {}", paint("FAIL", "31", no_color), result.label());
                    failures.push(result);
                }
            }
        }
    }

    if !failures.is_empty() {
        eprintln!();
        eprintln!("failures:");
        for failure in &failures {
            eprintln!();
            eprintln!("  --- {} ---", failure.path.display());
            if let TestOutcome::Fail(reason) = &failure.outcome {
                for line in reason.lines() {
                    eprintln!("  {}", line);
                }
            }
        }
    }

    eprintln!();
    if failures.is_empty() {
        eprintln!(
            "test result: {}. {} passed, 0 failed",
            paint("ok", "32", no_color),
            passed
        );
        0
    } else {
        eprintln!(
            "test result: {}. {} passed, {} failed (of {})",
            paint("FAILED", "31", no_color),
            passed,
            failures.len(),
            passed + failures.len()
        );
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = r#"
[[block]]
label = "main"

[[step]]
op = "add-variable"
block = "main"
name = "A"
position = [5, 0]
label = "a"
value = 2

[[step]]
op = "add-getter"
block = "main"
name = "A"
position = [-1, 0]
label = "lost"
"#;

    fn check(test_table: &str) -> TestOutcome {
        check_source(&format!("{}\n{}", test_table, SCENARIO)).1
    }

    #[test]
    fn passes_with_matching_output() {
        let outcome = check(
            r#"[test]
description = "report"
expect_output = """
main (scope-element) at (0, 0)
  A:
    [0] (0, 0) import = <unbound>
    [1] (5, 0) a = 2
  unresolved lost 'A' at (-1, 0)
"""
"#,
        );
        assert_eq!(outcome, TestOutcome::Pass);
    }

    #[test]
    fn reports_output_mismatch() {
        let outcome = check("[test]\nexpect_output = \"nothing\"\n");
        assert!(matches!(outcome, TestOutcome::Fail(reason) if reason.starts_with("output mismatch")));
    }

    #[test]
    fn checks_warning_count() {
        let outcome = check(
            "[test]\n[[test.expect_warnings]]\ncontains = \"unresolved reference\"\n",
        );
        assert_eq!(outcome, TestOutcome::Pass);

        let outcome = check("[test]\nexpect_warnings = []\n");
        assert!(matches!(outcome, TestOutcome::Fail(reason) if reason.contains("expected 0 warning(s), got 1")));
    }

    #[test]
    fn checks_warning_lines() {
        let source = "one\ntwo\nthree\n";
        let warning = ScenarioDiagnostic::warning(
            scenario::ScenarioError::UnknownLabel("x".into()),
            4..7,
            0,
        );
        let expect = |line| {
            vec![ExpectedWarning {
                contains: "unknown label".into(),
                line: Some(line),
            }]
        };
        assert_eq!(check_warnings(source, &[warning], &expect(2)), None);

        let warning = ScenarioDiagnostic::warning(
            scenario::ScenarioError::UnknownLabel("x".into()),
            8..13,
            0,
        );
        let reason = check_warnings(source, &[warning], &expect(2)).unwrap();
        assert!(reason.contains("span is on line 3"));
    }

    #[test]
    fn expected_errors() {
        let source = "[test]\nexpect_error = \"unknown label 'ghost'\"\n\n[[step]]\nop = \"remove\"\ntarget = \"ghost\"\n";
        assert_eq!(check_source(source).1, TestOutcome::Pass);

        let outcome = check("[test]\nexpect_error = \"boom\"\n");
        assert!(matches!(outcome, TestOutcome::Fail(reason) if reason.contains("succeeded")));
    }

    #[test]
    fn unknown_test_keys_are_rejected() {
        let outcome = check("[test]\nexpect_stdout = \"x\"\n");
        assert!(matches!(outcome, TestOutcome::Fail(reason) if reason.starts_with("invalid test file")));
    }

    #[test]
    fn byte_offsets_map_to_lines() {
        assert_eq!(byte_offset_to_line("a\nb\nc", 0), 1);
        assert_eq!(byte_offset_to_line("a\nb\nc", 2), 2);
        assert_eq!(byte_offset_to_line("a\nb\nc", 100), 3);
    }

    #[test]
    fn discovers_tests_by_category() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("moves/batch")).unwrap();
        std::fs::write(dir.path().join("root.test.toml"), "").unwrap();
        std::fs::write(dir.path().join("moves/one.test.toml"), "").unwrap();
        std::fs::write(dir.path().join("moves/batch/two.test.toml"), "").unwrap();
        std::fs::write(dir.path().join("moves/notes.toml"), "").unwrap();

        let all = discover_categorized(dir.path());
        let names: Vec<&str> = all.keys().map(|k| k.as_str()).collect();
        assert_eq!(names, vec!["", "moves", "moves/batch"]);

        let selected = select_categories(&all, &["moves".to_string()]);
        assert_eq!(selected.len(), 2);
        let selected = select_categories(&all, &["moves/batch/".to_string()]);
        assert_eq!(selected.keys().copied().collect::<Vec<_>>(), vec!["moves/batch"]);
    }

    #[test]
    fn runs_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let passing = format!("[test]\ndescription = \"ok\"\n{}", SCENARIO);
        std::fs::write(dir.path().join("pass.test.toml"), passing).unwrap();
        assert_eq!(run_tests(dir.path(), true, &[]), 0);

        std::fs::write(
            dir.path().join("fail.test.toml"),
            "[test]\nexpect_error = \"never\"\n",
        )
        .unwrap();
        assert_eq!(run_tests(dir.path(), true, &[]), 1);
    }
}
