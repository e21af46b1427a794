use std::io::Write;

use quantum::Position;
use quantum::value::{Data, Value};
use scenario::{Execution, ScenarioError, execute_source, load_scenario};

const MAIN: &str = "[[block]]\nlabel = \"main\"\nposition = [0, 0]\n";

fn run(steps: &str) -> Execution {
    let source = format!("{}{}", MAIN, steps);
    execute_source(&source, 0).expect("scenario failed")
}

fn run_err(steps: &str) -> ScenarioError {
    let source = format!("{}{}", MAIN, steps);
    execute_source(&source, 0).expect_err("scenario succeeded").error
}

#[test]
fn getter_reads_closest_preceding_variable() {
    let execution = run(r#"
[[step]]
op = "add-variable"
block = "main"
name = "A"
position = [5, 0]
label = "a"
value = 1

[[step]]
op = "add-getter"
block = "main"
name = "A"
position = [7, 0]
label = "g"

[[step]]
op = "add-getter"
block = "main"
name = "A"
position = [3, 0]
label = "early"

[[step]]
op = "expect-binding"
getter = "g"
variable = "a"

[[step]]
op = "expect-binding"
getter = "early"
variable = "import"

[[step]]
op = "expect-data"
getter = "g"
value = 1
"#);
    assert!(execution.warnings.is_empty());
}

#[test]
fn moving_variable_past_getter_returns_it_to_import() {
    let execution = run(r#"
[[step]]
op = "add-variable"
block = "main"
name = "A"
position = [5, 0]
label = "a"

[[step]]
op = "add-getter"
block = "main"
name = "A"
position = [7, 0]
label = "g"

[[step]]
op = "move"
target = "a"
position = [10, 0]

[[step]]
op = "expect-binding"
getter = "g"
variable = "import"

[[step]]
op = "expect-data"
getter = "g"
unbound = true

[[step]]
op = "expect-chain"
block = "main"
name = "A"
positions = [[0, 0], [10, 0]]
"#);
    let resolver = execution.resolver("main").unwrap();
    resolver.check_invariants().unwrap();
}

#[test]
fn getter_at_a_variable_position_reads_it() {
    run(r#"
[[step]]
op = "add-variable"
block = "main"
name = "A"
position = [5, 0]
label = "a"

[[step]]
op = "add-getter"
block = "main"
name = "A"
position = [5, 0]
label = "g"

[[step]]
op = "expect-binding"
getter = "g"
variable = "a"
"#);
}

#[test]
fn rows_come_before_columns() {
    run(r#"
[[step]]
op = "add-variable"
block = "main"
name = "A"
position = [50, 0]
label = "first-row"

[[step]]
op = "add-variable"
block = "main"
name = "A"
position = [0, 1]
label = "second-row"

[[step]]
op = "add-getter"
block = "main"
name = "A"
position = [60, 0]
label = "g"

[[step]]
op = "expect-binding"
getter = "g"
variable = "first-row"

[[step]]
op = "expect-chain"
block = "main"
name = "A"
positions = [[0, 0], [50, 0], [0, 1]]
"#);
}

#[test]
fn getter_before_anchor_warns() {
    let execution = run(r#"
[[step]]
op = "add-getter"
block = "main"
name = "A"
position = [-1, 0]
label = "g"

[[step]]
op = "expect-binding"
getter = "g"
variable = "unbound"
"#);
    assert_eq!(execution.warnings.len(), 1);
    let warning = &execution.warnings[0];
    assert!(warning.is_warning);
    assert!(matches!(
        &warning.error,
        ScenarioError::Scope(quantum::ScopeError::UnresolvedReference { name, position })
            if name == "A" && *position == Position::new(-1, 0)
    ));
    assert!(warning.span.is_some());
}

#[test]
fn variable_before_anchor_warns() {
    let execution = run(r#"
[[step]]
op = "add-variable"
block = "main"
name = "A"
position = [3, -2]
"#);
    assert_eq!(execution.warnings.len(), 1);
    assert!(matches!(
        execution.warnings[0].error,
        ScenarioError::Unplaced { .. }
    ));
}

#[test]
fn inheriting_into_a_missing_chain_warns() {
    let execution = run(r#"
[[step]]
op = "set-import"
block = "main"
name = "A"
value = true
"#);
    assert_eq!(execution.warnings.len(), 1);
    let warning = &execution.warnings[0];
    assert!(warning.is_warning);
    assert!(matches!(&warning.error, ScenarioError::NoChain(name) if name == "A"));
}

#[test]
fn removing_a_variable_hands_getters_back() {
    let execution = run(r#"
[[step]]
op = "add-variable"
block = "main"
name = "A"
position = [2, 0]
label = "a"
value = "outer"

[[step]]
op = "add-variable"
block = "main"
name = "A"
position = [6, 0]
label = "b"
value = "inner"

[[step]]
op = "add-getter"
block = "main"
name = "A"
position = [8, 0]
label = "g"

[[step]]
op = "expect-data"
getter = "g"
value = "inner"

[[step]]
op = "remove"
target = "b"

[[step]]
op = "expect-binding"
getter = "g"
variable = "a"

[[step]]
op = "expect-data"
getter = "g"
value = "outer"
"#);
    assert!(execution.handle("b").is_none());
}

#[test]
fn unread_chain_is_collected() {
    run(r#"
[[step]]
op = "add-variable"
block = "main"
name = "A"
position = [2, 0]
label = "a"

[[step]]
op = "remove"
target = "a"

[[step]]
op = "expect-chain"
block = "main"
name = "A"
positions = []
"#);
}

#[test]
fn import_data_reaches_getters_before_any_variable() {
    run(r#"
[[step]]
op = "add-getter"
block = "main"
name = "A"
position = [4, 0]
label = "g"

[[step]]
op = "set-import"
block = "main"
name = "A"
value = true

[[step]]
op = "expect-data"
getter = "g"
value = true

[[step]]
op = "add-variable"
block = "main"
name = "A"
position = [1, 0]
label = "a"

[[step]]
op = "expect-data"
getter = "g"

[[step]]
op = "set-data"
target = "a"
value = { expr = "x + 1" }

[[step]]
op = "expect-data"
getter = "g"
value = { expr = "x + 1" }
"#);
}

#[test]
fn batch_applies_moves_in_order() {
    run(r#"
[[step]]
op = "add-variable"
block = "main"
name = "A"
position = [2, 0]
label = "a"

[[step]]
op = "add-variable"
block = "main"
name = "A"
position = [4, 0]
label = "b"

[[step]]
op = "add-getter"
block = "main"
name = "A"
position = [5, 0]
label = "g"

[[step]]
op = "batch"
moves = [
    { target = "b", position = [9, 0] },
    { target = "a", position = [6, 0] },
]

[[step]]
op = "expect-binding"
getter = "g"
variable = "import"

[[step]]
op = "expect-chain"
block = "main"
name = "A"
positions = [[0, 0], [6, 0], [9, 0]]
"#);
}

#[test]
fn moving_a_block_moves_its_chains() {
    let execution = run(r#"
[[step]]
op = "add-variable"
block = "main"
name = "A"
position = [2, 1]
label = "a"

[[step]]
op = "add-getter"
block = "main"
name = "A"
position = [3, 1]
label = "g"

[[step]]
op = "move-block"
block = "main"
position = [10, 10]

[[step]]
op = "expect-chain"
block = "main"
name = "A"
positions = [[10, 10], [12, 11]]

[[step]]
op = "expect-binding"
getter = "g"
variable = "a"
"#);
    let resolver = execution.resolver("main").unwrap();
    assert_eq!(resolver.anchor(), Position::new(10, 10));
}

#[test]
fn scopes_do_not_share_chains() {
    run(r#"
[[block]]
label = "other"
position = [0, 20]

[[step]]
op = "add-variable"
block = "main"
name = "A"
position = [1, 0]
label = "a"

[[step]]
op = "add-getter"
block = "other"
name = "A"
position = [1, 21]
label = "g"

[[step]]
op = "expect-binding"
getter = "g"
variable = "import"
"#);
}

#[test]
fn created_and_deleted_blocks() {
    let err = run_err(r#"
[[step]]
op = "create-block"
label = "late"
position = [0, 30]

[[step]]
op = "add-getter"
block = "late"
name = "A"
position = [0, 31]
label = "g"

[[step]]
op = "delete-block"
block = "late"

[[step]]
op = "expect-binding"
getter = "g"
variable = "import"
"#);
    assert!(matches!(err, ScenarioError::UnknownLabel(label) if label == "g"));
}

#[test]
fn text_blocks_have_no_scope() {
    let err = run_err(r#"
[[step]]
op = "create-block"
label = "note"
type = "text-element"

[[step]]
op = "add-variable"
block = "note"
name = "A"
position = [1, 0]
"#);
    assert!(matches!(
        err,
        ScenarioError::Document(quantum::document::DocumentError::NotAScope(_))
    ));
}

#[test]
fn unknown_element_type_is_an_error() {
    let err = run_err(
        r#"
[[step]]
op = "create-block"
label = "chart"
type = "chart-element"
"#,
    );
    assert!(matches!(
        err,
        ScenarioError::Document(quantum::document::DocumentError::UnknownElementType(_))
    ));
}

#[test]
fn failed_expectation_points_at_step() {
    let steps = r#"
[[step]]
op = "add-getter"
block = "main"
name = "A"
position = [4, 0]
label = "g"

[[step]]
op = "expect-binding"
getter = "g"
variable = "a"
"#;
    let source = format!("{}{}", MAIN, steps);
    let diagnostic = execute_source(&source, 0).unwrap_err();
    assert!(matches!(diagnostic.error, ScenarioError::Expectation(_)));
    assert_eq!(
        diagnostic.error.to_string(),
        "expectation failed: getter 'g' is bound to import, expected a"
    );
    let span = diagnostic.span.clone().unwrap();
    let step = source.rfind("[[step]]").unwrap();
    assert!(span.start >= step);
}

#[test]
fn labels_are_checked() {
    let err = run_err(r#"
[[step]]
op = "add-variable"
block = "main"
name = "A"
position = [1, 0]
label = "a"

[[step]]
op = "add-getter"
block = "main"
name = "A"
position = [2, 0]
label = "a"
"#);
    assert!(matches!(err, ScenarioError::DuplicateLabel(label) if label == "a"));

    let err = run_err(r#"
[[step]]
op = "add-variable"
block = "main"
name = "A"
position = [1, 0]
label = "a"

[[step]]
op = "expect-data"
getter = "a"
"#);
    assert!(matches!(
        err,
        ScenarioError::WrongKind { expected: "getter", .. }
    ));

    let err = run_err("[[step]]\nop = \"remove\"\ntarget = \"missing\"\n");
    assert!(matches!(err, ScenarioError::UnknownLabel(_)));
}

#[test]
fn parse_errors_have_spans() {
    let diagnostic = execute_source("[[step]]\nop = \"teleport\"\n", 0).unwrap_err();
    assert!(matches!(diagnostic.error, ScenarioError::Parse(_)));
    assert!(diagnostic.span.is_some());

    let diagnostic = execute_source("[[block]\nlabel = 1", 0).unwrap_err();
    assert!(matches!(diagnostic.error, ScenarioError::Parse(_)));
}

#[test]
fn render_lists_chains() {
    let execution = run(r#"
[[step]]
op = "add-variable"
block = "main"
name = "A"
position = [5, 0]
label = "a"
value = 1

[[step]]
op = "add-getter"
block = "main"
name = "A"
position = [7, 0]
label = "g"

[[step]]
op = "add-getter"
block = "main"
name = "A"
position = [1, 0]
label = "h"

[[step]]
op = "add-getter"
block = "main"
name = "B"
position = [-3, 0]
label = "lost"
"#);
    assert_eq!(
        execution.render(),
        "main (scope-element) at (0, 0)\n\
         \x20 A:\n\
         \x20   [0] (0, 0) import = <unbound> <- h\n\
         \x20   [1] (5, 0) a = 1 <- g\n\
         \x20 unresolved lost 'B' at (-3, 0)\n"
    );
}

#[test]
fn resolver_is_reachable_after_run() {
    let execution = run(r#"
[[step]]
op = "add-variable"
block = "main"
name = "A"
position = [5, 0]
label = "a"
value = [1, "two"]
"#);
    let Some(scenario::Handle::Variable(_, id)) = execution.handle("a") else {
        panic!("expected a variable handle");
    };
    let resolver = execution.resolver("main").unwrap();
    assert_eq!(
        resolver.variable(id).unwrap().data(),
        &Data::Value(Value::List(vec![
            Value::Number(1.0),
            Value::String("two".into())
        ]))
    );
}

#[test]
fn load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        "{}[[step]]\nop = \"add-getter\"\nblock = \"main\"\nname = \"A\"\nposition = [1, 0]\n",
        MAIN
    )
    .unwrap();
    let (source, scenario) = load_scenario(file.path()).unwrap();
    assert!(source.contains("add-getter"));
    assert_eq!(scenario.blocks.len(), 1);
    assert_eq!(scenario.steps.len(), 1);
    assert_eq!(scenario.steps[0].get_ref().op(), "add-getter");

    let missing = file.path().with_extension("missing");
    let err = load_scenario(&missing).unwrap_err();
    assert!(matches!(err.error, ScenarioError::Io(_)));
}
