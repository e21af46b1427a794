use serde::Deserialize;
use toml::Spanned;

use quantum::Position;
use quantum::document::DocumentConfig;
use quantum::document::element::SCOPE_ELEMENT;
use quantum::value::Value;

/// A scenario file: a document layout plus the events replayed against it.
#[derive(Debug, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub document: DocumentConfig,

    /// Blocks present before the first step.
    #[serde(default, rename = "block")]
    pub blocks: Vec<Spanned<BlockSpec>>,

    #[serde(default, rename = "step")]
    pub steps: Vec<Spanned<Step>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlockSpec {
    /// Name used by steps to refer to this block.
    pub label: String,

    #[serde(rename = "type", default = "default_type")]
    pub type_name: String,

    #[serde(default)]
    pub position: Position,

    #[serde(default)]
    pub size: Option<[f64; 2]>,

    /// Scope name, for scope blocks.
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub closed: bool,
}

fn default_type() -> String {
    SCOPE_ELEMENT.to_string()
}

/// One indivisible step of a scenario.
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Step {
    AddVariable {
        block: String,
        name: String,
        position: Position,
        label: Option<String>,
        #[serde(default)]
        value: Option<Value>,
    },
    AddGetter {
        block: String,
        name: String,
        position: Position,
        label: Option<String>,
    },
    /// Move a labelled variable or getter.
    Move { target: String, position: Position },
    /// Replace a variable's data; without `value` the variable becomes empty.
    SetData {
        target: String,
        #[serde(default)]
        value: Option<Value>,
    },
    /// Supply the data a scope inherits for `name`.
    SetImport {
        block: String,
        name: String,
        value: Value,
    },
    Remove { target: String },
    /// Queue several moves and apply them one after another.
    Batch { moves: Vec<MoveSpec> },
    CreateBlock {
        label: String,
        #[serde(rename = "type", default = "default_type")]
        type_name: String,
        #[serde(default)]
        position: Position,
    },
    MoveBlock { block: String, position: Position },
    DeleteBlock { block: String },
    /// `variable` is a label, `import` or `unbound`.
    ExpectBinding { getter: String, variable: String },
    /// Without `value`, expects an empty binding unless `unbound` is set.
    ExpectData {
        getter: String,
        #[serde(default)]
        value: Option<Value>,
        #[serde(default)]
        unbound: bool,
    },
    /// An empty `positions` list expects the chain not to exist.
    ExpectChain {
        block: String,
        name: String,
        positions: Vec<Position>,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MoveSpec {
    pub target: String,
    pub position: Position,
}

impl Step {
    pub fn op(&self) -> &'static str {
        match self {
            Step::AddVariable { .. } => "add-variable",
            Step::AddGetter { .. } => "add-getter",
            Step::Move { .. } => "move",
            Step::SetData { .. } => "set-data",
            Step::SetImport { .. } => "set-import",
            Step::Remove { .. } => "remove",
            Step::Batch { .. } => "batch",
            Step::CreateBlock { .. } => "create-block",
            Step::MoveBlock { .. } => "move-block",
            Step::DeleteBlock { .. } => "delete-block",
            Step::ExpectBinding { .. } => "expect-binding",
            Step::ExpectData { .. } => "expect-data",
            Step::ExpectChain { .. } => "expect-chain",
        }
    }
}
