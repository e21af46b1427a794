use std::collections::{BTreeMap, HashMap};
use std::ops::Range;
use std::path::Path;

use quantum::document::block::{BlockId, Size};
use quantum::document::element::ElementTypes;
use quantum::document::{BlockOptions, Document};
use quantum::scope::{EventQueue, Outcome, ScopeEvent};
use quantum::value::{Data, Value};
use quantum::{GetterId, ScopeError, ScopeResolver, VariableId};

use crate::error::{ScenarioDiagnostic, ScenarioError};
use crate::model::{BlockSpec, Scenario, Step};

/// What a step label refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    Variable(BlockId, VariableId),
    Getter(BlockId, GetterId),
}

impl Handle {
    fn block(&self) -> BlockId {
        match self {
            Handle::Variable(block, _) | Handle::Getter(block, _) => *block,
        }
    }
}

/// The document after a scenario ran, with the labels its steps defined.
#[derive(Debug)]
pub struct Execution {
    pub document: Document,
    pub(crate) blocks: BTreeMap<String, BlockId>,
    pub(crate) labels: HashMap<String, Handle>,
    /// Unresolved references and unplaced variables, in step order.
    pub warnings: Vec<ScenarioDiagnostic>,
}

impl Execution {
    pub fn block(&self, label: &str) -> Option<BlockId> {
        self.blocks.get(label).copied()
    }

    pub fn handle(&self, label: &str) -> Option<Handle> {
        self.labels.get(label).copied()
    }

    pub fn resolver(&self, label: &str) -> Option<&ScopeResolver<Value>> {
        let block = self.block(label)?;
        self.document.scope(block).ok().map(|s| s.resolver())
    }
}

/// Parse a scenario from TOML source.
pub fn parse_scenario(source: &str, source_id: usize) -> Result<Scenario, ScenarioDiagnostic> {
    toml::from_str(source).map_err(|e| {
        ScenarioDiagnostic::error(
            ScenarioError::Parse(e.message().to_string()),
            e.span().unwrap_or(0..0),
            source_id,
        )
    })
}

/// Read and parse a scenario file. Returns the source alongside for reporting.
pub fn load_scenario(path: &Path) -> Result<(String, Scenario), ScenarioDiagnostic> {
    let source = std::fs::read_to_string(path).map_err(|e| {
        ScenarioError::Io(format!("cannot read '{}': {}", path.display(), e))
    })?;
    let scenario = parse_scenario(&source, 0)?;
    Ok((source, scenario))
}

/// Parse and run a scenario.
pub fn execute_source(source: &str, source_id: usize) -> Result<Execution, ScenarioDiagnostic> {
    let scenario = parse_scenario(source, source_id)?;
    execute(&scenario, source_id)
}

/// Run a scenario: create its blocks, then apply every step in order.
pub fn execute(scenario: &Scenario, source_id: usize) -> Result<Execution, ScenarioDiagnostic> {
    let mut executor = Executor {
        execution: Execution {
            document: Document::new(scenario.document.clone(), ElementTypes::default()),
            blocks: BTreeMap::new(),
            labels: HashMap::new(),
            warnings: Vec::new(),
        },
        source_id,
    };

    for spec in &scenario.blocks {
        let span = spec.span();
        executor
            .create_block(spec.get_ref())
            .map_err(|e| ScenarioDiagnostic::error(e, span, source_id))?;
    }

    for step in &scenario.steps {
        let span = step.span();
        tracing::debug!(op = step.get_ref().op(), ?span, "scenario step");
        let warnings = executor
            .step(step.get_ref())
            .and_then(|warnings| executor.check_scopes().map(|()| warnings))
            .map_err(|e| ScenarioDiagnostic::error(e, span.clone(), source_id))?;
        executor.warn(warnings, span);
    }

    Ok(executor.execution)
}

struct Executor {
    execution: Execution,
    source_id: usize,
}

impl Executor {
    fn warn(&mut self, warnings: Vec<ScenarioError>, span: Range<usize>) {
        for warning in warnings {
            tracing::debug!(%warning, "scenario warning");
            self.execution.warnings.push(ScenarioDiagnostic::warning(
                warning,
                span.clone(),
                self.source_id,
            ));
        }
    }

    fn create_block(&mut self, spec: &BlockSpec) -> Result<BlockId, ScenarioError> {
        if self.execution.blocks.contains_key(&spec.label) {
            return Err(ScenarioError::DuplicateLabel(spec.label.clone()));
        }
        let document = &mut self.execution.document;
        let id = document.create_block(
            &spec.type_name,
            BlockOptions {
                position: Some(spec.position),
                ..BlockOptions::default()
            },
        )?;
        if let Some([width, height]) = spec.size {
            document.set_block_size(id, Size::new(width, height))?;
        }
        if let Ok(scope) = document.scope_mut(id) {
            if let Some(name) = &spec.name {
                scope.set_name(name.clone());
            }
            scope.set_closed(spec.closed);
        }
        self.execution.blocks.insert(spec.label.clone(), id);
        Ok(id)
    }

    fn block(&self, label: &str) -> Result<BlockId, ScenarioError> {
        self.execution
            .blocks
            .get(label)
            .copied()
            .ok_or_else(|| ScenarioError::UnknownBlock(label.to_string()))
    }

    fn resolver(&mut self, block: BlockId) -> Result<&mut ScopeResolver<Value>, ScenarioError> {
        Ok(self.execution.document.scope_mut(block)?.resolver_mut())
    }

    fn resolver_ref(&self, block: BlockId) -> Result<&ScopeResolver<Value>, ScenarioError> {
        Ok(self.execution.document.scope(block)?.resolver())
    }

    fn handle(&self, label: &str) -> Result<Handle, ScenarioError> {
        self.execution
            .labels
            .get(label)
            .copied()
            .ok_or_else(|| ScenarioError::UnknownLabel(label.to_string()))
    }

    fn variable(&self, label: &str) -> Result<(BlockId, VariableId), ScenarioError> {
        match self.handle(label)? {
            Handle::Variable(block, id) => Ok((block, id)),
            Handle::Getter(..) => Err(ScenarioError::WrongKind {
                label: label.to_string(),
                expected: "variable",
            }),
        }
    }

    fn getter(&self, label: &str) -> Result<(BlockId, GetterId), ScenarioError> {
        match self.handle(label)? {
            Handle::Getter(block, id) => Ok((block, id)),
            Handle::Variable(..) => Err(ScenarioError::WrongKind {
                label: label.to_string(),
                expected: "getter",
            }),
        }
    }

    fn bind(&mut self, label: &Option<String>, handle: Handle) -> Result<(), ScenarioError> {
        let Some(label) = label else {
            return Ok(());
        };
        if self.execution.labels.contains_key(label) {
            return Err(ScenarioError::DuplicateLabel(label.clone()));
        }
        self.execution.labels.insert(label.clone(), handle);
        Ok(())
    }

    /// Turn the recoverable part of an outcome into warnings.
    fn outcome_warnings(&self, block: BlockId, outcome: Outcome) -> Vec<ScenarioError> {
        let Ok(resolver) = self.resolver_ref(block) else {
            return Vec::new();
        };
        let unresolved = outcome.unresolved.into_iter().filter_map(|id| {
            resolver.getter(id).map(|g| {
                ScenarioError::Scope(ScopeError::UnresolvedReference {
                    name: g.name().to_string(),
                    position: g.position(),
                })
            })
        });
        let unplaced = outcome.unplaced.into_iter().filter_map(|id| {
            resolver.variable(id).map(|v| ScenarioError::Unplaced {
                name: v.name().to_string(),
                position: v.position(),
            })
        });
        unresolved.chain(unplaced).collect()
    }

    /// Every scope must satisfy its invariants between steps.
    fn check_scopes(&self) -> Result<(), ScenarioError> {
        for id in self.execution.blocks.values() {
            if let Ok(scope) = self.execution.document.scope(*id) {
                scope.resolver().check_invariants()?;
            }
        }
        Ok(())
    }

    /// The label of a variable, `import` for import variables.
    fn describe_variable(&self, block: BlockId, id: VariableId) -> String {
        let import = self
            .resolver_ref(block)
            .ok()
            .and_then(|r| r.variable(id))
            .is_some_and(|v| v.is_import());
        if import {
            return "import".to_string();
        }
        self.execution
            .labels
            .iter()
            .find(|(_, h)| **h == Handle::Variable(block, id))
            .map(|(label, _)| label.clone())
            .unwrap_or_else(|| id.to_string())
    }

    fn step(&mut self, step: &Step) -> Result<Vec<ScenarioError>, ScenarioError> {
        match step {
            Step::AddVariable {
                block,
                name,
                position,
                label,
                value,
            } => {
                let block = self.block(block)?;
                let resolver = self.resolver(block)?;
                let (id, outcome) = resolver.add_variable(name, *position)?;
                resolver.set_data(id, value.clone().into())?;
                self.bind(label, Handle::Variable(block, id))?;
                Ok(self.outcome_warnings(block, outcome))
            }
            Step::AddGetter {
                block,
                name,
                position,
                label,
            } => {
                let block = self.block(block)?;
                let (id, outcome) = self.resolver(block)?.add_getter(name, *position)?;
                self.bind(label, Handle::Getter(block, id))?;
                Ok(self.outcome_warnings(block, outcome))
            }
            Step::Move { target, position } => {
                let handle = self.handle(target)?;
                let block = handle.block();
                let resolver = self.resolver(block)?;
                let outcome = match handle {
                    Handle::Variable(_, id) => resolver.move_variable(id, *position)?,
                    Handle::Getter(_, id) => resolver.move_getter(id, *position)?,
                };
                Ok(self.outcome_warnings(block, outcome))
            }
            Step::SetData { target, value } => {
                let (block, id) = self.variable(target)?;
                self.resolver(block)?.set_data(id, value.clone().into())?;
                Ok(Vec::new())
            }
            Step::SetImport { block, name, value } => {
                let block = self.block(block)?;
                let resolver = self.resolver(block)?;
                if resolver.set_import_data(name, Data::Value(value.clone())) {
                    Ok(Vec::new())
                } else {
                    Ok(vec![ScenarioError::NoChain(name.clone())])
                }
            }
            Step::Remove { target } => {
                let handle = self.handle(target)?;
                let resolver = self.resolver(handle.block())?;
                match handle {
                    Handle::Variable(_, id) => resolver.remove_variable(id)?,
                    Handle::Getter(_, id) => resolver.remove_getter(id)?,
                }
                self.execution.labels.remove(target);
                Ok(Vec::new())
            }
            Step::Batch { moves } => {
                let mut queues: BTreeMap<BlockId, EventQueue<Value>> = BTreeMap::new();
                for spec in moves {
                    let handle = self.handle(&spec.target)?;
                    let event = match handle {
                        Handle::Variable(_, variable) => ScopeEvent::VariableMoved {
                            variable,
                            position: spec.position,
                        },
                        Handle::Getter(_, getter) => ScopeEvent::GetterMoved {
                            getter,
                            position: spec.position,
                        },
                    };
                    queues.entry(handle.block()).or_default().push(event);
                }
                let mut warnings = Vec::new();
                for (block, mut queue) in queues {
                    let outcome = self.resolver(block)?.drain(&mut queue)?;
                    warnings.extend(self.outcome_warnings(block, outcome));
                }
                Ok(warnings)
            }
            Step::CreateBlock {
                label,
                type_name,
                position,
            } => {
                self.create_block(&BlockSpec {
                    label: label.clone(),
                    type_name: type_name.clone(),
                    position: *position,
                    size: None,
                    name: None,
                    closed: false,
                })?;
                Ok(Vec::new())
            }
            Step::MoveBlock { block, position } => {
                let block = self.block(block)?;
                self.execution
                    .document
                    .set_block_position(block, *position)?;
                Ok(Vec::new())
            }
            Step::DeleteBlock { block: label } => {
                let block = self.block(label)?;
                self.execution.document.delete_block(block);
                self.execution.blocks.remove(label);
                self.execution.labels.retain(|_, h| h.block() != block);
                Ok(Vec::new())
            }
            Step::ExpectBinding { getter, variable } => {
                let (block, id) = self.getter(getter)?;
                let actual = match self.resolver_ref(block)?.binding(id) {
                    Ok(bound) => self.describe_variable(block, bound),
                    Err(ScopeError::UnresolvedReference { .. }) => "unbound".to_string(),
                    Err(e) => return Err(e.into()),
                };
                if &actual != variable {
                    return Err(ScenarioError::Expectation(format!(
                        "getter '{}' is bound to {}, expected {}",
                        getter, actual, variable
                    )));
                }
                Ok(Vec::new())
            }
            Step::ExpectData {
                getter,
                value,
                unbound,
            } => {
                let (block, id) = self.getter(getter)?;
                let expected: Data<Value> = if *unbound {
                    Data::Unbound
                } else {
                    value.clone().into()
                };
                let actual = self.resolver_ref(block)?.resolved_data(id)?.cloned();
                if actual != expected {
                    return Err(ScenarioError::Expectation(format!(
                        "getter '{}' reads {}, expected {}",
                        getter, actual, expected
                    )));
                }
                Ok(Vec::new())
            }
            Step::ExpectChain {
                block,
                name,
                positions,
            } => {
                let id = self.block(block)?;
                let actual = self
                    .resolver_ref(id)?
                    .chain(name)
                    .map(|c| c.positions())
                    .unwrap_or_default();
                if &actual != positions {
                    return Err(ScenarioError::Expectation(format!(
                        "chain '{}' in '{}' is [{}], expected [{}]",
                        name,
                        block,
                        join(&actual),
                        join(positions)
                    )));
                }
                Ok(Vec::new())
            }
        }
    }
}

fn join<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
