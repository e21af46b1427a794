use std::fmt;

use crate::position::Position;
use crate::scope::getter::GetterId;
use crate::value::Data;

/// Stable identity of a variable. Ids are never reused within a resolver,
/// so they also break ties between variables at the same position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableId(pub(crate) u64);

impl fmt::Display for VariableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Sort key of a chain entry. The import variable sorts before any regular
/// variable at the same position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct ChainKey {
    pub position: Position,
    pub regular: bool,
    pub id: VariableId,
}

/// A named binding at a position, owning the getters that read it.
#[derive(Debug, Clone)]
pub struct Variable<T> {
    pub(crate) id: VariableId,
    pub(crate) name: String,
    pub(crate) position: Position,
    /// Index in the chain, `None` while unplaced or removed.
    pub(crate) index: Option<usize>,
    pub(crate) data: Data<T>,
    pub(crate) getters: Vec<GetterId>,
    pub(crate) import: bool,
}

impl<T> Variable<T> {
    pub(crate) fn new(id: VariableId, name: &str, position: Position, data: Data<T>) -> Self {
        Variable {
            id,
            name: name.to_string(),
            position,
            index: None,
            data,
            getters: Vec::new(),
            import: false,
        }
    }

    pub(crate) fn import(id: VariableId, name: &str, anchor: Position) -> Self {
        Variable {
            index: Some(0),
            import: true,
            ..Variable::new(id, name, anchor, Data::Unbound)
        }
    }

    pub(crate) fn key(&self) -> ChainKey {
        self.key_at(self.position)
    }

    pub(crate) fn key_at(&self, position: Position) -> ChainKey {
        ChainKey {
            position,
            regular: !self.import,
            id: self.id,
        }
    }

    pub fn id(&self) -> VariableId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn is_placed(&self) -> bool {
        self.index.is_some()
    }

    /// True for the standing index-0 entry inherited from the enclosing scope.
    pub fn is_import(&self) -> bool {
        self.import
    }

    pub fn data(&self) -> &Data<T> {
        &self.data
    }

    /// Getters currently resolving to this variable.
    pub fn getters(&self) -> &[GetterId] {
        &self.getters
    }
}
