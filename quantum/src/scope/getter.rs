use std::fmt;

use crate::position::Position;
use crate::scope::variable::VariableId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GetterId(pub(crate) u64);

impl fmt::Display for GetterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// A named read-reference. It resolves to the nearest variable of the same
/// name at or before its position; the binding is not owning.
#[derive(Debug, Clone)]
pub struct Getter {
    pub(crate) id: GetterId,
    pub(crate) name: String,
    pub(crate) position: Position,
    pub(crate) variable: Option<VariableId>,
}

impl Getter {
    pub(crate) fn new(id: GetterId, name: &str, position: Position) -> Self {
        Getter {
            id,
            name: name.to_string(),
            position,
            variable: None,
        }
    }

    pub fn id(&self) -> GetterId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// The variable this getter currently resolves to.
    pub fn variable(&self) -> Option<VariableId> {
        self.variable
    }
}
