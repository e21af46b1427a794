use crate::ordered::OrderedChain;
use crate::scope::variable::VariableId;

/// The ordered variables of one name within one scope.
///
/// Entry 0 is always the import variable. Entries are strictly increasing by
/// position and each entry's stored index equals its slot.
#[derive(Debug, Clone)]
pub struct VariableChain {
    pub(crate) name: String,
    pub(crate) entries: OrderedChain<VariableId>,
    pub(crate) poisoned: bool,
}

impl VariableChain {
    pub(crate) fn new(name: &str, import: VariableId) -> Self {
        let mut entries = OrderedChain::new();
        entries.insert(0, import);
        VariableChain {
            name: name.to_string(),
            entries,
            poisoned: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn import(&self) -> Option<VariableId> {
        self.entries.first().copied()
    }

    pub fn get(&self, index: usize) -> Option<VariableId> {
        self.entries.get(index).copied()
    }

    pub fn ids(&self) -> impl Iterator<Item = VariableId> + '_ {
        self.entries.iter().copied()
    }

    /// Set after an invariant violation; no further mutation is allowed.
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }
}
