use std::collections::VecDeque;

use crate::position::{Offset, Position};
use crate::scope::getter::GetterId;
use crate::scope::variable::VariableId;
use crate::value::Data;

/// A change notification from the geometry or data layer.
#[derive(Debug, Clone, PartialEq)]
pub enum ScopeEvent<T> {
    VariableMoved { variable: VariableId, position: Position },
    GetterMoved { getter: GetterId, position: Position },
    /// The hosting block's anchor moved on its own.
    AnchorMoved(Position),
    /// The hosting block moved together with everything in it.
    Translated(Offset),
    DataChanged { variable: VariableId, data: Data<T> },
}

/// Pending notifications, applied one indivisible step at a time.
#[derive(Debug, Clone)]
pub struct EventQueue<T> {
    pending: VecDeque<ScopeEvent<T>>,
}

impl<T> EventQueue<T> {
    pub fn new() -> Self {
        EventQueue {
            pending: VecDeque::new(),
        }
    }

    pub fn push(&mut self, event: ScopeEvent<T>) {
        self.pending.push_back(event);
    }

    pub fn pop(&mut self) -> Option<ScopeEvent<T>> {
        self.pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<T> Default for EventQueue<T> {
    fn default() -> Self {
        EventQueue::new()
    }
}

impl<T> Extend<ScopeEvent<T>> for EventQueue<T> {
    fn extend<I: IntoIterator<Item = ScopeEvent<T>>>(&mut self, iter: I) {
        self.pending.extend(iter);
    }
}

/// Recoverable side effects of a step: getters left without a binding and
/// variables that could not be placed because they precede the scope anchor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    pub unresolved: Vec<GetterId>,
    pub unplaced: Vec<VariableId>,
}

impl Outcome {
    pub fn is_clean(&self) -> bool {
        self.unresolved.is_empty() && self.unplaced.is_empty()
    }

    pub fn merge(&mut self, other: Outcome) {
        self.unresolved.extend(other.unresolved);
        self.unplaced.extend(other.unplaced);
    }
}
