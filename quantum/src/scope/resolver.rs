use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::mem;

use crate::error::ScopeError;
use crate::position::{Offset, Position};
use crate::scope::chain::VariableChain;
use crate::scope::events::{EventQueue, Outcome, ScopeEvent};
use crate::scope::getter::{Getter, GetterId};
use crate::scope::variable::{Variable, VariableId};
use crate::value::{Data, Value};

/// Positional scope resolution for one block.
///
/// For every name the resolver keeps a [`VariableChain`] sorted by position.
/// Each variable owns the getters in `[variable.position, next.position)`, so
/// a getter always reads the nearest variable at or before it. Every public
/// mutation is one complete step: the ownership invariant holds again before
/// it returns.
#[derive(Debug, Clone)]
pub struct ScopeResolver<T = Value> {
    anchor: Position,
    chains: BTreeMap<String, VariableChain>,
    variables: HashMap<VariableId, Variable<T>>,
    getters: HashMap<GetterId, Getter>,
    next_id: u64,
}

/// Read-only view of one chain, in order.
pub struct ChainView<'a, T> {
    chain: &'a VariableChain,
    variables: &'a HashMap<VariableId, Variable<T>>,
}

impl<T> Clone for ChainView<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ChainView<'_, T> {}

impl<'a, T> ChainView<'a, T> {
    pub fn name(&self) -> &'a str {
        self.chain.name()
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn is_poisoned(&self) -> bool {
        self.chain.is_poisoned()
    }

    pub fn import(&self) -> Option<&'a Variable<T>> {
        self.chain.import().and_then(|id| self.variables.get(&id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Variable<T>> + 'a {
        let variables = self.variables;
        self.chain.entries.iter().filter_map(move |id| variables.get(id))
    }

    pub fn positions(&self) -> Vec<Position> {
        self.iter().map(|v| v.position()).collect()
    }
}

impl<T> ScopeResolver<T> {
    /// Create a resolver for a block anchored at `anchor`.
    pub fn new(anchor: Position) -> Self {
        ScopeResolver {
            anchor,
            chains: BTreeMap::new(),
            variables: HashMap::new(),
            getters: HashMap::new(),
            next_id: 0,
        }
    }

    pub fn anchor(&self) -> Position {
        self.anchor
    }

    /// True when no chain is alive.
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    pub fn chains(&self) -> impl Iterator<Item = ChainView<'_, T>> + '_ {
        self.chains.values().map(|chain| ChainView {
            chain,
            variables: &self.variables,
        })
    }

    pub fn chain(&self, name: &str) -> Option<ChainView<'_, T>> {
        self.chains.get(name).map(|chain| ChainView {
            chain,
            variables: &self.variables,
        })
    }

    pub fn variable(&self, id: VariableId) -> Option<&Variable<T>> {
        self.variables.get(&id)
    }

    pub fn getter(&self, id: GetterId) -> Option<&Getter> {
        self.getters.get(&id)
    }

    pub fn getters(&self) -> impl Iterator<Item = &Getter> {
        self.getters.values()
    }

    /// Getters whose position precedes every variable of their name.
    pub fn unresolved_getters(&self) -> impl Iterator<Item = &Getter> {
        self.getters.values().filter(|g| g.variable.is_none())
    }

    /// The variable a getter resolves to.
    pub fn binding(&self, id: GetterId) -> Result<VariableId, ScopeError> {
        let getter = self.getters.get(&id).ok_or(ScopeError::UnknownGetter(id))?;
        getter
            .variable
            .ok_or_else(|| ScopeError::UnresolvedReference {
                name: getter.name.clone(),
                position: getter.position,
            })
    }

    /// What a getter currently reads. Unresolved getters read `Unbound`.
    pub fn resolved_data(&self, id: GetterId) -> Result<Data<&T>, ScopeError> {
        let getter = self.getters.get(&id).ok_or(ScopeError::UnknownGetter(id))?;
        Ok(getter
            .variable
            .and_then(|v| self.variables.get(&v))
            .map_or(Data::Unbound, |v| v.data.as_ref()))
    }

    pub fn import_variable(&self, name: &str) -> Option<VariableId> {
        self.chains.get(name).and_then(|c| c.import())
    }

    pub fn add_variable(
        &mut self,
        name: &str,
        position: Position,
    ) -> Result<(VariableId, Outcome), ScopeError> {
        self.check_poisoned(name)?;
        let id = VariableId(self.allocate_id());
        self.ensure_chain(name);
        self.variables
            .insert(id, Variable::new(id, name, position, Data::Empty));
        let outcome = self.place_variable(id, position)?;
        Ok((id, outcome))
    }

    pub fn add_getter(
        &mut self,
        name: &str,
        position: Position,
    ) -> Result<(GetterId, Outcome), ScopeError> {
        self.check_poisoned(name)?;
        let id = GetterId(self.allocate_id());
        self.ensure_chain(name);
        self.getters.insert(id, Getter::new(id, name, position));
        let outcome = self.place_getter(id, position)?;
        Ok((id, outcome))
    }

    /// Replace a variable's data. The chain is not touched.
    pub fn set_data(&mut self, id: VariableId, data: Data<T>) -> Result<(), ScopeError> {
        let variable = self
            .variables
            .get_mut(&id)
            .ok_or(ScopeError::UnknownVariable(id))?;
        variable.data = data;
        Ok(())
    }

    /// Set the data inherited from the enclosing scope. Returns false when no
    /// chain exists for `name`.
    pub fn set_import_data(&mut self, name: &str, data: Data<T>) -> bool {
        match self.import_variable(name) {
            Some(id) => self.set_data(id, data).is_ok(),
            None => false,
        }
    }

    pub fn move_variable(
        &mut self,
        id: VariableId,
        position: Position,
    ) -> Result<Outcome, ScopeError> {
        if !self.variables.contains_key(&id) {
            return Err(ScopeError::UnknownVariable(id));
        }
        self.place_variable(id, position)
    }

    pub fn move_getter(&mut self, id: GetterId, position: Position) -> Result<Outcome, ScopeError> {
        if !self.getters.contains_key(&id) {
            return Err(ScopeError::UnknownGetter(id));
        }
        self.place_getter(id, position)
    }

    /// Move the block anchor, repositioning every chain's import variable.
    ///
    /// All-or-nothing: if some import would pass the first variable of its
    /// chain, that chain is poisoned and nothing else moves, the anchor
    /// included. Chains poisoned earlier are left where they are.
    pub fn move_anchor(&mut self, position: Position) -> Result<Outcome, ScopeError> {
        let mut imports = Vec::with_capacity(self.chains.len());
        let mut overrun = None;
        for (name, chain) in &self.chains {
            if chain.poisoned {
                continue;
            }
            let Some(import) = chain.import() else {
                continue;
            };
            let passes = chain
                .entries
                .get(1)
                .and_then(|first| self.variables.get(first))
                .is_some_and(|first| {
                    self.variables
                        .get(&import)
                        .is_some_and(|v| first.key() < v.key_at(position))
                });
            if passes {
                overrun = Some((name.clone(), import));
                break;
            }
            imports.push(import);
        }
        if let Some((name, import)) = overrun {
            return Err(self.poison(
                &name,
                format!("anchor move to {} passes the first variable after {}", position, import),
            ));
        }

        let mut outcome = Outcome::default();
        for import in imports {
            outcome.merge(self.place_variable(import, position)?);
        }
        self.anchor = position;
        tracing::debug!(anchor = %position, "anchor moved");
        Ok(outcome)
    }

    /// Shift the anchor and every variable and getter by the same offset.
    /// A uniform shift keeps all relative order, so no binding changes.
    /// Fails without moving anything when a position would overflow.
    pub fn translate(&mut self, offset: Offset) -> Result<(), ScopeError> {
        if offset.is_zero() {
            return Ok(());
        }
        let overflow = std::iter::once(self.anchor)
            .chain(self.variables.values().map(|v| v.position))
            .chain(self.getters.values().map(|g| g.position))
            .find(|p| p.checked_add(offset).is_none());
        if let Some(position) = overflow {
            return Err(ScopeError::OutOfRange { position, offset });
        }

        let shift = |p: Position| p.checked_add(offset).unwrap_or(p);
        self.anchor = shift(self.anchor);
        for variable in self.variables.values_mut() {
            variable.position = shift(variable.position);
        }
        for getter in self.getters.values_mut() {
            getter.position = shift(getter.position);
        }
        tracing::trace!(dx = offset.dx, dy = offset.dy, "scope translated");
        Ok(())
    }

    /// Remove a variable, handing its getters to its predecessor.
    pub fn remove_variable(&mut self, id: VariableId) -> Result<(), ScopeError> {
        let name = self
            .variables
            .get(&id)
            .ok_or(ScopeError::UnknownVariable(id))?
            .name
            .clone();
        self.check_poisoned(&name)?;
        self.detach_variable(&name, id)?;
        self.variables.remove(&id);
        self.collect_garbage(&name);
        tracing::debug!(chain = %name, variable = %id, "variable removed");
        Ok(())
    }

    pub fn remove_getter(&mut self, id: GetterId) -> Result<(), ScopeError> {
        let name = self
            .getters
            .get(&id)
            .ok_or(ScopeError::UnknownGetter(id))?
            .name
            .clone();
        self.check_poisoned(&name)?;
        let bound = self.getters.remove(&id).and_then(|g| g.variable);
        if let Some(variable) = bound.and_then(|v| self.variables.get_mut(&v)) {
            variable.getters.retain(|g| *g != id);
        }
        self.collect_garbage(&name);
        Ok(())
    }

    /// Apply one notification as a single step.
    pub fn apply(&mut self, event: ScopeEvent<T>) -> Result<Outcome, ScopeError> {
        match event {
            ScopeEvent::VariableMoved { variable, position } => {
                self.move_variable(variable, position)
            }
            ScopeEvent::GetterMoved { getter, position } => self.move_getter(getter, position),
            ScopeEvent::AnchorMoved(position) => self.move_anchor(position),
            ScopeEvent::Translated(offset) => {
                self.translate(offset)?;
                Ok(Outcome::default())
            }
            ScopeEvent::DataChanged { variable, data } => {
                self.set_data(variable, data)?;
                Ok(Outcome::default())
            }
        }
    }

    /// Apply queued notifications in order. Stops at the first error, leaving
    /// the events after it queued.
    pub fn drain(&mut self, queue: &mut EventQueue<T>) -> Result<Outcome, ScopeError> {
        let mut outcome = Outcome::default();
        while let Some(event) = queue.pop() {
            outcome.merge(self.apply(event)?);
        }
        Ok(outcome)
    }

    /// Verify ordering, index stamps, bindings and getter ownership.
    pub fn check_invariants(&self) -> Result<(), ScopeError> {
        for name in self.chains.keys() {
            self.check_chain_entries(name)?;
        }
        self.check_getter_links(None)
    }

    /// Verify one chain and the getters reading it. Other chains, poisoned or
    /// not, are not looked at.
    pub fn check_chain(&self, name: &str) -> Result<(), ScopeError> {
        self.check_chain_entries(name)?;
        self.check_getter_links(Some(name))
    }

    fn check_chain_entries(&self, name: &str) -> Result<(), ScopeError> {
        let Some(chain) = self.chains.get(name) else {
            return Ok(());
        };
        if chain.poisoned {
            return Err(ScopeError::PoisonedChain(name.to_string()));
        }
        let mut previous: Option<&Variable<T>> = None;
        for (i, id) in chain.entries.iter().enumerate() {
            let variable = self
                .variables
                .get(id)
                .ok_or_else(|| ScopeError::invariant(name, format!("{} is missing", id)))?;
            if variable.index != Some(i) {
                return Err(ScopeError::invariant(
                    name,
                    format!("{} at slot {} is stamped {:?}", id, i, variable.index),
                ));
            }
            if variable.import != (i == 0) {
                return Err(ScopeError::invariant(
                    name,
                    format!("import variable is not at slot 0 ({} at {})", id, i),
                ));
            }
            if previous.is_some_and(|prev| prev.key() >= variable.key()) {
                return Err(ScopeError::invariant(
                    name,
                    format!("{} at {} is out of order", id, variable.position),
                ));
            }
            let next = chain.entries.get(i + 1).and_then(|n| self.variables.get(n));
            for getter_id in &variable.getters {
                let getter = self.getters.get(getter_id).ok_or_else(|| {
                    ScopeError::invariant(name, format!("{} owns missing {}", id, getter_id))
                })?;
                let in_range = variable.position <= getter.position
                    && next.is_none_or(|n| getter.position < n.position);
                if getter.variable != Some(*id) || !in_range {
                    return Err(ScopeError::invariant(
                        name,
                        format!("{} at {} is misowned by {}", getter_id, getter.position, id),
                    ));
                }
            }
            previous = Some(variable);
        }
        if chain.len() <= 1 && previous.is_some_and(|import| import.getters.is_empty()) {
            return Err(ScopeError::invariant(name, "empty chain was not collected"));
        }
        Ok(())
    }

    fn check_getter_links(&self, name: Option<&str>) -> Result<(), ScopeError> {
        let getters = self
            .getters
            .values()
            .filter(|g| name.is_none_or(|name| g.name == name));
        for getter in getters {
            if let Some(id) = getter.variable {
                let owned = self
                    .variables
                    .get(&id)
                    .is_some_and(|v| v.getters.contains(&getter.id));
                if !owned {
                    return Err(ScopeError::invariant(
                        &getter.name,
                        format!("{} points at {} which does not own it", getter.id, id),
                    ));
                }
            }
        }
        Ok(())
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn check_poisoned(&self, name: &str) -> Result<(), ScopeError> {
        match self.chains.get(name) {
            Some(chain) if chain.poisoned => Err(ScopeError::PoisonedChain(name.to_string())),
            _ => Ok(()),
        }
    }

    fn poison(&mut self, name: &str, reason: String) -> ScopeError {
        if let Some(chain) = self.chains.get_mut(name) {
            chain.poisoned = true;
        }
        tracing::error!(chain = name, %reason, "scope invariant violated");
        ScopeError::invariant(name, reason)
    }

    /// Return the chain for `name`, creating it with an import variable at
    /// the anchor.
    fn ensure_chain(&mut self, name: &str) {
        if self.chains.contains_key(name) {
            return;
        }
        let id = VariableId(self.allocate_id());
        self.variables
            .insert(id, Variable::import(id, name, self.anchor));
        self.chains
            .insert(name.to_string(), VariableChain::new(name, id));
        tracing::debug!(chain = name, anchor = %self.anchor, "chain created");
    }

    /// Drop the chain once only its import variable is left and nothing reads it.
    fn collect_garbage(&mut self, name: &str) {
        let Some(chain) = self.chains.get(name) else {
            return;
        };
        if chain.poisoned || chain.len() > 1 {
            return;
        }
        let import = chain.import();
        let read = import
            .and_then(|id| self.variables.get(&id))
            .is_some_and(|v| !v.getters.is_empty());
        if read {
            return;
        }
        self.chains.remove(name);
        if let Some(id) = import {
            self.variables.remove(&id);
        }
        tracing::debug!(chain = name, "chain collected");
    }

    /// Place a variable at `position`, or keep it in its slot when it still
    /// sorts between its neighbors.
    fn place_variable(&mut self, id: VariableId, position: Position) -> Result<Outcome, ScopeError> {
        let (name, index, old) = {
            let v = self
                .variables
                .get(&id)
                .ok_or(ScopeError::UnknownVariable(id))?;
            (v.name.clone(), v.index, v.position)
        };
        self.check_poisoned(&name)?;

        if let Some(index) = index {
            let stays = match self.chains.get(&name) {
                Some(chain) if chain.entries.get(index) == Some(&id) => {
                    let key = self.variables[&id].key_at(position);
                    let (prev, next) = chain.entries.neighbors(index);
                    prev.is_none_or(|p| self.variables[p].key() < key)
                        && next.is_none_or(|n| key < self.variables[n].key())
                }
                _ => {
                    return Err(self.poison(
                        &name,
                        format!("{} is stamped with index {} but is not there", id, index),
                    ));
                }
            };
            if stays {
                if let Some(v) = self.variables.get_mut(&id) {
                    v.position = position;
                }
                let outcome = self.rebalance(&name, id, index, old, position);
                tracing::trace!(chain = %name, variable = %id, %position, "variable kept its slot");
                self.collect_garbage(&name);
                return Ok(outcome);
            }
            self.detach_variable(&name, id)?;
        }

        self.ensure_chain(&name);
        if let Some(v) = self.variables.get_mut(&id) {
            v.position = position;
        }
        let mut outcome = Outcome::default();
        match self.insert_variable(&name, id, position) {
            Some(index) => {
                tracing::debug!(chain = %name, variable = %id, %position, index, "variable placed");
            }
            None => {
                tracing::warn!(chain = %name, variable = %id, %position, "variable precedes the scope anchor");
                outcome.unplaced.push(id);
            }
        }
        self.collect_garbage(&name);
        Ok(outcome)
    }

    /// Take a placed variable out of its chain. Its getters go to the
    /// predecessor, which must exist.
    fn detach_variable(&mut self, name: &str, id: VariableId) -> Result<(), ScopeError> {
        let Some(index) = self.variables.get(&id).and_then(|v| v.index) else {
            return Ok(());
        };
        if index == 0 {
            return Err(self.poison(
                name,
                format!("{} has no predecessor to inherit its getters", id),
            ));
        }
        let prev = match self.chains.get(name) {
            Some(chain) if chain.entries.get(index) == Some(&id) => {
                chain.entries.get(index - 1).copied()
            }
            _ => None,
        };
        let Some(prev) = prev else {
            return Err(self.poison(
                name,
                format!("{} is stamped with index {} but is not there", id, index),
            ));
        };
        let Self {
            chains,
            variables,
            getters,
            ..
        } = self;
        let Some(chain) = chains.get_mut(name) else {
            return Err(ScopeError::invariant(name, format!("{} is placed in a missing chain", id)));
        };

        let moved = variables
            .get_mut(&id)
            .map(|v| mem::take(&mut v.getters))
            .unwrap_or_default();
        for getter_id in &moved {
            if let Some(getter) = getters.get_mut(getter_id) {
                getter.variable = Some(prev);
            }
        }
        if let Some(prev) = variables.get_mut(&prev) {
            prev.getters.extend(moved);
        }

        chain.entries.remove(index);
        restamp(chain, variables, index);
        if let Some(v) = variables.get_mut(&id) {
            v.index = None;
        }
        tracing::trace!(chain = name, variable = %id, "variable detached");
        Ok(())
    }

    /// Insert an unplaced variable, taking the predecessor's getters at or
    /// after `position`. Returns the new index, or `None` when the variable
    /// would precede the import variable.
    fn insert_variable(&mut self, name: &str, id: VariableId, position: Position) -> Option<usize> {
        let Self {
            chains,
            variables,
            getters,
            ..
        } = self;
        let chain = chains.get_mut(name)?;
        let key = variables.get(&id)?.key_at(position);
        let index = chain
            .entries
            .insertion_index(|other| variables[other].key().cmp(&key));
        if index == 0 {
            return None;
        }

        let prev = chain.entries[index - 1];
        let owned = variables
            .get_mut(&prev)
            .map(|v| mem::take(&mut v.getters))
            .unwrap_or_default();
        let (taken, kept): (Vec<GetterId>, Vec<GetterId>) = owned
            .into_iter()
            .partition(|g| getters.get(g).is_some_and(|g| g.position >= position));
        for getter_id in &taken {
            if let Some(getter) = getters.get_mut(getter_id) {
                getter.variable = Some(id);
            }
        }
        if let Some(prev) = variables.get_mut(&prev) {
            prev.getters = kept;
        }
        if let Some(v) = variables.get_mut(&id) {
            v.getters.extend(taken);
        }

        chain.entries.insert(index, id);
        restamp(chain, variables, index);
        Some(index)
    }

    /// Restore getter ownership after a variable moved within its slot.
    fn rebalance(
        &mut self,
        name: &str,
        id: VariableId,
        index: usize,
        old: Position,
        new: Position,
    ) -> Outcome {
        let mut outcome = Outcome::default();
        let Self {
            chains,
            variables,
            getters,
            ..
        } = self;
        let prev = index
            .checked_sub(1)
            .and_then(|i| chains.get(name).and_then(|c| c.entries.get(i)))
            .copied();

        match new.cmp(&old) {
            Ordering::Equal => {}
            Ordering::Greater => {
                let owned = variables
                    .get_mut(&id)
                    .map(|v| mem::take(&mut v.getters))
                    .unwrap_or_default();
                let (released, kept): (Vec<GetterId>, Vec<GetterId>) = owned
                    .into_iter()
                    .partition(|g| getters.get(g).is_some_and(|g| g.position < new));
                if let Some(v) = variables.get_mut(&id) {
                    v.getters = kept;
                }
                for getter_id in &released {
                    if let Some(getter) = getters.get_mut(getter_id) {
                        getter.variable = prev;
                        if prev.is_none() {
                            tracing::warn!(chain = name, getter = %getter_id, position = %getter.position, "unresolved reference");
                        }
                    }
                }
                match prev.and_then(|p| variables.get_mut(&p)) {
                    Some(prev) => prev.getters.extend(released),
                    None => outcome.unresolved.extend(released),
                }
            }
            Ordering::Less => {
                let Some(prev_id) = prev else {
                    return outcome;
                };
                let owned = variables
                    .get_mut(&prev_id)
                    .map(|v| mem::take(&mut v.getters))
                    .unwrap_or_default();
                let (taken, kept): (Vec<GetterId>, Vec<GetterId>) = owned
                    .into_iter()
                    .partition(|g| getters.get(g).is_some_and(|g| g.position >= new));
                for getter_id in &taken {
                    if let Some(getter) = getters.get_mut(getter_id) {
                        getter.variable = Some(id);
                    }
                }
                if let Some(prev) = variables.get_mut(&prev_id) {
                    prev.getters = kept;
                }
                if let Some(v) = variables.get_mut(&id) {
                    v.getters.extend(taken);
                }
            }
        }
        outcome
    }

    /// Bind a getter to the nearest variable at or before `position`, or keep
    /// its binding when it is still in range.
    fn place_getter(&mut self, id: GetterId, position: Position) -> Result<Outcome, ScopeError> {
        let (name, bound) = {
            let g = self.getters.get(&id).ok_or(ScopeError::UnknownGetter(id))?;
            (g.name.clone(), g.variable)
        };
        self.check_poisoned(&name)?;

        if let Some(variable_id) = bound {
            let (start, index) = match self.variables.get(&variable_id) {
                Some(variable) => (variable.position, variable.index),
                None => {
                    return Err(self.poison(
                        &name,
                        format!("{} is bound to missing {}", id, variable_id),
                    ));
                }
            };
            let Some(index) = index else {
                return Err(self.poison(
                    &name,
                    format!("{} is bound to unplaced {}", id, variable_id),
                ));
            };
            let next = self
                .chains
                .get(&name)
                .and_then(|c| c.entries.get(index + 1))
                .and_then(|n| self.variables.get(n))
                .map(|n| n.position);
            if start <= position && next.is_none_or(|n| position < n) {
                if let Some(getter) = self.getters.get_mut(&id) {
                    getter.position = position;
                }
                tracing::trace!(chain = %name, getter = %id, %position, "getter kept its binding");
                return Ok(Outcome::default());
            }
            if let Some(variable) = self.variables.get_mut(&variable_id) {
                variable.getters.retain(|g| *g != id);
            }
        }

        self.ensure_chain(&name);
        let mut outcome = Outcome::default();
        let Self {
            chains,
            variables,
            getters,
            ..
        } = self;
        let Some(getter) = getters.get_mut(&id) else {
            return Err(ScopeError::UnknownGetter(id));
        };
        getter.position = position;
        getter.variable = None;

        let resolved = chains.get(&name).and_then(|chain| {
            let index = chain.entries.insertion_index(|v| {
                if variables[v].position <= position {
                    Ordering::Less
                } else {
                    Ordering::Greater
                }
            });
            index.checked_sub(1).and_then(|i| chain.entries.get(i)).copied()
        });
        match resolved.and_then(|v| variables.get_mut(&v)) {
            Some(variable) => {
                variable.getters.push(id);
                getter.variable = Some(variable.id);
                tracing::trace!(chain = %name, getter = %id, variable = %variable.id, "getter bound");
            }
            None => {
                tracing::warn!(chain = %name, getter = %id, %position, "unresolved reference");
                outcome.unresolved.push(id);
            }
        }
        self.collect_garbage(&name);
        Ok(outcome)
    }
}

fn restamp<T>(
    chain: &VariableChain,
    variables: &mut HashMap<VariableId, Variable<T>>,
    from: usize,
) {
    chain.entries.restamp(from, |i, id| {
        if let Some(v) = variables.get_mut(id) {
            v.index = Some(i);
        }
    });
}
