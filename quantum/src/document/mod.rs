pub mod block;
pub mod element;

use std::collections::{BTreeSet, HashMap};

use serde::Deserialize;

use crate::document::block::{Block, BlockId, Size};
use crate::document::element::{ElementTypes, ScopeElement, deserialize_element};
use crate::error::ScopeError;
use crate::ordered::OrderedChain;
use crate::position::Position;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DocumentError {
    #[error("unknown element type {0}")]
    UnknownElementType(String),

    #[error("unknown block {0}")]
    UnknownBlock(BlockId),

    #[error("{0} is not a scope")]
    NotAScope(BlockId),

    #[error("position {0} is too far from the block to move it there")]
    OutOfRange(Position),

    #[error("{0} is not implemented")]
    UnsupportedOperation(&'static str),

    #[error(transparent)]
    Scope(#[from] ScopeError),
}

/// Layout settings of a document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DocumentConfig {
    pub grid_cell_size: Size,
    pub default_block_size: Size,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        DocumentConfig {
            grid_cell_size: Size::new(20.0, 20.0),
            default_block_size: Size::new(10.0, 10.0),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BlockOptions {
    pub position: Option<Position>,
    pub resizeable: Option<bool>,
    pub serialized_element: Option<String>,
}

/// A flat collection of blocks kept in reading order.
///
/// Not recursive: each scope block resolves its own variables.
#[derive(Debug)]
pub struct Document {
    config: DocumentConfig,
    element_types: ElementTypes,
    blocks: HashMap<BlockId, Block>,
    order: OrderedChain<BlockId>,
    selected: BTreeSet<BlockId>,
    focused: Option<BlockId>,
    next_id: u64,
}

impl Document {
    pub fn new(config: DocumentConfig, element_types: ElementTypes) -> Self {
        Document {
            config,
            element_types,
            blocks: HashMap::new(),
            order: OrderedChain::new(),
            selected: BTreeSet::new(),
            focused: None,
            next_id: 0,
        }
    }

    pub fn config(&self) -> &DocumentConfig {
        &self.config
    }

    pub fn element_types(&self) -> &ElementTypes {
        &self.element_types
    }

    /// Create a block hosting an element of the named type.
    pub fn create_block(
        &mut self,
        type_name: &str,
        options: BlockOptions,
    ) -> Result<BlockId, DocumentError> {
        let element_type = self
            .element_types
            .get(type_name)
            .copied()
            .ok_or_else(|| DocumentError::UnknownElementType(type_name.to_string()))?;

        if let Some(serialized) = &options.serialized_element {
            deserialize_element(serialized)?;
        }

        self.next_id += 1;
        let id = BlockId(self.next_id);
        let position = options.position.unwrap_or(Position::ORIGIN);
        let block = Block {
            id,
            type_name: type_name.to_string(),
            position,
            size: self.config.default_block_size,
            resizeable: options.resizeable.unwrap_or(true),
            selected: false,
            focused: false,
            element: (element_type.create)(position),
        };
        self.blocks.insert(id, block);
        self.insert_ordered(id, position);
        tracing::debug!(block = %id, kind = type_name, %position, "block created");
        Ok(id)
    }

    /// Delete a block. Returns it, or `None` if it did not exist.
    pub fn delete_block(&mut self, id: BlockId) -> Option<Block> {
        let block = self.blocks.remove(&id)?;
        if let Some(index) = self.order.position(|b| *b == id) {
            self.order.remove(index);
        }
        self.selected.remove(&id);
        if self.focused == Some(id) {
            self.focused = None;
        }
        tracing::debug!(block = %id, "block deleted");
        Some(block)
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(&id)
    }

    /// Blocks in reading order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.order.iter().filter_map(|id| self.blocks.get(id))
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn scope(&self, id: BlockId) -> Result<&ScopeElement, DocumentError> {
        let block = self.blocks.get(&id).ok_or(DocumentError::UnknownBlock(id))?;
        block.element.as_scope().ok_or(DocumentError::NotAScope(id))
    }

    pub fn scope_mut(&mut self, id: BlockId) -> Result<&mut ScopeElement, DocumentError> {
        let block = self
            .blocks
            .get_mut(&id)
            .ok_or(DocumentError::UnknownBlock(id))?;
        block
            .element
            .as_scope_mut()
            .ok_or(DocumentError::NotAScope(id))
    }

    /// The topmost block containing `position`. Later blocks in reading
    /// order are on top.
    pub fn block_at(&self, position: Position) -> Option<&Block> {
        self.order
            .iter()
            .rev()
            .filter_map(|id| self.blocks.get(id))
            .find(|block| block.contains(position))
    }

    /// Move a block. Everything in its scope moves along.
    pub fn set_block_position(
        &mut self,
        id: BlockId,
        position: Position,
    ) -> Result<(), DocumentError> {
        let block = self
            .blocks
            .get_mut(&id)
            .ok_or(DocumentError::UnknownBlock(id))?;
        let offset = position
            .checked_offset_from(block.position)
            .ok_or(DocumentError::OutOfRange(position))?;
        if offset.is_zero() {
            return Ok(());
        }
        if let Some(scope) = block.element.as_scope_mut() {
            scope.resolver_mut().translate(offset)?;
        }
        block.position = position;
        if let Some(index) = self.order.position(|b| *b == id) {
            self.order.remove(index);
        }
        self.insert_ordered(id, position);
        tracing::debug!(block = %id, %position, "block moved");
        Ok(())
    }

    pub fn set_block_size(&mut self, id: BlockId, size: Size) -> Result<(), DocumentError> {
        let block = self
            .blocks
            .get_mut(&id)
            .ok_or(DocumentError::UnknownBlock(id))?;
        block.size = size;
        Ok(())
    }

    pub fn set_selected(&mut self, id: BlockId, selected: bool) -> Result<(), DocumentError> {
        let block = self
            .blocks
            .get_mut(&id)
            .ok_or(DocumentError::UnknownBlock(id))?;
        block.selected = selected;
        if selected {
            self.selected.insert(id);
        } else {
            self.selected.remove(&id);
        }
        Ok(())
    }

    pub fn selected_blocks(&self) -> impl Iterator<Item = &Block> {
        self.selected.iter().filter_map(|id| self.blocks.get(id))
    }

    /// Focus or unfocus a block. At most one block has focus.
    pub fn set_focused(&mut self, id: BlockId, focused: bool) -> Result<(), DocumentError> {
        if !self.blocks.contains_key(&id) {
            return Err(DocumentError::UnknownBlock(id));
        }
        if focused {
            let previous = self.focused.take();
            if let Some(block) = previous.and_then(|p| self.blocks.get_mut(&p)) {
                block.focused = false;
            }
            self.focused = Some(id);
        } else if self.focused == Some(id) {
            self.focused = None;
        }
        if let Some(block) = self.blocks.get_mut(&id) {
            block.focused = focused;
        }
        Ok(())
    }

    pub fn focused_block(&self) -> Option<&Block> {
        self.focused.and_then(|id| self.blocks.get(&id))
    }

    fn insert_ordered(&mut self, id: BlockId, position: Position) {
        let blocks = &self.blocks;
        let index = self.order.insertion_index(|other| {
            let other_position = blocks.get(other).map_or(Position::ORIGIN, |b| b.position);
            (other_position, *other).cmp(&(position, id))
        });
        self.order.insert(index, id);
    }
}

impl Default for Document {
    fn default() -> Self {
        Document::new(DocumentConfig::default(), ElementTypes::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::element::{Element, SCOPE_ELEMENT, TEXT_ELEMENT, serialize_element};

    fn at(x: i64, y: i64) -> BlockOptions {
        BlockOptions {
            position: Some(Position::new(x, y)),
            ..BlockOptions::default()
        }
    }

    #[test]
    fn unknown_type_is_rejected() {
        let mut doc = Document::default();
        assert_eq!(
            doc.create_block("chart-element", BlockOptions::default()),
            Err(DocumentError::UnknownElementType("chart-element".into()))
        );
        assert!(doc.is_empty());
    }

    #[test]
    fn serialized_elements_are_unsupported() {
        let mut doc = Document::default();
        let options = BlockOptions {
            serialized_element: Some("{}".into()),
            ..BlockOptions::default()
        };
        assert!(matches!(
            doc.create_block(SCOPE_ELEMENT, options),
            Err(DocumentError::UnsupportedOperation(_))
        ));
        assert!(serialize_element(&Element::Text(String::new())).is_err());
    }

    #[test]
    fn blocks_are_kept_in_reading_order() {
        let mut doc = Document::default();
        let c = doc.create_block(TEXT_ELEMENT, at(0, 20)).unwrap();
        let a = doc.create_block(TEXT_ELEMENT, at(5, 0)).unwrap();
        let b = doc.create_block(TEXT_ELEMENT, at(0, 10)).unwrap();
        let order: Vec<BlockId> = doc.blocks().map(|b| b.id()).collect();
        assert_eq!(order, vec![a, b, c]);

        doc.set_block_position(a, Position::new(0, 30)).unwrap();
        let order: Vec<BlockId> = doc.blocks().map(|b| b.id()).collect();
        assert_eq!(order, vec![b, c, a]);
    }

    #[test]
    fn block_at_prefers_later_blocks() {
        let mut doc = Document::default();
        let under = doc.create_block(TEXT_ELEMENT, at(0, 0)).unwrap();
        let over = doc.create_block(TEXT_ELEMENT, at(5, 5)).unwrap();
        assert_eq!(doc.block_at(Position::new(2, 2)).map(|b| b.id()), Some(under));
        assert_eq!(doc.block_at(Position::new(10, 10)).map(|b| b.id()), Some(over));
        assert_eq!(doc.block_at(Position::new(7, 7)).map(|b| b.id()), Some(over));
        assert!(doc.block_at(Position::new(40, 40)).is_none());
    }

    #[test]
    fn moving_a_scope_block_moves_its_bindings() {
        let mut doc = Document::default();
        let id = doc.create_block(SCOPE_ELEMENT, at(0, 0)).unwrap();
        let resolver = doc.scope_mut(id).unwrap().resolver_mut();
        let (v, _) = resolver.add_variable("x", Position::new(2, 1)).unwrap();
        let (g, _) = resolver.add_getter("x", Position::new(4, 1)).unwrap();

        doc.set_block_position(id, Position::new(10, 10)).unwrap();

        let resolver = doc.scope(id).unwrap().resolver();
        assert_eq!(resolver.anchor(), Position::new(10, 10));
        assert_eq!(resolver.variable(v).unwrap().position(), Position::new(12, 11));
        assert_eq!(resolver.binding(g).unwrap(), v);
        resolver.check_invariants().unwrap();
    }

    #[test]
    fn moves_off_the_grid_are_refused() {
        let mut doc = Document::default();
        let text = doc.create_block(TEXT_ELEMENT, at(-1, 0)).unwrap();
        assert_eq!(
            doc.set_block_position(text, Position::new(i64::MAX, 0)),
            Err(DocumentError::OutOfRange(Position::new(i64::MAX, 0)))
        );
        assert_eq!(doc.block(text).unwrap().position(), Position::new(-1, 0));

        let scope = doc.create_block(SCOPE_ELEMENT, at(0, 0)).unwrap();
        let resolver = doc.scope_mut(scope).unwrap().resolver_mut();
        let (v, _) = resolver.add_variable("x", Position::new(5, 0)).unwrap();
        let err = doc
            .set_block_position(scope, Position::new(i64::MAX - 2, 0))
            .unwrap_err();
        assert!(matches!(err, DocumentError::Scope(ScopeError::OutOfRange { .. })));

        assert_eq!(doc.block(scope).unwrap().position(), Position::ORIGIN);
        let resolver = doc.scope(scope).unwrap().resolver();
        assert_eq!(resolver.anchor(), Position::ORIGIN);
        assert_eq!(resolver.variable(v).unwrap().position(), Position::new(5, 0));
    }

    #[test]
    fn focus_is_exclusive() {
        let mut doc = Document::default();
        let a = doc.create_block(TEXT_ELEMENT, at(0, 0)).unwrap();
        let b = doc.create_block(TEXT_ELEMENT, at(0, 20)).unwrap();
        doc.set_focused(a, true).unwrap();
        doc.set_focused(b, true).unwrap();
        assert!(!doc.block(a).unwrap().focused());
        assert_eq!(doc.focused_block().map(|b| b.id()), Some(b));

        doc.set_focused(b, false).unwrap();
        assert!(doc.focused_block().is_none());
    }

    #[test]
    fn delete_clears_selection() {
        let mut doc = Document::default();
        let a = doc.create_block(TEXT_ELEMENT, at(0, 0)).unwrap();
        doc.set_selected(a, true).unwrap();
        assert_eq!(doc.selected_blocks().count(), 1);
        assert!(doc.delete_block(a).is_some());
        assert_eq!(doc.selected_blocks().count(), 0);
        assert!(doc.delete_block(a).is_none());
        assert_eq!(doc.scope(a).unwrap_err(), DocumentError::UnknownBlock(a));
    }

    #[test]
    fn text_block_is_not_a_scope() {
        let mut doc = Document::default();
        let a = doc.create_block(TEXT_ELEMENT, at(0, 0)).unwrap();
        assert_eq!(doc.scope(a).unwrap_err(), DocumentError::NotAScope(a));
    }
}
