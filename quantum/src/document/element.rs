use std::collections::BTreeMap;

use crate::document::DocumentError;
use crate::position::Position;
use crate::scope::ScopeResolver;
use crate::value::Value;

pub const SCOPE_ELEMENT: &str = "scope-element";
pub const TEXT_ELEMENT: &str = "text-element";

/// The content hosted by a block.
#[derive(Debug)]
pub enum Element {
    Scope(ScopeElement),
    Text(String),
}

impl Element {
    pub fn as_scope(&self) -> Option<&ScopeElement> {
        match self {
            Element::Scope(scope) => Some(scope),
            _ => None,
        }
    }

    pub fn as_scope_mut(&mut self) -> Option<&mut ScopeElement> {
        match self {
            Element::Scope(scope) => Some(scope),
            _ => None,
        }
    }
}

/// A block whose variables are visible by position to everything after them.
#[derive(Debug)]
pub struct ScopeElement {
    /// Used for named imports.
    name: String,
    /// A closed scope does not import variables from its parent scope.
    closed: bool,
    resolver: ScopeResolver<Value>,
}

impl ScopeElement {
    pub fn new(anchor: Position) -> Self {
        ScopeElement {
            name: String::new(),
            closed: false,
            resolver: ScopeResolver::new(anchor),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn closed(&self) -> bool {
        self.closed
    }

    pub fn set_closed(&mut self, closed: bool) {
        self.closed = closed;
    }

    pub fn resolver(&self) -> &ScopeResolver<Value> {
        &self.resolver
    }

    pub fn resolver_mut(&mut self) -> &mut ScopeResolver<Value> {
        &mut self.resolver
    }
}

/// Constructor for one kind of element, receiving the block's position.
#[derive(Debug, Clone, Copy)]
pub struct ElementType {
    pub type_name: &'static str,
    pub create: fn(Position) -> Element,
}

/// Registry of the element types a document can create.
#[derive(Debug, Clone)]
pub struct ElementTypes {
    types: BTreeMap<String, ElementType>,
}

impl ElementTypes {
    pub fn empty() -> Self {
        ElementTypes {
            types: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, element_type: ElementType) {
        self.types
            .insert(element_type.type_name.to_string(), element_type);
    }

    pub fn get(&self, type_name: &str) -> Option<&ElementType> {
        self.types.get(type_name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(|k| k.as_str())
    }
}

impl Default for ElementTypes {
    fn default() -> Self {
        let mut types = ElementTypes::empty();
        types.register(ElementType {
            type_name: SCOPE_ELEMENT,
            create: |anchor| Element::Scope(ScopeElement::new(anchor)),
        });
        types.register(ElementType {
            type_name: TEXT_ELEMENT,
            create: |_| Element::Text(String::new()),
        });
        types
    }
}

pub fn serialize_element(_element: &Element) -> Result<String, DocumentError> {
    Err(DocumentError::UnsupportedOperation("element serialization"))
}

pub fn deserialize_element(_data: &str) -> Result<Element, DocumentError> {
    Err(DocumentError::UnsupportedOperation("element deserialization"))
}
