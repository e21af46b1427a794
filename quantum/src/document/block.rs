use std::fmt;

use serde::{Deserialize, Serialize};

use crate::document::element::Element;
use crate::position::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub(crate) u64);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block#{}", self.0)
    }
}

/// Extent of a block in grid cells. May be fractional.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Size { width, height }
    }
}

impl From<[f64; 2]> for Size {
    fn from([width, height]: [f64; 2]) -> Self {
        Size { width, height }
    }
}

impl From<Size> for [f64; 2] {
    fn from(s: Size) -> Self {
        [s.width, s.height]
    }
}

/// A positioned, sized element in the document.
#[derive(Debug)]
pub struct Block {
    pub(crate) id: BlockId,
    pub(crate) type_name: String,
    pub(crate) position: Position,
    pub(crate) size: Size,
    pub(crate) resizeable: bool,
    pub(crate) selected: bool,
    pub(crate) focused: bool,
    pub(crate) element: Element,
}

impl Block {
    pub fn id(&self) -> BlockId {
        self.id
    }

    /// Name of the element type the block was created with.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn resizeable(&self) -> bool {
        self.resizeable
    }

    pub fn selected(&self) -> bool {
        self.selected
    }

    pub fn focused(&self) -> bool {
        self.focused
    }

    pub fn element(&self) -> &Element {
        &self.element
    }

    /// Whether `point` lies inside the block, edges included.
    pub fn contains(&self, point: Position) -> bool {
        let (x, y) = (point.x as f64, point.y as f64);
        let (left, top) = (self.position.x as f64, self.position.y as f64);
        top <= y && y <= top + self.size.height && left <= x && x <= left + self.size.width
    }
}
