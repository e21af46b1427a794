use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A cell coordinate on the document grid.
///
/// Positions are totally ordered in reading order: rows top to bottom (`y`),
/// then columns left to right (`x`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "[i64; 2]", into = "[i64; 2]")]
pub struct Position {
    pub x: i64,
    pub y: i64,
}

impl Position {
    pub const ORIGIN: Position = Position { x: 0, y: 0 };

    pub const fn new(x: i64, y: i64) -> Self {
        Position { x, y }
    }

    /// `self` shifted by `offset`, or `None` when a coordinate overflows.
    pub fn checked_add(self, offset: Offset) -> Option<Position> {
        Some(Position::new(
            self.x.checked_add(offset.dx)?,
            self.y.checked_add(offset.dy)?,
        ))
    }

    /// The offset that carries `origin` onto `self`, or `None` when it does
    /// not fit in an `i64`.
    pub fn checked_offset_from(self, origin: Position) -> Option<Offset> {
        Some(Offset {
            dx: self.x.checked_sub(origin.x)?,
            dy: self.y.checked_sub(origin.y)?,
        })
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.y.cmp(&other.y).then(self.x.cmp(&other.x))
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<[i64; 2]> for Position {
    fn from([x, y]: [i64; 2]) -> Self {
        Position { x, y }
    }
}

impl From<Position> for [i64; 2] {
    fn from(p: Position) -> Self {
        [p.x, p.y]
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A displacement between two positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Offset {
    pub dx: i64,
    pub dy: i64,
}

impl Offset {
    pub const ZERO: Offset = Offset { dx: 0, dy: 0 };

    pub fn is_zero(&self) -> bool {
        *self == Offset::ZERO
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:+}, {:+})", self.dx, self.dy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_before_columns() {
        assert!(Position::new(9, 0) < Position::new(0, 1));
        assert!(Position::new(-1, 0) < Position::ORIGIN);
        assert!(Position::new(5, 0) < Position::new(7, 0));
    }

    #[test]
    fn translation_preserves_order() {
        let a = Position::new(3, 2);
        let b = Position::new(-4, 5);
        let offset = Offset { dx: 17, dy: -9 };
        let (a2, b2) = (a.checked_add(offset).unwrap(), b.checked_add(offset).unwrap());
        assert_eq!(a.cmp(&b), a2.cmp(&b2));
        assert_eq!(a2.checked_offset_from(a), Some(offset));
    }

    #[test]
    fn overflowing_shifts_are_refused() {
        let edge = Position::new(i64::MAX, 0);
        assert_eq!(edge.checked_add(Offset { dx: 1, dy: 0 }), None);
        assert_eq!(edge.checked_offset_from(Position::new(-1, 0)), None);
        assert_eq!(
            Position::new(0, i64::MIN).checked_add(Offset { dx: 0, dy: -1 }),
            None
        );
        assert_eq!(
            edge.checked_offset_from(Position::new(1, 0)),
            Some(Offset { dx: i64::MAX - 1, dy: 0 })
        );
    }
}
