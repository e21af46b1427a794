use std::cmp::Ordering;
use std::ops::Index;

/// A vector kept sorted by its callers.
///
/// The chain only offers the primitives needed to keep a sorted sequence:
/// binary search for an insertion point, neighbor access and splicing. It
/// does not know how its elements are ordered; every search takes a
/// comparator. Elements that cache their own index must be re-stamped with
/// [`OrderedChain::restamp`] after any structural edit.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedChain<T> {
    items: Vec<T>,
}

impl<T> OrderedChain<T> {
    pub fn new() -> Self {
        OrderedChain { items: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    pub fn last(&self) -> Option<&T> {
        self.items.last()
    }

    /// The elements directly before and after `index`.
    pub fn neighbors(&self, index: usize) -> (Option<&T>, Option<&T>) {
        let prev = index.checked_sub(1).and_then(|i| self.items.get(i));
        let next = self.items.get(index + 1);
        (prev, next)
    }

    /// Binary search for where an element should be inserted.
    ///
    /// `cmp` compares a stored element against the sought key. If an element
    /// compares equal its index is returned; otherwise the index at which the
    /// key would keep the sequence sorted. Callers that need an upper bound
    /// map `Equal` to `Less` in their comparator.
    pub fn insertion_index(&self, cmp: impl FnMut(&T) -> Ordering) -> usize {
        match self.items.binary_search_by(cmp) {
            Ok(index) | Err(index) => index,
        }
    }

    pub fn insert(&mut self, index: usize, item: T) {
        self.items.insert(index, item);
    }

    pub fn remove(&mut self, index: usize) -> T {
        self.items.remove(index)
    }

    /// Remove `remove_count` elements at `index` and insert `items` in their
    /// place. Returns the removed elements.
    pub fn splice(
        &mut self,
        index: usize,
        remove_count: usize,
        items: impl IntoIterator<Item = T>,
    ) -> Vec<T> {
        self.items
            .splice(index..index + remove_count, items)
            .collect()
    }

    /// Call `stamp(i, item)` for every element from `from` to the end.
    pub fn restamp(&self, from: usize, mut stamp: impl FnMut(usize, &T)) {
        for (i, item) in self.items.iter().enumerate().skip(from) {
            stamp(i, item);
        }
    }

    /// Index of the first element for which `found` holds, scanning linearly.
    pub fn position(&self, found: impl FnMut(&T) -> bool) -> Option<usize> {
        self.items.iter().position(found)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }
}

impl<T> Default for OrderedChain<T> {
    fn default() -> Self {
        OrderedChain::new()
    }
}

impl<T> Index<usize> for OrderedChain<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.items[index]
    }
}

impl<'a, T> IntoIterator for &'a OrderedChain<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(values: &[i32]) -> OrderedChain<i32> {
        let mut chain = OrderedChain::new();
        chain.splice(0, 0, values.iter().copied());
        chain
    }

    #[test]
    fn insertion_index_finds_gap_or_match() {
        let c = chain(&[1, 3, 5, 7]);
        assert_eq!(c.insertion_index(|v| v.cmp(&0)), 0);
        assert_eq!(c.insertion_index(|v| v.cmp(&4)), 2);
        assert_eq!(c.insertion_index(|v| v.cmp(&9)), 4);
        assert_eq!(c.insertion_index(|v| v.cmp(&5)), 2);
    }

    #[test]
    fn upper_bound_by_folding_equal() {
        let c = chain(&[1, 3, 5, 7]);
        let upper = c.insertion_index(|v| if *v <= 5 { Ordering::Less } else { Ordering::Greater });
        assert_eq!(upper, 3);
    }

    #[test]
    fn neighbors_at_edges() {
        let c = chain(&[1, 3, 5]);
        assert_eq!(c.neighbors(0), (None, Some(&3)));
        assert_eq!(c.neighbors(1), (Some(&1), Some(&5)));
        assert_eq!(c.neighbors(2), (Some(&3), None));
    }

    #[test]
    fn splice_and_restamp() {
        let mut c = chain(&[1, 3, 5, 7]);
        let removed = c.splice(1, 2, [2, 4, 6]);
        assert_eq!(removed, vec![3, 5]);
        assert_eq!(c.as_slice(), &[1, 2, 4, 6, 7]);

        let mut stamped = Vec::new();
        c.restamp(3, |i, v| stamped.push((i, *v)));
        assert_eq!(stamped, vec![(3, 6), (4, 7)]);
    }
}
