use crate::storage::{GridPoint, GridStorage};

pub trait GridIteratorT
{
    fn point(&self) -> &GridPoint;
    fn seq(&self) -> Option<usize>;
    fn reset_to_level_zero(&mut self) -> bool;
    fn reset_to_left_level_zero(&mut self, dim: usize) -> bool;
    fn reset_to_right_level_zero(&mut self, dim: usize) -> bool;
    fn reset_to_level_one(&mut self, dim: usize) -> bool;
    fn left_child(&mut self, dim: usize) -> bool;
    fn right_child(&mut self, dim: usize) -> bool;
    fn step_right(&mut self, dim: usize) -> bool;
    fn up(&mut self, dim: usize) -> bool;
    fn is_leaf(&self) -> bool;
}

///
/// Moves over the points of a storage by dyadic tree navigation, resolving
/// each position through the storage's hash map. Starts at the level-one
/// root in every dimension.
///
pub struct HashMapGridIterator<'a>
{
    pub(crate) storage: &'a GridStorage,
    index: GridPoint,
    seq: Option<usize>,
}

impl<'a> HashMapGridIterator<'a>
{
    pub fn new(storage: &'a GridStorage) -> Self
    {
        let d = storage.num_dims();
        let point = GridPoint::new(&vec![1; d], &vec![1; d], false);
        let seq = storage.index_of(&point);
        Self { storage, index: point, seq }
    }

}

impl GridIteratorT for HashMapGridIterator<'_>
{
    #[inline(always)]
    fn point(&self) -> &GridPoint
    {
        &self.index
    }

    #[inline(always)]
    fn seq(&self) -> Option<usize>
    {
        self.seq
    }

    fn reset_to_level_zero(&mut self) -> bool
    {
        self.index.index.fill(0);
        self.index.level.fill(0);
        self.seq = self.storage.index_of(&self.index);
        self.seq.is_some()
    }
    fn reset_to_left_level_zero(&mut self, dim: usize) -> bool
    {
        self.index.level[dim] = 0;
        self.index.index[dim] = 0;
        self.seq = self.storage.index_of(&self.index);
        self.seq.is_some()
    }
    fn reset_to_right_level_zero(&mut self, dim: usize) -> bool
    {
        self.index.level[dim] = 0;
        self.index.index[dim] = 1;
        self.seq = self.storage.index_of(&self.index);
        self.seq.is_some()
    }
    fn reset_to_level_one(&mut self, dim: usize) -> bool
    {
        self.index.level[dim] = 1;
        self.index.index[dim] = 1;
        self.seq = self.storage.index_of(&self.index);
        self.seq.is_some()
    }
    fn left_child(&mut self, dim: usize) -> bool
    {
        let i = self.index.index[dim];
        if i == 0
        {
            self.seq = None;
            return false;
        }
        self.index.level[dim] += 1;
        self.index.index[dim] = 2 * i - 1;
        self.seq = self.storage.index_of(&self.index);
        self.seq.is_some()
    }
    fn right_child(&mut self, dim: usize) -> bool
    {
        let i = self.index.index[dim];
        self.index.level[dim] += 1;
        self.index.index[dim] = 2 * i + 1;
        self.seq = self.storage.index_of(&self.index);
        self.seq.is_some()
    }
    fn step_right(&mut self, dim: usize) -> bool
    {
        self.index.index[dim] += 2;
        self.seq = self.storage.index_of(&self.index);
        self.seq.is_some()
    }
    fn up(&mut self, dim: usize) -> bool
    {
        let l = self.index.level[dim];
        if l == 0
        {
            self.seq = None;
            return false;
        }
        let mut i = self.index.index[dim];
        i /= 2;
        i += if i % 2 == 0 { 1 } else { 0 };
        self.index.level[dim] = l - 1;
        self.index.index[dim] = i;
        self.seq = self.storage.index_of(&self.index);
        self.seq.is_some()
    }

    /// Leaf state of the current position; positions not present in storage
    /// report leaf so tree walks terminate.
    fn is_leaf(&self) -> bool
    {
        if let Some(seq) = self.seq
        {
            self.storage.is_leaf(seq)
        }
        else
        {
            true
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn three_point_line() -> GridStorage
    {
        let mut storage = GridStorage::new(1);
        storage.insert(GridPoint::new(&[1], &[1], false));
        storage.insert(GridPoint::new(&[2], &[1], true));
        storage.insert(GridPoint::new(&[2], &[3], true));
        storage
    }

    #[test]
    fn child_sibling_parent_walk()
    {
        let storage = three_point_line();
        let mut it = HashMapGridIterator::new(&storage);
        assert_eq!(it.seq(), Some(0));
        assert!(it.left_child(0));
        assert_eq!(it.seq(), Some(1));
        assert!(it.step_right(0));
        assert_eq!(it.seq(), Some(2));
        assert!(it.up(0));
        assert_eq!(it.seq(), Some(0));
        assert!(!it.is_leaf());
        assert!(it.right_child(0));
        assert_eq!(it.seq(), Some(2));
    }

    #[test]
    fn missing_positions_report_leaf()
    {
        let storage = three_point_line();
        let mut it = HashMapGridIterator::new(&storage);
        it.left_child(0);
        assert!(!it.left_child(0));
        assert!(it.is_leaf());
    }
}
