use std::hash::{Hash, Hasher};
use bitfield_struct::bitfield;
use nohash_hasher::BuildNoHashHasher;
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use crate::errors::SGError;

pub type FastU64Map<V> = std::collections::HashMap<u64, V, BuildNoHashHasher<u64>>;

#[bitfield(u8, new = false)]
#[derive(Serialize, Deserialize, PartialEq, Eq)]
pub struct GridPointFlags
{
    pub is_leaf: bool,
    pub is_inner: bool,
    #[bits(6)]
    pub _empty: u8
}

impl GridPointFlags
{
    pub fn new(level: &[u8], is_leaf: bool) -> Self
    {
        let mut r = Self::default();
        r.set_is_leaf(is_leaf);
        r.set_is_inner(!level.contains(&0));
        r
    }
    pub fn update_is_inner(&mut self, level: &[u8])
    {
        self.set_is_inner(!level.contains(&0));
    }
}

///
/// A single grid point: one (level, index) pair per dimension plus flags.
/// The unit coordinate in dimension `d` is `index[d] / 2^level[d]`; level-0
/// points denote the two domain boundaries (index 0 and 1).
///
#[serde_as]
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct GridPoint
{
    pub level: Vec<u8>,
    pub index: Vec<u32>,
    pub(crate) flags: GridPointFlags,
}

impl Hash for GridPoint
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.level.hash(state);
        self.index.hash(state);
    }
}
impl Default for GridPoint
{
    fn default() -> Self {
        Self { level: vec![], index: vec![], flags: GridPointFlags(0) }
    }
}
impl PartialEq for GridPoint
{
    fn eq(&self, other: &Self) -> bool {
        self.level == other.level && self.index == other.index
    }
}
impl Eq for GridPoint{}

impl PartialOrd for GridPoint
{
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(std::cmp::Ord::cmp(self, other))
    }
}
impl Ord for GridPoint
{
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.index.cmp(&other.index).then(self.level.cmp(&other.level))
    }
}

impl GridPoint
{
    pub fn new(level: &[u8], index: &[u32], is_leaf: bool) -> Self
    {
        let flags = GridPointFlags::new(level, is_leaf);
        Self { level: level.to_vec(), index: index.to_vec(), flags }
    }
    pub fn num_dims(&self) -> usize
    {
        self.level.len()
    }
    pub fn is_leaf(&self) -> bool
    {
        self.flags.is_leaf()
    }
    pub fn set_is_leaf(&mut self, is_leaf: bool)
    {
        self.flags.set_is_leaf(is_leaf);
    }
    /// This is an inner point if no levels are zero.
    pub fn is_inner_point(&self) -> bool
    {
        self.flags.is_inner()
    }
    pub fn level_sum(&self) -> u8
    {
        self.level.iter().sum()
    }
    #[inline]
    pub fn level_max(&self) -> u8
    {
        *self.level.iter().max().unwrap_or(&0)
    }

    pub fn left_child(&self, dim: usize) -> GridPoint
    {
        let mut r = self.clone();
        if r.index[dim] == 0
        {
            r.index[dim] = u32::MAX;
            return r;
        }
        r.index[dim] = 2 * self.index[dim] - 1;
        r.level[dim] += 1;
        r
    }
    pub fn right_child(&self, dim: usize) -> GridPoint
    {
        let mut r = self.clone();
        r.index[dim] = 2 * self.index[dim] + 1;
        r.level[dim] += 1;
        r
    }
    /// returns the point with the top level in direction dim
    pub fn root(&self, dim: usize) -> GridPoint
    {
        let mut r = self.clone();
        r.index[dim] = 1;
        r.level[dim] = 1;
        r
    }
    /// Dyadic parent in direction dim. Only meaningful for level > 0.
    pub fn parent(&self, dim: usize) -> GridPoint
    {
        let mut r = self.clone();
        if self.level[dim] == 0
        {
            r.index[dim] = u32::MAX;
            return r;
        }
        let i = self.index[dim];
        r.index[dim] = if ((i + 1) / 2) % 2 == 1 { (i + 1) / 2 } else { (i - 1) / 2 };
        r.level[dim] -= 1;
        r
    }

    pub fn unit_coordinate(&self) -> Vec<f64>
    {
        let mut coor = vec![0.0; self.index.len()];
        #[allow(clippy::needless_range_loop)]
        for d in 0..self.index.len()
        {
            coor[d] = self.index[d] as f64 / (1u64 << self.level[d]) as f64;
        }
        coor
    }
}

impl From<GridPoint> for u64
{
    fn from(val: GridPoint) -> Self {
        let hasher = &mut FxHasher::default();
        val.hash(hasher);
        hasher.finish()
    }
}
impl From<&GridPoint> for u64
{
    fn from(val: &GridPoint) -> Self {
        let hasher = &mut FxHasher::default();
        val.hash(hasher);
        hasher.finish()
    }
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct BoundingBox
{
    pub lower: Vec<f64>,
    pub upper: Vec<f64>
}

impl BoundingBox
{
    #[inline]
    pub fn new(lower: &[f64], upper: &[f64]) -> Self
    {
        Self { lower: lower.to_vec(), upper: upper.to_vec() }
    }
    pub fn with_dim(num_dims: usize) -> Self
    {
        Self { lower: vec![0.0; num_dims], upper: vec![1.0; num_dims] }
    }
    /// Interval width in direction dim; the scale q of operator kernels.
    #[inline]
    pub fn width(&self, dim: usize) -> f64
    {
        self.upper[dim] - self.lower[dim]
    }
    /// Interval offset in direction dim.
    #[inline]
    pub fn offset(&self, dim: usize) -> f64
    {
        self.lower[dim]
    }
    pub fn is_unit_cube(&self) -> bool
    {
        for d in 0..self.lower.len()
        {
            if self.lower[d] != 0.0 || self.upper[d] != 1.0
            {
                return false;
            }
        }
        true
    }
    #[inline]
    pub fn to_real_coordinate_in_place(&self, point: &mut [f64])
    {
        for i in 0..point.len()
        {
            point[i] = self.lower[i] + (self.upper[i] - self.lower[i]) * point[i];
        }
    }
}

///
/// Owner of the point set: a growable arena of per-dimension (level, index)
/// records plus a hash map from canonical point key to arena slot. The slot
/// of a point is its sequence number; coefficient vectors held by callers
/// are indexed by it.
///
/// `remove` is the only operation that renumbers existing points.
///
/// There is no internal locking: refinement and coarsening require
/// exclusive access, and sweeps read a fixed snapshot.
///
#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GridStorage
{
    pub bounding_box: BoundingBox,
    pub(crate) index: Vec<u32>,
    pub(crate) level: Vec<u8>,
    pub(crate) flags: Vec<GridPointFlags>,
    pub(crate) num_dims: usize,
    pub(crate) map: FastU64Map<u32>,
    pub(crate) has_boundary: bool,
}

impl GridStorage
{
    pub fn new(num_dims: usize) -> Self
    {
        Self
        {
            bounding_box: BoundingBox::with_dim(num_dims),
            index: Vec::new(),
            level: Vec::new(),
            flags: Vec::new(),
            num_dims,
            map: FastU64Map::default(),
            has_boundary: false,
        }
    }

    #[inline]
    pub fn num_dims(&self) -> usize
    {
        self.num_dims
    }

    #[inline]
    pub fn len(&self) -> usize
    {
        self.flags.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool
    {
        self.flags.is_empty()
    }

    #[inline(always)]
    pub fn has_boundary(&self) -> bool
    {
        self.has_boundary
    }

    #[inline]
    pub fn point(&self, seq: usize) -> GridPoint
    {
        let d = self.num_dims;
        GridPoint
        {
            level: self.level[seq * d..(seq + 1) * d].to_vec(),
            index: self.index[seq * d..(seq + 1) * d].to_vec(),
            flags: self.flags[seq],
        }
    }

    #[inline(always)]
    pub fn level(&self, seq: usize, dim: usize) -> u8
    {
        self.level[self.num_dims * seq + dim]
    }

    #[inline(always)]
    pub fn index(&self, seq: usize, dim: usize) -> u32
    {
        self.index[self.num_dims * seq + dim]
    }

    #[inline]
    pub fn is_leaf(&self, seq: usize) -> bool
    {
        self.flags[seq].is_leaf()
    }

    #[inline]
    pub fn set_is_leaf(&mut self, seq: usize, value: bool)
    {
        self.flags[seq].set_is_leaf(value);
    }

    ///
    /// Appends a point and returns its sequence number. The caller must have
    /// established the ancestor closure already; this is not re-validated
    /// here (the refinement engine guarantees it).
    ///
    pub fn insert(&mut self, mut point: GridPoint) -> usize
    {
        point.flags.update_is_inner(&point.level);
        let key: u64 = (&point).into();
        self.flags.push(point.flags);
        self.index.extend(point.index);
        self.level.extend(point.level);
        self.map.insert(key, self.flags.len() as u32 - 1);
        self.flags.len() - 1
    }

    ///
    /// Replaces the point stored in an existing slot, re-keying the map.
    /// Used by the grid generators when widening a grid dimension by
    /// dimension; the replaced point is expected to be re-inserted later in
    /// the same pass if it remains part of the grid.
    ///
    pub(crate) fn update(&mut self, mut point: GridPoint, seq: usize)
    {
        point.flags.update_is_inner(&point.level);
        let old = self.point(seq);
        self.map.remove(&(&old).into());
        let key: u64 = (&point).into();
        self.map.insert(key, seq as u32);
        let d = self.num_dims;
        self.index[seq * d..(seq + 1) * d].copy_from_slice(&point.index);
        self.level[seq * d..(seq + 1) * d].copy_from_slice(&point.level);
        self.flags[seq] = point.flags;
    }

    #[inline]
    pub fn index_of(&self, point: &GridPoint) -> Option<usize>
    {
        self.map.get(&point.into()).map(|&v| v as usize)
    }

    #[inline]
    pub fn contains(&self, point: &GridPoint) -> bool
    {
        self.map.contains_key(&point.into())
    }

    ///
    /// Removes a leaf point and returns its former sequence number. Every
    /// point with a larger sequence number is shifted down by exactly one;
    /// callers must re-align coefficient vectors accordingly. Removing a
    /// point with children would orphan its descendants, so it is rejected.
    ///
    pub fn remove(&mut self, point: &GridPoint) -> Result<usize, SGError>
    {
        let key: u64 = point.into();
        let seq = *self.map.get(&key).ok_or(SGError::InvalidIndex)? as usize;
        if self.has_children(point)
        {
            return Err(SGError::NonLeafRemoval);
        }
        self.map.remove(&key);
        let d = self.num_dims;
        self.index.drain(seq * d..(seq + 1) * d);
        self.level.drain(seq * d..(seq + 1) * d);
        self.flags.remove(seq);
        for v in self.map.values_mut()
        {
            if *v > seq as u32
            {
                *v -= 1;
            }
        }
        Ok(seq)
    }

    ///
    /// True if the point has at least one child in storage. Boundary points
    /// (level 0) have the single (1,1) child in that dimension.
    ///
    pub fn has_children(&self, point: &GridPoint) -> bool
    {
        for dim in 0..self.num_dims
        {
            if point.level[dim] > 0
            {
                if self.contains(&point.left_child(dim)) || self.contains(&point.right_child(dim))
                {
                    return true;
                }
            }
            else
            {
                let mut child = point.clone();
                child.level[dim] = 1;
                child.index[dim] = 1;
                if self.contains(&child)
                {
                    return true;
                }
            }
        }
        false
    }

    /// Flat levels and indices in sequence order, `num_dims` entries per
    /// point. A pure read for vectorized evaluators.
    #[inline]
    pub fn level_index_arrays(&self) -> (&[u8], &[u32])
    {
        (&self.level, &self.index)
    }

    pub fn unit_coordinate(&self, seq: usize) -> Vec<f64>
    {
        let mut coor = vec![0.0; self.num_dims];
        #[allow(clippy::needless_range_loop)]
        for d in 0..self.num_dims
        {
            coor[d] = self.index[seq * self.num_dims + d] as f64
                / (1u64 << self.level[seq * self.num_dims + d]) as f64;
        }
        coor
    }

    pub fn nodes(&self) -> impl Iterator<Item = GridPoint> + '_
    {
        (0..self.len()).map(|seq| self.point(seq))
    }

    #[inline]
    pub fn bounding_box(&self) -> &BoundingBox
    {
        &self.bounding_box
    }
    #[inline]
    pub fn bounding_box_mut(&mut self) -> &mut BoundingBox
    {
        &mut self.bounding_box
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn insert_and_find()
    {
        let mut storage = GridStorage::new(2);
        let root = GridPoint::new(&[1, 1], &[1, 1], true);
        let seq = storage.insert(root.clone());
        assert_eq!(seq, 0);
        assert_eq!(storage.index_of(&root), Some(0));
        assert_eq!(storage.len(), 1);
        assert!(storage.is_leaf(0));
        assert!(!storage.contains(&GridPoint::new(&[2, 1], &[1, 1], true)));
    }

    #[test]
    fn remove_compacts_sequence_numbers()
    {
        let mut storage = GridStorage::new(1);
        let root = GridPoint::new(&[1], &[1], false);
        let left = GridPoint::new(&[2], &[1], true);
        let right = GridPoint::new(&[2], &[3], true);
        storage.insert(root.clone());
        storage.insert(left.clone());
        storage.insert(right.clone());

        let seq = storage.remove(&left).unwrap();
        assert_eq!(seq, 1);
        assert_eq!(storage.len(), 2);
        // every later point shifted down by exactly one
        assert_eq!(storage.index_of(&right), Some(1));
        assert_eq!(storage.index_of(&root), Some(0));
    }

    #[test]
    fn remove_rejects_non_leaf()
    {
        let mut storage = GridStorage::new(1);
        let root = GridPoint::new(&[1], &[1], false);
        let left = GridPoint::new(&[2], &[1], true);
        storage.insert(root.clone());
        storage.insert(left);
        assert_eq!(storage.remove(&root), Err(SGError::NonLeafRemoval));
        assert_eq!(storage.len(), 2);
    }

    #[test]
    fn parent_index_formula()
    {
        let p = GridPoint::new(&[3], &[5], true);
        let parent = p.parent(0);
        assert_eq!(parent.level[0], 2);
        assert_eq!(parent.index[0], 3);
        let p = GridPoint::new(&[3], &[7], true);
        let parent = p.parent(0);
        assert_eq!(parent.index[0], 3);
        let p = GridPoint::new(&[3], &[1], true);
        assert_eq!(p.parent(0).index[0], 1);
    }

    #[test]
    fn coordinates_and_bounding_box()
    {
        let mut storage = GridStorage::new(2);
        storage.bounding_box = BoundingBox::new(&[0.0, 0.0], &[4.0, 1.0]);
        storage.insert(GridPoint::new(&[2, 1], &[3, 1], true));
        assert_eq!(storage.unit_coordinate(0), vec![0.75, 0.5]);
        let mut coor = storage.unit_coordinate(0);
        storage.bounding_box().to_real_coordinate_in_place(&mut coor);
        assert_eq!(coor, vec![3.0, 0.5]);
        assert!(!storage.bounding_box().is_unit_cube());
        assert_eq!(storage.bounding_box().offset(0), 0.0);
        assert_eq!(storage.bounding_box().width(0), 4.0);
    }

    #[test]
    fn point_navigation()
    {
        let p = GridPoint::new(&[2, 0], &[3, 0], true);
        assert!(!p.is_inner_point());
        assert_eq!(p.root(0).level[0], 1);
        assert_eq!(p.root(0).index[0], 1);
        let left = p.left_child(0);
        assert_eq!((left.level[0], left.index[0]), (3, 5));
        let right = p.right_child(0);
        assert_eq!((right.level[0], right.index[0]), (3, 7));
        assert_eq!(p.level_max(), 2);
        assert_eq!(p.unit_coordinate(), vec![0.75, 0.0]);
        assert!(GridPoint::new(&[1, 1], &[1, 1], true).is_inner_point());
    }

    #[test]
    fn level_index_arrays_are_flat()
    {
        let mut storage = GridStorage::new(2);
        storage.insert(GridPoint::new(&[1, 1], &[1, 1], false));
        storage.insert(GridPoint::new(&[2, 1], &[1, 1], true));
        let (levels, indices) = storage.level_index_arrays();
        assert_eq!(levels, &[1, 1, 2, 1]);
        assert_eq!(indices, &[1, 1, 1, 1]);
    }
}
