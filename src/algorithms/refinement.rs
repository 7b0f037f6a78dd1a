use crate::errors::SGError;
use crate::storage::{GridPoint, GridStorage};

///
/// Scoring strategy consumed by refinement. Scores are recomputed per pass
/// and never persisted.
///
pub trait RefinementFunctor
{
    /// Refinement score of the point at sequence number `seq`. Larger means
    /// more urgent.
    fn eval(&self, storage: &GridStorage, seq: usize) -> f64;

    /// Sentinel baseline: points scoring at or below this value are never
    /// refined.
    fn start(&self) -> f64;

    /// Maximum number of points refined per pass.
    fn refinements_num(&self) -> usize
    {
        1
    }
}

///
/// Adaptive point-insertion engine. Scans storage for points with missing
/// dyadic children, keeps the K best-scoring candidates and creates their
/// children, materializing any missing ancestors so the storage stays
/// closed under the parent relation.
///
/// The boolean enables boundary handling (level-0 points are created
/// alongside level-1 insertions).
///
pub struct HashRefinement(pub bool);

impl HashRefinement
{
    ///
    /// Refine up to `functor.refinements_num()` points. The functor score is
    /// reevaluated for every missing-child direction of a candidate, so for
    /// near-tied scores the selection can depend on dimension order; this
    /// mirrors the scan order of the classic hash-refinement algorithm.
    ///
    pub fn free_refine(&self, storage: &mut GridStorage, functor: &dyn RefinementFunctor) -> Result<(), SGError>
    {
        if storage.is_empty()
        {
            return Err(SGError::StorageEmpty);
        }
        let refinements_num = functor.refinements_num();
        if refinements_num == 0
        {
            return Ok(());
        }
        // K-slot array of the best scores seen so far; min_idx tracks the
        // slot holding the current minimum, which is the replacement target.
        let mut max_values = vec![functor.start(); refinements_num];
        let mut max_seqs = vec![0usize; refinements_num];
        let mut min_idx = 0;

        for seq in 0..storage.len()
        {
            let point = storage.point(seq);
            let mut probe = point.clone();
            for d in 0..storage.num_dims()
            {
                let level = probe.level[d];
                let index = probe.index[d];
                let mut selected = false;
                if level == 0
                {
                    probe.level[d] = 1;
                    probe.index[d] = 1;
                    if !storage.contains(&probe)
                    {
                        selected = Self::offer_candidate(storage, functor, seq,
                            &mut max_values, &mut max_seqs, &mut min_idx);
                    }
                }
                else
                {
                    probe.level[d] = level + 1;
                    probe.index[d] = 2 * index - 1;
                    if !storage.contains(&probe)
                    {
                        selected = Self::offer_candidate(storage, functor, seq,
                            &mut max_values, &mut max_seqs, &mut min_idx);
                    }
                    if !selected
                    {
                        probe.index[d] = 2 * index + 1;
                        if !storage.contains(&probe)
                        {
                            selected = Self::offer_candidate(storage, functor, seq,
                                &mut max_values, &mut max_seqs, &mut min_idx);
                        }
                    }
                }
                probe.level[d] = level;
                probe.index[d] = index;
                if selected
                {
                    break;
                }
            }
        }

        for i in 0..refinements_num
        {
            if max_values[i] > functor.start()
            {
                self.refine_gridpoint(storage, max_seqs[i]);
            }
        }
        Ok(())
    }

    ///
    /// Number of (point, dimension, side) triples lacking a child. This is a
    /// per-direction count, not a per-point count: a point missing both
    /// children in one dimension contributes two.
    ///
    pub fn get_number_of_refinable_points(&self, storage: &GridStorage) -> Result<usize, SGError>
    {
        if storage.is_empty()
        {
            return Err(SGError::StorageEmpty);
        }
        let mut counter = 0;
        for seq in 0..storage.len()
        {
            let mut probe = storage.point(seq);
            for d in 0..storage.num_dims()
            {
                let level = probe.level[d];
                let index = probe.index[d];
                if level == 0
                {
                    probe.level[d] = 1;
                    probe.index[d] = 1;
                    if !storage.contains(&probe)
                    {
                        counter += 1;
                    }
                }
                else
                {
                    probe.level[d] = level + 1;
                    probe.index[d] = 2 * index - 1;
                    if !storage.contains(&probe)
                    {
                        counter += 1;
                    }
                    probe.index[d] = 2 * index + 1;
                    if !storage.contains(&probe)
                    {
                        counter += 1;
                    }
                }
                probe.level[d] = level;
                probe.index[d] = index;
            }
        }
        Ok(counter)
    }

    /// Refine a single grid point along every dimension, creating its still
    /// missing children.
    pub fn refine_gridpoint(&self, storage: &mut GridStorage, seq: usize)
    {
        let point = storage.point(seq);
        storage.set_is_leaf(seq, false);
        for dim in 0..storage.num_dims()
        {
            self.refine_1d(storage, point.clone(), dim);
        }
    }

    /// Create the missing children of a point along a single direction.
    pub fn refine_1d(&self, storage: &mut GridStorage, mut point: GridPoint, dim: usize)
    {
        let level = point.level[dim];
        let index = point.index[dim];
        if level == 0
        {
            point.level[dim] = 1;
            point.index[dim] = 1;
            if !storage.contains(&point)
            {
                point.set_is_leaf(true);
                self.create_gridpoint(storage, point);
            }
        }
        else
        {
            point.level[dim] = level + 1;
            point.index[dim] = 2 * index - 1;
            if !storage.contains(&point)
            {
                point.set_is_leaf(true);
                self.create_gridpoint(storage, point.clone());
            }
            point.level[dim] = level + 1;
            point.index[dim] = 2 * index + 1;
            if !storage.contains(&point)
            {
                point.set_is_leaf(true);
                self.create_gridpoint(storage, point);
            }
        }
    }

    ///
    /// Insert a point, first materializing its missing ancestors in every
    /// dimension. Recursion strictly decreases the level, terminating at
    /// level 1.
    ///
    fn create_gridpoint(&self, storage: &mut GridStorage, point: GridPoint)
    {
        for dim in 0..storage.num_dims()
        {
            if self.0
            {
                self.create_gridpoint_1d_with_boundary(point.clone(), storage, dim);
            }
            else
            {
                self.create_gridpoint_1d(point.clone(), storage, dim);
            }
        }
        storage.insert(point.clone());
        if self.0
        {
            self.level_zero_consistency(storage, point);
        }
    }

    fn create_gridpoint_1d(&self, mut point: GridPoint, storage: &mut GridStorage, dim: usize)
    {
        let level = point.level[dim];
        let index = point.index[dim];
        if level > 1
        {
            point.index[dim] = if ((index + 1) / 2) % 2 == 1 { (index + 1) / 2 } else { (index - 1) / 2 };
            point.level[dim] = level - 1;
            self.create_parent(storage, point);
        }
    }

    fn create_gridpoint_1d_with_boundary(&self, mut point: GridPoint, storage: &mut GridStorage, dim: usize)
    {
        let level = point.level[dim];
        let index = point.index[dim];
        if level == 1 && storage.num_dims() > 1
        {
            // level-1 points in a boundary grid hang off both level-0 points
            point.level[dim] = 0;
            point.index[dim] = 0;
            self.create_parent(storage, point.clone());
            point.index[dim] = 1;
            self.create_parent(storage, point.clone());
            point.level[dim] = level;
            point.index[dim] = index;
        }
        self.create_gridpoint_1d(point, storage, dim);
    }

    ///
    /// An ancestor required by a new point: clear its leaf flag if present,
    /// otherwise create it (non-leaf, it is gaining a child right now).
    ///
    fn create_parent(&self, storage: &mut GridStorage, mut point: GridPoint)
    {
        if let Some(seq) = storage.index_of(&point)
        {
            storage.set_is_leaf(seq, false);
        }
        else
        {
            point.set_is_leaf(false);
            self.create_gridpoint(storage, point);
        }
    }

    ///
    /// For grids with boundaries and more than one dimension, level-0 points
    /// come in pairs: whenever one boundary of a dimension exists, the
    /// opposite one must too.
    ///
    fn level_zero_consistency(&self, storage: &mut GridStorage, mut point: GridPoint)
    {
        if storage.num_dims() == 1
        {
            return;
        }
        for dim in 0..storage.num_dims()
        {
            if point.level[dim] != 0
            {
                continue;
            }
            let index = point.index[dim];
            for i in 0..2u32
            {
                point.index[dim] = i;
                if storage.contains(&point)
                {
                    point.index[dim] = 1 - i;
                    if !storage.contains(&point)
                    {
                        self.create_gridpoint(storage, point.clone());
                    }
                }
            }
            point.index[dim] = index;
        }
    }

    fn offer_candidate(storage: &GridStorage, functor: &dyn RefinementFunctor, seq: usize,
        max_values: &mut [f64], max_seqs: &mut [usize], min_idx: &mut usize) -> bool
    {
        let current_value = functor.eval(storage, seq);
        if current_value > max_values[*min_idx]
        {
            max_values[*min_idx] = current_value;
            max_seqs[*min_idx] = seq;
            *min_idx = Self::index_of_min(max_values);
            return true;
        }
        false
    }

    fn index_of_min(values: &[f64]) -> usize
    {
        let mut min_idx = 0;
        for i in 1..values.len()
        {
            if values[i] < values[min_idx]
            {
                min_idx = i;
            }
        }
        min_idx
    }
}
