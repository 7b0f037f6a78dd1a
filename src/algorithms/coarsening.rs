use crate::errors::SGError;
use crate::storage::{GridPoint, GridStorage};

///
/// Scoring strategy consumed by coarsening. Smaller means more removable.
///
pub trait CoarseningFunctor
{
    /// Coarsening score of the point at sequence number `seq`.
    fn eval(&self, storage: &GridStorage, seq: usize) -> f64;

    /// Threshold: only points scoring at or below this value are removed.
    fn start(&self) -> f64;

    /// Maximum number of points removed per pass.
    fn removals_num(&self) -> usize
    {
        1
    }
}

///
/// Mirror of the refinement engine: removes up to N of the lowest-scoring
/// leaf points. Only leaves are eligible; removing an inner point would
/// orphan its descendants, so storage rejects it outright.
///
pub struct HashCoarsening;

impl HashCoarsening
{
    ///
    /// Remove up to `functor.removals_num()` leaf points scoring at or below
    /// `functor.start()`. The first `protected_points` sequence numbers are
    /// never touched, which keeps a base regular grid intact.
    ///
    /// Returns the removed sequence numbers in descending order. Storage
    /// renumbers on every removal, so callers splicing coefficient arrays
    /// must process the list front to back.
    ///
    pub fn free_coarsen(&self, storage: &mut GridStorage, functor: &dyn CoarseningFunctor,
        protected_points: usize) -> Result<Vec<usize>, SGError>
    {
        if storage.is_empty()
        {
            return Err(SGError::StorageEmpty);
        }
        let removals_num = functor.removals_num();
        if removals_num == 0
        {
            return Ok(Vec::new());
        }
        // N-slot array of the lowest scores seen so far; max_idx tracks the
        // slot holding the current maximum, which is the replacement target.
        let mut min_values = vec![f64::INFINITY; removals_num];
        let mut min_seqs = vec![usize::MAX; removals_num];
        let mut max_idx = 0;

        for seq in protected_points..storage.len()
        {
            if !storage.is_leaf(seq)
            {
                continue;
            }
            let value = functor.eval(storage, seq);
            if value < min_values[max_idx]
            {
                min_values[max_idx] = value;
                min_seqs[max_idx] = seq;
                max_idx = Self::index_of_max(&min_values);
            }
        }

        let mut selected: Vec<usize> = min_seqs.iter().zip(min_values.iter())
            .filter(|&(&seq, &value)| seq != usize::MAX && value <= functor.start())
            .map(|(&seq, _)| seq)
            .collect();
        // remove highest sequence number first so the remaining selected
        // numbers stay valid while storage compacts
        selected.sort_unstable_by(|a, b| b.cmp(a));

        let mut removed = Vec::with_capacity(selected.len());
        for seq in selected
        {
            let point = storage.point(seq);
            storage.remove(&point)?;
            removed.push(seq);
            self.restore_parent_leaves(storage, &point);
        }
        Ok(removed)
    }

    /// A parent whose last child disappeared is a leaf again.
    fn restore_parent_leaves(&self, storage: &mut GridStorage, point: &GridPoint)
    {
        for dim in 0..storage.num_dims()
        {
            match point.level[dim]
            {
                0 => {}
                1 =>
                {
                    // in boundary grids a level-1 point hangs off both
                    // level-0 points of that dimension
                    let mut parent = point.clone();
                    parent.level[dim] = 0;
                    for i in 0..2u32
                    {
                        parent.index[dim] = i;
                        self.restore_leaf(storage, &parent);
                    }
                }
                _ =>
                {
                    self.restore_leaf(storage, &point.parent(dim));
                }
            }
        }
    }

    fn restore_leaf(&self, storage: &mut GridStorage, parent: &GridPoint)
    {
        if let Some(seq) = storage.index_of(parent)
        {
            if !storage.has_children(parent)
            {
                storage.set_is_leaf(seq, true);
            }
        }
    }

    fn index_of_max(values: &[f64]) -> usize
    {
        let mut max_idx = 0;
        for i in 1..values.len()
        {
            if values[i] > values[max_idx]
            {
                max_idx = i;
            }
        }
        max_idx
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::algorithms::refinement::{HashRefinement, RefinementFunctor};

    struct ScoreList(Vec<f64>, f64, usize);
    impl CoarseningFunctor for ScoreList
    {
        fn eval(&self, _storage: &GridStorage, seq: usize) -> f64 { self.0[seq] }
        fn start(&self) -> f64 { self.1 }
        fn removals_num(&self) -> usize { self.2 }
    }

    fn line_of_three() -> GridStorage
    {
        let mut storage = GridStorage::new(1);
        storage.insert(GridPoint::new(&[1], &[1], false));
        storage.insert(GridPoint::new(&[2], &[1], true));
        storage.insert(GridPoint::new(&[2], &[3], true));
        storage
    }

    #[test]
    fn removes_only_leaves_below_threshold()
    {
        let mut storage = line_of_three();
        // root has the smallest score but is not a leaf
        let functor = ScoreList(vec![0.0, 0.5, 2.0], 1.0, 3);
        let removed = HashCoarsening.free_coarsen(&mut storage, &functor, 0).unwrap();
        assert_eq!(removed, vec![1]);
        assert_eq!(storage.len(), 2);
        assert!(storage.contains(&GridPoint::new(&[2], &[3], true)));
    }

    #[test]
    fn removed_sequence_numbers_are_descending()
    {
        let mut storage = line_of_three();
        let functor = ScoreList(vec![9.0, 0.1, 0.2], 1.0, 2);
        let removed = HashCoarsening.free_coarsen(&mut storage, &functor, 0).unwrap();
        assert_eq!(removed, vec![2, 1]);
        assert_eq!(storage.len(), 1);
        // the surviving root is a leaf again
        assert!(storage.is_leaf(0));
    }

    #[test]
    fn zero_removals_is_a_no_op()
    {
        let mut storage = line_of_three();
        let functor = ScoreList(vec![0.0, 0.0, 0.0], 1.0, 0);
        let removed = HashCoarsening.free_coarsen(&mut storage, &functor, 0).unwrap();
        assert!(removed.is_empty());
        assert_eq!(storage.len(), 3);
    }

    #[test]
    fn threshold_is_inclusive()
    {
        let mut storage = line_of_three();
        let functor = ScoreList(vec![9.0, 1.0, 1.0001], 1.0, 2);
        let removed = HashCoarsening.free_coarsen(&mut storage, &functor, 0).unwrap();
        assert_eq!(removed, vec![1]);
    }

    #[test]
    fn protected_points_survive()
    {
        let mut storage = line_of_three();
        let functor = ScoreList(vec![0.0, 0.0, 0.0], 1.0, 3);
        let removed = HashCoarsening.free_coarsen(&mut storage, &functor, 2).unwrap();
        assert_eq!(removed, vec![2]);
        assert_eq!(storage.len(), 2);
    }

    #[test]
    fn coarsening_preserves_closure()
    {
        // grow a 2-D grid adaptively, then strip it back down
        struct All(f64, usize);
        impl RefinementFunctor for All
        {
            fn eval(&self, _s: &GridStorage, seq: usize) -> f64 { 1.0 + seq as f64 }
            fn start(&self) -> f64 { self.0 }
            fn refinements_num(&self) -> usize { self.1 }
        }
        let mut storage = GridStorage::new(2);
        crate::generators::regular(&mut storage, &[2, 2]);
        let base = storage.len();
        HashRefinement(false).free_refine(&mut storage, &All(0.0, 3)).unwrap();
        let scores = vec![0.0; storage.len()];
        let functor = ScoreList(scores, 0.5, storage.len());
        HashCoarsening.free_coarsen(&mut storage, &functor, base).unwrap();
        for point in storage.nodes()
        {
            for d in 0..storage.num_dims()
            {
                if point.level[d] > 1
                {
                    assert!(storage.contains(&point.parent(d)));
                }
            }
        }
    }

    #[test]
    fn empty_storage_is_rejected()
    {
        let mut storage = GridStorage::new(1);
        let functor = ScoreList(vec![], 0.0, 1);
        assert_eq!(HashCoarsening.free_coarsen(&mut storage, &functor, 0), Err(SGError::StorageEmpty));
    }
}
