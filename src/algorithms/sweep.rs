use crate::iterators::{GridIteratorT, HashMapGridIterator};
use crate::storage::GridStorage;

///
/// One-dimensional operator kernel applied along a single dimension,
/// starting from the current iterator position (the root of a 1-D line of
/// the grid). The sweep below calls it once per line.
///
pub trait SweepFunction
{
    fn execute(&self, storage: &GridStorage, source: &[f64], result: &mut [f64],
        iterator: &mut HashMapGridIterator, dim: usize);
}

///
/// Apply a 1-D kernel along `dim_sweep` over every line of the grid. Lines
/// are enumerated by recursing over the remaining dimensions in
/// left-child / step-right / up order; restricting each recursion step to
/// dimensions up to the current one visits every line exactly once.
///
/// The storage must be closed under the parent relation; this is not
/// checked at runtime.
///
pub fn sweep_1d<F: SweepFunction>(function: &F, storage: &GridStorage, source: &[f64],
    result: &mut [f64], dim_sweep: usize)
{
    let dim_list = other_dimensions(storage.num_dims(), dim_sweep);
    let mut iterator = HashMapGridIterator::new(storage);
    sweep_recursive(function, storage, source, result, &mut iterator, &dim_list,
        storage.num_dims() - 1, dim_sweep);
}

///
/// Boundary-aware variant: lines start at the left level-0 point of
/// `dim_sweep`, and the recursion over the remaining dimensions walks both
/// level-0 points before descending into the interior tree.
///
pub fn sweep_1d_boundary<F: SweepFunction>(function: &F, storage: &GridStorage, source: &[f64],
    result: &mut [f64], dim_sweep: usize)
{
    let dim_list = other_dimensions(storage.num_dims(), dim_sweep);
    let mut iterator = HashMapGridIterator::new(storage);
    iterator.reset_to_level_zero();
    sweep_boundary_recursive(function, storage, source, result, &mut iterator, &dim_list,
        storage.num_dims() - 1, dim_sweep);
}

fn other_dimensions(num_dims: usize, dim_sweep: usize) -> Vec<usize>
{
    (0..num_dims).filter(|&d| d != dim_sweep).collect()
}

fn sweep_recursive<F: SweepFunction>(function: &F, storage: &GridStorage, source: &[f64],
    result: &mut [f64], iterator: &mut HashMapGridIterator, dim_list: &[usize],
    dim_rem: usize, dim_sweep: usize)
{
    function.execute(storage, source, result, iterator, dim_sweep);
    for d in 0..dim_rem
    {
        let cur_dim = dim_list[d];
        if iterator.is_leaf()
        {
            continue;
        }
        iterator.left_child(cur_dim);
        if iterator.seq().is_some()
        {
            sweep_recursive(function, storage, source, result, iterator, dim_list, d + 1, dim_sweep);
        }
        iterator.step_right(cur_dim);
        if iterator.seq().is_some()
        {
            sweep_recursive(function, storage, source, result, iterator, dim_list, d + 1, dim_sweep);
        }
        iterator.up(cur_dim);
    }
}

fn sweep_boundary_recursive<F: SweepFunction>(function: &F, storage: &GridStorage, source: &[f64],
    result: &mut [f64], iterator: &mut HashMapGridIterator, dim_list: &[usize],
    dim_rem: usize, dim_sweep: usize)
{
    if dim_rem == 0
    {
        function.execute(storage, source, result, iterator, dim_sweep);
        return;
    }
    let d = dim_list[dim_rem - 1];
    let current_level = iterator.point().level[d];
    if current_level > 0
    {
        sweep_boundary_recursive(function, storage, source, result, iterator, dim_list, dim_rem - 1, dim_sweep);
        if !iterator.is_leaf()
        {
            iterator.left_child(d);
            if iterator.seq().is_some()
            {
                sweep_boundary_recursive(function, storage, source, result, iterator, dim_list, dim_rem, dim_sweep);
            }
            iterator.step_right(d);
            if iterator.seq().is_some()
            {
                sweep_boundary_recursive(function, storage, source, result, iterator, dim_list, dim_rem, dim_sweep);
            }
            iterator.up(d);
        }
    }
    else
    {
        // walk the left boundary, the right boundary, then descend into the
        // interior tree of dimension d
        sweep_boundary_recursive(function, storage, source, result, iterator, dim_list, dim_rem - 1, dim_sweep);
        iterator.reset_to_right_level_zero(d);
        sweep_boundary_recursive(function, storage, source, result, iterator, dim_list, dim_rem - 1, dim_sweep);
        if !iterator.is_leaf()
        {
            iterator.reset_to_level_one(d);
            if iterator.seq().is_some()
            {
                sweep_boundary_recursive(function, storage, source, result, iterator, dim_list, dim_rem, dim_sweep);
            }
        }
        iterator.reset_to_left_level_zero(d);
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    ///
    /// Marks the line root it is called on; used to check the sweep visits
    /// every line exactly once.
    ///
    struct CountStarts;
    impl SweepFunction for CountStarts
    {
        fn execute(&self, _storage: &GridStorage, _source: &[f64], result: &mut [f64],
            iterator: &mut HashMapGridIterator, _dim: usize)
        {
            if let Some(seq) = iterator.seq()
            {
                result[seq] += 1.0;
            }
        }
    }

    #[test]
    fn visits_each_line_once_2d()
    {
        let mut storage = GridStorage::new(2);
        crate::generators::regular(&mut storage, &[3, 3]);
        let source = vec![0.0; storage.len()];
        let mut result = vec![0.0; storage.len()];
        sweep_1d(&CountStarts, &storage, &source, &mut result, 0);
        // the lines along dim 0 are rooted at the points with level 1,
        // index 1 in dim 0; there is one line per distinct dim-1 position
        let mut expected = vec![0.0; storage.len()];
        for (seq, point) in storage.nodes().enumerate()
        {
            if point.level[0] == 1
            {
                expected[seq] = 1.0;
            }
        }
        assert_eq!(result, expected);
    }

    #[test]
    fn boundary_sweep_starts_at_left_level_zero()
    {
        let mut storage = GridStorage::new(2);
        crate::generators::full_with_boundaries(&mut storage, 2);
        let source = vec![0.0; storage.len()];
        let mut result = vec![0.0; storage.len()];
        sweep_1d_boundary(&CountStarts, &storage, &source, &mut result, 0);
        for (seq, point) in storage.nodes().enumerate()
        {
            let expected = if point.level[0] == 0 && point.index[0] == 0 { 1.0 } else { 0.0 };
            assert_eq!(result[seq], expected, "line count wrong at {:?}/{:?}", point.level, point.index);
        }
    }
}
