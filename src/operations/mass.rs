use crate::algorithms::sweep::{sweep_1d, sweep_1d_boundary, SweepFunction};
use crate::iterators::{GridIteratorT, HashMapGridIterator};
use crate::operations::updown::UpDownOperation;
use crate::storage::GridStorage;

///
/// 1-D mass kernel, down part: ancestor-to-descendant contributions of
/// `integral(phi_i * phi_j)` for the linear hierarchical basis, plus the
/// diagonal. `fl` and `fr` carry the value of the ancestor interpolant at
/// the left and right support edge of the current point.
///
pub struct PhiPhiDownLinear;

impl SweepFunction for PhiPhiDownLinear
{
    fn execute(&self, storage: &GridStorage, source: &[f64], result: &mut [f64],
        iterator: &mut HashMapGridIterator, dim: usize)
    {
        let q = storage.bounding_box().width(dim);
        down_rec(source, result, iterator, dim, 0.0, 0.0, q);
    }
}

fn down_rec(source: &[f64], result: &mut [f64], iterator: &mut HashMapGridIterator,
    dim: usize, fl: f64, fr: f64, q: f64)
{
    let Some(seq) = iterator.seq() else { return };
    let l = iterator.point().level[dim];
    let h = 1.0 / (1u64 << l) as f64;
    let alpha_value = source[seq];
    let fm = (fl + fr) / 2.0 + alpha_value;
    result[seq] = q * h * ((fl + fr) / 2.0 + 2.0 / 3.0 * alpha_value);
    if !iterator.is_leaf()
    {
        iterator.left_child(dim);
        if iterator.seq().is_some()
        {
            down_rec(source, result, iterator, dim, fl, fm, q);
        }
        iterator.step_right(dim);
        if iterator.seq().is_some()
        {
            down_rec(source, result, iterator, dim, fm, fr, q);
        }
        iterator.up(dim);
    }
}

///
/// 1-D mass kernel, up part: the transpose of the down part. The recursion
/// returns the accumulated basis-function integrals hitting the left and
/// right support edge of the current point, which its ancestors fold into
/// their own rows.
///
pub struct PhiPhiUpLinear;

impl SweepFunction for PhiPhiUpLinear
{
    fn execute(&self, storage: &GridStorage, source: &[f64], result: &mut [f64],
        iterator: &mut HashMapGridIterator, dim: usize)
    {
        let q = storage.bounding_box().width(dim);
        up_rec(source, result, iterator, dim, q);
    }
}

fn up_rec(source: &[f64], result: &mut [f64], iterator: &mut HashMapGridIterator,
    dim: usize, q: f64) -> (f64, f64)
{
    let Some(seq) = iterator.seq() else { return (0.0, 0.0) };
    let mut fl = 0.0;
    let mut fr = 0.0;
    let mut fml = 0.0;
    let mut fmr = 0.0;
    if !iterator.is_leaf()
    {
        iterator.left_child(dim);
        if iterator.seq().is_some()
        {
            let (l, m) = up_rec(source, result, iterator, dim, q);
            fl = l;
            fml = m;
        }
        iterator.step_right(dim);
        if iterator.seq().is_some()
        {
            let (m, r) = up_rec(source, result, iterator, dim, q);
            fmr = m;
            fr = r;
        }
        iterator.up(dim);
    }
    let l = iterator.point().level[dim];
    let h = 1.0 / (1u64 << l) as f64;
    let alpha_value = source[seq];
    let fm = fml + fmr;
    result[seq] = fm;
    let contribution = fm / 2.0 + alpha_value * h * q / 2.0;
    (contribution + fl, contribution + fr)
}

///
/// Down part for grids with boundary points. The two level-0 rows of the
/// dimension are handled explicitly (diagonal plus the left-to-right
/// coupling), then the interior tree descends with the boundary values as
/// initial edge values.
///
pub struct PhiPhiDownLinearBoundary;

impl SweepFunction for PhiPhiDownLinearBoundary
{
    fn execute(&self, storage: &GridStorage, source: &[f64], result: &mut [f64],
        iterator: &mut HashMapGridIterator, dim: usize)
    {
        let q = storage.bounding_box().width(dim);
        let Some(seq_left) = iterator.seq() else { return };
        let fl = source[seq_left];
        iterator.reset_to_right_level_zero(dim);
        let Some(seq_right) = iterator.seq() else
        {
            iterator.reset_to_left_level_zero(dim);
            return;
        };
        let fr = source[seq_right];
        result[seq_left] = q * fl / 3.0;
        result[seq_right] = q * (fr / 3.0 + fl / 6.0);
        if !iterator.is_leaf()
        {
            iterator.reset_to_level_one(dim);
            if iterator.seq().is_some()
            {
                down_rec(source, result, iterator, dim, fl, fr, q);
            }
        }
        iterator.reset_to_left_level_zero(dim);
    }
}

///
/// Up part for grids with boundary points: interior contributions flow up
/// and land in the level-0 rows, together with the right-to-left boundary
/// coupling.
///
pub struct PhiPhiUpLinearBoundary;

impl SweepFunction for PhiPhiUpLinearBoundary
{
    fn execute(&self, storage: &GridStorage, source: &[f64], result: &mut [f64],
        iterator: &mut HashMapGridIterator, dim: usize)
    {
        let q = storage.bounding_box().width(dim);
        let mut fl = 0.0;
        let mut fr = 0.0;
        if !iterator.is_leaf()
        {
            iterator.reset_to_level_one(dim);
            if iterator.seq().is_some()
            {
                (fl, fr) = up_rec(source, result, iterator, dim, q);
            }
            iterator.reset_to_left_level_zero(dim);
        }
        let Some(seq_left) = iterator.seq() else { return };
        iterator.reset_to_right_level_zero(dim);
        let Some(seq_right) = iterator.seq() else
        {
            iterator.reset_to_left_level_zero(dim);
            return;
        };
        result[seq_left] = fl + q * source[seq_right] / 6.0;
        result[seq_right] = fr;
        iterator.reset_to_left_level_zero(dim);
    }
}

///
/// Mass matrix application for boundaryless grids of linear hierarchical
/// basis functions; plug into `StdUpDown`.
///
pub struct OperationMassLinear;

impl UpDownOperation for OperationMassLinear
{
    fn up(&self, storage: &GridStorage, alpha: &[f64], result: &mut [f64], dim: usize)
    {
        sweep_1d(&PhiPhiUpLinear, storage, alpha, result, dim);
    }
    fn down(&self, storage: &GridStorage, alpha: &[f64], result: &mut [f64], dim: usize)
    {
        sweep_1d(&PhiPhiDownLinear, storage, alpha, result, dim);
    }
}

///
/// Mass matrix application for grids with boundary points.
///
pub struct OperationMassLinearBoundary;

impl UpDownOperation for OperationMassLinearBoundary
{
    fn up(&self, storage: &GridStorage, alpha: &[f64], result: &mut [f64], dim: usize)
    {
        sweep_1d_boundary(&PhiPhiUpLinearBoundary, storage, alpha, result, dim);
    }
    fn down(&self, storage: &GridStorage, alpha: &[f64], result: &mut [f64], dim: usize)
    {
        sweep_1d_boundary(&PhiPhiDownLinearBoundary, storage, alpha, result, dim);
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::generators;
    use crate::operations::updown::StdUpDown;
    use crate::storage::GridPoint;

    ///
    /// Value of the 1-D basis function (level, index) at x on the unit
    /// interval. Level 0 holds the two boundary ramps.
    ///
    fn basis(level: u8, index: u32, x: f64) -> f64
    {
        if level == 0
        {
            if index == 0 { 1.0 - x } else { x }
        }
        else
        {
            (1.0 - (x * (1u64 << level) as f64 - index as f64).abs()).max(0.0)
        }
    }

    ///
    /// Composite Simpson quadrature of a product of two basis functions.
    /// The integrand is piecewise quadratic with breakpoints on the panel
    /// grid, so the result is exact to rounding.
    ///
    fn product_integral(a: (u8, u32), b: (u8, u32)) -> f64
    {
        let n = 4096usize;
        let h = 1.0 / n as f64;
        let f = |x: f64| basis(a.0, a.1, x) * basis(b.0, b.1, x);
        let mut sum = f(0.0) + f(1.0);
        for i in 1..n
        {
            let w = if i % 2 == 1 { 4.0 } else { 2.0 };
            sum += w * f(i as f64 * h);
        }
        sum * h / 3.0
    }

    fn mass_entry(p: &GridPoint, r: &GridPoint) -> f64
    {
        let mut value = 1.0;
        for d in 0..p.num_dims()
        {
            value *= product_integral((p.level[d], p.index[d]), (r.level[d], r.index[d]));
        }
        value
    }

    fn dense_matrix<F>(storage: &GridStorage, mult: F) -> Vec<Vec<f64>>
        where F: Fn(&[f64]) -> Vec<f64>
    {
        let n = storage.len();
        let mut matrix = vec![vec![0.0; n]; n];
        for j in 0..n
        {
            let mut alpha = vec![0.0; n];
            alpha[j] = 1.0;
            let column = mult(&alpha);
            for i in 0..n
            {
                matrix[i][j] = column[i];
            }
        }
        matrix
    }

    #[test]
    fn matches_quadrature_1d()
    {
        let mut storage = GridStorage::new(1);
        generators::regular(&mut storage, &[3]);
        let operation = StdUpDown::new(&storage, OperationMassLinear);
        let matrix = dense_matrix(&storage, |alpha| operation.mult(alpha));
        let points: Vec<GridPoint> = storage.nodes().collect();
        for (i, p) in points.iter().enumerate()
        {
            for (j, r) in points.iter().enumerate()
            {
                let expected = mass_entry(p, r);
                assert!((matrix[i][j] - expected).abs() < 1e-10,
                    "entry ({}, {}): got {}, expected {}", i, j, matrix[i][j], expected);
            }
        }
    }

    #[test]
    fn matches_quadrature_2d()
    {
        let mut storage = GridStorage::new(2);
        generators::regular(&mut storage, &[3, 3]);
        let operation = StdUpDown::new(&storage, OperationMassLinear);
        let matrix = dense_matrix(&storage, |alpha| operation.mult(alpha));
        let points: Vec<GridPoint> = storage.nodes().collect();
        for (i, p) in points.iter().enumerate()
        {
            for (j, r) in points.iter().enumerate()
            {
                let expected = mass_entry(p, r);
                assert!((matrix[i][j] - expected).abs() < 1e-10,
                    "entry ({}, {}): got {}, expected {}", i, j, matrix[i][j], expected);
            }
        }
    }

    #[test]
    fn matches_quadrature_boundary_1d()
    {
        let mut storage = GridStorage::new(1);
        generators::full_with_boundaries(&mut storage, 2);
        let operation = StdUpDown::new(&storage, OperationMassLinearBoundary);
        let matrix = dense_matrix(&storage, |alpha| operation.mult(alpha));
        let points: Vec<GridPoint> = storage.nodes().collect();
        for (i, p) in points.iter().enumerate()
        {
            for (j, r) in points.iter().enumerate()
            {
                let expected = mass_entry(p, r);
                assert!((matrix[i][j] - expected).abs() < 1e-10,
                    "entry ({}, {}): got {}, expected {}", i, j, matrix[i][j], expected);
            }
        }
    }

    #[test]
    fn matches_quadrature_boundary_2d()
    {
        let mut storage = GridStorage::new(2);
        generators::full_with_boundaries(&mut storage, 2);
        let operation = StdUpDown::new(&storage, OperationMassLinearBoundary);
        let matrix = dense_matrix(&storage, |alpha| operation.mult(alpha));
        let points: Vec<GridPoint> = storage.nodes().collect();
        for (i, p) in points.iter().enumerate()
        {
            for (j, r) in points.iter().enumerate()
            {
                let expected = mass_entry(p, r);
                assert!((matrix[i][j] - expected).abs() < 1e-10,
                    "entry ({}, {}): got {}, expected {}", i, j, matrix[i][j], expected);
            }
        }
    }

    #[test]
    fn bounding_box_scales_by_interval_width()
    {
        let mut storage = GridStorage::new(1);
        generators::regular(&mut storage, &[1]);
        storage.bounding_box_mut().lower[0] = 0.0;
        storage.bounding_box_mut().upper[0] = 2.0;
        let operation = StdUpDown::new(&storage, OperationMassLinear);
        let result = operation.mult(&[1.0]);
        // the level-1 basis function on a width-2 interval has mass 2/3
        assert!((result[0] - 2.0 / 3.0).abs() < 1e-12);
    }
}
