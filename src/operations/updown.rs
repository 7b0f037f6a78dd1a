use rayon::prelude::*;

use crate::storage::GridStorage;

///
/// A bilinear operator decomposed into per-dimension up and down parts. The
/// up part accumulates contributions from descendants to ancestors along one
/// dimension, the down part from ancestors to descendants; together they
/// cover every (row, column) pair of the operator matrix exactly once.
///
pub trait UpDownOperation: Sync
{
    fn up(&self, storage: &GridStorage, alpha: &[f64], result: &mut [f64], dim: usize);
    fn down(&self, storage: &GridStorage, alpha: &[f64], result: &mut [f64], dim: usize);
}

///
/// Multi-dimensional operator application by the unidirectional principle:
/// recurse over dimensions, splitting into an up-then-recurse branch and a
/// recurse-then-down branch. The branches touch disjoint buffers, so they
/// run in parallel.
///
pub struct StdUpDown<'a, OP: UpDownOperation>
{
    storage: &'a GridStorage,
    op: OP,
}

impl<'a, OP: UpDownOperation> StdUpDown<'a, OP>
{
    pub fn new(storage: &'a GridStorage, op: OP) -> Self
    {
        Self { storage, op }
    }

    ///
    /// Apply the operator matrix to a coefficient vector.
    ///
    pub fn mult(&self, alpha: &[f64]) -> Vec<f64>
    {
        self.updown(alpha, self.storage.num_dims() - 1)
    }

    fn updown(&self, alpha: &[f64], dim: usize) -> Vec<f64>
    {
        if dim > 0
        {
            let (left, right) = rayon::join(
                ||
                {
                    let mut temp = vec![0.0; alpha.len()];
                    self.op.up(self.storage, alpha, &mut temp, dim);
                    self.updown(&temp, dim - 1)
                },
                ||
                {
                    let temp = self.updown(alpha, dim - 1);
                    let mut result = vec![0.0; alpha.len()];
                    self.op.down(self.storage, &temp, &mut result, dim);
                    result
                });
            left.iter().zip(right).map(|(a, b)| a + b).collect()
        }
        else
        {
            let mut up = vec![0.0; alpha.len()];
            self.op.up(self.storage, alpha, &mut up, 0);
            let mut down = vec![0.0; alpha.len()];
            self.op.down(self.storage, alpha, &mut down, 0);
            up.iter().zip(down).map(|(a, b)| a + b).collect()
        }
    }
}

///
/// Operator with one distinguished dimension per term, for operators of the
/// form `sum_d A_d x B x ... x B` (one special factor, mass-like factors
/// elsewhere). The Laplacian is the canonical case.
///
pub trait UpDownOneOpDimOperation: Sync
{
    fn up(&self, storage: &GridStorage, alpha: &[f64], result: &mut [f64], dim: usize);
    fn down(&self, storage: &GridStorage, alpha: &[f64], result: &mut [f64], dim: usize);
    fn up_op_dim(&self, storage: &GridStorage, alpha: &[f64], result: &mut [f64], dim: usize);
    fn down_op_dim(&self, storage: &GridStorage, alpha: &[f64], result: &mut [f64], dim: usize);
}

pub struct UpDownOneOpDim<'a, OP: UpDownOneOpDimOperation>
{
    storage: &'a GridStorage,
    op: OP,
}

impl<'a, OP: UpDownOneOpDimOperation> UpDownOneOpDim<'a, OP>
{
    pub fn new(storage: &'a GridStorage, op: OP) -> Self
    {
        Self { storage, op }
    }

    ///
    /// Apply the operator: one up-down pass per choice of the special
    /// dimension, summed. The passes are independent, so they run in
    /// parallel.
    ///
    pub fn mult(&self, alpha: &[f64]) -> Vec<f64>
    {
        let dims = self.storage.num_dims();
        (0..dims).into_par_iter()
            .map(|op_dim| self.updown(alpha, dims - 1, op_dim))
            .reduce(|| vec![0.0; alpha.len()],
                |mut acc, part|
                {
                    for (a, b) in acc.iter_mut().zip(part)
                    {
                        *a += b;
                    }
                    acc
                })
    }

    fn updown(&self, alpha: &[f64], dim: usize, op_dim: usize) -> Vec<f64>
    {
        if dim == op_dim
        {
            self.special(alpha, dim, op_dim)
        }
        else if dim > 0
        {
            let (left, right) = rayon::join(
                ||
                {
                    let mut temp = vec![0.0; alpha.len()];
                    self.op.up(self.storage, alpha, &mut temp, dim);
                    self.updown(&temp, dim - 1, op_dim)
                },
                ||
                {
                    let temp = self.updown(alpha, dim - 1, op_dim);
                    let mut result = vec![0.0; alpha.len()];
                    self.op.down(self.storage, &temp, &mut result, dim);
                    result
                });
            left.iter().zip(right).map(|(a, b)| a + b).collect()
        }
        else
        {
            let mut up = vec![0.0; alpha.len()];
            self.op.up(self.storage, alpha, &mut up, 0);
            let mut down = vec![0.0; alpha.len()];
            self.op.down(self.storage, alpha, &mut down, 0);
            up.iter().zip(down).map(|(a, b)| a + b).collect()
        }
    }

    ///
    /// Same recursion shape as `updown`, but the current dimension uses the
    /// operator's special kernels.
    ///
    fn special(&self, alpha: &[f64], dim: usize, op_dim: usize) -> Vec<f64>
    {
        if dim > 0
        {
            let (left, right) = rayon::join(
                ||
                {
                    let mut temp = vec![0.0; alpha.len()];
                    self.op.up_op_dim(self.storage, alpha, &mut temp, dim);
                    self.updown(&temp, dim - 1, op_dim)
                },
                ||
                {
                    let temp = self.updown(alpha, dim - 1, op_dim);
                    let mut result = vec![0.0; alpha.len()];
                    self.op.down_op_dim(self.storage, &temp, &mut result, dim);
                    result
                });
            left.iter().zip(right).map(|(a, b)| a + b).collect()
        }
        else
        {
            let mut up = vec![0.0; alpha.len()];
            self.op.up_op_dim(self.storage, alpha, &mut up, 0);
            let mut down = vec![0.0; alpha.len()];
            self.op.down_op_dim(self.storage, alpha, &mut down, 0);
            up.iter().zip(down).map(|(a, b)| a + b).collect()
        }
    }
}
