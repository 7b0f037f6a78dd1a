use crate::algorithms::sweep::sweep_1d;
use crate::operations::mass::{PhiPhiDownLinear, PhiPhiUpLinear};
use crate::operations::updown::UpDownOneOpDimOperation;
use crate::storage::GridStorage;

///
/// Laplacian for boundaryless linear grids: `sum_d integral(dphi/dx_d *
/// dphi/dx_d)` with mass factors in the remaining dimensions; plug into
/// `UpDownOneOpDim`.
///
/// The gradient factor is diagonal for this basis. Basis functions on the
/// same level have disjoint supports, and an ancestor's derivative is
/// constant on a descendant's support, where the descendant's derivative
/// integrates to zero. That leaves `integral((dphi_{l,i}/dx)^2) = 2^(l+1)`,
/// scaled by 1/q on a non-unit interval.
///
pub struct OperationLaplaceLinear;

impl UpDownOneOpDimOperation for OperationLaplaceLinear
{
    fn up(&self, storage: &GridStorage, alpha: &[f64], result: &mut [f64], dim: usize)
    {
        sweep_1d(&PhiPhiUpLinear, storage, alpha, result, dim);
    }

    fn down(&self, storage: &GridStorage, alpha: &[f64], result: &mut [f64], dim: usize)
    {
        sweep_1d(&PhiPhiDownLinear, storage, alpha, result, dim);
    }

    fn up_op_dim(&self, _storage: &GridStorage, _alpha: &[f64], result: &mut [f64], _dim: usize)
    {
        result.fill(0.0);
    }

    fn down_op_dim(&self, storage: &GridStorage, alpha: &[f64], result: &mut [f64], dim: usize)
    {
        let q = storage.bounding_box().width(dim);
        for (seq, value) in result.iter_mut().enumerate()
        {
            let l = storage.level(seq, dim) as i32;
            *value = alpha[seq] * 2f64.powi(l + 1) / q;
        }
    }
}
