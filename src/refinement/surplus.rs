use crate::algorithms::coarsening::CoarseningFunctor;
use crate::algorithms::refinement::RefinementFunctor;
use crate::storage::GridStorage;

///
/// Scores points by the absolute value of their hierarchical surplus. The
/// workhorse indicator: a large surplus means the interpolant is still
/// changing quickly around the point.
///
pub struct SurplusRefinement<'a>
{
    alpha: &'a [f64],
    threshold: f64,
    refinements_num: usize,
}

impl<'a> SurplusRefinement<'a>
{
    pub fn new(alpha: &'a [f64], threshold: f64, refinements_num: usize) -> Self
    {
        Self { alpha, threshold, refinements_num }
    }
}

impl RefinementFunctor for SurplusRefinement<'_>
{
    fn eval(&self, _storage: &GridStorage, seq: usize) -> f64
    {
        self.alpha[seq].abs()
    }

    fn start(&self) -> f64
    {
        self.threshold
    }

    fn refinements_num(&self) -> usize
    {
        self.refinements_num
    }
}

///
/// The mirror image for coarsening: leaves whose absolute surplus is at or
/// below the threshold are candidates for removal.
///
pub struct SurplusCoarsening<'a>
{
    alpha: &'a [f64],
    threshold: f64,
    removals_num: usize,
}

impl<'a> SurplusCoarsening<'a>
{
    pub fn new(alpha: &'a [f64], threshold: f64, removals_num: usize) -> Self
    {
        Self { alpha, threshold, removals_num }
    }
}

impl CoarseningFunctor for SurplusCoarsening<'_>
{
    fn eval(&self, _storage: &GridStorage, seq: usize) -> f64
    {
        self.alpha[seq].abs()
    }

    fn start(&self) -> f64
    {
        self.threshold
    }

    fn removals_num(&self) -> usize
    {
        self.removals_num
    }
}
