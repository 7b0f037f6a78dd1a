use crate::storage::{GridPoint, GridStorage};

///
/// Generate a regular sparse grid of the given per-dimension levels without
/// boundary points. Points satisfy the usual level-sum bound
/// `|l|_1 <= n + d - 1`.
///
pub fn regular(storage: &mut GridStorage, levels: &[usize])
{
    let d0_level = levels[0] as u32;
    let mut point = GridPoint::new(&vec![1; storage.num_dims()], &vec![1; storage.num_dims()], false);
    for l in 1..=d0_level
    {
        for i in (1..(1u32 << l)).step_by(2)
        {
            point.level[0] = l as u8;
            point.index[0] = i;
            point.set_is_leaf(l == d0_level);
            storage.insert(point.clone());
        }
    }
    // Widen dimension by dimension: take every point of the intermediate
    // grid and spread it over the admissible levels of dimension d.
    #[allow(clippy::needless_range_loop)]
    for d in 1..storage.num_dims()
    {
        let ngrids = storage.len();
        let n = levels[d] as u32;
        for g in 0..ngrids
        {
            let mut first = true;
            let mut point = storage.point(g);
            let level_sum = (point.level_sum() - 1) as u32;
            for l in 1..=n
            {
                if l + level_sum > n + storage.num_dims() as u32 - 1
                {
                    break;
                }
                for i in (1..(1u32 << l)).step_by(2)
                {
                    point.level[d] = l as u8;
                    point.index[d] = i;
                    point.set_is_leaf(l + level_sum == n + storage.num_dims() as u32 - 1);
                    if first
                    {
                        storage.update(point.clone(), g);
                        first = false;
                    }
                    else
                    {
                        storage.insert(point.clone());
                    }
                }
            }
        }
    }
}

///
/// Generate a full tensor grid of 2^level - 1 points per dimension, without
/// boundaries.
///
pub fn full(storage: &mut GridStorage, level: usize)
{
    let n = level as u32;
    let mut point = GridPoint::new(&vec![1; storage.num_dims()], &vec![1; storage.num_dims()], false);
    for l in 1..=n
    {
        for i in (1..(1u32 << l)).step_by(2)
        {
            point.level[0] = l as u8;
            point.index[0] = i;
            point.set_is_leaf(l == n);
            storage.insert(point.clone());
        }
    }
    for d in 1..storage.num_dims()
    {
        let ngrids = storage.len();
        for g in 0..ngrids
        {
            let mut first = true;
            let mut point = storage.point(g);
            for l in 1..=n
            {
                for i in (1..(1u32 << l)).step_by(2)
                {
                    point.level[d] = l as u8;
                    point.index[d] = i;
                    point.set_is_leaf(point.level_sum() as u32 == n * storage.num_dims() as u32);
                    if first
                    {
                        storage.update(point.clone(), g);
                        first = false;
                    }
                    else
                    {
                        storage.insert(point.clone());
                    }
                }
            }
        }
    }
}

///
/// Generate a full grid including the level-0 boundary points.
///
pub fn full_with_boundaries(storage: &mut GridStorage, level: usize)
{
    let n = level as u32;
    let mut point = GridPoint::new(&vec![1; storage.num_dims()], &vec![1; storage.num_dims()], false);
    point.level[0] = 0;
    point.index[0] = 0;
    storage.insert(point.clone());
    point.index[0] = 1;
    storage.insert(point.clone());
    for l in 1..=n
    {
        for i in (1..(1u32 << l)).step_by(2)
        {
            point.level[0] = l as u8;
            point.index[0] = i;
            point.set_is_leaf(l == n);
            storage.insert(point.clone());
        }
    }
    for d in 1..storage.num_dims()
    {
        let ngrids = storage.len();
        for g in 0..ngrids
        {
            let mut point = storage.point(g);
            point.level[d] = 0;
            point.index[d] = 0;
            point.set_is_leaf(false);
            storage.update(point.clone(), g);
            point.index[d] = 1;
            storage.insert(point.clone());
            for l in 1..=n
            {
                point.level[d] = l as u8;
                for i in (1..(1u32 << l)).step_by(2)
                {
                    point.index[d] = i;
                    point.set_is_leaf(point.level_sum() as u32 == n * storage.num_dims() as u32);
                    storage.insert(point.clone());
                }
            }
        }
    }
    storage.has_boundary = true;
}

///
/// Generate a regular sparse grid with truncated boundaries: the level-sum
/// bound of `regular`, with level-0 entries counting as level 1. Every
/// admissible interior point drags the boundary points of its lower-level
/// faces along.
///
pub fn regular_with_boundaries(storage: &mut GridStorage, level: usize)
{
    let n = level as u32;
    let dims = storage.num_dims() as u32;
    let mut point = GridPoint::new(&vec![1; storage.num_dims()], &vec![1; storage.num_dims()], false);
    point.level[0] = 0;
    point.index[0] = 0;
    storage.insert(point.clone());
    point.index[0] = 1;
    storage.insert(point.clone());
    for l in 1..=n
    {
        for i in (1..(1u32 << l)).step_by(2)
        {
            point.level[0] = l as u8;
            point.index[0] = i;
            point.set_is_leaf(dims == 1 && l == n);
            storage.insert(point.clone());
        }
    }
    for d in 1..storage.num_dims()
    {
        let ngrids = storage.len();
        for g in 0..ngrids
        {
            let mut point = storage.point(g);
            // effective level sum of the other dimensions, counting
            // boundary entries as level 1
            let eff_rest: u32 = (0..storage.num_dims())
                .filter(|&k| k != d)
                .map(|k| point.level[k].max(1) as u32)
                .sum();
            point.level[d] = 0;
            point.index[d] = 0;
            point.set_is_leaf(false);
            storage.update(point.clone(), g);
            point.index[d] = 1;
            storage.insert(point.clone());
            let budget = (n + dims - 1 - eff_rest).min(n);
            for l in 1..=budget
            {
                point.level[d] = l as u8;
                for i in (1..(1u32 << l)).step_by(2)
                {
                    point.index[d] = i;
                    // points touching a boundary always keep their (1,1)
                    // child and are never leaves
                    point.set_is_leaf(!point.level.contains(&0)
                        && eff_rest + l == n + dims - 1);
                    storage.insert(point.clone());
                }
            }
        }
    }
    storage.has_boundary = true;
}
