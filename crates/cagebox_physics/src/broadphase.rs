//! Candidate pair selection
//!
//! Both strategies report the same set of overlapping pairs, sorted, so the
//! choice only affects cost.

use serde::{Deserialize, Serialize};

use crate::shapes::Aabb;

/// Broadphase strategy used by the physics world
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BroadphaseKind {
    /// Test every pair; fine for the tens of bodies a sandbox holds
    #[default]
    Naive,
    /// Sort by min X and sweep
    SweepAndPrune,
}

impl BroadphaseKind {
    /// Indices `(i, j)` with `i < j` whose boxes overlap
    pub fn find_pairs(&self, boxes: &[Aabb]) -> Vec<(usize, usize)> {
        let mut pairs = match self {
            BroadphaseKind::Naive => naive_pairs(boxes),
            BroadphaseKind::SweepAndPrune => sweep_pairs(boxes),
        };
        pairs.sort_unstable();
        pairs
    }
}

fn naive_pairs(boxes: &[Aabb]) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for i in 0..boxes.len() {
        for j in (i + 1)..boxes.len() {
            if boxes[i].overlaps(&boxes[j]) {
                pairs.push((i, j));
            }
        }
    }
    pairs
}

fn sweep_pairs(boxes: &[Aabb]) -> Vec<(usize, usize)> {
    let mut order: Vec<usize> = (0..boxes.len()).collect();
    order.sort_by(|&a, &b| boxes[a].min.x.total_cmp(&boxes[b].min.x));

    let mut pairs = Vec::new();
    for (n, &i) in order.iter().enumerate() {
        for &j in &order[n + 1..] {
            if boxes[j].min.x > boxes[i].max.x {
                break;
            }
            if boxes[i].overlaps(&boxes[j]) {
                pairs.push((i.min(j), i.max(j)));
            }
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use cagebox_math::Vec3;

    fn boxes() -> Vec<Aabb> {
        vec![
            Aabb::from_center_half_extents(Vec3::new(0.0, 0.0, 0.0), Vec3::splat(1.0)),
            Aabb::from_center_half_extents(Vec3::new(10.0, 0.0, 0.0), Vec3::splat(1.0)),
            Aabb::from_center_half_extents(Vec3::new(1.5, 0.0, 0.0), Vec3::splat(1.0)),
            Aabb::from_center_half_extents(Vec3::new(0.0, 0.0, 0.0), Vec3::new(20.0, 0.1, 20.0)),
        ]
    }

    #[test]
    fn test_naive_pairs() {
        let pairs = BroadphaseKind::Naive.find_pairs(&boxes());
        assert_eq!(pairs, vec![(0, 2), (0, 3), (1, 3), (2, 3)]);
    }

    #[test]
    fn test_sweep_matches_naive() {
        let b = boxes();
        assert_eq!(
            BroadphaseKind::SweepAndPrune.find_pairs(&b),
            BroadphaseKind::Naive.find_pairs(&b)
        );
    }
}
