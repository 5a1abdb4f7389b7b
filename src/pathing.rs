use std::cmp::{Ordering,Reverse};
use std::collections::BinaryHeap;

use super::explosions::ExplosionMap;
use super::model::*;

/// Cost in moves from one robot to every cell, where stepping into a cell that could explode costs extra
pub struct PathMap {
    from: Pos,
    bounds: Bounds,
    costs: Box<[i32]>,
}
impl PathMap {
    pub fn generate(from: Pos, bounds: Bounds, explosions: &ExplosionMap, explosion_cost: i32, bait: bool) -> Self {
        let (costs, _) = Self::search(from, bounds, explosions, explosion_cost, bait);
        Self { from, bounds, costs }
    }

    /// Cheapest first, so each cell is expanded at most once. Also returns the number of expansions.
    fn search(from: Pos, bounds: Bounds, explosions: &ExplosionMap, explosion_cost: i32, bait: bool) -> (Box<[i32]>, usize) {
        let mut costs = Vec::new();
        costs.resize(bounds.num_cells(), i32::MAX);
        costs[bounds.index(from)] = 0;

        let mut expanded = Vec::new();
        expanded.resize(bounds.num_cells(), false);
        let mut num_expanded = 0;

        let mut queue = BinaryHeap::new();
        queue.push(Reverse((0, from)));

        while let Some(Reverse((current_cost, current))) = queue.pop() {
            let current_index = bounds.index(current);
            if expanded[current_index] || current_cost > costs[current_index] { continue }
            expanded[current_index] = true;
            num_expanded += 1;

            for n in bounds.neighbours(current, MOVEMENT_SPEED) {
                if n == current { continue }

                let mut neighbour_cost = current_cost + 1;
                if !bait && explosions.is_dangerous(n) {
                    neighbour_cost += explosion_cost;
                }

                let index = bounds.index(n);
                if neighbour_cost < costs[index] {
                    costs[index] = neighbour_cost;
                    queue.push(Reverse((neighbour_cost, n)));
                }
            }
        }

        (costs.into_boxed_slice(), num_expanded)
    }

    /// i32::MAX if the target cannot be reached
    pub fn cost(&self, target: Pos) -> i32 {
        self.costs[self.bounds.index(target)]
    }

    /// Waypoints from (but excluding) the origin to the target, one move apart
    pub fn path_to(&self, target: Pos) -> Vec<Pos> {
        if target == self.from || !self.bounds.contains(target) || self.cost(target) == i32::MAX {
            return vec![target]
        }

        let mut path = Vec::new();
        let mut current = target;
        while current != self.from {
            path.push(current);

            let previous = self.bounds.neighbours(current, MOVEMENT_SPEED)
                .filter(|&n| n != current)
                .min_by(|&a, &b| {
                    self.cost(a).cmp(&self.cost(b))
                        .then_with(|| Pos::distance(a, target).partial_cmp(&Pos::distance(b, target)).unwrap_or(Ordering::Equal))
                });
            match previous {
                Some(previous) if self.cost(previous) < self.cost(current) => current = previous,
                _ => break,
            }
        }
        path.reverse();
        path
    }

    pub fn next_step(&self, target: Pos) -> Pos {
        self.path_to(target).first().cloned().unwrap_or(target)
    }

    /// The furthest straight-line progress towards the target in one move, ignoring danger
    pub fn direct_step(&self, target: Pos) -> Pos {
        if Pos::l1(self.from, target) <= MOVEMENT_SPEED { return target }

        self.bounds.neighbours(self.from, MOVEMENT_SPEED)
            .min_by(|&a, &b| Pos::distance(a, target).partial_cmp(&Pos::distance(b, target)).unwrap_or(Ordering::Equal))
            .unwrap_or(target)
    }
}
