use std::collections::VecDeque;

use rustc_hash::FxHashMap;
use tracing::debug;

use super::beliefs::Beliefs;
use super::model::*;
use super::pathing::PathMap;

pub type ExplosionId = u32;

/// Which cells could be caught in an enemy-triggered explosion before we get the chance to react
pub struct ExplosionMap {
    bounds: Bounds,
    num_explosions: u32,
    probabilities: Box<[f32]>,
    explosion_ids: Box<[Vec<ExplosionId>]>,

    /// The last explosion to flood through this cell as a trap, so each flood visits a trap once
    flooded_by: Box<[ExplosionId]>,
}
impl ExplosionMap {
    pub fn empty(bounds: Bounds) -> Self {
        let num_cells = bounds.num_cells();

        let mut probabilities = Vec::new();
        probabilities.resize(num_cells, 0.0);

        let mut explosion_ids = Vec::new();
        explosion_ids.resize_with(num_cells, Vec::new);

        let mut flooded_by = Vec::new();
        flooded_by.resize(num_cells, 0);

        Self {
            bounds,
            num_explosions: 0,
            probabilities: probabilities.into_boxed_slice(),
            explosion_ids: explosion_ids.into_boxed_slice(),
            flooded_by: flooded_by.into_boxed_slice(),
        }
    }

    pub fn generate(world: &World, beliefs: &Beliefs) -> Self {
        let mut result = Self::empty(world.bounds);
        for enemy in world.live_robots(EntityKind::EnemyRobot) {
            let carrying_probability = beliefs.carrying_probability(enemy.id);
            if carrying_probability > 0.0 {
                // The enemy can bury a trap next to itself and detonate it before we can escape
                let explosion_id = result.next_explosion_id();
                for trap in world.bounds.neighbours(enemy.pos, DIG_RANGE) {
                    result.explode_trap(explosion_id, trap, carrying_probability, beliefs);
                }
            }

            // The enemy can reach an existing trap and detonate it before we can escape
            for trap in world.bounds.neighbours(enemy.pos, MOVEMENT_SPEED + DIG_RANGE) {
                let trap_probability = beliefs.trap_probability(trap);
                if trap_probability > 0.0 {
                    let explosion_id = result.next_explosion_id();
                    result.explode_trap(explosion_id, trap, trap_probability, beliefs);
                }
            }
        }
        debug!(explosions = result.num_explosions, "generated explosion map");
        result
    }

    fn next_explosion_id(&mut self) -> ExplosionId {
        self.num_explosions += 1;
        self.num_explosions
    }

    fn explode_trap(&mut self, explosion_id: ExplosionId, origin: Pos, trap_probability: f32, beliefs: &Beliefs) {
        let mut queue = VecDeque::new();
        self.enqueue_trap(explosion_id, origin, trap_probability, &mut queue);

        while let Some((trap, trap_probability)) = queue.pop_front() {
            for explosion in self.bounds.neighbours(trap, TRAP_RANGE) {
                self.mark(explosion, trap_probability, explosion_id);

                let next_trap_probability = beliefs.trap_probability(explosion);
                self.enqueue_trap(explosion_id, explosion, next_trap_probability, &mut queue);
            }
        }
    }

    fn enqueue_trap(&mut self, explosion_id: ExplosionId, trap: Pos, trap_probability: f32, queue: &mut VecDeque<(Pos, f32)>) {
        if trap_probability <= 0.0 { return }
        if trap.is_home() { return } // Traps cannot be buried in the headquarters column

        let index = self.bounds.index(trap);
        if self.flooded_by[index] == explosion_id { return }
        self.flooded_by[index] = explosion_id;

        queue.push_back((trap, trap_probability));
    }

    fn mark(&mut self, pos: Pos, probability: f32, explosion_id: ExplosionId) {
        let index = self.bounds.index(pos);
        self.probabilities[index] = self.probabilities[index].max(probability);

        let ids = &mut self.explosion_ids[index];
        if !ids.contains(&explosion_id) {
            ids.push(explosion_id);
        }
    }

    pub fn num_explosions(&self) -> u32 {
        self.num_explosions
    }

    pub fn explode_probability(&self, pos: Pos) -> f32 {
        self.probabilities[self.bounds.index(pos)]
    }

    pub fn is_dangerous(&self, pos: Pos) -> bool {
        self.explode_probability(pos) > 0.0
    }

    pub fn explosion_ids(&self, pos: Pos) -> &[ExplosionId] {
        &self.explosion_ids[self.bounds.index(pos)]
    }
}

/// Lets one robot per explosion walk into danger each tick. If the enemy detonates, it is a fair 1-for-1 trade.
pub struct ExplosionAvoider<'a> {
    explosions: &'a ExplosionMap,
    claimed: FxHashMap<ExplosionId, u32>,
}
impl<'a> ExplosionAvoider<'a> {
    pub fn new(explosions: &'a ExplosionMap) -> Self {
        Self {
            explosions,
            claimed: FxHashMap::default(),
        }
    }

    pub fn claimants(&self, target: Pos) -> Vec<u32> {
        self.explosions.explosion_ids(target).iter()
            .filter_map(|explosion_id| self.claimed.get(explosion_id).cloned())
            .collect()
    }

    /// The next waypoint towards `target`: the direct step if this robot may take it, otherwise the safest path
    pub fn claim_path(&mut self, robot_id: u32, paths: &PathMap, target: Pos) -> Pos {
        let direct = paths.direct_step(target);
        if self.claim(robot_id, direct) {
            direct
        } else {
            debug!(robot = robot_id, %direct, claimants = ?self.claimants(direct), "avoiding claimed explosion");
            self.avoidance_step(paths, target)
        }
    }

    pub fn avoidance_step(&self, paths: &PathMap, target: Pos) -> Pos {
        paths.next_step(target)
    }

    fn claim(&mut self, robot_id: u32, pos: Pos) -> bool {
        let explosion_ids = self.explosions.explosion_ids(pos);
        let taken = explosion_ids.iter().any(|explosion_id| {
            matches!(self.claimed.get(explosion_id), Some(&claimant) if claimant != robot_id)
        });
        if taken { return false }

        for &explosion_id in explosion_ids.iter() {
            self.claimed.insert(explosion_id, robot_id);
        }
        true
    }
}

#[cfg(test)]
impl ExplosionMap {
    pub fn with_explosion(mut self, cells: &[Pos], probability: f32) -> Self {
        let explosion_id = self.next_explosion_id();
        for &pos in cells.iter() {
            self.mark(pos, probability, explosion_id);
        }
        self
    }
}
