use std::collections::{BTreeMap,VecDeque};

use tracing::trace;

use super::explosions::ExplosionMap;
use super::intents::*;
use super::model::*;

/// One robot's intents, best first. The front is what it currently plans to do.
pub struct Candidates {
    pub robot_id: u32,

    /// What the enemy thinks we are carrying matters more than what we actually carry
    pub carrying: Option<Item>,

    pub intents: VecDeque<Intent>,
}
impl Candidates {
    pub fn new(robot: &Entity, intents: Vec<Intent>) -> Self {
        Self {
            robot_id: robot.id,
            carrying: robot.carrying,
            intents: intents.into_iter().collect(),
        }
    }

    pub fn best(&self) -> Option<&Intent> {
        self.intents.front()
    }

    fn drop_best(&mut self) {
        if let Some(dropped) = self.intents.pop_front() {
            trace!(robot = self.robot_id, intent = %dropped, "dropped intent");
        }
    }
}

/// Resolves conflicts between robots' plans by making the losers fall back to their next best intent
pub struct Coordinator<'a> {
    world: &'a World,
    explosions: &'a ExplosionMap,
    squirrelling: bool,
}
impl<'a> Coordinator<'a> {
    pub fn new(world: &'a World, explosions: &'a ExplosionMap, squirrelling: bool) -> Self {
        Self { world, explosions, squirrelling }
    }

    /// Returns the number of rounds it took to settle
    pub fn coordinate(&self, candidates: &mut [Candidates]) -> usize {
        candidates.sort_by_key(|c| c.robot_id);

        let max_rounds = candidates.len().max(1);
        let mut rounds = 0;
        while rounds < max_rounds {
            let mut changed = false;
            while self.limit_capacity(candidates) || self.limit_hazards(candidates) {
                changed = true;
            }
            if Self::subsume(candidates) {
                changed = true;
            }
            if !changed { break }
            rounds += 1;
        }

        // The last subsumption may have moved someone onto a full or dangerous cell
        while self.limit_capacity(candidates) || self.limit_hazards(candidates) {}

        rounds
    }

    fn capacity(&self, target: Pos, diggers: &[usize], candidates: &[Candidates]) -> usize {
        // A second dig by someone the enemy thinks is carrying would give away the squirrel
        if self.squirrelling && diggers.iter().any(|&i| candidates[i].carrying.is_some()) {
            return 1;
        }

        match self.world.cell(target).ore {
            Some(ore) if ore > 0 => ore as usize,
            _ => 1,
        }
    }

    /// Returns true if any robot was made to give up its best intent
    fn limit_capacity(&self, candidates: &mut [Candidates]) -> bool {
        let mut diggers: BTreeMap<Pos, Vec<usize>> = BTreeMap::new();
        for (i, c) in candidates.iter().enumerate() {
            if let Some(target) = c.best().and_then(|intent| intent.dig_target()) {
                diggers.entry(target).or_default().push(i);
            }
        }

        let mut changed = false;
        for (target, mut group) in diggers {
            let capacity = self.capacity(target, &group, candidates);
            if group.len() <= capacity { continue }

            Self::rank(&mut group, candidates);
            for &i in group[capacity..].iter() {
                candidates[i].drop_best();
            }
            changed = true;
        }
        changed
    }

    /// Only one robot at a time should wait to dig in a cell that could explode
    fn limit_hazards(&self, candidates: &mut [Candidates]) -> bool {
        let mut waiting: BTreeMap<Pos, Vec<usize>> = BTreeMap::new();
        for (i, c) in candidates.iter().enumerate() {
            if let Some(destination) = c.best().and_then(|intent| intent.destination()) {
                if self.explosions.is_dangerous(destination) {
                    waiting.entry(destination).or_default().push(i);
                }
            }
        }

        let mut changed = false;
        for (_, mut group) in waiting {
            if group.len() <= 1 { continue }

            Self::rank(&mut group, candidates);
            for &i in group[1..].iter() {
                candidates[i].drop_best();
            }
            changed = true;
        }
        changed
    }

    fn subsume(candidates: &mut [Candidates]) -> bool {
        let mut changed = false;
        for i in 0..candidates.len() {
            for j in 0..candidates.len() {
                if i == j { continue }

                let subsumes = match (candidates[i].best(), candidates[j].best()) {
                    (Some(a), Some(b)) => a.subsumes(b),
                    _ => false,
                };
                if subsumes {
                    candidates[j].drop_best();
                    changed = true;
                }
            }
        }
        changed
    }

    fn rank(group: &mut [usize], candidates: &[Candidates]) {
        group.sort_by(|&a, &b| {
            match (candidates[a].best(), candidates[b].best()) {
                (Some(a), Some(b)) => Intent::compare(a, b),
                _ => a.cmp(&b),
            }
        });
    }
}
