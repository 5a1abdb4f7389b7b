use rustc_hash::FxHashMap;
use tracing::debug;

use super::model::*;
use super::params::Params;

/// Keeps the logistic transform away from exactly 0 or 1 in f32
const ORE_BELIEF_LIMIT: f32 = 10.0;

#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub enum Knowledge {
    Absent,
    Unknown,
    Present,
}

#[derive(Clone,Debug)]
pub struct CellBelief {
    pos: Pos,

    ore_belief: f32,
    ore_known: Knowledge,
    had_ore: bool,

    trap_belief: f32,
    trap_known: Knowledge,

    appears_trapped: bool,
}
impl CellBelief {
    pub fn new(pos: Pos, bounds: Bounds, params: &Params) -> Self {
        Self {
            pos,
            ore_belief: Self::prior_ore_belief(pos, bounds, params),
            // Never any ore in the headquarters column
            ore_known: if pos.is_home() { Knowledge::Absent } else { Knowledge::Unknown },
            had_ore: false,
            trap_belief: 0.0,
            trap_known: Knowledge::Unknown,
            appears_trapped: false,
        }
    }

    fn prior_ore_belief(pos: Pos, bounds: Bounds, params: &Params) -> f32 {
        let mut prior = 0.0;
        if pos.x < params.ore_start_x {
            let proportion = 1.0 - pos.x as f32 / params.ore_start_x as f32;
            prior += proportion * params.ore_before_start_x_prior_belief;
        }

        let edge = bounds.distance_to_edge(pos);
        if edge <= params.ore_margin {
            let proportion = if params.ore_margin > 0 {
                (1.0 - edge as f32 / params.ore_margin as f32).max(0.0)
            } else {
                1.0
            };
            prior += proportion * params.ore_margin_prior_belief;
        }
        prior
    }

    fn nudge_ore(&mut self, delta: f32) {
        self.ore_belief = (self.ore_belief + delta).clamp(-ORE_BELIEF_LIMIT, ORE_BELIEF_LIMIT);
    }

    pub fn observed_self_dig(&mut self, success: bool, drop: bool, appears_trapped: bool) {
        if success || drop {
            self.ore_belief = 1.0;
            self.ore_known = Knowledge::Present;
            self.had_ore = true;
        } else {
            self.ore_belief = -1.0;
            self.ore_known = Knowledge::Absent;
        }
        self.appears_trapped |= appears_trapped;
    }

    pub fn observed_self_dig_neighbour(&mut self, success: bool, dug: Pos, dug_had_ore: bool, params: &Params) {
        let modifier = (-Pos::l1(self.pos, dug) as f32).exp();
        if success {
            self.nudge_ore(params.ore_neighbour_belief * modifier);
        } else if dug_had_ore {
            // We always dig a cell until it is exhausted, so running out says nothing about the cells around it
        } else {
            self.nudge_ore(-params.ore_neighbour_belief * modifier);
        }
    }

    pub fn observed_enemy_dig(&mut self, carrying_probability: f32, params: &Params) {
        if carrying_probability > 0.0 {
            if self.trap_known == Knowledge::Absent {
                self.trap_known = Knowledge::Unknown;
                self.trap_belief = 0.0;
            }
            self.trap_belief += params.enemy_dig_trap_belief;
        } else if self.trap_known != Knowledge::Present {
            // Nothing to bury, so the enemy just cleared this cell
            self.trap_known = Knowledge::Absent;
        }
    }

    pub fn observed_enemy_dig_neighbour(&mut self, dug: Pos, params: &Params) {
        let modifier = (-Pos::l1(self.pos, dug) as f32).exp();
        self.nudge_ore(params.enemy_ore_neighbour_belief * modifier);
    }

    pub fn observed_still_enemy(&mut self, carrying_probability: f32, params: &Params) {
        if carrying_probability > 0.0 && self.trap_known == Knowledge::Unknown {
            self.trap_belief += params.still_enemy_trap_belief;
        }
    }

    pub fn observed_ore(&mut self, success: bool) {
        if success {
            self.ore_belief = 1.0;
            self.ore_known = Knowledge::Present;
            self.had_ore = true;
        } else {
            self.ore_belief = -1.0;
            self.ore_known = Knowledge::Absent;
        }
    }

    pub fn observed_trap(&mut self) {
        self.trap_known = Knowledge::Present;
    }

    pub fn ore_known(&self) -> Knowledge {
        self.ore_known
    }

    pub fn had_ore(&self) -> bool {
        self.had_ore
    }

    pub fn appears_trapped(&self) -> bool {
        self.appears_trapped
    }

    pub fn trap_belief(&self) -> f32 {
        self.trap_belief
    }

    pub fn ore_probability(&self) -> f32 {
        match self.ore_known {
            Knowledge::Absent => 0.0,
            Knowledge::Present => 1.0,
            Knowledge::Unknown => 1.0 / (1.0 + (-self.ore_belief).exp()),
        }
    }

    /// -1 means an enemy was seen digging here with nothing to bury, which is stronger than 0
    pub fn trap_probability(&self) -> f32 {
        if self.pos.is_home() { return 0.0 } // Traps cannot be buried in the headquarters column

        match self.trap_known {
            Knowledge::Present => 1.0,
            Knowledge::Absent => -1.0,
            Knowledge::Unknown => 1.0 - (-self.trap_belief).exp(),
        }
    }
}

#[derive(Clone,Debug,Default)]
pub struct RobotBelief {
    carrying_belief: f32,
}
impl RobotBelief {
    pub fn observed_still_at_headquarters(&mut self) {
        self.carrying_belief = 1.0;
    }

    pub fn observed_dig(&mut self) {
        self.carrying_belief = -1.0;
    }

    pub fn observed_potential_dig(&mut self, decay: f32) {
        self.carrying_belief -= decay;
    }

    pub fn carrying_belief(&self) -> f32 {
        self.carrying_belief
    }

    pub fn carrying_probability(&self) -> f32 {
        (1.0 - (-self.carrying_belief).exp()).max(0.0)
    }
}

struct StillEnemy {
    id: u32,
    pos: Pos,
    candidates: Vec<Pos>,
    assigned: Vec<Pos>,
}

/// Everything we believe about the hidden parts of the match. Lives for the whole match.
pub struct Beliefs {
    bounds: Bounds,
    cells: Box<[CellBelief]>,
    robots: FxHashMap<u32, RobotBelief>,
}
impl Beliefs {
    pub fn new(bounds: Bounds, params: &Params) -> Self {
        let cells: Vec<CellBelief> = bounds.all().map(|pos| CellBelief::new(pos, bounds, params)).collect();
        Self {
            bounds,
            cells: cells.into_boxed_slice(),
            robots: FxHashMap::default(),
        }
    }

    pub fn cell(&self, pos: Pos) -> &CellBelief {
        &self.cells[self.bounds.index(pos)]
    }

    fn cell_mut(&mut self, pos: Pos) -> &mut CellBelief {
        &mut self.cells[self.bounds.index(pos)]
    }

    pub fn ore_probability(&self, pos: Pos) -> f32 {
        self.cell(pos).ore_probability()
    }

    pub fn trap_probability(&self, pos: Pos) -> f32 {
        self.cell(pos).trap_probability()
    }

    pub fn appears_trapped(&self, pos: Pos) -> bool {
        self.cell(pos).appears_trapped()
    }

    pub fn robot(&self, robot_id: u32) -> Option<&RobotBelief> {
        self.robots.get(&robot_id)
    }

    pub fn carrying_probability(&self, robot_id: u32) -> f32 {
        self.robots.get(&robot_id).map(|robot| robot.carrying_probability()).unwrap_or(0.0)
    }

    /// Apply everything that can be learned from the difference between two consecutive snapshots
    pub fn update(&mut self, previous: &World, world: &World, params: &Params) {
        // Read every carrying probability before any of this tick's observations are applied
        let carrying: FxHashMap<u32, f32> =
            world.entities_of(EntityKind::EnemyRobot)
            .map(|enemy| (enemy.id, self.carrying_probability(enemy.id)))
            .collect();

        let mut unexplained = Self::find_digs(previous, world);
        self.observe_self_digs(previous, world, &mut unexplained, params);
        self.observe_enemies(previous, world, &mut unexplained, &carrying, params);
        self.observe_map(world);
        self.observe_entities(world);
    }

    /// Cell -> number of digs that happened there since the previous tick
    fn find_digs(previous: &World, world: &World) -> FxHashMap<Pos, u32> {
        let mut digs = FxHashMap::default();
        for pos in world.bounds.all() {
            let old = previous.cell(pos);
            let new = world.cell(pos);

            let mut count = match (old.ore, new.ore) {
                (Some(before), Some(after)) if after < before => before - after,
                _ => 0,
            };
            if new.hole && !old.hole {
                count = count.max(1);
            }

            if count > 0 {
                digs.insert(pos, count);
            }
        }
        digs
    }

    fn consume(unexplained: &mut FxHashMap<Pos, u32>, pos: Pos) {
        if let Some(count) = unexplained.get_mut(&pos) {
            *count -= 1;
            if *count == 0 {
                unexplained.remove(&pos);
            }
        }
    }

    fn observe_self_digs(&mut self, previous: &World, world: &World, unexplained: &mut FxHashMap<Pos, u32>, params: &Params) {
        for robot in world.live_robots(EntityKind::OwnRobot) {
            let previous_robot = match previous.entity(robot.id) {
                Some(previous_robot) => previous_robot,
                None => continue,
            };
            let target = match previous.action(robot.id).map(|action| &action.command) {
                Some(&Command::Dig { target }) => target,
                _ => continue,
            };
            if previous_robot.pos != robot.pos { continue } // Must stand still to dig
            if Pos::l1(target, previous_robot.pos) > DIG_RANGE { continue }
            if !world.bounds.contains(target) { continue }

            Self::consume(unexplained, target);

            let success = previous_robot.carrying != Some(Item::Ore) && robot.carrying == Some(Item::Ore);
            let drop = previous_robot.carrying == Some(Item::Ore) && robot.carrying != Some(Item::Ore);
            let appears_trapped = previous_robot.carrying.is_some() && !previous.cell(target).hole;
            debug!(robot = robot.id, %target, success, drop, appears_trapped, "self dig");

            let cell = self.cell_mut(target);
            cell.observed_self_dig(success, drop, appears_trapped);
            let had_ore = cell.had_ore();

            if drop { continue } // We put the ore there ourselves, so it says nothing about the neighbours

            for n in world.bounds.neighbours(target, params.ore_neighbour_range) {
                if n == target { continue }
                self.cell_mut(n).observed_self_dig_neighbour(success, target, had_ore, params);
            }
        }
    }

    fn observe_enemies(&mut self, previous: &World, world: &World, unexplained: &mut FxHashMap<Pos, u32>, carrying: &FxHashMap<u32, f32>, params: &Params) {
        let mut still = Vec::new();
        for enemy in world.live_robots(EntityKind::EnemyRobot) {
            self.robots.entry(enemy.id).or_default();

            let previous_enemy = match previous.entity(enemy.id) {
                Some(previous_enemy) if !previous_enemy.dead => previous_enemy,
                _ => continue,
            };
            if previous_enemy.pos != enemy.pos { continue }

            let mut candidates: Vec<Pos> =
                unexplained.keys().cloned()
                .filter(|&dig| Pos::l1(dig, enemy.pos) <= DIG_RANGE)
                .collect();
            candidates.sort();

            still.push(StillEnemy {
                id: enemy.id,
                pos: enemy.pos,
                candidates,
                assigned: Vec::new(),
            });
        }

        // Give each dig to the only enemy who could have done it, repeating because each assignment can resolve another
        loop {
            let mut changed = false;
            for enemy in still.iter_mut() {
                if !enemy.assigned.is_empty() { continue }

                let remaining: Vec<Pos> = enemy.candidates.iter().cloned().filter(|dig| unexplained.contains_key(dig)).collect();
                if let [dig] = remaining[..] {
                    Self::consume(unexplained, dig);
                    enemy.assigned.push(dig);
                    changed = true;
                }
            }
            if !changed { break }
        }

        for enemy in still {
            let carrying_probability = carrying.get(&enemy.id).cloned().unwrap_or(0.0);

            let digs: Vec<Pos> = if enemy.assigned.is_empty() {
                // Ambiguous, so credit every dig it could have made
                enemy.candidates.iter().cloned().filter(|dig| unexplained.contains_key(dig)).collect()
            } else {
                enemy.assigned
            };

            if !digs.is_empty() {
                debug!(enemy = enemy.id, carrying = carrying_probability, num_digs = digs.len(), "enemy dig");
                for &dig in digs.iter() {
                    self.cell_mut(dig).observed_enemy_dig(carrying_probability, params);
                    for n in world.bounds.neighbours(dig, params.ore_neighbour_range) {
                        if n == dig { continue }
                        self.cell_mut(n).observed_enemy_dig_neighbour(dig, params);
                    }
                }
                if let Some(robot) = self.robots.get_mut(&enemy.id) {
                    robot.observed_dig();
                }

            } else {
                let mut potential_dig = false;
                for n in world.bounds.neighbours(enemy.pos, DIG_RANGE) {
                    if previous.cell(n).hole {
                        potential_dig = true;
                        self.cell_mut(n).observed_still_enemy(carrying_probability, params);
                    }
                }
                if potential_dig {
                    debug!(enemy = enemy.id, carrying = carrying_probability, "enemy still next to a hole");
                    if let Some(robot) = self.robots.get_mut(&enemy.id) {
                        robot.observed_potential_dig(params.potential_dig_carrying_decay);
                    }
                }
            }

            if enemy.pos.is_home() {
                debug!(enemy = enemy.id, "enemy pickup possible");
                if let Some(robot) = self.robots.get_mut(&enemy.id) {
                    robot.observed_still_at_headquarters();
                }
            }
        }
    }

    fn observe_map(&mut self, world: &World) {
        for pos in world.bounds.all() {
            if let Some(ore) = world.cell(pos).ore {
                self.cell_mut(pos).observed_ore(ore > 0);
            }
        }
    }

    fn observe_entities(&mut self, world: &World) {
        for trap in world.entities_of(EntityKind::Trap) {
            if world.bounds.contains(trap.pos) {
                self.cell_mut(trap.pos).observed_trap();
            }
        }
    }
}
