use rustc_hash::FxHashMap;
use tracing::{debug,info,trace};

use super::beliefs::Beliefs;
use super::coordination::*;
use super::evaluation::Evaluator;
use super::explosions::ExplosionAvoider;
use super::intents::*;
use super::model::*;
use super::params::Params;
use super::pathing::PathMap;
use super::view::{self,View};

/// Every so often one robot pretends to fetch an item, so the enemy learns to distrust trips to headquarters
pub struct BluffScheduler {
    next_bluff_tick: u32,
}
impl BluffScheduler {
    pub fn new() -> Self {
        Self { next_bluff_tick: 0 }
    }

    pub fn is_ready(&self, tick: u32) -> bool {
        tick >= self.next_bluff_tick
    }

    pub fn bluffed(&mut self, tick: u32, interval: u32) {
        self.next_bluff_tick = tick + interval;
    }
}

/// The decision for one robot this tick
pub struct Choice {
    pub intent: Intent,
    pub action: Action,
}

/// Chooses actions for a single tick
pub struct Actor<'a> {
    world: &'a World,
    beliefs: &'a Beliefs,
    params: &'a Params,
    view: View,
}
impl<'a> Actor<'a> {
    pub fn new(world: &'a World, beliefs: &'a Beliefs, params: &'a Params) -> Self {
        Self {
            view: View::new(world, beliefs, params),
            world,
            beliefs,
            params,
        }
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    /// One choice per robot of ours, ordered by robot id
    pub fn choose(&self, bluff_ready: bool) -> Vec<Choice> {
        let mut robots: Vec<&Entity> = self.world.entities_of(EntityKind::OwnRobot).collect();
        robots.sort_by_key(|robot| robot.id);

        let paths: FxHashMap<u32, PathMap> =
            robots.iter()
            .filter(|robot| !robot.dead)
            .map(|robot| {
                let bait = self.view.bait == Some(robot.id);
                (robot.id, PathMap::generate(robot.pos, self.world.bounds, &self.view.explosions, self.params.explosion_cost, bait))
            })
            .collect();

        let evaluator = Evaluator::new(self.world, self.beliefs, &self.view, self.params, bluff_ready);
        let mut candidates: Vec<Candidates> =
            robots.iter()
            .map(|robot| Candidates::new(robot, evaluator.evaluate(robot, paths.get(&robot.id))))
            .collect();

        let coordinator = Coordinator::new(self.world, &self.view.explosions, self.view.squirrelling);
        let rounds = coordinator.coordinate(&mut candidates);
        info!(rounds, "coordinated");

        let mut avoider = ExplosionAvoider::new(&self.view.explosions);
        robots.iter().zip(candidates.iter()).map(|(robot, c)| {
            let intent = c.best().cloned().unwrap_or_else(|| Intent::wait(robot.id));
            let action = match paths.get(&robot.id) {
                Some(paths) => intent.realize(robot, &mut avoider, paths),
                None => Action::new(robot.id, Command::Wait),
            };
            Choice { intent, action }
        }).collect()
    }
}

/// Lives for the whole match
pub struct Agent {
    params: Params,
    beliefs: Beliefs,
    bluffs: BluffScheduler,
}
impl Agent {
    pub fn new(bounds: Bounds, params: Params) -> Self {
        Self {
            beliefs: Beliefs::new(bounds, &params),
            bluffs: BluffScheduler::new(),
            params,
        }
    }

    /// One action per robot of ours, in the order the robots appear in `world`
    pub fn act(&mut self, previous: &World, world: &World) -> Vec<Action> {
        self.beliefs.update(previous, world, &self.params);

        let bluff_ready = self.bluffs.is_ready(world.tick);
        let choices = {
            let actor = Actor::new(world, &self.beliefs, &self.params);
            if tracing::enabled!(tracing::Level::TRACE) {
                trace!("hazards:\n{}", view::format_hazards(world, &self.beliefs, &actor.view().explosions));
            }
            actor.choose(bluff_ready)
        };

        if choices.iter().any(|choice| matches!(choice.intent.kind, IntentKind::Bluff { .. })) {
            self.bluffs.bluffed(world.tick, self.params.bluff_interval);
        }

        info!(
            tick = world.tick,
            score = world.teams[ME].score,
            enemy_score = world.teams[ENEMY].score,
            visible_ore = world.visible_ore(),
            remaining = MAX_TICKS.saturating_sub(world.tick),
            "turn"
        );
        for enemy in world.live_robots(EntityKind::EnemyRobot) {
            if let Some(belief) = self.beliefs.robot(enemy.id) {
                debug!(enemy = enemy.id, carrying_belief = belief.carrying_belief(), "enemy");
            }
        }
        for choice in choices.iter() {
            info!(robot = choice.action.robot_id, value = choice.intent.value, "{}", choice.intent);
        }

        let mut by_robot: FxHashMap<u32, Action> =
            choices.into_iter()
            .map(|choice| (choice.action.robot_id, choice.action))
            .collect();

        world.entities_of(EntityKind::OwnRobot)
            .map(|robot| by_robot.remove(&robot.id).unwrap_or_else(|| Action::new(robot.id, Command::Wait)))
            .collect()
    }
}
