use std::cmp::Ordering;

use super::beliefs::Beliefs;
use super::intents::*;
use super::model::*;
use super::params::Params;
use super::pathing::PathMap;
use super::valuation::*;
use super::view::View;

/// Scores every intent a single robot could pursue this tick
pub struct Evaluator<'a> {
    world: &'a World,
    beliefs: &'a Beliefs,
    view: &'a View,
    params: &'a Params,
    bluff_ready: bool,
}
impl<'a> Evaluator<'a> {
    pub fn new(world: &'a World, beliefs: &'a Beliefs, view: &'a View, params: &'a Params, bluff_ready: bool) -> Self {
        Self { world, beliefs, view, params, bluff_ready }
    }

    /// Best first. Always contains at least a Wait.
    pub fn evaluate(&self, robot: &Entity, paths: Option<&PathMap>) -> Vec<Intent> {
        let mut intents = vec![Intent::wait(robot.id)];
        let paths = match paths {
            Some(paths) if !robot.dead => paths,
            _ => return intents,
        };

        if robot.carrying == Some(Item::Ore) && !robot.pos.is_home() {
            intents.extend(self.evaluate_returns(robot, paths));
            if self.view.squirrelling {
                intents.extend(self.evaluate_squirrels(robot, paths));
            }
        } else {
            intents.extend(self.evaluate_radar_request(robot, paths));
            intents.extend(self.evaluate_trap_request(robot));
            intents.extend(self.evaluate_bluff(robot, paths));
            intents.extend(self.evaluate_digs(robot, paths));
        }

        // Stable, so Wait stays ahead of anything else that is worth nothing
        intents.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(Ordering::Equal));
        intents
    }

    fn ticks(&self, paths: &PathMap, target: Pos) -> f32 {
        paths.cost(target) as f32
    }

    fn home_rows(&self) -> impl Iterator<Item=Pos> {
        (0..self.world.bounds.height).map(|y| Pos::new(0, y))
    }

    fn evaluate_returns(&self, robot: &Entity, paths: &PathMap) -> Vec<Intent> {
        self.home_rows().map(|target| {
            let straight = ticks_to_travel(Pos::l1(robot.pos, target) - robot.pos.x);
            let ticks = self.ticks(paths, target) + self.params.return_straight_weight * straight;
            let value =
                discount(1.0, ticks, self.params)
                + self.params.return_next_ore_weight * self.view.returns.next_ore_value(target.y);
            Intent::new(robot.id, value, IntentKind::Return { target })
        }).collect()
    }

    fn evaluate_squirrels(&self, robot: &Entity, paths: &PathMap) -> Vec<Intent> {
        self.view.squirrels.locations().iter()
            .filter(|target| target.x >= self.params.min_squirrel_x && target.x <= robot.pos.x)
            .map(|&target| {
                let destination = self.closest_destination(target, paths);
                let value = self.params.squirrel_weight * discount(1.0, self.ticks(paths, destination), self.params);
                Intent::new(robot.id, value, IntentKind::Squirrel { target, destination })
            })
            .collect()
    }

    fn evaluate_radar_request(&self, robot: &Entity, paths: &PathMap) -> Option<Intent> {
        let team = &self.world.teams[ME];
        if team.radar_cooldown > 0 { return None }
        if robot.carrying.is_some() { return None }
        if self.view.visible_ore >= self.params.maximum_visible_ore { return None }
        if self.view.radars.coverage() >= self.params.maximum_radar_coverage { return None }

        let ore_per_robot = self.view.visible_ore as f32 / self.view.num_live_robots.max(1) as f32;
        if !robot.pos.is_home() && ore_per_robot >= self.params.minimum_visible_ore_per_robot { return None }

        self.home_rows().map(|target| {
            let payoff = self.params.radar_request_weight * self.view.radars.request_payoff(target.y);
            let value = discount(payoff, self.ticks(paths, target), self.params);
            Intent::new(robot.id, value, IntentKind::Request { item: Item::Radar, target })
        }).min_by(|a, b| Intent::compare(a, b).then_with(|| Self::row_distance(robot, a).cmp(&Self::row_distance(robot, b))))
    }

    fn row_distance(robot: &Entity, intent: &Intent) -> i32 {
        match intent.kind {
            IntentKind::Request { target, .. } => (target.y - robot.pos.y).abs(),
            _ => 0,
        }
    }

    fn evaluate_trap_request(&self, robot: &Entity) -> Option<Intent> {
        let team = &self.world.teams[ME];
        if team.trap_cooldown > 0 { return None }
        if !robot.pos.is_home() { return None }
        if robot.carrying.is_some() { return None }
        if self.view.num_traps >= self.params.maximum_traps { return None }

        let value = self.params.trap_request_weight;
        Some(Intent::new(robot.id, value, IntentKind::Request { item: Item::Trap, target: robot.pos }))
    }

    fn evaluate_bluff(&self, robot: &Entity, paths: &PathMap) -> Option<Intent> {
        if !self.bluff_ready { return None }
        if robot.carrying.is_some() { return None }
        if robot.pos.is_home() { return None }

        let target = self.home_rows().min_by_key(|&target| (paths.cost(target), (target.y - robot.pos.y).abs()))?;
        let value = self.params.bluff_weight * discount(1.0, self.ticks(paths, target), self.params);
        Some(Intent::new(robot.id, value, IntentKind::Bluff { target }))
    }

    fn evaluate_digs(&self, robot: &Entity, paths: &PathMap) -> Vec<Intent> {
        self.world.bounds.all()
            .filter(|pos| !pos.is_home())
            .map(|target| self.evaluate_dig(robot, target, paths))
            .collect()
    }

    /// Stand where the dig costs least, counting both getting there and getting home afterwards
    fn closest_destination(&self, target: Pos, paths: &PathMap) -> Pos {
        self.world.bounds.neighbours(target, DIG_RANGE)
            .min_by(|&a, &b| {
                let a_cost = paths.cost(a) as f32 + ticks_to_travel(a.x);
                let b_cost = paths.cost(b) as f32 + ticks_to_travel(b.x);
                a_cost.partial_cmp(&b_cost).unwrap_or(Ordering::Equal)
            })
            .unwrap_or(target)
    }

    fn evaluate_dig(&self, robot: &Entity, target: Pos, paths: &PathMap) -> Intent {
        let payoff = self.view.payoffs.payoff(target);
        let destination = self.closest_destination(target, paths);
        let ticks = self.ticks(paths, destination);

        let mut divisor = 1.0;
        if robot.carrying == Some(Item::Trap) {
            divisor += self.params.trap_placement_weight * self.trap_placement_cost(target);
        }
        if robot.carrying == Some(Item::Radar) {
            divisor += self.params.radar_placement_weight * self.radar_placement_cost(target);
        }

        let mut value = discount(payoff / divisor, ticks, self.params);
        if robot.carrying == Some(Item::Radar) {
            value += discount(self.params.radar_coverage_weight * self.view.radars.coverage_gain(target), ticks, self.params);
        }
        value += self.seal_bonus(robot, target, payoff, ticks);

        let trap_probability = self.beliefs.trap_probability(target);
        if trap_probability > 0.0 {
            value -= trap_probability;
        }

        let capacity = match self.world.cell(target).ore {
            Some(ore) if ore > 0 => ore,
            _ => 1,
        };
        Intent::new(robot.id, value, IntentKind::Dig { target, destination, capacity })
    }

    /// 0 when far from our other radars and the edge of the map, 1 when right on top of them
    fn radar_placement_cost(&self, target: Pos) -> f32 {
        let outside = 2 * RADAR_RANGE + 1;
        let mut closest = outside.min(2 * self.world.bounds.distance_to_edge(target));
        for radar in self.world.entities_of(EntityKind::Radar) {
            closest = closest.min(Pos::l1(radar.pos, target));
        }
        (outside - closest) as f32 / outside as f32
    }

    /// 0 when no enemy is nearby to see where we bury the trap
    fn trap_placement_cost(&self, target: Pos) -> f32 {
        let outside = self.params.trap_placement_range + 1;
        let mut closest = outside;
        for enemy in self.world.live_robots(EntityKind::EnemyRobot) {
            closest = closest.min(Pos::l1(enemy.pos, target));
        }
        (outside - closest) as f32 / outside as f32
    }

    /// The enemy avoids cells it saw us dig while carrying, so the first such dig keeps the remaining ore for us
    fn seal_bonus(&self, robot: &Entity, target: Pos, payoff: f32, ticks: f32) -> f32 {
        match robot.carrying {
            Some(Item::Radar) | Some(Item::Trap) => (),
            _ => return 0.0,
        }

        let cell = self.world.cell(target);
        if cell.hole || self.beliefs.appears_trapped(target) { return 0.0 }
        if self.beliefs.trap_probability(target) > 0.0 { return 0.0 }

        let ore = match cell.ore {
            Some(ore) if ore > 1 => ore,
            _ => return 0.0,
        };

        let round_trip = 2.0 * ticks_to_travel(target.x);
        let mut bonus = 0.0;
        for k in 1..ore {
            bonus += discount(payoff, ticks + k as f32 * round_trip, self.params);
        }
        self.params.seal_weight * bonus
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::model::testing::*;

    struct Fixture {
        params: Params,
        world: World,
        beliefs: Beliefs,
    }
    impl Fixture {
        fn new(world: World) -> Self {
            Self::after(&world.clone(), world)
        }

        fn after(previous: &World, world: World) -> Self {
            let params = Params::default();
            let mut beliefs = Beliefs::new(world.bounds, &params);
            beliefs.update(previous, &world, &params);
            Self { params, world, beliefs }
        }

        fn evaluate(&self, robot_id: u32, bluff_ready: bool) -> Vec<Intent> {
            let view = View::new(&self.world, &self.beliefs, &self.params);
            let robot = self.world.entity(robot_id).unwrap();
            let paths = PathMap::generate(robot.pos, self.world.bounds, &view.explosions, self.params.explosion_cost, false);
            Evaluator::new(&self.world, &self.beliefs, &view, &self.params, bluff_ready).evaluate(robot, Some(&paths))
        }
    }

    #[test]
    fn dead_robots_wait() {
        let mut world = visible_world(10, 5);
        let mut robot = own(0, 0, 2);
        robot.dead = true;
        world.entities.push(robot);
        let fixture = Fixture::new(world);

        let view = View::new(&fixture.world, &fixture.beliefs, &fixture.params);
        let evaluator = Evaluator::new(&fixture.world, &fixture.beliefs, &view, &fixture.params, true);
        let intents = evaluator.evaluate(&fixture.world.entities[0], None);
        assert_eq!(intents, vec![Intent::wait(0)]);
    }

    #[test]
    fn known_ore_is_the_best_dig() {
        let mut world = visible_world(10, 5);
        set_ore(&mut world, Pos::new(3, 2), Some(1));
        world.entities.push(own(0, 0, 2));
        let intents = Fixture::new(world).evaluate(0, false);

        assert_eq!(intents[0].dig_target(), Some(Pos::new(3, 2)));
        assert_eq!(intents[0].destination(), Some(Pos::new(2, 2)));
    }

    #[test]
    fn carrying_ore_means_returning() {
        let mut world = visible_world(10, 5);
        world.entities.push(robot(0, EntityKind::OwnRobot, 6, 3, Some(Item::Ore)));
        let intents = Fixture::new(world).evaluate(0, true);

        assert!(intents.iter().all(|intent| matches!(intent.kind, IntentKind::Return { .. } | IntentKind::Wait)));
        assert_eq!(intents[0].kind, IntentKind::Return { target: Pos::new(0, 3) });
    }

    #[test]
    fn radar_requested_when_nothing_is_visible() {
        let mut world = World::new(Bounds::new(30, 15));
        world.entities.push(own(0, 0, 7));
        let intents = Fixture::new(world).evaluate(0, false);
        assert!(matches!(intents[0].kind, IntentKind::Request { item: Item::Radar, .. }), "{:?}", intents[0]);
    }

    #[test]
    fn radar_not_requested_during_cooldown() {
        let mut world = World::new(Bounds::new(30, 15));
        world.teams[ME].radar_cooldown = 3;
        world.entities.push(own(0, 0, 7));
        let intents = Fixture::new(world).evaluate(0, false);
        assert!(intents.iter().all(|intent| !matches!(intent.kind, IntentKind::Request { item: Item::Radar, .. })));
    }

    #[test]
    fn traps_only_when_allowed() {
        let mut world = visible_world(10, 5);
        world.entities.push(own(0, 0, 2));
        let mut fixture = Fixture::new(world);
        fn has_trap(intents: &[Intent]) -> bool {
            intents.iter().any(|intent| matches!(intent.kind, IntentKind::Request { item: Item::Trap, .. }))
        }

        assert!(!has_trap(&fixture.evaluate(0, false)));

        fixture.params.maximum_traps = 1;
        assert!(has_trap(&fixture.evaluate(0, false)));
    }

    #[test]
    fn bluff_only_when_scheduled() {
        let mut world = visible_world(10, 5);
        world.entities.push(own(0, 5, 2));
        let fixture = Fixture::new(world);
        fn has_bluff(intents: &[Intent]) -> bool {
            intents.iter().any(|intent| matches!(intent.kind, IntentKind::Bluff { .. }))
        }

        assert!(!has_bluff(&fixture.evaluate(0, false)));
        assert!(has_bluff(&fixture.evaluate(0, true)));
    }

    #[test]
    fn carrying_a_radar_favours_sealing_big_deposits() {
        let mut world = visible_world(10, 5);
        set_ore(&mut world, Pos::new(3, 1), Some(3));
        set_ore(&mut world, Pos::new(3, 3), Some(1));
        world.entities.push(robot(0, EntityKind::OwnRobot, 0, 2, Some(Item::Radar)));
        let intents = Fixture::new(world).evaluate(0, false);

        let value_of = |x, y| intents.iter().find(|intent| intent.dig_target() == Some(Pos::new(x, y))).map(|intent| intent.value).unwrap();
        assert!(value_of(3, 1) > value_of(3, 3));
    }

    #[test]
    fn capacity_is_the_visible_ore() {
        let mut world = visible_world(10, 5);
        set_ore(&mut world, Pos::new(3, 1), Some(3));
        set_ore(&mut world, Pos::new(6, 1), None);
        world.entities.push(own(0, 0, 2));
        let intents = Fixture::new(world).evaluate(0, false);

        let capacity_of = |x, y| intents.iter().find_map(|intent| match intent.kind {
            IntentKind::Dig { target, capacity, .. } if target == Pos::new(x, y) => Some(capacity),
            _ => None,
        });
        assert_eq!(capacity_of(3, 1), Some(3));
        assert_eq!(capacity_of(6, 1), Some(1));
        assert_eq!(capacity_of(0, 1), None);
    }

    fn has_radar_request(intents: &[Intent]) -> bool {
        intents.iter().any(|intent| matches!(intent.kind, IntentKind::Request { item: Item::Radar, .. }))
    }

    #[test]
    fn radar_only_requested_away_from_home_when_ore_runs_short() {
        let mut world = visible_world(30, 15);
        set_ore(&mut world, Pos::new(20, 3), Some(2));
        world.entities.push(own(0, 0, 7));
        world.entities.push(own(1, 5, 7));
        let fixture = Fixture::new(world);

        // Two ore between two robots is enough to keep the one in the field busy
        assert!(has_radar_request(&fixture.evaluate(0, false)));
        assert!(!has_radar_request(&fixture.evaluate(1, false)));
    }

    #[test]
    fn radar_not_requested_with_plenty_of_visible_ore() {
        let mut world = visible_world(30, 15);
        set_ore(&mut world, Pos::new(20, 3), Some(2));
        world.entities.push(own(0, 0, 7));
        let mut fixture = Fixture::new(world);
        assert!(has_radar_request(&fixture.evaluate(0, false)));

        fixture.params.maximum_visible_ore = 2;
        assert!(!has_radar_request(&fixture.evaluate(0, false)));
    }

    #[test]
    fn radar_not_requested_once_the_map_is_covered() {
        let mut world = World::new(Bounds::new(30, 15));
        world.entities.push(own(0, 0, 7));
        world.entities.push(robot(20, EntityKind::Radar, 10, 7, None));
        let mut fixture = Fixture::new(world);
        assert!(has_radar_request(&fixture.evaluate(0, false)));

        fixture.params.maximum_radar_coverage = 0.1;
        assert!(!has_radar_request(&fixture.evaluate(0, false)));
    }

    /// A small deposit where robot 1 just buried a radar, so to the enemy it looks trapped. Robot 0 carries ore from `carrier_x`.
    fn squirrel_fixture(location: Pos, carrier_x: i32, tick: u32) -> Fixture {
        let mut previous = visible_world(20, 10);
        previous.tick = tick - 1;
        set_ore(&mut previous, location, Some(2));
        previous.entities.push(robot(0, EntityKind::OwnRobot, carrier_x, 2, Some(Item::Ore)));
        previous.entities.push(robot(1, EntityKind::OwnRobot, location.x, location.y, Some(Item::Radar)));
        previous.actions.push(Action::new(1, Command::Dig { target: location }));

        let mut world = next_tick(&previous);
        set_hole(&mut world, location);
        world.entities[1].carrying = None;
        world.entities.push(robot(20, EntityKind::Radar, location.x, location.y, None));

        let fixture = Fixture::after(&previous, world);
        assert!(fixture.beliefs.appears_trapped(location));
        fixture
    }

    fn squirrels_at(intents: &[Intent]) -> Vec<Pos> {
        intents.iter().filter_map(|intent| match intent.kind {
            IntentKind::Squirrel { target, .. } => Some(target),
            _ => None,
        }).collect()
    }

    #[test]
    fn ore_is_squirrelled_on_the_way_home() {
        let location = Pos::new(10, 5);
        let intents = squirrel_fixture(location, 12, 10).evaluate(0, false);
        assert_eq!(squirrels_at(&intents), vec![location]);
        assert!(intents.iter().any(|intent| matches!(intent.kind, IntentKind::Return { .. })));
    }

    #[test]
    fn squirrels_behind_the_carrier_or_too_close_to_home_are_ignored() {
        let behind = squirrel_fixture(Pos::new(10, 5), 9, 10).evaluate(0, false);
        assert!(squirrels_at(&behind).is_empty());

        let near_home = squirrel_fixture(Pos::new(6, 5), 12, 10).evaluate(0, false);
        assert!(squirrels_at(&near_home).is_empty());
    }

    #[test]
    fn no_squirrelling_late_in_the_game() {
        let params = Params::default();
        let intents = squirrel_fixture(Pos::new(10, 5), 12, params.unsquirrel_tick).evaluate(0, false);
        assert!(squirrels_at(&intents).is_empty());
        assert!(matches!(intents[0].kind, IntentKind::Return { .. }), "{:?}", intents[0]);
    }
}
