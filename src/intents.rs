use std::cmp::Ordering;
use std::fmt::Display;

use super::explosions::ExplosionAvoider;
use super::model::*;
use super::pathing::PathMap;

#[derive(Clone,Debug,PartialEq)]
pub enum IntentKind {
    Wait,
    Request { item: Item, target: Pos },
    Dig { target: Pos, destination: Pos, capacity: u32 },
    Return { target: Pos },
    Squirrel { target: Pos, destination: Pos },
    Bluff { target: Pos },
}

/// Something one robot could do this tick, and how much we would like it to
#[derive(Clone,Debug,PartialEq)]
pub struct Intent {
    pub robot_id: u32,
    pub value: f32,
    pub kind: IntentKind,
}
impl Intent {
    pub fn new(robot_id: u32, value: f32, kind: IntentKind) -> Self {
        Self { robot_id, value, kind }
    }

    pub fn wait(robot_id: u32) -> Self {
        Self::new(robot_id, 0.0, IntentKind::Wait)
    }

    /// Highest value first, then lowest robot id
    pub fn compare(a: &Intent, b: &Intent) -> Ordering {
        b.value.partial_cmp(&a.value).unwrap_or(Ordering::Equal)
            .then_with(|| a.robot_id.cmp(&b.robot_id))
    }

    pub fn dig_target(&self) -> Option<Pos> {
        match self.kind {
            IntentKind::Dig { target, .. } => Some(target),
            _ => None,
        }
    }

    /// Where the robot will stand to carry out this intent, if it has to stand anywhere in particular
    pub fn destination(&self) -> Option<Pos> {
        match self.kind {
            IntentKind::Dig { destination, .. } => Some(destination),
            IntentKind::Squirrel { destination, .. } => Some(destination),
            _ => None,
        }
    }

    /// Two robots should not both do this
    pub fn duplicates(&self, other: &Intent) -> bool {
        match (&self.kind, &other.kind) {
            (IntentKind::Request { item: a, .. }, IntentKind::Request { item: b, .. }) => a == b,
            (IntentKind::Dig { target: a, capacity, .. }, IntentKind::Dig { target: b, .. }) => a == b && *capacity <= 1,
            (IntentKind::Squirrel { target: a, .. }, IntentKind::Squirrel { target: b, .. }) => a == b,
            (IntentKind::Bluff { .. }, IntentKind::Bluff { .. }) => true,
            _ => false,
        }
    }

    pub fn subsumes(&self, other: &Intent) -> bool {
        self.robot_id != other.robot_id
        && self.duplicates(other)
        && Self::compare(self, other) == Ordering::Less
    }

    pub fn realize(&self, robot: &Entity, avoider: &mut ExplosionAvoider, paths: &PathMap) -> Action {
        let robot_id = robot.id;
        match self.kind {
            IntentKind::Wait => Action::new(robot_id, Command::Wait),
            IntentKind::Request { item, target } => {
                if robot.pos.is_home() {
                    Action::new(robot_id, Command::Request { item })
                } else {
                    let step = avoider.claim_path(robot_id, paths, target);
                    Action::tagged(robot_id, Command::Move { target: step }, format!("{}", item))
                }
            },
            IntentKind::Dig { target, .. } | IntentKind::Squirrel { target, .. } => {
                if Pos::l1(robot.pos, target) <= DIG_RANGE {
                    Action::tagged(robot_id, Command::Dig { target }, self.to_string())
                } else {
                    let approach = self.destination().unwrap_or(target);
                    let step = avoider.claim_path(robot_id, paths, approach);
                    Action::tagged(robot_id, Command::Move { target: step }, self.to_string())
                }
            },
            IntentKind::Return { target } => {
                let step = avoider.claim_path(robot_id, paths, target);
                Action::tagged(robot_id, Command::Move { target: step }, self.to_string())
            },
            IntentKind::Bluff { target } => {
                let step = if robot.pos == target { target } else { avoider.claim_path(robot_id, paths, target) };
                Action::tagged(robot_id, Command::Move { target: step }, self.to_string())
            },
        }
    }
}
impl Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            IntentKind::Wait => write!(f, "wait"),
            IntentKind::Request { item, .. } => write!(f, "{}", item),
            IntentKind::Dig { target, .. } => write!(f, "dig {}", target),
            IntentKind::Return { .. } => write!(f, "return"),
            IntentKind::Squirrel { target, .. } => write!(f, "squirrel {}", target),
            IntentKind::Bluff { .. } => write!(f, "bluff"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::explosions::ExplosionMap;
    use super::super::model::testing::*;

    fn dig(robot_id: u32, value: f32, x: i32, y: i32, capacity: u32) -> Intent {
        let target = Pos::new(x, y);
        Intent::new(robot_id, value, IntentKind::Dig { target, destination: target, capacity })
    }

    #[test]
    fn digs_only_clash_on_single_ore() {
        assert!(dig(0, 1.0, 5, 5, 1).duplicates(&dig(1, 1.0, 5, 5, 1)));
        assert!(!dig(0, 1.0, 5, 5, 3).duplicates(&dig(1, 1.0, 5, 5, 3)));
        assert!(!dig(0, 1.0, 5, 5, 1).duplicates(&dig(1, 1.0, 5, 6, 1)));
    }

    #[test]
    fn requests_clash_by_item() {
        let radar = |robot_id| Intent::new(robot_id, 1.0, IntentKind::Request { item: Item::Radar, target: Pos::new(0, 0) });
        let trap = |robot_id| Intent::new(robot_id, 1.0, IntentKind::Request { item: Item::Trap, target: Pos::new(0, 0) });
        assert!(radar(0).duplicates(&radar(1)));
        assert!(!radar(0).duplicates(&trap(1)));
        assert!(!Intent::wait(0).duplicates(&Intent::wait(1)));
    }

    #[test]
    fn ties_go_to_the_lower_id() {
        let a = dig(1, 2.0, 5, 5, 1);
        let b = dig(2, 2.0, 5, 5, 1);
        assert!(a.subsumes(&b));
        assert!(!b.subsumes(&a));

        let c = dig(3, 3.0, 5, 5, 1);
        assert!(c.subsumes(&a));
        assert!(!a.subsumes(&c));
    }

    #[test]
    fn dig_when_in_range_otherwise_move() {
        let bounds = Bounds::new(30, 15);
        let explosions = ExplosionMap::empty(bounds);
        let mut avoider = ExplosionAvoider::new(&explosions);

        let near = own(0, 4, 5);
        let paths = PathMap::generate(near.pos, bounds, &explosions, 100, false);
        let action = dig(0, 1.0, 5, 5, 1).realize(&near, &mut avoider, &paths);
        assert_eq!(action.command, Command::Dig { target: Pos::new(5, 5) });

        let far = own(1, 0, 5);
        let paths = PathMap::generate(far.pos, bounds, &explosions, 100, false);
        let action = dig(1, 1.0, 10, 5, 1).realize(&far, &mut avoider, &paths);
        assert_eq!(action.command, Command::Move { target: Pos::new(4, 5) });
        assert_eq!(action.tag.as_deref(), Some("dig 10,5"));
    }

    #[test]
    fn squirrel_digs_in_range_otherwise_heads_for_its_destination() {
        let bounds = Bounds::new(30, 15);
        let explosions = ExplosionMap::empty(bounds);
        let mut avoider = ExplosionAvoider::new(&explosions);
        let intent = |robot_id| Intent::new(robot_id, 1.0, IntentKind::Squirrel { target: Pos::new(10, 5), destination: Pos::new(9, 5) });

        let near = robot(0, EntityKind::OwnRobot, 11, 5, Some(Item::Ore));
        let paths = PathMap::generate(near.pos, bounds, &explosions, 100, false);
        assert_eq!(intent(0).realize(&near, &mut avoider, &paths).command, Command::Dig { target: Pos::new(10, 5) });

        let far = robot(1, EntityKind::OwnRobot, 14, 5, Some(Item::Ore));
        let paths = PathMap::generate(far.pos, bounds, &explosions, 100, false);
        let action = intent(1).realize(&far, &mut avoider, &paths);
        assert_eq!(action.command, Command::Move { target: Pos::new(10, 5) });
        assert_eq!(action.tag.as_deref(), Some("squirrel 10,5"));
    }

    #[test]
    fn request_only_at_headquarters() {
        let bounds = Bounds::new(30, 15);
        let explosions = ExplosionMap::empty(bounds);
        let mut avoider = ExplosionAvoider::new(&explosions);
        let intent = Intent::new(0, 1.0, IntentKind::Request { item: Item::Radar, target: Pos::new(0, 5) });

        let home = own(0, 0, 5);
        let paths = PathMap::generate(home.pos, bounds, &explosions, 100, false);
        assert_eq!(intent.realize(&home, &mut avoider, &paths).command, Command::Request { item: Item::Radar });

        let away = own(0, 3, 5);
        let paths = PathMap::generate(away.pos, bounds, &explosions, 100, false);
        assert_eq!(intent.realize(&away, &mut avoider, &paths).command, Command::Move { target: Pos::new(0, 5) });
    }
}
