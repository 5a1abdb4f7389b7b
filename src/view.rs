use std::fmt::Write;

use super::beliefs::Beliefs;
use super::explosions::ExplosionMap;
use super::model::*;
use super::params::Params;
use super::valuation::*;

/// Everything derived from the world and our beliefs that stays fixed while the robots choose their actions
pub struct View {
    pub explosions: ExplosionMap,
    pub squirrels: SquirrelMap,
    pub payoffs: PayoffMap,
    pub radars: RadarMap,
    pub returns: ReturnMap,

    /// The robot allowed to ignore danger, if any
    pub bait: Option<u32>,

    pub squirrelling: bool,
    pub visible_ore: u32,
    pub num_live_robots: usize,
    pub num_traps: usize,
}
impl View {
    pub fn new(world: &World, beliefs: &Beliefs, params: &Params) -> Self {
        let squirrelling = world.is_squirrelling(params.unsquirrel_tick);
        let squirrels = SquirrelMap::generate(world, beliefs, params);

        Self {
            explosions: ExplosionMap::generate(world, beliefs),
            payoffs: PayoffMap::generate(world, beliefs, &squirrels, squirrelling, params),
            radars: RadarMap::generate(world, beliefs, params),
            returns: ReturnMap::generate(world, beliefs, &squirrels, squirrelling, params),
            squirrels,

            bait: Self::choose_bait(world, params),

            squirrelling,
            visible_ore: world.visible_ore(),
            num_live_robots: world.live_robots(EntityKind::OwnRobot).count(),
            num_traps: world.entities_of(EntityKind::Trap).count(),
        }
    }

    /// Only worth sacrificing a robot while we outnumber the enemy
    fn choose_bait(world: &World, params: &Params) -> Option<u32> {
        if !params.use_bait { return None }

        let num_own = world.live_robots(EntityKind::OwnRobot).count();
        let num_enemy = world.live_robots(EntityKind::EnemyRobot).count();
        if num_own <= num_enemy { return None }

        world.live_robots(EntityKind::OwnRobot).map(|robot| robot.id).min()
    }
}

/// One character per cell: 'e' enemy, '*' trap inside a blast, 'x' blast, 't' suspected trap
pub fn format_hazards(world: &World, beliefs: &Beliefs, explosions: &ExplosionMap) -> String {
    let mut output = String::new();
    for y in 0..world.bounds.height {
        for x in 0..world.bounds.width {
            let pos = Pos::new(x, y);
            let is_enemy = world.live_robots(EntityKind::EnemyRobot).any(|enemy| enemy.pos == pos);
            let is_trap = beliefs.trap_probability(pos) > 0.0;
            let c = if is_enemy {
                'e'
            } else if is_trap && explosions.is_dangerous(pos) {
                '*'
            } else if explosions.is_dangerous(pos) {
                'x'
            } else if is_trap {
                't'
            } else {
                '.'
            };
            output.push(c);
        }
        let _ = writeln!(output);
    }
    output
}
