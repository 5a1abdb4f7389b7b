use super::beliefs::{Beliefs,Knowledge};
use super::model::*;
use super::params::Params;

pub fn discount(payoff: f32, ticks: f32, params: &Params) -> f32 {
    payoff * params.discount_rate.powf(ticks)
}

pub fn ticks_to_travel(distance: i32) -> f32 {
    distance as f32 / MOVEMENT_SPEED as f32
}

/// Ore we have decided to leave in the ground for now. Cells the enemy believes are trapped and hold little ore.
pub struct SquirrelMap {
    bounds: Bounds,
    locations: Vec<Pos>,
    is_squirrel: Box<[bool]>,
}
impl SquirrelMap {
    pub fn generate(world: &World, beliefs: &Beliefs, params: &Params) -> Self {
        let mut is_squirrel = Vec::new();
        is_squirrel.resize(world.bounds.num_cells(), false);

        let mut locations = Vec::new();
        for pos in world.bounds.all() {
            if !beliefs.appears_trapped(pos) { continue }
            match world.cell(pos).ore {
                Some(ore) if ore <= params.max_squirrel_ore => {
                    is_squirrel[world.bounds.index(pos)] = true;
                    locations.push(pos);
                },
                _ => (),
            }
        }

        Self {
            bounds: world.bounds,
            locations,
            is_squirrel: is_squirrel.into_boxed_slice(),
        }
    }

    pub fn locations(&self) -> &[Pos] {
        &self.locations
    }

    pub fn is_squirrel(&self, pos: Pos) -> bool {
        self.is_squirrel[self.bounds.index(pos)]
    }
}

/// The value of digging each cell, before considering how far away it is
pub struct PayoffMap {
    bounds: Bounds,
    payoffs: Box<[f32]>,
}
impl PayoffMap {
    pub fn generate(world: &World, beliefs: &Beliefs, squirrels: &SquirrelMap, squirrelling: bool, params: &Params) -> Self {
        let payoffs: Vec<f32> = world.bounds.all().map(|pos| {
            if pos.is_home() { return 0.0 }
            if beliefs.trap_probability(pos) > 0.0 { return -1.0 }
            if squirrelling && squirrels.is_squirrel(pos) { return 0.0 }

            let ore = beliefs.ore_probability(pos).powi(params.ore_payoff_power);
            discount(ore, ticks_to_travel(pos.x), params)
        }).collect();

        Self {
            bounds: world.bounds,
            payoffs: payoffs.into_boxed_slice(),
        }
    }

    pub fn payoff(&self, pos: Pos) -> f32 {
        self.payoffs[self.bounds.index(pos)]
    }
}

/// How much a radar would reveal, considering the ore that has not been seen yet
pub struct RadarMap {
    bounds: Bounds,
    payoffs: Box<[f32]>,
    request_payoffs: Box<[f32]>,
    coverage: f32,
}
impl RadarMap {
    pub fn generate(world: &World, beliefs: &Beliefs, params: &Params) -> Self {
        let bounds = world.bounds;

        let mut covered = Vec::new();
        covered.resize(bounds.num_cells(), false);
        for radar in world.entities_of(EntityKind::Radar) {
            for pos in bounds.neighbours(radar.pos, RADAR_RANGE) {
                covered[bounds.index(pos)] = true;
            }
        }

        let payoffs: Vec<f32> = bounds.all().map(|pos| {
            if covered[bounds.index(pos)] { return 0.0 }
            if beliefs.cell(pos).ore_known() != Knowledge::Unknown { return 0.0 }
            beliefs.ore_probability(pos).powi(params.ore_payoff_power)
        }).collect();

        let request_payoffs: Vec<f32> = (0..bounds.height).map(|y| {
            let row: f32 = (0..bounds.width).map(|x| payoffs[bounds.index(Pos::new(x, y))]).sum();
            row / bounds.width as f32
        }).collect();

        let num_covered = covered.iter().filter(|&&covered| covered).count();

        Self {
            bounds,
            payoffs: payoffs.into_boxed_slice(),
            request_payoffs: request_payoffs.into_boxed_slice(),
            coverage: num_covered as f32 / bounds.num_cells() as f32,
        }
    }

    pub fn payoff(&self, pos: Pos) -> f32 {
        self.payoffs[self.bounds.index(pos)]
    }

    /// Demand for a new radar from the headquarters cell in row `y`
    pub fn request_payoff(&self, y: i32) -> f32 {
        self.request_payoffs[y as usize]
    }

    /// Proportion of the map already covered by our radars
    pub fn coverage(&self) -> f32 {
        self.coverage
    }

    /// Mean payoff revealed by a radar placed at `pos`
    pub fn coverage_gain(&self, pos: Pos) -> f32 {
        let mut total = 0.0;
        let mut count = 0;
        for n in self.bounds.neighbours(pos, RADAR_RANGE) {
            total += self.payoff(n);
            count += 1;
        }
        if count == 0 { return 0.0 }
        total / count as f32
    }
}

/// Per headquarters row, the value of the nearest safe known ore, for robots about to return
pub struct ReturnMap {
    next_ore_values: Box<[f32]>,
}
impl ReturnMap {
    pub fn generate(world: &World, beliefs: &Beliefs, squirrels: &SquirrelMap, squirrelling: bool, params: &Params) -> Self {
        let bounds = world.bounds;

        let mut distances: Vec<i32> = (0..bounds.height).map(|y| {
            (1..bounds.width)
                .map(|x| Pos::new(x, y))
                .find(|&pos| {
                    beliefs.ore_probability(pos) >= 1.0
                    && beliefs.trap_probability(pos) <= 0.0
                    && !(squirrelling && squirrels.is_squirrel(pos))
                })
                .map(|pos| pos.x)
                .unwrap_or(bounds.width)
        }).collect();

        // Ore in a nearby row is almost as good as ore in this row
        for y in 0..distances.len() {
            for other in 0..distances.len() {
                let dy = (y as i32 - other as i32).abs();
                distances[y] = distances[y].min(distances[other] + dy);
            }
        }

        let next_ore_values: Vec<f32> = distances.iter().map(|&distance| {
            if distance >= bounds.width {
                0.0
            } else {
                discount(1.0, ticks_to_travel(distance), params)
            }
        }).collect();

        Self {
            next_ore_values: next_ore_values.into_boxed_slice(),
        }
    }

    pub fn next_ore_value(&self, y: i32) -> f32 {
        self.next_ore_values[y as usize]
    }
}
