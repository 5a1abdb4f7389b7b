use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Tuning knobs for the heuristics. Every field has a built-in default so a params file only needs the overrides.
#[derive(Clone,Debug,Deserialize,PartialEq)]
#[serde(default)]
pub struct Params {
    /// Payoffs are multiplied by this once per tick of delay
    pub discount_rate: f32,

    /// Extra path cost for stepping into a cell that could explode this tick
    pub explosion_cost: i32,

    pub ore_start_x: i32,
    pub ore_before_start_x_prior_belief: f32,
    pub ore_margin: i32,
    pub ore_margin_prior_belief: f32,

    pub ore_neighbour_range: i32,
    pub ore_neighbour_belief: f32,
    pub enemy_ore_neighbour_belief: f32,

    pub enemy_dig_trap_belief: f32,
    pub still_enemy_trap_belief: f32,
    pub potential_dig_carrying_decay: f32,

    pub minimum_visible_ore_per_robot: f32,
    pub maximum_visible_ore: u32,
    pub maximum_radar_coverage: f32,
    pub radar_request_weight: f32,
    pub radar_placement_weight: f32,
    pub radar_coverage_weight: f32,

    pub maximum_traps: usize,
    pub trap_request_weight: f32,
    pub trap_placement_weight: f32,
    pub trap_placement_range: i32,

    /// Ore probability is raised to this power so only confident cells are worth much
    pub ore_payoff_power: i32,

    pub return_next_ore_weight: f32,
    pub return_straight_weight: f32,

    pub seal_weight: f32,

    pub unsquirrel_tick: u32,
    pub min_squirrel_x: i32,
    pub max_squirrel_ore: u32,
    pub squirrel_weight: f32,

    pub bluff_interval: u32,
    pub bluff_weight: f32,

    /// Sacrifice one robot to the explosion map when we have robots to spare
    pub use_bait: bool,
}
impl Default for Params {
    fn default() -> Self {
        Self {
            discount_rate: 0.95,
            explosion_cost: 100,

            ore_start_x: 4,
            ore_before_start_x_prior_belief: -1.0,
            ore_margin: 1,
            ore_margin_prior_belief: -1.0,

            ore_neighbour_range: 2,
            ore_neighbour_belief: 0.5,
            enemy_ore_neighbour_belief: 0.25,

            enemy_dig_trap_belief: 1.0,
            still_enemy_trap_belief: 0.5,
            potential_dig_carrying_decay: 0.1,

            minimum_visible_ore_per_robot: 1.0,
            maximum_visible_ore: 100,
            maximum_radar_coverage: 0.9,
            radar_request_weight: 10.0,
            radar_placement_weight: 3.0,
            radar_coverage_weight: 1.0,

            maximum_traps: 0,
            trap_request_weight: 0.5,
            trap_placement_weight: 1.0,
            trap_placement_range: 5,

            ore_payoff_power: 8,

            return_next_ore_weight: 1.0,
            return_straight_weight: 0.5,

            seal_weight: 1.0,

            unsquirrel_tick: 150,
            min_squirrel_x: 8,
            max_squirrel_ore: 2,
            squirrel_weight: 1.0,

            bluff_interval: 5,
            bluff_weight: 0.05,

            use_bait: true,
        }
    }
}
impl Params {
    pub fn from_json(json: &str) -> Result<Self> {
        let params = serde_json::from_str(json).context("invalid params json")?;
        Ok(params)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read params from {}", path.display()))?;
        Self::from_json(&json)
    }
}
