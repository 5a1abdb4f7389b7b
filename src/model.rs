use std::fmt::Display;

pub const MAX_TICKS: u32 = 200;
pub const NUM_TEAMS: usize = 2;
pub const ME: usize = 0;
pub const ENEMY: usize = 1;

pub const DIG_RANGE: i32 = 1;
pub const RADAR_RANGE: i32 = 5;
pub const TRAP_RANGE: i32 = 1;
pub const MOVEMENT_SPEED: i32 = 4;

#[derive(Clone,Copy,Debug,PartialEq,Eq,Hash,PartialOrd,Ord)]
pub struct Pos {
    pub x: i32,
    pub y: i32,
}
impl Pos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn l1(a: Pos, b: Pos) -> i32 {
        (a.x - b.x).abs() + (a.y - b.y).abs()
    }

    pub fn distance(a: Pos, b: Pos) -> f32 {
        let dx = (a.x - b.x) as f32;
        let dy = (a.y - b.y) as f32;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn is_home(&self) -> bool {
        self.x == 0
    }
}
impl Display for Pos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub struct Bounds {
    pub width: i32,
    pub height: i32,
}
impl Bounds {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub fn num_cells(&self) -> usize {
        (self.width * self.height) as usize
    }

    pub fn contains(&self, pos: Pos) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    pub fn index(&self, pos: Pos) -> usize {
        (pos.y * self.width + pos.x) as usize
    }

    pub fn distance_to_edge(&self, pos: Pos) -> i32 {
        pos.x.min(self.width - pos.x - 1).min(pos.y).min(self.height - pos.y - 1)
    }

    /// Row-major, so iteration order is stable between ticks
    pub fn all(&self) -> impl Iterator<Item=Pos> {
        let width = self.width;
        (0..self.height).flat_map(move |y| (0..width).map(move |x| Pos::new(x, y)))
    }

    /// Every in-bounds cell within L1 `range` of `pos`, including `pos` itself
    pub fn neighbours(&self, pos: Pos, range: i32) -> impl Iterator<Item=Pos> {
        let bounds = *self;
        (pos.y - range..=pos.y + range).flat_map(move |y| {
            (pos.x - range..=pos.x + range).map(move |x| Pos::new(x, y))
        }).filter(move |&n| Pos::l1(pos, n) <= range && bounds.contains(n))
    }
}

#[derive(Clone,Copy,Debug,PartialEq,Eq,Hash)]
pub enum Item {
    Radar,
    Trap,
    Ore,
}
impl Display for Item {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Item::Radar => write!(f, "RADAR"),
            Item::Trap => write!(f, "TRAP"),
            Item::Ore => write!(f, "ORE"),
        }
    }
}

#[derive(Clone,Copy,Debug,PartialEq,Eq,Hash)]
pub enum EntityKind {
    OwnRobot,
    EnemyRobot,
    Radar,
    Trap,
}

#[derive(Clone,Debug,PartialEq)]
pub struct Entity {
    pub id: u32,
    pub kind: EntityKind,
    pub pos: Pos,
    pub carrying: Option<Item>,
    pub dead: bool,
}
impl Entity {
    pub fn is_live_robot(&self, kind: EntityKind) -> bool {
        self.kind == kind && !self.dead
    }
}

#[derive(Clone,Copy,Debug,Default,PartialEq)]
pub struct Team {
    pub score: u32,
    pub radar_cooldown: u32,
    pub trap_cooldown: u32,
}

#[derive(Clone,Copy,Debug,Default,PartialEq)]
pub struct Cell {
    /// None while the cell is not covered by one of our radars
    pub ore: Option<u32>,
    pub hole: bool,
}

#[derive(Clone,Debug,PartialEq)]
pub enum Command {
    Wait,
    Move { target: Pos },
    Dig { target: Pos },
    Request { item: Item },
}

#[derive(Clone,Debug,PartialEq)]
pub struct Action {
    pub robot_id: u32,
    pub command: Command,
    pub tag: Option<String>,
}
impl Action {
    pub fn new(robot_id: u32, command: Command) -> Self {
        Self { robot_id, command, tag: None }
    }

    pub fn tagged(robot_id: u32, command: Command, tag: String) -> Self {
        Self { robot_id, command, tag: Some(tag) }
    }
}

#[derive(Clone,Debug)]
pub struct World {
    pub tick: u32,
    pub bounds: Bounds,
    pub teams: [Team; NUM_TEAMS],
    pub cells: Box<[Cell]>,
    pub entities: Vec<Entity>,

    /// The actions we chose on the previous tick, needed to explain what changed since then
    pub actions: Vec<Action>,
}
impl World {
    pub fn new(bounds: Bounds) -> Self {
        let mut cells = Vec::new();
        cells.resize(bounds.num_cells(), Cell::default());
        Self {
            tick: 0,
            bounds,
            teams: [Team::default(); NUM_TEAMS],
            cells: cells.into_boxed_slice(),
            entities: Vec::new(),
            actions: Vec::new(),
        }
    }

    pub fn cell(&self, pos: Pos) -> &Cell {
        &self.cells[self.bounds.index(pos)]
    }

    pub fn entity(&self, id: u32) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    pub fn action(&self, robot_id: u32) -> Option<&Action> {
        self.actions.iter().find(|action| action.robot_id == robot_id)
    }

    pub fn entities_of(&self, kind: EntityKind) -> impl Iterator<Item=&Entity> {
        self.entities.iter().filter(move |entity| entity.kind == kind)
    }

    pub fn live_robots(&self, kind: EntityKind) -> impl Iterator<Item=&Entity> {
        self.entities.iter().filter(move |entity| entity.is_live_robot(kind))
    }

    pub fn visible_ore(&self) -> u32 {
        self.cells.iter().filter_map(|cell| cell.ore).sum()
    }

    pub fn is_squirrelling(&self, unsquirrel_tick: u32) -> bool {
        self.tick < unsquirrel_tick
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;

    /// A world where every cell is visible and empty, so tests only need to place the ore they care about
    pub fn visible_world(width: i32, height: i32) -> World {
        let mut world = World::new(Bounds::new(width, height));
        for cell in world.cells.iter_mut() {
            cell.ore = Some(0);
        }
        world
    }

    pub fn set_ore(world: &mut World, pos: Pos, ore: Option<u32>) {
        let index = world.bounds.index(pos);
        world.cells[index].ore = ore;
    }

    pub fn set_hole(world: &mut World, pos: Pos) {
        let index = world.bounds.index(pos);
        world.cells[index].hole = true;
    }

    pub fn robot(id: u32, kind: EntityKind, x: i32, y: i32, carrying: Option<Item>) -> Entity {
        Entity {
            id,
            kind,
            pos: Pos::new(x, y),
            carrying,
            dead: false,
        }
    }

    pub fn own(id: u32, x: i32, y: i32) -> Entity {
        robot(id, EntityKind::OwnRobot, x, y, None)
    }

    pub fn enemy(id: u32, x: i32, y: i32) -> Entity {
        robot(id, EntityKind::EnemyRobot, x, y, None)
    }

    pub fn trap(id: u32, x: i32, y: i32) -> Entity {
        robot(id, EntityKind::Trap, x, y, None)
    }

    pub fn next_tick(world: &World) -> World {
        let mut next = world.clone();
        next.tick += 1;
        next.actions.clear();
        next
    }
}
