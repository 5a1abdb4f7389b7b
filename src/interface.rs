use std::io::{self,BufRead};
use std::str::SplitWhitespace;

use thiserror::Error;

use super::model::*;

#[derive(Debug,Error)]
pub enum ParseError {
    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("failed to read input")]
    Io(#[from] io::Error),

    #[error("invalid {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("missing {0}")]
    MissingField(&'static str),

    #[error("unknown entity type {0}")]
    UnknownEntityType(i32),

    #[error("unknown item {0}")]
    UnknownItem(i32),
}

macro_rules! parse_input {
    ($fields:expr, $field:literal, $t:ty) => {{
        let value = $fields.next().ok_or(ParseError::MissingField($field))?;
        value.trim().parse::<$t>().map_err(|_| ParseError::InvalidNumber { field: $field, value: value.to_string() })?
    }};
}

fn read_line(input: &mut impl BufRead) -> Result<String, ParseError> {
    let mut line = String::new();
    let num_bytes = input.read_line(&mut line)?;
    if num_bytes == 0 {
        return Err(ParseError::UnexpectedEof);
    }
    Ok(line)
}

pub fn read_initial(input: &mut impl BufRead) -> Result<Bounds, ParseError> {
    let line = read_line(input)?;
    let mut fields = line.split_whitespace();
    let width = parse_input!(fields, "width", i32);
    let height = parse_input!(fields, "height", i32);
    Ok(Bounds::new(width, height))
}

pub fn read_turn(input: &mut impl BufRead, previous: &World) -> Result<World, ParseError> {
    let mut world = World::new(previous.bounds);
    world.tick = previous.tick + 1;

    let line = read_line(input)?;
    let mut fields = line.split_whitespace();
    world.teams[ME].score = parse_input!(fields, "my score", u32);
    world.teams[ENEMY].score = parse_input!(fields, "opponent score", u32);

    for y in 0..world.bounds.height {
        let line = read_line(input)?;
        let mut fields = line.split_whitespace();
        for x in 0..world.bounds.width {
            let index = world.bounds.index(Pos::new(x, y));
            world.cells[index] = read_cell(&mut fields)?;
        }
    }

    let line = read_line(input)?;
    let mut fields = line.split_whitespace();
    let num_entities = parse_input!(fields, "entity count", usize);
    world.teams[ME].radar_cooldown = parse_input!(fields, "radar cooldown", u32);
    world.teams[ME].trap_cooldown = parse_input!(fields, "trap cooldown", u32);

    for _ in 0..num_entities {
        let line = read_line(input)?;
        world.entities.push(read_entity(&line)?);
    }

    Ok(world)
}

fn read_cell(fields: &mut SplitWhitespace) -> Result<Cell, ParseError> {
    let ore = match fields.next() {
        Some("?") => None,
        Some(value) => Some(value.parse::<u32>().map_err(|_| ParseError::InvalidNumber { field: "ore", value: value.to_string() })?),
        None => return Err(ParseError::MissingField("ore")),
    };
    let hole = parse_input!(fields, "hole", i32) != 0;
    Ok(Cell { ore, hole })
}

fn read_entity(line: &str) -> Result<Entity, ParseError> {
    let mut fields = line.split_whitespace();
    let id = parse_input!(fields, "entity id", u32);
    let kind = match parse_input!(fields, "entity type", i32) {
        0 => EntityKind::OwnRobot,
        1 => EntityKind::EnemyRobot,
        2 => EntityKind::Radar,
        3 => EntityKind::Trap,
        other => return Err(ParseError::UnknownEntityType(other)),
    };
    let x = parse_input!(fields, "x", i32);
    let y = parse_input!(fields, "y", i32);
    let carrying = match parse_input!(fields, "item", i32) {
        -1 => None,
        2 => Some(Item::Radar),
        3 => Some(Item::Trap),
        4 => Some(Item::Ore),
        other => return Err(ParseError::UnknownItem(other)),
    };

    Ok(Entity {
        id,
        kind,
        pos: Pos::new(x, y),
        carrying,
        dead: x < 0, // Destroyed robots are reported at -1,-1
    })
}

pub fn format_action(action: &Action) -> String {
    let command = match &action.command {
        Command::Wait => "WAIT".to_string(),
        Command::Move { target } => format!("MOVE {} {}", target.x, target.y),
        Command::Dig { target } => format!("DIG {} {}", target.x, target.y),
        Command::Request { item } => format!("REQUEST {}", item),
    };
    match &action.tag {
        Some(tag) => format!("{} {}", command, tag),
        None => command,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TURN: &str = "\
3 1
? 0 ? 0 2 1
0 1 ? 0 ? 0
4 0 0
0 0 0 1 -1
1 1 2 1 4
2 2 2 0 -1
3 0 -1 -1 -1
";

    #[test]
    fn reads_map_size() {
        let bounds = read_initial(&mut "30 15\n".as_bytes()).unwrap();
        assert_eq!(bounds, Bounds::new(30, 15));
    }

    #[test]
    fn reads_a_turn() {
        let previous = World::new(Bounds::new(3, 2));
        let world = read_turn(&mut TURN.as_bytes(), &previous).unwrap();

        assert_eq!(world.tick, 1);
        assert_eq!(world.teams[ME].score, 3);
        assert_eq!(world.teams[ENEMY].score, 1);
        assert_eq!(world.teams[ME].trap_cooldown, 0);

        assert_eq!(*world.cell(Pos::new(0, 0)), Cell { ore: None, hole: false });
        assert_eq!(*world.cell(Pos::new(2, 0)), Cell { ore: Some(2), hole: true });
        assert_eq!(*world.cell(Pos::new(0, 1)), Cell { ore: Some(0), hole: true });

        assert_eq!(world.entities.len(), 4);
        assert_eq!(world.entities[1].kind, EntityKind::EnemyRobot);
        assert_eq!(world.entities[1].carrying, Some(Item::Ore));
        assert_eq!(world.entities[2].kind, EntityKind::Radar);
        assert!(world.entities[3].dead);
        assert!(!world.entities[0].dead);
    }

    #[test]
    fn end_of_input_is_distinguishable() {
        let previous = World::new(Bounds::new(3, 2));
        assert!(matches!(read_turn(&mut "".as_bytes(), &previous), Err(ParseError::UnexpectedEof)));
    }

    #[test]
    fn bad_input_is_an_error() {
        let previous = World::new(Bounds::new(3, 2));
        let bad = TURN.replace("1 1 2 1 4", "1 7 2 1 4");
        assert!(matches!(read_turn(&mut bad.as_bytes(), &previous), Err(ParseError::UnknownEntityType(7))));

        let bad = TURN.replace("3 1\n", "3 x\n");
        assert!(matches!(read_turn(&mut bad.as_bytes(), &previous), Err(ParseError::InvalidNumber { field: "opponent score", .. })));
    }

    #[test]
    fn formats_actions() {
        assert_eq!(format_action(&Action::new(0, Command::Wait)), "WAIT");
        assert_eq!(format_action(&Action::new(0, Command::Move { target: Pos::new(4, 7) })), "MOVE 4 7");
        assert_eq!(format_action(&Action::new(0, Command::Request { item: Item::Trap })), "REQUEST TRAP");
        assert_eq!(format_action(&Action::tagged(0, Command::Dig { target: Pos::new(3, 2) }, "dig 3,2".to_string())), "DIG 3 2 dig 3,2");
    }
}
