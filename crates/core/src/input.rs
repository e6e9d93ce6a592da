//! Train descriptor parsing.
//!
//! One descriptor per line: `<direction> <loading> <crossing>`. The direction
//! letter carries the priority in its case (`E`/`W` high, `e`/`w` normal).
//! Durations are non-negative integers in tenths of a time unit.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    error::ParseError,
    train::{Direction, Priority, Train, TrainId},
};

static DESCRIPTOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\S+)\s+(\S+)\s+(\S+)\s*$").expect("descriptor pattern is valid")
});

/// Parse one descriptor line into a train with the given id.
pub fn parse_descriptor(id: TrainId, line_no: usize, line: &str) -> Result<Train, ParseError> {
    let caps = DESCRIPTOR.captures(line).ok_or_else(|| {
        ParseError::new(line_no, "expected `<direction> <loading> <crossing>`")
    })?;

    let (direction, priority) = match &caps[1] {
        "e" => (Direction::East, Priority::Normal),
        "E" => (Direction::East, Priority::High),
        "w" => (Direction::West, Priority::Normal),
        "W" => (Direction::West, Priority::High),
        other => {
            return Err(ParseError::new(
                line_no,
                format!("unknown direction `{other}`"),
            ))
        }
    };
    let loading = parse_duration(line_no, "loading", &caps[2])?;
    let crossing = parse_duration(line_no, "crossing", &caps[3])?;

    Ok(Train::new(id, direction, priority, loading, crossing))
}

fn parse_duration(line_no: usize, field: &str, raw: &str) -> Result<u32, ParseError> {
    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::new(
            line_no,
            format!("{field} time `{raw}` is not a non-negative integer"),
        ));
    }
    raw.parse()
        .map_err(|_| ParseError::new(line_no, format!("{field} time `{raw}` is out of range")))
}

/// Parse every non-blank line of `text`, assigning ids in order of appearance.
pub fn parse_trains(text: &str) -> Result<Vec<Train>, ParseError> {
    let mut trains = Vec::new();
    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        trains.push(parse_descriptor(trains.len(), index + 1, line)?);
    }
    Ok(trains)
}

/// Read and parse a descriptor file.
pub fn load_trains(path: impl AsRef<Path>) -> Result<Vec<Train>> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read train file {}", path.display()))?;
    let trains = parse_trains(&contents)
        .with_context(|| format!("failed to parse train file {}", path.display()))?;
    Ok(trains)
}
