//! Line commands read by the kiosk driver
//!
//! One command per line. Channels are numbered from 1 within the current
//! scene, the way they are shown by `status`.
//!
//! ```text
//! start | next | prev | scroll | status | reset | quit
//! toggle N
//! drag N begin | drag N move PX | drag N end | drag N cancel
//! volume N V
//! lang CODE
//! ```

use crate::error::{KioskError, Result};
use std::str::FromStr;

/// Phase of a knob drag gesture
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragPhase {
    Begin,
    /// Cumulative translation since the drag began
    Move(f32),
    End,
    Cancel,
}

/// A visitor intent or an operator command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start,
    Next,
    Prev,
    /// Zero-based channel index in the current scene
    Toggle(usize),
    Drag {
        channel: usize,
        phase: DragPhase,
    },
    Volume {
        channel: usize,
        level: u8,
    },
    Scroll,
    Language(String),
    Status,
    Reset,
    Quit,
}

impl FromStr for Command {
    type Err = KioskError;

    fn from_str(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Err(KioskError::Command("empty command".to_string()));
        };
        let args: Vec<&str> = words.collect();

        let command = match (verb.to_ascii_lowercase().as_str(), args.as_slice()) {
            ("start", []) => Command::Start,
            ("next", []) => Command::Next,
            ("prev", []) => Command::Prev,
            ("scroll", []) => Command::Scroll,
            ("status", []) => Command::Status,
            ("reset", []) => Command::Reset,
            ("quit" | "exit", []) => Command::Quit,
            ("toggle", [n]) => Command::Toggle(channel(n)?),
            ("volume", [n, v]) => Command::Volume {
                channel: channel(n)?,
                level: level(v)?,
            },
            ("lang", [code]) => Command::Language(code.to_ascii_lowercase()),
            ("drag", [n, rest @ ..]) => Command::Drag {
                channel: channel(n)?,
                phase: drag_phase(rest)?,
            },
            _ => return Err(KioskError::Command(format!("unrecognized: {line}"))),
        };

        Ok(command)
    }
}

fn channel(arg: &str) -> Result<usize> {
    match arg.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(KioskError::Command(format!(
            "channel must be a number from 1, got {arg:?}"
        ))),
    }
}

fn level(arg: &str) -> Result<u8> {
    match arg.parse::<u8>() {
        Ok(v) if v <= 100 => Ok(v),
        _ => Err(KioskError::Command(format!(
            "volume must be within 0-100, got {arg:?}"
        ))),
    }
}

fn drag_phase(args: &[&str]) -> Result<DragPhase> {
    match args {
        ["begin"] => Ok(DragPhase::Begin),
        ["end"] => Ok(DragPhase::End),
        ["cancel"] => Ok(DragPhase::Cancel),
        ["move", px] => px
            .parse::<f32>()
            .ok()
            .filter(|px| px.is_finite())
            .map(DragPhase::Move)
            .ok_or_else(|| KioskError::Command(format!("invalid translation {px:?}"))),
        _ => Err(KioskError::Command(
            "drag expects begin, move PX, end or cancel".to_string(),
        )),
    }
}
