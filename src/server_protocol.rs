use serde::Serialize;
use serde_json::Value;

use crate::config::SimulationConfig;
use crate::types::{Direction, GameSummary, MapView, Snapshot};

#[derive(Debug)]
pub enum ParsedClientMessage {
    Start { map: Option<usize>, seed: Option<u64> },
    Input { dir: Direction },
    Ping { t: f64 },
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        map: MapView,
        config: SimulationConfig,
    },
    State {
        snapshot: Snapshot,
    },
    GameOver {
        summary: GameSummary,
    },
    Pong {
        t: f64,
    },
    Error {
        message: String,
    },
}

pub fn parse_client_message(raw: &str) -> Option<ParsedClientMessage> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;
    let message_type = object.get("type")?.as_str()?;

    match message_type {
        "start" => {
            let map = match object.get("map") {
                None => None,
                Some(value) => Some(usize::try_from(value.as_u64()?).ok()?),
            };
            let seed = match object.get("seed") {
                None => None,
                Some(value) => Some(value.as_u64()?),
            };
            Some(ParsedClientMessage::Start { map, seed })
        }
        "input" => {
            let dir = Direction::parse_move(object.get("dir")?.as_str()?)?;
            Some(ParsedClientMessage::Input { dir })
        }
        "ping" => {
            let t = object.get("t")?.as_f64()?;
            if !t.is_finite() {
                return None;
            }
            Some(ParsedClientMessage::Ping { t })
        }
        _ => None,
    }
}
