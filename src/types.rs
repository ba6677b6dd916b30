use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    None,
}

impl Direction {
    /// Enumeration order for neighbor scans. Callers that keep the first
    /// minimal candidate rely on it as the tie-break.
    pub const NEIGHBOR_ORDER: [Direction; 4] = [
        Direction::Right,
        Direction::Down,
        Direction::Left,
        Direction::Up,
    ];

    pub fn parse_move(value: &str) -> Option<Self> {
        match value {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "none" => Some(Self::None),
            _ => None,
        }
    }

    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
            Self::None => (0, 0),
        }
    }

    pub fn is_none(self) -> bool {
        self == Self::None
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Vec2 {
    pub x: i32,
    pub y: i32,
}

impl Vec2 {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Raw offset with no wrapping or clamping.
    pub fn offset(self, dir: Direction, steps: i32) -> Self {
        let (dx, dy) = dir.delta();
        Self {
            x: self.x + dx * steps,
            y: self.y + dy * steps,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PursuerMode {
    Chase,
    Scatter,
    Frightened,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Personality {
    Direct,
    Ambush,
    Cautious,
    Flanker,
}

impl Personality {
    pub fn label(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Ambush => "ambush",
            Self::Cautious => "cautious",
            Self::Flanker => "flanker",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOverReason {
    Victory,
    Caught,
    Timeout,
}

#[derive(Clone, Debug, Serialize)]
pub struct MapView {
    pub name: String,
    pub width: i32,
    pub height: i32,
    pub rows: Vec<Vec<u8>>,
    #[serde(rename = "wallColor")]
    pub wall_color: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerView {
    pub x: i32,
    pub y: i32,
    pub dir: Direction,
    pub intended: Direction,
    pub lives: u32,
    pub score: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct PursuerView {
    pub id: String,
    pub personality: Personality,
    pub x: i32,
    pub y: i32,
    pub dir: Direction,
    pub mode: PursuerMode,
    pub target: Vec2,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    PelletEaten {
        x: i32,
        y: i32,
    },
    PowerPelletEaten {
        x: i32,
        y: i32,
    },
    FrightenedStarted {
        units: u32,
    },
    FrightenedEnded {
        #[serde(rename = "resumedMode")]
        resumed_mode: PursuerMode,
    },
    ModeChanged {
        mode: PursuerMode,
    },
    PursuerEaten {
        #[serde(rename = "pursuerId")]
        pursuer_id: String,
        award: u32,
    },
    PlayerCaught {
        #[serde(rename = "pursuerId")]
        pursuer_id: String,
        #[serde(rename = "livesLeft")]
        lives_left: u32,
    },
    RoundWon,
    RoundLost,
    RoundTimedOut,
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    #[serde(rename = "globalMode")]
    pub global_mode: PursuerMode,
    #[serde(rename = "frightenedRemaining")]
    pub frightened_remaining: u32,
    pub player: PlayerView,
    pub pursuers: Vec<PursuerView>,
    #[serde(rename = "remainingCollectibles")]
    pub remaining_collectibles: usize,
    pub events: Vec<RuntimeEvent>,
    pub outcome: Option<GameOverReason>,
}

#[derive(Clone, Debug, Serialize)]
pub struct GameSummary {
    pub reason: GameOverReason,
    pub ticks: u64,
    pub score: u32,
    #[serde(rename = "livesLeft")]
    pub lives_left: u32,
    #[serde(rename = "pursuersEaten")]
    pub pursuers_eaten: u32,
    #[serde(rename = "pelletsEaten")]
    pub pellets_eaten: u32,
}
