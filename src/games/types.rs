use crate::errors::{FairError, FairResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

/// Supported game kinds
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GameKind {
    CoinFlip,
    DiceRoll,
    Slots,
}

impl GameKind {
    pub const ALL: [GameKind; 3] = [GameKind::CoinFlip, GameKind::DiceRoll, GameKind::Slots];

    /// Number of independent hash slices this game consumes
    pub fn draws(&self) -> usize {
        match self {
            GameKind::CoinFlip | GameKind::DiceRoll => 1,
            GameKind::Slots => SLOT_REELS,
        }
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameKind::CoinFlip => write!(f, "coinflip"),
            GameKind::DiceRoll => write!(f, "diceroll"),
            GameKind::Slots => write!(f, "slots"),
        }
    }
}

impl FromStr for GameKind {
    type Err = FairError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "coinflip" => Ok(GameKind::CoinFlip),
            "diceroll" => Ok(GameKind::DiceRoll),
            "slots" => Ok(GameKind::Slots),
            other => Err(FairError::invalid(format!("unsupported game kind '{}'", other))),
        }
    }
}

/// Coin flip result (what the coin landed on)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CoinSide {
    Heads,
    Tails,
}

impl fmt::Display for CoinSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoinSide::Heads => write!(f, "heads"),
            CoinSide::Tails => write!(f, "tails"),
        }
    }
}

pub const SLOT_REELS: usize = 3;

/// Reel symbols, indexed by `draw % 7`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SlotSymbol {
    Cherry,
    Coin,
    Star,
    Gem,
    Diamond,
    Crown,
    Jackpot,
}

impl SlotSymbol {
    pub const TABLE: [SlotSymbol; 7] = [
        SlotSymbol::Cherry,
        SlotSymbol::Coin,
        SlotSymbol::Star,
        SlotSymbol::Gem,
        SlotSymbol::Diamond,
        SlotSymbol::Crown,
        SlotSymbol::Jackpot,
    ];

    pub fn from_index(index: usize) -> Self {
        Self::TABLE[index % Self::TABLE.len()]
    }

    /// Three-of-a-kind payout multiplier
    pub fn multiplier(&self) -> f64 {
        match self {
            SlotSymbol::Cherry => 2.0,
            SlotSymbol::Coin => 3.0,
            SlotSymbol::Star => 5.0,
            SlotSymbol::Gem => 8.0,
            SlotSymbol::Diamond => 15.0,
            SlotSymbol::Crown => 25.0,
            SlotSymbol::Jackpot => 100.0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SlotSymbol::Cherry => "cherry",
            SlotSymbol::Coin => "coin",
            SlotSymbol::Star => "star",
            SlotSymbol::Gem => "gem",
            SlotSymbol::Diamond => "diamond",
            SlotSymbol::Crown => "crown",
            SlotSymbol::Jackpot => "jackpot",
        }
    }
}

impl FromStr for SlotSymbol {
    type Err = FairError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::TABLE
            .iter()
            .copied()
            .find(|symbol| symbol.name() == wanted)
            .ok_or_else(|| FairError::invalid(format!("unknown slot symbol '{}'", s.trim())))
    }
}

/// Game-specific interpretation of the derived hash value
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum Outcome {
    CoinFlip(CoinSide),
    DiceRoll(u8),
    Slots([SlotSymbol; SLOT_REELS]),
}

impl Outcome {
    pub fn kind(&self) -> GameKind {
        match self {
            Outcome::CoinFlip(_) => GameKind::CoinFlip,
            Outcome::DiceRoll(_) => GameKind::DiceRoll,
            Outcome::Slots(_) => GameKind::Slots,
        }
    }

    /// Parse a claimed outcome in its textual form for the given game kind.
    ///
    /// Accepted forms: `heads` / `tails`, an integer `1..=100`, or three
    /// comma-separated symbol names.
    pub fn parse(kind: GameKind, text: &str) -> FairResult<Self> {
        let text = text.trim();
        match kind {
            GameKind::CoinFlip => match text.to_ascii_lowercase().as_str() {
                "heads" => Ok(Outcome::CoinFlip(CoinSide::Heads)),
                "tails" => Ok(Outcome::CoinFlip(CoinSide::Tails)),
                _ => Err(FairError::invalid(format!("'{}' is not heads or tails", text))),
            },
            GameKind::DiceRoll => {
                let roll: u8 = text
                    .parse()
                    .map_err(|_| FairError::invalid(format!("'{}' is not a dice roll", text)))?;
                if !(1..=100).contains(&roll) {
                    return Err(FairError::invalid(format!("dice roll {} outside 1..=100", roll)));
                }
                Ok(Outcome::DiceRoll(roll))
            }
            GameKind::Slots => {
                let symbols = text
                    .split(',')
                    .map(SlotSymbol::from_str)
                    .collect::<FairResult<Vec<_>>>()?;
                let reels: [SlotSymbol; SLOT_REELS] = symbols.try_into().map_err(|_| {
                    FairError::invalid(format!("slots outcome needs {} symbols", SLOT_REELS))
                })?;
                Ok(Outcome::Slots(reels))
            }
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::CoinFlip(side) => write!(f, "{}", side),
            Outcome::DiceRoll(roll) => write!(f, "{}", roll),
            Outcome::Slots([a, b, c]) => write!(f, "{},{},{}", a.name(), b.name(), c.name()),
        }
    }
}

/// Deterministic value derived from the seed triple, before interpretation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawOutput {
    /// Hex-encoded SHA-256 digest of the combined message
    pub digest_hex: String,
    /// Unsigned value of each consumed 8-hex-char slice, in order
    pub draws: Vec<u32>,
}

/// Everything needed to re-derive one wager's outcome after the seed is revealed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutcomeRecord {
    pub id: Uuid,
    pub game_kind: GameKind,
    /// Commitment (hashed value) of the server seed used
    pub server_seed_ref: String,
    pub epoch_index: u64,
    pub client_seed_value: String,
    pub nonce: u64,
    pub raw_output: RawOutput,
    pub interpreted_outcome: Outcome,
    pub created_at: DateTime<Utc>,
}

/// Game outcome from the player's perspective
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GameOutcome {
    Win,
    Loss,
}

/// What the player is betting on
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "game", rename_all = "lowercase")]
pub enum BetSelection {
    CoinFlip { choice: CoinSide },
    /// Roll over or under `target`
    DiceRoll { target: u8, over: bool },
    Slots,
}

impl BetSelection {
    pub fn kind(&self) -> GameKind {
        match self {
            BetSelection::CoinFlip { .. } => GameKind::CoinFlip,
            BetSelection::DiceRoll { .. } => GameKind::DiceRoll,
            BetSelection::Slots => GameKind::Slots,
        }
    }
}

/// Request to play a round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayRequest {
    pub player_id: String,
    pub bet_amount: f64,
    pub selection: BetSelection,
}

/// Settled round: the fairness record plus the payout rule applied to it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameResult {
    pub player_id: String,
    pub selection: BetSelection,
    pub bet_amount: f64,
    pub outcome: GameOutcome,
    pub payout_amount: f64,
    pub record: OutcomeRecord,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_kind_parsing() {
        assert_eq!("coinflip".parse::<GameKind>().unwrap(), GameKind::CoinFlip);
        assert_eq!(" DiceRoll ".parse::<GameKind>().unwrap(), GameKind::DiceRoll);
        assert!(matches!("plinko".parse::<GameKind>(), Err(FairError::InvalidInput(_))));
    }

    #[test]
    fn test_outcome_parse_and_display() {
        let coin = Outcome::parse(GameKind::CoinFlip, "Heads").unwrap();
        assert_eq!(coin, Outcome::CoinFlip(CoinSide::Heads));
        assert_eq!(coin.to_string(), "heads");

        let dice = Outcome::parse(GameKind::DiceRoll, "100").unwrap();
        assert_eq!(dice, Outcome::DiceRoll(100));

        let slots = Outcome::parse(GameKind::Slots, "cherry, jackpot ,gem").unwrap();
        assert_eq!(
            slots,
            Outcome::Slots([SlotSymbol::Cherry, SlotSymbol::Jackpot, SlotSymbol::Gem])
        );
        assert_eq!(slots.to_string(), "cherry,jackpot,gem");
    }

    #[test]
    fn test_outcome_parse_rejects_malformed() {
        assert!(Outcome::parse(GameKind::CoinFlip, "edge").is_err());
        assert!(Outcome::parse(GameKind::DiceRoll, "0").is_err());
        assert!(Outcome::parse(GameKind::DiceRoll, "101").is_err());
        assert!(Outcome::parse(GameKind::DiceRoll, "-4").is_err());
        assert!(Outcome::parse(GameKind::Slots, "cherry,coin").is_err());
        assert!(Outcome::parse(GameKind::Slots, "cherry,coin,lemon").is_err());
    }

    #[test]
    fn test_outcome_json_shape() {
        let json = serde_json::to_value(Outcome::CoinFlip(CoinSide::Tails)).unwrap();
        assert_eq!(json, serde_json::json!("tails"));
        let json = serde_json::to_value(Outcome::DiceRoll(7)).unwrap();
        assert_eq!(json, serde_json::json!(7));
    }

    #[test]
    fn test_bet_selection_kind() {
        let selection: BetSelection =
            serde_json::from_value(serde_json::json!({"game": "diceroll", "target": 50, "over": true}))
                .unwrap();
        assert_eq!(selection.kind(), GameKind::DiceRoll);
    }
}
