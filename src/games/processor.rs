use crate::errors::{FairError, FairResult};
use crate::games::types::{
    BetSelection, GameOutcome, GameResult, Outcome, PlayRequest, SlotSymbol,
};
use crate::sequencer::SessionSequencer;
use std::sync::Arc;

/// Coin flip pays 1.95x on a correct call
pub const COINFLIP_MULTIPLIER: f64 = 1.95;

/// Dice multiplier is `DICE_RTP_NUMERATOR / win_chance`, capped
pub const DICE_RTP_NUMERATOR: f64 = 98.0;
pub const DICE_MAX_MULTIPLIER: f64 = 9.9;

/// Pair of matching reels pays half the symbol's multiplier
pub const SLOTS_PAIR_FACTOR: f64 = 0.5;

/// Turns a wager into a recorded outcome and applies the game's payout rule
pub struct GameProcessor {
    sequencer: Arc<SessionSequencer>,
}

impl GameProcessor {
    pub fn new(sequencer: Arc<SessionSequencer>) -> Self {
        Self { sequencer }
    }

    /// Validate, draw the outcome through the sequencer, and settle
    pub fn play(&self, request: PlayRequest) -> FairResult<GameResult> {
        validate_request(&request)?;

        let record = self.sequencer.place_bet(request.selection.kind())?;
        let (outcome, payout_amount) =
            settle(&request.selection, &record.interpreted_outcome, request.bet_amount)?;

        Ok(GameResult {
            player_id: request.player_id,
            selection: request.selection,
            bet_amount: request.bet_amount,
            outcome,
            payout_amount,
            record,
        })
    }
}

fn validate_request(request: &PlayRequest) -> FairResult<()> {
    if request.player_id.trim().is_empty() {
        return Err(FairError::invalid("player_id must not be empty"));
    }
    if !request.bet_amount.is_finite() || request.bet_amount <= 0.0 {
        return Err(FairError::invalid(format!(
            "bet amount {} must be a positive number",
            request.bet_amount
        )));
    }
    if let BetSelection::DiceRoll { target, over } = request.selection {
        // Win chance must be at least 1%
        let allowed = if over { 1..=99 } else { 2..=100 };
        if !allowed.contains(&target) {
            return Err(FairError::invalid(format!(
                "dice target {} out of range for roll-{}",
                target,
                if over { "over" } else { "under" }
            )));
        }
    }
    Ok(())
}

/// Payout rule for one settled round
pub fn settle(
    selection: &BetSelection,
    outcome: &Outcome,
    bet_amount: f64,
) -> FairResult<(GameOutcome, f64)> {
    let multiplier = match (selection, outcome) {
        (BetSelection::CoinFlip { choice }, Outcome::CoinFlip(side)) => {
            if choice == side {
                COINFLIP_MULTIPLIER
            } else {
                0.0
            }
        }
        (BetSelection::DiceRoll { target, over }, Outcome::DiceRoll(roll)) => {
            let won = if *over { roll > target } else { roll < target };
            if won {
                dice_multiplier(*target, *over)
            } else {
                0.0
            }
        }
        (BetSelection::Slots, Outcome::Slots(reels)) => slots_multiplier(reels),
        _ => {
            return Err(FairError::invalid(format!(
                "selection for {} cannot settle a {} outcome",
                selection.kind(),
                outcome.kind()
            )))
        }
    };

    let outcome = if multiplier > 0.0 {
        GameOutcome::Win
    } else {
        GameOutcome::Loss
    };
    Ok((outcome, bet_amount * multiplier))
}

/// Quoted chance is `100 - target` over and `target` under, matching the
/// published paytable
pub fn dice_multiplier(target: u8, over: bool) -> f64 {
    let chance = if over { 100u8.saturating_sub(target) } else { target };
    if chance == 0 {
        return 0.0;
    }
    (DICE_RTP_NUMERATOR / chance as f64).min(DICE_MAX_MULTIPLIER)
}

pub fn slots_multiplier(reels: &[SlotSymbol; 3]) -> f64 {
    let [a, b, c] = reels;
    if a == b && b == c {
        a.multiplier()
    } else if a == b || a == c {
        a.multiplier() * SLOTS_PAIR_FACTOR
    } else if b == c {
        b.multiplier() * SLOTS_PAIR_FACTOR
    } else {
        0.0
    }
}
