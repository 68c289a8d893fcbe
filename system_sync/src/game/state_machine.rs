//! Turn state machine for a single match.
//!
//! A turn moves through TurnStart -> AwaitingDiscard -> AwaitingMoreSequences
//! -> TurnEnd. Every public operation validates completely before mutating,
//! so a rejected call leaves the match exactly as it was.

use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::{collections::VecDeque, fmt};
use thiserror::Error;

use super::{
    constants::{
        DECK_SIZE, MANDATORY_DRAW, MAX_PLAYERS, STANDARD_HAND_SIZE,
        STANDARD_SEQUENCES_TO_WIN, SUDDEN_DEATH_HAND_SIZE, SUDDEN_DEATH_SEQUENCES_TO_WIN,
        TOP_UP_TARGET, TOPPED_UP_DRAW_COUNT,
    },
    effects::{Effect, SpecialEffect},
    entities::{Card, CardId, Deck, Meld, PlayerSlot, Rank, Slot},
    functional,
};

/// Rule violations. None of them mutate the match.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum UserError {
    #[error("no game in progress")]
    NoGameInProgress,
    #[error("not your turn")]
    NotYourTurn,
    #[error("player is blocked this round")]
    PlayerBlocked,
    #[error("no card at hand index {0}")]
    InvalidCardIndex(usize),
    #[error("already discarded this turn")]
    AlreadyDiscarded,
    #[error("you must discard one card before ending your turn")]
    MustDiscardFirst,
    #[error("cards do not form a valid sequence")]
    InvalidSequence,
    #[error("not authorized to reorder")]
    NotAuthorized,
    #[error("already drawn (top-up) this turn")]
    AlreadyToppedUp,
    #[error("{rank} cannot be played with these options")]
    InvalidPlayOptions { rank: Rank },
}

impl UserError {
    /// Stable machine-readable code sent alongside the reason.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoGameInProgress => "NoGameInProgress",
            Self::NotYourTurn => "NotYourTurn",
            Self::PlayerBlocked => "PlayerBlocked",
            Self::InvalidCardIndex(_) => "InvalidCardIndex",
            Self::AlreadyDiscarded => "AlreadyDiscarded",
            Self::MustDiscardFirst => "MustDiscardFirst",
            Self::InvalidSequence => "InvalidSequence",
            Self::NotAuthorized => "NotAuthorized",
            Self::AlreadyToppedUp => "AlreadyToppedUp",
            Self::InvalidPlayOptions { .. } => "InvalidPlayOptions",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameMode {
    #[default]
    Standard,
    SuddenDeath,
}

impl GameMode {
    pub fn starting_hand_size(self) -> usize {
        match self {
            Self::Standard => STANDARD_HAND_SIZE,
            Self::SuddenDeath => SUDDEN_DEATH_HAND_SIZE,
        }
    }

    pub fn sequences_to_win(self) -> usize {
        match self {
            Self::Standard => STANDARD_SEQUENCES_TO_WIN,
            Self::SuddenDeath => SUDDEN_DEATH_SEQUENCES_TO_WIN,
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Standard => "standard",
            Self::SuddenDeath => "sudden-death",
        };
        write!(f, "{repr}")
    }
}

/// Extra instructions that may accompany a played card.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum PlayOptions {
    #[default]
    None,
    /// Queen only. Reorders the revealed cards immediately.
    #[serde(rename = "reorder")]
    QueenReorder { new_top_order: Vec<CardId> },
    /// Joker only. `None` targets the opponent's last sequence.
    #[serde(rename = "delete")]
    JokerDelete {
        #[serde(default)]
        seq_index: Option<usize>,
    },
}

/// Per-turn bookkeeping, reset on every turn transition.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnContext {
    pub drawn_this_turn_count: u8,
    pub discarded_this_turn_for: Option<Slot>,
    /// Seat allowed to reorder the top of the deck after a Queen.
    pub pending_reorder_by: Option<Slot>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TurnPhase {
    AwaitingDiscard,
    AwaitingMoreSequences,
    Finished { winner: Slot },
}

/// Things that happened while applying an action, drained by the owner of the
/// match to notify players.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MatchEvent {
    TurnStarted {
        player_index: Slot,
        drawn: usize,
    },
    CardsDrawn {
        player_index: Slot,
        count: usize,
        new_hand_size: usize,
    },
    ExtraTurnGranted {
        player_index: Slot,
        remaining: u32,
    },
    /// Private to `player_index`.
    PeekTop {
        player_index: Slot,
        top3: Vec<Card>,
    },
    CardsStolen {
        player_index: Slot,
        victim: Slot,
        card_ids: Vec<CardId>,
    },
    SequenceLaid {
        player_index: Slot,
    },
    SequenceDeleted {
        player_index: Slot,
        seq_index: usize,
    },
    GameOver {
        winner: Slot,
    },
}

impl fmt::Display for MatchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::TurnStarted {
                player_index,
                drawn,
            } => format!("seat {player_index} starts a turn, drew {drawn}"),
            Self::CardsDrawn {
                player_index,
                count,
                new_hand_size,
            } => format!("seat {player_index} drew {count} ({new_hand_size} in hand)"),
            Self::ExtraTurnGranted {
                player_index,
                remaining,
            } => format!("seat {player_index} has {remaining} extra turn(s)"),
            Self::PeekTop { player_index, top3 } => {
                format!("seat {player_index} peeked at {} card(s)", top3.len())
            }
            Self::CardsStolen {
                player_index,
                victim,
                card_ids,
            } => format!(
                "seat {player_index} stole {} card(s) from seat {victim}",
                card_ids.len()
            ),
            Self::SequenceLaid { player_index } => format!("seat {player_index} laid a sequence"),
            Self::SequenceDeleted {
                player_index,
                seq_index,
            } => format!("seat {player_index} lost sequence {seq_index}"),
            Self::GameOver { winner } => format!("seat {winner} wins"),
        };
        write!(f, "{repr}")
    }
}

/// The other seat of a two-player match.
pub fn opponent(slot: Slot) -> Slot {
    1 - slot
}

/// One authoritative match between two seats.
#[derive(Clone, Debug)]
pub struct Match {
    pub(super) players: [PlayerSlot; MAX_PLAYERS],
    pub(super) main_deck: Deck,
    pub(super) discard_pile: Vec<Card>,
    pub(super) current_player: Slot,
    pub(super) turn: TurnContext,
    pub(super) mode: GameMode,
    pub(super) winner: Option<Slot>,
    pub(super) events: VecDeque<MatchEvent>,
}

impl Match {
    /// Shuffles a fresh deck and deals alternately, then seeds the discard
    /// pile. No turn has started yet.
    pub fn new<R: Rng + ?Sized>(mode: GameMode, rng: &mut R) -> Self {
        let mut deck = Deck::default();
        deck.shuffle(rng);

        let mut players: [PlayerSlot; MAX_PLAYERS] = Default::default();
        for _ in 0..mode.starting_hand_size() {
            for player in &mut players {
                if let Some(card) = deck.deal_card() {
                    player.hand.push(card);
                }
            }
        }
        let discard_pile = deck.deal_card().into_iter().collect();

        Self::from_parts(players, deck, discard_pile, mode)
    }

    /// Deals a match and runs TurnStart for seat 0.
    pub fn start<R: Rng + ?Sized>(mode: GameMode, rng: &mut R) -> Self {
        let mut game = Self::new(mode, rng);
        game.begin_turn(0);
        info!(
            "{mode} match dealt: {} in deck, {} in discard",
            game.main_deck.len(),
            game.discard_pile.len()
        );
        game
    }

    /// Assembles a match from explicit piles with seat 0 to act and no turn
    /// bookkeeping. Useful for setting up exact positions.
    pub fn from_parts(
        players: [PlayerSlot; MAX_PLAYERS],
        main_deck: Deck,
        discard_pile: Vec<Card>,
        mode: GameMode,
    ) -> Self {
        Self {
            players,
            main_deck,
            discard_pile,
            current_player: 0,
            turn: TurnContext::default(),
            mode,
            winner: None,
            events: VecDeque::new(),
        }
    }

    pub fn players(&self) -> &[PlayerSlot; MAX_PLAYERS] {
        &self.players
    }

    pub fn main_deck(&self) -> &[Card] {
        self.main_deck.cards()
    }

    pub fn discard_pile(&self) -> &[Card] {
        &self.discard_pile
    }

    pub fn current_player(&self) -> Slot {
        self.current_player
    }

    pub fn turn(&self) -> &TurnContext {
        &self.turn
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn sequences_to_win(&self) -> usize {
        self.mode.sequences_to_win()
    }

    pub fn winner(&self) -> Option<Slot> {
        self.winner
    }

    pub fn is_finished(&self) -> bool {
        self.winner.is_some()
    }

    pub fn phase(&self) -> TurnPhase {
        match self.winner {
            Some(winner) => TurnPhase::Finished { winner },
            None if self.turn.discarded_this_turn_for == Some(self.current_player) => {
                TurnPhase::AwaitingMoreSequences
            }
            None => TurnPhase::AwaitingDiscard,
        }
    }

    /// Every card the match owns, wherever it currently lies.
    pub fn total_cards(&self) -> usize {
        self.main_deck.len()
            + self.discard_pile.len()
            + self.players.iter().map(PlayerSlot::card_count).sum::<usize>()
    }

    pub fn is_conserved(&self) -> bool {
        self.total_cards() == DECK_SIZE
    }

    pub fn drain_events(&mut self) -> VecDeque<MatchEvent> {
        std::mem::take(&mut self.events)
    }

    /// TurnStart: reset turn bookkeeping, force the mandatory draw and top
    /// up to four.
    pub fn begin_turn(&mut self, slot: Slot) {
        self.current_player = slot;
        self.turn = TurnContext::default();
        let mut drawn = self.draw_to_hand(slot, MANDATORY_DRAW);
        drawn += self.top_up(slot);
        self.turn.drawn_this_turn_count = 1;
        debug!("seat {slot} turn start, drew {drawn}");
        self.events.push_back(MatchEvent::TurnStarted {
            player_index: slot,
            drawn,
        });
    }

    /// The current player's single discard for the turn, followed by the
    /// discarded card's effect and a win check.
    pub fn play_card<R: Rng>(
        &mut self,
        slot: Slot,
        hand_index: usize,
        options: PlayOptions,
        rng: &mut R,
    ) -> Result<(), UserError> {
        self.ensure_current(slot)?;
        if self.players[slot].blocked_rounds > 0 {
            return Err(UserError::PlayerBlocked);
        }
        if self.turn.discarded_this_turn_for == Some(slot) {
            return Err(UserError::AlreadyDiscarded);
        }
        let rank = self.players[slot]
            .hand
            .get(hand_index)
            .map(|card| card.rank)
            .ok_or(UserError::InvalidCardIndex(hand_index))?;
        let effect = Effect::from(rank);
        if !effect.accepts(&options) {
            return Err(UserError::InvalidPlayOptions { rank });
        }

        let card = self.players[slot].hand.remove(hand_index);
        debug!("seat {slot} discards {} ({})", card.id, effect.name());
        self.discard_pile.push(card);
        self.turn.discarded_this_turn_for = Some(slot);
        effect.resolve(self, slot, &options, rng);
        self.check_win();
        Ok(())
    }

    /// TurnEnd: consume an extra turn if one is held, otherwise pass to the
    /// opponent unless they are blocked.
    pub fn end_turn(&mut self, slot: Slot) -> Result<(), UserError> {
        self.ensure_current(slot)?;
        if self.turn.discarded_this_turn_for != Some(slot) {
            return Err(UserError::MustDiscardFirst);
        }

        if self.players[slot].extra_turns > 0 {
            self.players[slot].extra_turns -= 1;
            self.begin_turn(slot);
            return Ok(());
        }

        let mut next = opponent(slot);
        if self.players[next].blocked_rounds > 0 {
            self.players[next].blocked_rounds -= 1;
            debug!("seat {next} is blocked, skipped");
            next = opponent(next);
        }
        self.begin_turn(next);
        Ok(())
    }

    /// Lays three hand cards as one meld after the turn's discard.
    pub fn lay_sequence(&mut self, slot: Slot, hand_indices: &[usize]) -> Result<(), UserError> {
        self.ensure_current(slot)?;
        if self.turn.discarded_this_turn_for != Some(slot) {
            return Err(UserError::MustDiscardFirst);
        }
        let hand = &mut self.players[slot].hand;
        let &[a, b, c] = hand_indices else {
            return Err(UserError::InvalidSequence);
        };
        if !functional::can_lay_sequence(hand, hand_indices) {
            return Err(UserError::InvalidSequence);
        }

        // The meld keeps hand order, whatever order the indices arrived in.
        let mut ascending = [a, b, c];
        ascending.sort_unstable();
        let meld: Meld = ascending.map(|idx| hand[idx].clone());
        for idx in ascending.into_iter().rev() {
            hand.remove(idx);
        }
        self.players[slot].sequences.push(meld);
        self.events
            .push_back(MatchEvent::SequenceLaid { player_index: slot });
        self.check_win();
        Ok(())
    }

    /// Applies a Queen's deferred reorder. Only the seat holding the pending
    /// authorization may call this, once.
    pub fn reorder_top(&mut self, slot: Slot, new_order: &[CardId]) -> Result<(), UserError> {
        if self.is_finished() {
            return Err(UserError::NoGameInProgress);
        }
        if self.turn.pending_reorder_by != Some(slot) {
            return Err(UserError::NotAuthorized);
        }
        self.main_deck.reorder_top(new_order);
        self.turn.pending_reorder_by = None;
        Ok(())
    }

    /// Sorts the seat's hand for display. Allowed out of turn.
    pub fn sort_hand(&mut self, slot: Slot) -> Result<(), UserError> {
        if self.is_finished() {
            return Err(UserError::NoGameInProgress);
        }
        let player = self
            .players
            .get_mut(slot)
            .ok_or(UserError::NotYourTurn)?;
        functional::sort_hand(&mut player.hand);
        Ok(())
    }

    /// Legacy explicit top-up, usable once per turn. TurnStart already tops
    /// up, so this normally draws nothing.
    pub fn draw_up_to_four(&mut self, slot: Slot) -> Result<usize, UserError> {
        self.ensure_current(slot)?;
        if self.turn.drawn_this_turn_count >= TOPPED_UP_DRAW_COUNT {
            return Err(UserError::AlreadyToppedUp);
        }
        let drawn = self.top_up(slot);
        self.turn.drawn_this_turn_count = TOPPED_UP_DRAW_COUNT;
        if drawn > 0 {
            self.events.push_back(MatchEvent::CardsDrawn {
                player_index: slot,
                count: drawn,
                new_hand_size: self.players[slot].hand.len(),
            });
        }
        Ok(drawn)
    }

    /// Drops a pending reorder held by `slot`, e.g. when its connection leaves.
    pub fn revoke_reorder(&mut self, slot: Slot) {
        if self.turn.pending_reorder_by == Some(slot) {
            self.turn.pending_reorder_by = None;
        }
    }

    fn ensure_current(&self, slot: Slot) -> Result<(), UserError> {
        if self.is_finished() {
            return Err(UserError::NoGameInProgress);
        }
        if slot != self.current_player {
            return Err(UserError::NotYourTurn);
        }
        Ok(())
    }

    /// Moves up to `count` cards from the deck to the seat's hand. Stops
    /// silently when the deck runs out.
    pub(super) fn draw_to_hand(&mut self, slot: Slot, count: usize) -> usize {
        let mut drawn = 0;
        while drawn < count {
            let Some(card) = self.main_deck.deal_card() else {
                break;
            };
            self.players[slot].hand.push(card);
            drawn += 1;
        }
        drawn
    }

    fn top_up(&mut self, slot: Slot) -> usize {
        let missing = TOP_UP_TARGET.saturating_sub(self.players[slot].hand.len());
        self.draw_to_hand(slot, missing)
    }

    fn check_win(&mut self) {
        if self.winner.is_some() {
            return;
        }
        if let Some(winner) = functional::find_winner(&self.players, self.sequences_to_win()) {
            info!("seat {winner} reached {} sequence(s)", self.sequences_to_win());
            self.winner = Some(winner);
            self.events.push_back(MatchEvent::GameOver { winner });
        }
    }
}
