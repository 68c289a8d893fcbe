//! Special-card effects, resolved once when a card is discarded.
//!
//! Each rank maps to exactly one [`Effect`] variant so that adding a rank is a
//! compile error until its effect is decided.

use enum_dispatch::enum_dispatch;
use log::debug;
use rand::{Rng, RngCore};

use super::{
    constants::{BOOT_DRAW_COUNT, DECRYPT_PEEK_DEPTH, HACK_STEAL_COUNT},
    entities::{Rank, Slot},
    state_machine::{Match, MatchEvent, PlayOptions, opponent},
};

#[enum_dispatch]
pub trait SpecialEffect {
    /// Name used in logs and events.
    fn name(&self) -> &'static str;

    /// Whether `options` may accompany a card with this effect.
    fn accepts(&self, options: &PlayOptions) -> bool {
        matches!(options, PlayOptions::None)
    }

    /// Applies the effect for `actor`. The played card is already on the
    /// discard pile.
    fn resolve(&self, game: &mut Match, actor: Slot, options: &PlayOptions, rng: &mut dyn RngCore);
}

/// Ace: draw two more cards.
#[derive(Clone, Copy, Debug, Default)]
pub struct Boot;

/// King: one extra turn.
#[derive(Clone, Copy, Debug, Default)]
pub struct Firewall;

/// Queen: peek at the top of the deck and optionally reorder it.
#[derive(Clone, Copy, Debug, Default)]
pub struct Decrypt;

/// Jack: steal from the opponent's hand.
#[derive(Clone, Copy, Debug, Default)]
pub struct Hack;

/// Joker: optionally delete one of the opponent's sequences.
#[derive(Clone, Copy, Debug, Default)]
pub struct Glitch;

/// Number cards.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoEffect;

#[enum_dispatch(SpecialEffect)]
#[derive(Clone, Copy, Debug)]
pub enum Effect {
    Boot,
    Firewall,
    Decrypt,
    Hack,
    Glitch,
    NoEffect,
}

impl From<Rank> for Effect {
    fn from(rank: Rank) -> Self {
        match rank {
            Rank::Ace => Boot.into(),
            Rank::King => Firewall.into(),
            Rank::Queen => Decrypt.into(),
            Rank::Jack => Hack.into(),
            Rank::Joker => Glitch.into(),
            _ => NoEffect.into(),
        }
    }
}

impl SpecialEffect for Boot {
    fn name(&self) -> &'static str {
        "Boot"
    }

    fn resolve(&self, game: &mut Match, actor: Slot, _: &PlayOptions, _: &mut dyn RngCore) {
        let count = game.draw_to_hand(actor, BOOT_DRAW_COUNT);
        let new_hand_size = game.players[actor].hand.len();
        game.events.push_back(MatchEvent::CardsDrawn {
            player_index: actor,
            count,
            new_hand_size,
        });
    }
}

impl SpecialEffect for Firewall {
    fn name(&self) -> &'static str {
        "Firewall"
    }

    fn resolve(&self, game: &mut Match, actor: Slot, _: &PlayOptions, _: &mut dyn RngCore) {
        let player = &mut game.players[actor];
        player.extra_turns += 1;
        let remaining = player.extra_turns;
        game.events.push_back(MatchEvent::ExtraTurnGranted {
            player_index: actor,
            remaining,
        });
    }
}

impl SpecialEffect for Decrypt {
    fn name(&self) -> &'static str {
        "Decrypt"
    }

    fn accepts(&self, options: &PlayOptions) -> bool {
        matches!(
            options,
            PlayOptions::None | PlayOptions::QueenReorder { .. }
        )
    }

    fn resolve(&self, game: &mut Match, actor: Slot, options: &PlayOptions, _: &mut dyn RngCore) {
        if let PlayOptions::QueenReorder { new_top_order } = options {
            game.main_deck.reorder_top(new_top_order);
            game.turn.pending_reorder_by = None;
        } else {
            game.turn.pending_reorder_by = Some(actor);
        }
        let top3 = game.main_deck.top(DECRYPT_PEEK_DEPTH).to_vec();
        game.events.push_back(MatchEvent::PeekTop {
            player_index: actor,
            top3,
        });
    }
}

impl SpecialEffect for Hack {
    fn name(&self) -> &'static str {
        "Hack"
    }

    fn resolve(&self, game: &mut Match, actor: Slot, _: &PlayOptions, rng: &mut dyn RngCore) {
        let victim = opponent(actor);
        let mut card_ids = Vec::with_capacity(HACK_STEAL_COUNT);
        for _ in 0..HACK_STEAL_COUNT {
            let remaining = game.players[victim].hand.len();
            if remaining == 0 {
                break;
            }
            let idx = rng.random_range(0..remaining);
            let card = game.players[victim].hand.remove(idx);
            card_ids.push(card.id.clone());
            game.players[actor].hand.push(card);
        }
        debug!("seat {actor} stole {} card(s) from seat {victim}", card_ids.len());
        if !card_ids.is_empty() {
            game.events.push_back(MatchEvent::CardsStolen {
                player_index: actor,
                victim,
                card_ids,
            });
        }
    }
}

impl SpecialEffect for Glitch {
    fn name(&self) -> &'static str {
        "Glitch"
    }

    fn accepts(&self, options: &PlayOptions) -> bool {
        matches!(options, PlayOptions::None | PlayOptions::JokerDelete { .. })
    }

    fn resolve(&self, game: &mut Match, actor: Slot, options: &PlayOptions, _: &mut dyn RngCore) {
        let PlayOptions::JokerDelete { seq_index } = options else {
            return;
        };
        let victim = opponent(actor);
        let sequences = &mut game.players[victim].sequences;
        let Some(index) = seq_index.or_else(|| sequences.len().checked_sub(1)) else {
            return;
        };
        if index >= sequences.len() {
            debug!("seat {actor} joker delete: no sequence {index} on seat {victim}");
            return;
        }
        let meld = sequences.remove(index);
        game.discard_pile.extend(meld);
        game.events.push_back(MatchEvent::SequenceDeleted {
            player_index: victim,
            seq_index: index,
        });
    }
}

impl SpecialEffect for NoEffect {
    fn name(&self) -> &'static str {
        "None"
    }

    fn resolve(&self, _: &mut Match, _: Slot, _: &PlayOptions, _: &mut dyn RngCore) {}
}
