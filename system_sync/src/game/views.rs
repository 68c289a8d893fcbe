//! What each connection is allowed to see of a match.
//!
//! Broadcasts normally carry the whole match. Right after a steal the
//! stolen cards are replaced with placeholders for everyone except the
//! seat that took them.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use super::{
    entities::{Card, CardId, Meld, PlayerSlot, Rank, Slot},
    state_machine::Match,
};

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum HiddenSuit {
    Hidden,
}

/// A hand entry as seen by one viewer.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CardView {
    Known(Card),
    /// Placeholder with a fresh id that means nothing outside this payload.
    Hidden {
        id: String,
        suit: HiddenSuit,
        rank: Option<Rank>,
    },
}

impl CardView {
    pub fn hidden() -> Self {
        Self::Hidden {
            id: format!("HIDDEN-{}", Uuid::new_v4().simple()),
            suit: HiddenSuit::Hidden,
            rank: None,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Known(card) => &card.id,
            Self::Hidden { id, .. } => id,
        }
    }

    pub fn is_hidden(&self) -> bool {
        matches!(self, Self::Hidden { .. })
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub hand: Vec<CardView>,
    pub sequences: Vec<Meld>,
    pub blocked_rounds: u32,
    pub extra_turns: u32,
}

impl PlayerView {
    fn project(player: &PlayerSlot, hidden: Option<&HashSet<CardId>>) -> Self {
        let hand = player
            .hand
            .iter()
            .map(|card| match hidden {
                Some(ids) if ids.contains(&card.id) => CardView::hidden(),
                _ => CardView::Known(card.clone()),
            })
            .collect();
        Self {
            hand,
            sequences: player.sequences.clone(),
            blocked_rounds: player.blocked_rounds,
            extra_turns: player.extra_turns,
        }
    }
}

/// Serializable snapshot of a match for one recipient.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientView {
    pub players: Vec<PlayerView>,
    pub main_deck: Vec<Card>,
    pub discard_pile: Vec<Card>,
    pub current_player: Slot,
}

impl ClientView {
    /// Every hand entry with its face hidden.
    pub fn hidden_ids(&self) -> impl Iterator<Item = &str> {
        self.players
            .iter()
            .flat_map(|p| p.hand.iter())
            .filter(|c| c.is_hidden())
            .map(CardView::id)
    }
}

impl From<&Match> for ClientView {
    fn from(game: &Match) -> Self {
        project(game, None, None)
    }
}

/// Cards in `owner`'s hand that only `owner` may identify.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Concealment {
    pub owner: Slot,
    pub card_ids: HashSet<CardId>,
}

impl Concealment {
    pub fn new(owner: Slot, card_ids: impl IntoIterator<Item = CardId>) -> Self {
        Self {
            owner,
            card_ids: card_ids.into_iter().collect(),
        }
    }

    pub fn reveals_to(&self, viewer: Option<Slot>) -> bool {
        viewer == Some(self.owner)
    }
}

/// Projects the match for `viewer`. Without a concealment, or when the
/// viewer owns it, this is the full match.
pub fn project(game: &Match, viewer: Option<Slot>, concealment: Option<&Concealment>) -> ClientView {
    let masked = concealment.filter(|c| !c.reveals_to(viewer));
    let players = game
        .players()
        .iter()
        .enumerate()
        .map(|(slot, player)| {
            let hidden = masked.filter(|c| c.owner == slot).map(|c| &c.card_ids);
            PlayerView::project(player, hidden)
        })
        .collect();

    ClientView {
        players,
        main_deck: game.main_deck().to_vec(),
        discard_pile: game.discard_pile().to_vec(),
        current_player: game.current_player(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{
        entities::{Deck, Suit},
        state_machine::{GameMode, MatchEvent, PlayOptions},
    };
    use rand::{SeedableRng, rngs::StdRng};

    fn after_steal() -> (Match, Concealment) {
        let victim_hand = vec![
            Card::new(Suit::Hearts, Rank::Two),
            Card::new(Suit::Clubs, Rank::Seven),
            Card::new(Suit::Spades, Rank::Ten),
        ];
        let mut game = Match::from_parts(
            [
                PlayerSlot::with_hand(vec![
                    Card::new(Suit::Diamonds, Rank::Jack),
                    Card::new(Suit::Diamonds, Rank::Four),
                ]),
                PlayerSlot::with_hand(victim_hand),
            ],
            Deck::from_cards(vec![]),
            vec![],
            GameMode::Standard,
        );
        game.play_card(0, 0, PlayOptions::None, &mut StdRng::seed_from_u64(3))
            .unwrap();
        let concealment = game
            .drain_events()
            .into_iter()
            .find_map(|event| match event {
                MatchEvent::CardsStolen {
                    player_index,
                    card_ids,
                    ..
                } => Some(Concealment::new(player_index, card_ids)),
                _ => None,
            })
            .unwrap();
        (game, concealment)
    }

    #[test]
    fn test_full_projection_matches_state() {
        let (game, _) = after_steal();
        let view = ClientView::from(&game);
        assert_eq!(view.players[0].hand.len(), 3);
        assert_eq!(view.hidden_ids().count(), 0);
        assert_eq!(view.current_player, 0);
    }

    #[test]
    fn test_observer_cannot_see_stolen_cards() {
        let (game, concealment) = after_steal();
        let view = project(&game, Some(1), Some(&concealment));

        assert_eq!(view.hidden_ids().count(), 2);
        let serialized = serde_json::to_string(&view).unwrap();
        for id in &concealment.card_ids {
            assert!(!serialized.contains(id.as_str()));
        }
        // The untouched card is still visible.
        assert!(serialized.contains("Diamonds-4"));
    }

    #[test]
    fn test_thief_sees_stolen_cards() {
        let (game, concealment) = after_steal();
        let view = project(&game, Some(0), Some(&concealment));
        assert_eq!(view.hidden_ids().count(), 0);
        let ids: HashSet<_> = view.players[0].hand.iter().map(|c| c.id().to_string()).collect();
        assert!(concealment.card_ids.is_subset(&ids));
    }

    #[test]
    fn test_unbound_viewer_is_masked() {
        let (game, concealment) = after_steal();
        assert_eq!(project(&game, None, Some(&concealment)).hidden_ids().count(), 2);
    }

    #[test]
    fn test_hidden_card_wire_shape() {
        let json = serde_json::to_value(CardView::hidden()).unwrap();
        assert_eq!(json["suit"], "Hidden");
        assert!(json["rank"].is_null());
        assert!(json["id"].as_str().unwrap().starts_with("HIDDEN-"));
    }

    #[test]
    fn test_placeholder_ids_are_fresh() {
        assert_ne!(CardView::hidden().id(), CardView::hidden().id());
    }
}
