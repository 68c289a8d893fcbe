use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::constants::{DECRYPT_PEEK_DEPTH, DECK_SIZE, MELD_SIZE};

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Suit {
    Hearts,
    Diamonds,
    Clubs,
    Spades,
    Joker,
}

impl Suit {
    /// Deck construction order.
    pub const STANDARD: [Self; 4] = [Self::Hearts, Self::Diamonds, Self::Clubs, Self::Spades];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Hearts => "Hearts",
            Self::Diamonds => "Diamonds",
            Self::Clubs => "Clubs",
            Self::Spades => "Spades",
            Self::Joker => "Joker",
        }
    }

    /// Jokers have no color.
    pub const fn color(self) -> Option<Color> {
        match self {
            Self::Hearts | Self::Diamonds => Some(Color::Red),
            Self::Clubs | Self::Spades => Some(Color::Black),
            Self::Joker => None,
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Hearts => "♥",
            Self::Diamonds => "♦",
            Self::Clubs => "♣",
            Self::Spades => "♠",
            Self::Joker => "*",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Black,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Rank {
    #[serde(rename = "A")]
    Ace,
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "3")]
    Three,
    #[serde(rename = "4")]
    Four,
    #[serde(rename = "5")]
    Five,
    #[serde(rename = "6")]
    Six,
    #[serde(rename = "7")]
    Seven,
    #[serde(rename = "8")]
    Eight,
    #[serde(rename = "9")]
    Nine,
    #[serde(rename = "10")]
    Ten,
    #[serde(rename = "J")]
    Jack,
    #[serde(rename = "Q")]
    Queen,
    #[serde(rename = "K")]
    King,
    #[serde(rename = "JOKER")]
    Joker,
}

impl Rank {
    /// The 13 ranks of each standard suit, in deck construction order.
    pub const STANDARD: [Self; 13] = [
        Self::Ace,
        Self::Two,
        Self::Three,
        Self::Four,
        Self::Five,
        Self::Six,
        Self::Seven,
        Self::Eight,
        Self::Nine,
        Self::Ten,
        Self::Jack,
        Self::Queen,
        Self::King,
    ];

    /// Run position of the rank: A=1 .. K=13. Jokers have no number.
    pub const fn number(self) -> Option<u8> {
        match self {
            Self::Ace => Some(1),
            Self::Two => Some(2),
            Self::Three => Some(3),
            Self::Four => Some(4),
            Self::Five => Some(5),
            Self::Six => Some(6),
            Self::Seven => Some(7),
            Self::Eight => Some(8),
            Self::Nine => Some(9),
            Self::Ten => Some(10),
            Self::Jack => Some(11),
            Self::Queen => Some(12),
            Self::King => Some(13),
            Self::Joker => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Ace => "A",
            Self::Two => "2",
            Self::Three => "3",
            Self::Four => "4",
            Self::Five => "5",
            Self::Six => "6",
            Self::Seven => "7",
            Self::Eight => "8",
            Self::Nine => "9",
            Self::Ten => "10",
            Self::Jack => "J",
            Self::Queen => "Q",
            Self::King => "K",
            Self::Joker => "JOKER",
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Stable identity of a card for the lifetime of a match.
pub type CardId = String;

/// A card never changes once dealt; only `id` is compared to decide whether two
/// cards are the same card.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Card {
    pub id: CardId,
    pub suit: Suit,
    pub rank: Rank,
}

impl Card {
    pub fn new(suit: Suit, rank: Rank) -> Self {
        Self {
            id: format!("{}-{}", suit.name(), rank.label()),
            suit,
            rank,
        }
    }

    /// Jokers are numbered from 1.
    pub fn joker(number: u8) -> Self {
        Self {
            id: format!("JOKER-{number}"),
            suit: Suit::Joker,
            rank: Rank::Joker,
        }
    }

    pub fn is_joker(&self) -> bool {
        self.rank == Rank::Joker
    }

    pub fn color(&self) -> Option<Color> {
        self.suit.color()
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = if self.is_joker() {
            self.rank.label().to_string()
        } else {
            format!("{}/{}", self.rank, self.suit)
        };
        write!(f, "{repr:>5}")
    }
}

/// A laid-down group of exactly three cards.
pub type Meld = [Card; MELD_SIZE];

/// Seat index of a player within a match (0 = host, 1 = guest).
pub type Slot = usize;

/// Everything a match owns on behalf of one player.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSlot {
    pub hand: Vec<Card>,
    pub sequences: Vec<Meld>,
    /// Rounds this player is skipped for. Nothing in the current rule set sets it.
    pub blocked_rounds: u32,
    /// Turns granted by Kings, consumed one per turn end.
    pub extra_turns: u32,
}

impl PlayerSlot {
    pub fn with_hand(hand: Vec<Card>) -> Self {
        Self {
            hand,
            ..Default::default()
        }
    }

    /// Cards held in hand plus cards laid in sequences.
    pub fn card_count(&self) -> usize {
        self.hand.len() + MELD_SIZE * self.sequences.len()
    }
}

/// Fisher-Yates shuffle drawing from an injectable random source so that
/// deals are reproducible under a seeded generator.
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}

/// Ordered stack of cards. The top of the deck is the last element.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        shuffle(&mut self.cards, rng);
    }

    /// Pops the top card, if any remain.
    pub fn deal_card(&mut self) -> Option<Card> {
        self.cards.pop()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// The top `n` cards (fewer if the deck is short), bottom-most first so
    /// the last element is the top of the deck.
    pub fn top(&self, n: usize) -> &[Card] {
        let start = self.cards.len().saturating_sub(n);
        &self.cards[start..]
    }

    /// Rearranges the top cards revealed by a Queen.
    ///
    /// Ids are applied in order, the last one placed becoming the new top.
    /// Ids outside the revealed set are ignored, repeated ids count once, and
    /// revealed cards left out of `order` keep their relative order above the
    /// ones that were named. Returns `false` when the deck is empty.
    pub fn reorder_top(&mut self, order: &[CardId]) -> bool {
        let depth = DECRYPT_PEEK_DEPTH.min(self.cards.len());
        if depth == 0 {
            return false;
        }

        let mut revealed: Vec<Option<Card>> = self
            .cards
            .split_off(self.cards.len() - depth)
            .into_iter()
            .map(Some)
            .collect();

        for id in order {
            if let Some(entry) = revealed
                .iter_mut()
                .find(|entry| entry.as_ref().is_some_and(|card| &card.id == id))
            {
                self.cards.extend(entry.take());
            }
        }
        self.cards.extend(revealed.into_iter().flatten());
        true
    }

    pub fn into_cards(self) -> Vec<Card> {
        self.cards
    }
}

impl Default for Deck {
    /// The full 54-card deck in construction order: every suit A..K, then
    /// the two jokers.
    fn default() -> Self {
        let mut cards = Vec::with_capacity(DECK_SIZE);
        for suit in Suit::STANDARD {
            for rank in Rank::STANDARD {
                cards.push(Card::new(suit, rank));
            }
        }
        cards.push(Card::joker(1));
        cards.push(Card::joker(2));
        Self { cards }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::constants::JOKER_COUNT;
    use rand::{SeedableRng, rngs::StdRng};
    use std::collections::HashSet;

    fn ids(cards: &[Card]) -> Vec<&str> {
        cards.iter().map(|c| c.id.as_str()).collect()
    }

    // === Card Tests ===

    #[test]
    fn test_card_ids_derive_from_suit_and_rank() {
        assert_eq!(Card::new(Suit::Hearts, Rank::Ten).id, "Hearts-10");
        assert_eq!(Card::new(Suit::Spades, Rank::Ace).id, "Spades-A");
        assert_eq!(Card::joker(2).id, "JOKER-2");
    }

    #[test]
    fn test_card_colors() {
        assert_eq!(Card::new(Suit::Diamonds, Rank::Two).color(), Some(Color::Red));
        assert_eq!(Card::new(Suit::Clubs, Rank::Two).color(), Some(Color::Black));
        assert_eq!(Card::joker(1).color(), None);
    }

    #[test]
    fn test_rank_numbers() {
        assert_eq!(Rank::Ace.number(), Some(1));
        assert_eq!(Rank::Ten.number(), Some(10));
        assert_eq!(Rank::Jack.number(), Some(11));
        assert_eq!(Rank::King.number(), Some(13));
        assert_eq!(Rank::Joker.number(), None);
    }

    #[test]
    fn test_card_serializes_with_wire_labels() {
        let json = serde_json::to_value(Card::new(Suit::Hearts, Rank::Queen)).unwrap();
        assert_eq!(json["id"], "Hearts-Q");
        assert_eq!(json["suit"], "Hearts");
        assert_eq!(json["rank"], "Q");

        let joker: Card =
            serde_json::from_str(r#"{"id":"JOKER-1","suit":"Joker","rank":"JOKER"}"#).unwrap();
        assert!(joker.is_joker());
    }

    // === Deck Tests ===

    #[test]
    fn test_deck_initialization() {
        let deck = Deck::default();
        assert_eq!(deck.len(), DECK_SIZE);

        let unique: HashSet<_> = deck.cards().iter().map(|c| &c.id).collect();
        assert_eq!(unique.len(), DECK_SIZE);

        let jokers = deck.cards().iter().filter(|c| c.is_joker()).count();
        assert_eq!(jokers, JOKER_COUNT);
    }

    #[test]
    fn test_deck_shuffle_is_reproducible() {
        let mut a = Deck::default();
        let mut b = Deck::default();
        a.shuffle(&mut StdRng::seed_from_u64(42));
        b.shuffle(&mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
        assert_ne!(a, Deck::default());
    }

    #[test]
    fn test_deck_shuffle_keeps_every_card() {
        let mut deck = Deck::default();
        deck.shuffle(&mut StdRng::seed_from_u64(7));

        let mut shuffled: Vec<_> = deck.cards().iter().map(|c| c.id.clone()).collect();
        let mut original: Vec<_> = Deck::default().into_cards().into_iter().map(|c| c.id).collect();
        shuffled.sort();
        original.sort();
        assert_eq!(shuffled, original);
    }

    #[test]
    fn test_deck_deal_card_pops_top() {
        let mut deck = Deck::default();
        let top = deck.deal_card().unwrap();
        assert_eq!(top.id, "JOKER-2");
        assert_eq!(deck.len(), DECK_SIZE - 1);
    }

    #[test]
    fn test_deck_top_is_short_when_deck_is() {
        let deck = Deck::from_cards(vec![Card::new(Suit::Hearts, Rank::Two)]);
        assert_eq!(deck.top(3).len(), 1);
        assert!(Deck::from_cards(vec![]).top(3).is_empty());
    }

    // === Reorder Tests ===

    fn five_card_deck() -> Deck {
        Deck::from_cards(
            [Rank::Two, Rank::Three, Rank::Four, Rank::Five, Rank::Six]
                .into_iter()
                .map(|r| Card::new(Suit::Clubs, r))
                .collect(),
        )
    }

    #[test]
    fn test_reorder_top_last_id_becomes_top() {
        let mut deck = five_card_deck();
        let order = vec!["Clubs-6".to_string(), "Clubs-4".to_string(), "Clubs-5".to_string()];
        assert!(deck.reorder_top(&order));
        assert_eq!(
            ids(deck.cards()),
            vec!["Clubs-2", "Clubs-3", "Clubs-6", "Clubs-4", "Clubs-5"]
        );
    }

    #[test]
    fn test_reorder_top_appends_omitted_and_ignores_foreign_ids() {
        let mut deck = five_card_deck();
        let order = vec!["Clubs-2".to_string(), "Clubs-6".to_string()];
        assert!(deck.reorder_top(&order));
        // Clubs-2 is not among the top three, so only Clubs-6 moves.
        assert_eq!(
            ids(deck.cards()),
            vec!["Clubs-2", "Clubs-3", "Clubs-6", "Clubs-4", "Clubs-5"]
        );
    }

    #[test]
    fn test_reorder_top_counts_repeated_ids_once() {
        let mut deck = five_card_deck();
        let order = vec!["Clubs-4".to_string(), "Clubs-4".to_string()];
        assert!(deck.reorder_top(&order));
        assert_eq!(deck.len(), 5);
        assert_eq!(
            ids(deck.cards()),
            vec!["Clubs-2", "Clubs-3", "Clubs-4", "Clubs-5", "Clubs-6"]
        );
    }

    #[test]
    fn test_reorder_top_on_empty_deck() {
        let mut deck = Deck::from_cards(vec![]);
        assert!(!deck.reorder_top(&["Clubs-2".to_string()]));
    }

    #[test]
    fn test_player_slot_card_count() {
        let mut slot = PlayerSlot::with_hand(vec![Card::joker(1)]);
        slot.sequences.push([
            Card::new(Suit::Hearts, Rank::Two),
            Card::new(Suit::Hearts, Rank::Three),
            Card::new(Suit::Hearts, Rank::Four),
        ]);
        assert_eq!(slot.card_count(), 4);
    }
}
