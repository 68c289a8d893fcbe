//! Pure rule predicates with no access to match state.

use super::{
    constants::MELD_SIZE,
    entities::{Card, Color, PlayerSlot, Slot},
};

/// Whether three cards form a same-color run, with jokers filling gaps.
///
/// The gap rule is applied literally: `(max - min + 1) - non_jokers <= jokers`.
/// All-joker melds are rejected and any color mismatch among the non-jokers
/// rejects regardless of how many jokers are present.
pub fn is_valid_meld(cards: &[&Card]) -> bool {
    if cards.len() != MELD_SIZE {
        return false;
    }

    let jokers = cards.iter().filter(|c| c.is_joker()).count();
    let mut numbers = Vec::with_capacity(MELD_SIZE);
    let mut color: Option<Color> = None;
    for card in cards.iter().filter(|c| !c.is_joker()) {
        let (Some(number), Some(card_color)) = (card.rank.number(), card.color()) else {
            return false;
        };
        match color {
            Some(expected) if expected != card_color => return false,
            _ => color = Some(card_color),
        }
        numbers.push(number);
    }

    let (Some(&min), Some(&max)) = (numbers.iter().min(), numbers.iter().max()) else {
        return false;
    };
    let span = usize::from(max - min) + 1;
    span.saturating_sub(numbers.len()) <= jokers
}

/// Resolves hand positions into a meld candidate and validates it.
///
/// Positions must be exactly three, distinct and in range.
pub fn can_lay_sequence(hand: &[Card], indices: &[usize]) -> bool {
    if indices.len() != MELD_SIZE {
        return false;
    }
    for (i, idx) in indices.iter().enumerate() {
        if *idx >= hand.len() || indices[..i].contains(idx) {
            return false;
        }
    }
    let cards: Vec<&Card> = indices.iter().map(|&idx| &hand[idx]).collect();
    is_valid_meld(&cards)
}

/// Red cards first, then black, then jokers; by rank number within a color.
fn hand_sort_key(card: &Card) -> (u8, u8) {
    let group = match card.color() {
        Some(Color::Red) => 0,
        Some(Color::Black) => 1,
        None => 2,
    };
    (group, card.rank.number().unwrap_or(0))
}

/// Stable sort so equal keys keep their relative order.
pub fn sort_hand(hand: &mut [Card]) {
    hand.sort_by_key(hand_sort_key);
}

/// Scans seats in index order and returns the first one that reached the
/// threshold. Seat 0 wins a simultaneous finish.
pub fn find_winner(players: &[PlayerSlot], sequences_to_win: usize) -> Option<Slot> {
    players
        .iter()
        .position(|player| player.sequences.len() >= sequences_to_win)
}
