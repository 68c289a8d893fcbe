/// Property-based tests for the match rules using proptest
///
/// These tests check card conservation and all-or-nothing rejection across
/// random action sequences, and the meld predicate across random cards.
use proptest::prelude::*;
use rand::{SeedableRng, rngs::StdRng};
use system_sync::{
    Card, ClientView, GameMode, Match, PlayOptions, Rank, Suit,
    entities::CardId,
    functional::is_valid_meld,
};

#[derive(Clone, Debug)]
enum Op {
    Play { hand_index: usize, options: u8 },
    EndTurn,
    Lay([usize; 3]),
    Reorder,
    Sort(usize),
    DrawUp,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0usize..12, 0u8..3).prop_map(|(hand_index, options)| Op::Play { hand_index, options }),
        4 => Just(Op::EndTurn),
        2 => (0usize..10, 0usize..10, 0usize..10).prop_map(|(a, b, c)| Op::Lay([a, b, c])),
        1 => Just(Op::Reorder),
        1 => (0usize..2).prop_map(Op::Sort),
        1 => Just(Op::DrawUp),
    ]
}

fn top_reversed(game: &Match) -> Vec<CardId> {
    let deck = game.main_deck();
    deck.iter().rev().take(3).map(|c| c.id.clone()).collect()
}

fn apply(game: &mut Match, op: &Op, rng: &mut StdRng) -> bool {
    let seat = game.current_player();
    let result = match op {
        Op::Play {
            hand_index,
            options,
        } => {
            let options = match options {
                1 => PlayOptions::QueenReorder {
                    new_top_order: top_reversed(game),
                },
                2 => PlayOptions::JokerDelete { seq_index: None },
                _ => PlayOptions::None,
            };
            game.play_card(seat, *hand_index, options, rng)
        }
        Op::EndTurn => game.end_turn(seat),
        Op::Lay(indices) => game.lay_sequence(seat, indices),
        Op::Reorder => {
            let order = top_reversed(game);
            game.reorder_top(seat, &order)
        }
        Op::Sort(slot) => game.sort_hand(*slot),
        Op::DrawUp => game.draw_up_to_four(seat).map(|_| ()),
    };
    result.is_ok()
}

fn suit_strategy() -> impl Strategy<Value = Suit> {
    prop_oneof![
        Just(Suit::Hearts),
        Just(Suit::Diamonds),
        Just(Suit::Clubs),
        Just(Suit::Spades),
    ]
}

fn card_strategy() -> impl Strategy<Value = Card> {
    prop_oneof![
        6 => (suit_strategy(), 0usize..13).prop_map(|(suit, r)| Card::new(suit, Rank::STANDARD[r])),
        1 => (1u8..=2).prop_map(Card::joker),
    ]
}

proptest! {
    #[test]
    fn test_cards_are_conserved(seed in any::<u64>(), sudden in any::<bool>(), ops in prop::collection::vec(op_strategy(), 1..120)) {
        let mode = if sudden { GameMode::SuddenDeath } else { GameMode::Standard };
        let mut rng = StdRng::seed_from_u64(seed);
        let mut game = Match::start(mode, &mut rng);
        prop_assert!(game.is_conserved());

        for op in &ops {
            apply(&mut game, op, &mut rng);
            prop_assert!(game.is_conserved(), "conservation broken by {:?}", op);
        }
    }

    #[test]
    fn test_rejected_ops_do_not_mutate(seed in any::<u64>(), ops in prop::collection::vec(op_strategy(), 1..80)) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut game = Match::start(GameMode::Standard, &mut rng);

        for op in &ops {
            let view = ClientView::from(&game);
            let turn = game.turn().clone();
            let winner = game.winner();
            if !apply(&mut game, op, &mut rng) {
                prop_assert_eq!(&ClientView::from(&game), &view, "{:?} mutated state", op);
                prop_assert_eq!(game.turn(), &turn);
                prop_assert_eq!(game.winner(), winner);
            }
        }
    }

    #[test]
    fn test_same_suit_runs_are_valid(suit in suit_strategy(), start in 0usize..11) {
        let cards = [
            Card::new(suit, Rank::STANDARD[start]),
            Card::new(suit, Rank::STANDARD[start + 1]),
            Card::new(suit, Rank::STANDARD[start + 2]),
        ];
        prop_assert!(is_valid_meld(&[&cards[0], &cards[1], &cards[2]]));
    }

    #[test]
    fn test_meld_validity_ignores_order(a in card_strategy(), b in card_strategy(), c in card_strategy()) {
        let forward = is_valid_meld(&[&a, &b, &c]);
        prop_assert_eq!(forward, is_valid_meld(&[&c, &a, &b]));
        prop_assert_eq!(forward, is_valid_meld(&[&b, &c, &a]));
    }

    #[test]
    fn test_mixed_colors_never_valid(a in card_strategy(), b in card_strategy(), c in card_strategy()) {
        let colors: Vec<_> = [&a, &b, &c].iter().filter_map(|card| card.color()).collect();
        if colors.windows(2).any(|pair| pair[0] != pair[1]) {
            prop_assert!(!is_valid_meld(&[&a, &b, &c]));
        }
    }
}
