/// 牌型评分的性质测试
///
/// 随机生成不重复的牌，验证分数区间、牌型互斥，以及最佳手牌的选择。
use poker_relay_core::{best_hand, combinations, score, Card, HandCategory, Rank, Suit};
use proptest::prelude::*;
use std::collections::BTreeSet;

fn card_strategy() -> impl Strategy<Value = Card> {
    (0usize..13, 0usize..4).prop_map(|(rank, suit)| Card::new(Rank::ALL[rank], Suit::ALL[suit]))
}

fn unique_cards_strategy(n: usize) -> impl Strategy<Value = Vec<Card>> {
    prop::collection::vec(card_strategy(), n).prop_filter("Cards must be unique", |cards| {
        let set: BTreeSet<_> = cards.iter().collect();
        set.len() == cards.len()
    })
}

fn five(cards: &[Card]) -> [Card; 5] {
    [cards[0], cards[1], cards[2], cards[3], cards[4]]
}

proptest! {
    #[test]
    fn test_score_within_category_band(cards in unique_cards_strategy(5)) {
        let result = score(&five(&cards));
        let (lower, upper) = result.category.band();
        prop_assert!(result.score >= lower && result.score < upper,
            "{:?} scored {} outside its band", result.category, result.score);
    }

    #[test]
    fn test_score_ignores_card_order(cards in unique_cards_strategy(5)) {
        let mut reversed = cards.clone();
        reversed.reverse();
        prop_assert_eq!(score(&five(&cards)), score(&five(&reversed)));
    }

    #[test]
    fn test_higher_category_always_wins(a in unique_cards_strategy(5), b in unique_cards_strategy(5)) {
        let ra = score(&five(&a));
        let rb = score(&five(&b));
        if ra.category > rb.category {
            prop_assert!(ra.score > rb.score);
        }
    }

    #[test]
    fn test_seven_choose_five(cards in unique_cards_strategy(7)) {
        let combos = combinations(&cards, 5);
        prop_assert_eq!(combos.len(), 21);
        let distinct: BTreeSet<BTreeSet<Card>> =
            combos.iter().map(|c| c.iter().copied().collect()).collect();
        prop_assert_eq!(distinct.len(), 21);
    }

    #[test]
    fn test_best_hand_is_maximum(cards in unique_cards_strategy(7)) {
        let best = best_hand(&cards).unwrap();
        for combo in combinations(&cards, 5) {
            prop_assert!(score(&five(&combo)).score <= best.score);
        }
        prop_assert!(best.cards.iter().all(|c| cards.contains(c)));
    }
}

#[test]
fn test_every_category_is_reachable() {
    let mut seen = BTreeSet::new();
    let hands = [
        "SA,SK,SQ,SJ,ST", "S9,SK,SQ,SJ,ST", "SA,HA,DA,CA,ST", "SA,HA,DA,CK,SK",
        "S2,S7,S9,SJ,SA", "H9,SK,SQ,SJ,ST", "SA,HA,DA,C3,SK", "SA,HA,D3,C3,SK",
        "SA,HA,D3,C4,SK", "SA,H2,D3,C4,S7",
    ];
    for notation in hands {
        let cards: Vec<Card> = notation.split(',').map(|s| s.parse().unwrap()).collect();
        seen.insert(score(&five(&cards)).category);
    }
    assert_eq!(seen.len(), 10);
    assert!(seen.contains(&HandCategory::HighCard));
    assert!(seen.contains(&HandCategory::RoyalFlush));
}
