use crate::card::Card;
use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 牌型类别，从小到大排列，可以直接用 `Ord` 比较。
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum HandCategory {
    HighCard,
    Pair,
    TwoPair,
    ThreeOfAKind,
    Straight,
    Flush,
    FullHouse,
    FourOfAKind,
    StraightFlush,
    RoyalFlush,
}

impl HandCategory {
    pub fn name(self) -> &'static str {
        match self {
            HandCategory::HighCard => "High Card",
            HandCategory::Pair => "Pair",
            HandCategory::TwoPair => "Two Pair",
            HandCategory::ThreeOfAKind => "Three of a Kind",
            HandCategory::Straight => "Straight",
            HandCategory::Flush => "Flush",
            HandCategory::FullHouse => "Full House",
            HandCategory::FourOfAKind => "Four of a Kind",
            HandCategory::StraightFlush => "Straight Flush",
            HandCategory::RoyalFlush => "Royal Flush",
        }
    }

    /// 该牌型分数所在的区间 `[下界, 上界)`，皇家同花顺固定为 135。
    pub fn band(self) -> (Score, Score) {
        let lower = match self {
            HandCategory::HighCard => 0,
            HandCategory::Pair => 15,
            HandCategory::TwoPair => 30,
            HandCategory::ThreeOfAKind => 45,
            HandCategory::Straight => 60,
            HandCategory::Flush => 75,
            HandCategory::FullHouse => 90,
            HandCategory::FourOfAKind => 105,
            HandCategory::StraightFlush => 120,
            HandCategory::RoyalFlush => return (Score::whole(135), Score::whole(135) + Score(1)),
        };
        (Score::whole(lower), Score::whole(lower + 15))
    }
}

impl fmt::Display for HandCategory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 定点小数分数，单位为 10^-8。
/// 高牌需要 8 位小数才能区分，用整数保证比较和格式化都是精确的。
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Score(pub u64);

impl Score {
    /// 1.0 对应的单位数
    pub const SCALE: u64 = 100_000_000;

    pub const fn whole(n: u64) -> Score {
        Score(n * Score::SCALE)
    }

    pub const fn units(self) -> u64 {
        self.0
    }
}

impl std::ops::Add for Score {
    type Output = Score;

    fn add(self, rhs: Score) -> Score {
        Score(self.0 + rhs.0)
    }
}

/// 去掉末尾的 0："119.1"、"135"、"14.12100602"
impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let int = self.0 / Score::SCALE;
        let frac = self.0 % Score::SCALE;
        if frac == 0 {
            return write!(f, "{int}");
        }
        let digits = format!("{frac:08}");
        write!(f, "{int}.{}", digits.trim_end_matches('0'))
    }
}

/// 单手 5 张牌的评估结果
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub struct HandResult {
    pub category: HandCategory,
    pub score: Score,
}

/// 第 i 位点数的权重：1, 1/100, 1/10^4, 1/10^6, 1/10^8
const PLACES: [u64; 5] = [
    Score::SCALE,
    Score::SCALE / 100,
    Score::SCALE / 10_000,
    Score::SCALE / 1_000_000,
    Score::SCALE / 100_000_000,
];

/// 按位累加点数，`ranks[0]` 在整数位
fn weigh(ranks: &[u8]) -> Score {
    Score(ranks.iter().zip(PLACES).map(|(&r, place)| u64::from(r) * place).sum())
}

// --- 牌型评估逻辑 ---

/// 评估一手 5 张牌。
///
/// 先统计每个点数出现的次数，按 (次数, 点数) 从大到小排好，
/// 之后每种牌型需要的三条/对子/踢脚牌都直接从这张表里取。
pub fn score(hand: &[Card; 5]) -> HandResult {
    let mut ranks: Vec<u8> = hand.iter().map(|c| c.rank.value()).collect();
    ranks.sort_unstable_by(|a, b| b.cmp(a));

    // (出现次数, 点数)
    let mut groups: Vec<(u8, u8)> = Vec::with_capacity(5);
    for &r in &ranks {
        match groups.iter_mut().find(|(_, rank)| *rank == r) {
            Some((count, _)) => *count += 1,
            None => groups.push((1, r)),
        }
    }
    groups.sort_unstable_by(|a, b| b.cmp(a));
    let shape: Vec<u8> = groups.iter().map(|&(count, _)| count).collect();
    let grouped: Vec<u8> = groups.iter().map(|&(_, rank)| rank).collect();

    let is_flush = hand.iter().all(|c| c.suit == hand[0].suit);
    let is_straight = groups.len() == 5 && ranks[0] - ranks[4] == 4;
    let high = ranks[0];

    let (category, score) = if is_flush && ranks == [14, 13, 12, 11, 10] {
        (HandCategory::RoyalFlush, Score::whole(135))
    } else if is_flush && is_straight {
        (HandCategory::StraightFlush, Score::whole(120 + u64::from(high)))
    } else if shape[0] == 4 {
        (HandCategory::FourOfAKind, Score::whole(105) + weigh(&grouped))
    } else if shape[..] == [3, 2] {
        (HandCategory::FullHouse, Score::whole(90) + weigh(&grouped))
    } else if is_flush {
        (HandCategory::Flush, Score::whole(75) + weigh(&[0, high]))
    } else if is_straight {
        (HandCategory::Straight, Score::whole(60 + u64::from(high)))
    } else if shape[0] == 3 {
        (HandCategory::ThreeOfAKind, Score::whole(45) + weigh(&grouped))
    } else if shape[..] == [2, 2, 1] {
        (HandCategory::TwoPair, Score::whole(30) + weigh(&grouped))
    } else if shape[0] == 2 {
        (HandCategory::Pair, Score::whole(15) + weigh(&grouped))
    } else {
        (HandCategory::HighCard, weigh(&ranks))
    };

    HandResult { category, score }
}

/// 从一个切片中生成所有大小为 k 的组合，按输入位置的字典序排列
pub fn combinations<T: Copy>(data: &[T], k: usize) -> Vec<Vec<T>> {
    if k == 0 {
        return vec![vec![]];
    }
    if data.len() < k {
        return vec![];
    }

    let (first, rest) = data.split_at(1);

    // 包含第一个元素的组合
    let mut result = combinations(rest, k - 1);
    for combo in &mut result {
        combo.insert(0, first[0]);
    }

    // 不包含第一个元素的组合
    if data.len() > k {
        result.append(&mut combinations(rest, k));
    }

    result
}

/// 玩家的最佳 5 张牌组合
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct BestHand {
    pub cards: [Card; 5],
    pub category: HandCategory,
    pub score: Score,
}

/// 从 5 到 7 张牌中找出分数最高的 5 张组合。
///
/// 分数相同的组合只可能来自完全相同的点数/花色多重集，
/// 此时返回枚举顺序中的第一个。
pub fn best_hand(cards: &[Card]) -> Result<BestHand, EngineError> {
    if !(5..=7).contains(&cards.len()) {
        return Err(EngineError::InvalidCardCount(cards.len()));
    }

    let mut best: Option<BestHand> = None;
    for combo in combinations(cards, 5) {
        let hand: [Card; 5] = [combo[0], combo[1], combo[2], combo[3], combo[4]];
        let result = score(&hand);
        if best.as_ref().is_none_or(|b| result.score > b.score) {
            best = Some(BestHand { cards: hand, category: result.category, score: result.score });
        }
    }
    best.ok_or(EngineError::InvalidCardCount(cards.len()))
}

// --- 单元测试 ---

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn hand(notation: &str) -> [Card; 5] {
        let cards: Vec<Card> = notation.split(',').map(|s| s.parse().unwrap()).collect();
        cards.try_into().unwrap()
    }

    fn cards(notation: &str) -> Vec<Card> {
        notation.split(',').map(|s| s.parse().unwrap()).collect()
    }

    fn check(notation: &str, category: HandCategory, expected: &str) {
        let result = score(&hand(notation));
        assert_eq!(result.category, category, "{notation}");
        assert_eq!(result.score.to_string(), expected, "{notation}");
    }

    #[test]
    fn test_royal_flush() {
        check("SA,SK,SQ,SJ,ST", HandCategory::RoyalFlush, "135");
        assert_eq!(score(&hand("ST,SJ,SQ,SK,SA")).score, Score::whole(135));
    }

    #[test]
    fn test_straight_flush() {
        check("SK,SQ,SJ,ST,S9", HandCategory::StraightFlush, "133");
        check("H6,H2,H4,H3,H5", HandCategory::StraightFlush, "126");
    }

    #[test]
    fn test_four_of_a_kind() {
        check("SA,SA,SA,SA,ST", HandCategory::FourOfAKind, "119.1");
        assert_eq!(
            score(&hand("SA,SA,SA,SA,ST")).score,
            Score::whole(119) + Score(Score::SCALE / 10)
        );
        check("SK,DK,HK,CK,SQ", HandCategory::FourOfAKind, "118.12");
    }

    #[test]
    fn test_full_house_beats_same_suit_flush() {
        check("ST,ST,ST,SQ,SQ", HandCategory::FullHouse, "100.12");
        check("D2,H2,C2,SA,HA", HandCategory::FullHouse, "92.14");
    }

    #[test]
    fn test_flush() {
        check("SA,S5,S4,S8,ST", HandCategory::Flush, "75.14");
    }

    #[test]
    fn test_straight() {
        check("ST,D9,H8,S7,C6", HandCategory::Straight, "70");
        check("SA,DK,HQ,SJ,CT", HandCategory::Straight, "74");
    }

    #[test]
    fn test_ace_high_straight_loses_to_any_flush() {
        let straight = score(&hand("SA,DK,HQ,SJ,CT"));
        let weakest_flush = score(&hand("H2,H3,H4,H5,H7"));
        assert!(weakest_flush.score > straight.score);
    }

    #[test]
    fn test_wheel_is_not_a_straight() {
        check("SA,D2,H3,S4,C5", HandCategory::HighCard, "14.05040302");
    }

    #[test]
    fn test_three_of_a_kind() {
        check("SA,DA,HA,SJ,C9", HandCategory::ThreeOfAKind, "59.1109");
    }

    #[test]
    fn test_two_pair() {
        check("SA,DA,HK,SK,C9", HandCategory::TwoPair, "44.1309");
        // 踢脚牌比两个对子都大
        check("S3,D3,H2,S2,CA", HandCategory::TwoPair, "33.0214");
    }

    #[test]
    fn test_pair() {
        check("SA,DA,HK,S5,C3", HandCategory::Pair, "29.130503");
        check("S2,D2,H5,SA,C3", HandCategory::Pair, "17.140503");
    }

    #[test]
    fn test_high_card() {
        check("SA,DQ,HT,S6,C2", HandCategory::HighCard, "14.12100602");
    }

    #[test]
    fn test_high_card_tie_break_on_last_kicker() {
        let a = score(&hand("SA,DQ,HT,S6,C3"));
        let b = score(&hand("HA,CQ,ST,D6,H2"));
        assert!(a.score > b.score);
        assert_eq!(a.score.units() - b.score.units(), 1);
    }

    #[test]
    fn test_combinations_seven_choose_five() {
        let seven = cards("S2,D2,H2,C2,S3,S4,S5");
        let combos = combinations(&seven, 5);
        assert_eq!(combos.len(), 21);
        let distinct: HashSet<Vec<Card>> = combos.iter().cloned().collect();
        assert_eq!(distinct.len(), 21);
        for combo in &combos {
            assert_eq!(combo.len(), 5);
            assert!(combo.iter().all(|c| seven.contains(c)));
        }
    }

    #[test]
    fn test_combinations_edge_sizes() {
        assert_eq!(combinations(&[1, 2, 3], 0), vec![Vec::<i32>::new()]);
        assert!(combinations(&[1, 2], 3).is_empty());
        assert_eq!(combinations(&[1, 2, 3], 3), vec![vec![1, 2, 3]]);
    }

    #[test]
    fn test_best_hand_four_kings() {
        let best = best_hand(&cards("SK,DK,HK,C2,S3,SQ,CK")).unwrap();
        assert_eq!(best.category, HandCategory::FourOfAKind);
        assert_eq!(best.score.to_string(), "118.12");
    }

    #[test]
    fn test_best_hand_plays_the_board() {
        let best = best_hand(&cards("S2,H2,CT,DJ,HQ,SK,CA")).unwrap();
        assert_eq!(best.category, HandCategory::Straight);
        assert_eq!(best.score, Score::whole(74));
    }

    #[test]
    fn test_best_hand_prefers_flush_over_pair() {
        let best = best_hand(&cards("HA,HK,HT,H2,H5,SA,CT")).unwrap();
        assert_eq!(best.category, HandCategory::Flush);
    }

    #[test]
    fn test_best_hand_card_count() {
        assert_eq!(best_hand(&cards("SA,SK,SQ,SJ")), Err(EngineError::InvalidCardCount(4)));
        assert_eq!(
            best_hand(&cards("SA,SK,SQ,SJ,ST,S9,S8,S7")),
            Err(EngineError::InvalidCardCount(8))
        );
        assert_eq!(best_hand(&cards("SA,SK,SQ,SJ,ST")).unwrap().score, Score::whole(135));
    }
}
