use crate::card::{Card, Rank, Suit};
use crate::error::EngineError;
use rand::prelude::SliceRandom;
use std::collections::HashSet;

// --- 随机牌组生成 ---

/// 一副完整的 52 张扑克牌，未洗牌
fn create_deck() -> Vec<Card> {
    let mut deck = Vec::with_capacity(52);
    for &suit in &Suit::ALL {
        for &rank in &Rank::ALL {
            deck.push(Card { rank, suit });
        }
    }
    deck
}

/// 牌堆。创建时洗好，发牌从末尾取，一局之内不会重新洗牌。
#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// 创建并洗好一副新牌
    pub fn shuffled() -> Deck {
        let mut cards = create_deck();
        let mut rng = rand::rng();
        cards.shuffle(&mut rng);
        Deck { cards }
    }

    /// 按给定的发牌顺序构造牌堆：`order[0]` 是第一张被发出的牌。
    /// 用于测试和复盘；牌可以少于 52 张，但不能重复。
    pub fn from_draw_order(order: Vec<Card>) -> Result<Deck, EngineError> {
        let mut seen = HashSet::with_capacity(order.len());
        for card in &order {
            if !seen.insert(*card) {
                return Err(EngineError::DuplicateCard(*card));
            }
        }
        let mut cards = order;
        cards.reverse();
        Ok(Deck { cards })
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// 发一张牌
    pub fn draw(&mut self) -> Result<Card, EngineError> {
        self.cards.pop().ok_or(EngineError::EmptyDeck)
    }

    /// 连续发 n 张牌。先检查剩余数量，失败时不会取走任何牌。
    pub fn draw_many(&mut self, n: usize) -> Result<Vec<Card>, EngineError> {
        if self.cards.len() < n {
            return Err(EngineError::EmptyDeck);
        }
        let split = self.cards.len() - n;
        let mut drawn = self.cards.split_off(split);
        drawn.reverse();
        Ok(drawn)
    }
}

// --- 单元测试 ---
