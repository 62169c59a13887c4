use crate::card::Card;
use crate::deck::Deck;
use crate::error::EngineError;
use crate::hand::BestHand;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 一张牌桌最多 23 人：2*23 + 5 = 51 张，一副牌够用
pub const MAX_PLAYERS: usize = 23;
pub const MIN_PLAYERS: usize = 2;

/// 一局的阶段，只能单向推进
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Created,
    HoleCardsDealt,
    Flop,
    Turn,
    River,
    Showdown,
    Settled,
}

impl Phase {
    /// 可以下注/过牌的阶段
    pub fn is_betting_open(self) -> bool {
        matches!(self, Phase::HoleCardsDealt | Phase::Flop | Phase::Turn | Phase::River)
    }

    pub fn name(self) -> &'static str {
        match self {
            Phase::Created => "created",
            Phase::HoleCardsDealt => "hole_cards_dealt",
            Phase::Flop => "flop",
            Phase::Turn => "turn",
            Phase::River => "river",
            Phase::Showdown => "showdown",
            Phase::Settled => "settled",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Player {
    pub hole_cards: Option<[Card; 2]>,
    pub cash: i64,  // 剩余现金
    pub acted: bool,  // 本轮下注是否已行动
}

/// 摊牌结算的结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settlement {
    pub winner: usize,
    pub amount: i64,  // 赢得的奖池
    pub results: Vec<BestHand>,  // 索引对应玩家序号
}

/// 一局德州扑克。独占牌堆和玩家，只能由一个调用方串行修改。
#[derive(Debug, Clone)]
pub struct Round {
    pub(crate) deck: Deck,
    pub(crate) players: Vec<Player>,
    pub(crate) community_cards: Vec<Card>,
    pub(crate) pot: i64,  // 总奖池金额
    pub(crate) phase: Phase,
    // 摊牌后每个玩家的最佳手牌，索引对应玩家序号
    pub(crate) results: Vec<BestHand>,
    pub(crate) winner: Option<usize>,
}

// --- Round 的构造与查询 ---

impl Round {
    /// 创建一局新游戏，牌堆已洗好
    pub fn new(num_players: usize, starting_stake: i64) -> Result<Round, EngineError> {
        Round::with_deck(num_players, starting_stake, Deck::shuffled())
    }

    /// 使用指定的牌堆创建一局游戏
    pub fn with_deck(num_players: usize, starting_stake: i64, deck: Deck) -> Result<Round, EngineError> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&num_players) {
            return Err(EngineError::InvalidPlayerCount(num_players));
        }
        // 全桌现金之和必须放得进 i64，奖池和结算加法才不会溢出
        if starting_stake < 0 || (num_players as i64).checked_mul(starting_stake).is_none() {
            return Err(EngineError::InvalidStake(starting_stake));
        }
        let player = Player { hole_cards: None, cash: starting_stake, acted: false };
        Ok(Round {
            deck,
            players: vec![player; num_players],
            community_cards: Vec::with_capacity(5),
            pot: 0,
            phase: Phase::Created,
            results: Vec::new(),
            winner: None,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn pot(&self) -> i64 {
        self.pot
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, idx: usize) -> Result<&Player, EngineError> {
        self.players.get(idx).ok_or(EngineError::UnknownPlayer(idx))
    }

    pub fn community_cards(&self) -> &[Card] {
        &self.community_cards
    }

    pub fn deck_len(&self) -> usize {
        self.deck.len()
    }

    /// 摊牌后各玩家的最佳手牌；摊牌之前为空
    pub fn results(&self) -> &[BestHand] {
        &self.results
    }

    pub fn winner(&self) -> Option<usize> {
        self.winner
    }

    /// 本轮下注中已经行动过的玩家数
    pub fn acted_count(&self) -> usize {
        self.players.iter().filter(|p| p.acted).count()
    }

    /// 所有玩家都已行动，本轮下注结束
    pub fn betting_complete(&self) -> bool {
        self.acted_count() == self.players.len()
    }
}
