use crate::card::Card;
use crate::state::Phase;
use thiserror::Error;

/// 引擎错误。所有错误都是同步返回的，且发生错误时状态不会被修改。
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// 在错误的阶段调用了状态转换或下注
    #[error("cannot {action} during phase {phase}")]
    InvalidStateTransition { action: &'static str, phase: Phase },

    /// 牌堆已空。正常对局中出现说明调用方有 bug
    #[error("deck is empty")]
    EmptyDeck,

    #[error("player {player} has {cash} but tried to bet {amount}")]
    InsufficientFunds { player: usize, cash: i64, amount: i64 },

    #[error("bet amount must be positive, got {0}")]
    InvalidAmount(i64),

    #[error("no player with index {0}")]
    UnknownPlayer(usize),

    #[error("a round needs 2 to 23 players, got {0}")]
    InvalidPlayerCount(usize),

    #[error("best hand needs 5 to 7 cards, got {0}")]
    InvalidCardCount(usize),

    #[error("card {0} appears more than once")]
    DuplicateCard(Card),

    #[error("invalid card notation {0:?}")]
    InvalidCard(String),

    #[error("starting stake {0} is negative or too large for the table")]
    InvalidStake(i64),
}
