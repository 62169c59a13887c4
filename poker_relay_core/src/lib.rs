//! # 德州扑克协调器核心库
//!
//! 这个 `core` crate 包含牌、牌堆、牌型评分、最佳手牌选择、
//! 单局状态机，以及客户端与服务器之间的消息和命令定义。
//! 它不依赖任何网络或存储实现，服务器和客户端都复用它。
//!
//! 一局 [`Round`] 只能被一个调用方串行修改：服务器为每个房间
//! 持有一把独占锁，不同房间之间没有共享的可变状态。

mod card;
mod deck;
mod error;
mod hand;
mod logic;
mod message;
mod state;

pub use card::*;

pub use deck::Deck;

pub use error::EngineError;

pub use hand::*;

pub use logic::resolve_showdown;

pub use message::*;

pub use state::*;
