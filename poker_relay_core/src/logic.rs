use crate::card::Card;
use crate::deck::Deck;
use crate::error::EngineError;
use crate::hand::{best_hand, BestHand};
use crate::state::{Phase, Round, Settlement};

// --- 核心游戏流程函数 ---

impl Round {
    fn require(&self, action: &'static str, allowed: &[Phase]) -> Result<(), EngineError> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(EngineError::InvalidStateTransition { action, phase: self.phase })
        }
    }

    /// 进入下一阶段时重置本轮的行动标记
    fn enter(&mut self, phase: Phase) {
        self.phase = phase;
        self.players.iter_mut().for_each(|p| p.acted = false);
    }

    /// 发底牌：按玩家序号依次给每人发两张
    pub fn deal_hole_cards(&mut self) -> Result<(), EngineError> {
        self.require("deal hole cards", &[Phase::Created])?;

        let cards = self.deck.draw_many(2 * self.players.len())?;
        for (player, pair) in self.players.iter_mut().zip(cards.chunks_exact(2)) {
            player.hole_cards = Some([pair[0], pair[1]]);
        }
        self.enter(Phase::HoleCardsDealt);
        Ok(())
    }

    /// 翻牌：发三张公共牌
    pub fn advance_to_flop(&mut self) -> Result<&[Card], EngineError> {
        self.require("deal the flop", &[Phase::HoleCardsDealt])?;
        self.reveal(3, Phase::Flop)
    }

    /// 转牌
    pub fn advance_to_turn(&mut self) -> Result<&[Card], EngineError> {
        self.require("deal the turn", &[Phase::Flop])?;
        self.reveal(1, Phase::Turn)
    }

    /// 河牌
    pub fn advance_to_river(&mut self) -> Result<&[Card], EngineError> {
        self.require("deal the river", &[Phase::Turn])?;
        self.reveal(1, Phase::River)
    }

    fn reveal(&mut self, n: usize, next: Phase) -> Result<&[Card], EngineError> {
        let cards = self.deck.draw_many(n)?;
        self.community_cards.extend(cards);
        self.enter(next);
        Ok(&self.community_cards)
    }

    /// 下注：从玩家现金扣除，加入奖池
    pub fn place_bet(&mut self, player_idx: usize, amount: i64) -> Result<(), EngineError> {
        self.require_betting("place a bet")?;
        if amount <= 0 {
            return Err(EngineError::InvalidAmount(amount));
        }
        let player = self.players.get_mut(player_idx).ok_or(EngineError::UnknownPlayer(player_idx))?;
        if amount > player.cash {
            return Err(EngineError::InsufficientFunds { player: player_idx, cash: player.cash, amount });
        }

        player.cash -= amount;
        player.acted = true;
        self.pot += amount;
        Ok(())
    }

    /// 过牌：不下注，只记为已行动
    pub fn check(&mut self, player_idx: usize) -> Result<(), EngineError> {
        self.require_betting("check")?;
        let player = self.players.get_mut(player_idx).ok_or(EngineError::UnknownPlayer(player_idx))?;
        player.acted = true;
        Ok(())
    }

    fn require_betting(&self, action: &'static str) -> Result<(), EngineError> {
        if self.phase.is_betting_open() {
            Ok(())
        } else {
            Err(EngineError::InvalidStateTransition { action, phase: self.phase })
        }
    }

    /// 摊牌：评估每个玩家的最佳手牌，但还不分配奖池
    pub fn showdown(&mut self) -> Result<&[BestHand], EngineError> {
        self.require("show down", &[Phase::River])?;
        let (winner, results) = resolve_showdown(&self.hole_cards()?, &self.community_cards)?;
        self.results = results;
        self.winner = Some(winner);
        self.phase = Phase::Showdown;
        Ok(&self.results)
    }

    /// 结算：确定赢家并把奖池全部给他
    ///
    /// 分数并列时序号最小的玩家获胜。
    pub fn settle(&mut self) -> Result<Settlement, EngineError> {
        self.require("settle", &[Phase::River, Phase::Showdown])?;

        let (winner, results) = match (self.phase, self.winner) {
            (Phase::Showdown, Some(winner)) => (winner, self.results.clone()),
            _ => resolve_showdown(&self.hole_cards()?, &self.community_cards)?,
        };

        let amount = self.pot;
        self.players[winner].cash += amount;
        self.pot = 0;
        self.results = results.clone();
        self.winner = Some(winner);
        self.phase = Phase::Settled;

        Ok(Settlement { winner, amount, results })
    }

    /// 开始下一局：换一副新洗的牌，清空手牌和公共牌，保留每个人的现金
    pub fn next_hand(&mut self) -> Result<(), EngineError> {
        self.next_hand_with_deck(Deck::shuffled())
    }

    pub fn next_hand_with_deck(&mut self, deck: Deck) -> Result<(), EngineError> {
        self.require("start the next hand", &[Phase::Settled])?;
        self.deck = deck;
        self.community_cards.clear();
        self.results.clear();
        self.winner = None;
        self.pot = 0;
        for player in &mut self.players {
            player.hole_cards = None;
        }
        self.enter(Phase::Created);
        Ok(())
    }

    fn hole_cards(&self) -> Result<Vec<[Card; 2]>, EngineError> {
        self.players
            .iter()
            .map(|p| p.hole_cards.ok_or(EngineError::InvalidStateTransition { action: "show down", phase: self.phase }))
            .collect()
    }
}

// --- 辅助逻辑函数 ---

/// 处理摊牌逻辑
///
/// - 为每个玩家用底牌加公共牌评估最大手牌。
/// - 分数严格最大者获胜，并列时取序号最小的玩家。
pub fn resolve_showdown(
    holes: &[[Card; 2]],
    community: &[Card],
) -> Result<(usize, Vec<BestHand>), EngineError> {
    let results = holes
        .iter()
        .map(|hole| {
            let mut all_cards = hole.to_vec();
            all_cards.extend_from_slice(community);
            best_hand(&all_cards)
        })
        .collect::<Result<Vec<_>, _>>()?;
    if results.is_empty() {
        return Err(EngineError::InvalidPlayerCount(0));
    }

    let mut winner = 0;
    for (idx, result) in results.iter().enumerate() {
        if result.score > results[winner].score {
            winner = idx;
        }
    }
    Ok((winner, results))
}

// --- 单元测试 ---
