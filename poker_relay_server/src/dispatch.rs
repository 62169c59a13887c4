//! 命令分派：把解析好的 [`Command`] 作用到注册表和用户存储上，
//! 结果转换成一组待发布的消息。

use crate::broker::Publication;
use crate::error::{validate_name, RelayError};
use crate::registry::Room;
use crate::SharedState;
use poker_relay_core::{format_cards, BestHand, Command};
use tracing::{debug, info, warn};

/// 无法归属到用户或房间的错误发布到这里
pub const ERROR_TOPIC: &str = "errors";

// --- 主题 ---

fn user_topic(user: &str, leaf: &str) -> String {
    format!("users/{user}/{leaf}")
}

fn room_topic(room: &str, leaf: &str) -> String {
    format!("rooms/{room}/{leaf}")
}

fn player_topic(room: &str, user: &str, leaf: &str) -> String {
    format!("rooms/{room}/players/{user}/{leaf}")
}

/// 执行一条命令，返回需要发布的消息。失败时返回一条错误通知
pub async fn handle_command(state: &SharedState, command: Command) -> Vec<Publication> {
    debug!(command = %command, "分派命令");
    match execute(state, &command).await {
        Ok(publications) => publications,
        Err(e) => {
            warn!(verb = command.verb(), error = %e, "命令被拒绝");
            vec![error_publication(&command, &e)]
        }
    }
}

/// 创建类命令的失败写在 create_success 上，其余写在 error 上。
/// 名字本身不合法时无法拼成主题，只能发到全局错误主题
fn error_publication(command: &Command, error: &RelayError) -> Publication {
    let valid = |name: &&String| validate_name(name).is_ok();
    match command {
        Command::CreateUser { username } if valid(&username) => {
            Publication::new(user_topic(username, "create_success"), format!("False (detail: {error})"))
        }
        Command::CreateGame { room, .. } if valid(&room) => {
            Publication::new(room_topic(room, "create_success"), format!("False (detail: {error})"))
        }
        _ => {
            if let Some(user) = command.username().filter(valid) {
                Publication::new(user_topic(user, "error"), error)
            } else if let Some(room) = command.room().filter(valid) {
                Publication::new(room_topic(room, "error"), error)
            } else {
                Publication::new(ERROR_TOPIC, format!("{command}: {error}"))
            }
        }
    }
}

async fn execute(state: &SharedState, command: &Command) -> Result<Vec<Publication>, RelayError> {
    match command {
        Command::CreateUser { username } => {
            // argon2 哈希放到阻塞线程池里
            let shared = state.clone();
            let name = username.clone();
            let (username, token) = tokio::task::spawn_blocking(move || shared.users.create_user(&name)).await??;
            info!(%username, users = state.users.len(), "创建用户");
            Ok(vec![
                Publication::new(user_topic(&username, "create_success"), "True"),
                Publication::new(user_topic(&username, "token"), token),
            ])
        }
        Command::CreateGame { room, num_players, starting_cash } => {
            let info = state.registry.create_room(room, *num_players, *starting_cash)?;
            info!(room = %info.id, num_players = info.num_players, rooms = state.registry.len(), "创建房间");
            Ok(vec![
                Publication::new(room_topic(&info.id, "create_success"), "True"),
                Publication::new(room_topic(&info.id, "num_players"), info.num_players),
                Publication::new(room_topic(&info.id, "starting_cash"), info.starting_cash),
                Publication::new(room_topic(&info.id, "term_pass"), info.passphrase),
            ])
        }
        Command::ListGames => {
            let listing = state
                .registry
                .list_rooms()
                .iter()
                .map(|r| format!("{}:{}/{}", r.id, r.joined, r.num_players))
                .collect::<Vec<_>>()
                .join(";");
            Ok(vec![Publication::new("rooms/list", listing)])
        }
        Command::JoinGame { room, username, token } => {
            let verified = {
                let state = state.clone();
                let (username, token) = (username.clone(), token.clone());
                tokio::task::spawn_blocking(move || state.users.verify(&username, &token)).await?
            };
            if !verified {
                return Err(RelayError::InvalidCredentials(username.clone()));
            }
            let idx = state.registry.add_player(room, username)?;
            let cash = with_room(state, room, |r| Ok(r.round.player(idx)?.cash))?;
            info!(%room, %username, idx, "玩家入座");
            Ok(vec![
                Publication::new(player_topic(room, username, "index"), idx),
                Publication::new(player_topic(room, username, "cash"), cash),
            ])
        }
        Command::Deal { room } => with_room(state, room, |r| {
            r.require_full()?;
            r.round.deal_hole_cards()?;
            let mut publications = vec![phase_publication(r)];
            for (user, player) in r.seats.iter().zip(r.round.players()) {
                if let Some(hole) = player.hole_cards {
                    publications.push(Publication::new(player_topic(&r.id, user, "hand"), format_cards(&hole)));
                }
            }
            Ok(publications)
        }),
        Command::Flop { room } => with_room(state, room, |r| {
            r.round.advance_to_flop()?;
            Ok(community_publications(r))
        }),
        Command::Turn { room } => with_room(state, room, |r| {
            r.round.advance_to_turn()?;
            Ok(community_publications(r))
        }),
        Command::River { room } => with_room(state, room, |r| {
            r.round.advance_to_river()?;
            Ok(community_publications(r))
        }),
        Command::Bet { room, username, amount } => with_room(state, room, |r| {
            let idx = r.seat_of(username)?;
            r.round.place_bet(idx, *amount)?;
            Ok(vec![
                Publication::new(room_topic(&r.id, "pot"), r.round.pot()),
                Publication::new(player_topic(&r.id, username, "cash"), r.round.player(idx)?.cash),
                acted_publication(r),
            ])
        }),
        Command::Check { room, username } => with_room(state, room, |r| {
            let idx = r.seat_of(username)?;
            r.round.check(idx)?;
            Ok(vec![acted_publication(r)])
        }),
        Command::Showdown { room } => with_room(state, room, |r| {
            r.round.showdown()?;
            let mut publications = vec![phase_publication(r)];
            publications.extend(best_hand_publications(r));
            Ok(publications)
        }),
        Command::Settle { room } => with_room(state, room, |r| {
            let settlement = r.round.settle()?;
            let winner = &r.seats[settlement.winner];
            info!(room = %r.id, %winner, amount = settlement.amount, "结算");
            let mut publications = best_hand_publications(r);
            publications.extend([
                Publication::new(room_topic(&r.id, "winner"), winner),
                Publication::new(player_topic(&r.id, winner, "cash"), r.round.player(settlement.winner)?.cash),
                Publication::new(room_topic(&r.id, "pot"), r.round.pot()),
                phase_publication(r),
            ]);
            Ok(publications)
        }),
        Command::NextHand { room } => with_room(state, room, |r| {
            r.round.next_hand()?;
            Ok(vec![phase_publication(r)])
        }),
        Command::TerminateGame { room, passphrase } => {
            state.registry.terminate_room(room, passphrase)?;
            info!(%room, "房间已终止");
            Ok(vec![Publication::new(room_topic(room, "terminated"), "True")])
        }
    }
}

/// 在房间锁内执行同步操作，锁不会跨越 await
fn with_room<T>(
    state: &SharedState,
    room: &str,
    f: impl FnOnce(&mut Room) -> Result<T, RelayError>,
) -> Result<T, RelayError> {
    let slot = state.registry.get_room(room)?;
    let mut guard = slot.lock();
    f(&mut guard)
}

fn phase_publication(room: &Room) -> Publication {
    Publication::new(room_topic(&room.id, "phase"), room.round.phase())
}

fn community_publications(room: &Room) -> Vec<Publication> {
    vec![
        phase_publication(room),
        Publication::new(room_topic(&room.id, "community"), format_cards(room.round.community_cards())),
    ]
}

fn acted_publication(room: &Room) -> Publication {
    Publication::new(room_topic(&room.id, "acted"), format!("{}/{}", room.round.acted_count(), room.capacity()))
}

fn best_hand_publications(room: &Room) -> Vec<Publication> {
    room.seats
        .iter()
        .zip(room.round.results())
        .map(|(user, best)| Publication::new(player_topic(&room.id, user, "best_hand"), describe(best)))
        .collect()
}

/// 例如 "SA,SK,SQ,SJ,ST (Royal Flush 135)"
fn describe(best: &BestHand) -> String {
    format!("{} ({} {})", format_cards(&best.cards), best.category, best.score)
}
