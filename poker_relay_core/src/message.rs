use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub type RoomId = String;
pub type Username = String;

/// 客户端向这个主题发布的负载被当作命令解析
pub const COMMAND_TOPIC: &str = "commands";

// --- 客户端 -> 服务器 的消息 ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// 订阅一个主题过滤器，支持 `+` 和结尾的 `#` 通配符
    Subscribe { filter: String },
    Unsubscribe { filter: String },
    /// 向主题发布消息；发布到 [`COMMAND_TOPIC`] 的负载会被当作命令执行
    Publish { topic: String, payload: String },
}

// --- 服务器 -> 客户端 的消息 ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// 订阅的主题上有新消息
    Publish { topic: String, payload: String },
    /// 订阅成功
    Subscribed { filter: String },
    /// 只发给当前连接的错误信息（例如帧格式错误、过滤器无效）
    Error { message: String },
}

// --- 命令 ---

/// 从消息总线收到的命令，在传输边界解析一次，之后按变体分派。
///
/// 文本格式为 `动词 参数1,参数2,...`，参数两端的空白会被去掉。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    CreateUser { username: Username },
    CreateGame { room: RoomId, num_players: usize, starting_cash: i64 },
    ListGames,
    JoinGame { room: RoomId, username: Username, token: String },
    Deal { room: RoomId },
    Flop { room: RoomId },
    Turn { room: RoomId },
    River { room: RoomId },
    Bet { room: RoomId, username: Username, amount: i64 },
    Check { room: RoomId, username: Username },
    Showdown { room: RoomId },
    Settle { room: RoomId },
    NextHand { room: RoomId },
    TerminateGame { room: RoomId, passphrase: String },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseCommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown command {0:?}")]
    UnknownVerb(String),

    #[error("{verb} expects {expected} argument(s), got {got}")]
    WrongArity { verb: &'static str, expected: usize, got: usize },

    #[error("argument {name} is not a valid number: {value:?}")]
    InvalidNumber { name: &'static str, value: String },

    #[error("argument {0} must not be empty")]
    EmptyArgument(&'static str),
}

impl Command {
    pub fn verb(&self) -> &'static str {
        match self {
            Command::CreateUser { .. } => "create_user",
            Command::CreateGame { .. } => "create_game",
            Command::ListGames => "list_games",
            Command::JoinGame { .. } => "join_game",
            Command::Deal { .. } => "deal",
            Command::Flop { .. } => "the_flop",
            Command::Turn { .. } => "the_turn",
            Command::River { .. } => "the_river",
            Command::Bet { .. } => "bet",
            Command::Check { .. } => "check",
            Command::Showdown { .. } => "showdown",
            Command::Settle { .. } => "settle",
            Command::NextHand { .. } => "next_hand",
            Command::TerminateGame { .. } => "terminate_game",
        }
    }

    /// 命令涉及的房间（如果有）
    pub fn room(&self) -> Option<&RoomId> {
        match self {
            Command::CreateUser { .. } | Command::ListGames => None,
            Command::CreateGame { room, .. }
            | Command::JoinGame { room, .. }
            | Command::Deal { room }
            | Command::Flop { room }
            | Command::Turn { room }
            | Command::River { room }
            | Command::Bet { room, .. }
            | Command::Check { room, .. }
            | Command::Showdown { room }
            | Command::Settle { room }
            | Command::NextHand { room }
            | Command::TerminateGame { room, .. } => Some(room),
        }
    }

    /// 命令涉及的用户（如果有）
    pub fn username(&self) -> Option<&Username> {
        match self {
            Command::CreateUser { username }
            | Command::JoinGame { username, .. }
            | Command::Bet { username, .. }
            | Command::Check { username, .. } => Some(username),
            _ => None,
        }
    }
}

/// 按逗号切分并检查参数个数
fn args<'a, const N: usize>(verb: &'static str, rest: &'a str) -> Result<[&'a str; N], ParseCommandError> {
    let parts: Vec<&str> = if rest.trim().is_empty() {
        Vec::new()
    } else {
        rest.split(',').map(str::trim).collect()
    };
    let got = parts.len();
    parts.try_into().map_err(|_| ParseCommandError::WrongArity { verb, expected: N, got })
}

fn text(name: &'static str, value: &str) -> Result<String, ParseCommandError> {
    if value.is_empty() {
        return Err(ParseCommandError::EmptyArgument(name));
    }
    Ok(value.to_string())
}

fn number<T: FromStr>(name: &'static str, value: &str) -> Result<T, ParseCommandError> {
    value.parse().map_err(|_| ParseCommandError::InvalidNumber { name, value: value.to_string() })
}

impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseCommandError::Empty);
        }
        let (verb, rest) = s.split_once(char::is_whitespace).unwrap_or((s, ""));

        let room_only = |verb: &'static str| -> Result<RoomId, ParseCommandError> {
            let [room] = args::<1>(verb, rest)?;
            text("room", room)
        };

        let command = match verb {
            "create_user" => {
                let [username] = args::<1>("create_user", rest)?;
                Command::CreateUser { username: text("username", username)? }
            }
            "create_game" => {
                let [room, num_players, starting_cash] = args::<3>("create_game", rest)?;
                Command::CreateGame {
                    room: text("room", room)?,
                    num_players: number("num_players", num_players)?,
                    starting_cash: number("starting_cash", starting_cash)?,
                }
            }
            "list_games" => {
                let [] = args::<0>("list_games", rest)?;
                Command::ListGames
            }
            "join_game" => {
                let [room, username, token] = args::<3>("join_game", rest)?;
                Command::JoinGame {
                    room: text("room", room)?,
                    username: text("username", username)?,
                    token: text("token", token)?,
                }
            }
            "deal" => Command::Deal { room: room_only("deal")? },
            "the_flop" => Command::Flop { room: room_only("the_flop")? },
            "the_turn" => Command::Turn { room: room_only("the_turn")? },
            "the_river" => Command::River { room: room_only("the_river")? },
            "showdown" => Command::Showdown { room: room_only("showdown")? },
            "settle" => Command::Settle { room: room_only("settle")? },
            "next_hand" => Command::NextHand { room: room_only("next_hand")? },
            "bet" => {
                let [room, username, amount] = args::<3>("bet", rest)?;
                Command::Bet {
                    room: text("room", room)?,
                    username: text("username", username)?,
                    amount: number("amount", amount)?,
                }
            }
            "check" => {
                let [room, username] = args::<2>("check", rest)?;
                Command::Check { room: text("room", room)?, username: text("username", username)? }
            }
            "terminate_game" => {
                let [room, passphrase] = args::<2>("terminate_game", rest)?;
                Command::TerminateGame { room: text("room", room)?, passphrase: text("passphrase", passphrase)? }
            }
            other => return Err(ParseCommandError::UnknownVerb(other.to_string())),
        };
        Ok(command)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let verb = self.verb();
        match self {
            Command::CreateUser { username } => write!(f, "{verb} {username}"),
            Command::CreateGame { room, num_players, starting_cash } => {
                write!(f, "{verb} {room},{num_players},{starting_cash}")
            }
            Command::ListGames => write!(f, "{verb}"),
            Command::JoinGame { room, username, token } => write!(f, "{verb} {room},{username},{token}"),
            Command::Bet { room, username, amount } => write!(f, "{verb} {room},{username},{amount}"),
            Command::Check { room, username } => write!(f, "{verb} {room},{username}"),
            Command::TerminateGame { room, passphrase } => write!(f, "{verb} {room},{passphrase}"),
            Command::Deal { room }
            | Command::Flop { room }
            | Command::Turn { room }
            | Command::River { room }
            | Command::Showdown { room }
            | Command::Settle { room }
            | Command::NextHand { room } => write!(f, "{verb} {room}"),
        }
    }
}

// --- 单元测试 ---

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_create_game_with_spaces() {
        let cmd: Command = "create_game 3, 5, 2000".parse().unwrap();
        assert_eq!(cmd, Command::CreateGame { room: "3".into(), num_players: 5, starting_cash: 2000 });
        assert_eq!(cmd.room(), Some(&"3".to_string()));
        assert_eq!(cmd.username(), None);
    }

    #[test]
    fn test_parse_bet_and_flop() {
        let bet: Command = "bet 2,felix,200".parse().unwrap();
        assert_eq!(bet, Command::Bet { room: "2".into(), username: "felix".into(), amount: 200 });
        assert_eq!(bet.username(), Some(&"felix".to_string()));
        assert_eq!("the_flop 2".parse::<Command>().unwrap(), Command::Flop { room: "2".into() });
        assert_eq!("list_games".parse::<Command>().unwrap(), Command::ListGames);
    }

    #[test]
    fn test_negative_bet_parses() {
        // 金额合法性由引擎检查
        let bet: Command = "bet 2,felix,-5".parse().unwrap();
        assert_eq!(bet, Command::Bet { room: "2".into(), username: "felix".into(), amount: -5 });
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<Command>(), Err(ParseCommandError::Empty));
        assert_eq!("fold 2".parse::<Command>(), Err(ParseCommandError::UnknownVerb("fold".into())));
        assert_eq!(
            "bet 2,felix".parse::<Command>(),
            Err(ParseCommandError::WrongArity { verb: "bet", expected: 3, got: 2 })
        );
        assert_eq!(
            "the_flop".parse::<Command>(),
            Err(ParseCommandError::WrongArity { verb: "the_flop", expected: 1, got: 0 })
        );
        assert_eq!(
            "create_game 3,five,100".parse::<Command>(),
            Err(ParseCommandError::InvalidNumber { name: "num_players", value: "five".into() })
        );
        assert_eq!("check 3,".parse::<Command>(), Err(ParseCommandError::EmptyArgument("username")));
        assert!("list_games now".parse::<Command>().is_err());
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for text in ["create_user alice", "create_game 3,5,2000", "bet 3,alice,50", "settle 3", "list_games"] {
            let cmd: Command = text.parse().unwrap();
            assert_eq!(cmd.to_string(), text);
        }
    }

    #[test]
    fn test_client_message_json() {
        let msg = ClientMessage::Publish { topic: COMMAND_TOPIC.into(), payload: "deal 3".into() };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(serde_json::from_str::<ClientMessage>(&json).unwrap(), msg);
    }
}
