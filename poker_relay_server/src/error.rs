use poker_relay_core::{EngineError, ParseCommandError, RoomId, Username};
use thiserror::Error;

/// 服务器层的错误。引擎错误原样透传，由分派层转换成发给用户的通知。
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("room {0} is full")]
    RoomFull(RoomId),

    #[error("room {0} already exists")]
    DuplicateRoom(RoomId),

    #[error("room {0} not found")]
    RoomNotFound(RoomId),

    #[error("room limit of {0} reached")]
    TooManyRooms(usize),

    #[error("username {0} is taken")]
    DuplicateUser(Username),

    #[error("invalid credentials for {0}")]
    InvalidCredentials(Username),

    #[error("{user} is not seated in room {room}")]
    NotSeated { room: RoomId, user: Username },

    #[error("room {room} has {joined} of {needed} players")]
    RoomNotReady { room: RoomId, joined: usize, needed: usize },

    #[error("wrong termination passphrase for room {0}")]
    InvalidPassphrase(RoomId),

    #[error("invalid name {0:?}: must be non-empty and contain no '/', '+' or '#'")]
    InvalidName(String),

    #[error("invalid topic filter {0:?}")]
    InvalidFilter(String),

    #[error("token hashing failed")]
    HashingFailed,

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Command(#[from] ParseCommandError),
}

/// 用户名和房间号会直接拼进主题，不能包含层级分隔符和通配符
pub fn validate_name(name: &str) -> Result<(), RelayError> {
    if name.is_empty() || name.contains(['/', '+', '#']) || name.chars().any(char::is_whitespace) {
        return Err(RelayError::InvalidName(name.to_string()));
    }
    Ok(())
}
