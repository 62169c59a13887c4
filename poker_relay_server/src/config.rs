//! 服务器配置，全部来自环境变量，缺省时使用默认值。

use std::net::SocketAddr;
use thiserror::Error;

pub const BIND_VAR: &str = "POKER_RELAY_BIND";
pub const LOG_VAR: &str = "POKER_RELAY_LOG";
pub const CHANNEL_CAPACITY_VAR: &str = "POKER_RELAY_CHANNEL_CAPACITY";
pub const MAX_ROOMS_VAR: &str = "POKER_RELAY_MAX_ROOMS";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} has invalid value {value:?}: {reason}")]
    Invalid { var: &'static str, value: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// 监听地址
    pub bind: SocketAddr,
    /// 默认日志过滤器，`RUST_LOG` 优先
    pub log_level: String,
    /// 消息总线广播通道的容量
    pub channel_capacity: usize,
    /// 同时存在的房间数上限
    pub max_rooms: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: SocketAddr::from(([0, 0, 0, 0], 25917)),
            log_level: "info".to_string(),
            channel_capacity: 256,
            max_rooms: 64,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// 用任意的查找函数读取配置，便于测试
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = ServerConfig::default();
        Ok(ServerConfig {
            bind: parse(&lookup, BIND_VAR)?.unwrap_or(defaults.bind),
            log_level: lookup(LOG_VAR).unwrap_or(defaults.log_level),
            channel_capacity: positive(&lookup, CHANNEL_CAPACITY_VAR)?.unwrap_or(defaults.channel_capacity),
            max_rooms: positive(&lookup, MAX_ROOMS_VAR)?.unwrap_or(defaults.max_rooms),
        })
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    lookup(var)
        .map(|value| {
            value.parse().map_err(|e: T::Err| ConfigError::Invalid { var, reason: e.to_string(), value })
        })
        .transpose()
}

fn positive(lookup: &impl Fn(&str) -> Option<String>, var: &'static str) -> Result<Option<usize>, ConfigError> {
    match parse::<usize>(lookup, var)? {
        Some(0) => Err(ConfigError::Invalid { var, value: "0".to_string(), reason: "must be positive".to_string() }),
        other => Ok(other),
    }
}
