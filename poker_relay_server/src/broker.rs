//! 进程内的发布/订阅总线。
//!
//! 所有发布都进入同一个广播通道，每个连接按自己的订阅过滤器挑选。
//! 过滤器语义与 MQTT 相同：`+` 匹配一层，末尾的 `#` 匹配剩余所有层。

use crate::error::RelayError;
use tokio::sync::broadcast;

/// 一条发布在某个主题上的消息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    pub topic: String,
    pub payload: String,
}

impl Publication {
    pub fn new(topic: impl Into<String>, payload: impl ToString) -> Publication {
        Publication { topic: topic.into(), payload: payload.to_string() }
    }
}

pub struct Broker {
    sender: broadcast::Sender<Publication>,
}

impl Broker {
    pub fn new(capacity: usize) -> Broker {
        let (sender, _) = broadcast::channel(capacity);
        Broker { sender }
    }

    /// 发布一条消息。没有任何订阅者时消息直接丢弃
    pub fn publish(&self, publication: Publication) {
        tracing::debug!(topic = %publication.topic, "发布消息");
        let _ = self.sender.send(publication);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Publication> {
        self.sender.subscribe()
    }
}

/// 检查订阅过滤器：`#` 只能作为最后一层，通配符必须独占一层
pub fn validate_filter(filter: &str) -> Result<(), RelayError> {
    let levels: Vec<&str> = filter.split('/').collect();
    let last = levels.len() - 1;
    let valid = !filter.is_empty()
        && levels.iter().enumerate().all(|(i, level)| match *level {
            "#" => i == last,
            "+" => true,
            other => !other.contains(['+', '#']),
        });
    if valid {
        Ok(())
    } else {
        Err(RelayError::InvalidFilter(filter.to_string()))
    }
}

/// 发布用的主题不能含通配符
pub fn validate_topic(topic: &str) -> Result<(), RelayError> {
    if topic.is_empty() || topic.contains(['+', '#']) {
        return Err(RelayError::InvalidFilter(topic.to_string()));
    }
    Ok(())
}

pub fn topic_matches(filter: &str, topic: &str) -> bool {
    let mut filter_levels = filter.split('/');
    let mut topic_levels = topic.split('/');
    loop {
        match (filter_levels.next(), topic_levels.next()) {
            (Some("#"), _) => return true,
            (Some("+"), Some(_)) => {}
            (Some(f), Some(t)) if f == t => {}
            (None, None) => return true,
            _ => return false,
        }
    }
}
