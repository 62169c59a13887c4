//! 单个 WebSocket 连接：维护本连接的订阅，把总线上匹配的消息转发给客户端，
//! 把客户端的发布送进总线或者当作命令执行。

use crate::broker::{topic_matches, validate_filter, validate_topic, Publication};
use crate::dispatch::{handle_command, ERROR_TOPIC};
use crate::SharedState;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures_util::{stream::StreamExt, SinkExt};
use poker_relay_core::{ClientMessage, Command, ServerMessage, COMMAND_TOPIC};
use tokio::sync::{broadcast::error::RecvError, mpsc};
use tracing::{debug, info, warn};

/// 处理 WebSocket 连接请求
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// 处理单个 WebSocket 连接的生命周期
async fn handle_socket(socket: WebSocket, state: SharedState) {
    let (mut sender, mut receiver) = socket.split();

    // 所有发往客户端的消息都经过这个通道，由单独的任务写入 WebSocket
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(32);
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let payload = match serde_json::to_string(&msg) {
                Ok(payload) => payload,
                Err(e) => {
                    warn!("序列化消息失败: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(payload.into())).await.is_err() {
                // 发送失败，说明客户端已断开
                break;
            }
        }
    });

    let mut bus = state.broker.subscribe();
    let mut filters: Vec<String> = Vec::new();
    info!("客户端已连接");

    loop {
        tokio::select! {
            incoming = receiver.next() => {
                let text = match incoming {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        warn!("读取连接失败: {}", e);
                        break;
                    }
                };
                match serde_json::from_str::<ClientMessage>(text.as_str()) {
                    Ok(msg) => handle_client_message(msg, &state, &tx, &mut filters).await,
                    Err(e) => {
                        warn!("解析消息失败: {}", e);
                        let _ = tx.send(ServerMessage::Error { message: format!("malformed frame: {e}") }).await;
                    }
                }
            }
            publication = bus.recv() => match publication {
                Ok(publication) => {
                    if let Some(msg) = deliver(&filters, publication) {
                        let _ = tx.send(msg).await;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "连接处理太慢，丢弃了部分消息");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    info!("客户端连接关闭");
}

/// 只有匹配本连接某个订阅的消息才转发
fn deliver(filters: &[String], publication: Publication) -> Option<ServerMessage> {
    let Publication { topic, payload } = publication;
    filters
        .iter()
        .any(|f| topic_matches(f, &topic))
        .then_some(ServerMessage::Publish { topic, payload })
}

async fn handle_client_message(
    msg: ClientMessage,
    state: &SharedState,
    tx: &mpsc::Sender<ServerMessage>,
    filters: &mut Vec<String>,
) {
    match msg {
        ClientMessage::Subscribe { filter } => match validate_filter(&filter) {
            Ok(()) => {
                debug!(%filter, "订阅");
                if !filters.contains(&filter) {
                    filters.push(filter.clone());
                }
                let _ = tx.send(ServerMessage::Subscribed { filter }).await;
            }
            Err(e) => {
                let _ = tx.send(ServerMessage::Error { message: e.to_string() }).await;
            }
        },
        ClientMessage::Unsubscribe { filter } => {
            filters.retain(|f| *f != filter);
        }
        ClientMessage::Publish { topic, payload } if topic == COMMAND_TOPIC => {
            match payload.parse::<Command>() {
                Ok(command) => {
                    for publication in handle_command(state, command).await {
                        state.broker.publish(publication);
                    }
                }
                Err(e) => {
                    warn!(%payload, error = %e, "无法解析命令");
                    state.broker.publish(Publication::new(ERROR_TOPIC, format!("{payload}: {e}")));
                    let _ = tx.send(ServerMessage::Error { message: e.to_string() }).await;
                }
            }
        }
        ClientMessage::Publish { topic, payload } => match validate_topic(&topic) {
            Ok(()) => state.broker.publish(Publication::new(topic, payload)),
            Err(e) => {
                let _ = tx.send(ServerMessage::Error { message: e.to_string() }).await;
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::AppState;
    use std::sync::Arc;
    use tokio::sync::broadcast;

    struct Harness {
        state: SharedState,
        tx: mpsc::Sender<ServerMessage>,
        rx: mpsc::Receiver<ServerMessage>,
        bus: broadcast::Receiver<Publication>,
        filters: Vec<String>,
    }

    fn harness() -> Harness {
        let state = Arc::new(AppState::new(ServerConfig::default()));
        let bus = state.broker.subscribe();
        let (tx, rx) = mpsc::channel(32);
        Harness { state, tx, rx, bus, filters: Vec::new() }
    }

    impl Harness {
        async fn send(&mut self, msg: ClientMessage) {
            handle_client_message(msg, &self.state, &self.tx, &mut self.filters).await;
        }
    }

    fn subscribe(filter: &str) -> ClientMessage {
        ClientMessage::Subscribe { filter: filter.to_string() }
    }

    fn publish(topic: &str, payload: &str) -> ClientMessage {
        ClientMessage::Publish { topic: topic.to_string(), payload: payload.to_string() }
    }

    #[tokio::test]
    async fn test_subscribe_is_acknowledged_once_per_filter() {
        let mut h = harness();
        h.send(subscribe("rooms/3/#")).await;
        h.send(subscribe("rooms/3/#")).await;
        assert_eq!(h.filters, vec!["rooms/3/#".to_string()]);
        for _ in 0..2 {
            assert_eq!(h.rx.try_recv().unwrap(), ServerMessage::Subscribed { filter: "rooms/3/#".to_string() });
        }
    }

    #[tokio::test]
    async fn test_invalid_filter_is_rejected() {
        let mut h = harness();
        h.send(subscribe("rooms/#/pot")).await;
        assert!(h.filters.is_empty());
        assert!(matches!(h.rx.try_recv().unwrap(), ServerMessage::Error { .. }));
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery() {
        let mut h = harness();
        h.send(subscribe("rooms/+/pot")).await;
        let publication = Publication::new("rooms/3/pot", 150);
        assert_eq!(
            deliver(&h.filters, publication.clone()),
            Some(ServerMessage::Publish { topic: "rooms/3/pot".to_string(), payload: "150".to_string() })
        );
        assert_eq!(deliver(&h.filters, Publication::new("rooms/3/phase", "flop")), None);

        h.send(ClientMessage::Unsubscribe { filter: "rooms/+/pot".to_string() }).await;
        assert!(h.filters.is_empty());
        assert_eq!(deliver(&h.filters, publication), None);
    }

    #[tokio::test]
    async fn test_publish_is_relayed() {
        let mut h = harness();
        h.send(publish("chat/lobby", "hello")).await;
        assert_eq!(h.bus.try_recv().unwrap(), Publication::new("chat/lobby", "hello"));
        assert!(h.rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_wildcard_publish_topic_is_rejected() {
        let mut h = harness();
        h.send(publish("rooms/+/pot", "150")).await;
        assert!(matches!(h.rx.try_recv().unwrap(), ServerMessage::Error { .. }));
        assert!(h.bus.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_undecodable_command_goes_to_errors_and_sender() {
        let mut h = harness();
        h.send(publish(COMMAND_TOPIC, "fold 3")).await;

        let publication = h.bus.try_recv().unwrap();
        assert_eq!(publication.topic, ERROR_TOPIC);
        assert!(publication.payload.starts_with("fold 3:"), "{}", publication.payload);
        assert_eq!(h.rx.try_recv().unwrap(), ServerMessage::Error { message: "unknown command \"fold\"".to_string() });
    }

    #[tokio::test]
    async fn test_command_results_are_published() {
        let mut h = harness();
        h.send(publish(COMMAND_TOPIC, "create_game 3,2,1000")).await;
        let topics: Vec<String> = std::iter::from_fn(|| h.bus.try_recv().ok()).map(|p| p.topic).collect();
        assert_eq!(topics, vec![
            "rooms/3/create_success",
            "rooms/3/num_players",
            "rooms/3/starting_cash",
            "rooms/3/term_pass",
        ]);
        assert!(h.rx.try_recv().is_err());
    }
}
