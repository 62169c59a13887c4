use futures_util::{SinkExt, StreamExt};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use url::Url;

use poker_relay_core::{ClientMessage, Command, ServerMessage, COMMAND_TOPIC};

const DEFAULT_URL: &str = "ws://127.0.0.1:25917/ws";

/// 一行用户输入的含义
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Send(ClientMessage),
    Usage(&'static str),
    Invalid(String),
    Exit,
    Nothing,
}

fn parse_input(line: &str) -> Input {
    let line = line.trim();
    let (head, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    match head {
        "" => Input::Nothing,
        "exit" => Input::Exit,
        "sub" if rest.is_empty() => Input::Usage("sub <主题过滤器>"),
        "sub" => Input::Send(ClientMessage::Subscribe { filter: rest.to_string() }),
        "unsub" if rest.is_empty() => Input::Usage("unsub <主题过滤器>"),
        "unsub" => Input::Send(ClientMessage::Unsubscribe { filter: rest.to_string() }),
        "pub" => match rest.split_once(char::is_whitespace) {
            Some((topic, payload)) => Input::Send(ClientMessage::Publish {
                topic: topic.to_string(),
                payload: payload.trim().to_string(),
            }),
            None => Input::Usage("pub <主题> <内容>"),
        },
        // 其余输入都当作游戏命令，先在本地检查格式
        _ => match line.parse::<Command>() {
            Ok(command) => Input::Send(ClientMessage::Publish {
                topic: COMMAND_TOPIC.to_string(),
                payload: command.to_string(),
            }),
            Err(e) => Input::Invalid(e.to_string()),
        },
    }
}

fn render(msg: &ServerMessage) -> String {
    match msg {
        ServerMessage::Publish { topic, payload } => format!("{topic} = {payload}"),
        ServerMessage::Subscribed { filter } => format!("已订阅 {filter}"),
        ServerMessage::Error { message } => format!("错误: {message}"),
    }
}

fn prompt() -> std::io::Result<()> {
    print!("> ");
    std::io::stdout().flush()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let url = Url::parse(&std::env::args().nth(1).unwrap_or_else(|| DEFAULT_URL.to_string()))?;

    println!("正在连接到: {}", url);
    let (ws_stream, _) = connect_async(url.as_str()).await?;
    println!("连接成功!");

    let (mut write, mut read) = ws_stream.split();

    // 启动一个任务来处理从服务器接收的消息
    tokio::spawn(async move {
        while let Some(msg) = read.next().await {
            match msg {
                Ok(Message::Text(text)) => match serde_json::from_str::<ServerMessage>(text.as_str()) {
                    Ok(server_msg) => {
                        println!("\n<-- {}", render(&server_msg));
                        let _ = prompt();
                    }
                    Err(e) => eprintln!("解析服务器消息失败: {}", e),
                },
                Ok(Message::Close(_)) => {
                    println!("\n服务器关闭了连接");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    eprintln!("接收消息时出错: {}", e);
                    break;
                }
            }
        }
    });

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    println!("--- 扑克消息客户端 ---");
    println!("可用命令:");
    println!("  sub <过滤器>              - 订阅主题，支持 + 和 # 通配符");
    println!("  unsub <过滤器>            - 取消订阅");
    println!("  pub <主题> <内容>         - 向主题发布消息");
    println!("  <游戏命令>                - 例如 create_user alice、bet 3,alice,100");
    println!("  exit                      - 退出");

    loop {
        prompt()?;
        let Some(line) = stdin.next_line().await? else {
            break;
        };

        match parse_input(&line) {
            Input::Send(msg) => {
                let payload = serde_json::to_string(&msg)?;
                write.send(Message::Text(payload.into())).await?;
            }
            Input::Usage(usage) => println!("用法: {}", usage),
            Input::Invalid(reason) => println!("无效命令: {}", reason),
            Input::Exit => {
                println!("正在断开连接...");
                break;
            }
            Input::Nothing => {}
        }
    }

    write.send(Message::Close(None)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subscriptions() {
        assert_eq!(
            parse_input("sub rooms/3/#"),
            Input::Send(ClientMessage::Subscribe { filter: "rooms/3/#".to_string() })
        );
        assert_eq!(
            parse_input("  unsub users/+/token "),
            Input::Send(ClientMessage::Unsubscribe { filter: "users/+/token".to_string() })
        );
        assert!(matches!(parse_input("sub"), Input::Usage(_)));
    }

    #[test]
    fn test_parse_publish() {
        assert_eq!(
            parse_input("pub chat/lobby hello there"),
            Input::Send(ClientMessage::Publish { topic: "chat/lobby".to_string(), payload: "hello there".to_string() })
        );
        assert!(matches!(parse_input("pub chat/lobby"), Input::Usage(_)));
    }

    #[test]
    fn test_parse_game_commands() {
        assert_eq!(
            parse_input("bet 3, alice, 100"),
            Input::Send(ClientMessage::Publish {
                topic: COMMAND_TOPIC.to_string(),
                payload: "bet 3,alice,100".to_string(),
            })
        );
        assert!(matches!(parse_input("bet 3,alice"), Input::Invalid(_)));
        assert!(matches!(parse_input("fold 3"), Input::Invalid(_)));
        assert_eq!(parse_input("exit"), Input::Exit);
        assert_eq!(parse_input("   "), Input::Nothing);
    }

    #[test]
    fn test_render() {
        let msg = ServerMessage::Publish { topic: "rooms/3/pot".to_string(), payload: "150".to_string() };
        assert_eq!(render(&msg), "rooms/3/pot = 150");
    }
}
