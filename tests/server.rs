use chess_duel::config::{PlayerConfig, ServerConfig};
use chess_duel::protocol::{encode, Endpoint, Message};
use chess_duel::transport::FrameReader;
use chess_duel::{player, server, Move, Square};
use futures::SinkExt;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::time::timeout;
use websocket::{ClientBuilder, WebSocketStream};

const STEP: Duration = Duration::from_secs(5);

fn sq(name: &str) -> Square {
    name.parse().unwrap()
}

async fn start_server(config: ServerConfig) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    tokio::spawn(server::serve(listener, config));
    addr
}

fn quiet_config() -> ServerConfig {
    ServerConfig {
        ping_interval: Duration::from_secs(3600),
        ..ServerConfig::default()
    }
}

async fn connect(addr: &str) -> FrameReader<WebSocketStream<impl AsyncRead + AsyncWrite + Unpin>> {
    let (socket, _) = ClientBuilder::new()
        .uri(&format!("ws://{addr}"))
        .unwrap()
        .connect()
        .await
        .unwrap();
    FrameReader::new(socket, Endpoint::Client)
}

async fn send<S>(client: &mut FrameReader<WebSocketStream<S>>, msg: Message)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let frame = encode(&msg, Endpoint::Client).unwrap();
    client.get_mut().send(websocket::Message::binary(frame)).await.unwrap();
}

async fn recv<S>(client: &mut FrameReader<WebSocketStream<S>>) -> Message
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    timeout(STEP, client.read_message())
        .await
        .expect("server did not answer in time")
        .unwrap()
}

#[tokio::test]
async fn test_two_players_start_and_move() {
    let addr = start_server(quiet_config()).await;
    let mut one = connect(&addr).await;
    let mut two = connect(&addr).await;

    send(&mut one, Message::Join { player: true }).await;
    assert_eq!(recv(&mut one).await, Message::Player { one: true });

    send(&mut two, Message::Join { player: true }).await;
    assert_eq!(recv(&mut two).await, Message::Player { one: false });
    assert_eq!(recv(&mut two).await, Message::OpponentJoined);
    assert_eq!(recv(&mut one).await, Message::OpponentJoined);

    send(&mut one, Message::NewGame).await;
    let one_color = match recv(&mut one).await {
        Message::Team { color } => color,
        other => panic!("expected a team, got {other:?}"),
    };
    assert_eq!(recv(&mut two).await, Message::Team { color: one_color.opposite() });

    let (white, black) = if one_color == chess_duel::Color::White {
        (&mut one, &mut two)
    } else {
        (&mut two, &mut one)
    };
    let opening = Message::Move(Move::new(sq("e2"), sq("e4")));
    send(white, opening.clone()).await;
    assert_eq!(recv(white).await, opening);
    assert_eq!(recv(black).await, opening);
}

#[tokio::test]
async fn test_leaving_player_notifies_opponent() {
    let addr = start_server(quiet_config()).await;
    let mut one = connect(&addr).await;
    let mut two = connect(&addr).await;

    send(&mut one, Message::Join { player: true }).await;
    assert_eq!(recv(&mut one).await, Message::Player { one: true });
    send(&mut two, Message::Join { player: true }).await;
    assert_eq!(recv(&mut two).await, Message::Player { one: false });
    assert_eq!(recv(&mut two).await, Message::OpponentJoined);

    drop(one);
    assert_eq!(recv(&mut two).await, Message::OpponentLeft);
}

#[tokio::test]
async fn test_flooding_client_is_dropped() {
    let addr = start_server(quiet_config()).await;
    let mut client = connect(&addr).await;

    for _ in 0..12 {
        send(&mut client, Message::Ping).await;
    }
    let closed = timeout(STEP, client.read_message())
        .await
        .expect("server kept the connection open");
    assert!(closed.is_err());
}

#[tokio::test]
async fn test_keep_alive_pings() {
    let addr = start_server(ServerConfig {
        ping_interval: Duration::from_millis(100),
        ..ServerConfig::default()
    })
    .await;
    let mut client = connect(&addr).await;
    assert_eq!(recv(&mut client).await, Message::Ping);
}

#[tokio::test]
async fn test_automated_players_play_each_other() {
    let addr = start_server(quiet_config()).await;

    let mut watcher = connect(&addr).await;
    send(&mut watcher, Message::Join { player: false }).await;
    // Any reply proves the join was processed
    send(&mut watcher, Message::NewGame).await;
    assert!(matches!(recv(&mut watcher).await, Message::Error { .. }));

    for seed in [1, 2] {
        let config = PlayerConfig {
            addr: addr.clone(),
            depth: 1,
            think_delay: Duration::from_millis(10),
            seed: Some(seed),
            ..PlayerConfig::default()
        };
        tokio::spawn(player::run(config));
    }

    let mut moves = 0;
    while moves < 4 {
        match timeout(Duration::from_secs(30), watcher.read_message())
            .await
            .expect("the players stopped moving")
            .unwrap()
        {
            Message::Move(_) => moves += 1,
            Message::GameComplete { .. } => break,
            _ => {}
        }
    }
    assert!(moves >= 4);
}

#[tokio::test]
async fn test_frames_split_across_websocket_messages() {
    let addr = start_server(quiet_config()).await;
    let mut client = connect(&addr).await;

    let mut bytes = encode(&Message::Join { player: true }, Endpoint::Client).unwrap();
    bytes.extend(encode(&Message::NewGame, Endpoint::Client).unwrap());
    let (head, tail) = bytes.split_at(1);
    client.get_mut().send(websocket::Message::binary(head.to_vec())).await.unwrap();
    client.get_mut().send(websocket::Message::binary(tail.to_vec())).await.unwrap();

    assert_eq!(recv(&mut client).await, Message::Player { one: true });
    assert_eq!(
        recv(&mut client).await,
        Message::Error {
            msg: "Need 2 players to play.".to_string()
        }
    );
}
