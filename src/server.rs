use crate::config::ServerConfig;
use crate::protocol::{Endpoint, Message, Outbox, ProtocolError, WRITE_TIMEOUT};
use crate::session::{ConnId, GameSession, Outgoing};
use crate::transport::{run_writer, FrameReader};
use anyhow::Context;
use futures::{Stream, StreamExt};
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use websocket::ServerBuilder;

const EVENT_QUEUE: usize = 256;

#[derive(Debug)]
enum SessionEvent {
    Connected { conn: ConnId, outbox: Outbox },
    Message { conn: ConnId, msg: Message },
    Disconnected { conn: ConnId },
    KeepAlive,
}

#[derive(Error, Debug)]
enum ConnectionError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("no frame received for {0:?}")]
    Idle(Duration),

    #[error("more than {limit} messages within {window:?}")]
    RateLimited { limit: usize, window: Duration },
}

/// Sliding-window message counter.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    limit: usize,
    window: Duration,
    hits: VecDeque<Instant>,
}

impl RateLimiter {
    pub fn new(limit: usize, window: Duration) -> Self {
        Self {
            limit,
            window,
            hits: VecDeque::with_capacity(limit + 1),
        }
    }

    /// Records a message at `now`. Returns false once more than `limit`
    /// messages fall inside the window ending at `now`.
    pub fn allow(&mut self, now: Instant) -> bool {
        while let Some(&oldest) = self.hits.front() {
            if now.saturating_duration_since(oldest) >= self.window {
                self.hits.pop_front();
            } else {
                break;
            }
        }
        self.hits.push_back(now);
        self.hits.len() <= self.limit
    }
}

/// Binds `config.addr` and serves until the process is stopped.
pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    info!(addr = %config.addr, "listening");
    serve(listener, config).await
}

/// Accepts WebSocket connections on an already bound listener.
///
/// One actor task owns the session. Each connection forwards decoded
/// messages to it and drains its own `Outbox` in a writer task, so the
/// session never needs a lock.
pub async fn serve(listener: TcpListener, config: ServerConfig) -> anyhow::Result<()> {
    let (events, inbox) = mpsc::channel(EVENT_QUEUE);
    tokio::spawn(run_session(GameSession::new(), inbox));
    tokio::spawn(keep_alive(events.clone(), config.ping_interval));

    let mut next_conn: ConnId = 0;
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(err) => {
                warn!(%err, "accept failed");
                continue;
            }
        };
        next_conn += 1;
        let conn = next_conn;
        if let Err(err) = stream.set_nodelay(true) {
            debug!(conn, %err, "could not disable nagle");
        }
        info!(conn, %peer, "connected");
        tokio::spawn(handle_connection(stream, conn, events.clone(), config.clone()));
    }
}

async fn run_session(mut session: GameSession, mut events: mpsc::Receiver<SessionEvent>) {
    let mut outboxes: HashMap<ConnId, Outbox> = HashMap::new();

    while let Some(event) = events.recv().await {
        let outgoing = match event {
            SessionEvent::Connected { conn, outbox } => {
                outboxes.insert(conn, outbox);
                continue;
            }
            // Frames still in flight from a connection already dropped
            SessionEvent::Message { conn, .. } if !outboxes.contains_key(&conn) => continue,
            SessionEvent::Message { conn, msg } => session.handle(conn, msg),
            SessionEvent::Disconnected { conn } => {
                outboxes.remove(&conn);
                session.disconnect(conn)
            }
            SessionEvent::KeepAlive => outboxes
                .keys()
                .map(|&to| Outgoing { to, msg: Message::Ping })
                .collect(),
        };
        deliver(&mut session, &mut outboxes, outgoing);
    }
}

fn deliver(session: &mut GameSession, outboxes: &mut HashMap<ConnId, Outbox>, outgoing: Vec<Outgoing>) {
    let mut queue = VecDeque::from(outgoing);
    while let Some(Outgoing { to, msg }) = queue.pop_front() {
        let outbox = match outboxes.get(&to) {
            Some(outbox) => outbox,
            None => continue,
        };
        if let Err(err) = outbox.send(&msg) {
            // Dropping the outbox ends the writer, which tears the
            // connection down
            warn!(conn = to, %err, "dropping connection");
            outboxes.remove(&to);
            queue.extend(session.disconnect(to));
        }
    }
}

async fn keep_alive(events: mpsc::Sender<SessionEvent>, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    ticker.tick().await;
    loop {
        ticker.tick().await;
        if events.send(SessionEvent::KeepAlive).await.is_err() {
            break;
        }
    }
}

async fn handle_connection(stream: TcpStream, conn: ConnId, events: mpsc::Sender<SessionEvent>, config: ServerConfig) {
    let socket = match tokio::time::timeout(config.read_timeout, ServerBuilder::new().accept(stream)).await {
        Ok(Ok(socket)) => socket,
        Ok(Err(err)) => {
            warn!(conn, %err, "websocket handshake failed");
            return;
        }
        Err(_) => {
            warn!(conn, "websocket handshake timed out");
            return;
        }
    };
    let (sink, stream) = socket.split();

    let (outbox, frames) = Outbox::channel(Endpoint::Server, config.outbox_capacity);
    if events.send(SessionEvent::Connected { conn, outbox }).await.is_err() {
        return;
    }

    let mut writer = tokio::spawn(run_writer(sink, frames, WRITE_TIMEOUT));
    let reader = read_loop(FrameReader::new(stream, Endpoint::Server), conn, &events, &config);

    tokio::select! {
        result = reader => match result {
            Ok(()) => info!(conn, "disconnected"),
            Err(err) => warn!(conn, %err, "connection closed"),
        },
        result = &mut writer => match result {
            Ok(Ok(())) => debug!(conn, "writer finished"),
            Ok(Err(err)) => warn!(conn, %err, "write failed"),
            Err(err) => warn!(conn, %err, "writer task failed"),
        },
    }

    writer.abort();
    let _ = events.send(SessionEvent::Disconnected { conn }).await;
}

async fn read_loop<R>(
    mut reader: FrameReader<R>,
    conn: ConnId,
    events: &mpsc::Sender<SessionEvent>,
    config: &ServerConfig,
) -> Result<(), ConnectionError>
where
    R: Stream<Item = Result<websocket::Message, websocket::Error>> + Unpin,
{
    let mut limiter = RateLimiter::new(config.rate_limit, config.rate_window);
    loop {
        let msg = match tokio::time::timeout(config.read_timeout, reader.read_message()).await {
            Ok(Ok(msg)) => msg,
            Ok(Err(err)) if err.is_eof() => return Ok(()),
            Ok(Err(err)) => return Err(err.into()),
            Err(_) => return Err(ConnectionError::Idle(config.read_timeout)),
        };

        if !limiter.allow(Instant::now()) {
            return Err(ConnectionError::RateLimited {
                limit: config.rate_limit,
                window: config.rate_window,
            });
        }

        if events.send(SessionEvent::Message { conn, msg }).await.is_err() {
            return Ok(());
        }
    }
}
