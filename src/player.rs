use crate::board::{Board, Color, Piece, PieceKind};
use crate::config::PlayerConfig;
use crate::movegen::Move;
use crate::protocol::{Endpoint, GameResult, Message, Outbox, ProtocolError, WRITE_TIMEOUT};
use crate::search::Search;
use crate::transport::{run_writer, FrameReader};
use anyhow::Context;
use futures::{Stream, StreamExt};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use websocket::{ClientBuilder, WebSocketStream};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Seat {
    Unseated,
    Joining,
    Seated { one: bool },
}

/// Position handed to a background search.
#[derive(Debug, Clone)]
pub struct SearchJob {
    pub board: Board,
    pub color: Color,
    pub generation: u64,
}

/// Mirrors the server's game from the messages it receives and decides when
/// a search is due. Holds no I/O; `play` drives it.
#[derive(Debug)]
pub struct AutoPlayer {
    seat: Seat,
    color: Option<Color>,
    board: Option<Board>,
    to_move: Color,
    // Bumped whenever the mirrored board changes
    generation: u64,
    // Generation the last search was started from
    attempted: Option<u64>,
}

impl Default for AutoPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl AutoPlayer {
    pub fn new() -> Self {
        Self {
            seat: Seat::Unseated,
            color: None,
            board: None,
            to_move: Color::White,
            generation: 0,
            attempted: None,
        }
    }

    /// A `Join` to send when the player holds no seat and is not already
    /// waiting for one.
    pub fn join_request(&mut self) -> Option<Message> {
        if self.seat != Seat::Unseated {
            return None;
        }
        self.seat = Seat::Joining;
        Some(Message::Join { player: true })
    }

    /// Updates the mirror from a server message and returns the replies.
    pub fn handle(&mut self, msg: Message) -> Vec<Message> {
        match msg {
            Message::Player { one } => {
                info!(one, "seated");
                self.seat = Seat::Seated { one };
            }
            Message::Team { color } => {
                info!(%color, "new game");
                self.color = Some(color);
                self.board = Some(Board::new());
                self.to_move = Color::White;
                self.touch();
            }
            Message::Move(mv) => match self.board.as_mut() {
                Some(board) => {
                    board.apply(mv);
                    self.to_move = self.to_move.opposite();
                    self.touch();
                }
                None => debug!(?mv, "move without a game"),
            },
            Message::Promote { square, piece: None } => {
                if let Some(color) = self.color {
                    return vec![Message::Promote {
                        square,
                        piece: Some(Piece::new(PieceKind::Queen, color)),
                    }];
                }
            }
            Message::Promote {
                square,
                piece: Some(piece),
            } => {
                if let Some(board) = self.board.as_mut() {
                    if let Err(err) = board.promote(square, piece) {
                        warn!(%err, %square, "promotion out of sync");
                    }
                    self.touch();
                }
            }
            Message::OpponentJoined => {
                info!("opponent joined");
                return vec![Message::NewGame];
            }
            Message::GameComplete { result } => {
                match result {
                    GameResult::Stalemate => info!("game complete, stalemate"),
                    GameResult::WhiteWin => info!("game complete, white wins"),
                    GameResult::BlackWin => info!("game complete, black wins"),
                }
                self.end_game();
                if self.is_player_one() {
                    return vec![Message::NewGame];
                }
            }
            Message::OpponentLeft => {
                info!("opponent left, rejoining");
                self.end_game();
                self.seat = Seat::Unseated;
            }
            Message::Error { msg } => {
                warn!(%msg, "server error");
                match self.seat {
                    Seat::Joining => self.seat = Seat::Unseated,
                    // A rejected move gets searched again
                    _ => self.attempted = None,
                }
            }
            Message::Ping => return vec![Message::Ping],
            Message::Join { .. } | Message::NewGame => debug!(?msg, "ignored"),
        }
        Vec::new()
    }

    /// The position to search, if it is our turn and the current board has
    /// not been searched yet. Marks the board as attempted.
    pub fn next_search(&mut self) -> Option<SearchJob> {
        let color = self.color?;
        let board = self.board.as_ref()?;
        if self.to_move != color || self.attempted == Some(self.generation) || board.pending_promotion().is_some() {
            return None;
        }
        self.attempted = Some(self.generation);
        Some(SearchJob {
            board: board.clone(),
            color,
            generation: self.generation,
        })
    }

    /// Turns a finished search into the message to send. Results for a
    /// board that has since changed are dropped.
    pub fn finish_search(&mut self, generation: u64, result: Option<Move>) -> Option<Message> {
        if generation != self.generation || self.board.is_none() {
            debug!(generation, current = self.generation, "discarding stale search");
            return None;
        }
        match result {
            Some(mv) => Some(Message::Move(mv)),
            None => {
                info!("no legal move left");
                None
            }
        }
    }

    fn touch(&mut self) {
        self.generation += 1;
    }

    fn end_game(&mut self) {
        self.board = None;
        self.color = None;
        self.touch();
    }

    pub fn is_seated(&self) -> bool {
        matches!(self.seat, Seat::Seated { .. })
    }

    pub fn is_player_one(&self) -> bool {
        self.seat == Seat::Seated { one: true }
    }

    pub fn color(&self) -> Option<Color> {
        self.color
    }

    pub fn board(&self) -> Option<&Board> {
        self.board.as_ref()
    }

    pub fn is_my_turn(&self) -> bool {
        self.board.is_some() && self.color == Some(self.to_move)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

struct InFlight {
    generation: u64,
    task: JoinHandle<Option<Move>>,
}

/// Connects to the server at `ws://{config.addr}` and plays until it goes
/// away.
pub async fn run(config: PlayerConfig) -> anyhow::Result<()> {
    let url = format!("ws://{}", config.addr);
    let (socket, _) = ClientBuilder::new()
        .uri(&url)
        .with_context(|| format!("invalid server address {}", config.addr))?
        .connect()
        .await
        .with_context(|| format!("failed to connect to {url}"))?;
    info!(%url, depth = config.depth, "connected");
    play(socket, config).await
}

/// Plays over an established WebSocket. Decoded frames arrive from a reader
/// task, searches run on the blocking pool and this loop is the only owner
/// of the mirrored board.
pub async fn play<S>(socket: WebSocketStream<S>, config: PlayerConfig) -> anyhow::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (sink, stream) = socket.split();
    let (outbox, frames) = Outbox::channel(Endpoint::Client, config.outbox_capacity);
    let writer = tokio::spawn(run_writer(sink, frames, WRITE_TIMEOUT));

    let (inbox_tx, mut inbox) = mpsc::channel(config.outbox_capacity);
    let reader = tokio::spawn(read_frames(
        FrameReader::new(stream, Endpoint::Client),
        inbox_tx,
        config.read_timeout,
    ));

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut player = AutoPlayer::new();
    let mut in_flight: Option<InFlight> = None;
    let mut rejoin = tokio::time::interval(config.rejoin_interval);

    let result: anyhow::Result<()> = 'session: loop {
        if in_flight.is_none() {
            if let Some(job) = player.next_search() {
                let search = Search::with_seed(rng.gen());
                in_flight = Some(InFlight {
                    generation: job.generation,
                    task: tokio::spawn(think(search, job, config.depth, config.think_delay)),
                });
            }
        }

        let mut replies = Vec::new();
        tokio::select! {
            frame = inbox.recv() => match frame {
                Some(Ok(msg)) => replies = player.handle(msg),
                Some(Err(err)) if err.is_eof() => break 'session Ok(()),
                Some(Err(err)) => break 'session Err(anyhow::Error::new(err).context("connection lost")),
                None => break 'session Ok(()),
            },
            _ = rejoin.tick() => replies.extend(player.join_request()),
            done = async {
                match in_flight.as_mut() {
                    Some(flight) => (&mut flight.task).await,
                    None => std::future::pending().await,
                }
            }, if in_flight.is_some() => {
                let generation = in_flight.take().map_or(0, |flight| flight.generation);
                match done {
                    Ok(choice) => replies.extend(player.finish_search(generation, choice)),
                    Err(err) => warn!(%err, "search task failed"),
                }
            }
        }

        for reply in &replies {
            if let Err(err) = outbox.send(reply) {
                break 'session Err(anyhow::Error::new(err).context("failed to queue reply"));
            }
        }
    };

    if let Some(flight) = in_flight {
        flight.task.abort();
    }
    reader.abort();
    drop(outbox);
    let _ = writer.await;
    info!("disconnected");
    result
}

async fn think(mut search: Search, job: SearchJob, depth: u32, delay: Duration) -> Option<Move> {
    tokio::time::sleep(delay).await;
    let SearchJob { board, color, .. } = job;
    search.set_max_depth(depth);
    let searched = tokio::task::spawn_blocking(move || {
        let choice = search.find_best_move(&board, color);
        debug!(nodes = search.get_nodes_searched(), depth = search.max_depth(), "search done");
        choice
    });
    match searched.await {
        Ok(choice) => choice,
        Err(err) => {
            warn!(%err, "search panicked");
            None
        }
    }
}

async fn read_frames<R>(mut reader: FrameReader<R>, frames: mpsc::Sender<Result<Message, ProtocolError>>, idle: Duration)
where
    R: Stream<Item = Result<websocket::Message, websocket::Error>> + Unpin,
{
    loop {
        let frame = match tokio::time::timeout(idle, reader.read_message()).await {
            Ok(frame) => frame,
            Err(_) => Err(io::Error::new(io::ErrorKind::TimedOut, "server went quiet").into()),
        };
        let failed = frame.is_err();
        if frames.send(frame).await.is_err() || failed {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Square;

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    fn playing(color: Color) -> AutoPlayer {
        let mut player = AutoPlayer::new();
        player.join_request();
        player.handle(Message::Player { one: true });
        player.handle(Message::Team { color });
        player
    }

    #[test]
    fn test_joins_once_until_answered() {
        let mut player = AutoPlayer::new();
        assert_eq!(player.join_request(), Some(Message::Join { player: true }));
        assert_eq!(player.join_request(), None);

        // Refused, so it asks again on the next attempt
        player.handle(Message::Error {
            msg: "All player slots filled.".to_string(),
        });
        assert_eq!(player.join_request(), Some(Message::Join { player: true }));

        player.handle(Message::Player { one: false });
        assert!(player.is_seated());
        assert!(!player.is_player_one());
        assert_eq!(player.join_request(), None);
    }

    #[test]
    fn test_replies() {
        let mut player = playing(Color::Black);
        assert_eq!(player.handle(Message::Ping), vec![Message::Ping]);
        assert_eq!(player.handle(Message::OpponentJoined), vec![Message::NewGame]);
        assert_eq!(
            player.handle(Message::Promote {
                square: sq("h1"),
                piece: None
            }),
            vec![Message::Promote {
                square: sq("h1"),
                piece: Some(Piece::new(PieceKind::Queen, Color::Black))
            }]
        );
    }

    #[test]
    fn test_searches_only_on_own_turn() {
        let mut white = playing(Color::White);
        let job = white.next_search().unwrap();
        assert_eq!(job.color, Color::White);
        assert_eq!(job.board, Board::new());
        // Already attempted for this board
        assert!(white.next_search().is_none());

        let mut black = playing(Color::Black);
        assert!(black.next_search().is_none());
        black.handle(Message::Move(Move::new(sq("e2"), sq("e4"))));
        assert!(black.is_my_turn());
        let job = black.next_search().unwrap();
        assert_eq!(job.board.get(sq("e4")).map(|p| p.color), Some(Color::White));
    }

    #[test]
    fn test_stale_search_is_dropped() {
        let mut player = playing(Color::White);
        let job = player.next_search().unwrap();
        let mv = Move::new(sq("e2"), sq("e4"));

        // The game restarted while the search was running
        player.handle(Message::Team { color: Color::White });
        assert_eq!(player.finish_search(job.generation, Some(mv)), None);

        let job = player.next_search().unwrap();
        assert_eq!(player.finish_search(job.generation, Some(mv)), Some(Message::Move(mv)));
    }

    #[test]
    fn test_rejected_move_is_searched_again() {
        let mut player = playing(Color::White);
        assert!(player.next_search().is_some());
        assert!(player.next_search().is_none());
        player.handle(Message::Error {
            msg: "That's not legal.".to_string(),
        });
        assert!(player.next_search().is_some());
    }

    #[test]
    fn test_waits_for_pending_promotion() {
        let mut player = playing(Color::Black);
        // Walk a white pawn to the last rank
        let moves = [
            ("a2", "a4"),
            ("b7", "b5"),
            ("a4", "b5"),
            ("a7", "a6"),
            ("b5", "a6"),
            ("c8", "b7"),
            ("a6", "b7"),
            ("h7", "h6"),
            ("b7", "a8"),
        ];
        for (from, to) in moves {
            player.handle(Message::Move(Move::new(sq(from), sq(to))));
        }
        assert!(player.is_my_turn());
        assert!(player.next_search().is_none());

        player.handle(Message::Promote {
            square: sq("a8"),
            piece: Some(Piece::new(PieceKind::Queen, Color::White)),
        });
        assert!(player.next_search().is_some());
    }

    #[test]
    fn test_opponent_left_drops_seat_and_board() {
        let mut player = playing(Color::White);
        player.handle(Message::OpponentLeft);
        assert!(player.board().is_none());
        assert!(!player.is_seated());
        assert_eq!(player.join_request(), Some(Message::Join { player: true }));
    }

    #[test]
    fn test_game_complete_keeps_seat() {
        let mut player = playing(Color::White);
        let replies = player.handle(Message::GameComplete {
            result: GameResult::WhiteWin,
        });
        assert!(player.board().is_none());
        assert!(player.is_seated());
        assert!(player.next_search().is_none());
        // Player 1 asks for a rematch right away
        assert_eq!(replies, vec![Message::NewGame]);

        let mut second = AutoPlayer::new();
        second.join_request();
        second.handle(Message::Player { one: false });
        second.handle(Message::Team { color: Color::Black });
        let replies = second.handle(Message::GameComplete {
            result: GameResult::Stalemate,
        });
        assert!(replies.is_empty());
        assert!(second.is_seated());
    }
}
