use crate::board::{Board, Color, Piece, PieceKind, Square};
use crate::error::{ChessError, ChessResult};
use crate::movegen::{Move, MoveGenerator};
use crate::protocol::{GameResult, Message};
use crate::rules::GameState;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeSet;
use tracing::{debug, info};

pub type ConnId = u64;

/// A message addressed to one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing {
    pub to: ConnId,
    pub msg: Message,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Seat {
    conn: ConnId,
    color: Color,
}

#[derive(Debug, Clone)]
struct Game {
    board: Board,
    to_move: Color,
    // Color that owes a promotion choice
    promotion: Option<Color>,
}

/// The authoritative game: two player seats, the spectators and the live
/// board. `handle` validates each client message and returns what to
/// deliver; nothing here touches a socket.
pub struct GameSession {
    seats: [Option<Seat>; 2],
    spectators: BTreeSet<ConnId>,
    game: Option<Game>,
    move_generator: MoveGenerator,
    rng: StdRng,
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new()
    }
}

impl GameSession {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// A session whose color assignment is reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            seats: [None, None],
            spectators: BTreeSet::new(),
            game: None,
            move_generator: MoveGenerator::new(),
            rng,
        }
    }

    /// Processes one client message. Rule violations produce a single
    /// `Error` back to `conn` and leave the session untouched.
    pub fn handle(&mut self, conn: ConnId, msg: Message) -> Vec<Outgoing> {
        let mut out = Vec::new();
        let result = match msg {
            Message::Ping => Ok(()),
            Message::Join { player: true } => self.join_player(conn, &mut out),
            Message::Join { player: false } => self.join_spectator(conn),
            Message::NewGame => self.new_game(conn, &mut out),
            Message::Move(mv) => self.play(conn, mv, &mut out),
            Message::Promote { square, piece } => self.promote(conn, square, piece, &mut out),
            _ => Err(ChessError::UnexpectedMessage),
        };

        if let Err(err) = result {
            debug!(conn, %err, "rejected");
            out.push(Outgoing {
                to: conn,
                msg: Message::Error { msg: err.to_string() },
            });
        }
        out
    }

    /// Forgets `conn`. A departing player ends the game and frees both seats.
    pub fn disconnect(&mut self, conn: ConnId) -> Vec<Outgoing> {
        self.spectators.remove(&conn);
        if self.seat_of(conn).is_none() {
            return Vec::new();
        }

        let out = self
            .seats
            .iter()
            .flatten()
            .filter(|seat| seat.conn != conn)
            .map(|seat| Outgoing {
                to: seat.conn,
                msg: Message::OpponentLeft,
            })
            .collect();

        info!(conn, "player left, seats reset");
        self.seats = [None, None];
        self.game = None;
        out
    }

    fn join_player(&mut self, conn: ConnId, out: &mut Vec<Outgoing>) -> ChessResult<()> {
        if self.seat_of(conn).is_some() {
            return Err(ChessError::AlreadyPlayer);
        }

        match self.seats {
            [None, _] => {
                let color = if self.rng.gen_bool(0.5) { Color::White } else { Color::Black };
                self.seats[0] = Some(Seat { conn, color });
                self.spectators.remove(&conn);
                info!(conn, %color, "player 1 seated");
                out.push(Outgoing {
                    to: conn,
                    msg: Message::Player { one: true },
                });
            }
            [Some(first), None] => {
                let color = first.color.opposite();
                self.seats[1] = Some(Seat { conn, color });
                self.spectators.remove(&conn);
                info!(conn, %color, "player 2 seated");
                out.push(Outgoing {
                    to: conn,
                    msg: Message::Player { one: false },
                });
                for to in [first.conn, conn] {
                    out.push(Outgoing {
                        to,
                        msg: Message::OpponentJoined,
                    });
                }
            }
            [Some(_), Some(_)] => return Err(ChessError::SlotsFilled),
        }
        Ok(())
    }

    fn join_spectator(&mut self, conn: ConnId) -> ChessResult<()> {
        if self.seat_of(conn).is_some() {
            return Err(ChessError::AlreadyPlayer);
        }
        self.spectators.insert(conn);
        debug!(conn, "spectator joined");
        Ok(())
    }

    fn new_game(&mut self, conn: ConnId, out: &mut Vec<Outgoing>) -> ChessResult<()> {
        match self.seats[0] {
            Some(seat) if seat.conn == conn => {}
            _ => return Err(ChessError::NotPlayerOne),
        }
        let (first, second) = match self.seats {
            [Some(first), Some(second)] => (first, second),
            _ => return Err(ChessError::NeedTwoPlayers),
        };
        if self.game.is_some() {
            return Err(ChessError::GameAlreadyStarted);
        }

        self.game = Some(Game {
            board: Board::new(),
            to_move: Color::White,
            promotion: None,
        });
        info!("new game started");
        for seat in [first, second] {
            out.push(Outgoing {
                to: seat.conn,
                msg: Message::Team { color: seat.color },
            });
        }
        Ok(())
    }

    fn play(&mut self, conn: ConnId, mv: Move, out: &mut Vec<Outgoing>) -> ChessResult<()> {
        let seat = self.seat_of(conn);
        let game = self.game.as_mut().ok_or(ChessError::GameNotStarted)?;
        let color = seat.ok_or(ChessError::NotAPlayer)?.color;

        if let Some(owed) = game.promotion {
            return Err(ChessError::PromotionPending { color: owed });
        }
        if game.to_move != color {
            return Err(ChessError::NotYourTurn);
        }
        let piece = game.board.get(mv.from).ok_or(ChessError::NoPiece { square: mv.from })?;
        if piece.color != color {
            return Err(ChessError::NotYourPiece { square: mv.from });
        }
        let mv = mv.normalized();
        if !self.move_generator.is_legal(&game.board, &mv) {
            return Err(ChessError::IllegalMove { from: mv.from, to: mv.to });
        }

        game.board.apply(mv);
        game.to_move = color.opposite();
        debug!(conn, %color, from = %mv.from, to = %mv.to, "move played");

        let promoting = mv
            .destination(color)
            .filter(|sq| sq.row() == color.promotion_row())
            .filter(|sq| game.board.get(*sq).map(|p| p.kind) == Some(PieceKind::Pawn));

        let audience = self.audience();
        broadcast(out, &audience, Message::Move(mv));

        match promoting {
            Some(square) => {
                if let Some(game) = self.game.as_mut() {
                    game.promotion = Some(color);
                }
                out.push(Outgoing {
                    to: conn,
                    msg: Message::Promote { square, piece: None },
                });
            }
            None => self.check_game_over(out),
        }
        Ok(())
    }

    fn promote(&mut self, conn: ConnId, square: Square, piece: Option<Piece>, out: &mut Vec<Outgoing>) -> ChessResult<()> {
        let seat = self.seat_of(conn);
        let game = self.game.as_mut().ok_or(ChessError::GameNotStarted)?;
        let color = seat.ok_or(ChessError::NotAPlayer)?.color;

        if game.promotion != Some(color) {
            return Err(ChessError::NoPromotionOwed);
        }
        let piece = piece
            .filter(|p| p.color == color)
            .ok_or(ChessError::InvalidPromotion { square })?;
        game.board.promote(square, piece)?;
        game.promotion = None;
        debug!(conn, %color, %square, kind = ?piece.kind, "pawn promoted");

        let audience = self.audience();
        broadcast(
            out,
            &audience,
            Message::Promote {
                square,
                piece: Some(piece),
            },
        );
        self.check_game_over(out);
        Ok(())
    }

    fn check_game_over(&mut self, out: &mut Vec<Outgoing>) {
        let game = match self.game.as_ref() {
            Some(game) => game,
            None => return,
        };
        let result = match self.move_generator.game_state(&game.board, game.to_move) {
            GameState::Ongoing | GameState::Check => return,
            GameState::Checkmate(winner) => GameResult::win_for(winner),
            GameState::Stalemate => GameResult::Stalemate,
        };

        info!(?result, "game complete");
        self.game = None;
        let audience = self.audience();
        broadcast(out, &audience, Message::GameComplete { result });
    }

    fn seat_of(&self, conn: ConnId) -> Option<Seat> {
        self.seats.iter().flatten().find(|seat| seat.conn == conn).copied()
    }

    // Players first, then spectators
    fn audience(&self) -> Vec<ConnId> {
        self.seats
            .iter()
            .flatten()
            .map(|seat| seat.conn)
            .chain(self.spectators.iter().copied())
            .collect()
    }

    pub fn color_of(&self, conn: ConnId) -> Option<Color> {
        self.seat_of(conn).map(|seat| seat.color)
    }

    pub fn is_player_one(&self, conn: ConnId) -> bool {
        matches!(self.seats[0], Some(seat) if seat.conn == conn)
    }

    pub fn player_count(&self) -> usize {
        self.seats.iter().flatten().count()
    }

    pub fn is_spectator(&self, conn: ConnId) -> bool {
        self.spectators.contains(&conn)
    }

    pub fn is_running(&self) -> bool {
        self.game.is_some()
    }

    pub fn board(&self) -> Option<&Board> {
        self.game.as_ref().map(|game| &game.board)
    }

    pub fn to_move(&self) -> Option<Color> {
        self.game.as_ref().map(|game| game.to_move)
    }

    pub fn pending_promotion(&self) -> Option<Color> {
        self.game.as_ref().and_then(|game| game.promotion)
    }
}

fn broadcast(out: &mut Vec<Outgoing>, audience: &[ConnId], msg: Message) {
    out.extend(audience.iter().map(|&to| Outgoing { to, msg: msg.clone() }));
}
