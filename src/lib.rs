pub mod board;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod movegen;
pub mod player;
pub mod protocol;
pub mod rules;
pub mod search;
pub mod server;
pub mod session;
pub mod transport;

pub use board::{Board, CastleSide, Color, Piece, PieceKind, Square};
pub use error::{ChessError, ChessResult};
pub use movegen::{Move, MoveGenerator, MoveKind, MoveSet};
pub use rules::GameState;
pub use search::Search;
