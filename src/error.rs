use crate::board::{Color, Square};
use thiserror::Error;

/// Rule violations are sent to the offending client as their `Display` text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChessError {
    #[error("Invalid square: {0}")]
    InvalidSquare(String),

    #[error("Invalid FEN: {0}")]
    InvalidFen(String),

    #[error("There's no piece at {square}.")]
    NoPiece { square: Square },

    #[error("That's not your piece.")]
    NotYourPiece { square: Square },

    #[error("It's not your turn.")]
    NotYourTurn,

    #[error("That's not legal.")]
    IllegalMove { from: Square, to: Square },

    #[error("Waiting on {color} to pick a promotion.")]
    PromotionPending { color: Color },

    #[error("You're not ready for a promotion yet.")]
    NoPromotionOwed,

    #[error("Invalid selection.")]
    InvalidPromotion { square: Square },

    #[error("Game has not started.")]
    GameNotStarted,

    #[error("Game already started.")]
    GameAlreadyStarted,

    #[error("You're already a player.")]
    AlreadyPlayer,

    #[error("All player slots filled.")]
    SlotsFilled,

    #[error("Only player 1 can start a game.")]
    NotPlayerOne,

    #[error("Need 2 players to play.")]
    NeedTwoPlayers,

    #[error("Spectators can't do that.")]
    NotAPlayer,

    #[error("Unexpected message.")]
    UnexpectedMessage,
}

pub type ChessResult<T> = Result<T, ChessError>;
