use crate::board::{Board, CastleSide, Color, Square};
use crate::movegen::{Move, MoveGenerator, MoveSet};

/// Squares attacked by one side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThreatMap([[bool; 8]; 8]);

impl ThreatMap {
    pub fn contains(&self, square: Square) -> bool {
        self.0[square.row() as usize][square.col() as usize]
    }

    fn insert(&mut self, square: Square) {
        self.0[square.row() as usize][square.col() as usize] = true;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Ongoing,
    Check,
    Checkmate(Color), // Color is the winner
    Stalemate,
}

// Legality is decided by playing the candidate on a copy and rejecting it
// if the mover's king is then attacked.
impl MoveGenerator {
    /// Union of the threat sets of every piece belonging to `by`.
    pub fn threatened(&self, board: &Board, by: Color) -> ThreatMap {
        let mut map = ThreatMap::default();
        for (square, _) in board.pieces(by) {
            for target in self.threats(board, square) {
                map.insert(target);
            }
        }
        map
    }

    pub fn is_square_under_attack(&self, board: &Board, square: Square, by: Color) -> bool {
        board
            .pieces(by)
            .any(|(from, _)| self.threats(board, from).contains(&square))
    }

    pub fn in_check(&self, board: &Board, color: Color) -> bool {
        match board.king_square(color) {
            Some(king) => self.is_square_under_attack(board, king, color.opposite()),
            None => false, // only reachable on hand-built boards
        }
    }

    /// Plays `mv` on a scratch copy and reports whether `color` is safe
    /// afterwards.
    fn leaves_king_safe(&self, board: &Board, mv: Move, color: Color) -> bool {
        let mut scratch = board.clone();
        scratch.make_move(mv);
        !self.in_check(&scratch, color)
    }

    /// Legal moves of the piece on `from`.
    pub fn legal_moves(&self, board: &Board, from: Square) -> MoveSet {
        let color = match board.get(from) {
            Some(piece) => piece.color,
            None => return MoveSet::default(),
        };
        let pseudo = self.pseudo_moves(board, from);

        let moves = pseudo
            .moves
            .iter()
            .copied()
            .filter(|&to| self.leaves_king_safe(board, Move::new(from, to), color))
            .collect();

        let en_passant = pseudo
            .en_passant
            .filter(|&target| self.leaves_king_safe(board, Move::en_passant(from, target), color));

        let (mut castle_kingside, mut castle_queenside) = (false, false);
        if pseudo.castle_kingside || pseudo.castle_queenside {
            // No castling out of check
            if !self.in_check(board, color) {
                castle_kingside = pseudo.castle_kingside && self.castle_is_safe(board, from, color, CastleSide::Kingside);
                castle_queenside = pseudo.castle_queenside && self.castle_is_safe(board, from, color, CastleSide::Queenside);
            }
        }

        MoveSet {
            moves,
            en_passant,
            castle_kingside,
            castle_queenside,
        }
    }

    // The king may not pass over an attacked square, nor land on one
    fn castle_is_safe(&self, board: &Board, king: Square, color: Color, side: CastleSide) -> bool {
        let transit = match Square::new(side.rook_target_col(), king.row()) {
            Some(sq) => sq,
            None => return false,
        };
        if self.is_square_under_attack(board, transit, color.opposite()) {
            return false;
        }
        self.leaves_king_safe(board, Move::castle(king, side), color)
    }

    /// Every legal move of every piece of `color`.
    pub fn all_legal_moves(&self, board: &Board, color: Color) -> Vec<Move> {
        board
            .pieces(color)
            .flat_map(|(from, _)| self.legal_moves(board, from).to_moves(from))
            .collect()
    }

    pub fn has_legal_move(&self, board: &Board, color: Color) -> bool {
        board
            .pieces(color)
            .any(|(from, _)| !self.legal_moves(board, from).is_empty())
    }

    /// Whether `mv` is among the legal moves of the piece it starts from.
    pub fn is_legal(&self, board: &Board, mv: &Move) -> bool {
        self.legal_moves(board, mv.from).contains(mv)
    }

    pub fn is_checkmated(&self, board: &Board, color: Color) -> bool {
        self.in_check(board, color) && !self.has_legal_move(board, color)
    }

    pub fn is_stalemated(&self, board: &Board, color: Color) -> bool {
        !self.in_check(board, color) && !self.has_legal_move(board, color)
    }

    pub fn game_state(&self, board: &Board, to_move: Color) -> GameState {
        if self.has_legal_move(board, to_move) {
            if self.in_check(board, to_move) {
                GameState::Check
            } else {
                GameState::Ongoing
            }
        } else if self.in_check(board, to_move) {
            GameState::Checkmate(to_move.opposite())
        } else {
            GameState::Stalemate
        }
    }
}
