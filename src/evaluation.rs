use crate::board::{Board, Color, PieceKind};

/// Fixed scoring weights used by the search.
#[derive(Debug, Clone)]
pub struct Evaluator {
    // Piece values
    pub pawn_value: i32,
    pub knight_value: i32,
    pub bishop_value: i32,
    pub rook_value: i32,
    pub queen_value: i32,
    pub king_value: i32,

    // Awarded for delivering mate, scaled by the remaining depth
    pub mate_bonus: i32,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self {
            pawn_value: 100,
            knight_value: 320,
            bishop_value: 330,
            rook_value: 500,
            queen_value: 900,
            king_value: 0, // never captured
            mate_bonus: 5000,
        }
    }

    pub fn piece_value(&self, kind: PieceKind) -> i32 {
        match kind {
            PieceKind::Pawn => self.pawn_value,
            PieceKind::Knight => self.knight_value,
            PieceKind::Bishop => self.bishop_value,
            PieceKind::Rook => self.rook_value,
            PieceKind::Queen => self.queen_value,
            PieceKind::King => self.king_value,
        }
    }

    /// Total material of one side.
    pub fn material(&self, board: &Board, color: Color) -> i32 {
        board
            .pieces(color)
            .map(|(_, piece)| self.piece_value(piece.kind))
            .sum()
    }

    /// Material balance from `color`'s point of view.
    pub fn evaluate(&self, board: &Board, color: Color) -> i32 {
        self.material(board, color) - self.material(board, color.opposite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_material_is_balanced() {
        let evaluator = Evaluator::new();
        let board = Board::new();
        assert_eq!(evaluator.material(&board, Color::White), 4000);
        assert_eq!(evaluator.evaluate(&board, Color::Black), 0);
    }

    #[test]
    fn test_material_after_capture() {
        let evaluator = Evaluator::new();
        let board = Board::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 0 1").unwrap();
        assert_eq!(evaluator.evaluate(&board, Color::White), 500);
        assert_eq!(evaluator.evaluate(&board, Color::Black), -500);
    }
}
