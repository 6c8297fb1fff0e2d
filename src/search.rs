use crate::board::{Board, Color, Piece, PieceKind};
use crate::evaluation::Evaluator;
use crate::movegen::{Move, MoveGenerator};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;

pub const DEFAULT_DEPTH: u32 = 2;

/// Greedy lookahead used by the automated player.
///
/// Each candidate is scored on what it wins right away (captures, promotion,
/// mate) minus the piece it leaves hanging. With depth left, the opponent's
/// single best immediate reply is played out recursively and its score is
/// subtracted. Only that one continuation is explored per branch, so this is
/// far cheaper than a full minimax tree and also far weaker.
pub struct Search {
    evaluator: Evaluator,
    move_generator: MoveGenerator,
    max_depth: u32,
    nodes_searched: u64,
    rng: StdRng,
}

struct Outcome {
    score: i32,
    board: Board,
    finished: bool,
}

impl Default for Search {
    fn default() -> Self {
        Self::new()
    }
}

impl Search {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// A search whose tie-breaking is reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            evaluator: Evaluator::new(),
            move_generator: MoveGenerator::new(),
            max_depth: DEFAULT_DEPTH,
            nodes_searched: 0,
            rng,
        }
    }

    pub fn find_best_move(&mut self, board: &Board, color: Color) -> Option<Move> {
        self.choose_move(board, color, self.max_depth)
    }

    /// Picks a move for `color`, looking `depth` plies ahead. Returns `None`
    /// when `color` has no legal move at all.
    pub fn choose_move(&mut self, board: &Board, color: Color, depth: u32) -> Option<Move> {
        self.nodes_searched = 0;

        let mut best_score = i32::MIN;
        let mut best_moves = Vec::new();
        for mv in self.move_generator.all_legal_moves(board, color) {
            let score = self.score_move(board, mv, color, depth);
            if score > best_score {
                best_score = score;
                best_moves.clear();
                best_moves.push(mv);
            } else if score == best_score {
                best_moves.push(mv);
            }
        }

        // Ties are broken at random so games don't repeat
        let choice = best_moves.choose(&mut self.rng).copied();
        debug!(
            %color,
            depth,
            best_score,
            candidates = best_moves.len(),
            nodes = self.nodes_searched,
            "search finished"
        );
        choice
    }

    fn score_move(&mut self, board: &Board, mv: Move, color: Color, depth: u32) -> i32 {
        let outcome = self.play(board, mv, color, depth);
        if depth == 0 || outcome.finished {
            return outcome.score;
        }

        let opponent = color.opposite();
        match self.best_reply(&outcome.board, opponent) {
            Some(reply) => outcome.score - self.score_move(&outcome.board, reply, opponent, depth - 1),
            None => outcome.score,
        }
    }

    /// First of the opponent's moves with the highest immediate score.
    fn best_reply(&mut self, board: &Board, color: Color) -> Option<Move> {
        let mut best: Option<(i32, Move)> = None;
        for mv in self.move_generator.all_legal_moves(board, color) {
            let score = self.play(board, mv, color, 0).score;
            if best.map_or(true, |(best_score, _)| score > best_score) {
                best = Some((score, mv));
            }
        }
        best.map(|(_, mv)| mv)
    }

    /// Plays `mv` on a copy and scores the immediate result.
    fn play(&mut self, board: &Board, mv: Move, color: Color, depth: u32) -> Outcome {
        self.nodes_searched += 1;

        let mut after = board.clone();
        after.make_move(mv);
        let landing = mv.destination(color);

        // Always promote to a queen
        if let Some(square) = landing.filter(|sq| sq.row() == color.promotion_row()) {
            if after.get(square).map(|p| p.kind) == Some(PieceKind::Pawn) {
                if let Err(err) = after.promote(square, Piece::new(PieceKind::Queen, color)) {
                    debug!(%err, %square, "promotion skipped");
                }
            }
        }

        // Captures and promotion both show up as a material swing
        let mut score = self.evaluator.evaluate(&after, color) - self.evaluator.evaluate(board, color);

        let opponent = color.opposite();
        if !self.move_generator.has_legal_move(&after, opponent) {
            if self.move_generator.in_check(&after, opponent) {
                score += self.evaluator.mate_bonus * (depth as i32 + 1);
            }
            return Outcome {
                score,
                board: after,
                finished: true,
            };
        }

        // Assume anything left en prise is lost
        if let Some(square) = landing {
            if self.move_generator.is_square_under_attack(&after, square, opponent) {
                if let Some(piece) = after.get(square) {
                    score -= self.evaluator.piece_value(piece.kind);
                }
            }
        }

        Outcome {
            score,
            board: after,
            finished: false,
        }
    }

    pub fn set_max_depth(&mut self, depth: u32) {
        self.max_depth = depth;
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn get_nodes_searched(&self) -> u64 {
        self.nodes_searched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Square;
    use rand::Rng;

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    fn fools_mate_setup() -> Board {
        let mut board = Board::new();
        board.apply(Move::new(sq("f2"), sq("f3")));
        board.apply(Move::new(sq("e7"), sq("e5")));
        board.apply(Move::new(sq("g2"), sq("g4")));
        board
    }

    #[test]
    fn test_takes_hanging_queen() {
        let board = Board::from_fen("q3k3/8/8/8/8/8/8/R3K3 w - - 0 1").unwrap();
        for depth in 0..=2 {
            let mut search = Search::with_seed(1);
            assert_eq!(
                search.choose_move(&board, Color::White, depth),
                Some(Move::new(sq("a1"), sq("a8"))),
                "depth {depth}"
            );
        }
    }

    #[test]
    fn test_finds_mate_in_one() {
        let board = fools_mate_setup();
        for depth in 0..=2 {
            let mut search = Search::with_seed(3);
            assert_eq!(
                search.choose_move(&board, Color::Black, depth),
                Some(Move::new(sq("d8"), sq("h4"))),
                "depth {depth}"
            );
        }
    }

    #[test]
    fn test_promotes_pawn() {
        let board = Board::from_fen("8/P6k/8/8/8/8/8/K7 w - - 0 1").unwrap();
        let mut search = Search::with_seed(5);
        assert_eq!(
            search.choose_move(&board, Color::White, 0),
            Some(Move::new(sq("a7"), sq("a8")))
        );
    }

    #[test]
    fn test_en_passant_counts_as_a_capture() {
        let board = Board::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1").unwrap();
        let mut search = Search::with_seed(11);
        assert_eq!(
            search.choose_move(&board, Color::White, 0),
            Some(Move::en_passant(sq("e5"), sq("d5")))
        );
    }

    #[test]
    fn test_no_move_when_mated() {
        let mut board = fools_mate_setup();
        board.apply(Move::new(sq("d8"), sq("h4")));
        let mut search = Search::with_seed(9);
        assert_eq!(search.choose_move(&board, Color::White, 2), None);
    }

    #[test]
    fn test_seeded_search_is_repeatable() {
        let board = Board::new();
        let first = Search::with_seed(42).choose_move(&board, Color::White, 1);
        let second = Search::with_seed(42).choose_move(&board, Color::White, 1);
        assert!(first.is_some());
        assert_eq!(first, second);
    }

    #[test]
    fn test_search_only_returns_legal_moves() {
        let generator = MoveGenerator::new();
        let mut rng = StdRng::seed_from_u64(2024);
        let mut board = Board::new();
        let mut color = Color::White;

        for _ in 0..30 {
            let mut search = Search::with_seed(rng.gen());
            let mv = match search.choose_move(&board, color, 1) {
                Some(mv) => mv,
                None => break,
            };
            assert!(generator.is_legal(&board, &mv), "{mv:?} is not legal on\n{board}");
            board.apply(mv);
            if let Some((square, owner)) = board.pending_promotion() {
                board.promote(square, Piece::new(PieceKind::Queen, owner)).unwrap();
            }
            color = color.opposite();
        }
    }
}
