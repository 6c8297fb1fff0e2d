use crate::board::{Board, CastleSide, Color, Piece, PieceKind, Square};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveKind {
    Regular,
    EnPassant,
    CastleKingside,
    CastleQueenside,
}

/// A move as exchanged between players.
///
/// For en passant `to` is the pawn being captured; the capturing pawn lands
/// one step beyond it. For castling only `from` (the king) matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub kind: MoveKind,
}

impl Move {
    pub fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            kind: MoveKind::Regular,
        }
    }

    pub fn en_passant(from: Square, target: Square) -> Self {
        Self {
            from,
            to: target,
            kind: MoveKind::EnPassant,
        }
    }

    pub fn castle(from: Square, side: CastleSide) -> Self {
        let to = Square::new(side.king_target_col(), from.row()).unwrap_or(from);
        let kind = match side {
            CastleSide::Kingside => MoveKind::CastleKingside,
            CastleSide::Queenside => MoveKind::CastleQueenside,
        };
        Self { from, to, kind }
    }

    pub fn castle_side(&self) -> Option<CastleSide> {
        match self.kind {
            MoveKind::CastleKingside => Some(CastleSide::Kingside),
            MoveKind::CastleQueenside => Some(CastleSide::Queenside),
            _ => None,
        }
    }

    /// Rewrites the destination of a castle to the king's landing square,
    /// whatever the sender put there.
    pub fn normalized(self) -> Self {
        match self.castle_side() {
            Some(side) => Move::castle(self.from, side),
            None => self,
        }
    }

    /// Square the moving piece ends up on.
    pub fn destination(&self, color: Color) -> Option<Square> {
        match self.kind {
            MoveKind::Regular => Some(self.to),
            MoveKind::EnPassant => self.to.offset(0, color.forward()),
            MoveKind::CastleKingside => Square::new(CastleSide::Kingside.king_target_col(), self.from.row()),
            MoveKind::CastleQueenside => Square::new(CastleSide::Queenside.king_target_col(), self.from.row()),
        }
    }
}

/// Everything one piece can do, split by move kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveSet {
    pub moves: Vec<Square>,
    pub en_passant: Option<Square>,
    pub castle_kingside: bool,
    pub castle_queenside: bool,
}

impl MoveSet {
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
            && self.en_passant.is_none()
            && !self.castle_kingside
            && !self.castle_queenside
    }

    pub fn contains(&self, mv: &Move) -> bool {
        match mv.kind {
            MoveKind::Regular => self.moves.contains(&mv.to),
            MoveKind::EnPassant => self.en_passant == Some(mv.to),
            MoveKind::CastleKingside => self.castle_kingside,
            MoveKind::CastleQueenside => self.castle_queenside,
        }
    }

    /// Flattens the set into moves starting at `from`.
    pub fn to_moves(&self, from: Square) -> Vec<Move> {
        let mut result: Vec<Move> = self.moves.iter().map(|&to| Move::new(from, to)).collect();
        if let Some(target) = self.en_passant {
            result.push(Move::en_passant(from, target));
        }
        if self.castle_kingside {
            result.push(Move::castle(from, CastleSide::Kingside));
        }
        if self.castle_queenside {
            result.push(Move::castle(from, CastleSide::Queenside));
        }
        result
    }
}

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (-1, -2), (1, -2), (2, -1), (2, 1),
    (1, 2), (-1, 2), (-2, 1), (-2, -1),
];

const KING_OFFSETS: [(i8, i8); 8] = [
    (0, -1), (1, -1), (1, 0), (1, 1),
    (0, 1), (-1, 1), (-1, 0), (-1, -1),
];

const ROOK_DIRECTIONS: [(i8, i8); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];

const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(-1, -1), (1, -1), (-1, 1), (1, 1)];

/// Pseudo-legal move generation. The legality filtering on top of this
/// lives in `rules`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MoveGenerator;

impl MoveGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Moves for the piece on `from` that follow its movement pattern,
    /// ignoring whether they expose the mover's king.
    pub fn pseudo_moves(&self, board: &Board, from: Square) -> MoveSet {
        let mut set = MoveSet::default();
        let piece = match board.get(from) {
            Some(piece) => piece,
            None => return set,
        };

        match piece.kind {
            PieceKind::Pawn => {
                self.pawn_moves(board, from, piece.color, &mut set.moves);
                set.en_passant = self.en_passant_target(board, from, piece);
            }
            PieceKind::Knight => self.leaper_moves(board, from, piece.color, &KNIGHT_OFFSETS, &mut set.moves),
            PieceKind::Bishop => self.slider_moves(board, from, piece.color, &BISHOP_DIRECTIONS, &mut set.moves),
            PieceKind::Rook => self.slider_moves(board, from, piece.color, &ROOK_DIRECTIONS, &mut set.moves),
            PieceKind::Queen => {
                self.slider_moves(board, from, piece.color, &ROOK_DIRECTIONS, &mut set.moves);
                self.slider_moves(board, from, piece.color, &BISHOP_DIRECTIONS, &mut set.moves);
            }
            PieceKind::King => {
                self.leaper_moves(board, from, piece.color, &KING_OFFSETS, &mut set.moves);
                set.castle_kingside = self.can_castle(board, from, CastleSide::Kingside);
                set.castle_queenside = self.can_castle(board, from, CastleSide::Queenside);
            }
        }
        set
    }

    /// Squares the piece on `from` attacks.
    ///
    /// Unlike `pseudo_moves` this includes squares held by the piece's own
    /// side (a defended piece cannot be taken by a king), both pawn diagonals
    /// even when empty, and never the pawn's forward steps.
    pub fn threats(&self, board: &Board, from: Square) -> Vec<Square> {
        let mut threats = Vec::new();
        let piece = match board.get(from) {
            Some(piece) => piece,
            None => return threats,
        };

        match piece.kind {
            PieceKind::Pawn => {
                let forward = piece.color.forward();
                threats.extend([from.offset(-1, forward), from.offset(1, forward)].into_iter().flatten());
            }
            PieceKind::Knight => threats.extend(KNIGHT_OFFSETS.iter().filter_map(|&(dc, dr)| from.offset(dc, dr))),
            PieceKind::King => threats.extend(KING_OFFSETS.iter().filter_map(|&(dc, dr)| from.offset(dc, dr))),
            PieceKind::Bishop => self.slider_reach(board, from, &BISHOP_DIRECTIONS, &mut threats),
            PieceKind::Rook => self.slider_reach(board, from, &ROOK_DIRECTIONS, &mut threats),
            PieceKind::Queen => {
                self.slider_reach(board, from, &ROOK_DIRECTIONS, &mut threats);
                self.slider_reach(board, from, &BISHOP_DIRECTIONS, &mut threats);
            }
        }
        threats
    }

    /// Whether castling on `side` is possible as far as rights and
    /// occupancy go. Attacked squares are checked by the legality layer.
    pub fn can_castle(&self, board: &Board, king_square: Square, side: CastleSide) -> bool {
        let color = match board.get(king_square) {
            Some(Piece {
                kind: PieceKind::King,
                color,
            }) => color,
            _ => return false,
        };
        let row = color.home_row();
        if king_square.row() != row || king_square.col() != 4 || !board.castling_rights().has(color, side) {
            return false;
        }

        let rook_square = match Square::new(side.rook_col(), row) {
            Some(sq) => sq,
            None => return false,
        };
        if board.get(rook_square) != Some(Piece::new(PieceKind::Rook, color)) {
            return false;
        }

        let (low, high) = match side {
            CastleSide::Kingside => (5, 7),
            CastleSide::Queenside => (1, 4),
        };
        (low..high).all(|col| Square::new(col, row).map_or(false, |sq| board.is_empty(sq)))
    }

    fn pawn_moves(&self, board: &Board, from: Square, color: Color, moves: &mut Vec<Square>) {
        let forward = color.forward();

        // Single and double push
        if let Some(one) = from.offset(0, forward).filter(|sq| board.is_empty(*sq)) {
            moves.push(one);
            if from.row() == color.pawn_start_row() {
                if let Some(two) = one.offset(0, forward).filter(|sq| board.is_empty(*sq)) {
                    moves.push(two);
                }
            }
        }

        // Captures
        for dc in [-1, 1] {
            if let Some(target) = from.offset(dc, forward) {
                if matches!(board.get(target), Some(p) if p.color != color) {
                    moves.push(target);
                }
            }
        }
    }

    /// The pawn this pawn could take en passant, if any.
    fn en_passant_target(&self, board: &Board, from: Square, pawn: Piece) -> Option<Square> {
        let target = board.en_passant()?;
        if target.row() != from.row() || target.col().abs_diff(from.col()) != 1 {
            return None;
        }
        match board.get(target) {
            Some(Piece {
                kind: PieceKind::Pawn,
                color,
            }) if color != pawn.color => {}
            _ => return None,
        }
        let landing = target.offset(0, pawn.color.forward())?;
        if board.is_empty(landing) {
            Some(target)
        } else {
            None
        }
    }

    fn leaper_moves(&self, board: &Board, from: Square, color: Color, offsets: &[(i8, i8)], moves: &mut Vec<Square>) {
        for &(dc, dr) in offsets {
            if let Some(target) = from.offset(dc, dr) {
                match board.get(target) {
                    Some(piece) if piece.color == color => {}
                    _ => moves.push(target),
                }
            }
        }
    }

    fn slider_moves(&self, board: &Board, from: Square, color: Color, directions: &[(i8, i8)], moves: &mut Vec<Square>) {
        for &(dc, dr) in directions {
            let mut current = from;
            while let Some(target) = current.offset(dc, dr) {
                match board.get(target) {
                    None => moves.push(target),
                    Some(piece) => {
                        if piece.color != color {
                            moves.push(target);
                        }
                        break;
                    }
                }
                current = target;
            }
        }
    }

    // Rays up to and including the first occupied square, whoever holds it
    fn slider_reach(&self, board: &Board, from: Square, directions: &[(i8, i8)], threats: &mut Vec<Square>) {
        for &(dc, dr) in directions {
            let mut current = from;
            while let Some(target) = current.offset(dc, dr) {
                threats.push(target);
                if !board.is_empty(target) {
                    break;
                }
                current = target;
            }
        }
    }
}
