use crate::error::{ChessError, ChessResult};
use crate::movegen::{Move, MoveGenerator, MoveKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// Kinds a pawn may be promoted to.
    pub const PROMOTIONS: [PieceKind; 4] = [
        PieceKind::Queen,
        PieceKind::Rook,
        PieceKind::Bishop,
        PieceKind::Knight,
    ];

    pub fn is_promotion_target(&self) -> bool {
        Self::PROMOTIONS.contains(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opposite(&self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Row holding this color's king and rooks at the start of a game.
    pub fn home_row(&self) -> u8 {
        match self {
            Color::White => 7,
            Color::Black => 0,
        }
    }

    pub fn pawn_start_row(&self) -> u8 {
        match self {
            Color::White => 6,
            Color::Black => 1,
        }
    }

    /// Row on which this color's pawns promote.
    pub fn promotion_row(&self) -> u8 {
        self.opposite().home_row()
    }

    /// Row delta of a pawn step.
    pub fn forward(&self) -> i8 {
        match self {
            Color::White => -1,
            Color::Black => 1,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
}

impl Piece {
    pub fn new(kind: PieceKind, color: Color) -> Self {
        Self { kind, color }
    }

    pub fn symbol(&self) -> char {
        let c = match self.kind {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        };
        match self.color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }

    pub fn from_symbol(c: char) -> Option<Self> {
        let kind = match c.to_ascii_lowercase() {
            'p' => PieceKind::Pawn,
            'n' => PieceKind::Knight,
            'b' => PieceKind::Bishop,
            'r' => PieceKind::Rook,
            'q' => PieceKind::Queen,
            'k' => PieceKind::King,
            _ => return None,
        };
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        Some(Self::new(kind, color))
    }
}

/// A board coordinate. Row 0 is Black's back rank, column 0 is the a-file.
///
/// Only in-range squares can be constructed, so indexing the grid with one
/// never goes out of bounds. Squares arriving off the wire are checked while
/// deserializing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "(u8, u8)", into = "(u8, u8)")]
pub struct Square {
    col: u8,
    row: u8,
}

impl Square {
    pub fn new(col: u8, row: u8) -> Option<Self> {
        if col < 8 && row < 8 {
            Some(Self { col, row })
        } else {
            None
        }
    }

    pub fn col(&self) -> u8 {
        self.col
    }

    pub fn row(&self) -> u8 {
        self.row
    }

    pub fn offset(&self, dc: i8, dr: i8) -> Option<Self> {
        let col = self.col as i8 + dc;
        let row = self.row as i8 + dr;
        if (0..8).contains(&col) && (0..8).contains(&row) {
            Some(Self {
                col: col as u8,
                row: row as u8,
            })
        } else {
            None
        }
    }

    /// Every square, row by row from Black's back rank.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..8u8).flat_map(|row| (0..8u8).map(move |col| Square { col, row }))
    }
}

impl TryFrom<(u8, u8)> for Square {
    type Error = ChessError;

    fn try_from((col, row): (u8, u8)) -> Result<Self, Self::Error> {
        Square::new(col, row).ok_or_else(|| ChessError::InvalidSquare(format!("({col}, {row})")))
    }
}

impl From<Square> for (u8, u8) {
    fn from(square: Square) -> Self {
        (square.col, square.row)
    }
}

impl FromStr for Square {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(ChessError::InvalidSquare(s.to_string()));
        }
        let col = match bytes[0] {
            b @ b'a'..=b'h' => b - b'a',
            _ => return Err(ChessError::InvalidSquare(s.to_string())),
        };
        let row = match bytes[1] {
            b @ b'1'..=b'8' => 8 - (b - b'0'),
            _ => return Err(ChessError::InvalidSquare(s.to_string())),
        };
        Ok(Square { col, row })
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.col) as char, 8 - self.row)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CastleSide {
    Kingside,
    Queenside,
}

impl CastleSide {
    pub fn rook_col(&self) -> u8 {
        match self {
            CastleSide::Kingside => 7,
            CastleSide::Queenside => 0,
        }
    }

    pub fn king_target_col(&self) -> u8 {
        match self {
            CastleSide::Kingside => 6,
            CastleSide::Queenside => 2,
        }
    }

    /// Where the rook lands: the square the king passes over.
    pub fn rook_target_col(&self) -> u8 {
        match self {
            CastleSide::Kingside => 5,
            CastleSide::Queenside => 3,
        }
    }
}

/// Castling rights can only ever be revoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CastlingRights {
    white_kingside: bool,
    white_queenside: bool,
    black_kingside: bool,
    black_queenside: bool,
}

impl CastlingRights {
    pub fn all() -> Self {
        Self {
            white_kingside: true,
            white_queenside: true,
            black_kingside: true,
            black_queenside: true,
        }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn has(&self, color: Color, side: CastleSide) -> bool {
        match (color, side) {
            (Color::White, CastleSide::Kingside) => self.white_kingside,
            (Color::White, CastleSide::Queenside) => self.white_queenside,
            (Color::Black, CastleSide::Kingside) => self.black_kingside,
            (Color::Black, CastleSide::Queenside) => self.black_queenside,
        }
    }

    pub fn revoke(&mut self, color: Color, side: CastleSide) {
        match (color, side) {
            (Color::White, CastleSide::Kingside) => self.white_kingside = false,
            (Color::White, CastleSide::Queenside) => self.white_queenside = false,
            (Color::Black, CastleSide::Kingside) => self.black_kingside = false,
            (Color::Black, CastleSide::Queenside) => self.black_queenside = false,
        }
    }

    pub fn revoke_all(&mut self, color: Color) {
        self.revoke(color, CastleSide::Kingside);
        self.revoke(color, CastleSide::Queenside);
    }
}

const BACK_RANK: [PieceKind; 8] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    squares: [[Option<Piece>; 8]; 8], // [row][col]
    castling: CastlingRights,
    en_passant: Option<Square>, // pawn that just double-stepped
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        let mut board = Self::empty();
        board.castling = CastlingRights::all();
        for (col, &kind) in BACK_RANK.iter().enumerate() {
            board.squares[0][col] = Some(Piece::new(kind, Color::Black));
            board.squares[1][col] = Some(Piece::new(PieceKind::Pawn, Color::Black));
            board.squares[6][col] = Some(Piece::new(PieceKind::Pawn, Color::White));
            board.squares[7][col] = Some(Piece::new(kind, Color::White));
        }
        board
    }

    /// A board with no pieces and no castling rights.
    pub fn empty() -> Self {
        Self {
            squares: [[None; 8]; 8],
            castling: CastlingRights::none(),
            en_passant: None,
        }
    }

    pub fn get(&self, square: Square) -> Option<Piece> {
        self.squares[square.row as usize][square.col as usize]
    }

    pub fn set(&mut self, square: Square, piece: Option<Piece>) {
        self.squares[square.row as usize][square.col as usize] = piece;
    }

    pub fn is_empty(&self, square: Square) -> bool {
        self.get(square).is_none()
    }

    pub fn castling_rights(&self) -> CastlingRights {
        self.castling
    }

    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    pub fn pieces(&self, color: Color) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(move |sq| match self.get(sq) {
            Some(piece) if piece.color == color => Some((sq, piece)),
            _ => None,
        })
    }

    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.pieces(color)
            .find(|(_, piece)| piece.kind == PieceKind::King)
            .map(|(sq, _)| sq)
    }

    /// Moves pieces for `mv` without checking legality and without computing
    /// check. Returns the piece that moved, or `None` (and leaves the board
    /// untouched) when `mv.from` is empty.
    pub fn make_move(&mut self, mv: Move) -> Option<Piece> {
        let piece = self.get(mv.from)?;
        let color = piece.color;
        let landing = mv.destination(color)?;

        self.en_passant = None;

        match mv.kind {
            MoveKind::Regular => {
                let captured = self.get(mv.to);
                self.set(mv.to, Some(piece));
                self.set(mv.from, None);

                match piece.kind {
                    PieceKind::King => self.castling.revoke_all(color),
                    PieceKind::Rook => {
                        if let Some(side) = rook_home_side(color, mv.from) {
                            self.castling.revoke(color, side);
                        }
                    }
                    PieceKind::Pawn => {
                        if mv.from.row.abs_diff(mv.to.row) == 2 {
                            self.en_passant = Some(mv.to);
                        }
                    }
                    _ => {}
                }

                // A rook taken on its corner can no longer castle
                if let Some(Piece {
                    kind: PieceKind::Rook,
                    color: victim,
                }) = captured
                {
                    if let Some(side) = rook_home_side(victim, mv.to) {
                        self.castling.revoke(victim, side);
                    }
                }
            }
            MoveKind::EnPassant => {
                self.set(mv.to, None);
                self.set(landing, Some(piece));
                self.set(mv.from, None);
            }
            MoveKind::CastleKingside | MoveKind::CastleQueenside => {
                let side = if mv.kind == MoveKind::CastleKingside {
                    CastleSide::Kingside
                } else {
                    CastleSide::Queenside
                };
                let row = mv.from.row;
                let rook_from = Square { col: side.rook_col(), row };
                let rook_to = Square {
                    col: side.rook_target_col(),
                    row,
                };
                let rook = self.get(rook_from);
                self.set(mv.from, None);
                self.set(rook_from, None);
                self.set(landing, Some(piece));
                self.set(rook_to, rook);
                self.castling.revoke_all(color);
            }
        }

        Some(piece)
    }

    /// Applies an already validated move and reports whether the opponent
    /// of the mover is now in check.
    pub fn apply(&mut self, mv: Move) -> bool {
        match self.make_move(mv) {
            Some(piece) => MoveGenerator::new().in_check(self, piece.color.opposite()),
            None => false,
        }
    }

    /// Replaces a pawn standing on its promotion row with `piece`.
    ///
    /// Fails without touching the board unless the square holds a pawn of
    /// `piece.color` on that color's promotion row and `piece.kind` is a
    /// knight, bishop, rook or queen. On success returns whether the
    /// opponent is now in check.
    pub fn promote(&mut self, square: Square, piece: Piece) -> ChessResult<bool> {
        let promotable = matches!(
            self.get(square),
            Some(Piece { kind: PieceKind::Pawn, color }) if color == piece.color
        ) && square.row == piece.color.promotion_row()
            && piece.kind.is_promotion_target();
        if !promotable {
            return Err(ChessError::InvalidPromotion { square });
        }
        self.set(square, Some(piece));
        Ok(MoveGenerator::new().in_check(self, piece.color.opposite()))
    }

    /// A pawn waiting to be promoted, if any.
    pub fn pending_promotion(&self) -> Option<(Square, Color)> {
        Square::all().find_map(|sq| match self.get(sq) {
            Some(Piece {
                kind: PieceKind::Pawn,
                color,
            }) if sq.row == color.promotion_row() => Some((sq, color)),
            _ => None,
        })
    }

    /// Parses the placement, castling and en passant fields of a FEN record.
    /// The side to move is validated but not stored.
    pub fn from_fen(fen: &str) -> ChessResult<Self> {
        let invalid = |reason: &str| ChessError::InvalidFen(format!("{reason}: {fen}"));
        let fields: Vec<&str> = fen.split_whitespace().collect();
        let placement = fields.first().ok_or_else(|| invalid("empty record"))?;

        let mut board = Board::empty();
        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != 8 {
            return Err(invalid("expected 8 ranks"));
        }
        for (row, rank) in ranks.iter().enumerate() {
            let mut col = 0usize;
            for c in rank.chars() {
                if let Some(skip) = c.to_digit(10) {
                    if skip == 0 || skip > 8 {
                        return Err(invalid("bad empty-square count"));
                    }
                    col += skip as usize;
                } else {
                    let piece = Piece::from_symbol(c).ok_or_else(|| invalid("unknown piece"))?;
                    if col >= 8 {
                        return Err(invalid("rank too long"));
                    }
                    board.squares[row][col] = Some(piece);
                    col += 1;
                }
                if col > 8 {
                    return Err(invalid("rank too long"));
                }
            }
            if col != 8 {
                return Err(invalid("rank too short"));
            }
        }

        if let Some(side) = fields.get(1) {
            if *side != "w" && *side != "b" {
                return Err(invalid("bad side to move"));
            }
        }

        if let Some(castling) = fields.get(2) {
            for c in castling.chars() {
                match c {
                    'K' => board.castling.white_kingside = true,
                    'Q' => board.castling.white_queenside = true,
                    'k' => board.castling.black_kingside = true,
                    'q' => board.castling.black_queenside = true,
                    '-' => {}
                    _ => return Err(invalid("bad castling field")),
                }
            }
        }

        if let Some(ep) = fields.get(3).filter(|f| **f != "-") {
            let passed: Square = ep.parse().map_err(|_| invalid("bad en passant square"))?;
            // FEN names the skipped square; the board tracks the pawn itself
            let target = match passed.row {
                5 => passed.offset(0, -1),
                2 => passed.offset(0, 1),
                _ => None,
            };
            board.en_passant = Some(target.ok_or_else(|| invalid("bad en passant square"))?);
        }

        Ok(board)
    }

    pub fn to_fen(&self, to_move: Color) -> String {
        let mut fen = String::new();
        for row in 0..8 {
            let mut empty = 0;
            for col in 0..8 {
                match self.squares[row][col] {
                    Some(piece) => {
                        if empty > 0 {
                            fen.push_str(&empty.to_string());
                            empty = 0;
                        }
                        fen.push(piece.symbol());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                fen.push_str(&empty.to_string());
            }
            if row < 7 {
                fen.push('/');
            }
        }

        fen.push_str(match to_move {
            Color::White => " w ",
            Color::Black => " b ",
        });

        let mut castling = String::new();
        for (color, side, c) in [
            (Color::White, CastleSide::Kingside, 'K'),
            (Color::White, CastleSide::Queenside, 'Q'),
            (Color::Black, CastleSide::Kingside, 'k'),
            (Color::Black, CastleSide::Queenside, 'q'),
        ] {
            if self.castling.has(color, side) {
                castling.push(c);
            }
        }
        if castling.is_empty() {
            castling.push('-');
        }
        fen.push_str(&castling);

        let passed = self.en_passant.and_then(|target| match self.get(target) {
            Some(piece) => target.offset(0, -piece.color.forward()),
            None => None,
        });
        match passed {
            Some(sq) => fen.push_str(&format!(" {sq}")),
            None => fen.push_str(" -"),
        }
        fen.push_str(" 0 1");
        fen
    }
}

fn rook_home_side(color: Color, square: Square) -> Option<CastleSide> {
    if square.row != color.home_row() {
        return None;
    }
    match square.col {
        0 => Some(CastleSide::Queenside),
        7 => Some(CastleSide::Kingside),
        _ => None,
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut result = String::new();
        for row in 0..8 {
            for col in 0..8 {
                match self.squares[row][col] {
                    Some(piece) => result.push(piece.symbol()),
                    None => result.push('.'),
                }
                if col < 7 {
                    result.push(' ');
                }
            }
            result.push('\n');
        }
        write!(f, "{}", result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    #[test]
    fn test_square_names() {
        assert_eq!(sq("a8"), Square::new(0, 0).unwrap());
        assert_eq!(sq("h1"), Square::new(7, 7).unwrap());
        assert_eq!(sq("e4").to_string(), "e4");
        assert!("i1".parse::<Square>().is_err());
        assert!("a9".parse::<Square>().is_err());
        assert!(Square::new(8, 0).is_none());
        assert_eq!(sq("a1").offset(-1, 0), None);
    }

    #[test]
    fn test_initial_layout() {
        let board = Board::new();
        assert_eq!(board.get(sq("e1")), Some(Piece::new(PieceKind::King, Color::White)));
        assert_eq!(board.get(sq("d8")), Some(Piece::new(PieceKind::Queen, Color::Black)));
        assert_eq!(board.pieces(Color::White).count(), 16);
        assert_eq!(board.pieces(Color::Black).count(), 16);
        assert_eq!(board.castling_rights(), CastlingRights::all());
        assert_eq!(board.en_passant(), None);
    }

    #[test]
    fn test_fen_round_trip_initial() {
        let fen = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
        assert_eq!(Board::from_fen(fen).unwrap(), Board::new());
        assert_eq!(Board::new().to_fen(Color::White), fen);
    }

    #[test]
    fn test_fen_en_passant_field() {
        let board =
            Board::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1").unwrap();
        assert_eq!(board.en_passant(), Some(sq("e4")));
        assert!(board.to_fen(Color::Black).contains(" e3 "));
    }

    #[test]
    fn test_fen_rejects_garbage() {
        assert!(Board::from_fen("").is_err());
        assert!(Board::from_fen("8/8/8/8/8/8/8 w - - 0 1").is_err());
        assert!(Board::from_fen("9/8/8/8/8/8/8/8 w - - 0 1").is_err());
        assert!(Board::from_fen("8/8/8/8/8/8/8/7x w - - 0 1").is_err());
        assert!(Board::from_fen("8/8/8/8/8/8/8/8 x - - 0 1").is_err());
    }

    #[test]
    fn test_double_step_sets_en_passant_and_next_move_clears_it() {
        let mut board = Board::new();
        board.apply(Move::new(sq("e2"), sq("e4")));
        assert_eq!(board.en_passant(), Some(sq("e4")));
        board.apply(Move::new(sq("g8"), sq("f6")));
        assert_eq!(board.en_passant(), None);
    }

    #[test]
    fn test_rook_and_king_moves_revoke_castling() {
        let mut board = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        board.apply(Move::new(sq("h1"), sq("h2")));
        let rights = board.castling_rights();
        assert!(!rights.has(Color::White, CastleSide::Kingside));
        assert!(rights.has(Color::White, CastleSide::Queenside));

        board.apply(Move::new(sq("e8"), sq("d8")));
        let rights = board.castling_rights();
        assert!(!rights.has(Color::Black, CastleSide::Kingside));
        assert!(!rights.has(Color::Black, CastleSide::Queenside));
    }

    #[test]
    fn test_capturing_corner_rook_revokes_its_right() {
        let mut board = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        board.apply(Move::new(sq("a1"), sq("a8")));
        let rights = board.castling_rights();
        assert!(!rights.has(Color::Black, CastleSide::Queenside));
        assert!(!rights.has(Color::White, CastleSide::Queenside));
        assert!(rights.has(Color::Black, CastleSide::Kingside));
    }

    #[test]
    fn test_castle_moves_king_and_rook() {
        let mut board = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        board.apply(Move::castle(sq("e1"), CastleSide::Kingside));
        assert_eq!(board.get(sq("g1")), Some(Piece::new(PieceKind::King, Color::White)));
        assert_eq!(board.get(sq("f1")), Some(Piece::new(PieceKind::Rook, Color::White)));
        assert!(board.is_empty(sq("e1")));
        assert!(board.is_empty(sq("h1")));

        board.apply(Move::castle(sq("e8"), CastleSide::Queenside));
        assert_eq!(board.get(sq("c8")), Some(Piece::new(PieceKind::King, Color::Black)));
        assert_eq!(board.get(sq("d8")), Some(Piece::new(PieceKind::Rook, Color::Black)));
        assert!(board.is_empty(sq("a8")));
        assert_eq!(board.castling_rights(), CastlingRights::none());
    }

    #[test]
    fn test_en_passant_capture_removes_pawn() {
        let mut board = Board::from_fen("4k3/8/8/3Pp3/8/8/8/4K3 w - e6 0 1").unwrap();
        board.apply(Move::en_passant(sq("d5"), sq("e5")));
        assert_eq!(board.get(sq("e6")), Some(Piece::new(PieceKind::Pawn, Color::White)));
        assert!(board.is_empty(sq("e5")));
        assert!(board.is_empty(sq("d5")));
        assert_eq!(board.en_passant(), None);
    }

    #[test]
    fn test_promote_rules() {
        let mut board = Board::from_fen("P3k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        assert_eq!(board.pending_promotion(), Some((sq("a8"), Color::White)));

        let before = board.clone();
        let wrong_color = Piece::new(PieceKind::Queen, Color::Black);
        assert!(board.promote(sq("a8"), wrong_color).is_err());
        let king = Piece::new(PieceKind::King, Color::White);
        assert!(board.promote(sq("a8"), king).is_err());
        let pawn = Piece::new(PieceKind::Pawn, Color::White);
        assert!(board.promote(sq("a8"), pawn).is_err());
        let queen = Piece::new(PieceKind::Queen, Color::White);
        assert!(board.promote(sq("b8"), queen).is_err());
        assert_eq!(board, before);

        // Queen on a8 gives check along the back rank
        assert_eq!(board.promote(sq("a8"), queen), Ok(true));
        assert_eq!(board.get(sq("a8")), Some(queen));
        assert_eq!(board.pending_promotion(), None);
    }

    #[test]
    fn test_display() {
        let text = Board::new().to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 8);
        assert_eq!(lines[0], "r n b q k b n r");
        assert_eq!(lines[7], "R N B Q K B N R");
    }
}
