use crate::board::{Color, Piece, Square};
use crate::movegen::Move;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Largest payload a client may send.
pub const CLIENT_MAX_PAYLOAD: usize = u8::MAX as usize;

/// Largest payload accepted from the server.
pub const SERVER_MAX_PAYLOAD: usize = 64 * 1024;

pub const WRITE_TIMEOUT: Duration = Duration::from_secs(30);

const TAG_JOIN: u8 = 0;
const TAG_PLAYER: u8 = 1;
const TAG_TEAM: u8 = 2;
const TAG_NEW_GAME: u8 = 3;
const TAG_MOVE: u8 = 4;
const TAG_PROMOTE: u8 = 5;
const TAG_GAME_COMPLETE: u8 = 6;
const TAG_OPPONENT_JOINED: u8 = 7;
const TAG_OPPONENT_LEFT: u8 = 8;
const TAG_ERROR: u8 = 9;
const TAG_PING: u8 = 10;

/// Which side of the connection wrote a frame. Decides the length encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Server,
    Client,
}

impl Endpoint {
    pub fn peer(&self) -> Endpoint {
        match self {
            Endpoint::Server => Endpoint::Client,
            Endpoint::Client => Endpoint::Server,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    Stalemate,
    WhiteWin,
    BlackWin,
}

impl GameResult {
    pub fn win_for(color: Color) -> Self {
        match color {
            Color::White => GameResult::WhiteWin,
            Color::Black => GameResult::BlackWin,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Ask for a player seat, or to watch when `player` is false.
    Join { player: bool },
    /// Seat granted; `one` marks the player allowed to start games.
    Player { one: bool },
    Team { color: Color },
    NewGame,
    Move(Move),
    /// With no piece this asks the receiver to pick one; otherwise it is a
    /// choice (client to server) or an applied promotion (server to client).
    Promote { square: Square, piece: Option<Piece> },
    GameComplete { result: GameResult },
    OpponentJoined,
    OpponentLeft,
    Error { msg: String },
    Ping,
}

impl Message {
    pub fn tag(&self) -> u8 {
        match self {
            Message::Join { .. } => TAG_JOIN,
            Message::Player { .. } => TAG_PLAYER,
            Message::Team { .. } => TAG_TEAM,
            Message::NewGame => TAG_NEW_GAME,
            Message::Move(_) => TAG_MOVE,
            Message::Promote { .. } => TAG_PROMOTE,
            Message::GameComplete { .. } => TAG_GAME_COMPLETE,
            Message::OpponentJoined => TAG_OPPONENT_JOINED,
            Message::OpponentLeft => TAG_OPPONENT_LEFT,
            Message::Error { .. } => TAG_ERROR,
            Message::Ping => TAG_PING,
        }
    }

    fn payload(&self) -> Result<Vec<u8>, ProtocolError> {
        let encoded = match self {
            Message::Join { player } => bincode::serialize(player),
            Message::Player { one } => bincode::serialize(one),
            Message::Team { color } => bincode::serialize(color),
            Message::Move(mv) => bincode::serialize(mv),
            Message::Promote { square, piece } => bincode::serialize(&(square, piece)),
            Message::GameComplete { result } => bincode::serialize(result),
            Message::Error { msg } => bincode::serialize(msg),
            Message::NewGame | Message::OpponentJoined | Message::OpponentLeft | Message::Ping => Ok(Vec::new()),
        };
        encoded.map_err(ProtocolError::Encode)
    }

    fn decode(tag: u8, payload: &[u8]) -> Result<Self, ProtocolError> {
        let message = match tag {
            TAG_JOIN => Message::Join {
                player: decode_field(tag, payload)?,
            },
            TAG_PLAYER => Message::Player {
                one: decode_field(tag, payload)?,
            },
            TAG_TEAM => Message::Team {
                color: decode_field(tag, payload)?,
            },
            TAG_NEW_GAME => Message::NewGame,
            TAG_MOVE => Message::Move(decode_field(tag, payload)?),
            TAG_PROMOTE => {
                let (square, piece): (Square, Option<Piece>) = decode_field(tag, payload)?;
                Message::Promote { square, piece }
            }
            TAG_GAME_COMPLETE => Message::GameComplete {
                result: decode_field(tag, payload)?,
            },
            TAG_OPPONENT_JOINED => Message::OpponentJoined,
            TAG_OPPONENT_LEFT => Message::OpponentLeft,
            TAG_ERROR => Message::Error {
                msg: decode_field(tag, payload)?,
            },
            TAG_PING => Message::Ping,
            other => return Err(ProtocolError::UnknownTag(other)),
        };
        Ok(message)
    }
}

fn decode_field<T: DeserializeOwned>(tag: u8, payload: &[u8]) -> Result<T, ProtocolError> {
    bincode::deserialize(payload).map_err(|source| ProtocolError::Decode { tag, source })
}

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("websocket error: {0}")]
    WebSocket(#[from] websocket::Error),

    #[error("unknown message tag {0}")]
    UnknownTag(u8),

    #[error("payload of {len} bytes exceeds the {max} byte limit")]
    PayloadTooLarge { len: usize, max: usize },

    #[error("malformed payload for tag {tag}: {source}")]
    Decode { tag: u8, source: bincode::Error },

    #[error("failed to encode message: {0}")]
    Encode(bincode::Error),

    #[error("length prefix does not fit in 64 bits")]
    VarintOverflow,

    #[error("outbound queue is full")]
    QueueFull,

    #[error("connection closed")]
    Closed,
}

impl ProtocolError {
    /// The peer hung up between frames or mid-frame.
    pub fn is_eof(&self) -> bool {
        matches!(self, ProtocolError::Io(err) if err.kind() == io::ErrorKind::UnexpectedEof)
    }
}

/// Builds the frame for `msg` as written by `sender`.
///
/// A frame is a one-byte tag followed by a length and a bincode payload.
/// Clients write a single length byte, the server an unsigned LEB128 length.
/// `Ping` is the bare tag in both directions.
pub fn encode(msg: &Message, sender: Endpoint) -> Result<Vec<u8>, ProtocolError> {
    let tag = msg.tag();
    if tag == TAG_PING {
        return Ok(vec![tag]);
    }

    let payload = msg.payload()?;
    let mut frame = Vec::with_capacity(payload.len() + 4);
    frame.push(tag);
    match sender {
        Endpoint::Client => {
            let len = u8::try_from(payload.len()).map_err(|_| ProtocolError::PayloadTooLarge {
                len: payload.len(),
                max: CLIENT_MAX_PAYLOAD,
            })?;
            frame.push(len);
        }
        Endpoint::Server => {
            if payload.len() > SERVER_MAX_PAYLOAD {
                return Err(ProtocolError::PayloadTooLarge {
                    len: payload.len(),
                    max: SERVER_MAX_PAYLOAD,
                });
            }
            write_varint(&mut frame, payload.len() as u64);
        }
    }
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Cuts the first frame written by the peer of `receiver` off `buf`.
/// Returns the message and the number of bytes it used, or `None` while the
/// frame is still incomplete.
pub fn decode_frame(buf: &[u8], receiver: Endpoint) -> Result<Option<(Message, usize)>, ProtocolError> {
    let tag = match buf.first() {
        Some(&tag) => tag,
        None => return Ok(None),
    };
    if tag == TAG_PING {
        return Ok(Some((Message::Ping, 1)));
    }
    if tag > TAG_PING {
        return Err(ProtocolError::UnknownTag(tag));
    }

    let (len, header) = match receiver.peer() {
        Endpoint::Client => match buf.get(1) {
            Some(&len) => (len as usize, 2),
            None => return Ok(None),
        },
        Endpoint::Server => match read_varint(&buf[1..])? {
            Some((len, used)) => {
                if len > SERVER_MAX_PAYLOAD as u64 {
                    return Err(ProtocolError::PayloadTooLarge {
                        len: usize::try_from(len).unwrap_or(usize::MAX),
                        max: SERVER_MAX_PAYLOAD,
                    });
                }
                (len as usize, 1 + used)
            }
            None => return Ok(None),
        },
    };

    let end = header + len;
    if buf.len() < end {
        return Ok(None);
    }
    Message::decode(tag, &buf[header..end]).map(|msg| Some((msg, end)))
}

pub fn write_varint(buf: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        buf.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    buf.push(value as u8);
}

/// Decodes a LEB128 value from the front of `buf`, returning it with the
/// number of bytes read. `None` means more bytes are needed.
pub fn read_varint(buf: &[u8]) -> Result<Option<(u64, usize)>, ProtocolError> {
    let mut value = 0u64;
    for (i, &byte) in buf.iter().enumerate() {
        if i == 10 {
            return Err(ProtocolError::VarintOverflow);
        }
        let shift = 7 * i as u32;
        let bits = u64::from(byte & 0x7f);
        if shift == 63 && bits > 1 {
            return Err(ProtocolError::VarintOverflow);
        }
        value |= bits << shift;
        if byte & 0x80 == 0 {
            return Ok(Some((value, i + 1)));
        }
    }
    Ok(None)
}

/// Bytes received from one peer, waiting to be cut into messages. Frames may
/// arrive split across, or packed into, transport messages.
#[derive(Debug)]
pub struct FrameBuffer {
    receiver: Endpoint,
    pending: Vec<u8>,
}

impl FrameBuffer {
    pub fn new(receiver: Endpoint) -> Self {
        Self {
            receiver,
            pending: Vec::new(),
        }
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// The next complete message, if one has fully arrived.
    pub fn next_message(&mut self) -> Result<Option<Message>, ProtocolError> {
        match decode_frame(&self.pending, self.receiver)? {
            Some((msg, used)) => {
                self.pending.drain(..used);
                Ok(Some(msg))
            }
            None => Ok(None),
        }
    }
}

/// Sending half of a connection's bounded outbound queue.
///
/// `send` never waits: a full queue means the peer is not keeping up and
/// the caller should drop the connection.
#[derive(Debug, Clone)]
pub struct Outbox {
    sender: Endpoint,
    frames: mpsc::Sender<Vec<u8>>,
}

impl Outbox {
    pub fn channel(sender: Endpoint, capacity: usize) -> (Outbox, mpsc::Receiver<Vec<u8>>) {
        let (frames, rx) = mpsc::channel(capacity.max(1));
        (Outbox { sender, frames }, rx)
    }

    pub fn send(&self, msg: &Message) -> Result<(), ProtocolError> {
        let frame = encode(msg, self.sender)?;
        self.frames.try_send(frame).map_err(|err| match err {
            TrySendError::Full(_) => ProtocolError::QueueFull,
            TrySendError::Closed(_) => ProtocolError::Closed,
        })
    }

    pub fn is_closed(&self) -> bool {
        self.frames.is_closed()
    }
}
