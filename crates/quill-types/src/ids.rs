use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which kind of chat a peer id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PeerNamespace {
    User,
    Group,
    Channel,
    SecretChat,
}

impl PeerNamespace {
    pub fn as_i32(self) -> i32 {
        match self {
            Self::User => 0,
            Self::Group => 1,
            Self::Channel => 2,
            Self::SecretChat => 3,
        }
    }

    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::User),
            1 => Some(Self::Group),
            2 => Some(Self::Channel),
            3 => Some(Self::SecretChat),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeerId {
    pub namespace: PeerNamespace,
    pub id: i64,
}

impl PeerId {
    pub fn new(namespace: PeerNamespace, id: i64) -> Self {
        Self { namespace, id }
    }

    pub fn is_secret_chat(&self) -> bool {
        self.namespace == PeerNamespace::SecretChat
    }
}

/// Message namespaces within a peer.
pub mod namespaces {
    pub const CLOUD: i32 = 0;
}

/// Storage key of a message: (peer, namespace, id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId {
    pub peer_id: PeerId,
    pub namespace: i32,
    pub id: i32,
}

impl MessageId {
    pub fn new(peer_id: PeerId, namespace: i32, id: i32) -> Self {
        Self { peer_id, namespace, id }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdParseError {
    #[error("expected 4 ':'-separated components, got {0}")]
    WrongArity(usize),
    #[error("invalid integer component '{0}'")]
    InvalidNumber(String),
    #[error("unknown peer namespace {0}")]
    UnknownNamespace(i32),
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace.as_i32(), self.id)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.peer_id, self.namespace, self.id)
    }
}

fn parse_part<T: FromStr>(part: &str) -> Result<T, IdParseError> {
    part.parse()
        .map_err(|_| IdParseError::InvalidNumber(part.to_string()))
}

fn parse_namespace(part: &str) -> Result<PeerNamespace, IdParseError> {
    let raw: i32 = parse_part(part)?;
    PeerNamespace::from_i32(raw).ok_or(IdParseError::UnknownNamespace(raw))
}

impl FromStr for PeerId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 2 {
            return Err(IdParseError::WrongArity(parts.len()));
        }
        Ok(Self::new(parse_namespace(parts[0])?, parse_part(parts[1])?))
    }
}

/// Parses the `"{peerNamespace}:{peerId}:{namespace}:{id}"` form used in URLs.
impl FromStr for MessageId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 4 {
            return Err(IdParseError::WrongArity(parts.len()));
        }
        let peer_id = PeerId::new(parse_namespace(parts[0])?, parse_part(parts[1])?);
        Ok(Self::new(peer_id, parse_part(parts[2])?, parse_part(parts[3])?))
    }
}
