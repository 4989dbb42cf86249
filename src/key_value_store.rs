use std::collections::{HashMap, VecDeque};

use bytes::Bytes;
use tokio::time::Instant;

use crate::stream::Stream;

/// A stored value. Each key holds exactly one of these families.
#[derive(Debug)]
pub enum Value {
    String {
        data: Bytes,
        expiration: Option<Instant>,
    },
    List(VecDeque<Bytes>),
    Stream(Stream),
}

impl Value {
    /// Name reported by the TYPE command.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String { .. } => "string",
            Value::List(_) => "list",
            Value::Stream(_) => "stream",
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        match self {
            Value::String {
                expiration: Some(expiration),
                ..
            } => *expiration <= now,
            _ => false,
        }
    }
}

/// The end of a list a push or pop works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListEnd {
    Left,
    Right,
}

impl ListEnd {
    pub fn push(self, list: &mut VecDeque<Bytes>, value: Bytes) {
        match self {
            ListEnd::Left => list.push_front(value),
            ListEnd::Right => list.push_back(value),
        }
    }

    pub fn pop(self, list: &mut VecDeque<Bytes>) -> Option<Bytes> {
        match self {
            ListEnd::Left => list.pop_front(),
            ListEnd::Right => list.pop_back(),
        }
    }
}

pub type KeyValueStore = HashMap<Bytes, Value>;
