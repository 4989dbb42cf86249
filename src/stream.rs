use std::{
    str::FromStr,
    time::{SystemTime, UNIX_EPOCH},
};

use bytes::Bytes;
use thiserror::Error;

use crate::radix::{RadixError, RadixTree, StreamEntry, StreamId};

#[derive(Error, Debug, PartialEq)]
pub enum StreamError {
    #[error("Invalid stream ID specified as stream command argument")]
    InvalidId,
    #[error("The ID specified in XADD must be greater than 0-0")]
    IdZero,
    #[error("The ID specified in XADD is equal or smaller than the target stream top item")]
    IdTooSmall,
    #[error(transparent)]
    Index(#[from] RadixError),
}

/// The ID argument of XADD.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamIdRequest {
    /// `*`: timestamp and sequence chosen by the server.
    Auto,
    /// `<ms>-*`: explicit timestamp, next free sequence number.
    AutoSequence(u64),
    /// `<ms>-<seq>`, or a bare `<ms>` meaning sequence 0.
    Explicit(StreamId),
}

impl FromStr for StreamIdRequest {
    type Err = StreamError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if input == "*" {
            return Ok(StreamIdRequest::Auto);
        }

        match input.split_once('-') {
            Some((ms, "*")) => Ok(StreamIdRequest::AutoSequence(parse_id_part(ms)?)),
            Some((ms, seq)) => Ok(StreamIdRequest::Explicit(StreamId::new(
                parse_id_part(ms)?,
                parse_id_part(seq)?,
            ))),
            None => Ok(StreamIdRequest::Explicit(StreamId::new(
                parse_id_part(input)?,
                0,
            ))),
        }
    }
}

/// Which end of an XRANGE interval a bound argument describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundKind {
    Start,
    End,
}

/// Parses an XRANGE/XREVRANGE bound.
///
/// `-` and `+` stand for the smallest and largest possible IDs. A bare
/// timestamp covers every sequence number of that millisecond, so it resolves
/// to sequence 0 as a start bound and to the largest sequence as an end bound.
///
/// # Examples
///
/// ```
/// use redis_lite::radix::StreamId;
/// use redis_lite::stream::{parse_range_bound, BoundKind};
///
/// assert_eq!(parse_range_bound("-", BoundKind::Start), Ok(StreamId::MIN));
/// assert_eq!(parse_range_bound("5", BoundKind::End), Ok(StreamId::new(5, u64::MAX)));
/// assert_eq!(parse_range_bound("5-3", BoundKind::End), Ok(StreamId::new(5, 3)));
/// ```
pub fn parse_range_bound(input: &str, kind: BoundKind) -> Result<StreamId, StreamError> {
    match input {
        "-" => Ok(StreamId::MIN),
        "+" => Ok(StreamId::MAX),
        _ => match input.split_once('-') {
            Some((ms, seq)) => Ok(StreamId::new(parse_id_part(ms)?, parse_id_part(seq)?)),
            None => {
                let ms = parse_id_part(input)?;

                Ok(match kind {
                    BoundKind::Start => StreamId::new(ms, 0),
                    BoundKind::End => StreamId::new(ms, u64::MAX),
                })
            }
        },
    }
}

fn parse_id_part(part: &str) -> Result<u64, StreamError> {
    if part.is_empty() || !part.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(StreamError::InvalidId);
    }

    part.parse::<u64>().map_err(|_| StreamError::InvalidId)
}

/// Milliseconds since the Unix epoch.
pub fn current_timestamp_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as u64)
        .unwrap_or_default()
}

/// Append-only log of entries with strictly increasing IDs.
#[derive(Debug, Default)]
pub struct Stream {
    index: RadixTree,
    last_id: StreamId,
}

impl Stream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Appends an entry and returns the ID it was stored under.
    ///
    /// # Arguments
    ///
    /// * `request` - The ID requested by the client
    /// * `fields` - Field/value pairs in the order they were given
    /// * `now_ms` - Current wall-clock time, used for fully automatic IDs
    pub fn add(
        &mut self,
        request: StreamIdRequest,
        fields: Vec<(Bytes, Bytes)>,
        now_ms: u64,
    ) -> Result<StreamId, StreamError> {
        let last = self.last_id;

        let (ms, seq) = match request {
            StreamIdRequest::Auto => {
                let ms = now_ms.max(last.ms);

                if ms == last.ms && last.seq == u64::MAX {
                    (ms.checked_add(1).ok_or(StreamError::IdTooSmall)?, None)
                } else if ms == 0 && self.is_empty() {
                    (0, Some(1))
                } else {
                    (ms, None)
                }
            }
            StreamIdRequest::AutoSequence(ms) => {
                if ms < last.ms {
                    return Err(StreamError::IdTooSmall);
                }

                if ms == 0 && self.is_empty() {
                    (0, Some(1))
                } else {
                    (ms, None)
                }
            }
            StreamIdRequest::Explicit(id) => {
                if id == StreamId::MIN {
                    return Err(StreamError::IdZero);
                }

                if id <= last {
                    return Err(StreamError::IdTooSmall);
                }

                (id.ms, Some(id.seq))
            }
        };

        let id = self.index.insert(ms, seq, fields).map_err(|err| match err {
            RadixError::SequenceExhausted(_) => StreamError::IdTooSmall,
            other => StreamError::Index(other),
        })?;
        self.last_id = id;

        Ok(id)
    }

    /// Entries within `[start, end]`, ascending, at most `count`.
    pub fn range(&self, start: StreamId, end: StreamId, count: Option<usize>) -> Vec<&StreamEntry> {
        self.index.range(start, end, count)
    }

    /// Entries within `[start, end]`, descending, at most `count`.
    pub fn range_rev(
        &self,
        start: StreamId,
        end: StreamId,
        count: Option<usize>,
    ) -> Vec<&StreamEntry> {
        self.index.range_rev(start, end, count)
    }
}
