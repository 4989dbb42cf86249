//! Path-compressed radix tree holding stream entries.
//!
//! Entries are keyed by the 8-byte big-endian encoding of their millisecond
//! timestamp. Every node stores the bytes of its incoming edge; the node whose
//! accumulated path spells a full timestamp keeps the entries sharing that
//! timestamp, ordered by sequence number. Children are kept in a `BTreeMap`
//! keyed by the first byte of their edge, so a depth-first walk visits
//! timestamps in ascending order.

use std::{
    collections::{btree_map::Entry, BTreeMap},
    fmt, mem,
};

use bytes::Bytes;
use thiserror::Error;

/// Number of key bytes in a timestamp path.
pub const TIMESTAMP_WIDTH: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct StreamId {
    pub ms: u64,
    pub seq: u64,
}

impl StreamId {
    pub const MIN: StreamId = StreamId { ms: 0, seq: 0 };
    pub const MAX: StreamId = StreamId {
        ms: u64::MAX,
        seq: u64::MAX,
    };

    pub fn new(ms: u64, seq: u64) -> Self {
        Self { ms, seq }
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.ms, self.seq)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreamEntry {
    pub id: StreamId,
    pub fields: Vec<(Bytes, Bytes)>,
}

#[derive(Error, Debug, PartialEq)]
pub enum RadixError {
    #[error("an entry with ID {0} already exists")]
    DuplicateId(StreamId),
    #[error("no sequence number left for timestamp {0}")]
    SequenceExhausted(u64),
}

#[derive(Debug, Default)]
struct RadixNode {
    prefix: Vec<u8>,
    children: BTreeMap<u8, RadixNode>,
    entries: Vec<StreamEntry>,
}

impl RadixNode {
    fn leaf(prefix: &[u8]) -> Self {
        Self {
            prefix: prefix.to_vec(),
            ..Self::default()
        }
    }

    /// Splits the edge after `at` bytes. The tail of the prefix, together with
    /// the current children and entries, moves into a new child node.
    fn split(&mut self, at: usize) {
        let suffix = self.prefix.split_off(at);

        let child = RadixNode {
            prefix: suffix,
            children: mem::take(&mut self.children),
            entries: mem::take(&mut self.entries),
        };

        self.children.insert(child.prefix[0], child);
    }

    fn insert_entry(
        &mut self,
        ms: u64,
        seq: Option<u64>,
        fields: Vec<(Bytes, Bytes)>,
    ) -> Result<StreamId, RadixError> {
        let seq = match seq {
            Some(seq) => seq,
            None => match self.entries.last() {
                Some(last) => last
                    .id
                    .seq
                    .checked_add(1)
                    .ok_or(RadixError::SequenceExhausted(ms))?,
                None => 0,
            },
        };

        let id = StreamId::new(ms, seq);

        match self.entries.binary_search_by(|entry| entry.id.seq.cmp(&seq)) {
            Ok(_) => Err(RadixError::DuplicateId(id)),
            Err(position) => {
                self.entries.insert(position, StreamEntry { id, fields });
                Ok(id)
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct RadixTree {
    root: RadixNode,
    len: usize,
}

impl RadixTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Inserts an entry under timestamp `ms`.
    ///
    /// When `seq` is `None` the entry gets the next sequence number after the
    /// largest one already stored for `ms`, or 0 if the timestamp is new.
    pub fn insert(
        &mut self,
        ms: u64,
        seq: Option<u64>,
        fields: Vec<(Bytes, Bytes)>,
    ) -> Result<StreamId, RadixError> {
        let key = ms.to_be_bytes();
        let mut node = &mut self.root;
        let mut depth = 0;

        while depth < TIMESTAMP_WIDTH {
            let remaining = &key[depth..];

            match node.children.entry(remaining[0]) {
                Entry::Vacant(slot) => {
                    let leaf = slot.insert(RadixNode::leaf(remaining));
                    let id = leaf.insert_entry(ms, seq, fields)?;
                    self.len += 1;

                    return Ok(id);
                }
                Entry::Occupied(slot) => {
                    let child = slot.into_mut();
                    let shared = common_prefix_length(&child.prefix, remaining);

                    if shared < child.prefix.len() {
                        child.split(shared);
                    }

                    depth += shared;
                    node = child;
                }
            }
        }

        let id = node.insert_entry(ms, seq, fields)?;
        self.len += 1;

        Ok(id)
    }

    /// Entries with `start <= id <= end` in ascending order, at most `limit`.
    pub fn range(&self, start: StreamId, end: StreamId, limit: Option<usize>) -> Vec<&StreamEntry> {
        self.scan(start, end, limit, false)
    }

    /// Entries with `start <= id <= end` in descending order, at most `limit`.
    pub fn range_rev(
        &self,
        start: StreamId,
        end: StreamId,
        limit: Option<usize>,
    ) -> Vec<&StreamEntry> {
        self.scan(start, end, limit, true)
    }

    fn scan(
        &self,
        start: StreamId,
        end: StreamId,
        limit: Option<usize>,
        reverse: bool,
    ) -> Vec<&StreamEntry> {
        if start > end {
            return Vec::new();
        }

        let mut scan = RangeScan {
            start,
            end,
            reverse,
            limit: limit.unwrap_or(usize::MAX),
            found: Vec::new(),
        };

        scan.visit(&self.root, &mut Vec::with_capacity(TIMESTAMP_WIDTH));
        scan.found
    }
}

struct RangeScan<'a> {
    start: StreamId,
    end: StreamId,
    reverse: bool,
    limit: usize,
    found: Vec<&'a StreamEntry>,
}

impl<'a> RangeScan<'a> {
    fn visit(&mut self, node: &'a RadixNode, path: &mut Vec<u8>) {
        if self.found.len() >= self.limit {
            return;
        }

        path.extend_from_slice(&node.prefix);
        let (lowest, highest) = reachable_timestamps(path);

        if highest >= self.start.ms && lowest <= self.end.ms {
            if path.len() == TIMESTAMP_WIDTH {
                self.collect_entries(node);
            } else if self.reverse {
                for child in node.children.values().rev() {
                    self.visit(child, path);
                }
            } else {
                for child in node.children.values() {
                    self.visit(child, path);
                }
            }
        }

        path.truncate(path.len() - node.prefix.len());
    }

    /// Collects the entries of a full-timestamp node. Only a node equal to one
    /// of the boundary timestamps needs its sequence numbers checked.
    fn collect_entries(&mut self, node: &'a RadixNode) {
        let (start, end) = (self.start, self.end);
        let in_range = |entry: &&'a StreamEntry| entry.id >= start && entry.id <= end;

        let remaining = self.limit - self.found.len();

        if self.reverse {
            self.found
                .extend(node.entries.iter().rev().filter(in_range).take(remaining));
        } else {
            self.found
                .extend(node.entries.iter().filter(in_range).take(remaining));
        }
    }
}

/// Smallest and largest timestamps whose big-endian encoding starts with `path`.
fn reachable_timestamps(path: &[u8]) -> (u64, u64) {
    let mut lowest = [0x00u8; TIMESTAMP_WIDTH];
    let mut highest = [0xFFu8; TIMESTAMP_WIDTH];

    lowest[..path.len()].copy_from_slice(path);
    highest[..path.len()].copy_from_slice(path);

    (u64::from_be_bytes(lowest), u64::from_be_bytes(highest))
}

fn common_prefix_length(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}
