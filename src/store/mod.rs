//! The shared key space.
//!
//! All data lives in a [`StoreState`] behind a single `RwLock`. Read-only
//! commands take the read lock; anything that mutates, including lazy expiry
//! on GET and TYPE, takes the write lock. No lock is held across an await
//! point other than its own acquisition.

mod state;
mod waiters;

use bytes::Bytes;
use thiserror::Error;
use tokio::{
    sync::RwLock,
    time::{self, Duration},
};
use tracing::debug;

use crate::{
    key_value_store::ListEnd,
    radix::{StreamEntry, StreamId},
    stream::{StreamError, StreamIdRequest},
};

use state::StoreState;
pub use waiters::ClientId;

#[derive(Error, Debug, PartialEq)]
pub enum StoreError {
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,
    #[error(transparent)]
    Stream(#[from] StreamError),
}

#[derive(Debug, Default)]
pub struct Store {
    state: RwLock<StoreState>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a string, replacing whatever the key held before.
    pub async fn set(&self, key: Bytes, value: Bytes, ttl: Option<Duration>) {
        self.state.write().await.set(key, value, ttl);
    }

    pub async fn get(&self, key: &[u8]) -> Result<Option<Bytes>, StoreError> {
        self.state.write().await.get(key)
    }

    /// "string", "list", "stream" or "none".
    pub async fn key_type(&self, key: &[u8]) -> &'static str {
        self.state.write().await.key_type(key)
    }

    /// Pushes `values` in order and returns the list length before any blocked
    /// client is served.
    pub async fn push(
        &self,
        key: Bytes,
        values: Vec<Bytes>,
        end: ListEnd,
    ) -> Result<usize, StoreError> {
        self.state.write().await.push(key, values, end)
    }

    /// Pops up to `count` elements. `None` when the key does not exist.
    pub async fn pop(
        &self,
        key: &[u8],
        end: ListEnd,
        count: usize,
    ) -> Result<Option<Vec<Bytes>>, StoreError> {
        self.state.write().await.pop(key, end, count)
    }

    pub async fn llen(&self, key: &[u8]) -> Result<usize, StoreError> {
        self.state.read().await.llen(key)
    }

    /// Returns the elements between the inclusive indexes produced by
    /// `normalize`, which receives the list length under the lock.
    pub async fn lrange<F>(&self, key: &[u8], normalize: F) -> Result<Vec<Bytes>, StoreError>
    where
        F: FnOnce(usize) -> Option<(usize, usize)>,
    {
        self.state.read().await.lrange(key, normalize)
    }

    /// Pops one element from the first non-empty list among `keys`, waiting for
    /// a push if all of them are empty.
    ///
    /// # Arguments
    ///
    /// * `client` - The connection issuing the pop, used to clean up on disconnect
    /// * `keys` - Candidate list keys, checked in order
    /// * `end` - The end of the list to pop from
    /// * `timeout` - How long to wait; `None` waits forever
    ///
    /// # Returns
    ///
    /// * `Ok(Some((key, element)))` - The key that was popped from and its element
    /// * `Ok(None)` - The timeout elapsed, or the waiter was removed, before a push arrived
    pub async fn blocking_pop(
        &self,
        client: ClientId,
        keys: Vec<Bytes>,
        end: ListEnd,
        timeout: Option<Duration>,
    ) -> Result<Option<(Bytes, Bytes)>, StoreError> {
        let (waiter_id, mut receiver) = {
            let mut state = self.state.write().await;

            if let Some(popped) = state.pop_first_available(&keys, end)? {
                return Ok(Some(popped));
            }

            state.add_waiter(client, keys, end)
        };

        debug!(client_id = client, ?timeout, "client blocked");

        let Some(timeout) = timeout else {
            return Ok(receiver.await.ok());
        };

        match time::timeout(timeout, &mut receiver).await {
            Ok(delivered) => Ok(delivered.ok()),
            Err(_) => {
                let mut state = self.state.write().await;

                if state.remove_waiter(waiter_id) {
                    debug!(client_id = client, "blocking pop timed out");
                    Ok(None)
                } else {
                    // A push claimed this waiter before the timeout could.
                    Ok(receiver.try_recv().ok())
                }
            }
        }
    }

    /// Deregisters every waiter owned by a disconnected client.
    pub async fn remove_client_waiters(&self, client: ClientId) -> usize {
        self.state.write().await.remove_client_waiters(client)
    }

    /// Number of clients blocked on `key`.
    pub async fn waiting_on(&self, key: &[u8]) -> usize {
        self.state.read().await.waiting_on(key)
    }

    pub async fn xadd(
        &self,
        key: Bytes,
        request: StreamIdRequest,
        fields: Vec<(Bytes, Bytes)>,
    ) -> Result<StreamId, StoreError> {
        self.state.write().await.xadd(key, request, fields)
    }

    pub async fn xlen(&self, key: &[u8]) -> Result<usize, StoreError> {
        self.state.read().await.xlen(key)
    }

    pub async fn xrange(
        &self,
        key: &[u8],
        start: StreamId,
        end: StreamId,
        count: Option<usize>,
        reverse: bool,
    ) -> Result<Vec<StreamEntry>, StoreError> {
        self.state.read().await.xrange(key, start, end, count, reverse)
    }
}
