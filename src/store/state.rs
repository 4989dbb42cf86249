use std::collections::VecDeque;

use bytes::Bytes;
use tokio::{
    sync::oneshot,
    time::{Duration, Instant},
};
use tracing::debug;

use crate::{
    key_value_store::{KeyValueStore, ListEnd, Value},
    radix::{StreamEntry, StreamId},
    stream::{current_timestamp_millis, Stream, StreamIdRequest},
};

use super::{
    waiters::{ClientId, WaiterId, WaiterRegistry},
    StoreError,
};

/// Everything guarded by the store lock.
#[derive(Debug, Default)]
pub struct StoreState {
    entries: KeyValueStore,
    waiters: WaiterRegistry,
}

impl StoreState {
    /// Drops `key` if it holds an expired string.
    fn purge_expired(&mut self, key: &[u8]) {
        if self
            .entries
            .get(key)
            .is_some_and(|value| value.is_expired(Instant::now()))
        {
            debug!(key = ?key, "removing expired key");
            self.entries.remove(key);
        }
    }

    /// Read-only lookup that treats expired strings as absent.
    fn live(&self, key: &[u8]) -> Option<&Value> {
        self.entries
            .get(key)
            .filter(|value| !value.is_expired(Instant::now()))
    }

    pub fn set(&mut self, key: Bytes, data: Bytes, ttl: Option<Duration>) {
        let expiration = ttl.and_then(|ttl| Instant::now().checked_add(ttl));
        self.entries.insert(key, Value::String { data, expiration });
    }

    pub fn get(&mut self, key: &[u8]) -> Result<Option<Bytes>, StoreError> {
        self.purge_expired(key);

        match self.entries.get(key) {
            Some(Value::String { data, .. }) => Ok(Some(data.clone())),
            Some(_) => Err(StoreError::WrongType),
            None => Ok(None),
        }
    }

    pub fn key_type(&mut self, key: &[u8]) -> &'static str {
        self.purge_expired(key);

        self.entries.get(key).map_or("none", Value::type_name)
    }

    /// Pushes `values` one at a time and returns the resulting length. Waiters
    /// queued on the key are served afterwards, so the returned length counts
    /// elements they may take.
    pub fn push(&mut self, key: Bytes, values: Vec<Bytes>, end: ListEnd) -> Result<usize, StoreError> {
        self.purge_expired(&key);

        let value = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| Value::List(VecDeque::new()));

        let Value::List(list) = value else {
            return Err(StoreError::WrongType);
        };

        for element in values {
            end.push(list, element);
        }

        let length = list.len();
        self.serve_waiters(&key);

        Ok(length)
    }

    /// Hands elements of the list at `key` to its queued waiters, oldest first.
    fn serve_waiters(&mut self, key: &Bytes) {
        while let Some(id) = self.waiters.next_waiter(key) {
            let Some(Value::List(list)) = self.entries.get_mut(key) else {
                break;
            };

            if list.is_empty() {
                break;
            }

            let Some(mut waiter) = self.waiters.remove_waiter(id) else {
                break;
            };

            let Some(element) = waiter.end.pop(list) else {
                break;
            };

            if let Err(element) = waiter.deliver(key.clone(), element) {
                // The caller gave up between registering and now.
                waiter.end.push(list, element);
                continue;
            }

            debug!(key = ?key, client_id = waiter.client, "served blocked client");
        }

        self.remove_if_empty(key);
    }

    fn remove_if_empty(&mut self, key: &[u8]) {
        if matches!(self.entries.get(key), Some(Value::List(list)) if list.is_empty()) {
            self.entries.remove(key);
        }
    }

    pub fn pop(
        &mut self,
        key: &[u8],
        end: ListEnd,
        count: usize,
    ) -> Result<Option<Vec<Bytes>>, StoreError> {
        self.purge_expired(key);

        let Some(value) = self.entries.get_mut(key) else {
            return Ok(None);
        };

        let Value::List(list) = value else {
            return Err(StoreError::WrongType);
        };

        let popped: Vec<Bytes> = (0..count).map_while(|_| end.pop(list)).collect();
        self.remove_if_empty(key);

        Ok(Some(popped))
    }

    /// Pops from the first key in `keys` holding a non-empty list.
    pub fn pop_first_available(
        &mut self,
        keys: &[Bytes],
        end: ListEnd,
    ) -> Result<Option<(Bytes, Bytes)>, StoreError> {
        for key in keys {
            if let Some(mut popped) = self.pop(key, end, 1)? {
                if let Some(element) = popped.pop() {
                    return Ok(Some((key.clone(), element)));
                }
            }
        }

        Ok(None)
    }

    pub fn llen(&self, key: &[u8]) -> Result<usize, StoreError> {
        match self.live(key) {
            Some(Value::List(list)) => Ok(list.len()),
            Some(_) => Err(StoreError::WrongType),
            None => Ok(0),
        }
    }

    /// Elements in the inclusive index range that `normalize` derives from
    /// the current list length.
    pub fn lrange<F>(&self, key: &[u8], normalize: F) -> Result<Vec<Bytes>, StoreError>
    where
        F: FnOnce(usize) -> Option<(usize, usize)>,
    {
        let list = match self.live(key) {
            Some(Value::List(list)) => list,
            Some(_) => return Err(StoreError::WrongType),
            None => return Ok(Vec::new()),
        };

        Ok(match normalize(list.len()) {
            Some((start, end)) => list.range(start..=end).cloned().collect(),
            None => Vec::new(),
        })
    }

    pub fn add_waiter(
        &mut self,
        client: ClientId,
        keys: Vec<Bytes>,
        end: ListEnd,
    ) -> (WaiterId, oneshot::Receiver<(Bytes, Bytes)>) {
        self.waiters.add_waiter(client, keys, end)
    }

    /// Returns `true` when the waiter was still registered, meaning nothing
    /// was delivered to it.
    pub fn remove_waiter(&mut self, id: WaiterId) -> bool {
        self.waiters.remove_waiter(id).is_some()
    }

    pub fn remove_client_waiters(&mut self, client: ClientId) -> usize {
        self.waiters.remove_client_waiters(client)
    }

    pub fn waiting_on(&self, key: &[u8]) -> usize {
        self.waiters.waiting_on(key)
    }

    pub fn xadd(
        &mut self,
        key: Bytes,
        request: StreamIdRequest,
        fields: Vec<(Bytes, Bytes)>,
    ) -> Result<StreamId, StoreError> {
        self.purge_expired(&key);

        if let Some(value) = self.entries.get_mut(&key) {
            let Value::Stream(stream) = value else {
                return Err(StoreError::WrongType);
            };

            return Ok(stream.add(request, fields, current_timestamp_millis())?);
        }

        // A rejected ID must not leave an empty stream behind.
        let mut stream = Stream::new();
        let id = stream.add(request, fields, current_timestamp_millis())?;
        self.entries.insert(key, Value::Stream(stream));

        Ok(id)
    }

    pub fn xlen(&self, key: &[u8]) -> Result<usize, StoreError> {
        match self.live(key) {
            Some(Value::Stream(stream)) => Ok(stream.len()),
            Some(_) => Err(StoreError::WrongType),
            None => Ok(0),
        }
    }

    pub fn xrange(
        &self,
        key: &[u8],
        start: StreamId,
        end: StreamId,
        count: Option<usize>,
        reverse: bool,
    ) -> Result<Vec<StreamEntry>, StoreError> {
        let stream = match self.live(key) {
            Some(Value::Stream(stream)) => stream,
            Some(_) => return Err(StoreError::WrongType),
            None => return Ok(Vec::new()),
        };

        let entries = if reverse {
            stream.range_rev(start, end, count)
        } else {
            stream.range(start, end, count)
        };

        Ok(entries.into_iter().cloned().collect())
    }
}
