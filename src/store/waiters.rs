use std::collections::{HashMap, VecDeque};

use bytes::Bytes;
use tokio::sync::oneshot;

use crate::key_value_store::ListEnd;

/// Identifies a client connection for the lifetime of the server.
pub type ClientId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WaiterId(u64);

/// A suspended blocking pop.
#[derive(Debug)]
pub struct Waiter {
    pub client: ClientId,
    pub end: ListEnd,
    pub keys: Vec<Bytes>,
    /// Taken by the first delivery
    sender: Option<oneshot::Sender<(Bytes, Bytes)>>,
}

impl Waiter {
    /// Hands a popped element to the suspended caller. A waiter accepts one
    /// element at most.
    ///
    /// Gives the element back when the receiving side is gone or the waiter
    /// was already served.
    pub fn deliver(&mut self, key: Bytes, value: Bytes) -> Result<(), Bytes> {
        match self.sender.take() {
            Some(sender) => sender.send((key, value)).map_err(|(_, value)| value),
            None => Err(value),
        }
    }
}

/// FIFO queues of waiters per list key. A waiter sits in the queue of every
/// key it names until it is removed, which happens before it is served.
#[derive(Debug, Default)]
pub struct WaiterRegistry {
    next_id: u64,
    waiters: HashMap<WaiterId, Waiter>,
    queues: HashMap<Bytes, VecDeque<WaiterId>>,
}

impl WaiterRegistry {
    /// Registers a waiter at the back of the queue of every key it names.
    pub fn add_waiter(
        &mut self,
        client: ClientId,
        keys: Vec<Bytes>,
        end: ListEnd,
    ) -> (WaiterId, oneshot::Receiver<(Bytes, Bytes)>) {
        let id = WaiterId(self.next_id);
        self.next_id += 1;

        let mut unique_keys: Vec<Bytes> = Vec::with_capacity(keys.len());
        for key in keys {
            if !unique_keys.contains(&key) {
                unique_keys.push(key);
            }
        }

        for key in &unique_keys {
            self.queues.entry(key.clone()).or_default().push_back(id);
        }

        let (sender, receiver) = oneshot::channel();

        self.waiters.insert(
            id,
            Waiter {
                client,
                end,
                keys: unique_keys,
                sender: Some(sender),
            },
        );

        (id, receiver)
    }

    /// Removes a waiter from every queue it is registered in. Queues left
    /// empty are dropped.
    pub fn remove_waiter(&mut self, id: WaiterId) -> Option<Waiter> {
        let waiter = self.waiters.remove(&id)?;

        for key in &waiter.keys {
            if let Some(queue) = self.queues.get_mut(key) {
                queue.retain(|queued| *queued != id);

                if queue.is_empty() {
                    self.queues.remove(key);
                }
            }
        }

        Some(waiter)
    }

    /// Removes every waiter owned by `client` and returns how many there were.
    pub fn remove_client_waiters(&mut self, client: ClientId) -> usize {
        let ids: Vec<WaiterId> = self
            .waiters
            .iter()
            .filter(|(_, waiter)| waiter.client == client)
            .map(|(id, _)| *id)
            .collect();

        for id in &ids {
            self.remove_waiter(*id);
        }

        ids.len()
    }

    /// Oldest waiter queued on `key`.
    pub fn next_waiter(&self, key: &[u8]) -> Option<WaiterId> {
        self.queues.get(key)?.front().copied()
    }

    pub fn waiting_on(&self, key: &[u8]) -> usize {
        self.queues.get(key).map_or(0, VecDeque::len)
    }
}
