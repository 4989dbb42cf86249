//! An in-memory server speaking a subset of the Redis protocol.
//!
//! Supported commands:
//!
//! - Strings with optional expiry (SET, GET)
//! - Lists, including blocking pops (LPUSH, RPUSH, LPOP, RPOP, LLEN, LRANGE, BLPOP, BRPOP)
//! - Streams backed by a radix tree (XADD, XLEN, XRANGE, XREVRANGE)
//! - Server commands (PING, ECHO, TYPE)
//!
//! Clients talk RESP over TCP. Every connection runs in its own Tokio task and
//! all of them share one [`store::Store`].

pub mod commands;
pub mod connection;
pub mod key_value_store;
pub mod radix;
pub mod resp;
pub mod server;
pub mod store;
pub mod stream;
