use bytes::Bytes;
use tokio::time::Duration;

use crate::{
    commands::command_error::CommandError,
    key_value_store::ListEnd,
    resp::RespValue,
    store::{ClientId, Store},
};

pub struct BlockingPopArguments {
    keys: Vec<Bytes>,
    /// `None` blocks until an element arrives
    timeout: Option<Duration>,
}

impl BlockingPopArguments {
    /// Parses `key [key ...] timeout`, where the timeout is a number of
    /// seconds that may have a fractional part and 0 means wait forever.
    pub fn parse(arguments: &[Bytes], end: ListEnd) -> Result<Self, CommandError> {
        let [keys @ .., timeout] = arguments else {
            return Err(wrong_arity(end));
        };

        if keys.is_empty() {
            return Err(wrong_arity(end));
        }

        Ok(Self {
            keys: keys.to_vec(),
            timeout: parse_timeout(timeout)?,
        })
    }
}

fn wrong_arity(end: ListEnd) -> CommandError {
    match end {
        ListEnd::Left => CommandError::WrongNumberOfArguments("blpop"),
        ListEnd::Right => CommandError::WrongNumberOfArguments("brpop"),
    }
}

fn parse_timeout(argument: &Bytes) -> Result<Option<Duration>, CommandError> {
    let seconds = std::str::from_utf8(argument)
        .ok()
        .and_then(|text| text.parse::<f64>().ok())
        .filter(|seconds| seconds.is_finite())
        .ok_or(CommandError::InvalidTimeout)?;

    if seconds < 0.0 {
        return Err(CommandError::NegativeTimeout);
    }

    if seconds == 0.0 {
        return Ok(None);
    }

    Duration::try_from_secs_f64(seconds)
        .map(Some)
        .map_err(|_| CommandError::InvalidTimeout)
}

pub async fn blpop(
    client: ClientId,
    store: &Store,
    arguments: &[Bytes],
) -> Result<RespValue, CommandError> {
    blocking_pop(client, store, arguments, ListEnd::Left).await
}

pub async fn brpop(
    client: ClientId,
    store: &Store,
    arguments: &[Bytes],
) -> Result<RespValue, CommandError> {
    blocking_pop(client, store, arguments, ListEnd::Right).await
}

/// Handles BLPOP and BRPOP.
///
/// # Returns
///
/// * `Ok(RespValue::Array)` - `[key, element]` for the list that was popped from
/// * `Ok(RespValue::Null)` - If the timeout elapsed first
/// * `Err(CommandError::Store)` - If one of the keys checked holds another type
async fn blocking_pop(
    client: ClientId,
    store: &Store,
    arguments: &[Bytes],
    end: ListEnd,
) -> Result<RespValue, CommandError> {
    let blocking_pop_arguments = BlockingPopArguments::parse(arguments, end)?;

    let popped = store
        .blocking_pop(
            client,
            blocking_pop_arguments.keys,
            end,
            blocking_pop_arguments.timeout,
        )
        .await?;

    match popped {
        Some((key, value)) => Ok(RespValue::encode_array_from_bytes([key, value])),
        None => Ok(RespValue::Null),
    }
}
