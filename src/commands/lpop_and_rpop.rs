use bytes::Bytes;

use crate::{
    commands::{command_error::CommandError, command_utils::parse_integer},
    key_value_store::ListEnd,
    resp::RespValue,
    store::Store,
};

pub struct PopArguments {
    key: Bytes,
    /// `None` when the client did not pass a count
    count: Option<usize>,
}

impl PopArguments {
    pub fn parse(arguments: &[Bytes], end: ListEnd) -> Result<Self, CommandError> {
        let (key, count) = match arguments {
            [key] => (key, None),
            [key, count] => {
                let count = parse_integer::<i64>(count)?;

                if count < 0 {
                    return Err(CommandError::NotPositive);
                }

                (key, Some(count as usize))
            }
            _ => {
                return Err(match end {
                    ListEnd::Left => CommandError::WrongNumberOfArguments("lpop"),
                    ListEnd::Right => CommandError::WrongNumberOfArguments("rpop"),
                })
            }
        };

        Ok(Self {
            key: key.clone(),
            count,
        })
    }
}

pub async fn lpop(store: &Store, arguments: &[Bytes]) -> Result<RespValue, CommandError> {
    pop_operations(store, arguments, ListEnd::Left).await
}

pub async fn rpop(store: &Store, arguments: &[Bytes]) -> Result<RespValue, CommandError> {
    pop_operations(store, arguments, ListEnd::Right).await
}

/// Handles LPOP and RPOP.
///
/// Without a count the reply is the single popped element as a bulk string.
/// With a count it is an array of up to that many elements in removal order.
/// A missing key replies null either way.
async fn pop_operations(
    store: &Store,
    arguments: &[Bytes],
    end: ListEnd,
) -> Result<RespValue, CommandError> {
    let pop_arguments = PopArguments::parse(arguments, end)?;

    let popped = store
        .pop(&pop_arguments.key, end, pop_arguments.count.unwrap_or(1))
        .await?;

    let Some(mut popped) = popped else {
        return Ok(RespValue::Null);
    };

    match pop_arguments.count {
        Some(_) => Ok(RespValue::encode_array_from_bytes(popped)),
        None => Ok(popped.pop().map_or(RespValue::Null, RespValue::BulkString)),
    }
}
