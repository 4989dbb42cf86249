use bytes::Bytes;

use crate::{
    commands::command_error::CommandError, key_value_store::ListEnd, resp::RespValue,
    store::Store,
};

pub struct PushArrayOperations {
    key: Bytes,
    values: Vec<Bytes>,
}

impl PushArrayOperations {
    pub fn parse(arguments: &[Bytes], end: ListEnd) -> Result<Self, CommandError> {
        let [key, values @ ..] = arguments else {
            return Err(wrong_arity(end));
        };

        if values.is_empty() {
            return Err(wrong_arity(end));
        }

        Ok(Self {
            key: key.clone(),
            values: values.to_vec(),
        })
    }
}

fn wrong_arity(end: ListEnd) -> CommandError {
    match end {
        ListEnd::Left => CommandError::WrongNumberOfArguments("lpush"),
        ListEnd::Right => CommandError::WrongNumberOfArguments("rpush"),
    }
}

pub async fn rpush(store: &Store, arguments: &[Bytes]) -> Result<RespValue, CommandError> {
    push_array_operations(store, arguments, ListEnd::Right).await
}

pub async fn lpush(store: &Store, arguments: &[Bytes]) -> Result<RespValue, CommandError> {
    push_array_operations(store, arguments, ListEnd::Left).await
}

/// Pushes every value onto one end of the list, creating it when needed.
///
/// Values are pushed one at a time in argument order, so for LPUSH the last
/// value ends up at the head. Replies with the length of the list right after
/// the push, before blocked clients take their share.
async fn push_array_operations(
    store: &Store,
    arguments: &[Bytes],
    end: ListEnd,
) -> Result<RespValue, CommandError> {
    let push_array_arguments = PushArrayOperations::parse(arguments, end)?;

    let length = store
        .push(push_array_arguments.key, push_array_arguments.values, end)
        .await?;

    Ok(RespValue::Integer(length as i64))
}
