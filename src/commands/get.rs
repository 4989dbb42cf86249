use bytes::Bytes;

use crate::{commands::command_error::CommandError, resp::RespValue, store::Store};

/// Represents the parsed arguments for GET command
pub struct GetArguments {
    /// The key name to retrieve from the store
    key: Bytes,
}

impl GetArguments {
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        let [key] = arguments else {
            return Err(CommandError::WrongNumberOfArguments("get"));
        };

        Ok(Self { key: key.clone() })
    }
}

/// Handles the Redis GET command.
///
/// # Returns
///
/// * `Ok(RespValue::BulkString)` - The stored value
/// * `Ok(RespValue::Null)` - If the key does not exist or has expired
/// * `Err(CommandError::Store)` - If the key holds a list or a stream
pub async fn get(store: &Store, arguments: &[Bytes]) -> Result<RespValue, CommandError> {
    let get_arguments = GetArguments::parse(arguments)?;

    match store.get(&get_arguments.key).await? {
        Some(value) => Ok(RespValue::BulkString(value)),
        None => Ok(RespValue::Null),
    }
}
