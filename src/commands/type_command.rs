use bytes::Bytes;

use crate::{commands::command_error::CommandError, resp::RespValue, store::Store};

pub struct TypeArguments {
    key: Bytes,
}

impl TypeArguments {
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        let [key] = arguments else {
            return Err(CommandError::WrongNumberOfArguments("type"));
        };

        Ok(Self { key: key.clone() })
    }
}

/// Handles the Redis TYPE command.
///
/// Replies with `string`, `list`, `stream`, or `none` when the key is absent.
pub async fn type_command(store: &Store, arguments: &[Bytes]) -> Result<RespValue, CommandError> {
    let type_arguments = TypeArguments::parse(arguments)?;

    let type_name = store.key_type(&type_arguments.key).await;

    Ok(RespValue::SimpleString(type_name.to_string()))
}
