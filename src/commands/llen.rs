use bytes::Bytes;

use crate::{commands::command_error::CommandError, resp::RespValue, store::Store};

pub struct LlenArguments {
    key: Bytes,
}

impl LlenArguments {
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        let [key] = arguments else {
            return Err(CommandError::WrongNumberOfArguments("llen"));
        };

        Ok(Self { key: key.clone() })
    }
}

/// Handles the Redis LLEN command. A missing key has length 0.
pub async fn llen(store: &Store, arguments: &[Bytes]) -> Result<RespValue, CommandError> {
    let llen_arguments = LlenArguments::parse(arguments)?;

    let length = store.llen(&llen_arguments.key).await?;

    Ok(RespValue::Integer(length as i64))
}
