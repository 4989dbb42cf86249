use bytes::Bytes;

use crate::{commands::command_error::CommandError, resp::RespValue, store::Store};

pub struct XlenArguments {
    key: Bytes,
}

impl XlenArguments {
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        let [key] = arguments else {
            return Err(CommandError::WrongNumberOfArguments("xlen"));
        };

        Ok(Self { key: key.clone() })
    }
}

pub async fn xlen(store: &Store, arguments: &[Bytes]) -> Result<RespValue, CommandError> {
    let xlen_arguments = XlenArguments::parse(arguments)?;

    let length = store.xlen(&xlen_arguments.key).await?;

    Ok(RespValue::Integer(length as i64))
}
