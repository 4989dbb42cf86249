use bytes::Bytes;

use crate::{commands::command_error::CommandError, resp::RespValue};

pub struct EchoArguments {
    message: Bytes,
}

impl EchoArguments {
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        let [message] = arguments else {
            return Err(CommandError::WrongNumberOfArguments("echo"));
        };

        Ok(Self {
            message: message.clone(),
        })
    }
}

pub fn echo(arguments: &[Bytes]) -> Result<RespValue, CommandError> {
    let echo_arguments = EchoArguments::parse(arguments)?;

    Ok(RespValue::BulkString(echo_arguments.message))
}
