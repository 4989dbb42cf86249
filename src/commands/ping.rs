use bytes::Bytes;

use crate::{commands::command_error::CommandError, resp::RespValue};

pub struct PingArguments {
    message: Option<Bytes>,
}

impl PingArguments {
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        match arguments {
            [] => Ok(Self { message: None }),
            [message] => Ok(Self {
                message: Some(message.clone()),
            }),
            _ => Err(CommandError::WrongNumberOfArguments("ping")),
        }
    }
}

/// Handles the Redis PING command.
///
/// Replies `PONG`, or echoes the optional message back as a bulk string.
pub fn ping(arguments: &[Bytes]) -> Result<RespValue, CommandError> {
    let ping_arguments = PingArguments::parse(arguments)?;

    Ok(match ping_arguments.message {
        Some(message) => RespValue::BulkString(message),
        None => RespValue::SimpleString("PONG".to_string()),
    })
}
