use thiserror::Error;

use crate::{resp::RespValue, store::StoreError};

#[derive(Error, Debug, PartialEq)]
pub enum CommandError {
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("wrong number of arguments for '{0}' command")]
    WrongNumberOfArguments(&'static str),
    #[error("value is not an integer or out of range")]
    NotAnInteger,
    #[error("value is out of range, must be positive")]
    NotPositive,
    #[error("invalid expire time in '{0}' command")]
    InvalidExpireTime(&'static str),
    #[error("timeout is not a float or out of range")]
    InvalidTimeout,
    #[error("timeout is negative")]
    NegativeTimeout,
    #[error("syntax error")]
    SyntaxError,
    #[error("Invalid stream ID specified as stream command argument")]
    InvalidStreamId,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CommandError {
    /// The error reply sent back to the client.
    pub fn as_resp(&self) -> RespValue {
        match self {
            CommandError::Store(StoreError::WrongType) => RespValue::Error(self.to_string()),
            _ => RespValue::Error(format!("ERR {}", self)),
        }
    }
}
