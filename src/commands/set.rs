use bytes::Bytes;
use tokio::time::Duration;

use crate::{
    commands::{
        command_error::CommandError,
        command_utils::{is_option, parse_integer},
    },
    resp::RespValue,
    store::Store,
};

/// Represents the parsed arguments for SET command
pub struct SetArguments {
    /// The key name to store the value under
    key: Bytes,
    /// The value to be stored under the given key
    value: Bytes,
    /// How long the key lives
    ttl: Option<Duration>,
}

impl SetArguments {
    /// Parses command arguments into a SetArguments structure.
    ///
    /// # Arguments
    ///
    /// * `arguments` - The command arguments:
    ///   - Format 1: `[key, value]` - For permanent storage
    ///   - Format 2: `[key, value, "EX", seconds]` or `[key, value, "PX", milliseconds]`
    ///
    /// # Returns
    ///
    /// * `Ok(SetArguments)` - Successfully parsed arguments
    /// * `Err(CommandError::WrongNumberOfArguments)` - If the number of arguments is not 2 or 4
    /// * `Err(CommandError::SyntaxError)` - If the expiration option is neither `EX` nor `PX`
    /// * `Err(CommandError::NotAnInteger)` - If the expiration is not an integer
    /// * `Err(CommandError::InvalidExpireTime)` - If the expiration is not positive
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        let (key, value, ttl) = match arguments {
            [key, value] => (key, value, None),
            [key, value, option, amount] => {
                let to_duration: fn(u64) -> Duration = if is_option(option, "EX") {
                    Duration::from_secs
                } else if is_option(option, "PX") {
                    Duration::from_millis
                } else {
                    return Err(CommandError::SyntaxError);
                };

                let amount = parse_integer::<i64>(amount)?;

                if amount <= 0 {
                    return Err(CommandError::InvalidExpireTime("set"));
                }

                (key, value, Some(to_duration(amount as u64)))
            }
            _ => return Err(CommandError::WrongNumberOfArguments("set")),
        };

        Ok(Self {
            key: key.clone(),
            value: value.clone(),
            ttl,
        })
    }
}

/// Handles the Redis SET command.
///
/// Stores a string under the key, replacing any previous value regardless of
/// its type. Replies `OK`.
pub async fn set(store: &Store, arguments: &[Bytes]) -> Result<RespValue, CommandError> {
    let set_arguments = SetArguments::parse(arguments)?;

    store
        .set(set_arguments.key, set_arguments.value, set_arguments.ttl)
        .await;

    Ok(RespValue::ok())
}
