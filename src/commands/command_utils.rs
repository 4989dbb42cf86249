use std::str::FromStr;

use bytes::Bytes;

use crate::commands::command_error::CommandError;

/// Parses an integer argument, failing the way Redis does for non-numeric
/// or out of range values.
pub fn parse_integer<T: FromStr>(argument: &Bytes) -> Result<T, CommandError> {
    std::str::from_utf8(argument)
        .ok()
        .and_then(|text| text.parse::<T>().ok())
        .ok_or(CommandError::NotAnInteger)
}

/// Case-insensitive comparison against an ASCII option name such as `EX`.
pub fn is_option(argument: &Bytes, option: &str) -> bool {
    argument.eq_ignore_ascii_case(option.as_bytes())
}
