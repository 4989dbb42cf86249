use bytes::Bytes;

use crate::{
    commands::{command_error::CommandError, command_utils::parse_integer},
    resp::RespValue,
    store::Store,
};

/// Represents the parsed arguments for the LRANGE command.
///
/// The LRANGE command in Redis returns a range of elements from a list stored at the given key.
/// This struct holds the key and the raw start and end indices for the range operation.
pub struct LrangeArguments {
    /// The key name to retrieve from the store
    key: Bytes,
    /// The starting index for the range (can be negative to count from the end)
    start_index: isize,
    /// The ending index for the range (can be negative to count from the end)
    end_index: isize,
}

impl LrangeArguments {
    /// Parses and validates the arguments for the LRANGE command.
    ///
    /// # Arguments
    ///
    /// * `arguments` - The command arguments: [key, start_index, end_index]
    ///
    /// # Returns
    ///
    /// * `Ok(LrangeArguments)` - If the arguments are valid
    /// * `Err(CommandError::WrongNumberOfArguments)` - If the number of arguments is not exactly 3
    /// * `Err(CommandError::NotAnInteger)` - If start or end index is not a valid integer
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        let [key, start_index, end_index] = arguments else {
            return Err(CommandError::WrongNumberOfArguments("lrange"));
        };

        Ok(Self {
            key: key.clone(),
            start_index: parse_integer(start_index)?,
            end_index: parse_integer(end_index)?,
        })
    }
}

/// Handles the Redis LRANGE command.
///
/// Returns the elements between the two inclusive indices. A missing key or an
/// empty range gives an empty array.
pub async fn lrange(store: &Store, arguments: &[Bytes]) -> Result<RespValue, CommandError> {
    let lrange_arguments = LrangeArguments::parse(arguments)?;

    let range = store
        .lrange(&lrange_arguments.key, |length| {
            validate_range_indexes(
                length,
                lrange_arguments.start_index,
                lrange_arguments.end_index,
            )
        })
        .await?;

    Ok(RespValue::encode_array_from_bytes(range))
}

/// Validates and normalizes range indices for list operations.
///
/// A negative index counts from the end of the list (-1 is the last element)
/// and is clamped to 0. An index past the end is clamped to the last element.
///
/// # Arguments
///
/// * `length` - The length of the list the indices apply to
/// * `start_index` - The starting index (can be negative)
/// * `end_index` - The ending index (can be negative)
///
/// # Returns
///
/// * `Some((usize, usize))` - Normalized inclusive start and end indices
/// * `None` - If the list is empty or the normalized start is past the end
///
/// # Examples
///
/// ```text
/// // For a list of length 5:
/// // validate_range_indexes(5, 0, 2) -> Some((0, 2))
/// // validate_range_indexes(5, -2, -1) -> Some((3, 4))
/// // validate_range_indexes(5, 3, 1) -> None
/// ```
pub fn validate_range_indexes(
    length: usize,
    start_index: isize,
    end_index: isize,
) -> Option<(usize, usize)> {
    if length == 0 {
        return None;
    }

    let len = length as isize;
    let normalize = |index: isize| {
        if index < 0 {
            len.saturating_add(index).max(0)
        } else {
            index.min(len - 1)
        }
    };

    let start = normalize(start_index);
    let end = normalize(end_index);

    if start > end {
        return None;
    }

    Some((start as usize, end as usize))
}
