use bytes::Bytes;

use crate::{
    commands::{command_error::CommandError, stream_utils::parse_stream_id_request},
    resp::RespValue,
    store::Store,
    stream::StreamIdRequest,
};

pub struct XaddArguments {
    key: Bytes,
    id: StreamIdRequest,
    fields: Vec<(Bytes, Bytes)>,
}

impl XaddArguments {
    /// Parses `key id field value [field value ...]`.
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        let [key, id, pairs @ ..] = arguments else {
            return Err(CommandError::WrongNumberOfArguments("xadd"));
        };

        if pairs.is_empty() || pairs.len() % 2 != 0 {
            return Err(CommandError::WrongNumberOfArguments("xadd"));
        }

        let fields = pairs
            .chunks_exact(2)
            .map(|pair| (pair[0].clone(), pair[1].clone()))
            .collect();

        Ok(Self {
            key: key.clone(),
            id: parse_stream_id_request(id)?,
            fields,
        })
    }
}

/// Handles the Redis XADD command.
///
/// Appends an entry to the stream, creating the stream on first use, and
/// replies with the ID the entry was stored under.
///
/// # Returns
///
/// * `Ok(RespValue::BulkString)` - The ID of the new entry, as `ms-seq`
/// * `Err(CommandError::InvalidStreamId)` - If the ID argument is malformed
/// * `Err(CommandError::Store)` - If the ID is `0-0`, not above the stream's top
///   entry, or the key holds another type
pub async fn xadd(store: &Store, arguments: &[Bytes]) -> Result<RespValue, CommandError> {
    let xadd_arguments = XaddArguments::parse(arguments)?;

    let id = store
        .xadd(xadd_arguments.key, xadd_arguments.id, xadd_arguments.fields)
        .await?;

    Ok(RespValue::bulk(id.to_string()))
}
