use bytes::Bytes;

use crate::{
    commands::command_error::CommandError,
    radix::{StreamEntry, StreamId},
    resp::RespValue,
    stream::{parse_range_bound, BoundKind, StreamIdRequest},
};

/// Parses the XADD ID argument: `*`, `<ms>-*`, `<ms>-<seq>` or `<ms>`.
pub fn parse_stream_id_request(argument: &Bytes) -> Result<StreamIdRequest, CommandError> {
    std::str::from_utf8(argument)
        .map_err(|_| CommandError::InvalidStreamId)?
        .parse::<StreamIdRequest>()
        .map_err(|_| CommandError::InvalidStreamId)
}

/// Parses an XRANGE/XREVRANGE bound.
pub fn parse_stream_bound(argument: &Bytes, kind: BoundKind) -> Result<StreamId, CommandError> {
    let text = std::str::from_utf8(argument).map_err(|_| CommandError::InvalidStreamId)?;

    parse_range_bound(text, kind).map_err(|_| CommandError::InvalidStreamId)
}

/// Converts stream entries to RESP array format.
///
/// Each entry becomes a 2-element array: `[stream_id, [field1, value1, field2, value2, ...]]`,
/// with fields in the order they were added.
///
/// # Examples
///
/// ```text
/// entries: 1234-0 {temp: 25}
/// result:  *1\r\n*2\r\n$6\r\n1234-0\r\n*2\r\n$4\r\ntemp\r\n$2\r\n25\r\n
/// ```
pub fn parse_stream_entries_to_resp(entries: Vec<StreamEntry>) -> RespValue {
    RespValue::Array(
        entries
            .into_iter()
            .map(|entry| {
                let fields = entry
                    .fields
                    .into_iter()
                    .flat_map(|(field, value)| [field, value]);

                RespValue::Array(vec![
                    RespValue::bulk(entry.id.to_string()),
                    RespValue::encode_array_from_bytes(fields),
                ])
            })
            .collect(),
    )
}
