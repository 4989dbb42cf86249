use bytes::Bytes;

use crate::{
    commands::{
        command_error::CommandError,
        command_utils::{is_option, parse_integer},
        stream_utils::{parse_stream_bound, parse_stream_entries_to_resp},
    },
    radix::StreamId,
    resp::RespValue,
    store::Store,
    stream::BoundKind,
};

/// Which way a range command walks the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOrder {
    /// XRANGE key start end
    Forward,
    /// XREVRANGE key end start
    Reverse,
}

impl RangeOrder {
    fn command_name(self) -> &'static str {
        match self {
            RangeOrder::Forward => "xrange",
            RangeOrder::Reverse => "xrevrange",
        }
    }
}

pub struct XrangeArguments {
    key: Bytes,
    start: StreamId,
    end: StreamId,
    count: Option<usize>,
}

impl XrangeArguments {
    /// Parses `key first last [COUNT n]`. For XREVRANGE the first bound is the
    /// end of the interval and the second is its start.
    pub fn parse(arguments: &[Bytes], order: RangeOrder) -> Result<Self, CommandError> {
        let (key, first, last, count) = match arguments {
            [key, first, last] => (key, first, last, None),
            [key, first, last, option, count] => {
                if !is_option(option, "COUNT") {
                    return Err(CommandError::SyntaxError);
                }

                // A negative count behaves like no limit at all.
                let count = parse_integer::<i64>(count)?;
                let count = usize::try_from(count).ok();

                (key, first, last, count)
            }
            [_, _, _, ..] => return Err(CommandError::SyntaxError),
            _ => return Err(CommandError::WrongNumberOfArguments(order.command_name())),
        };

        let (start, end) = match order {
            RangeOrder::Forward => (
                parse_stream_bound(first, BoundKind::Start)?,
                parse_stream_bound(last, BoundKind::End)?,
            ),
            RangeOrder::Reverse => (
                parse_stream_bound(last, BoundKind::Start)?,
                parse_stream_bound(first, BoundKind::End)?,
            ),
        };

        Ok(Self {
            key: key.clone(),
            start,
            end,
            count,
        })
    }
}

pub async fn xrange(store: &Store, arguments: &[Bytes]) -> Result<RespValue, CommandError> {
    range_operations(store, arguments, RangeOrder::Forward).await
}

pub async fn xrevrange(store: &Store, arguments: &[Bytes]) -> Result<RespValue, CommandError> {
    range_operations(store, arguments, RangeOrder::Reverse).await
}

/// Handles XRANGE and XREVRANGE.
///
/// A missing key, or an interval no entry falls into, replies with an empty
/// array.
async fn range_operations(
    store: &Store,
    arguments: &[Bytes],
    order: RangeOrder,
) -> Result<RespValue, CommandError> {
    let xrange_arguments = XrangeArguments::parse(arguments, order)?;

    let entries = store
        .xrange(
            &xrange_arguments.key,
            xrange_arguments.start,
            xrange_arguments.end,
            xrange_arguments.count,
            order == RangeOrder::Reverse,
        )
        .await?;

    Ok(parse_stream_entries_to_resp(entries))
}
