mod blpop;
mod command_error;
mod command_handler;
mod command_utils;
mod echo;
mod get;
mod llen;
mod lpop_and_rpop;
mod lrange;
mod ping;
mod rpush_and_lpush;
mod set;
mod stream_utils;
mod type_command;
mod xadd;
mod xlen;
mod xrange;

pub use command_error::CommandError;
pub use command_handler::CommandHandler;
pub use lrange::validate_range_indexes;
