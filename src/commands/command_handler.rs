use bytes::Bytes;
use tracing::debug;

use crate::{
    commands::{
        blpop::{blpop, brpop},
        command_error::CommandError,
        echo::echo,
        get::get,
        llen::llen,
        lpop_and_rpop::{lpop, rpop},
        lrange::lrange,
        ping::ping,
        rpush_and_lpush::{lpush, rpush},
        set::set,
        type_command::type_command,
        xadd::xadd,
        xlen::xlen,
        xrange::{xrange, xrevrange},
    },
    resp::{Command, RespValue},
    store::{ClientId, Store},
};

#[derive(Debug, PartialEq, Clone)]
pub struct CommandHandler {
    /// Upper-cased command name
    pub name: String,
    pub arguments: Vec<Bytes>,
}

impl CommandHandler {
    pub fn new(command: Command) -> Self {
        Self {
            name: String::from_utf8_lossy(&command.name).to_uppercase(),
            arguments: command.args,
        }
    }

    /// Whether the command may suspend waiting for another client.
    pub fn is_blocking(&self) -> bool {
        matches!(self.name.as_str(), "BLPOP" | "BRPOP")
    }

    pub async fn handle_command(
        &self,
        client: ClientId,
        store: &Store,
    ) -> Result<RespValue, CommandError> {
        let arguments = self.arguments.as_slice();

        match self.name.as_str() {
            "PING" => ping(arguments),
            "ECHO" => echo(arguments),
            "TYPE" => type_command(store, arguments).await,
            "SET" => set(store, arguments).await,
            "GET" => get(store, arguments).await,
            "LPUSH" => lpush(store, arguments).await,
            "RPUSH" => rpush(store, arguments).await,
            "LPOP" => lpop(store, arguments).await,
            "RPOP" => rpop(store, arguments).await,
            "LLEN" => llen(store, arguments).await,
            "LRANGE" => lrange(store, arguments).await,
            "BLPOP" => blpop(client, store, arguments).await,
            "BRPOP" => brpop(client, store, arguments).await,
            "XADD" => xadd(store, arguments).await,
            "XLEN" => xlen(store, arguments).await,
            "XRANGE" => xrange(store, arguments).await,
            "XREVRANGE" => xrevrange(store, arguments).await,
            _ => Err(CommandError::UnknownCommand(self.name.to_lowercase())),
        }
    }

    /// Runs the command and turns any error into the reply the client sees.
    pub async fn execute(&self, client: ClientId, store: &Store) -> RespValue {
        match self.handle_command(client, store).await {
            Ok(reply) => reply,
            Err(err) => {
                debug!(client_id = client, command = %self.name, error = %err, "command failed");
                err.as_resp()
            }
        }
    }
}
