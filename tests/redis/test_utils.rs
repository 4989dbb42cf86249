use std::{net::SocketAddr, sync::Arc, time::Duration};

use bytes::{Bytes, BytesMut};
use redis_lite::{
    commands::{CommandError, CommandHandler},
    resp::{Command, RespValue},
    server::serve,
    store::{ClientId, Store},
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    task::JoinHandle,
    time::timeout,
};

/// Test utilities for simplifying Redis command tests
pub struct TestUtils;

/// Test environment containing the shared store
#[derive(Clone)]
pub struct TestEnv {
    pub store: Arc<Store>,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            store: Arc::new(Store::new()),
        }
    }

    /// Execute a command and return the result
    pub async fn exec_command(
        &self,
        command: Command,
        client_id: ClientId,
    ) -> Result<RespValue, CommandError> {
        CommandHandler::new(command)
            .handle_command(client_id, &self.store)
            .await
    }

    /// Execute a command and assert it succeeds with the expected encoded reply
    pub async fn exec_command_ok(&self, command: Command, client_id: ClientId, expected: &str) {
        let description = format!("{:?}", command);
        let result = self.exec_command(command, client_id).await;

        match result {
            Ok(reply) => assert_eq!(
                TestUtils::encoded(&reply),
                expected,
                "executing {}",
                description
            ),
            Err(err) => panic!("executing {} failed: {:?}", description, err),
        }
    }

    /// Execute a command and assert it fails with the expected error
    pub async fn exec_command_err(
        &self,
        command: Command,
        client_id: ClientId,
        expected_error: CommandError,
    ) {
        let description = format!("{:?}", command);
        let result = self.exec_command(command, client_id).await;

        assert_eq!(result, Err(expected_error), "executing {}", description);
    }
}

impl TestUtils {
    fn command(name: &str, args: &[&str]) -> Command {
        Command::new(
            Bytes::copy_from_slice(name.as_bytes()),
            args.iter()
                .map(|arg| Bytes::copy_from_slice(arg.as_bytes()))
                .collect(),
        )
    }

    /// Create an arbitrary command, valid or not
    pub fn raw_command(name: &str, args: &[&str]) -> Command {
        Self::command(name, args)
    }

    /// Create a PING command
    pub fn ping_command() -> Command {
        Self::command("PING", &[])
    }

    /// Create an ECHO command
    pub fn echo_command(message: &str) -> Command {
        Self::command("ECHO", &[message])
    }

    /// Create a GET command
    pub fn get_command(key: &str) -> Command {
        Self::command("GET", &[key])
    }

    /// Create a SET command
    pub fn set_command(key: &str, value: &str) -> Command {
        Self::command("SET", &[key, value])
    }

    /// Create a SET command with an expiration option such as `EX` or `PX`
    pub fn set_command_with_expiration(key: &str, value: &str, option: &str, amount: u64) -> Command {
        Self::command("SET", &[key, value, option, &amount.to_string()])
    }

    /// Create a TYPE command
    pub fn type_command(key: &str) -> Command {
        Self::command("TYPE", &[key])
    }

    /// Create an RPUSH command with multiple values
    pub fn rpush_command(key: &str, values: &[&str]) -> Command {
        let mut args = vec![key];
        args.extend_from_slice(values);
        Self::command("RPUSH", &args)
    }

    /// Create an LPUSH command with multiple values
    pub fn lpush_command(key: &str, values: &[&str]) -> Command {
        let mut args = vec![key];
        args.extend_from_slice(values);
        Self::command("LPUSH", &args)
    }

    /// Create an LPOP command
    pub fn lpop_command(key: &str) -> Command {
        Self::command("LPOP", &[key])
    }

    /// Create an LPOP command for multiple items
    pub fn lpop_command_multiple_items(key: &str, count: i64) -> Command {
        Self::command("LPOP", &[key, &count.to_string()])
    }

    /// Create an RPOP command
    pub fn rpop_command(key: &str) -> Command {
        Self::command("RPOP", &[key])
    }

    /// Create an RPOP command for multiple items
    pub fn rpop_command_multiple_items(key: &str, count: i64) -> Command {
        Self::command("RPOP", &[key, &count.to_string()])
    }

    /// Create an LLEN command
    pub fn llen_command(key: &str) -> Command {
        Self::command("LLEN", &[key])
    }

    /// Create an LRANGE command
    pub fn lrange_command(key: &str, start: i64, stop: i64) -> Command {
        Self::command("LRANGE", &[key, &start.to_string(), &stop.to_string()])
    }

    /// Create a BLPOP command
    pub fn blpop_command(keys: &[&str], timeout_seconds: &str) -> Command {
        let mut args = keys.to_vec();
        args.push(timeout_seconds);
        Self::command("BLPOP", &args)
    }

    /// Create a BRPOP command
    pub fn brpop_command(keys: &[&str], timeout_seconds: &str) -> Command {
        let mut args = keys.to_vec();
        args.push(timeout_seconds);
        Self::command("BRPOP", &args)
    }

    /// Create a XADD command
    pub fn xadd_command(key: &str, stream_id: &str, entries: &[&str]) -> Command {
        let mut args = vec![key, stream_id];
        args.extend_from_slice(entries);
        Self::command("XADD", &args)
    }

    /// Create a XLEN command
    pub fn xlen_command(key: &str) -> Command {
        Self::command("XLEN", &[key])
    }

    /// Create a XRANGE command
    pub fn xrange_command(key: &str, start_stream_id: &str, end_stream_id: &str) -> Command {
        Self::command("XRANGE", &[key, start_stream_id, end_stream_id])
    }

    /// Create a XRANGE command with a COUNT option
    pub fn xrange_command_with_count(key: &str, start: &str, end: &str, count: i64) -> Command {
        Self::command("XRANGE", &[key, start, end, "COUNT", &count.to_string()])
    }

    /// Create a XREVRANGE command
    pub fn xrevrange_command(key: &str, end_stream_id: &str, start_stream_id: &str) -> Command {
        Self::command("XREVRANGE", &[key, end_stream_id, start_stream_id])
    }

    /// Spawn a BLPOP task that blocks on the given keys
    pub fn spawn_blpop_task(
        env: &TestEnv,
        keys: &[&str],
        timeout_seconds: &str,
        client_id: ClientId,
    ) -> JoinHandle<Result<RespValue, CommandError>> {
        Self::spawn_command_task(env, Self::blpop_command(keys, timeout_seconds), client_id)
    }

    /// Spawn a BRPOP task that blocks on the given keys
    pub fn spawn_brpop_task(
        env: &TestEnv,
        keys: &[&str],
        timeout_seconds: &str,
        client_id: ClientId,
    ) -> JoinHandle<Result<RespValue, CommandError>> {
        Self::spawn_command_task(env, Self::brpop_command(keys, timeout_seconds), client_id)
    }

    fn spawn_command_task(
        env: &TestEnv,
        command: Command,
        client_id: ClientId,
    ) -> JoinHandle<Result<RespValue, CommandError>> {
        let store = Arc::clone(&env.store);

        tokio::spawn(async move {
            CommandHandler::new(command)
                .handle_command(client_id, &store)
                .await
        })
    }

    /// Wait until `count` clients are blocked on `key`
    pub async fn wait_for_waiters(env: &TestEnv, key: &str, count: usize) {
        let waiting = async {
            while env.store.waiting_on(key.as_bytes()).await < count {
                Self::sleep_ms(5).await;
            }
        };

        timeout(Duration::from_secs(2), waiting)
            .await
            .expect("clients should block within timeout");
    }

    /// Wait for a task with timeout and expect it to complete (success or failure)
    pub async fn wait_for_completion(
        task: JoinHandle<Result<RespValue, CommandError>>,
        timeout_duration: Duration,
    ) -> Result<String, CommandError> {
        timeout(timeout_duration, task)
            .await
            .expect("Task should complete within timeout")
            .expect("Task should not panic")
            .map(|reply| Self::encoded(&reply))
    }

    /// Encode a reply the way it goes over the wire
    pub fn encoded(reply: &RespValue) -> String {
        String::from_utf8_lossy(&reply.encode()).into_owned()
    }

    /// Create expected bulk string response
    pub fn expected_bulk_string(value: &str) -> String {
        format!("${}\r\n{}\r\n", value.len(), value)
    }

    /// Create expected integer response
    pub fn expected_integer(value: i64) -> String {
        format!(":{}\r\n", value)
    }

    /// Create expected simple string response
    pub fn expected_simple_string(value: &str) -> String {
        format!("+{}\r\n", value)
    }

    /// Create expected null response
    pub fn expected_null() -> String {
        "$-1\r\n".to_string()
    }

    /// Create expected bulk string array response
    pub fn expected_bulk_string_array(items: &[&str]) -> String {
        let mut response = format!("*{}\r\n", items.len());
        for item in items {
            response.push_str(&Self::expected_bulk_string(item));
        }
        response
    }

    /// Create expected stream entries response: `[[id, [field, value, ...]], ...]`
    pub fn expected_stream_entries(entries: &[(&str, &[&str])]) -> String {
        let mut response = format!("*{}\r\n", entries.len());
        for (id, fields) in entries {
            response.push_str("*2\r\n");
            response.push_str(&Self::expected_bulk_string(id));
            response.push_str(&Self::expected_bulk_string_array(fields));
        }
        response
    }

    /// Create expected error response
    pub fn expected_error(message: &str) -> String {
        format!("-{}\r\n", message)
    }

    /// Async sleep helper
    pub async fn sleep_ms(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    /// Filter successful results containing a specific substring
    pub fn filter_successful_results_containing<'a>(
        results: &'a [Result<String, CommandError>],
        substring: &str,
    ) -> Vec<&'a String> {
        results
            .iter()
            .filter_map(|r| r.as_ref().ok())
            .filter(|s| s.contains(substring))
            .collect()
    }

    /// Start a server on an ephemeral port sharing the environment's store
    pub async fn run_server(env: &TestEnv) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        tokio::spawn(serve(listener, Arc::clone(&env.store)));

        address
    }

    /// Send raw bytes and read until `expected_len` reply bytes arrived
    pub async fn send_and_receive(client: &mut TcpStream, request: &[u8], expected_len: usize) -> String {
        client.write_all(request).await.unwrap();
        client.flush().await.unwrap();

        Self::receive(client, expected_len).await
    }

    /// Read until at least `expected_len` bytes arrived or the server hung up
    pub async fn receive(client: &mut TcpStream, expected_len: usize) -> String {
        let mut buffer = BytesMut::with_capacity(expected_len.clamp(64, 4096));

        let reading = async {
            while buffer.len() < expected_len {
                match client.read_buf(&mut buffer).await {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {}
                }
            }
        };

        timeout(Duration::from_secs(3), reading)
            .await
            .expect("reply should arrive within timeout");

        String::from_utf8_lossy(&buffer).into_owned()
    }

    /// Send a command over the socket and assert on the raw reply
    pub async fn send_command_and_receive(client: &mut TcpStream, command: Command, expected: &str) {
        let request = command.to_resp().encode();
        let reply = Self::send_and_receive(client, &request, expected.len()).await;

        assert_eq!(reply, expected);
    }
}
