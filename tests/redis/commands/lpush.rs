use redis_lite::commands::CommandError;

use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_handle_lpush_command() {
    let env = TestEnv::new();

    env.exec_command_ok(
        TestUtils::lpush_command("grape", &["a"]),
        1,
        &TestUtils::expected_integer(1),
    )
    .await;

    env.exec_command_ok(
        TestUtils::lpush_command("grape", &["b"]),
        1,
        &TestUtils::expected_integer(2),
    )
    .await;

    env.exec_command_ok(
        TestUtils::lrange_command("grape", 0, -1),
        1,
        &TestUtils::expected_bulk_string_array(&["b", "a"]),
    )
    .await;

    // Each value is pushed in turn, so the last one ends up at the head.
    env.exec_command_ok(
        TestUtils::lpush_command("grape", &["c", "d", "e"]),
        1,
        &TestUtils::expected_integer(5),
    )
    .await;

    env.exec_command_ok(
        TestUtils::lrange_command("grape", 0, -1),
        1,
        &TestUtils::expected_bulk_string_array(&["e", "d", "c", "b", "a"]),
    )
    .await;

    env.exec_command_err(
        TestUtils::raw_command("LPUSH", &["grape"]),
        1,
        CommandError::WrongNumberOfArguments("lpush"),
    )
    .await;
}
