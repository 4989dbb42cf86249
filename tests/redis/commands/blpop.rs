use std::time::Duration;

use redis_lite::{commands::CommandError, store::StoreError};

use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_handle_blpop_command_element_already_present() {
    let env = TestEnv::new();

    env.exec_command_ok(
        TestUtils::rpush_command("grape", &["mango", "kiwi"]),
        1,
        &TestUtils::expected_integer(2),
    )
    .await;

    env.exec_command_ok(
        TestUtils::blpop_command(&["grape"], "0"),
        1,
        &TestUtils::expected_bulk_string_array(&["grape", "mango"]),
    )
    .await;

    env.exec_command_ok(
        TestUtils::brpop_command(&["grape"], "0"),
        1,
        &TestUtils::expected_bulk_string_array(&["grape", "kiwi"]),
    )
    .await;
}

#[tokio::test]
async fn test_handle_blpop_command_checks_keys_in_order() {
    let env = TestEnv::new();

    env.exec_command_ok(
        TestUtils::rpush_command("second", &["b"]),
        1,
        &TestUtils::expected_integer(1),
    )
    .await;
    env.exec_command_ok(
        TestUtils::rpush_command("third", &["c"]),
        1,
        &TestUtils::expected_integer(1),
    )
    .await;

    env.exec_command_ok(
        TestUtils::blpop_command(&["first", "second", "third"], "0"),
        1,
        &TestUtils::expected_bulk_string_array(&["second", "b"]),
    )
    .await;
}

#[tokio::test]
async fn test_handle_blpop_command_woken_by_push() {
    let env = TestEnv::new();

    let blpop_task = TestUtils::spawn_blpop_task(&env, &["grape"], "0", 1);
    TestUtils::wait_for_waiters(&env, "grape", 1).await;

    // The blocked client receives the element, so the push reports the length
    // the list had right after the insertion.
    env.exec_command_ok(
        TestUtils::rpush_command("grape", &["mango"]),
        2,
        &TestUtils::expected_integer(1),
    )
    .await;

    let result = TestUtils::wait_for_completion(blpop_task, Duration::from_secs(2)).await;
    assert_eq!(
        result,
        Ok(TestUtils::expected_bulk_string_array(&["grape", "mango"]))
    );

    env.exec_command_ok(TestUtils::llen_command("grape"), 2, &TestUtils::expected_integer(0))
        .await;
}

#[tokio::test]
async fn test_handle_blpop_command_served_in_arrival_order() {
    let env = TestEnv::new();

    let first_task = TestUtils::spawn_blpop_task(&env, &["grape"], "0", 1);
    TestUtils::wait_for_waiters(&env, "grape", 1).await;
    let second_task = TestUtils::spawn_blpop_task(&env, &["grape"], "0", 2);
    TestUtils::wait_for_waiters(&env, "grape", 2).await;

    env.exec_command_ok(
        TestUtils::rpush_command("grape", &["mango"]),
        3,
        &TestUtils::expected_integer(1),
    )
    .await;

    let first = TestUtils::wait_for_completion(first_task, Duration::from_secs(2)).await;
    assert_eq!(
        first,
        Ok(TestUtils::expected_bulk_string_array(&["grape", "mango"]))
    );
    assert_eq!(env.store.waiting_on(b"grape").await, 1);

    env.exec_command_ok(
        TestUtils::rpush_command("grape", &["kiwi"]),
        3,
        &TestUtils::expected_integer(1),
    )
    .await;

    let second = TestUtils::wait_for_completion(second_task, Duration::from_secs(2)).await;
    assert_eq!(
        second,
        Ok(TestUtils::expected_bulk_string_array(&["grape", "kiwi"]))
    );
}

#[tokio::test]
async fn test_handle_brpop_command_woken_by_lpush() {
    let env = TestEnv::new();

    let brpop_task = TestUtils::spawn_brpop_task(&env, &["grape", "pear"], "0", 1);
    TestUtils::wait_for_waiters(&env, "pear", 1).await;

    env.exec_command_ok(
        TestUtils::lpush_command("pear", &["a", "b", "c"]),
        2,
        &TestUtils::expected_integer(3),
    )
    .await;

    // One element goes to the waiter, taken from the tail.
    let result = TestUtils::wait_for_completion(brpop_task, Duration::from_secs(2)).await;
    assert_eq!(
        result,
        Ok(TestUtils::expected_bulk_string_array(&["pear", "a"]))
    );

    env.exec_command_ok(
        TestUtils::lrange_command("pear", 0, -1),
        2,
        &TestUtils::expected_bulk_string_array(&["c", "b"]),
    )
    .await;
    assert_eq!(env.store.waiting_on(b"grape").await, 0);
}

#[tokio::test]
async fn test_handle_blpop_command_timeout() {
    let env = TestEnv::new();

    let blpop_task = TestUtils::spawn_blpop_task(&env, &["grape"], "0.1", 1);

    let result = TestUtils::wait_for_completion(blpop_task, Duration::from_secs(2)).await;
    assert_eq!(result, Ok(TestUtils::expected_null()));
    assert_eq!(env.store.waiting_on(b"grape").await, 0);

    // Nobody is waiting any more, so the element stays in the list.
    env.exec_command_ok(
        TestUtils::rpush_command("grape", &["mango"]),
        2,
        &TestUtils::expected_integer(1),
    )
    .await;
    env.exec_command_ok(
        TestUtils::lrange_command("grape", 0, -1),
        2,
        &TestUtils::expected_bulk_string_array(&["mango"]),
    )
    .await;
}

#[tokio::test]
async fn test_handle_blpop_command_errors() {
    let env = TestEnv::new();

    env.exec_command_ok(
        TestUtils::set_command("grape", "mango"),
        1,
        &TestUtils::expected_simple_string("OK"),
    )
    .await;

    let test_cases = vec![
        (
            TestUtils::blpop_command(&["grape"], "0"),
            CommandError::Store(StoreError::WrongType),
        ),
        (
            TestUtils::blpop_command(&[], "0"),
            CommandError::WrongNumberOfArguments("blpop"),
        ),
        (
            TestUtils::brpop_command(&[], "1"),
            CommandError::WrongNumberOfArguments("brpop"),
        ),
        (
            TestUtils::blpop_command(&["pear"], "soon"),
            CommandError::InvalidTimeout,
        ),
        (
            TestUtils::blpop_command(&["pear"], "-1"),
            CommandError::NegativeTimeout,
        ),
    ];

    for (command, expected_error) in test_cases {
        env.exec_command_err(command, 1, expected_error).await;
    }

    assert_eq!(env.store.waiting_on(b"pear").await, 0);
}
