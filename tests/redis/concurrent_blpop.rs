use std::time::Duration;

use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_blpop_concurrent_clients_first_come_first_served() {
    let env = TestEnv::new();

    env.exec_command_ok(
        TestUtils::rpush_command("queue", &["single_item"]),
        100,
        &TestUtils::expected_integer(1),
    )
    .await;

    let tasks: Vec<_> = (1..=3)
        .map(|client_id| TestUtils::spawn_blpop_task(&env, &["queue"], "0.5", client_id))
        .collect();

    let mut results = vec![];
    for task in tasks {
        results.push(TestUtils::wait_for_completion(task, Duration::from_secs(3)).await);
    }

    let successful_results = TestUtils::filter_successful_results_containing(&results, "single_item");
    assert_eq!(
        successful_results.len(),
        1,
        "only one client should get the item"
    );
    assert_eq!(
        successful_results[0],
        &TestUtils::expected_bulk_string_array(&["queue", "single_item"])
    );

    let timed_out = results
        .iter()
        .filter(|result| **result == Ok(TestUtils::expected_null()))
        .count();
    assert_eq!(timed_out, 2, "the other clients should time out");
    assert_eq!(env.store.waiting_on(b"queue").await, 0);
}

#[tokio::test]
async fn test_blpop_every_pushed_element_delivered_exactly_once() {
    let env = TestEnv::new();
    let clients = 20;

    let tasks: Vec<_> = (1..=clients)
        .map(|client_id| TestUtils::spawn_blpop_task(&env, &["jobs"], "0", client_id))
        .collect();

    TestUtils::wait_for_waiters(&env, "jobs", clients as usize).await;

    let pushers: Vec<_> = (0..clients)
        .map(|job| {
            let env = env.clone();
            tokio::spawn(async move {
                env.exec_command(
                    TestUtils::rpush_command("jobs", &[&format!("job-{}", job)]),
                    1000 + job,
                )
                .await
            })
        })
        .collect();

    for pusher in pushers {
        assert!(pusher.await.unwrap().is_ok());
    }

    let mut delivered = vec![];
    for task in tasks {
        let reply = TestUtils::wait_for_completion(task, Duration::from_secs(3))
            .await
            .unwrap();
        delivered.push(reply);
    }

    delivered.sort();
    delivered.dedup();
    assert_eq!(delivered.len(), clients as usize, "no element delivered twice");

    for job in 0..clients {
        let expected = TestUtils::expected_bulk_string_array(&["jobs", &format!("job-{}", job)]);
        assert!(delivered.contains(&expected), "job-{} was not delivered", job);
    }

    env.exec_command_ok(TestUtils::llen_command("jobs"), 1, &TestUtils::expected_integer(0))
        .await;
    assert_eq!(env.store.waiting_on(b"jobs").await, 0);
}

#[tokio::test]
async fn test_blpop_multiple_keys_served_once() {
    let env = TestEnv::new();

    let task = TestUtils::spawn_blpop_task(&env, &["left", "right"], "0", 1);
    TestUtils::wait_for_waiters(&env, "right", 1).await;

    env.exec_command_ok(
        TestUtils::rpush_command("right", &["r1"]),
        2,
        &TestUtils::expected_integer(1),
    )
    .await;

    let result = TestUtils::wait_for_completion(task, Duration::from_secs(2)).await;
    assert_eq!(
        result,
        Ok(TestUtils::expected_bulk_string_array(&["right", "r1"]))
    );

    // The waiter is gone from every key it blocked on.
    assert_eq!(env.store.waiting_on(b"left").await, 0);

    env.exec_command_ok(
        TestUtils::rpush_command("left", &["l1"]),
        2,
        &TestUtils::expected_integer(1),
    )
    .await;
    env.exec_command_ok(TestUtils::llen_command("left"), 2, &TestUtils::expected_integer(1))
        .await;
}

#[tokio::test]
async fn test_blpop_timeout_racing_push() {
    let env = TestEnv::new();

    for round in 0..20u64 {
        let key = format!("race-{}", round);
        let task = TestUtils::spawn_blpop_task(&env, &[&key], "0.01", round);

        TestUtils::sleep_ms(round % 15).await;

        env.exec_command_ok(
            TestUtils::rpush_command(&key, &["item"]),
            100 + round,
            &TestUtils::expected_integer(1),
        )
        .await;

        let result = TestUtils::wait_for_completion(task, Duration::from_secs(2)).await;
        let llen = env
            .exec_command(TestUtils::llen_command(&key), 1)
            .await
            .map(|reply| TestUtils::encoded(&reply));

        // Either the waiter got the element or the element stayed in the list.
        match result {
            Ok(reply) if reply == TestUtils::expected_null() => {
                assert_eq!(llen, Ok(TestUtils::expected_integer(1)), "round {}", round)
            }
            Ok(reply) => {
                assert_eq!(
                    reply,
                    TestUtils::expected_bulk_string_array(&[&key, "item"]),
                    "round {}",
                    round
                );
                assert_eq!(llen, Ok(TestUtils::expected_integer(0)), "round {}", round);
            }
            Err(err) => panic!("round {} failed: {:?}", round, err),
        }
    }
}
