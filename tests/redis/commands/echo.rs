use redis_lite::commands::CommandError;

use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_handle_echo_command() {
    let env = TestEnv::new();

    let test_cases = vec![
        (TestUtils::echo_command("grape"), Ok("$5\r\ngrape\r\n")),
        (TestUtils::echo_command(""), Ok("$0\r\n\r\n")),
        (
            TestUtils::raw_command("ECHO", &[]),
            Err(CommandError::WrongNumberOfArguments("echo")),
        ),
        (
            TestUtils::raw_command("ECHO", &["grape", "mango"]),
            Err(CommandError::WrongNumberOfArguments("echo")),
        ),
    ];

    for (command, expected) in test_cases {
        match expected {
            Ok(expected_response) => env.exec_command_ok(command, 1, expected_response).await,
            Err(expected_error) => env.exec_command_err(command, 1, expected_error).await,
        }
    }
}
