//! Requests must be byte-identical to what redis-rs puts on the wire.

use redcall::{CommandCall, ExecutionContext, RespValue, ToArg};

fn ours(args: Vec<RespValue>) -> Vec<u8> {
    let (call, _deferred) = CommandCall::new(args, &ExecutionContext::current());
    call.encode()
}

#[tokio::test]
async fn test_set_with_px_matches_redis_rs() {
    let expected = redis::cmd("SET")
        .arg("key")
        .arg("value")
        .arg("PX")
        .arg(2500)
        .get_packed_command();
    let actual = ours(vec![
        "SET".to_arg(),
        "key".to_arg(),
        "value".to_arg(),
        "PX".to_arg(),
        2500i64.to_arg(),
    ]);
    assert_eq!(actual, expected);
}

#[tokio::test]
async fn test_binary_and_empty_args_match_redis_rs() {
    let payload = vec![0u8, b'\r', b'\n', 0xff];
    let expected = redis::cmd("HSET")
        .arg("h")
        .arg("")
        .arg(&payload[..])
        .get_packed_command();
    let actual = ours(vec![
        "HSET".to_arg(),
        "h".to_arg(),
        "".to_arg(),
        payload.to_arg(),
    ]);
    assert_eq!(actual, expected);
}

#[tokio::test]
async fn test_negative_counter_matches_redis_rs() {
    let expected = redis::cmd("INCRBY").arg("n").arg(-42).get_packed_command();
    let actual = ours(vec!["INCRBY".to_arg(), "n".to_arg(), (-42i64).to_arg()]);
    assert_eq!(actual, expected);
}
