use super::*;

fn quick(attempts: u32) -> RetryPolicy {
    RetryPolicy {
        attempts,
        backoff_ms: 0,
    }
}

#[test]
fn succeeds_after_transient_failures() {
    let mut calls = 0;
    let v = retry_with_backoff(&quick(3), "test", || {
        calls += 1;
        if calls < 3 {
            Err(InkError::data_fetch("flaky"))
        } else {
            Ok(42)
        }
    })
    .unwrap();
    assert_eq!((v, calls), (42, 3));
}

#[test]
fn exhausted_retries_are_data_fetch_errors() {
    let mut calls = 0;
    let err = retry_with_backoff(&quick(2), "weather", || -> InkResult<()> {
        calls += 1;
        Err(InkError::render("bad payload"))
    })
    .unwrap_err();
    assert_eq!(calls, 2);
    let InkError::DataFetch(msg) = err else {
        panic!("expected DataFetch");
    };
    assert!(msg.contains("weather") && msg.contains("bad payload"));
}

#[test]
fn zero_attempts_still_tries_once() {
    let mut calls = 0;
    let _ = retry_with_backoff(&quick(0), "x", || -> InkResult<()> {
        calls += 1;
        Err(InkError::data_fetch("down"))
    });
    assert_eq!(calls, 1);
}

#[test]
fn backoff_doubles() {
    let p = RetryPolicy {
        attempts: 4,
        backoff_ms: 100,
    };
    assert_eq!(p.delay(0), Duration::from_millis(100));
    assert_eq!(p.delay(2), Duration::from_millis(400));
}
