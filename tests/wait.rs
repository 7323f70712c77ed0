//! Wait executor timing and cancellation on a virtual clock.

use std::time::Duration;
use uilocator::{
    CancelToken, Clock, LocateError, ManualClock, WaitExecutor, WaitSpec, WaitState,
};

#[test]
fn never_succeeding_poll_times_out_after_four_to_six_attempts() {
    let exec = WaitExecutor::with_clock(ManualClock::new());
    let spec = WaitSpec::from_secs(1.0, 0.2).unwrap();
    let report = exec.run(&spec, || Ok(None::<u8>)).unwrap();
    assert_eq!(report.state, WaitState::TimedOut);
    assert!((4..=6).contains(&report.attempt_count()));
    assert!(report.value.is_none());
}

#[test]
fn schedule_is_reproducible() {
    let spec = WaitSpec::from_secs(3.0, 0.1)
        .unwrap()
        .with_backoff(1.5, Duration::from_millis(700));
    let run = || {
        WaitExecutor::with_clock(ManualClock::new())
            .run(&spec, || Ok(None::<()>))
            .unwrap()
            .attempts
    };
    let first = run();
    assert_eq!(first, run());
    assert_eq!(first.last().copied(), Some(Duration::from_secs(3)));
    let gaps: Vec<Duration> = first.windows(2).map(|w| w[1] - w[0]).collect();
    assert_eq!(gaps[0], Duration::from_millis(100));
    assert_eq!(gaps[1], Duration::from_millis(150));
    assert!(gaps.iter().all(|g| *g <= Duration::from_millis(700)));
}

#[test]
fn cancel_between_second_and_third_attempt() {
    let exec = WaitExecutor::with_clock(ManualClock::new());
    let token = CancelToken::new();
    let spec = WaitSpec::from_secs(1.0, 0.2)
        .unwrap()
        .with_cancel(token.clone());
    let mut attempts = 0;
    let report = exec
        .run(&spec, || {
            attempts += 1;
            if attempts == 2 {
                token.cancel();
            }
            Ok(None::<()>)
        })
        .unwrap();
    assert_eq!(report.state, WaitState::Cancelled);
    assert_eq!(report.attempt_count(), 2);
    assert_eq!(attempts, 2);
}

#[test]
fn pre_cancelled_token_makes_no_attempt() {
    let exec = WaitExecutor::with_clock(ManualClock::new());
    let token = CancelToken::new();
    token.cancel();
    let spec = WaitSpec::default().with_cancel(token.clone());
    let report = exec.run(&spec, || Ok(Some(()))).unwrap();
    assert_eq!(report.state, WaitState::Cancelled);
    assert_eq!(report.attempt_count(), 0);

    token.reset();
    let report = exec.run(&spec, || Ok(Some(()))).unwrap();
    assert_eq!(report.state, WaitState::Succeeded);
}

#[test]
fn slow_predicate_counts_against_the_timeout() {
    let clock = ManualClock::new();
    let exec = WaitExecutor::with_clock(clock.clone());
    let spec = WaitSpec::from_secs(1.0, 0.2).unwrap();
    let report = exec
        .run(&spec, || {
            clock.advance(Duration::from_millis(300));
            Ok(None::<()>)
        })
        .unwrap();
    assert_eq!(report.state, WaitState::TimedOut);
    assert_eq!(
        report.attempts,
        vec![
            Duration::ZERO,
            Duration::from_millis(500),
            Duration::from_millis(1000)
        ]
    );
    assert_eq!(report.elapsed, Duration::from_millis(1300));
    assert_eq!(clock.now(), Duration::from_millis(1300));
}

#[test]
fn configuration_errors_fail_fast() {
    let exec = WaitExecutor::with_clock(ManualClock::new());
    let spec = WaitSpec::from_secs(0.1, 0.5).unwrap();
    let err = exec.run(&spec, || Ok(Some(()))).unwrap_err();
    assert!(matches!(err, LocateError::Configuration(_)));
    assert_eq!(exec.clock().now(), Duration::ZERO);
}
