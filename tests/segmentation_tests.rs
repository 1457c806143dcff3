// Integration tests for the transcript segmentation state machine
//
// These drive the SessionController directly with a manual clock, so
// elapsed-time behavior (the split policy's time gate, progress reporting)
// is fully deterministic.

use std::sync::Arc;
use std::time::Duration;

use live_minutes::{
    BackendErrorKind, BackendEvent, Command, HistoryLog, Hypothesis, ManualClock, MemoryStore,
    ResultEvent, SessionConfig, SessionController, SessionPhase, HISTORY_STORE_KEY,
};

fn controller_with_interval(interval_ms: u64) -> (SessionController, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    let history =
        HistoryLog::load_or_default(Box::new(MemoryStore::new()), HISTORY_STORE_KEY).unwrap();
    let config = SessionConfig {
        split_interval: Duration::from_millis(interval_ms),
        restart_delay: Duration::from_millis(10),
        ..SessionConfig::default()
    };
    let controller = SessionController::new(config, clock.clone(), history);
    (controller, clock)
}

fn result(hypotheses: Vec<Hypothesis>) -> BackendEvent {
    BackendEvent::Result(ResultEvent::new(hypotheses))
}

#[test]
fn finals_accumulate_in_index_order() {
    let (mut controller, _clock) = controller_with_interval(60_000);
    assert_eq!(controller.start_recording(), Some(Command::StartBackend));
    controller.handle_event(BackendEvent::SessionStarted);

    controller.handle_event(result(vec![Hypothesis::fin(0, "今日は")]));
    controller.handle_event(result(vec![
        Hypothesis::fin(1, "天気が"),
        Hypothesis::fin(2, "いいですね"),
    ]));

    assert_eq!(controller.current_snapshot(), "今日は天気がいいですね");
}

#[test]
fn redelivered_event_is_idempotent() {
    let (mut controller, _clock) = controller_with_interval(60_000);
    controller.start_recording();
    controller.handle_event(BackendEvent::SessionStarted);

    let event = result(vec![
        Hypothesis::fin(0, "重複"),
        Hypothesis::fin(1, "テスト"),
    ]);
    controller.handle_event(event.clone());
    controller.handle_event(event.clone());
    controller.handle_event(event);

    assert_eq!(controller.current_snapshot(), "重複テスト");
}

#[test]
fn interim_text_is_replaced_not_appended() {
    let (mut controller, _clock) = controller_with_interval(60_000);
    controller.start_recording();
    controller.handle_event(BackendEvent::SessionStarted);

    controller.handle_event(result(vec![Hypothesis::interim(0, "こん")]));
    controller.handle_event(result(vec![Hypothesis::interim(0, "こんにち")]));
    controller.handle_event(result(vec![
        Hypothesis::fin(0, "こんにちは"),
        Hypothesis::interim(1, "せか"),
    ]));

    assert_eq!(controller.current_snapshot(), "こんにちはせか");
}

#[test]
fn events_before_start_are_discarded() {
    let (mut controller, _clock) = controller_with_interval(60_000);

    controller.handle_event(result(vec![Hypothesis::fin(0, "早すぎる")]));
    assert_eq!(controller.current_snapshot(), "");

    controller.start_recording();
    controller.handle_event(BackendEvent::SessionStarted);
    assert_eq!(controller.current_snapshot(), "");
}

#[test]
fn split_needs_both_time_and_lexical_gate() {
    let (mut controller, clock) = controller_with_interval(1_000);
    controller.start_recording();
    controller.handle_event(BackendEvent::SessionStarted);

    // t=500: terminal mark present but the time gate fails
    clock.set(500);
    let cmd = controller.handle_event(result(vec![Hypothesis::fin(0, "まだです。")]));
    assert_eq!(cmd, None);
    assert!(controller.history().is_empty());

    // t=1200: both gates hold; the cut folds prior confirmed text, the new
    // final text, and the event's interim text
    clock.set(1_200);
    let cmd = controller.handle_event(result(vec![
        Hypothesis::fin(1, "終わりました。"),
        Hypothesis::interim(2, "つぎ"),
    ]));
    assert_eq!(cmd, Some(Command::StopBackend));

    let entries = controller.history().entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].text, "まだです。終わりました。つぎ");

    // The buffer is cleared and the suppression window is open
    assert_eq!(controller.current_snapshot(), "");
    assert_eq!(controller.phase(), SessionPhase::RestartPending);
}

#[test]
fn only_one_cut_per_delta() {
    let (mut controller, clock) = controller_with_interval(1_000);
    controller.start_recording();
    controller.handle_event(BackendEvent::SessionStarted);

    clock.set(5_000);
    // A single delta satisfying both gates triggers exactly one cut
    let cmd = controller.handle_event(result(vec![
        Hypothesis::fin(0, "一つ目です。"),
        Hypothesis::fin(1, "二つ目です。"),
    ]));
    assert_eq!(cmd, Some(Command::StopBackend));
    assert_eq!(controller.history().len(), 1);
    assert_eq!(controller.history().entries()[0].text, "一つ目です。二つ目です。");
}

#[test]
fn suppression_window_discards_everything() {
    let (mut controller, clock) = controller_with_interval(1_000);
    controller.start_recording();
    controller.handle_event(BackendEvent::SessionStarted);

    clock.set(2_000);
    controller.handle_event(result(vec![Hypothesis::fin(0, "区切りです。")]));
    assert_eq!(controller.phase(), SessionPhase::RestartPending);

    // Late results from the abandoned session must not mutate anything
    controller.handle_event(result(vec![Hypothesis::fin(1, "幽霊")]));
    controller.handle_event(result(vec![Hypothesis::interim(2, "幽霊")]));
    assert_eq!(controller.current_snapshot(), "");
    assert_eq!(controller.history().len(), 1);

    // The engine ends, the scheduled restart fires, and the new session
    // clears suppression with a fresh index space
    let cmd = controller.handle_event(BackendEvent::SessionEnded);
    let Some(Command::RestartBackendAfter { generation, .. }) = cmd else {
        panic!("expected a scheduled restart, got {:?}", cmd);
    };
    assert_eq!(
        controller.confirm_restart(generation),
        Some(Command::StartBackend)
    );
    controller.handle_event(BackendEvent::SessionStarted);
    assert_eq!(controller.phase(), SessionPhase::Active);

    // Index 0 is consumable again after the reset
    controller.handle_event(result(vec![Hypothesis::fin(0, "新しい")]));
    assert_eq!(controller.current_snapshot(), "新しい");
}

#[test]
fn leftover_is_flushed_exactly_once_on_stop() {
    let (mut controller, _clock) = controller_with_interval(60_000);
    controller.start_recording();
    controller.handle_event(BackendEvent::SessionStarted);

    controller.handle_event(result(vec![
        Hypothesis::fin(0, " 残りの発言 "),
        Hypothesis::interim(1, "まだ確定していない"),
    ]));

    assert_eq!(controller.stop_recording(), Some(Command::StopBackend));
    let entries = controller.history().entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].text, "残りの発言 まだ確定していない");
    assert_eq!(controller.current_snapshot(), "");
    assert_eq!(controller.phase(), SessionPhase::Idle);

    // Stopping again is a no-op
    assert_eq!(controller.stop_recording(), None);
    assert_eq!(controller.history().len(), 1);
}

#[test]
fn stop_with_empty_segment_logs_nothing() {
    let (mut controller, _clock) = controller_with_interval(60_000);
    controller.start_recording();
    controller.handle_event(BackendEvent::SessionStarted);
    controller.handle_event(result(vec![Hypothesis::interim(0, "   ")]));

    controller.stop_recording();
    assert!(controller.history().is_empty());
}

#[test]
fn null_cut_resets_timer_without_logging() {
    let (mut controller, clock) = controller_with_interval(1_000);
    controller.start_recording();
    controller.handle_event(BackendEvent::SessionStarted);

    // Whitespace-only final is consumed but trims to nothing
    controller.handle_event(result(vec![Hypothesis::fin(0, "  ")]));

    // A stale redelivery carries a marker in its phrase while nothing new
    // accumulated: both gates hold but the would-be entry is empty
    clock.set(1_500);
    let cmd = controller.handle_event(result(vec![Hypothesis::fin(0, "です")]));
    assert_eq!(cmd, None);
    assert!(controller.history().is_empty());
    assert_eq!(controller.phase(), SessionPhase::Active);

    // The split timer was reset, so progress starts over
    assert_eq!(controller.progress_fraction(), 0.0);
}

#[test]
fn progress_fraction_tracks_elapsed_time() {
    let (mut controller, clock) = controller_with_interval(1_000);
    assert_eq!(controller.progress_fraction(), 0.0);

    controller.start_recording();
    controller.handle_event(BackendEvent::SessionStarted);
    assert_eq!(controller.progress_fraction(), 0.0);

    clock.set(500);
    assert!((controller.progress_fraction() - 0.5).abs() < 1e-9);

    clock.set(3_000);
    assert_eq!(controller.progress_fraction(), 1.0);

    controller.stop_recording();
    assert_eq!(controller.progress_fraction(), 0.0);
}

#[test]
fn five_minute_scenario_end_to_end() {
    // Full scenario at the default five-minute interval
    let (mut controller, clock) = controller_with_interval(300_000);
    controller.start_recording();
    controller.handle_event(BackendEvent::SessionStarted);

    clock.set(10);
    let cmd = controller.handle_event(result(vec![Hypothesis::fin(0, "こんにちは")]));
    assert_eq!(cmd, None, "time gate must fail at t=10ms");

    clock.set(301_000);
    let cmd = controller.handle_event(result(vec![Hypothesis::fin(
        7,
        "よろしくお願いします。",
    )]));
    assert_eq!(cmd, Some(Command::StopBackend));

    let entries = controller.history().entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].text, "こんにちはよろしくお願いします。");
    assert_eq!(controller.current_snapshot(), "");
    assert_eq!(controller.phase(), SessionPhase::RestartPending);

    // Backend cycles; the fresh session resets index tracking so index 0 is
    // live again
    let Some(Command::RestartBackendAfter { generation, .. }) =
        controller.handle_event(BackendEvent::SessionEnded)
    else {
        panic!("expected a scheduled restart");
    };
    assert_eq!(
        controller.confirm_restart(generation),
        Some(Command::StartBackend)
    );
    controller.handle_event(BackendEvent::SessionStarted);
    controller.handle_event(result(vec![Hypothesis::fin(0, "続きです")]));
    assert_eq!(controller.current_snapshot(), "続きです");
}

#[test]
fn fatal_error_flushes_and_goes_idle() {
    let (mut controller, _clock) = controller_with_interval(60_000);
    controller.start_recording();
    controller.handle_event(BackendEvent::SessionStarted);
    controller.handle_event(result(vec![Hypothesis::fin(0, "途中の発言です")]));

    let cmd = controller.handle_event(BackendEvent::Error(BackendErrorKind::PermissionDenied));
    assert_eq!(cmd, Some(Command::StopBackend));
    assert_eq!(controller.phase(), SessionPhase::Idle);
    assert_eq!(
        controller.last_error(),
        Some(&BackendErrorKind::PermissionDenied)
    );

    // The in-flight segment was not lost
    assert_eq!(controller.history().len(), 1);
    assert_eq!(controller.history().entries()[0].text, "途中の発言です");
}

#[test]
fn transient_errors_are_ignored() {
    let (mut controller, _clock) = controller_with_interval(60_000);
    controller.start_recording();
    controller.handle_event(BackendEvent::SessionStarted);
    controller.handle_event(result(vec![Hypothesis::fin(0, "継続")]));

    assert_eq!(
        controller.handle_event(BackendEvent::Error(BackendErrorKind::NoSpeech)),
        None
    );
    assert_eq!(
        controller.handle_event(BackendEvent::Error(BackendErrorKind::Network)),
        None
    );
    assert_eq!(controller.phase(), SessionPhase::Active);
    assert_eq!(controller.current_snapshot(), "継続");
    assert_eq!(controller.last_error(), None);
}

#[test]
fn silent_restart_budget_forces_hard_stop() {
    let clock = Arc::new(ManualClock::new());
    let history =
        HistoryLog::load_or_default(Box::new(MemoryStore::new()), HISTORY_STORE_KEY).unwrap();
    let config = SessionConfig {
        split_interval: Duration::from_secs(60),
        restart_delay: Duration::from_millis(10),
        max_silent_restarts: 2,
        ..SessionConfig::default()
    };
    let mut controller = SessionController::new(config, clock, history);

    controller.start_recording();
    controller.handle_event(BackendEvent::SessionStarted);

    // Two silent restarts stay within budget
    for _ in 0..2 {
        let Some(Command::RestartBackendAfter { generation, .. }) =
            controller.handle_event(BackendEvent::SessionEnded)
        else {
            panic!("expected a scheduled restart");
        };
        assert_eq!(
            controller.confirm_restart(generation),
            Some(Command::StartBackend)
        );
        controller.handle_event(BackendEvent::SessionStarted);
    }

    // The third consecutive silent end exhausts the budget
    let cmd = controller.handle_event(BackendEvent::SessionEnded);
    assert_eq!(cmd, Some(Command::StopBackend));
    assert_eq!(controller.phase(), SessionPhase::Idle);
}

#[test]
fn accepted_result_resets_silent_restart_budget() {
    let clock = Arc::new(ManualClock::new());
    let history =
        HistoryLog::load_or_default(Box::new(MemoryStore::new()), HISTORY_STORE_KEY).unwrap();
    let config = SessionConfig {
        split_interval: Duration::from_secs(60),
        restart_delay: Duration::from_millis(10),
        max_silent_restarts: 1,
        ..SessionConfig::default()
    };
    let mut controller = SessionController::new(config, clock, history);

    controller.start_recording();
    controller.handle_event(BackendEvent::SessionStarted);

    for round in 0..4 {
        // Every session delivers a result, so the budget keeps resetting
        controller.handle_event(result(vec![Hypothesis::fin(0, "発言")]));

        let Some(Command::RestartBackendAfter { generation, .. }) =
            controller.handle_event(BackendEvent::SessionEnded)
        else {
            panic!("expected a scheduled restart in round {round}");
        };
        assert_eq!(
            controller.confirm_restart(generation),
            Some(Command::StartBackend)
        );
        controller.handle_event(BackendEvent::SessionStarted);
    }

    assert_eq!(controller.phase(), SessionPhase::Active);
}

#[test]
fn user_stop_invalidates_scheduled_restart() {
    let (mut controller, _clock) = controller_with_interval(60_000);
    controller.start_recording();
    controller.handle_event(BackendEvent::SessionStarted);

    // Engine dies; a restart is scheduled
    let Some(Command::RestartBackendAfter { generation, .. }) =
        controller.handle_event(BackendEvent::SessionEnded)
    else {
        panic!("expected a scheduled restart");
    };

    // User stops before the timer fires; the stale timer must no-op
    controller.stop_recording();
    assert_eq!(controller.confirm_restart(generation), None);
    assert_eq!(controller.phase(), SessionPhase::Idle);
}
