//! Session-level tests for the Tabata timer.
//!
//! These tests run the real session loop on a paused tokio clock, with the
//! mock audio engine standing in for rodio:
//! - Full session phase sequence and cue timeline
//! - Pause and resume flow
//! - Stop flow
//! - Degraded audio

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{sleep, Instant};

use tabata::session::{Control, SessionObserver, SessionOutcome, SessionRunner};
use tabata::sound::{AudioCall, CuePlayer, MockAudioEngine, COUNTDOWN_CUE};
use tabata::timer::{ClockEvent, MonotonicTimeSource, PhaseClock, TimeSource};
use tabata::types::{ClockSnapshot, ControlState, Phase, SessionConfig};

// ============================================================================
// Test Helpers
// ============================================================================

/// Observer recording every event with the snapshot it was rendered with.
#[derive(Clone, Default)]
struct Recorder {
    log: Arc<Mutex<Vec<(ClockEvent, ClockSnapshot)>>>,
}

impl Recorder {
    fn events(&self) -> Vec<ClockEvent> {
        self.log.lock().unwrap().iter().map(|(e, _)| *e).collect()
    }

    fn phases(&self) -> Vec<(Phase, u32)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ClockEvent::PhaseChanged { phase, round, .. } => Some((phase, round)),
                _ => None,
            })
            .collect()
    }

    fn snapshots(&self) -> Vec<ClockSnapshot> {
        self.log.lock().unwrap().iter().map(|(_, s)| s.clone()).collect()
    }
}

impl SessionObserver for Recorder {
    fn on_event(&mut self, event: &ClockEvent, snapshot: &ClockSnapshot) {
        self.log.lock().unwrap().push((*event, snapshot.clone()));
    }
}

fn create_runner() -> (SessionRunner, Recorder, MockAudioEngine) {
    let time: Arc<dyn TimeSource> = Arc::new(MonotonicTimeSource);
    let mock = MockAudioEngine::new();
    let recorder = Recorder::default();
    let runner = SessionRunner::new(
        PhaseClock::new(time.clone()),
        CuePlayer::new(mock.factory(), time),
        Box::new(recorder.clone()),
    );
    (runner, recorder, mock)
}

/// Three short rounds without a prepare phase.
fn create_fast_config() -> SessionConfig {
    SessionConfig::default()
        .with_work_seconds(5)
        .with_rest_seconds(5)
        .with_rounds(3)
        .with_prepare_seconds(0)
}

fn count(mock: &MockAudioEngine, call: &AudioCall) -> usize {
    mock.calls().iter().filter(|c| *c == call).count()
}

fn beep() -> AudioCall {
    AudioCall::Tones(COUNTDOWN_CUE.tones.to_vec())
}

fn clip(name: &str) -> AudioCall {
    AudioCall::Clip(name.to_string())
}

// ============================================================================
// Full Session
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_full_session_phase_sequence() {
    let (mut runner, recorder, _mock) = create_runner();
    let (_tx, rx) = mpsc::unbounded_channel();

    let outcome = runner.run(create_fast_config(), rx).await.unwrap();

    assert_eq!(outcome, SessionOutcome::Completed);
    assert_eq!(
        recorder.phases(),
        vec![
            (Phase::Work, 1),
            (Phase::Rest, 1),
            (Phase::Work, 2),
            (Phase::Rest, 2),
            (Phase::Work, 3),
            (Phase::Rest, 3),
        ]
    );
    assert_eq!(recorder.events().last(), Some(&ClockEvent::Completed));
    assert_eq!(runner.clock().state(), ControlState::Complete);
}

#[tokio::test(start_paused = true)]
async fn test_full_session_elapsed_is_monotonic_and_reaches_total() {
    let (mut runner, recorder, _mock) = create_runner();
    let (_tx, rx) = mpsc::unbounded_channel();
    let config = create_fast_config();

    runner.run(config, rx).await.unwrap();

    let elapsed: Vec<u64> = recorder
        .snapshots()
        .iter()
        .map(|s| s.elapsed_seconds)
        .collect();
    assert!(elapsed.windows(2).all(|w| w[0] <= w[1]), "{:?}", elapsed);
    assert_eq!(elapsed.last(), Some(&config.total_seconds()));
    assert_eq!(config.total_seconds(), 30);
}

#[tokio::test(start_paused = true)]
async fn test_full_session_ticks_every_second() {
    let (mut runner, recorder, _mock) = create_runner();
    let (_tx, rx) = mpsc::unbounded_channel();

    runner
        .run(create_fast_config().with_rounds(1), rx)
        .await
        .unwrap();

    let ticks: Vec<u32> = recorder
        .events()
        .into_iter()
        .filter_map(|event| match event {
            ClockEvent::Tick { seconds_left, .. } => Some(seconds_left),
            _ => None,
        })
        .collect();
    assert_eq!(ticks, vec![5, 4, 3, 2, 1, 5, 4, 3, 2, 1]);
}

#[tokio::test(start_paused = true)]
async fn test_full_session_cue_timeline() {
    let (mut runner, _recorder, mock) = create_runner();
    let (_tx, rx) = mpsc::unbounded_channel();
    let started = Instant::now();

    runner.run(create_fast_config(), rx).await.unwrap();

    let calls = mock.calls();
    assert_eq!(calls[0], AudioCall::Unlock);
    assert_eq!(calls[1], AudioCall::KeepaliveStart);
    // 3, 2, 1 in each of six phases
    assert_eq!(count(&mock, &beep()), 18);
    assert_eq!(count(&mock, &clip("work")), 3);
    assert_eq!(count(&mock, &clip("rest")), 3);
    assert_eq!(count(&mock, &clip("done")), 1);
    assert_eq!(calls.last(), Some(&AudioCall::KeepaliveStop));

    // The runner waits for the keepalive release after the last rest.
    assert!(started.elapsed() >= Duration::from_secs(33));
    assert!(!runner.cues().has_pending());
}

#[tokio::test(start_paused = true)]
async fn test_prepare_phase_precedes_round_one() {
    let (mut runner, recorder, mock) = create_runner();
    let (_tx, rx) = mpsc::unbounded_channel();

    runner
        .run(create_fast_config().with_prepare_seconds(3).with_rounds(1), rx)
        .await
        .unwrap();

    assert_eq!(
        recorder.phases(),
        vec![(Phase::Prepare, 0), (Phase::Work, 1), (Phase::Rest, 1)]
    );
    // Prepare gets countdown beeps but no entry cue.
    assert_eq!(count(&mock, &beep()), 2 + 3 + 3);
    assert_eq!(count(&mock, &clip("work")), 1);
}

// ============================================================================
// Pause / Resume
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_pause_and_resume_flow() {
    let (mut runner, recorder, mock) = create_runner();
    let (tx, rx) = mpsc::unbounded_channel();
    let started = Instant::now();

    let driver = async move {
        sleep(Duration::from_millis(2100)).await;
        tx.send(Control::Pause).unwrap();
        sleep(Duration::from_secs(60)).await;
        tx.send(Control::Resume).unwrap();
        tx
    };
    let (outcome, _tx) = tokio::join!(runner.run(create_fast_config().with_rounds(1), rx), driver);

    assert_eq!(outcome.unwrap(), SessionOutcome::Completed);
    assert!(started.elapsed() >= Duration::from_secs(70));

    let events = recorder.events();
    let paused = events.iter().position(|e| *e == ClockEvent::Paused).unwrap();
    let resumed = events
        .iter()
        .position(|e| *e == ClockEvent::Resumed { phase: Phase::Work })
        .unwrap();
    assert!(paused < resumed);

    // Nothing happens while paused, and the countdown continues where it
    // stopped.
    assert_eq!(resumed, paused + 1);
    let tick_before = events[..paused].iter().rev().find_map(|e| match e {
        ClockEvent::Tick { seconds_left, .. } => Some(*seconds_left),
        _ => None,
    });
    let tick_after = events[resumed..].iter().find_map(|e| match e {
        ClockEvent::Tick { seconds_left, .. } => Some(*seconds_left),
        _ => None,
    });
    assert_eq!(tick_before, Some(3));
    assert_eq!(tick_after, Some(3));

    // The repeated 3 after resume does not beep twice.
    assert_eq!(count(&mock, &beep()), 6);
    assert_eq!(recorder.phases(), vec![(Phase::Work, 1), (Phase::Rest, 1)]);
}

#[tokio::test(start_paused = true)]
async fn test_toggle_pauses_and_resumes() {
    let (mut runner, recorder, _mock) = create_runner();
    let (tx, rx) = mpsc::unbounded_channel();

    let driver = async move {
        sleep(Duration::from_millis(500)).await;
        tx.send(Control::Toggle).unwrap();
        sleep(Duration::from_secs(5)).await;
        tx.send(Control::Toggle).unwrap();
        tx
    };
    let (outcome, _tx) = tokio::join!(runner.run(create_fast_config().with_rounds(1), rx), driver);

    assert_eq!(outcome.unwrap(), SessionOutcome::Completed);
    let events = recorder.events();
    assert!(events.contains(&ClockEvent::Paused));
    assert!(events.contains(&ClockEvent::Resumed { phase: Phase::Work }));
}

// ============================================================================
// Stop
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_stop_flow() {
    let (mut runner, recorder, mock) = create_runner();
    let (tx, rx) = mpsc::unbounded_channel();

    let driver = async move {
        sleep(Duration::from_secs(7)).await;
        tx.send(Control::Stop).unwrap();
        tx.send(Control::Stop).unwrap();
        tx
    };
    let (outcome, _tx) = tokio::join!(runner.run(create_fast_config(), rx), driver);

    assert_eq!(outcome.unwrap(), SessionOutcome::Stopped);
    assert_eq!(runner.clock().state(), ControlState::Idle);

    let events = recorder.events();
    assert_eq!(events.last(), Some(&ClockEvent::Stopped));
    assert_eq!(
        events.iter().filter(|e| **e == ClockEvent::Stopped).count(),
        1
    );
    assert_eq!(mock.calls().last(), Some(&AudioCall::KeepaliveStop));
    assert_eq!(count(&mock, &clip("done")), 0);
}

// ============================================================================
// Degraded Audio
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_session_completes_without_audio() {
    let (mut runner, recorder, mock) = create_runner();
    mock.set_should_fail(true);
    let (_tx, rx) = mpsc::unbounded_channel();

    let outcome = runner.run(create_fast_config(), rx).await.unwrap();

    assert_eq!(outcome, SessionOutcome::Completed);
    assert_eq!(recorder.phases().len(), 6);
    assert!(mock.calls().is_empty());
    assert!(!runner.cues().is_unlocked());
}

#[tokio::test(start_paused = true)]
async fn test_disabled_cues_run_silently() {
    let time: Arc<dyn TimeSource> = Arc::new(MonotonicTimeSource);
    let recorder = Recorder::default();
    let mut runner = SessionRunner::new(
        PhaseClock::new(time.clone()),
        CuePlayer::disabled(time),
        Box::new(recorder.clone()),
    );
    let (_tx, rx) = mpsc::unbounded_channel();

    let outcome = runner
        .run(create_fast_config().with_rounds(1), rx)
        .await
        .unwrap();

    assert_eq!(outcome, SessionOutcome::Completed);
    assert_eq!(recorder.phases().len(), 2);
}
