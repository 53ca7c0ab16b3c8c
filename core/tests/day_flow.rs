//! Day lifecycle: event request, countdown, closing review, lobby.

mod common;

use common::*;
use fishbun_core::{
    command::PlayerCommand,
    day_controller::{DailyEvent, DayPhase, EventEffect},
    engine::SimEngine,
    event::SimEvent,
    locale::Language,
    mold_subsystem::MoldState,
    narrative::{
        parse_daily_event, Dispatch, EventRequest, NarrativeError, Narrator, ReviewRequest,
    },
    types::Filling,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

fn fallback_flags(engine: &SimEngine, event_type: &str) -> Vec<bool> {
    engine
        .journal_events_of_type(event_type)
        .unwrap()
        .iter()
        .map(|e| match serde_json::from_str(&e.payload).unwrap() {
            SimEvent::DayStarted { fallback, .. } | SimEvent::ReviewReceived { fallback, .. } => fallback,
            other => panic!("unexpected event {other:?}"),
        })
        .collect()
}

#[test]
fn failing_provider_still_runs_a_full_day() {
    let narrator = ScriptedNarrator::failing(NarrativeError::Transport("503".into()));
    let mut engine = build_with("day-fail", 9, Default::default(), narrator);

    engine.start_day().unwrap();

    assert_eq!(engine.phase(), DayPhase::Active);
    let event = engine.daily_event().unwrap().clone();
    assert_eq!(event.effect, EventEffect::Normal);
    assert_eq!(event.title, engine.translate("default_event_title", &[]));
    assert_eq!(event.description, engine.translate("default_event_desc", &[]));
    assert_eq!(fallback_flags(&engine, "day_started"), vec![true]);

    engine.end_day_now().unwrap();

    assert_eq!(engine.phase(), DayPhase::Ended);
    assert!(!engine.is_loading());
    assert_eq!(engine.day_stats().review, engine.translate("default_review", &[]));
    assert_eq!(fallback_flags(&engine, "review_received"), vec![true]);
    assert_eq!(count_events(&engine, "narrative_fallback"), 2);
}

#[test]
fn provider_content_is_used_when_available() {
    let narrator = ScriptedNarrator::ok(event("Snow Day", EventEffect::Rush), "Packed all day!");
    let mut engine = build_with("day-ok", 9, Default::default(), narrator);

    open_day(&mut engine);
    assert_eq!(engine.daily_event().unwrap().title, "Snow Day");
    assert_eq!(engine.tick_params().spawn_threshold, 100.0);

    engine.end_day_now().unwrap();
    assert_eq!(engine.day_stats().review, "Packed all day!");
    assert_eq!(fallback_flags(&engine, "day_started"), vec![false]);
    assert_eq!(fallback_flags(&engine, "review_received"), vec![false]);
    assert_eq!(count_events(&engine, "narrative_fallback"), 0);
}

#[test]
fn slow_day_doubles_the_spawn_threshold() {
    let narrator = ScriptedNarrator::ok(event("Rain", EventEffect::Slow), "Quiet.");
    let mut engine = build_with("day-slow", 9, Default::default(), narrator);
    open_day(&mut engine);

    assert_eq!(engine.tick_params().spawn_threshold, 400.0);
    engine.run_ticks(400).unwrap();
    assert!(engine.customers().is_empty());
    engine.run_ticks(1).unwrap();
    assert_eq!(engine.customers().len(), 1);
}

#[test]
fn malformed_content_falls_back() {
    let bad_event = parse_daily_event(r#"{"title":"Wind","description":"Gusty","effect":"WINDY"}"#);
    assert!(matches!(bad_event, Err(NarrativeError::Malformed(_))));
    let narrator: Arc<dyn Narrator> = Arc::new(ScriptedNarrator {
        event:  bad_event,
        review: Ok("   ".to_string()),
    });
    let mut engine = build_with("day-malformed", 9, Default::default(), narrator);

    open_day(&mut engine);
    engine.end_day_now().unwrap();

    assert_eq!(engine.daily_event().unwrap().effect, EventEffect::Normal);
    assert_eq!(engine.day_stats().review, engine.translate("default_review", &[]));
    assert_eq!(count_events(&engine, "narrative_fallback"), 2);
}

#[test]
fn silent_provider_times_out_into_fallback() {
    let (narrator, _release) = HangingNarrator::new();
    let mut engine = build_with("day-timeout", 9, Default::default(), narrator)
        .with_dispatch(Dispatch::Threaded);

    engine.start_day().unwrap();
    assert_eq!(engine.phase(), DayPhase::Lobby);
    assert!(engine.is_loading());

    let events = engine.start_day().unwrap();
    assert_eq!(events[0].type_name(), "action_ignored", "one request at a time");

    engine.pump(ms(4_999)).unwrap();
    assert!(engine.is_loading());

    engine.pump(ms(5_000)).unwrap();
    assert_eq!(engine.phase(), DayPhase::Active);
    assert!(!engine.is_loading());
    assert_eq!(engine.daily_event().unwrap().effect, EventEffect::Normal);

    let reasons: Vec<String> = engine
        .journal_events_of_type("narrative_fallback")
        .unwrap()
        .into_iter()
        .map(|e| e.payload)
        .collect();
    assert_eq!(reasons.len(), 1);
    assert!(reasons[0].contains("timed out"));

    engine.end_day_now().unwrap();
    assert!(engine.is_loading(), "review still pending");
    let events = engine.advance_day().unwrap();
    assert_eq!(events[0].type_name(), "action_ignored");

    engine.pump(ms(10_000)).unwrap();
    assert!(!engine.is_loading());
    assert_eq!(engine.day_stats().review, engine.translate("default_review", &[]));

    engine.advance_day().unwrap();
    assert_eq!(engine.phase(), DayPhase::Lobby);
    assert_eq!(engine.state().day, 2);
}

#[test]
fn threaded_content_lands_on_a_later_pump() {
    let (narrator, release) = GatedNarrator::new(event("Late Rush", EventEffect::Rush), "Worth the wait.");
    let mut engine = build_with("day-late", 9, Default::default(), narrator)
        .with_dispatch(Dispatch::Threaded);

    engine.start_day().unwrap();
    engine.pump(ms(100)).unwrap();
    assert_eq!(engine.phase(), DayPhase::Lobby);
    assert!(engine.is_loading());

    release.send(()).unwrap();
    pump_until_resolved(&mut engine, ms(200));

    assert_eq!(engine.phase(), DayPhase::Active);
    assert_eq!(engine.daily_event().unwrap().title, "Late Rush");
    assert_eq!(engine.tick_params().spawn_threshold, 100.0);
    assert_eq!(fallback_flags(&engine, "day_started"), vec![false]);

    engine.end_day_now().unwrap();
    assert!(engine.is_loading());
    release.send(()).unwrap();
    pump_until_resolved(&mut engine, ms(300));

    assert_eq!(engine.day_stats().review, "Worth the wait.");
    assert_eq!(fallback_flags(&engine, "review_received"), vec![false]);
    assert_eq!(count_events(&engine, "narrative_fallback"), 0);
}

#[test]
fn crashed_worker_falls_back() {
    let narrator: Arc<dyn Narrator> = Arc::new(PanickingNarrator);
    let mut engine = build_with("day-crash", 9, Default::default(), narrator)
        .with_dispatch(Dispatch::Threaded);

    engine.start_day().unwrap();
    pump_until_resolved(&mut engine, ms(100));

    assert_eq!(engine.phase(), DayPhase::Active);
    let event = engine.daily_event().unwrap();
    assert_eq!(event.effect, EventEffect::Normal);
    assert_eq!(event.title, engine.translate("default_event_title", &[]));
    assert_eq!(fallback_flags(&engine, "day_started"), vec![true]);

    engine.end_day_now().unwrap();
    pump_until_resolved(&mut engine, ms(200));
    assert_eq!(engine.day_stats().review, engine.translate("default_review", &[]));

    let reasons: Vec<String> = engine
        .journal_events_of_type("narrative_fallback")
        .unwrap()
        .into_iter()
        .map(|e| e.payload)
        .collect();
    assert_eq!(reasons.len(), 2);
    assert!(reasons.iter().all(|r| r.contains("worker exited")));
}

#[test]
fn huge_driver_time_ends_the_day_without_overflow() {
    let mut engine = build("day-max", 9);
    open_day(&mut engine);

    engine.pump(Duration::MAX).unwrap();
    assert_eq!(engine.phase(), DayPhase::Ended);
    assert_eq!(engine.time_remaining(), 0);

    engine.advance_day().unwrap();
    open_day(&mut engine);
    engine.pump(Duration::MAX).unwrap();
    assert_eq!(engine.phase(), DayPhase::Ended);
}

#[test]
fn pump_throttles_ticks_and_runs_the_countdown() {
    let mut engine = build("day-pump", 9);
    engine.start_day().unwrap();
    assert_eq!(engine.time_remaining(), 60);

    // First pump primes the throttle; then one tick per >50 ms.
    for t in (10..=1_000).step_by(10) {
        engine.pump(ms(t)).unwrap();
    }
    assert_eq!(engine.clock.current_tick, 16);
    assert_eq!(engine.time_remaining(), 59);

    engine.pump(ms(60_000)).unwrap();
    assert_eq!(engine.phase(), DayPhase::Ended);
    assert_eq!(engine.time_remaining(), 0);
    assert_eq!(count_events(&engine, "day_ended"), 1);
    assert_eq!(count_events(&engine, "countdown_ticked"), 2);

    // Nothing runs once the day is over.
    let tick = engine.clock.current_tick;
    engine.pump(ms(61_000)).unwrap();
    engine.pump(ms(70_000)).unwrap();
    assert_eq!(engine.clock.current_tick, tick);
    assert_eq!(count_events(&engine, "day_ended"), 1);
}

#[test]
fn time_never_runs_backwards() {
    let mut engine = build("day-backwards", 9);
    engine.start_day().unwrap();
    engine.pump(ms(2_000)).unwrap();
    engine.pump(ms(500)).unwrap();
    assert_eq!(engine.time_remaining(), 58);
}

#[test]
fn phases_cannot_be_skipped() {
    let mut engine = build("day-phases", 9);

    for events in [engine.advance_day().unwrap(), engine.end_day_now().unwrap()] {
        assert_eq!(events[0].type_name(), "action_ignored");
    }
    assert_eq!(engine.phase(), DayPhase::Lobby);

    open_day(&mut engine);
    let events = engine.start_day().unwrap();
    assert_eq!(events[0].type_name(), "action_ignored");
    let events = engine.advance_day().unwrap();
    assert_eq!(events[0].type_name(), "action_ignored");

    engine.end_day_now().unwrap();
    let events = engine.start_day().unwrap();
    assert_eq!(events[0].type_name(), "action_ignored");
    assert_eq!(engine.phase(), DayPhase::Ended);
    assert_eq!(engine.state().day, 1);

    engine.advance_day().unwrap();
    assert_eq!(engine.state().day, 2);
    assert!(engine.daily_event().is_none());
}

#[test]
fn stats_reset_at_the_next_day() {
    let mut engine = build("day-stats", 9);
    open_day(&mut engine);
    load_mold(&mut engine, 1, Filling::RedBean);
    engine.run_ticks(700).unwrap();
    assert_eq!(mold_state(&engine, 1), MoldState::Burnt);
    engine.interact_mold(1).unwrap();
    engine.end_day_now().unwrap();
    assert_eq!(engine.day_stats().burnt, 1);
    assert!(!engine.day_stats().review.is_empty());

    engine.advance_day().unwrap();
    open_day(&mut engine);
    let stats = engine.day_stats();
    assert_eq!((stats.served, stats.burnt, stats.earned), (0, 0, 0));
    assert!(stats.review.is_empty());
}

/// Remembers the last review request it saw.
struct RecordingNarrator {
    seen: Mutex<Option<ReviewRequest>>,
}

impl Narrator for RecordingNarrator {
    fn daily_event(&self, request: &EventRequest) -> Result<DailyEvent, NarrativeError> {
        Ok(event(&format!("Day {}", request.day), EventEffect::Normal))
    }

    fn day_review(&self, request: &ReviewRequest) -> Result<String, NarrativeError> {
        if let Ok(mut seen) = self.seen.lock() {
            *seen = Some(request.clone());
        }
        Ok(format!("served {} burnt {}", request.served, request.burnt))
    }
}

#[test]
fn review_is_asked_with_the_final_stats() {
    let recorder = Arc::new(RecordingNarrator { seen: Mutex::new(None) });
    let narrator: Arc<dyn Narrator> = recorder.clone();
    let mut engine = build_with("day-review", 9, Default::default(), narrator)
        .with_language(Language::En);

    open_day(&mut engine);
    assert_eq!(engine.daily_event().unwrap().title, "Day 1");
    load_mold(&mut engine, 2, Filling::Custard);
    engine.run_ticks(700).unwrap();
    engine.interact_mold(2).unwrap();
    engine.end_day_now().unwrap();

    let seen = recorder.seen.lock().unwrap().clone().unwrap();
    assert_eq!(seen.day, 1);
    assert_eq!(seen.burnt, 1);
    assert_eq!(seen.served, 0);
    assert_eq!(seen.language, Language::En);
    assert_eq!(engine.day_stats().review, "served 0 burnt 1");
}

#[test]
fn fallback_text_follows_the_language() {
    let mut engine = build("day-lang", 9).with_language(Language::En);
    open_day(&mut engine);
    assert_eq!(engine.daily_event().unwrap().title, "Sunny Day");
    close_day(&mut engine);

    let events = engine.apply(PlayerCommand::SetLanguage { language: Language::Ko }).unwrap();
    assert_eq!(events, vec![SimEvent::LanguageChanged { tick: engine.clock.current_tick, language: Language::Ko }]);
    assert_eq!(engine.language(), Language::Ko);
    open_day(&mut engine);
    assert_eq!(engine.daily_event().unwrap().title, "맑은 날");

    let changes = engine.journal_events_of_type("language_changed").unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].subsystem, "player");
    assert!(changes[0].payload.contains("\"language\":\"ko\""));
}

#[test]
fn snapshot_reflects_the_session() {
    let mut engine = build("day-snapshot", 9);
    let lobby = engine.snapshot();
    assert_eq!(lobby.phase, DayPhase::Lobby);
    assert!(!lobby.is_day_active && !lobby.day_ended && !lobby.loading);
    assert_eq!(lobby.molds.len(), 3);
    assert_eq!(lobby.max_customers, 4);
    assert_eq!(lobby.time_remaining, 60);

    open_day(&mut engine);
    engine.run_ticks(250).unwrap();
    let active = engine.snapshot();
    assert!(active.is_day_active);
    assert_eq!(active.customers.len(), 1);
    assert_eq!(active.selected_filling, Filling::RedBean);
    assert!((active.cook_speed - 1.2).abs() < 1e-9);

    let json = serde_json::to_string(&active).unwrap();
    assert!(json.contains("\"phase\":\"active\""));
}
