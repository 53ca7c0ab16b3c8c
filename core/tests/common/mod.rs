//! Shared builders and scripted narrators for the integration tests.

#![allow(dead_code)]

use fishbun_core::{
    config::SimConfig,
    day_controller::{DailyEvent, DayPhase, EventEffect},
    engine::SimEngine,
    mold_subsystem::MoldState,
    narrative::{EventRequest, NarrativeError, Narrator, OfflineNarrator, ReviewRequest},
    types::{Filling, MoldId},
};
use std::sync::{mpsc, Arc, Mutex};

/// Ticks for a level-1 mold to finish cooking: ceil(100 / (0.5 × 1.2)).
pub const TICKS_TO_COOK: u64 = 167;

pub fn build(run_id: &str, seed: u64) -> SimEngine {
    SimEngine::build_test(run_id.to_string(), seed).expect("build test engine")
}

pub fn build_with(run_id: &str, seed: u64, config: SimConfig, narrator: Arc<dyn Narrator>) -> SimEngine {
    SimEngine::build_test_with(run_id.to_string(), seed, config, narrator)
        .expect("build test engine")
}

pub fn offline() -> Arc<dyn Narrator> {
    Arc::new(OfflineNarrator)
}

/// Start a day and check it opened straight away (inline narrator).
pub fn open_day(engine: &mut SimEngine) {
    engine.start_day().unwrap();
    assert_eq!(engine.phase(), DayPhase::Active, "day should open immediately");
}

/// Close the current day and return to the lobby.
pub fn close_day(engine: &mut SimEngine) {
    engine.end_day_now().unwrap();
    assert_eq!(engine.phase(), DayPhase::Ended);
    engine.advance_day().unwrap();
    assert_eq!(engine.phase(), DayPhase::Lobby);
}

/// Pour, fill with `filling` and start cooking `mold_id`.
pub fn load_mold(engine: &mut SimEngine, mold_id: MoldId, filling: Filling) {
    engine.select_filling(filling).unwrap();
    for _ in 0..3 {
        engine.interact_mold(mold_id).unwrap();
    }
    assert_eq!(mold_state(engine, mold_id), MoldState::Cooking);
}

/// Load, cook and harvest one bun into the holding area.
pub fn bake_one(engine: &mut SimEngine, mold_id: MoldId, filling: Filling) {
    load_mold(engine, mold_id, filling);
    engine.run_ticks(TICKS_TO_COOK).unwrap();
    assert_eq!(mold_state(engine, mold_id), MoldState::Cooked);
    engine.interact_mold(mold_id).unwrap();
}

pub fn mold_state(engine: &SimEngine, mold_id: MoldId) -> MoldState {
    engine
        .molds()
        .iter()
        .find(|m| m.id == mold_id)
        .map(|m| m.state)
        .expect("mold exists")
}

pub fn count_events(engine: &SimEngine, event_type: &str) -> usize {
    engine.journal_events_of_type(event_type).unwrap().len()
}

pub fn event(title: &str, effect: EventEffect) -> DailyEvent {
    DailyEvent {
        title:       title.to_string(),
        description: format!("{title} at the stall"),
        effect,
    }
}

/// Answers every request with fixed results.
pub struct ScriptedNarrator {
    pub event:  Result<DailyEvent, NarrativeError>,
    pub review: Result<String, NarrativeError>,
}

impl ScriptedNarrator {
    pub fn ok(event: DailyEvent, review: &str) -> Arc<dyn Narrator> {
        Arc::new(Self { event: Ok(event), review: Ok(review.to_string()) })
    }

    pub fn failing(err: NarrativeError) -> Arc<dyn Narrator> {
        Arc::new(Self { event: Err(err.clone()), review: Err(err) })
    }
}

impl Narrator for ScriptedNarrator {
    fn daily_event(&self, _request: &EventRequest) -> Result<DailyEvent, NarrativeError> {
        self.event.clone()
    }

    fn day_review(&self, _request: &ReviewRequest) -> Result<String, NarrativeError> {
        self.review.clone()
    }
}

/// Blocks every request until the paired sender is dropped.
pub struct HangingNarrator {
    gate: Mutex<mpsc::Receiver<()>>,
}

impl HangingNarrator {
    pub fn new() -> (Arc<dyn Narrator>, mpsc::Sender<()>) {
        let (tx, rx) = mpsc::channel();
        (Arc::new(Self { gate: Mutex::new(rx) }), tx)
    }

    fn wait(&self) -> NarrativeError {
        if let Ok(gate) = self.gate.lock() {
            let _ = gate.recv();
        }
        NarrativeError::Transport("released".into())
    }
}

impl Narrator for HangingNarrator {
    fn daily_event(&self, _request: &EventRequest) -> Result<DailyEvent, NarrativeError> {
        Err(self.wait())
    }

    fn day_review(&self, _request: &ReviewRequest) -> Result<String, NarrativeError> {
        Err(self.wait())
    }
}

/// Holds each request until the paired sender fires, then answers with
/// fixed content.
pub struct GatedNarrator {
    gate:   Mutex<mpsc::Receiver<()>>,
    event:  DailyEvent,
    review: String,
}

impl GatedNarrator {
    pub fn new(event: DailyEvent, review: &str) -> (Arc<dyn Narrator>, mpsc::Sender<()>) {
        let (tx, rx) = mpsc::channel();
        let narrator = Self { gate: Mutex::new(rx), event, review: review.to_string() };
        (Arc::new(narrator), tx)
    }

    fn wait(&self) {
        if let Ok(gate) = self.gate.lock() {
            let _ = gate.recv();
        }
    }
}

impl Narrator for GatedNarrator {
    fn daily_event(&self, _request: &EventRequest) -> Result<DailyEvent, NarrativeError> {
        self.wait();
        Ok(self.event.clone())
    }

    fn day_review(&self, _request: &ReviewRequest) -> Result<String, NarrativeError> {
        self.wait();
        Ok(self.review.clone())
    }
}

/// Panics inside every request.
pub struct PanickingNarrator;

impl Narrator for PanickingNarrator {
    fn daily_event(&self, _request: &EventRequest) -> Result<DailyEvent, NarrativeError> {
        panic!("narrator crashed");
    }

    fn day_review(&self, _request: &ReviewRequest) -> Result<String, NarrativeError> {
        panic!("narrator crashed");
    }
}

/// Pump at a fixed driver time until no request is pending, giving the
/// worker thread real time to finish. Panics if it never resolves.
pub fn pump_until_resolved(engine: &mut SimEngine, now: std::time::Duration) {
    for _ in 0..500 {
        engine.pump(now).unwrap();
        if !engine.is_loading() {
            return;
        }
        std::thread::sleep(std::time::Duration::from_millis(5));
    }
    panic!("narrative request never resolved");
}
