//! The simulation engine: the stall's session controller.
//!
//! DRIVER: the host calls `pump(now)` as often as it likes (every frame).
//! Each pump, in order:
//!   1. Resolve any finished narrative request (event → open the day,
//!      review → store it).
//!   2. If the day is active and the throttle allows, run one tick.
//!   3. If the day is active, poll the 1 Hz countdown; expiry ends the day.
//!
//! TICK ORDER (fixed, documented, never reordered):
//!   1. Mold subsystem      (cook / burn)
//!   2. Customer subsystem  (spawn, then patience decay)
//!   3. Economy feedback    (one reputation penalty per walk-away)
//!
//! RULES:
//!   - Subsystems see the session only through TickParams.
//!   - All randomness flows through the RngBank.
//!   - Every state change is recorded in the event journal.
//!   - Invalid player actions change nothing and are journaled as
//!     ActionIgnored.

use crate::{
    clock::SimClock,
    command::PlayerCommand,
    config::SimConfig,
    customer_subsystem::{Customer, CustomerSubsystem, ServeOutcome},
    day_controller::{DailyEvent, DayController, DayPhase, DayStats, EventEffect},
    economy::{GameState, PurchaseOutcome, Sale, Upgrade, UpgradeBook, UpgradeId},
    error::SimResult,
    event::{EventLogEntry, SimEvent},
    locale::{Catalog, Language, Translator},
    mold_subsystem::{Interaction, Mold, MoldSubsystem},
    narrative::{
        request_event, request_review, Dispatch, EventRequest, NarrativeError, Narrator,
        OfflineNarrator, ReviewRequest,
    },
    rng::{RngBank, SubsystemSlot},
    snapshot::SessionSnapshot,
    store::SimStore,
    subsystem::{SimSubsystem, TickParams},
    types::{CustomerId, Filling, MoldId, RunId},
};
use std::sync::Arc;
use std::time::Duration;

pub struct SimEngine {
    pub run_id:  RunId,
    pub clock:   SimClock,
    rng_bank:    RngBank,
    config:      SimConfig,
    store:       SimStore,
    narrator:    Arc<dyn Narrator>,
    dispatch:    Dispatch,
    translator:  Arc<dyn Translator>,
    language:    Language,
    state:       GameState,
    molds:       MoldSubsystem,
    customers:   CustomerSubsystem,
    upgrades:    UpgradeBook,
    day:         DayController,
    selected:    Filling,
    /// Latest driver time seen by `pump`.
    now:         Duration,
}

impl SimEngine {
    /// Wire a session. The run must already exist in `store`.
    pub fn new(
        run_id: RunId,
        seed: u64,
        config: SimConfig,
        store: SimStore,
        narrator: Arc<dyn Narrator>,
    ) -> SimResult<Self> {
        config.validate()?;
        let engine = Self {
            clock:      SimClock::new(),
            rng_bank:   RngBank::new(seed),
            state:      GameState::new(&config),
            molds:      MoldSubsystem::new(config.starting_molds),
            customers:  CustomerSubsystem::new(),
            upgrades:   UpgradeBook::new(&config),
            day:        DayController::new(config.tick_interval()),
            dispatch:   Dispatch::default(),
            translator: Arc::new(Catalog),
            language:   Language::default(),
            selected:   Filling::RedBean,
            now:        Duration::ZERO,
            narrator,
            config,
            store,
            run_id,
        };
        engine.emit("engine", vec![SimEvent::RunInitialized {
            run_id: engine.run_id.clone(),
            seed,
        }])?;
        Ok(engine)
    }

    /// In-memory journal, offline narrator, inline dispatch.
    pub fn build_test(run_id: RunId, seed: u64) -> SimResult<Self> {
        Self::build_test_with(run_id, seed, SimConfig::default(), Arc::new(OfflineNarrator))
    }

    pub fn build_test_with(
        run_id: RunId,
        seed: u64,
        config: SimConfig,
        narrator: Arc<dyn Narrator>,
    ) -> SimResult<Self> {
        let store = SimStore::in_memory()?;
        store.migrate()?;
        store.insert_run(&run_id, seed, "test", 0)?;
        Ok(Self::new(run_id, seed, config, store, narrator)?.with_dispatch(Dispatch::Inline))
    }

    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = dispatch;
        self
    }

    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = translator;
        self
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    // ── Driver ─────────────────────────────────────────────────

    /// Advance to driver time `now`. Safe to call at any rate.
    pub fn pump(&mut self, now: Duration) -> SimResult<Vec<SimEvent>> {
        self.now = self.now.max(now);
        let now = self.now;

        let mut out = self.poll_narrative()?;

        if self.day.is_active() && self.day.throttle.due(now) {
            out.extend(self.tick()?);
        }

        if self.day.is_active() {
            let poll = self.day.timer.poll(now);
            if poll.fired > 0 {
                out.extend(self.emit("day", vec![SimEvent::CountdownTicked {
                    tick:      self.clock.current_tick,
                    remaining: self.day.timer.remaining(),
                }])?);
            }
            if poll.expired {
                out.extend(self.end_day()?);
            }
        }
        Ok(out)
    }

    /// Run up to `n` ticks back to back, ignoring the throttle.
    /// Stops early if the day is not active. Used by tests and tooling.
    pub fn run_ticks(&mut self, n: u64) -> SimResult<()> {
        for _ in 0..n {
            if !self.day.is_active() {
                break;
            }
            self.tick()?;
        }
        Ok(())
    }

    fn tick(&mut self) -> SimResult<Vec<SimEvent>> {
        let tick = self.clock.advance();
        let params = self.tick_params();
        let mut tick_events = Vec::new();

        let subsystems: [(SubsystemSlot, &mut dyn SimSubsystem); 2] = [
            (SubsystemSlot::Mold, &mut self.molds),
            (SubsystemSlot::Customer, &mut self.customers),
        ];
        for (slot, subsystem) in subsystems {
            let mut rng = self.rng_bank.for_subsystem(slot, tick);
            let events = subsystem.update(tick, &params, &mut rng)?;
            record(&self.store, &self.run_id, subsystem.name(), &events)?;
            tick_events.extend(events);
        }

        let mut feedback = Vec::new();
        for event in &tick_events {
            if let SimEvent::CustomerWalkedAway { .. } = event {
                let delta = self.state.penalize(self.config.walk_away_penalty);
                feedback.push(SimEvent::ReputationChanged {
                    tick,
                    reputation: self.state.reputation,
                    delta,
                });
            }
        }
        if !feedback.is_empty() {
            log::debug!(
                "tick={tick} economy: {} walk-away(s), reputation now {}",
                feedback.len(),
                self.state.reputation
            );
        }
        tick_events.extend(self.emit("economy", feedback)?);

        Ok(tick_events)
    }

    /// Snapshot of everything the subsystems may read this tick.
    pub fn tick_params(&self) -> TickParams {
        let effect = self.day.effect();
        TickParams {
            cook_step:       self.config.cook_rate_base * self.upgrades.cook_speed_multiplier(),
            burn_step:       self.config.burn_rate,
            spawn_threshold: effect.spawn_threshold(self.config.spawn_rate_base),
            max_customers:   self.max_customers(),
            patience_decay:  self.config.patience_decay_base / self.upgrades.patience_divisor(),
            max_patience:    self.config.max_patience,
            avatar_count:    self.config.avatar_count,
            order_pool:      self.order_pool(),
        }
    }

    fn order_pool(&self) -> Vec<Filling> {
        let mut pool = vec![Filling::RedBean, Filling::Custard];
        if self.state.day > self.config.nutella_unlock_day {
            pool.push(Filling::Nutella);
        }
        pool
    }

    // ── Player actions ─────────────────────────────────────────

    pub fn apply(&mut self, command: PlayerCommand) -> SimResult<Vec<SimEvent>> {
        match command {
            PlayerCommand::InteractMold { mold_id }       => self.interact_mold(mold_id),
            PlayerCommand::ServeCustomer { customer_id }  => self.serve_customer(customer_id),
            PlayerCommand::SelectFilling { filling }      => self.select_filling(filling),
            PlayerCommand::PurchaseUpgrade { upgrade }    => self.purchase_upgrade(upgrade),
            PlayerCommand::StartDay                       => self.start_day(),
            PlayerCommand::EndDayNow                      => self.end_day_now(),
            PlayerCommand::AdvanceDay                     => self.advance_day(),
            PlayerCommand::SetLanguage { language } => self.set_language(language),
        }
    }

    pub fn interact_mold(&mut self, mold_id: MoldId) -> SimResult<Vec<SimEvent>> {
        if !self.day.is_active() {
            return self.ignore("interact_mold", "day not active".into());
        }
        let tick = self.clock.current_tick;
        let selected = self.selected;
        let Some(mold) = self.molds.get_mut(mold_id) else {
            return self.ignore("interact_mold", format!("unknown mold {mold_id}"));
        };

        let event = match mold.interact(selected) {
            Interaction::Poured => SimEvent::DoughPoured { tick, mold_id },
            Interaction::Filled(filling) => SimEvent::MoldFilled { tick, mold_id, filling },
            Interaction::StartedCooking(filling) => SimEvent::CookingStarted { tick, mold_id, filling },
            Interaction::StillCooking => {
                return self.ignore("interact_mold", format!("mold {mold_id} is still cooking"));
            }
            Interaction::Harvested(filling) => {
                self.state.holding_area.add(filling);
                SimEvent::BunHarvested { tick, mold_id, filling }
            }
            Interaction::Discarded(filling) => {
                self.day.stats.burnt += 1;
                SimEvent::BunDiscarded { tick, mold_id, filling }
            }
        };
        self.emit("mold", vec![event])
    }

    pub fn serve_customer(&mut self, customer_id: CustomerId) -> SimResult<Vec<SimEvent>> {
        if !self.day.is_active() {
            return self.ignore("serve_customer", "day not active".into());
        }
        let tick = self.clock.current_tick;
        let customer = match self.customers.serve(customer_id, &mut self.state.holding_area) {
            ServeOutcome::Served(customer) => customer,
            ServeOutcome::UnknownCustomer => {
                return self.ignore("serve_customer", format!("no customer {customer_id}"));
            }
            ServeOutcome::OutOfStock(order) => {
                return self.ignore("serve_customer", format!("no {order:?} in stock"));
            }
        };

        let sale = Sale::new(
            self.config.prices.price(customer.order),
            self.config.tip_ratio,
            self.day.effect().tips(),
        );
        self.state.credit_sale(sale.total(), self.config.serve_reputation);
        self.day.stats.served += 1;
        self.day.stats.earned += sale.total();

        self.emit("customer", vec![
            SimEvent::CustomerServed {
                tick,
                customer_id,
                order: customer.order,
                price: sale.price,
                tip:   sale.tip,
            },
            SimEvent::ReputationChanged {
                tick,
                reputation: self.state.reputation,
                delta:      i64::from(self.config.serve_reputation),
            },
        ])
    }

    pub fn select_filling(&mut self, filling: Filling) -> SimResult<Vec<SimEvent>> {
        if filling == Filling::None {
            return self.ignore("select_filling", "cannot select no filling".into());
        }
        self.selected = filling;
        self.emit("mold", vec![SimEvent::FillingSelected {
            tick: self.clock.current_tick,
            filling,
        }])
    }

    /// Switch the language used for fallback and provider text. Content
    /// already shown stays as it was.
    pub fn set_language(&mut self, language: Language) -> SimResult<Vec<SimEvent>> {
        let tick = self.clock.current_tick;
        log::debug!("tick={tick} language -> {language:?}");
        self.language = language;
        self.emit("player", vec![SimEvent::LanguageChanged { tick, language }])
    }

    /// Shop purchases happen in the lobby, between days.
    pub fn purchase_upgrade(&mut self, upgrade: UpgradeId) -> SimResult<Vec<SimEvent>> {
        if self.day.phase != DayPhase::Lobby {
            return self.ignore("purchase_upgrade", "shop is closed".into());
        }
        let tick = self.clock.current_tick;
        match self.upgrades.purchase(upgrade, &mut self.state.money) {
            PurchaseOutcome::Purchased { level, paid, next_cost } => {
                log::info!("day {} economy: bought {upgrade:?} level {level} for {paid}", self.state.day);
                let mut events = vec![SimEvent::UpgradePurchased {
                    tick,
                    upgrade,
                    level,
                    paid,
                    next_cost,
                }];
                if upgrade == UpgradeId::MoldCount {
                    let mold_id = self.molds.add_mold();
                    events.push(SimEvent::MoldAdded { tick, mold_id });
                }
                self.emit("economy", events)
            }
            PurchaseOutcome::Unknown => {
                self.ignore("purchase_upgrade", format!("{upgrade:?} is not for sale"))
            }
            PurchaseOutcome::MaxLevel => {
                self.ignore("purchase_upgrade", format!("{upgrade:?} is at max level"))
            }
            PurchaseOutcome::InsufficientFunds { cost } => self.ignore(
                "purchase_upgrade",
                format!("{upgrade:?} costs {cost}, have {}", self.state.money),
            ),
        }
    }

    // ── Day flow ───────────────────────────────────────────────

    /// Ask for the day's event. The day opens once it resolves.
    pub fn start_day(&mut self) -> SimResult<Vec<SimEvent>> {
        if self.day.phase != DayPhase::Lobby {
            return self.ignore("start_day", format!("phase is {:?}", self.day.phase));
        }
        if self.day.is_loading() {
            return self.ignore("start_day", "already waiting for the daily event".into());
        }

        let request = EventRequest {
            day:        self.state.day,
            reputation: self.state.reputation,
            language:   self.language,
        };
        self.day.pending_event = Some(request_event(
            &self.narrator,
            self.dispatch,
            self.now.saturating_add(self.config.narrative_timeout()),
            request,
        ));

        let mut out = self.emit("day", vec![SimEvent::DayStartRequested {
            tick: self.clock.current_tick,
            day:  self.state.day,
        }])?;
        out.extend(self.poll_narrative()?);
        Ok(out)
    }

    /// Manual short-circuit: drop the countdown to zero and close.
    pub fn end_day_now(&mut self) -> SimResult<Vec<SimEvent>> {
        if !self.day.is_active() || !self.day.timer.force_expire() {
            return self.ignore("end_day_now", "day not active".into());
        }
        self.end_day()
    }

    /// Back to the lobby for the next day, once the review is in.
    pub fn advance_day(&mut self) -> SimResult<Vec<SimEvent>> {
        if !self.day.is_ended() {
            return self.ignore("advance_day", format!("phase is {:?}", self.day.phase));
        }
        if self.day.pending_review.is_some() {
            return self.ignore("advance_day", "review still loading".into());
        }
        self.state.day += 1;
        self.day.reopen_lobby();
        log::info!("day {}: lobby", self.state.day);
        self.emit("day", vec![SimEvent::DayAdvanced {
            tick: self.clock.current_tick,
            day:  self.state.day,
        }])
    }

    fn end_day(&mut self) -> SimResult<Vec<SimEvent>> {
        self.day.finish();
        let stats = self.day.stats.clone();
        log::info!(
            "day {}: closed, served={} burnt={} earned={}",
            self.state.day, stats.served, stats.burnt, stats.earned
        );

        let request = ReviewRequest {
            day:      self.state.day,
            served:   stats.served,
            burnt:    stats.burnt,
            earned:   stats.earned,
            language: self.language,
        };
        self.day.pending_review = Some(request_review(
            &self.narrator,
            self.dispatch,
            self.now.saturating_add(self.config.narrative_timeout()),
            request,
        ));

        let mut out = self.emit("day", vec![SimEvent::DayEnded {
            tick:   self.clock.current_tick,
            day:    self.state.day,
            served: stats.served,
            burnt:  stats.burnt,
            earned: stats.earned,
        }])?;
        out.extend(self.poll_narrative()?);
        Ok(out)
    }

    /// Apply any narrative result that has arrived. Each pending request
    /// is taken out of its slot, so it resolves exactly once.
    fn poll_narrative(&mut self) -> SimResult<Vec<SimEvent>> {
        let mut out = Vec::new();
        let now = self.now;

        if let Some(result) = self.day.pending_event.as_ref().and_then(|p| p.poll(now)) {
            self.day.pending_event = None;
            out.extend(self.open_day(result)?);
        }
        if let Some(result) = self.day.pending_review.as_ref().and_then(|p| p.poll(now)) {
            self.day.pending_review = None;
            out.extend(self.store_review(result)?);
        }
        Ok(out)
    }

    fn open_day(&mut self, result: Result<DailyEvent, NarrativeError>) -> SimResult<Vec<SimEvent>> {
        let tick = self.clock.current_tick;
        let mut events = Vec::new();
        let (event, fallback) = match result {
            Ok(event) => (event, false),
            Err(err) => {
                log::warn!("tick={tick} day: daily event unavailable ({err}), using fallback");
                events.push(SimEvent::NarrativeFallback {
                    tick,
                    request: "daily_event".into(),
                    reason:  err.to_string(),
                });
                (self.fallback_event(), true)
            }
        };

        self.molds.reset_for_day();
        self.customers.reset_for_day();
        self.day.activate(event.clone(), self.now, self.config.day_length_secs);
        log::info!(
            "day {}: open, effect={:?} title={:?}",
            self.state.day, event.effect, event.title
        );

        events.push(SimEvent::DayStarted {
            tick,
            day: self.state.day,
            title: event.title,
            effect: event.effect,
            fallback,
        });
        self.emit("day", events)
    }

    fn store_review(&mut self, result: Result<String, NarrativeError>) -> SimResult<Vec<SimEvent>> {
        let tick = self.clock.current_tick;
        let mut events = Vec::new();
        let (review, fallback) = match result {
            Ok(text) => (text, false),
            Err(err) => {
                log::warn!("tick={tick} day: review unavailable ({err}), using fallback");
                events.push(SimEvent::NarrativeFallback {
                    tick,
                    request: "day_review".into(),
                    reason:  err.to_string(),
                });
                (self.translate("default_review", &[]), true)
            }
        };
        self.day.stats.review = review;
        events.push(SimEvent::ReviewReceived { tick, day: self.state.day, fallback });
        self.emit("day", events)
    }

    fn fallback_event(&self) -> DailyEvent {
        DailyEvent {
            title:       self.translate("default_event_title", &[]),
            description: self.translate("default_event_desc", &[]),
            effect:      EventEffect::Normal,
        }
    }

    // ── Journal ────────────────────────────────────────────────

    fn emit(&self, subsystem: &str, events: Vec<SimEvent>) -> SimResult<Vec<SimEvent>> {
        record(&self.store, &self.run_id, subsystem, &events)?;
        Ok(events)
    }

    fn ignore(&self, action: &str, reason: String) -> SimResult<Vec<SimEvent>> {
        let tick = self.clock.current_tick;
        log::debug!("tick={tick} ignored {action}: {reason}");
        self.emit("player", vec![SimEvent::ActionIgnored {
            tick,
            action: action.into(),
            reason,
        }])
    }

    pub fn journal_payloads(&self) -> SimResult<Vec<String>> {
        self.store.all_payloads(&self.run_id)
    }

    pub fn journal_events_for_tick(&self, tick: u64) -> SimResult<Vec<EventLogEntry>> {
        self.store.events_for_tick(&self.run_id, tick)
    }

    pub fn journal_events_of_type(&self, event_type: &str) -> SimResult<Vec<EventLogEntry>> {
        self.store.events_of_type(&self.run_id, event_type)
    }

    pub fn journal_event_count(&self) -> SimResult<i64> {
        self.store.event_count(&self.run_id)
    }

    // ── Read-only views ────────────────────────────────────────

    pub fn translate(&self, key: &str, params: &[(&str, String)]) -> String {
        self.translator.translate(self.language, key, params)
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn molds(&self) -> &[Mold] {
        self.molds.molds()
    }

    pub fn customers(&self) -> &[Customer] {
        self.customers.customers()
    }

    pub fn upgrades(&self) -> &[Upgrade] {
        self.upgrades.all()
    }

    pub fn day_stats(&self) -> &DayStats {
        &self.day.stats
    }

    pub fn daily_event(&self) -> Option<&DailyEvent> {
        self.day.event.as_ref()
    }

    pub fn phase(&self) -> DayPhase {
        self.day.phase
    }

    pub fn is_loading(&self) -> bool {
        self.day.is_loading()
    }

    pub fn time_remaining(&self) -> u32 {
        if self.day.is_active() || self.day.is_ended() {
            self.day.timer.remaining()
        } else {
            self.config.day_length_secs
        }
    }

    pub fn selected_filling(&self) -> Filling {
        self.selected
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn max_customers(&self) -> usize {
        self.state
            .customer_cap(self.config.base_customer_cap, self.config.reputation_per_slot)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            tick:             self.clock.current_tick,
            phase:            self.day.phase,
            is_day_active:    self.day.is_active(),
            day_ended:        self.day.is_ended(),
            loading:          self.day.is_loading(),
            time_remaining:   self.time_remaining(),
            game_state:       self.state.clone(),
            molds:            self.molds().to_vec(),
            customers:        self.customers().to_vec(),
            max_customers:    self.max_customers(),
            upgrades:         self.upgrades().to_vec(),
            daily_event:      self.day.event.clone(),
            day_stats:        self.day.stats.clone(),
            selected_filling: self.selected,
            cook_speed:       self.upgrades.cook_speed_multiplier(),
            language:         self.language,
        }
    }
}

/// Append events to the journal under `subsystem`.
fn record(store: &SimStore, run_id: &str, subsystem: &str, events: &[SimEvent]) -> SimResult<()> {
    for event in events {
        let entry = EventLogEntry {
            id:         None,
            run_id:     run_id.to_string(),
            tick:       event_tick(event),
            subsystem:  subsystem.to_string(),
            event_type: event.type_name().to_string(),
            payload:    serde_json::to_string(event)?,
        };
        store.append_event(&entry)?;
    }
    Ok(())
}

fn event_tick(event: &SimEvent) -> u64 {
    match event {
        SimEvent::RunInitialized { .. } => 0,
        SimEvent::DoughPoured { tick, .. }
        | SimEvent::MoldFilled { tick, .. }
        | SimEvent::CookingStarted { tick, .. }
        | SimEvent::BunCooked { tick, .. }
        | SimEvent::BunBurnt { tick, .. }
        | SimEvent::BunHarvested { tick, .. }
        | SimEvent::BunDiscarded { tick, .. }
        | SimEvent::MoldAdded { tick, .. }
        | SimEvent::CustomerArrived { tick, .. }
        | SimEvent::CustomerWalkedAway { tick, .. }
        | SimEvent::CustomerServed { tick, .. }
        | SimEvent::ReputationChanged { tick, .. }
        | SimEvent::UpgradePurchased { tick, .. }
        | SimEvent::FillingSelected { tick, .. }
        | SimEvent::DayStartRequested { tick, .. }
        | SimEvent::DayStarted { tick, .. }
        | SimEvent::CountdownTicked { tick, .. }
        | SimEvent::DayEnded { tick, .. }
        | SimEvent::ReviewReceived { tick, .. }
        | SimEvent::DayAdvanced { tick, .. }
        | SimEvent::NarrativeFallback { tick, .. }
        | SimEvent::ActionIgnored { tick, .. }
        | SimEvent::LanguageChanged { tick, .. } => *tick,
    }
}
