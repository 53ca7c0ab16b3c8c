//! Customer subsystem: the queue in front of the stall.
//!
//! Per tick, in order:
//!   1. Spawn: the counter increments; once it exceeds the threshold and
//!      the queue is below capacity, one customer arrives and the counter
//!      resets.
//!   2. Decay: every customer (including one who just arrived) loses
//!      patience. Anyone at or below zero walks away; the engine turns
//!      each CustomerWalkedAway into exactly one reputation penalty.
//!
//! Serving is a player action, handled by `serve()`.

use crate::{
    error::SimResult,
    event::SimEvent,
    inventory::HoldingArea,
    rng::SubsystemRng,
    subsystem::{SimSubsystem, TickParams},
    types::{CustomerId, Filling, Tick},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id:           CustomerId,
    pub order:        Filling,
    pub patience:     f64,
    pub max_patience: f64,
    /// Cosmetic only.
    pub avatar_id:    u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ServeOutcome {
    /// The customer left the queue and one bun left the holding area.
    Served(Customer),
    UnknownCustomer,
    OutOfStock(Filling),
}

#[derive(Default)]
pub struct CustomerSubsystem {
    customers:     Vec<Customer>,
    spawn_counter: u32,
}

impl CustomerSubsystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    pub fn spawn_counter(&self) -> u32 {
        self.spawn_counter
    }

    /// Hand over one bun of the customer's order, if in stock.
    /// On any failure nothing changes.
    pub fn serve(&mut self, id: CustomerId, holding: &mut HoldingArea) -> ServeOutcome {
        let Some(pos) = self.customers.iter().position(|c| c.id == id) else {
            return ServeOutcome::UnknownCustomer;
        };
        let order = self.customers[pos].order;
        if !holding.remove(order) {
            return ServeOutcome::OutOfStock(order);
        }
        ServeOutcome::Served(self.customers.remove(pos))
    }

    fn try_spawn(
        &mut self,
        tick: Tick,
        params: &TickParams,
        rng: &mut SubsystemRng,
    ) -> Option<SimEvent> {
        self.spawn_counter += 1;
        if f64::from(self.spawn_counter) <= params.spawn_threshold
            || self.customers.len() >= params.max_customers
        {
            return None;
        }
        self.spawn_counter = 0;

        let customer = Customer {
            id:           rng.next_uuid(),
            order:        rng.pick(&params.order_pool),
            patience:     params.max_patience,
            max_patience: params.max_patience,
            avatar_id:    rng.next_u64_below(u64::from(params.avatar_count)) as u32,
        };
        log::debug!(
            "tick={tick} customer: {} arrived wanting {:?} ({}/{})",
            customer.id,
            customer.order,
            self.customers.len() + 1,
            params.max_customers
        );
        let event = SimEvent::CustomerArrived {
            tick,
            customer_id: customer.id,
            order:       customer.order,
            avatar_id:   customer.avatar_id,
        };
        self.customers.push(customer);
        Some(event)
    }

    fn decay(&mut self, tick: Tick, decay: f64) -> Vec<SimEvent> {
        let mut out = Vec::new();
        self.customers.retain_mut(|c| {
            c.patience -= decay;
            if c.patience <= 0.0 {
                log::debug!("tick={tick} customer: {} walked away", c.id);
                out.push(SimEvent::CustomerWalkedAway {
                    tick,
                    customer_id: c.id,
                    order:       c.order,
                });
                false
            } else {
                true
            }
        });
        out
    }
}

impl SimSubsystem for CustomerSubsystem {
    fn name(&self) -> &'static str {
        "customer"
    }

    fn update(
        &mut self,
        tick: Tick,
        params: &TickParams,
        rng: &mut SubsystemRng,
    ) -> SimResult<Vec<SimEvent>> {
        let mut out = Vec::new();
        out.extend(self.try_spawn(tick, params, rng));
        out.extend(self.decay(tick, params.patience_decay));
        Ok(out)
    }

    fn reset_for_day(&mut self) {
        self.customers.clear();
        self.spawn_counter = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{RngBank, SubsystemSlot};

    fn params() -> TickParams {
        TickParams {
            cook_step:       0.6,
            burn_step:       0.2,
            spawn_threshold: 200.0,
            max_customers:   4,
            patience_decay:  0.1 / 1.2,
            max_patience:    100.0,
            avatar_count:    5,
            order_pool:      vec![Filling::RedBean, Filling::Custard],
        }
    }

    fn run(sub: &mut CustomerSubsystem, params: &TickParams, from: Tick, n: u64) -> Vec<SimEvent> {
        let bank = RngBank::new(42);
        let mut events = Vec::new();
        for tick in from..from + n {
            let mut rng = bank.for_subsystem(SubsystemSlot::Customer, tick);
            events.extend(sub.update(tick, params, &mut rng).unwrap());
        }
        events
    }

    #[test]
    fn first_customer_arrives_after_threshold() {
        let mut sub = CustomerSubsystem::new();
        let p = params();
        assert!(run(&mut sub, &p, 1, 200).is_empty());
        let events = run(&mut sub, &p, 201, 1);
        assert!(matches!(events.as_slice(), [SimEvent::CustomerArrived { .. }]));
        assert_eq!(sub.spawn_counter(), 0);

        let c = &sub.customers()[0];
        assert!(p.order_pool.contains(&c.order));
        assert!(c.avatar_id < 5);
        assert_eq!(c.max_patience, 100.0);
        // Decay already applied on the arrival tick.
        assert!(c.patience < c.max_patience);
    }

    #[test]
    fn rush_threshold_halves_the_wait() {
        let mut sub = CustomerSubsystem::new();
        let p = TickParams { spawn_threshold: 100.0, ..params() };
        let events = run(&mut sub, &p, 1, 101);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn queue_respects_capacity() {
        let mut sub = CustomerSubsystem::new();
        let p = TickParams { spawn_threshold: 0.0, max_customers: 2, patience_decay: 0.0001, ..params() };
        run(&mut sub, &p, 1, 50);
        assert_eq!(sub.customers().len(), 2);
        // Counter keeps growing while the queue is full.
        assert_eq!(sub.spawn_counter(), 48);
    }

    #[test]
    fn patience_runs_out_after_1200_ticks() {
        let mut sub = CustomerSubsystem::new();
        let p = TickParams { max_customers: 1, ..params() };
        let events = run(&mut sub, &p, 1, 201);
        assert_eq!(events.len(), 1);

        let mut last = sub.customers()[0].patience;
        let mut left = Vec::new();
        for tick in 202..202 + 1300 {
            left = run(&mut sub, &p, tick, 1);
            if let Some(c) = sub.customers().first() {
                assert!(c.patience <= last && c.patience > 0.0);
                last = c.patience;
            } else {
                break;
            }
        }
        assert!(matches!(left.as_slice(), [SimEvent::CustomerWalkedAway { .. }]));
        assert!(sub.customers().is_empty());
    }

    #[test]
    fn serve_consumes_stock_and_removes_customer() {
        let mut sub = CustomerSubsystem::new();
        let p = TickParams { spawn_threshold: 0.0, max_customers: 1, ..params() };
        run(&mut sub, &p, 1, 1);
        let customer = sub.customers()[0].clone();

        let mut holding = HoldingArea::new();
        assert_eq!(sub.serve(customer.id, &mut holding), ServeOutcome::OutOfStock(customer.order));
        assert_eq!(sub.customers().len(), 1);

        holding.add(customer.order);
        assert_eq!(sub.serve(customer.id, &mut holding), ServeOutcome::Served(customer.clone()));
        assert!(sub.customers().is_empty());
        assert!(holding.is_empty());

        assert_eq!(sub.serve(customer.id, &mut holding), ServeOutcome::UnknownCustomer);
    }

    #[test]
    fn reset_clears_queue_and_counter() {
        let mut sub = CustomerSubsystem::new();
        let p = TickParams { spawn_threshold: 0.0, ..params() };
        run(&mut sub, &p, 1, 3);
        sub.reset_for_day();
        assert!(sub.customers().is_empty());
        assert_eq!(sub.spawn_counter(), 0);
    }
}
