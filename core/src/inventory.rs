//! The holding area: cooked buns waiting to be sold.
//!
//! One stack per filling type, in first-harvest order. Empty stacks are
//! pruned, so every stored stack has `count > 0`.

use crate::types::Filling;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stack {
    #[serde(rename = "type")]
    pub filling: Filling,
    pub count:   u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldingArea {
    stacks: Vec<Stack>,
}

impl HoldingArea {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, filling: Filling) {
        assert_ne!(filling, Filling::None, "cannot stock an unfilled bun");
        match self.stacks.iter_mut().find(|s| s.filling == filling) {
            Some(stack) => stack.count += 1,
            None => self.stacks.push(Stack { filling, count: 1 }),
        }
    }

    /// Take one bun of `filling`. Returns false (and changes nothing)
    /// when there is none in stock.
    pub fn remove(&mut self, filling: Filling) -> bool {
        let Some(pos) = self.stacks.iter().position(|s| s.filling == filling) else {
            return false;
        };
        let stack = &mut self.stacks[pos];
        debug_assert!(stack.count > 0, "empty stack left in holding area");
        if stack.count == 0 {
            return false;
        }
        stack.count -= 1;
        if stack.count == 0 {
            self.stacks.remove(pos);
        }
        true
    }

    pub fn count(&self, filling: Filling) -> u32 {
        self.stacks
            .iter()
            .find(|s| s.filling == filling)
            .map_or(0, |s| s.count)
    }

    pub fn total(&self) -> u32 {
        self.stacks.iter().map(|s| s.count).sum()
    }

    pub fn stacks(&self) -> &[Stack] {
        &self.stacks
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }
}
