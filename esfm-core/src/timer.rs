//! The two legacy 8-bit reload timers exposed through registers
//! `0x402`-`0x404`, used by host software to drive IRQ-based timing
//! independent of the synthesis clock.

use bincode::{Decode, Encode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTickEffect {
    None,
    Overflowed,
}

#[derive(Debug, Clone, Encode, Decode)]
pub struct Timer {
    pub reload: u8,
    counter: u8,
    pub enabled: bool,
    pub mask: bool,
    pub overflow_flag: bool,
}

impl Timer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            reload: 0,
            counter: 0,
            enabled: false,
            mask: false,
            overflow_flag: false,
        }
    }

    pub fn tick(&mut self) -> TimerTickEffect {
        if !self.enabled {
            return TimerTickEffect::None;
        }

        let (next, overflowed) = self.counter.overflowing_add(1);
        if overflowed {
            self.counter = self.reload;
            self.overflow_flag = true;
            TimerTickEffect::Overflowed
        } else {
            self.counter = next;
            TimerTickEffect::None
        }
    }

    pub fn reset_on_enable(&mut self) {
        self.counter = self.reload;
    }

    pub fn clear_overflow(&mut self) {
        self.overflow_flag = false;
    }

    #[must_use]
    pub fn asserts_irq(&self) -> bool {
        self.overflow_flag && !self.mask
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
