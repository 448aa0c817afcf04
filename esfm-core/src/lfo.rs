//! Chip-global LFOs and timers: tremolo and vibrato counters, the
//! envelope rate-subdivision timer, the free-running global timer, and the
//! noise LFSR. Advanced once per sample, after every channel has been
//! processed.
//!
//! The noise LFSR is a per-chip resource, not a per-slot one, so it is
//! clocked here exactly once per sample rather than once per slot;
//! rhythm-mode phase generators read its value before this module's
//! `clock` advances it for the next sample.

use bincode::{Decode, Encode};

const EG_TIMER_MASK: u64 = (1 << 36) - 1;

#[derive(Debug, Clone, Encode, Decode)]
pub struct GlobalTimers {
    pub tremolo: u8,
    tremolo_pos: u16,
    pub vibrato_pos: u8,
    pub global_timer: u16,
    eg_timer: u64,
    pub eg_clocks: u8,
    pub eg_tick: bool,
    pub eg_timer_overflowed: bool,
    pub lfsr: u32,
}

impl GlobalTimers {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tremolo: 0,
            tremolo_pos: 0,
            vibrato_pos: 0,
            global_timer: 0,
            eg_timer: 0,
            eg_clocks: 1,
            eg_tick: false,
            eg_timer_overflowed: false,
            lfsr: 1,
        }
    }

    /// Advances all global oscillators by one sample.
    pub fn clock(&mut self) {
        if self.global_timer & 0x3f == 0x3f {
            self.tremolo_pos = (self.tremolo_pos + 1) % 210;
            self.tremolo = if self.tremolo_pos < 105 {
                self.tremolo_pos as u8
            } else {
                (210 - self.tremolo_pos) as u8
            };
        }
        if self.global_timer & 0x3ff == 0x3ff {
            self.vibrato_pos = (self.vibrato_pos + 1) & 7;
        }
        self.global_timer = (self.global_timer + 1) & 0x3ff;

        let ctz = self.eg_timer.trailing_zeros() + 1;
        self.eg_clocks = if ctz <= 13 { ctz as u8 } else { 0 };

        if self.eg_tick {
            if self.eg_timer == EG_TIMER_MASK {
                self.eg_timer = 0;
                self.eg_timer_overflowed = true;
            } else {
                self.eg_timer += 1;
            }
        }

        self.eg_tick = !self.eg_tick;

        self.advance_lfsr();
    }

    fn advance_lfsr(&mut self) {
        let n = ((self.lfsr >> 14) ^ self.lfsr) & 1;
        self.lfsr = (self.lfsr >> 1) | (n << 22);
        debug_assert_ne!(self.lfsr, 0, "LFSR must never reach the all-zero state");
    }
}

impl Default for GlobalTimers {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lfsr_never_becomes_zero() {
        let mut timers = GlobalTimers::new();
        for _ in 0..200_000 {
            timers.clock();
            assert_ne!(timers.lfsr, 0);
        }
    }

    #[test]
    fn global_timer_wraps_at_1024() {
        let mut timers = GlobalTimers::new();
        for _ in 0..1024 {
            timers.clock();
        }
        assert_eq!(timers.global_timer, 0);
    }

    #[test]
    fn tremolo_is_triangular_and_bounded() {
        let mut timers = GlobalTimers::new();
        for _ in 0..(64 * 210 * 2) {
            timers.clock();
            assert!(timers.tremolo <= 105);
        }
    }

    #[test]
    fn eg_tick_toggles_every_sample() {
        let mut timers = GlobalTimers::new();
        let mut last = timers.eg_tick;
        for _ in 0..10 {
            timers.clock();
            assert_ne!(timers.eg_tick, last);
            last = timers.eg_tick;
        }
    }
}
