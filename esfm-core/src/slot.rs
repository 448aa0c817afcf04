//! A single operator: couples an envelope generator, a phase
//! generator, and the waveform lookup, and tracks the raw output history
//! the channel processor needs for feedback and inter-slot modulation.

use crate::envelope::{EnvelopeGenerator, EnvelopeTiming};
use crate::phase::PhaseGenerator;
use crate::waveform;
use bincode::{Decode, Encode};

#[derive(Debug, Clone, Encode, Decode)]
pub struct Slot {
    pub envelope: EnvelopeGenerator,
    pub phase: PhaseGenerator,
    pub waveform: u8,
    pub mod_in_level: u8,
    pub output_level: u8,
    /// Per-channel L/R output gate, stored as a branch-free bool pair
    /// rather than the all-ones/all-zero bitmask the original hardware
    /// uses, since Rust has no need for the mask trick to stay branch-free.
    pub out_enable: [bool; 2],

    output: i16,
    prev_output: i16,
    pub feedback_buf: i16,
}

impl Slot {
    #[must_use]
    pub fn new() -> Self {
        Self {
            envelope: EnvelopeGenerator::new(),
            phase: PhaseGenerator::new(),
            waveform: 0,
            mod_in_level: 0,
            output_level: 0,
            out_enable: [true, true],
            output: 0,
            prev_output: 0,
            feedback_buf: 0,
        }
    }

    #[must_use]
    pub fn output(&self) -> i16 {
        self.output
    }

    #[must_use]
    pub fn prev_output(&self) -> i16 {
        self.prev_output
    }

    pub fn set_prev_output(&mut self, value: i16) {
        self.prev_output = value;
    }

    /// Runs the envelope generator, then the phase generator, then the
    /// waveform lookup, storing the new raw (pre output-level) sample.
    /// `mod_input` is this slot's modulator input: the previous slot's raw
    /// output, or this slot's own `feedback_buf` for slot 0.
    pub fn clock(
        &mut self,
        key_on: bool,
        ksl_shift: u8,
        timing: EnvelopeTiming,
        vibrato_pos: u8,
        sibling_phase_out: u16,
        lfsr: u32,
        mod_input: i16,
    ) {
        let reset = self.envelope.clock(key_on, ksl_shift, timing);
        if reset {
            self.phase.request_reset();
        }
        self.phase.clock(vibrato_pos, sibling_phase_out, lfsr);

        let modulation = if self.mod_in_level != 0 {
            mod_input >> (7 - self.mod_in_level)
        } else {
            0
        };
        let phase_in = (self.phase.phase_out() as i16).wrapping_add(modulation) as u16 & 0x3ff;
        self.output = waveform::generate(self.waveform, phase_in, self.envelope.eg_output());
    }

    /// The slot's contribution to the channel's stereo bus this sample, or
    /// `None` if `output_level` is zero (silent).
    #[must_use]
    pub fn bus_contribution(&self) -> Option<(i16, i16)> {
        if self.output_level == 0 {
            return None;
        }
        let val = self.output >> (7 - self.output_level);
        let left = if self.out_enable[0] { val } else { 0 };
        let right = if self.out_enable[1] { val } else { 0 };
        Some((left, right))
    }
}

impl Default for Slot {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::EnvelopeTiming;

    fn timing() -> EnvelopeTiming {
        EnvelopeTiming {
            global_timer: 0,
            eg_tick: true,
            eg_clocks: 1,
            tremolo: 0,
        }
    }

    #[test]
    fn silent_slot_emits_no_bus_contribution() {
        let slot = Slot::new();
        assert!(slot.bus_contribution().is_none());
    }

    #[test]
    fn output_level_gates_and_disabled_channel_is_zero() {
        let mut slot = Slot::new();
        slot.output_level = 7;
        slot.out_enable = [true, false];
        slot.phase.f_num = 0x200;
        slot.phase.block = 4;
        slot.envelope.attack_rate = 0x0f;
        slot.envelope.release_rate = 8;
        for _ in 0..256 {
            slot.clock(true, 0, timing(), 0, 0, 1, 0);
        }
        let (l, r) = slot.bus_contribution().unwrap();
        assert_eq!(r, 0);
        let _ = l;
    }
}
