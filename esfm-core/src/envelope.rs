//! Per-slot envelope generator: a four-state machine that advances a
//! 9-bit attenuation counter once per sample, gated by an optional
//! pre-attack delay.

use crate::num::GetBit;
use crate::tables::KSL_ROM;
use bincode::{Decode, Encode};

const EG_SILENT_THRESHOLD: u16 = 0x1f8;
pub const EG_MAX_ATTENUATION: u16 = 0x1ff;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum EnvelopePhase {
    Attack,
    Decay,
    Sustain,
    Release,
}

/// The chip-wide timing signals the envelope generator is clocked with,
/// sampled fresh every call to [`EnvelopeGenerator::clock`].
#[derive(Debug, Clone, Copy)]
pub struct EnvelopeTiming {
    pub global_timer: u16,
    pub eg_tick: bool,
    pub eg_clocks: u8,
    pub tremolo: u8,
}

#[derive(Debug, Clone, Encode, Decode)]
pub struct EnvelopeGenerator {
    // Register state
    pub attack_rate: u8,
    pub decay_rate: u8,
    pub sustain_lvl: u8,
    pub release_rate: u8,
    pub t_level: u8,
    pub ksl: u8,
    pub ksr: bool,
    pub env_sustaining: bool,
    pub env_delay: u8,
    pub tremolo_en: bool,
    pub tremolo_deep: bool,

    // Internal state
    eg_position: u16,
    eg_ksl_offset: u16,
    eg_output: u16,
    keyscale: u8,
    state: EnvelopePhase,
    eg_delay_run: bool,
    eg_delay_counter: u16,
}

impl EnvelopeGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            attack_rate: 0,
            decay_rate: 0,
            sustain_lvl: 0,
            release_rate: 0,
            t_level: 0,
            ksl: 0,
            ksr: false,
            env_sustaining: false,
            env_delay: 0,
            tremolo_en: false,
            tremolo_deep: false,
            eg_position: EG_MAX_ATTENUATION,
            eg_ksl_offset: 0,
            eg_output: EG_MAX_ATTENUATION,
            keyscale: 0,
            state: EnvelopePhase::Release,
            eg_delay_run: false,
            eg_delay_counter: 0,
        }
    }

    #[must_use]
    pub fn eg_output(&self) -> u16 {
        self.eg_output
    }

    #[must_use]
    pub fn eg_position(&self) -> u16 {
        self.eg_position
    }

    #[must_use]
    pub fn state(&self) -> EnvelopePhase {
        self.state
    }

    /// Recomputes `keyscale` and `eg_ksl_offset` from `f_num`/`block`. Must
    /// be called whenever either register changes.
    pub fn update_pitch_derived(&mut self, f_num: u16, block: u8) {
        self.keyscale = (block << 1) | ((f_num >> 9) & 1) as u8;

        let raw = (i32::from(KSL_ROM[(f_num >> 6) as usize]) << 2) - (i32::from(8 - block) << 5);
        self.eg_ksl_offset = raw.max(0) as u16;
    }

    /// Advances the envelope generator by one sample. `key_on` is the
    /// slot's resolved key-on bit for this sample. Returns `true` if the
    /// phase generator should reset its accumulator to zero this sample.
    pub fn clock(&mut self, key_on: bool, ksl_shift: u8, timing: EnvelopeTiming) -> bool {
        // Step 1: effective attenuation for this sample's waveform lookup.
        let mut eg_output = self.eg_position
            + (u16::from(self.t_level) << 2)
            + (self.eg_ksl_offset >> ksl_shift);
        if self.tremolo_en {
            eg_output += u16::from(timing.tremolo) >> if self.tremolo_deep { 2 } else { 4 };
        }
        self.eg_output = eg_output & 0x3ff;

        // Step 2: select the target rate register, handling the optional
        // pre-attack delay while keyed on but still in Release.
        let (reg_rate, reset) = if key_on && self.state == EnvelopePhase::Release {
            if !self.eg_delay_run {
                self.eg_delay_run = true;
                self.eg_delay_counter = if self.env_delay != 0 { 0x100 } else { 0 };
            }
            if timing.global_timer.bit(self.env_delay) {
                self.eg_delay_counter = self.eg_delay_counter.saturating_sub(1);
            }
            if self.eg_delay_counter == 0 {
                self.eg_delay_run = false;
                (self.attack_rate, true)
            } else {
                (self.release_rate, false)
            }
        } else {
            let rate = match self.state {
                EnvelopePhase::Attack => self.attack_rate,
                EnvelopePhase::Decay => self.decay_rate,
                EnvelopePhase::Sustain => {
                    if self.env_sustaining {
                        0
                    } else {
                        self.release_rate
                    }
                }
                EnvelopePhase::Release => self.release_rate,
            };
            (rate, false)
        };

        // Step 3: compute the combined rate and split it.
        let rate = (self.keyscale >> if self.ksr { 0 } else { 2 }) as u16 + (u16::from(reg_rate) << 2);
        let rate_hi = (rate >> 2).min(0x0f);
        let rate_lo = rate & 3;
        let eg_shift = rate_hi + u16::from(timing.eg_clocks);

        // Step 4: per-sample step amount.
        let shift: u8 = if reg_rate == 0 {
            0
        } else if rate_hi < 12 {
            if timing.eg_tick {
                match eg_shift {
                    12 => 1,
                    13 => ((rate_lo >> 1) & 1) as u8,
                    14 => (rate_lo & 1) as u8,
                    _ => 0,
                }
            } else {
                0
            }
        } else {
            let base = (rate_hi & 3) + u16::from(crate::tables::EG_INCSTEP[rate_lo as usize][(timing.global_timer & 3) as usize]);
            let capped = if base >= 4 { 3 } else { base as u8 };
            if capped == 0 {
                u8::from(timing.eg_tick)
            } else {
                capped
            }
        };

        // Step 5: compute the increment and new eg_position.
        let mut eg_rout = self.eg_position;
        let mut eg_inc: u16 = 0;

        if reset && rate_hi == 0x0f {
            eg_rout = 0;
        }

        let env_off = (self.eg_position & EG_SILENT_THRESHOLD) == EG_SILENT_THRESHOLD;
        if self.state != EnvelopePhase::Attack && !reset && env_off {
            eg_rout = EG_MAX_ATTENUATION;
        }

        match self.state {
            EnvelopePhase::Attack => {
                if self.eg_position == 0 {
                    self.state = EnvelopePhase::Decay;
                } else if key_on && shift > 0 && rate_hi != 0x0f {
                    eg_inc = (EG_MAX_ATTENUATION ^ self.eg_position) >> (4 - shift);
                }
            }
            EnvelopePhase::Decay => {
                if (self.eg_position >> 4) == u16::from(self.sustain_lvl) {
                    self.state = EnvelopePhase::Sustain;
                } else if !env_off && !reset && shift > 0 {
                    eg_inc = 1 << (shift - 1);
                }
            }
            EnvelopePhase::Sustain | EnvelopePhase::Release => {
                if !env_off && !reset && shift > 0 {
                    eg_inc = 1 << (shift - 1);
                }
            }
        }

        self.eg_position = (eg_rout.wrapping_add(eg_inc)) & EG_MAX_ATTENUATION;

        // Step 6: state transitions.
        if reset {
            self.state = EnvelopePhase::Attack;
            log::trace!("envelope entering attack after pre-attack delay");
        }
        if !key_on {
            self.state = EnvelopePhase::Release;
            self.eg_delay_run = false;
        }

        reset
    }
}

impl Default for EnvelopeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timing(global_timer: u16, eg_tick: bool, eg_clocks: u8) -> EnvelopeTiming {
        EnvelopeTiming {
            global_timer,
            eg_tick,
            eg_clocks,
            tremolo: 0,
        }
    }

    #[test]
    fn init_state_is_release_at_max_attenuation() {
        let eg = EnvelopeGenerator::new();
        assert_eq!(eg.state(), EnvelopePhase::Release);
        assert_eq!(eg.eg_position(), EG_MAX_ATTENUATION);
    }

    #[test]
    fn instant_attack_reaches_zero_attenuation_immediately() {
        let mut eg = EnvelopeGenerator::new();
        eg.attack_rate = 0x0f;
        eg.env_delay = 0;
        let mut t = timing(0, true, 0);
        for i in 0..4 {
            t.global_timer = i;
            eg.clock(true, 0, t);
        }
        assert_eq!(eg.eg_position(), 0);
        assert_eq!(eg.state(), EnvelopePhase::Attack);
    }

    #[test]
    fn eg_position_stays_in_range() {
        let mut eg = EnvelopeGenerator::new();
        eg.attack_rate = 8;
        eg.decay_rate = 4;
        eg.sustain_lvl = 2;
        eg.release_rate = 3;
        let mut t = timing(0, false, 2);
        for i in 0..4000u16 {
            t.global_timer = i & 0x3ff;
            t.eg_tick = i % 2 == 0;
            eg.clock(i < 2000, 0, t);
            assert!(eg.eg_position() <= EG_MAX_ATTENUATION);
        }
    }

    #[test]
    fn key_off_forces_release() {
        let mut eg = EnvelopeGenerator::new();
        eg.attack_rate = 0x0f;
        eg.clock(true, 0, timing(0, true, 0));
        assert_eq!(eg.state(), EnvelopePhase::Attack);
        eg.clock(false, 0, timing(1, true, 0));
        assert_eq!(eg.state(), EnvelopePhase::Release);
    }
}
