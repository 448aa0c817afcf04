//! One of 18 channels: drives its four slots in order each sample,
//! computing slot 0's feedback from the previous sample's output first so
//! that every slot in the chain sees a freshly produced modulator value.

use crate::envelope::EnvelopeTiming;
use crate::slot::Slot;
use crate::tables::KSL_SHIFT;
use bincode::{Decode, Encode};

#[derive(Debug, Clone, Encode, Decode)]
pub struct Channel {
    pub slots: [Slot; 4],
    pub key_on: bool,
    pub key_on_2: bool,
    /// 4-operator-enable flags, kept for OPL3-compatibility readback only;
    /// native mode always runs all four slots regardless of these.
    pub op_enable: bool,
    pub op_enable_2: bool,
    pub output: [i16; 2],
}

impl Channel {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| Slot::new()),
            key_on: false,
            key_on_2: false,
            op_enable: false,
            op_enable_2: false,
            output: [0, 0],
        }
    }

    /// Advances all four slots by one sample and leaves the resulting
    /// stereo pair in `self.output`. `second_half_key_on` selects whether
    /// slots 2/3 resolve their key-on bit against `key_on_2` (channels 16
    /// and 17 only).
    pub fn process_sample(
        &mut self,
        timing: EnvelopeTiming,
        vibrato_pos: u8,
        lfsr: u32,
        second_half_key_on: bool,
    ) {
        self.output = [0, 0];

        let feedback = self.slots[0].output().wrapping_add(self.slots[0].prev_output()) >> 2;
        self.slots[0].set_prev_output(self.slots[0].output());
        self.slots[0].feedback_buf = feedback;

        let mut mod_input = self.slots[0].feedback_buf;
        for i in 0..4 {
            let key_on = if second_half_key_on && i >= 2 {
                self.key_on_2
            } else {
                self.key_on
            };
            let ksl_shift = KSL_SHIFT[self.slots[i].envelope.ksl as usize];
            let sibling_phase_out = if i == 3 {
                self.slots[2].phase.phase_out()
            } else {
                0
            };

            self.slots[i].clock(key_on, ksl_shift, timing, vibrato_pos, sibling_phase_out, lfsr, mod_input);

            if let Some((l, r)) = self.slots[i].bus_contribution() {
                self.output[0] = self.output[0].wrapping_add(l);
                self.output[1] = self.output[1].wrapping_add(r);
            }

            mod_input = self.slots[i].output();
        }
    }
}

impl Default for Channel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timing() -> EnvelopeTiming {
        EnvelopeTiming {
            global_timer: 0,
            eg_tick: true,
            eg_clocks: 1,
            tremolo: 0,
        }
    }

    #[test]
    fn idle_channel_stays_silent() {
        let mut channel = Channel::new();
        for _ in 0..1000 {
            channel.process_sample(timing(), 0, 1, false);
            assert_eq!(channel.output, [0, 0]);
        }
    }

    #[test]
    fn keyed_on_carrier_produces_output() {
        let mut channel = Channel::new();
        channel.slots[0].phase.f_num = 0x200;
        channel.slots[0].phase.block = 4;
        channel.slots[0].output_level = 7;
        channel.slots[0].envelope.attack_rate = 0x0f;
        channel.slots[0].envelope.release_rate = 8;
        channel.key_on = true;

        let mut heard_sound = false;
        for _ in 0..512 {
            channel.process_sample(timing(), 0, 1, false);
            if channel.output != [0, 0] {
                heard_sound = true;
            }
        }
        assert!(heard_sound);
    }
}
