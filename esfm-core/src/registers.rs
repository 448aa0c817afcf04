//! Register address decoding and field packing/unpacking for the native
//! register map. Pure bit-twiddling over a [`Slot`]; the chip-level
//! dispatch (address ranges, key-on, timers, config, test bits) lives in
//! `chip.rs` since it needs access to sibling channels and global state.

use crate::num::GetBit;
use crate::phase::RhythmMode;
use crate::slot::Slot;

pub const SLOT_REGISTER_BASE: u16 = 0x000;
pub const SLOT_REGISTER_LAST: u16 = 0x23f;
pub const KEYON_REGISTER_BASE: u16 = 0x240;
pub const KEYON_REGISTER_LAST: u16 = 0x253;
pub const TIMER0_REGISTER: u16 = 0x402;
pub const TIMER1_REGISTER: u16 = 0x403;
pub const TIMER_CONTROL_REGISTER: u16 = 0x404;
pub const CONFIG_REGISTER: u16 = 0x408;
pub const TEST_REGISTER: u16 = 0x501;

/// Splits a slot-range address into (channel, slot, register) indices.
#[must_use]
pub fn decode_slot_address(address: u16) -> (usize, usize, u8) {
    let channel = (address >> 5) as usize;
    let slot = ((address >> 3) & 3) as usize;
    let reg = (address & 7) as u8;
    (channel, slot, reg)
}

pub fn write_slot_register(slot: &mut Slot, reg: u8, data: u8) {
    match reg {
        0 => {
            slot.envelope.tremolo_en = data.bit(7);
            slot.phase.vibrato_en = data.bit(6);
            slot.envelope.env_sustaining = data.bit(5);
            slot.envelope.ksr = data.bit(4);
            slot.phase.mult = data & 0x0f;
        }
        1 => {
            slot.envelope.ksl = (data >> 6) & 3;
            slot.envelope.t_level = data & 0x3f;
        }
        2 => {
            slot.envelope.attack_rate = (data >> 4) & 0x0f;
            slot.envelope.decay_rate = data & 0x0f;
        }
        3 => {
            slot.envelope.sustain_lvl = (data >> 4) & 0x0f;
            slot.envelope.release_rate = data & 0x0f;
        }
        4 => {
            slot.phase.f_num = (slot.phase.f_num & 0x300) | u16::from(data);
            slot.envelope.update_pitch_derived(slot.phase.f_num, slot.phase.block);
        }
        5 => {
            slot.envelope.env_delay = (data >> 5) & 7;
            slot.phase.block = (data >> 2) & 7;
            slot.phase.f_num = (slot.phase.f_num & 0x0ff) | (u16::from(data & 3) << 8);
            slot.envelope.update_pitch_derived(slot.phase.f_num, slot.phase.block);
        }
        6 => {
            slot.envelope.tremolo_deep = data.bit(7);
            slot.phase.vibrato_deep = data.bit(6);
            slot.out_enable[0] = data.bit(5);
            slot.out_enable[1] = data.bit(4);
            slot.mod_in_level = (data >> 1) & 7;
        }
        7 => {
            slot.output_level = (data >> 5) & 7;
            slot.phase.rhy_noise = RhythmMode::from_bits((data >> 3) & 3);
            slot.waveform = data & 7;
        }
        _ => unreachable!("slot register index masked to 3 bits"),
    }
}

#[must_use]
pub fn read_slot_register(slot: &Slot, reg: u8) -> u8 {
    match reg {
        0 => {
            (u8::from(slot.envelope.tremolo_en) << 7)
                | (u8::from(slot.phase.vibrato_en) << 6)
                | (u8::from(slot.envelope.env_sustaining) << 5)
                | (u8::from(slot.envelope.ksr) << 4)
                | (slot.phase.mult & 0x0f)
        }
        1 => ((slot.envelope.ksl & 3) << 6) | (slot.envelope.t_level & 0x3f),
        2 => ((slot.envelope.attack_rate & 0x0f) << 4) | (slot.envelope.decay_rate & 0x0f),
        3 => ((slot.envelope.sustain_lvl & 0x0f) << 4) | (slot.envelope.release_rate & 0x0f),
        4 => (slot.phase.f_num & 0xff) as u8,
        5 => {
            ((slot.envelope.env_delay & 7) << 5)
                | ((slot.phase.block & 7) << 2)
                | ((slot.phase.f_num >> 8) & 3) as u8
        }
        6 => {
            (u8::from(slot.envelope.tremolo_deep) << 7)
                | (u8::from(slot.phase.vibrato_deep) << 6)
                | (u8::from(slot.out_enable[0]) << 5)
                | (u8::from(slot.out_enable[1]) << 4)
                | ((slot.mod_in_level & 7) << 1)
        }
        7 => {
            ((slot.output_level & 7) << 5) | (slot.phase.rhy_noise.to_bits() << 3) | (slot.waveform & 7)
        }
        _ => unreachable!("slot register index masked to 3 bits"),
    }
}
