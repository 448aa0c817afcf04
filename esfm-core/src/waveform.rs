//! The eight waveform phase-to-amplitude functions: each maps a
//! 10-bit phase and a 10-bit envelope attenuation to a signed 12-bit sample
//! through the shared logsin/exp pipeline.

use crate::num::GetBit;
use crate::tables::{EXP_ROM, LOGSIN_ROM};

/// Mirrors a 9-bit half-phase into an 8-bit quarter-wave logsin index.
fn quarter_index(half_phase: u16) -> usize {
    if half_phase.bit(8) {
        (0xff - (half_phase & 0xff)) as usize
    } else {
        (half_phase & 0xff) as usize
    }
}

/// Per-waveform mapping from a 10-bit phase to a pre-envelope log-amplitude
/// component and a sign flag.
fn phase_to_logamp(wf: u8, phase: u16) -> (u16, bool) {
    match wf & 7 {
        0 => {
            // Full sine: mirror the quarter within each half, negate the
            // second half.
            let idx = quarter_index(phase & 0x1ff);
            (LOGSIN_ROM[idx], phase.bit(9))
        }
        1 => {
            // Half sine: second half is silent.
            if phase.bit(9) {
                (0x1000, false)
            } else {
                (LOGSIN_ROM[quarter_index(phase & 0x1ff)], false)
            }
        }
        2 => {
            // Absolute sine: same shape as full sine, always positive.
            (LOGSIN_ROM[quarter_index(phase & 0x1ff)], false)
        }
        3 => {
            // Quarter sine: second quarter of every half is silent.
            if phase.bit(8) {
                (0x1000, phase.bit(9))
            } else {
                (LOGSIN_ROM[(phase & 0xff) as usize], phase.bit(9))
            }
        }
        4 => {
            // Double-frequency sine, with the third quarter sign-flipped.
            let doubled = (phase << 1) & 0x3ff;
            let idx = quarter_index(doubled & 0x1ff);
            let mut sign = doubled.bit(9);
            if (phase & 0x300) == 0x200 {
                sign = !sign;
            }
            (LOGSIN_ROM[idx], sign)
        }
        5 => {
            // Absolute double-frequency sine.
            let doubled = (phase << 1) & 0x3ff;
            let idx = quarter_index(doubled & 0x1ff);
            (LOGSIN_ROM[idx], false)
        }
        6 => {
            // Square wave: constant (zero) log-amplitude, signed.
            (0, phase.bit(9))
        }
        7 => {
            // Logarithmic sawtooth.
            let idx = quarter_index(phase & 0x1ff) as u16;
            (idx * 8, phase.bit(9))
        }
        _ => unreachable!("waveform index masked to 3 bits"),
    }
}

/// Shared logsin+exp core: combines a pre-envelope log-amplitude with the
/// slot's effective attenuation and resolves it to a linear mantissa.
fn resolve_amplitude(logamp: u16, eg_output: u16) -> u16 {
    let l = (u32::from(logamp) + (u32::from(eg_output) << 2)).min(0x1fff) as u16;
    let shift = l >> 8;
    if shift >= 16 {
        return 0;
    }
    let mantissa = (u32::from(EXP_ROM[(l & 0xff) as usize]) | 0x400) << 1;
    (mantissa >> shift) as u16
}

/// Evaluates waveform `wf` (0..7) at `phase` (10-bit) under effective
/// attenuation `eg_output` (10-bit), returning a signed 12-bit sample.
#[must_use]
pub fn generate(wf: u8, phase: u16, eg_output: u16) -> i16 {
    let (logamp, sign) = phase_to_logamp(wf, phase & 0x3ff);
    let amplitude = resolve_amplitude(logamp, eg_output);
    let neg_mask: u16 = if sign { 0xffff } else { 0 };
    (amplitude ^ neg_mask).wrapping_sub(neg_mask) as i16
}
