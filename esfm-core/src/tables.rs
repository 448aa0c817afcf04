//! Constant ROM-equivalent lookup tables shared by the waveform and envelope
//! units. Values are derived from closed-form expressions rather than typed
//! in as literal dumps, built lazily from formulas at first use instead of
//! hand-transcribing ROM contents.

use std::sync::LazyLock;

/// Quarter-wave log-sine table: `logsin[i] = round(-log2(sin((i+0.5) * pi /
/// 512)) * 256)`, a 256-entry, 12-bit-valued table.
pub static LOGSIN_ROM: LazyLock<[u16; 256]> = LazyLock::new(|| {
    std::array::from_fn(|i| {
        let angle = (i as f64 + 0.5) * std::f64::consts::PI / 512.0;
        let value = (-(angle.sin().log2()) * 256.0).round();
        value as u16
    })
});

/// Exponent mantissa table: `exp[i] = round(2^((255-i)/256) * 1024) - 1024`,
/// a 256-entry, 10-bit-valued table used as `exprom[L & 0xff] | 0x400`.
pub static EXP_ROM: LazyLock<[u16; 256]> = LazyLock::new(|| {
    std::array::from_fn(|i| {
        let value = (2f64.powf((255 - i) as f64 / 256.0) * 1024.0).round() - 1024.0;
        value as u16
    })
});

/// Frequency multiplier table, doubled (the caller applies a final `>> 1`).
pub const FREQ_MULT: [u8; 16] = [
    1, 2, 4, 6, 8, 10, 12, 14, 16, 18, 20, 20, 24, 24, 30, 30,
];

/// KSL (keyscale level) attenuation ROM, indexed by the top 4 bits of
/// `f_num`.
pub const KSL_ROM: [u8; 16] = [
    0, 32, 40, 45, 48, 51, 53, 55, 56, 58, 59, 60, 61, 62, 63, 64,
];

/// KSL right-shift amount, indexed by the 2-bit `ksl` field.
pub const KSL_SHIFT: [u8; 4] = [8, 1, 2, 0];

/// Envelope rate increment-step table for `rate_hi >= 12`, indexed by
/// `[rate_lo][global_timer & 3]`.
pub const EG_INCSTEP: [[u8; 4]; 4] = [
    [0, 1, 0, 1],
    [0, 1, 1, 1],
    [1, 1, 0, 1],
    [1, 1, 1, 1],
];
