//! A freshly initialized chip with no register writes stays silent.

use esfm_core::Chip;

#[test]
fn idle_chip_emits_a_thousand_silent_samples() {
    let mut chip = Chip::new();
    for _ in 0..1000 {
        assert_eq!(chip.generate_sample(), (0, 0));
    }
}
