//! Rhythm-mode hi-hat noise (channel 7 slot 3, `rhy_noise = 2`) must be
//! aperiodic: no lag's autocorrelation should come close to matching the
//! signal's own energy.

use esfm_core::Chip;

fn render_hihat() -> Vec<f64> {
    let mut chip = Chip::new();
    chip.write_register(0x0f8, 0x01); // mult=1
    chip.write_register(0x0f9, 0x00);
    chip.write_register(0x0fa, 0xf0); // attack=0xf, decay=0
    chip.write_register(0x0fb, 0x08); // sustain_lvl=0, release=8
    chip.write_register(0x0fc, 0x20); // f_num low byte of 0x120
    chip.write_register(0x0fd, 0x11); // block=4, f_num high bits=1
    chip.write_register(0x0fe, 0x30); // out_en L=R=1
    chip.write_register(0x0ff, 0xf0); // output_level=7, rhy_noise=HiHat
    chip.write_register(0x247, 0x01); // key on channel 7

    let mut out = vec![0i16; 2 * 4096];
    chip.generate_stream(&mut out, 4096);
    out.into_iter().step_by(2).map(f64::from).collect()
}

fn autocorrelation(samples: &[f64], lag: usize) -> f64 {
    samples[..samples.len() - lag]
        .iter()
        .zip(&samples[lag..])
        .map(|(&a, &b)| a * b)
        .sum()
}

#[test]
fn hihat_output_is_aperiodic() {
    let samples = render_hihat();
    let energy = autocorrelation(&samples, 0);
    assert!(energy > 0.0, "hi-hat produced no signal energy");

    for lag in 1..200 {
        let correlation = autocorrelation(&samples, lag).abs();
        assert!(
            correlation < 0.5 * energy,
            "lag {lag} autocorrelation {correlation} too close to total energy {energy}"
        );
    }
}
