//! The top-level chip aggregate: 18 channels, global oscillators, the
//! register-facing interfaces, and the sample mixer.

use crate::channel::Channel;
use crate::envelope::EnvelopeTiming;
use crate::lfo::GlobalTimers;
use crate::registers::{self, CONFIG_REGISTER, KEYON_REGISTER_BASE, KEYON_REGISTER_LAST,
    SLOT_REGISTER_BASE, SLOT_REGISTER_LAST, TEST_REGISTER, TIMER0_REGISTER, TIMER1_REGISTER,
    TIMER_CONTROL_REGISTER};
use crate::timer::Timer;
use crate::writebuf::WriteBuffer;
use bincode::{Decode, Encode};

/// Output sample rate of the emulated chip.
pub const SAMPLE_RATE_HZ: f64 = 49_716.0;

pub const CHANNEL_COUNT: usize = 18;

#[derive(Debug, Clone, Encode, Decode)]
pub struct Chip {
    pub channels: [Channel; CHANNEL_COUNT],
    timers: GlobalTimers,
    timer0: Timer,
    timer1: Timer,

    pub native_mode: bool,
    pub keyscale_mode: bool,
    pub emu_newmode: bool,
    pub distort: bool,
    pub attenuate: bool,
    pub mute: bool,
    pub eg_halt: bool,
    pub phase_stop_reset: bool,

    port_address_latch: u16,
    write_buffer: WriteBuffer,
}

impl Chip {
    /// Zeroes all fields and leaves every slot in the Release state at
    /// full attenuation, matching the hardware's power-on state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            channels: std::array::from_fn(|_| Channel::new()),
            timers: GlobalTimers::new(),
            timer0: Timer::new(),
            timer1: Timer::new(),
            native_mode: true,
            keyscale_mode: false,
            emu_newmode: false,
            distort: false,
            attenuate: false,
            mute: false,
            eg_halt: false,
            phase_stop_reset: false,
            port_address_latch: 0,
            write_buffer: WriteBuffer::new(),
        }
    }

    /// Latches a register write into the chip's state. Out-of-range
    /// addresses are silently ignored.
    pub fn write_register(&mut self, address: u16, data: u8) {
        match address {
            SLOT_REGISTER_BASE..=SLOT_REGISTER_LAST => {
                let (channel, slot, reg) = registers::decode_slot_address(address);
                if let Some(channel) = self.channels.get_mut(channel) {
                    registers::write_slot_register(&mut channel.slots[slot], reg, data);
                    log::trace!(
                        "slot register write: ch={channel_idx} slot={slot} reg={reg} data={data:#04x}",
                        channel_idx = address >> 5
                    );
                }
            }
            KEYON_REGISTER_BASE..=KEYON_REGISTER_LAST => self.write_keyon_register(address, data),
            TIMER0_REGISTER => {
                self.timer0.reload = data;
                log::trace!("timer0 reload={data}");
            }
            TIMER1_REGISTER => {
                self.timer1.reload = data;
                log::trace!("timer1 reload={data}");
            }
            TIMER_CONTROL_REGISTER => self.write_timer_control(data),
            CONFIG_REGISTER => {
                self.keyscale_mode = (data >> 6) & 1 != 0;
                log::trace!("config write: keyscale_mode={}", self.keyscale_mode);
            }
            TEST_REGISTER => {
                self.distort = (data >> 1) & 1 != 0;
                self.attenuate = (data >> 4) & 1 != 0;
                self.mute = (data >> 6) & 1 != 0;
                log::trace!(
                    "test register write: distort={} attenuate={} mute={}",
                    self.distort,
                    self.attenuate,
                    self.mute
                );
            }
            _ => {}
        }
    }

    /// Reads back a register. Out-of-range addresses read as 0.
    #[must_use]
    pub fn read_register(&self, address: u16) -> u8 {
        match address {
            SLOT_REGISTER_BASE..=SLOT_REGISTER_LAST => {
                let (channel, slot, reg) = registers::decode_slot_address(address);
                self.channels
                    .get(channel)
                    .map_or(0, |channel| registers::read_slot_register(&channel.slots[slot], reg))
            }
            KEYON_REGISTER_BASE..=KEYON_REGISTER_LAST => self.read_keyon_register(address),
            TIMER0_REGISTER => self.timer0.reload,
            TIMER1_REGISTER => self.timer1.reload,
            TIMER_CONTROL_REGISTER => {
                (u8::from(self.timer1.mask) << 6)
                    | (u8::from(self.timer0.mask) << 5)
                    | (u8::from(self.timer1.enabled) << 1)
                    | u8::from(self.timer0.enabled)
            }
            CONFIG_REGISTER => u8::from(self.keyscale_mode) << 6,
            TEST_REGISTER => {
                (u8::from(self.mute) << 6) | (u8::from(self.attenuate) << 4) | (u8::from(self.distort) << 1)
            }
            _ => 0,
        }
    }

    fn write_keyon_register(&mut self, address: u16, data: u8) {
        let key_on = data & 1 != 0;
        let op_enable = (data >> 1) & 1 != 0;

        if address < 0x250 {
            let channel_idx = (address - KEYON_REGISTER_BASE) as usize;
            if let Some(channel) = self.channels.get_mut(channel_idx) {
                channel.key_on = key_on;
                channel.op_enable = op_enable;
                log::trace!("key-on: ch={channel_idx} key_on={key_on} op_enable={op_enable}");
            }
        } else {
            let offset = address - 0x250;
            let channel_idx = 16 + (offset & 1) as usize;
            let second_half = (offset >> 1) & 1 != 0;
            if let Some(channel) = self.channels.get_mut(channel_idx) {
                if second_half {
                    channel.key_on_2 = key_on;
                    channel.op_enable_2 = op_enable;
                } else {
                    channel.key_on = key_on;
                    channel.op_enable = op_enable;
                }
                log::trace!(
                    "key-on (16/17): ch={channel_idx} half={second_half} key_on={key_on}"
                );
            }
        }
    }

    fn read_keyon_register(&self, address: u16) -> u8 {
        if address < 0x250 {
            let channel_idx = (address - KEYON_REGISTER_BASE) as usize;
            self.channels.get(channel_idx).map_or(0, |channel| {
                u8::from(channel.key_on) | (u8::from(channel.op_enable) << 1)
            })
        } else {
            let offset = address - 0x250;
            let channel_idx = 16 + (offset & 1) as usize;
            let second_half = (offset >> 1) & 1 != 0;
            self.channels.get(channel_idx).map_or(0, |channel| {
                if second_half {
                    u8::from(channel.key_on_2) | (u8::from(channel.op_enable_2) << 1)
                } else {
                    u8::from(channel.key_on) | (u8::from(channel.op_enable) << 1)
                }
            })
        }
    }

    fn write_timer_control(&mut self, data: u8) {
        let timer0_enabled = data & 1 != 0;
        let timer1_enabled = (data >> 1) & 1 != 0;
        if timer0_enabled && !self.timer0.enabled {
            self.timer0.reset_on_enable();
        }
        if timer1_enabled && !self.timer1.enabled {
            self.timer1.reset_on_enable();
        }
        self.timer0.enabled = timer0_enabled;
        self.timer1.enabled = timer1_enabled;
        self.timer0.mask = (data >> 5) & 1 != 0;
        self.timer1.mask = (data >> 6) & 1 != 0;
        if data & 0x80 != 0 {
            self.timer0.clear_overflow();
            self.timer1.clear_overflow();
        }
        log::trace!(
            "timer control write: t0_en={} t1_en={} t0_mask={} t1_mask={}",
            self.timer0.enabled,
            self.timer1.enabled,
            self.timer0.mask,
            self.timer1.mask
        );
    }

    /// Legacy 4-port interface. Even offsets select the address latch,
    /// odd offsets write through to the latched register.
    pub fn write_port(&mut self, offset: u8, data: u8) {
        if offset & 1 == 0 {
            self.port_address_latch = u16::from(data);
        } else {
            let address = self.port_address_latch;
            self.write_register(address, data);
        }
    }

    /// Even offsets return chip status; odd offsets read back the latched
    /// register.
    #[must_use]
    pub fn read_port(&self, offset: u8) -> u8 {
        if offset & 1 == 0 {
            (u8::from(self.timer0.asserts_irq() || self.timer1.asserts_irq()) << 7)
                | (u8::from(self.timer0.overflow_flag) << 6)
                | (u8::from(self.timer1.overflow_flag) << 5)
        } else {
            self.read_register(self.port_address_latch)
        }
    }

    /// Queues a register write to take effect after the fixed write-buffer
    /// delay instead of immediately. Optional accelerator; bare
    /// `generate_sample` callers never need this.
    pub fn queue_delayed_write(&mut self, address: u16, data: u8) {
        self.write_buffer.push(address, data);
    }

    /// Advances the chip by exactly one sample and returns the clipped
    /// stereo pair.
    pub fn generate_sample(&mut self) -> (i16, i16) {
        for (address, data) in self.write_buffer.drain_ready() {
            self.write_register(address, data);
        }

        let timing = EnvelopeTiming {
            global_timer: self.timers.global_timer,
            eg_tick: self.timers.eg_tick,
            eg_clocks: self.timers.eg_clocks,
            tremolo: self.timers.tremolo,
        };
        let vibrato_pos = self.timers.vibrato_pos;
        let lfsr = self.timers.lfsr;

        let mut sum = [0i32; 2];
        for (idx, channel) in self.channels.iter_mut().enumerate() {
            channel.process_sample(timing, vibrato_pos, lfsr, idx >= 16);
            sum[0] += i32::from(channel.output[0]);
            sum[1] += i32::from(channel.output[1]);
        }

        self.timer0.tick();
        self.timer1.tick();
        self.timers.clock();

        if self.mute {
            return (0, 0);
        }

        (clip_to_i16(sum[0]), clip_to_i16(sum[1]))
    }

    /// Convenience wrapper over [`Chip::generate_sample`] for `n`
    /// consecutive samples. `out` must hold at least `2 * n` elements,
    /// interleaved L/R; undersized buffers are caller error.
    pub fn generate_stream(&mut self, out: &mut [i16], n: usize) {
        for i in 0..n {
            let (l, r) = self.generate_sample();
            out[2 * i] = l;
            out[2 * i + 1] = r;
        }
    }
}

impl Default for Chip {
    fn default() -> Self {
        Self::new()
    }
}

fn clip_to_i16(value: i32) -> i16 {
    value.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_chip_is_silent() {
        let mut chip = Chip::new();
        for _ in 0..1000 {
            assert_eq!(chip.generate_sample(), (0, 0));
        }
    }

    #[test]
    fn slot_register_write_then_key_on_produces_sound() {
        let mut chip = Chip::new();
        chip.write_register(0x000, 0x01); // mult=1
        chip.write_register(0x001, 0x00); // ksl=0, t_level=0
        chip.write_register(0x002, 0xf0); // attack=0xf, decay=0
        chip.write_register(0x003, 0x00); // sustain_lvl=0, release=0
        chip.write_register(0x004, 0x20); // f_num low
        chip.write_register(0x005, 0x08); // block=2
        chip.write_register(0x006, 0x30); // out_en L/R
        chip.write_register(0x007, 0xe0); // output_level=7, waveform=0
        chip.write_register(0x240, 0x01); // key on channel 0

        let mut heard = false;
        for _ in 0..2048 {
            if chip.generate_sample() != (0, 0) {
                heard = true;
            }
        }
        assert!(heard);
    }

    #[test]
    fn mute_test_bit_forces_silence() {
        let mut chip = Chip::new();
        chip.write_register(0x000, 0x01);
        chip.write_register(0x002, 0xf0);
        chip.write_register(0x004, 0x20);
        chip.write_register(0x005, 0x08);
        chip.write_register(0x006, 0x30);
        chip.write_register(0x007, 0xe0);
        chip.write_register(0x240, 0x01);
        chip.write_register(TEST_REGISTER, 0x40);

        for _ in 0..512 {
            assert_eq!(chip.generate_sample(), (0, 0));
        }
    }

    #[test]
    fn register_read_back_round_trips_key_on() {
        let mut chip = Chip::new();
        chip.write_register(0x240, 0x03);
        assert_eq!(chip.read_register(0x240), 0x03);

        chip.write_register(0x251, 0x01);
        assert_eq!(chip.read_register(0x251), 0x01);
        assert_eq!(chip.channels[17].key_on, true);
    }

    #[test]
    fn write_buffer_delays_register_application() {
        let mut chip = Chip::new();
        chip.queue_delayed_write(0x240, 0x01);
        chip.generate_sample();
        assert!(!chip.channels[0].key_on);
        chip.generate_sample();
        assert!(!chip.channels[0].key_on);
        chip.generate_sample();
        assert!(chip.channels[0].key_on);
    }
}
