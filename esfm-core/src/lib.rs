//! Sample-accurate synthesis core for the ESS ESFM sound chip: 18 channels
//! of 4-operator FM with a fixed modulation chain, ADSR envelopes, and a
//! rhythm-mode noise path. No host I/O; callers drive [`Chip`] with register
//! writes and pull stereo samples one at a time.

mod channel;
mod chip;
mod envelope;
mod lfo;
mod num;
mod phase;
mod registers;
mod slot;
mod tables;
mod timer;
mod waveform;
mod writebuf;

pub use channel::Channel;
pub use chip::{Chip, CHANNEL_COUNT, SAMPLE_RATE_HZ};
pub use envelope::{EnvelopeGenerator, EnvelopePhase, EnvelopeTiming};
pub use phase::{PhaseGenerator, RhythmMode};
pub use slot::Slot;
pub use timer::{Timer, TimerTickEffect};
pub use writebuf::WriteBuffer;
