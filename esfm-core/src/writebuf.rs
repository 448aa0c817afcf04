//! Optional delayed-write queue: an additive accelerator for
//! sample-accurate playback. The bare synthesis core does not require it;
//! callers that don't use it never pay for it beyond an empty `VecDeque`.

use bincode::{Decode, Encode};
use std::collections::VecDeque;

const WRITE_DELAY_SAMPLES: u64 = 2;

#[derive(Debug, Clone, Copy, Encode, Decode)]
struct QueuedWrite {
    ready_at: u64,
    address: u16,
    data: u8,
}

#[derive(Debug, Clone, Encode, Decode)]
pub struct WriteBuffer {
    queue: VecDeque<QueuedWrite>,
    sample_count: u64,
}

impl WriteBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            sample_count: 0,
        }
    }

    /// Schedules a register write to take effect `WRITE_DELAY_SAMPLES`
    /// samples from now.
    pub fn push(&mut self, address: u16, data: u8) {
        self.queue.push_back(QueuedWrite {
            ready_at: self.sample_count + WRITE_DELAY_SAMPLES,
            address,
            data,
        });
    }

    /// Call once per sample, before synthesis: pops and returns every write
    /// whose delay has elapsed, then advances the internal sample count.
    pub fn drain_ready(&mut self) -> Vec<(u16, u8)> {
        let mut ready = Vec::new();
        while let Some(front) = self.queue.front() {
            if front.ready_at > self.sample_count {
                break;
            }
            let entry = self.queue.pop_front().expect("front was just checked");
            ready.push((entry.address, entry.data));
        }
        self.sample_count += 1;
        ready
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl Default for WriteBuffer {
    fn default() -> Self {
        Self::new()
    }
}
