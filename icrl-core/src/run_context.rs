//! Per-run execution settings.
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Where numeric work is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    /// Host CPU.
    Cpu,
}

impl Default for Device {
    fn default() -> Self {
        Self::Cpu
    }
}

/// Seed and device of an evaluation run.
///
/// Created once per run and handed to everything that needs randomness,
/// so that no random state is shared implicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    seed: u64,
    device: Device,
}

impl RunContext {
    /// Constructs [`RunContext`]. A negative seed is replaced with 0.
    pub fn new(seed: i64, device: Device) -> Self {
        let seed = if seed < 0 { 0 } else { seed as u64 };
        Self { seed, device }
    }

    /// The base seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// The device.
    pub fn device(&self) -> Device {
        self.device
    }

    /// Returns a random number generator for the given stream.
    ///
    /// Generators of different streams are independent, the same stream always
    /// yields the same sequence.
    pub fn rng(&self, stream: u64) -> StdRng {
        StdRng::seed_from_u64(
            self.seed
                .wrapping_mul(0x9E37_79B9_7F4A_7C15)
                .wrapping_add(stream),
        )
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new(0, Device::Cpu)
    }
}
