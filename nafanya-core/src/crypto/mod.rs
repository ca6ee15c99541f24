use rand::rngs::OsRng;
use rand_core::TryRngCore;

use crate::Error;

/// Source of uniformly distributed integers used for every "random" decision
/// the bot makes. Must be unpredictable to chat members.
pub trait RandomSource: Send + Sync {
    /// Uniform integer in `[0, bound)`. `bound` must be non-zero.
    fn below(&self, bound: u32) -> Result<u32, Error>;
}

/// Draws from the operating system's CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn below(&self, bound: u32) -> Result<u32, Error> {
        if bound == 0 {
            return Err(Error::Internal("random bound must be non-zero".to_string()));
        }
        // Rejection sampling keeps the draw unbiased for bounds that do not
        // divide 2^32.
        let zone = (u32::MAX / bound) * bound;
        let mut rng = OsRng;
        loop {
            let v = rng
                .try_next_u32()
                .map_err(|e| Error::Entropy(e.to_string()))?;
            if v < zone {
                return Ok(v % bound);
            }
        }
    }
}
