//! Deterministic randomness for reproducible dealing.
//!
//! [`SimplePrng`] is a compact stream generator backed by domain-separated
//! BLAKE2b-256 expansions: every 32-byte output block is the keyed hash of the
//! seed and an invocation counter.  It implements [`rand::RngCore`], so it can
//! stand in for `OsRng` wherever a dealer must be replayable, such as
//! homomorphism checks that deal two secrets from the same stream.

use blake2::digest::{consts::U32, Digest};
use rand::{CryptoRng, RngCore, SeedableRng};

type Blake2b256 = blake2::Blake2b<U32>;

const PRNG_DOMAIN: &[u8] = b"ISN_SHARING_PRNG";

/// A deterministic stream generator derived from BLAKE2b-256.
///
/// Seeding from a `u64` is meant for tests and reproducible demos; dealers
/// handling real secrets should seed from 32 bytes of OS entropy or use
/// `rand::rngs::OsRng` directly.
#[derive(Debug, Clone)]
pub struct SimplePrng {
    seed: [u8; 32],
    counter: u64,
    buffer: [u8; 32],
    offset: usize,
}

impl SimplePrng {
    /// Creates a new PRNG seeded with `seed`.
    pub fn new(seed: u64) -> Self {
        let mut hasher = Blake2b256::new();
        hasher.update(PRNG_DOMAIN);
        hasher.update(seed.to_be_bytes());
        let mut base = [0u8; 32];
        base.copy_from_slice(&hasher.finalize());
        Self::from_seed_bytes(base)
    }

    /// Creates a PRNG from a raw 32-byte seed.
    pub fn from_seed_bytes(seed: [u8; 32]) -> Self {
        Self {
            seed,
            counter: 0,
            buffer: [0u8; 32],
            offset: 32,
        }
    }

    fn refill(&mut self) {
        let mut hasher = Blake2b256::new();
        hasher.update(PRNG_DOMAIN);
        hasher.update(self.seed);
        hasher.update(self.counter.to_be_bytes());
        self.buffer.copy_from_slice(&hasher.finalize());
        self.counter = self.counter.wrapping_add(1);
        self.offset = 0;
    }
}

impl RngCore for SimplePrng {
    fn next_u32(&mut self) -> u32 {
        let mut chunk = [0u8; 4];
        self.fill_bytes(&mut chunk);
        u32::from_be_bytes(chunk)
    }

    fn next_u64(&mut self) -> u64 {
        let mut chunk = [0u8; 8];
        self.fill_bytes(&mut chunk);
        u64::from_be_bytes(chunk)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        let mut written = 0;
        while written < dest.len() {
            if self.offset >= self.buffer.len() {
                self.refill();
            }
            let take = (self.buffer.len() - self.offset).min(dest.len() - written);
            dest[written..written + take]
                .copy_from_slice(&self.buffer[self.offset..self.offset + take]);
            self.offset += take;
            written += take;
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for SimplePrng {
    type Seed = [u8; 32];

    fn from_seed(seed: [u8; 32]) -> Self {
        Self::from_seed_bytes(seed)
    }

    fn seed_from_u64(state: u64) -> Self {
        Self::new(state)
    }
}

impl CryptoRng for SimplePrng {}

/// Randomness source that fails once a fixed byte budget is spent.
#[cfg(test)]
#[derive(Debug)]
pub(crate) struct ExhaustedRng {
    remaining: usize,
}

#[cfg(test)]
impl ExhaustedRng {
    pub(crate) fn new(budget: usize) -> Self {
        Self { remaining: budget }
    }
}

#[cfg(test)]
impl RngCore for ExhaustedRng {
    fn next_u32(&mut self) -> u32 {
        self.next_u64() as u32
    }

    fn next_u64(&mut self) -> u64 {
        let mut chunk = [0u8; 8];
        self.fill_bytes(&mut chunk);
        u64::from_le_bytes(chunk)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.try_fill_bytes(dest).expect("randomness budget exhausted");
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        if dest.len() > self.remaining {
            self.remaining = 0;
            return Err(rand::Error::new(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "randomness budget exhausted",
            )));
        }
        self.remaining -= dest.len();
        dest.fill(0x5a);
        Ok(())
    }
}
