//! Deterministic randomness: domain-separated streams derived from one seed.
//!
//! The bundle is the single seedable authority in the engine; every draw a
//! turn makes comes from one of these streams, so a fixed seed replays a
//! session exactly and tests never need real entropy.

use hmac::{Hmac, Mac};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use sha2::Sha256;
use std::cell::{RefCell, RefMut};

/// Bundle of RNG streams segregated by simulation domain.
#[derive(Debug, Clone)]
pub struct RngBundle {
    dice: RefCell<CountingRng<ChaCha20Rng>>,
    hazard: RefCell<CountingRng<ChaCha20Rng>>,
    energy: RefCell<CountingRng<ChaCha20Rng>>,
    reward: RefCell<CountingRng<ChaCha20Rng>>,
    ambient: RefCell<CountingRng<ChaCha20Rng>>,
}

impl RngBundle {
    /// Construct the bundle from a user-visible seed.
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self {
            dice: RefCell::new(CountingRng::new(derive_stream_seed(seed, b"dice"))),
            hazard: RefCell::new(CountingRng::new(derive_stream_seed(seed, b"hazard"))),
            energy: RefCell::new(CountingRng::new(derive_stream_seed(seed, b"energy"))),
            reward: RefCell::new(CountingRng::new(derive_stream_seed(seed, b"reward"))),
            ambient: RefCell::new(CountingRng::new(derive_stream_seed(seed, b"ambient"))),
        }
    }

    /// Die-value draws.
    #[must_use]
    pub fn dice(&self) -> RefMut<'_, CountingRng<ChaCha20Rng>> {
        self.dice.borrow_mut()
    }

    /// Red-tile hazard trigger decisions.
    #[must_use]
    pub fn hazard(&self) -> RefMut<'_, CountingRng<ChaCha20Rng>> {
        self.hazard.borrow_mut()
    }

    /// The AI's coin-flip energy spend policy.
    #[must_use]
    pub fn energy(&self) -> RefMut<'_, CountingRng<ChaCha20Rng>> {
        self.energy.borrow_mut()
    }

    /// Green-tile secondary fact selection.
    #[must_use]
    pub fn reward(&self) -> RefMut<'_, CountingRng<ChaCha20Rng>> {
        self.reward.borrow_mut()
    }

    /// End-of-turn ambient pollution decay.
    #[must_use]
    pub fn ambient(&self) -> RefMut<'_, CountingRng<ChaCha20Rng>> {
        self.ambient.borrow_mut()
    }
}

/// Counting wrapper for RNG streams providing instrumentation.
#[derive(Debug, Clone)]
pub struct CountingRng<R> {
    rng: R,
    draws: u64,
}

impl CountingRng<ChaCha20Rng> {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            draws: 0,
        }
    }
}

impl<R: rand::RngCore> CountingRng<R> {
    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl<R: rand::RngCore> rand::RngCore for CountingRng<R> {
    fn next_u32(&mut self) -> u32 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.draws = self.draws.saturating_add(1);
        self.rng.fill_bytes(dest);
    }
}

fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let mut mac = Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes())
        .expect("64-bit seed is valid key");
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let seed_bytes: [u8; 8] = digest[..8].try_into().expect("digest slice length");
    u64::from_le_bytes(seed_bytes)
}
