use rand::{SeedableRng, rngs::StdRng};

use crate::{management::PointerStore, spotify::MusicProvider};

/// Everything one radio or playback operation needs: the authenticated user,
/// the provider handle, the pointer record store and the random source.
///
/// Operations that read and then rewrite the pointer records borrow the
/// session mutably, so a process can never run two of them at the same time.
pub struct Session<P, S, R = StdRng> {
    pub user_id: String,
    pub provider: P,
    pub store: S,
    pub rng: R,
}

impl<P, S> Session<P, S, StdRng>
where
    P: MusicProvider,
    S: PointerStore,
{
    /// Session with an OS-seeded random source.
    pub fn new(user_id: impl Into<String>, provider: P, store: S) -> Self {
        Self::with_rng(user_id, provider, store, StdRng::from_os_rng())
    }

    /// Session whose sampling is reproducible for a given seed.
    pub fn seeded(user_id: impl Into<String>, provider: P, store: S, seed: u64) -> Self {
        Self::with_rng(user_id, provider, store, StdRng::seed_from_u64(seed))
    }
}

impl<P, S, R> Session<P, S, R> {
    pub fn with_rng(user_id: impl Into<String>, provider: P, store: S, rng: R) -> Self {
        Self {
            user_id: user_id.into(),
            provider,
            store,
            rng,
        }
    }
}
