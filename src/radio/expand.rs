use std::collections::HashSet;

use rand::Rng;

use crate::{
    Result,
    spotify::{MusicProvider, RECOMMENDATION_LIMIT},
    types::{RecommendationSeed, TrackId},
};

/// Track ids already queued (or rejected) during one radio operation.
#[derive(Debug, Clone, Default)]
pub struct SeenTracks(HashSet<TrackId>);

impl SeenTracks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains(id)
    }

    /// Returns true when the id was not seen before.
    pub fn insert(&mut self, id: TrackId) -> bool {
        self.0.insert(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<TrackId> for SeenTracks {
    fn from_iter<I: IntoIterator<Item = TrackId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<TrackId> for SeenTracks {
    fn extend<I: IntoIterator<Item = TrackId>>(&mut self, iter: I) {
        self.0.extend(iter)
    }
}

/// Result of one recommendation call.
#[derive(Debug, Clone, Default)]
pub struct Expansion {
    /// Every recommended id in provider order. Reseeding draws from this.
    pub candidates: Vec<TrackId>,
    /// The candidates that were not in the seen set, in provider order.
    pub fresh: Vec<TrackId>,
}

/// Requests up to `limit` recommendations for `seed` and keeps the ones not
/// yet in `seen`, adding them to it.
///
/// A provider failure is returned as is; nothing is retried here.
pub async fn expand<P: MusicProvider>(
    provider: &P,
    seed: &RecommendationSeed,
    limit: usize,
    seen: &mut SeenTracks,
) -> Result<Expansion> {
    let tracks = provider
        .recommendations(seed, limit.clamp(1, RECOMMENDATION_LIMIT))
        .await?;

    let candidates: Vec<TrackId> = tracks.into_iter().filter_map(|t| t.id).collect();
    let fresh = candidates
        .iter()
        .filter(|id| seen.insert((*id).clone()))
        .cloned()
        .collect();

    Ok(Expansion { candidates, fresh })
}

/// Picks the seed of the next top-up round: one track drawn uniformly from
/// the previous round's candidates, skipping the first and last one.
///
/// Lists too short to have an interior fall back to any element.
pub fn reseed<R: Rng>(rng: &mut R, candidates: &[TrackId]) -> Option<RecommendationSeed> {
    let index = match candidates.len() {
        0 => return None,
        len @ 1..=2 => rng.random_range(0..len),
        len => rng.random_range(1..len - 1),
    };
    Some(RecommendationSeed::from_track(candidates[index].clone()))
}
