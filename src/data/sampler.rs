// ============================================================
// Layer 4 — Random Batch Sampler
// ============================================================
// Draws one batch for a given split:
//
//   1. list all applications from the source
//   2. recompute the positional 80/20 split of that listing
//   3. pick batch_size names uniformly, WITH replacement
//   4. load each picked application in full (blocking reads)
//   5. stack them with the AppBatcher
//
// Nothing is cached or prefetched; every call re-reads the
// files it picked. Any load or validation error aborts.

use anyhow::Result;
use burn::prelude::*;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::data::batcher::{AppBatch, AppBatcher, BatchLimits};
use crate::data::splitter::{subset, Split};
use crate::domain::error::DataError;
use crate::domain::traits::AppSource;

pub struct BatchSampler<S: AppSource> {
    source: S,
    batch_size: usize,
    train_fraction: f64,
    limits: BatchLimits,
    rng: StdRng,
}

impl<S: AppSource> BatchSampler<S> {
    /// `seed` fixes the index stream; `None` seeds from OS entropy.
    pub fn new(
        source: S,
        batch_size: usize,
        train_fraction: f64,
        limits: BatchLimits,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            source,
            batch_size,
            train_fraction,
            limits,
            rng,
        }
    }

    /// Names of the applications picked for one batch of `split`.
    pub fn pick(&mut self, split: Split) -> Result<Vec<String>> {
        let listing = self.source.list()?;
        let pool = subset(&listing, split, self.train_fraction);
        if pool.is_empty() {
            return Err(DataError::EmptySplit {
                split: split.to_string(),
                total: listing.len(),
            }
            .into());
        }

        let picked = (0..self.batch_size)
            .map(|_| pool[self.rng.gen_range(0..pool.len())].clone())
            .collect();
        Ok(picked)
    }

    /// Sample, load and stack one batch on `device`.
    pub fn sample<B: Backend>(&mut self, split: Split, device: &B::Device) -> Result<AppBatch<B>> {
        let names = self.pick(split)?;
        let records = names
            .iter()
            .map(|name| self.source.load(name))
            .collect::<Result<Vec<_>>>()?;

        let batcher = AppBatcher::<B>::new(device.clone(), self.limits);
        Ok(batcher.batch(records)?)
    }
}
