//! Scenario archive reader.
//!
//! An [`Archive`] holds the raw container image and an immutable index built
//! from its table of contents when it is opened. Scenarios are deciphered and
//! decoded lazily on first access and cached for the lifetime of the handle.
//!
//! # Caching
//!
//! The cache is guarded by a single mutex. A lookup checks the cache, decodes
//! outside the lock on a miss, then checks again and inserts under the lock,
//! so concurrent callers (see [`Archive::prefetch`]) never block on each
//! other's decode work. Two threads racing on the same id may both decode it;
//! the first insert wins and both receive the cached value.

mod toc;
mod writer;

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rayon::prelude::*;
use tracing::{debug, info, trace};

use crate::cipher::CipherKey;
use crate::decode::decode_scenario;
use crate::element::ScenarioId;
use crate::error::{ArchiveError, Result};
use crate::scenario::Scenario;

pub use toc::ScenarioDescriptor;
pub use writer::ArchiveWriter;

/// Anything the execution engine can pull decoded scenarios from.
pub trait ScenarioSource {
    /// Decoded scenario for `id`.
    ///
    /// Fails with [`ArchiveError::UnknownScenario`] when the id is absent.
    fn scenario(&self, id: ScenarioId) -> Result<Arc<Scenario>>;

    /// Whether `id` can be loaded.
    fn contains(&self, id: ScenarioId) -> bool;
}

impl<S: ScenarioSource + ?Sized> ScenarioSource for Arc<S> {
    fn scenario(&self, id: ScenarioId) -> Result<Arc<Scenario>> {
        (**self).scenario(id)
    }

    fn contains(&self, id: ScenarioId) -> bool {
        (**self).contains(id)
    }
}

/// Handle to an opened scenario archive.
pub struct Archive {
    name: String,
    data: Vec<u8>,
    key: CipherKey,
    index: BTreeMap<ScenarioId, ScenarioDescriptor>,
    cache: Mutex<HashMap<ScenarioId, Arc<Scenario>>>,
}

impl std::fmt::Debug for Archive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archive")
            .field("name", &self.name)
            .field("bytes", &self.data.len())
            .field("scenarios", &self.index.len())
            .field("cached", &self.cached_count())
            .finish()
    }
}

impl Archive {
    /// Read an archive file and its table of contents.
    ///
    /// `None` for `key` opens the archive without a cipher.
    pub fn open(path: impl AsRef<Path>, key: Option<CipherKey>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| ArchiveError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(path.display().to_string(), data, key)
    }

    /// Build an archive from an in-memory image.
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>, key: Option<CipherKey>) -> Result<Self> {
        let name = name.into();
        let index = toc::read_index(&data)?;
        let key = key.unwrap_or_default();
        info!(
            archive = %name,
            scenarios = index.len(),
            bytes = data.len(),
            ciphered = !key.is_identity(),
            "opened archive"
        );
        Ok(Self {
            name,
            data,
            key,
            index,
            cache: Mutex::new(HashMap::new()),
        })
    }

    /// Name the archive was opened under (usually its path).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cipher key applied to scenario ranges.
    pub fn key(&self) -> &CipherKey {
        &self.key
    }

    /// Number of indexed scenarios.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the archive indexes no scenario.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Whether `id` is in the table of contents.
    pub fn contains(&self, id: ScenarioId) -> bool {
        self.index.contains_key(&id)
    }

    /// Byte range of `id`, if indexed.
    pub fn descriptor(&self, id: ScenarioId) -> Option<ScenarioDescriptor> {
        self.index.get(&id).copied()
    }

    /// Indexed scenarios in ascending id order.
    ///
    /// The index never changes after opening, so every call yields the same sequence.
    pub fn iterate(&self) -> impl Iterator<Item = (ScenarioId, ScenarioDescriptor)> + '_ {
        self.index.iter().map(|(id, descriptor)| (*id, *descriptor))
    }

    /// Decoded scenario for `id`, decoding and caching it on first access.
    pub fn scenario(&self, id: ScenarioId) -> Result<Arc<Scenario>> {
        let descriptor = self
            .index
            .get(&id)
            .ok_or(ArchiveError::UnknownScenario { id })?;

        if let Some(scenario) = self.lock_cache().get(&id) {
            trace!(%id, "scenario cache hit");
            return Ok(Arc::clone(scenario));
        }

        let blob = self.key.decrypt(&self.data[descriptor.range()]);
        let scenario = decode_scenario(id, &blob).map_err(|source| ArchiveError::Decode { id, source })?;
        debug!(%id, elements = scenario.len(), bytes = descriptor.length, "decoded scenario");

        let mut cache = self.lock_cache();
        let cached = cache.entry(id).or_insert_with(|| Arc::new(scenario));
        Ok(Arc::clone(cached))
    }

    /// Decode several scenarios in parallel and warm the cache.
    ///
    /// Returns every failure; successfully decoded scenarios stay cached.
    pub fn prefetch(&self, ids: &[ScenarioId]) -> Vec<(ScenarioId, ArchiveError)> {
        let failures: Vec<_> = ids
            .par_iter()
            .filter_map(|id| self.scenario(*id).err().map(|err| (*id, err)))
            .collect();
        debug!(
            requested = ids.len(),
            failed = failures.len(),
            cached = self.cached_count(),
            "prefetched scenarios"
        );
        failures
    }

    /// Drop every cached scenario. The index is kept.
    pub fn reset(&self) {
        let mut cache = self.lock_cache();
        let dropped = cache.len();
        cache.clear();
        debug!(archive = %self.name, dropped, "scenario cache reset");
    }

    /// Number of scenarios currently cached.
    pub fn cached_count(&self) -> usize {
        self.lock_cache().len()
    }

    fn lock_cache(&self) -> MutexGuard<'_, HashMap<ScenarioId, Arc<Scenario>>> {
        // a poisoned cache only ever holds fully decoded scenarios
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ScenarioSource for Archive {
    fn scenario(&self, id: ScenarioId) -> Result<Arc<Scenario>> {
        Archive::scenario(self, id)
    }

    fn contains(&self, id: ScenarioId) -> bool {
        Archive::contains(self, id)
    }
}

/// In-memory collection of already decoded scenarios.
#[derive(Debug, Clone, Default)]
pub struct ScenarioSet {
    scenarios: BTreeMap<ScenarioId, Arc<Scenario>>,
}

impl ScenarioSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a scenario, replacing any scenario with the same id.
    pub fn insert(&mut self, scenario: Scenario) -> &mut Self {
        self.scenarios.insert(scenario.id(), Arc::new(scenario));
        self
    }

    /// Builder-style [`ScenarioSet::insert`].
    pub fn with(mut self, scenario: Scenario) -> Self {
        self.insert(scenario);
        self
    }

    /// Number of scenarios.
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}

impl FromIterator<Scenario> for ScenarioSet {
    fn from_iter<I: IntoIterator<Item = Scenario>>(iter: I) -> Self {
        let mut set = Self::new();
        for scenario in iter {
            set.insert(scenario);
        }
        set
    }
}

impl ScenarioSource for ScenarioSet {
    fn scenario(&self, id: ScenarioId) -> Result<Arc<Scenario>> {
        self.scenarios
            .get(&id)
            .cloned()
            .ok_or(ArchiveError::UnknownScenario { id })
    }

    fn contains(&self, id: ScenarioId) -> bool {
        self.scenarios.contains_key(&id)
    }
}
