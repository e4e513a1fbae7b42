use serde::Serialize;
use tracing::{info, warn};

use crate::cache::Cache;
use crate::config::Config;
use crate::dataset;
use crate::domain::TaxonInfo;
use crate::error::TaxaError;
use crate::eutils::TaxonomyClient;

#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub total: usize,
    pub already_cached: usize,
    pub resolved: usize,
    pub failed: Vec<String>,
}

pub struct App<C: TaxonomyClient> {
    config: Config,
    client: C,
}

impl<C: TaxonomyClient> App<C> {
    pub fn new(config: Config, client: C) -> Self {
        Self { config, client }
    }

    pub fn sync(&self) -> Result<SyncReport, TaxaError> {
        let mut cache = Cache::load(&self.config.cache_path)?;
        let names = dataset::directory_names(&self.config.dataset_dir)?;

        // BTreeSet iteration keeps the batch order lexicographic and
        // reproducible across runs.
        let new_names: Vec<&String> = names.iter().filter(|name| !cache.contains(name)).collect();
        let already_cached = names.len() - new_names.len();
        info!(
            total = names.len(),
            cached = already_cached,
            new = new_names.len(),
            "scanned dataset directories"
        );

        let mut resolved = 0usize;
        let mut failed = Vec::new();
        for name in new_names {
            info!(name = %name, "resolving");
            match self.client.resolve(name) {
                Ok(taxon_info) => {
                    cache.insert(name.clone(), taxon_info);
                    resolved += 1;
                }
                Err(err) if err.is_resolution_failure() => {
                    warn!(name = %name, error = %err, "failed to retrieve taxonomy data");
                    failed.push(name.clone());
                }
                Err(err) => return Err(err),
            }
        }

        cache.save(&self.config.cache_path)?;
        Ok(SyncReport {
            total: names.len(),
            already_cached,
            resolved,
            failed,
        })
    }

    // Repairs one entry whose directory name is misspelled: the corrected
    // spelling drives the lookup, the original stays the cache key.
    pub fn fix(&self, original: &str, corrected: &str) -> Result<TaxonInfo, TaxaError> {
        let taxon_info = self.client.resolve(corrected)?;
        let mut cache = Cache::load(&self.config.cache_path)?;
        cache.insert(original.to_string(), taxon_info.clone());
        cache.save(&self.config.cache_path)?;
        info!(original = %original, corrected = %corrected, "repaired cache entry");
        Ok(taxon_info)
    }
}
