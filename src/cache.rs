use std::collections::BTreeMap;
use std::fs;

use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use crate::domain::TaxonInfo;
use crate::error::TaxaError;

// Keys are original, unnormalized directory names: entries correspond 1:1 with
// dataset directories, so two directories for the same species carry two
// identical records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cache {
    entries: BTreeMap<String, TaxonInfo>,
}

impl Cache {
    pub fn load(path: &Utf8Path) -> Result<Self, TaxaError> {
        if !path.as_std_path().exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path.as_std_path())
            .map_err(|err| TaxaError::Filesystem(format!("read cache {path}: {err}")))?;
        serde_json::from_str(&content)
            .map_err(|err| TaxaError::CacheParse(format!("{path}: {err}")))
    }

    pub fn save(&self, path: &Utf8Path) -> Result<(), TaxaError> {
        let parent = match path.parent() {
            Some(parent) if !parent.as_str().is_empty() => parent,
            _ => Utf8Path::new("."),
        };
        fs::create_dir_all(parent.as_std_path())
            .map_err(|err| TaxaError::Filesystem(format!("create {parent}: {err}")))?;

        let content = serde_json::to_vec_pretty(self)
            .map_err(|err| TaxaError::Filesystem(err.to_string()))?;
        let temp = tempfile::Builder::new()
            .prefix(".taxa-lm-cache")
            .tempfile_in(parent.as_std_path())
            .map_err(|err| TaxaError::Filesystem(err.to_string()))?;
        fs::write(temp.path(), &content).map_err(|err| TaxaError::Filesystem(err.to_string()))?;
        temp.persist(path.as_std_path())
            .map_err(|err| TaxaError::Filesystem(err.to_string()))?;
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&TaxonInfo> {
        self.entries.get(name)
    }

    pub fn insert(&mut self, name: String, info: TaxonInfo) {
        self.entries.insert(name, info);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use camino::Utf8PathBuf;

    use crate::domain::{Lineage, TaxonId, TaxonRecord};

    use super::*;

    fn sample_info(taxon_id: u64) -> TaxonInfo {
        TaxonInfo {
            rank: "species".to_string(),
            sci_name: "Asellus aquaticus".to_string(),
            taxon_id: TaxonId::new(taxon_id),
            lineage: Lineage::new(vec![TaxonRecord {
                rank: "order".to_string(),
                sci_name: "Isopoda".to_string(),
                taxon_id: TaxonId::new(29979),
            }]),
        }
    }

    #[test]
    fn load_missing_file_yields_empty_cache() {
        let temp = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(temp.path().join("taxa.json")).unwrap();
        let cache = Cache::load(&path).unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let temp = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(temp.path().join("taxa.json")).unwrap();

        let mut cache = Cache::default();
        cache.insert("Asellus_aquaticus".to_string(), sample_info(92489));
        cache.save(&path).unwrap();

        let restored = Cache::load(&path).unwrap();
        assert_eq!(restored.len(), 1);
        assert_eq!(
            restored.get("Asellus_aquaticus").unwrap().taxon_id,
            TaxonId::new(92489)
        );
    }

    #[test]
    fn save_leaves_no_temp_file_behind() {
        let temp = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(temp.path().join("taxa.json")).unwrap();

        let mut cache = Cache::default();
        cache.insert("Chelifera".to_string(), sample_info(569035));
        cache.save(&path).unwrap();
        cache.save(&path).unwrap();

        let leftovers: Vec<_> = std::fs::read_dir(temp.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(leftovers, vec!["taxa.json".to_string()]);
    }

    #[test]
    fn corrupt_cache_is_reported() {
        let temp = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(temp.path().join("taxa.json")).unwrap();
        std::fs::write(path.as_std_path(), b"{not json").unwrap();

        let err = Cache::load(&path).unwrap_err();
        assert!(matches!(err, TaxaError::CacheParse(_)));
        assert!(!err.is_resolution_failure());
    }
}
