use std::collections::BTreeSet;
use std::fs;

use camino::Utf8Path;

use crate::error::TaxaError;

// Names of the immediate subdirectories of the dataset root. Each directory is
// assumed to be named after an organism ("Genus_species"); files alongside
// them are ignored.
pub fn directory_names(root: &Utf8Path) -> Result<BTreeSet<String>, TaxaError> {
    let entries = fs::read_dir(root.as_std_path())
        .map_err(|err| TaxaError::Filesystem(format!("read dataset dir {root}: {err}")))?;

    let mut names = BTreeSet::new();
    for entry in entries {
        let entry = entry.map_err(|err| TaxaError::Filesystem(err.to_string()))?;
        let file_type = entry
            .file_type()
            .map_err(|err| TaxaError::Filesystem(err.to_string()))?;
        if !file_type.is_dir() {
            continue;
        }
        let name = entry.file_name().into_string().map_err(|name| {
            TaxaError::Filesystem(format!(
                "non-utf8 directory name: {}",
                name.to_string_lossy()
            ))
        })?;
        names.insert(name);
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use camino::Utf8PathBuf;

    use super::*;

    #[test]
    fn lists_only_directories() {
        let temp = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        std::fs::create_dir(temp.path().join("Asellus_aquaticus")).unwrap();
        std::fs::create_dir(temp.path().join("Chelifera")).unwrap();
        std::fs::write(temp.path().join("labels.csv"), b"noise").unwrap();

        let names = directory_names(&root).unwrap();
        let names: Vec<_> = names.into_iter().collect();
        assert_eq!(names, vec!["Asellus_aquaticus", "Chelifera"]);
    }

    #[test]
    fn missing_root_is_a_filesystem_error() {
        let err = directory_names(Utf8Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, TaxaError::Filesystem(_)));
    }
}
