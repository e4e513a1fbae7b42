use camino::Utf8PathBuf;

use crate::error::TaxaError;

pub const EMAIL_VAR: &str = "NCBI_EMAIL_ADDR";
pub const TOOL_VAR: &str = "NCBI_TOOL_NAME";
pub const DATASET_VAR: &str = "NCBI_DATA_PATH";
pub const CACHE_VAR: &str = "JSON_PATH";

#[derive(Debug, Clone)]
pub struct Config {
    pub email: String,
    pub tool: String,
    pub dataset_dir: Utf8PathBuf,
    pub cache_path: Utf8PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, TaxaError> {
        Ok(Self {
            email: require_env(EMAIL_VAR)?,
            tool: require_env(TOOL_VAR)?,
            dataset_dir: Utf8PathBuf::from(require_env(DATASET_VAR)?),
            cache_path: Utf8PathBuf::from(require_env(CACHE_VAR)?),
        })
    }
}

fn require_env(name: &'static str) -> Result<String, TaxaError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(TaxaError::MissingEnv(name)),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn from_env_requires_every_variable() {
        // One test body so the env mutations never race a parallel test.
        unsafe {
            std::env::set_var(EMAIL_VAR, "someone@example.org");
            std::env::set_var(TOOL_VAR, "taxa-lm-test");
            std::env::set_var(DATASET_VAR, "/data/images");
            std::env::set_var(CACHE_VAR, "/data/taxa.json");
        }

        let config = Config::from_env().unwrap();
        assert_eq!(config.email, "someone@example.org");
        assert_eq!(config.tool, "taxa-lm-test");
        assert_eq!(config.dataset_dir, Utf8PathBuf::from("/data/images"));
        assert_eq!(config.cache_path, Utf8PathBuf::from("/data/taxa.json"));

        unsafe {
            std::env::remove_var(CACHE_VAR);
        }
        let err = Config::from_env().unwrap_err();
        assert_matches!(err, TaxaError::MissingEnv(CACHE_VAR));

        unsafe {
            std::env::set_var(CACHE_VAR, "   ");
        }
        let err = Config::from_env().unwrap_err();
        assert_matches!(err, TaxaError::MissingEnv(CACHE_VAR));
    }
}
