// Loader contract: anything that can hand the builder a validated dataset

use std::fs;
use std::path::{Path, PathBuf};

use super::dataset::Dataset;
use super::error::DataError;

/// A source of problem instances (file, generator, in-memory fixture)
pub trait DataSource {
    /// Produce a dataset whose tables agree with its declared dimensions
    fn load(&self) -> Result<Dataset, DataError>;
}

/// An in-memory dataset is its own source
impl DataSource for Dataset {
    fn load(&self) -> Result<Dataset, DataError> {
        self.validate()?;
        Ok(self.clone())
    }
}

/// Dataset stored as one JSON document with a field per parameter table
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl DataSource for JsonFileSource {
    fn load(&self) -> Result<Dataset, DataError> {
        let json = fs::read_to_string(&self.path).map_err(|source| DataError::Io {
            path: self.path.clone(),
            source,
        })?;
        let dataset = Dataset::from_json_str(&json)?;
        tracing::info!(
            path = %self.path.display(),
            activities = dataset.dimensions.num_activities,
            agents = dataset.dimensions.num_agents,
            equipment = dataset.dimensions.num_equipment,
            scenarios = dataset.dimensions.num_scenarios,
            "loaded dataset"
        );
        Ok(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::fixtures::uniform;

    #[test]
    fn test_missing_file_is_io_error() {
        let source = JsonFileSource::new("/nonexistent/dataset.json");
        assert!(matches!(source.load(), Err(DataError::Io { .. })));
    }

    #[test]
    fn test_file_round_trip() {
        let data = uniform(2, 3, 2, 2);
        let path = std::env::temp_dir().join(format!("stochassign-{}.json", std::process::id()));
        fs::write(&path, data.to_json_string().unwrap()).unwrap();

        let loaded = JsonFileSource::new(&path).load();
        let _ = fs::remove_file(&path);
        assert_eq!(loaded.unwrap(), data);
    }

    #[test]
    fn test_garbage_is_parse_error() {
        let path =
            std::env::temp_dir().join(format!("stochassign-bad-{}.json", std::process::id()));
        fs::write(&path, "{ not json").unwrap();
        let loaded = JsonFileSource::new(&path).load();
        let _ = fs::remove_file(&path);
        assert!(matches!(loaded, Err(DataError::Parse(_))));
    }
}
