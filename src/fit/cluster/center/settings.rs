use serde::{Serialize, Deserialize};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use thiserror::Error;
use super::centroid::EmptyClusterPolicy;

pub const DEFAULT_K : usize = 3;

pub const DEFAULT_REPETITIONS : usize = 3;

#[derive(Debug, Error)]
pub enum SettingsError {

    #[error("Could not read settings file: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid settings: {0}")]
    Parse(#[from] serde_json::Error)

}

/// Starting configuration of a KMeans engine. Fields missing from a settings
/// file take their default values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KMeansSettings {

    /// Number of clusters.
    pub k : usize,

    /// Number of assign/update cycles performed by a bulk run.
    pub repetitions : usize,

    /// Seed for centroid initialization. Drawn from entropy when absent.
    pub seed : Option<u64>,

    pub empty_cluster : EmptyClusterPolicy
}

impl Default for KMeansSettings {

    fn default() -> Self {
        Self {
            k : DEFAULT_K,
            repetitions : DEFAULT_REPETITIONS,
            seed : None,
            empty_cluster : EmptyClusterPolicy::default()
        }
    }

}

impl KMeansSettings {

    pub fn load_from_path<P>(path : P) -> Result<Self, SettingsError>
    where
        P : AsRef<Path>
    {
        let f = File::open(path)?;
        Self::load(f)
    }

    pub fn load<R>(mut reader : R) -> Result<Self, SettingsError>
    where
        R : Read
    {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        Ok(serde_json::from_str(&content[..])?)
    }

}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn partial_settings_take_defaults() {
        let s = KMeansSettings::load(r#"{ "k" : 5, "seed" : 7 }"#.as_bytes()).unwrap();
        assert_eq!(s.k, 5);
        assert_eq!(s.seed, Some(7));
        assert_eq!(s.repetitions, DEFAULT_REPETITIONS);
        assert_eq!(s.empty_cluster, EmptyClusterPolicy::Retain);
    }

    #[test]
    fn policy_by_name() {
        let s = KMeansSettings::load(r#"{ "empty_cluster" : "reseed" }"#.as_bytes()).unwrap();
        assert_eq!(s.empty_cluster, EmptyClusterPolicy::Reseed);
        assert_eq!(s.k, DEFAULT_K);
    }

    #[test]
    fn invalid_json() {
        assert!(matches!(KMeansSettings::load("{ k : ".as_bytes()), Err(SettingsError::Parse(_))));
    }

}
