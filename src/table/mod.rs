use nalgebra::DVector;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::info;

pub mod csv;

#[derive(Debug, Error)]
pub enum DatasetError {

    #[error("Dataset not found at {path:?}: {source}")]
    NotFound { path : PathBuf, source : io::Error },

    #[error("Malformed dataset (line {line}): {reason}")]
    Malformed { line : u64, reason : String }

}

/// Ordered sequence of numeric vectors sharing the same dimension, as read
/// from a tab-delimited file. Keeps the row labels (first column) and the names
/// of the value columns, which are not part of the vectors themselves.
/// A dataset always holds at least one vector.
#[derive(Debug, Clone)]
pub struct Dataset {

    names : Vec<String>,

    labels : Vec<String>,

    vectors : Vec<DVector<f64>>,

    dimensions : usize
}

impl Dataset {

    /// Reads and parses the file at path. Failures to open or read the file
    /// are reported as DatasetError::NotFound; everything that goes wrong after
    /// the bytes are in memory is DatasetError::Malformed.
    pub fn open<P>(path : P) -> Result<Self, DatasetError>
    where
        P : AsRef<Path>
    {
        let path = path.as_ref();
        let content = fs::read(path)
            .map_err(|source| DatasetError::NotFound { path : path.to_path_buf(), source })?;
        let dataset = Self::parse(&content[..])?;
        info!(path = ?path, vectors = dataset.len(), dimensions = dataset.dimensions, "Dataset loaded");
        Ok(dataset)
    }

    pub fn parse(content : &[u8]) -> Result<Self, DatasetError> {
        let tbl = csv::parse_tab_delimited(content)?;
        let dimensions = tbl.header.len() - 1;
        Ok(Self {
            names : tbl.header.into_iter().skip(1).collect(),
            labels : tbl.labels,
            vectors : tbl.rows.into_iter().map(DVector::from_vec).collect(),
            dimensions
        })
    }

    /// Builds a dataset from in-memory vectors, labelled by their position.
    pub fn from_vectors(vectors : Vec<DVector<f64>>) -> Result<Self, DatasetError> {
        let dimensions = match vectors.first() {
            Some(v) => v.len(),
            None => return Err(DatasetError::Malformed { line : 0, reason : "No vectors informed".into() })
        };
        if dimensions == 0 {
            return Err(DatasetError::Malformed { line : 0, reason : "Vectors have no values".into() });
        }
        if let Some(ix) = vectors.iter().position(|v| v.len() != dimensions ) {
            return Err(DatasetError::Malformed {
                line : ix as u64,
                reason : format!("Vector has {} values, expected {}", vectors[ix].len(), dimensions)
            });
        }
        Ok(Self {
            names : (0..dimensions).map(|i| format!("(Column {})", i) ).collect(),
            labels : (0..vectors.len()).map(|i| i.to_string() ).collect(),
            vectors,
            dimensions
        })
    }

    pub fn vectors(&self) -> &[DVector<f64>] {
        &self.vectors[..]
    }

    pub fn labels(&self) -> &[String] {
        &self.labels[..]
    }

    /// Names of the value columns, in vector order.
    pub fn names(&self) -> &[String] {
        &self.names[..]
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

}

impl FromStr for Dataset {

    type Err = DatasetError;

    fn from_str(s : &str) -> Result<Self, DatasetError> {
        Self::parse(s.as_bytes())
    }

}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn dimensions_exclude_label_column() {
        let ds : Dataset = "\ta\tb\tc\nr0\t1\t2\t3\nr1\t4\t5\t6\n".parse().unwrap();
        assert_eq!(ds.dimensions(), 3);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.names(), &["a", "b", "c"]);
        assert_eq!(ds.labels(), &["r0", "r1"]);
        assert_eq!(ds.vectors()[1], DVector::from_vec(vec![4., 5., 6.]));
    }

    #[test]
    fn missing_file_is_not_found() {
        let res = Dataset::open("/definitely/not/a/dataset.tsv");
        assert!(matches!(res, Err(DatasetError::NotFound { .. })));
    }

    #[test]
    fn inconsistent_vectors() {
        let res = Dataset::from_vectors(vec![
            DVector::from_vec(vec![1., 2.]),
            DVector::from_vec(vec![1.])
        ]);
        assert!(matches!(res, Err(DatasetError::Malformed { line : 1, .. })));
        assert!(Dataset::from_vectors(Vec::new()).is_err());
    }

}
