/// Clustering algorithms and the metrics they rely on.
pub mod cluster;
