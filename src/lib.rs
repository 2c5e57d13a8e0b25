/// Loading of tab-delimited numeric datasets (one labelled vector per row).
pub mod table;

/// Step-wise K-means clustering: centroid seeding, nearest-centroid assignment,
/// centroid update, SSE scoring and the elbow sweep over candidate K values.
pub mod fit;

pub use table::{Dataset, DatasetError};

pub use fit::cluster::center::{
    Assignment, Centroid, Centroids, EmptyClusterPolicy, KMeans, KMeansError, KMeansSettings,
    Partition, Phase, RunSummary, SettingsError, Snapshot,
};

pub use fit::cluster::center::elbow::{elbow, recommend_k, sweep, ElbowPoint};
