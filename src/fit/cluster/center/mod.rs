use nalgebra::DVector;
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use serde::{Serialize, Deserialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};
use crate::table::{Dataset, DatasetError};

/// Centroid representation and the per-cluster mean and squared error.
pub mod centroid;

/// Assignment of vectors to their nearest centroid.
pub mod partition;

pub mod settings;

/// SSE sweep over candidate numbers of clusters (elbow method).
pub mod elbow;

pub use centroid::{Centroid, EmptyClusterPolicy};
pub use partition::Partition;
pub use settings::{KMeansSettings, SettingsError};

#[derive(Debug, Error)]
pub enum KMeansError {

    #[error("No dataset loaded")]
    NoData,

    #[error("Number of clusters must be at least 1")]
    InvalidK,

    #[error("Number of repetitions must be at least 1")]
    InvalidRepetitions,

    #[error("Expected {expected} centroids, but {found} were informed")]
    CentroidCount { expected : usize, found : usize },

    #[error("Centroid has {found} dimensions, but the dataset has {expected}")]
    DimensionMismatch { expected : usize, found : usize },

    #[error("Cluster {0} has no members, so its mean is undefined")]
    EmptyClusterMean(usize),

    #[error(transparent)]
    Dataset(#[from] DatasetError)

}

/// Which half of an assign/update cycle the next step performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Assign,
    Update
}

impl Phase {

    pub fn next(self) -> Self {
        match self {
            Phase::Assign => Phase::Update,
            Phase::Update => Phase::Assign
        }
    }

}

#[derive(Debug, Clone, PartialEq)]
pub enum Centroids {
    Uninitialized,
    Ready(Vec<Centroid>)
}

impl Centroids {

    pub fn as_slice(&self) -> &[Centroid] {
        match self {
            Centroids::Ready(c) => &c[..],
            Centroids::Uninitialized => &[]
        }
    }

}

#[derive(Debug, Clone, PartialEq)]
pub enum Assignment {
    Unassigned,
    Assigned(Partition)
}

impl Assignment {

    pub fn partition(&self) -> Option<&Partition> {
        match self {
            Assignment::Assigned(p) => Some(p),
            Assignment::Unassigned => None
        }
    }

}

/// Outcome of a bulk run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RunSummary {

    pub cycles : usize,

    /// Vectors that changed cluster during the last assignment.
    pub reallocated : usize,

    pub sse : f64
}

/// Serializable view of the engine state, for presentation layers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub k : usize,
    pub repetitions : usize,
    pub dimensions : usize,
    pub vectors : usize,
    pub next_phase : Phase,
    pub data_displayed : bool,
    pub completed : bool,

    /// None before initialization; vacant centroids are None entries.
    pub centroids : Option<Vec<Option<Vec<f64>>>>,

    /// Dataset indices of each cluster; None before the first assignment.
    pub clusters : Option<Vec<Vec<usize>>>,

    pub sse : f64
}

/// Step-wise K-means. The engine alternates between assigning every vector to its
/// nearest centroid and moving every centroid to the mean of its cluster, and can
/// be driven one phase at a time (step) or for a fixed number of full cycles (run),
/// so callers can observe the state after each phase. Centroids are seeded by drawing
/// K vectors uniformly, with replacement, from the dataset. Changing K discards all
/// clustering progress.
#[derive(Debug, Clone)]
pub struct KMeans {

    dataset : Option<Dataset>,

    k : usize,

    repetitions : usize,

    centroids : Centroids,

    assignment : Assignment,

    phase : Phase,

    data_displayed : bool,

    completed : bool,

    empty_cluster : EmptyClusterPolicy,

    rng : StdRng
}

impl Default for KMeans {

    fn default() -> Self {
        Self::build(&KMeansSettings::default())
    }

}

impl KMeans {

    fn build(settings : &KMeansSettings) -> Self {
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy()
        };
        Self {
            dataset : None,
            k : settings.k,
            repetitions : settings.repetitions,
            centroids : Centroids::Uninitialized,
            assignment : Assignment::Unassigned,
            phase : Phase::Assign,
            data_displayed : false,
            completed : false,
            empty_cluster : settings.empty_cluster,
            rng
        }
    }

    pub fn new(settings : &KMeansSettings) -> Result<Self, KMeansError> {
        if settings.k == 0 {
            return Err(KMeansError::InvalidK);
        }
        if settings.repetitions == 0 {
            return Err(KMeansError::InvalidRepetitions);
        }
        Ok(Self::build(settings))
    }

    pub fn with_dataset(dataset : Dataset, settings : &KMeansSettings) -> Result<Self, KMeansError> {
        let mut km = Self::new(settings)?;
        km.set_dataset(dataset);
        Ok(km)
    }

    /// Loads the dataset at path, replacing the current one, and returns its dimension.
    /// Centroids and clusters of the previous dataset are discarded.
    pub fn open_dataset<P>(&mut self, path : P) -> Result<usize, DatasetError>
    where
        P : AsRef<Path>
    {
        let dataset = Dataset::open(path)?;
        let dims = dataset.dimensions();
        self.set_dataset(dataset);
        Ok(dims)
    }

    pub fn set_dataset(&mut self, dataset : Dataset) {
        self.dataset = Some(dataset);
        self.clear();
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    pub fn vectors(&self) -> &[DVector<f64>] {
        self.dataset.as_ref().map(|ds| ds.vectors() ).unwrap_or(&[])
    }

    /// Dimension of the loaded vectors (zero without a dataset).
    pub fn dimensions(&self) -> usize {
        self.dataset.as_ref().map(|ds| ds.dimensions() ).unwrap_or(0)
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn repetitions(&self) -> usize {
        self.repetitions
    }

    /// Phase performed by the next call to step.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn data_displayed(&self) -> bool {
        self.data_displayed
    }

    pub fn completed(&self) -> bool {
        self.completed
    }

    pub fn empty_cluster_policy(&self) -> EmptyClusterPolicy {
        self.empty_cluster
    }

    pub fn centroid_state(&self) -> &Centroids {
        &self.centroids
    }

    /// Current centroids, indexed by cluster; empty before initialization.
    pub fn centroids(&self) -> &[Centroid] {
        self.centroids.as_slice()
    }

    pub fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    /// Dataset indices of each cluster; empty before the first assignment.
    pub fn clusters(&self) -> &[Vec<usize>] {
        self.assignment.partition().map(|p| p.clusters() ).unwrap_or(&[])
    }

    /// Sets the number of clusters. Any value different from the current one
    /// discards centroids and clusters.
    pub fn update_k(&mut self, k : usize) -> Result<(), KMeansError> {
        if k == 0 {
            return Err(KMeansError::InvalidK);
        }
        if k != self.k {
            debug!(from = self.k, to = k, "Changing number of clusters");
            self.k = k;
            self.clear();
        }
        Ok(())
    }

    pub fn set_repetitions(&mut self, n : usize) -> Result<(), KMeansError> {
        if n == 0 {
            return Err(KMeansError::InvalidRepetitions);
        }
        self.repetitions = n;
        Ok(())
    }

    /// Forgets centroids and clusters and goes back to the assignment phase.
    /// The dataset is kept.
    pub fn clear(&mut self) {
        self.centroids = Centroids::Uninitialized;
        self.assignment = Assignment::Unassigned;
        self.phase = Phase::Assign;
        self.completed = false;
    }

    /// Draws K centroids independently and uniformly from the dataset vectors.
    /// The same vector may be drawn more than once. Replaces any existing centroids.
    pub fn init_centroids(&mut self) -> Result<(), KMeansError> {
        let ds = self.dataset.as_ref().ok_or(KMeansError::NoData)?;
        let mut centroids = Vec::with_capacity(self.k);
        for _ in 0..self.k {
            let v = ds.vectors().choose(&mut self.rng).ok_or(KMeansError::NoData)?;
            centroids.push(Centroid::Position(v.clone()));
        }
        debug!(k = self.k, "Initialized centroids");
        self.centroids = Centroids::Ready(centroids);
        Ok(())
    }

    /// Uses the informed vectors as the current centroids, which must be K vectors
    /// with the dataset dimension. Clusters are kept until the next assignment.
    pub fn seed_centroids(&mut self, centroids : Vec<DVector<f64>>) -> Result<(), KMeansError> {
        let ds = self.dataset.as_ref().ok_or(KMeansError::NoData)?;
        if centroids.len() != self.k {
            return Err(KMeansError::CentroidCount { expected : self.k, found : centroids.len() });
        }
        if let Some(c) = centroids.iter().find(|c| c.len() != ds.dimensions() ) {
            return Err(KMeansError::DimensionMismatch { expected : ds.dimensions(), found : c.len() });
        }
        self.centroids = Centroids::Ready(centroids.into_iter().map(Centroid::Position).collect());
        Ok(())
    }

    // Replaces every Vacant centroid by a vector drawn uniformly from the dataset.
    fn reseed_vacant(&mut self) -> Result<(), KMeansError> {
        let ds = self.dataset.as_ref().ok_or(KMeansError::NoData)?;
        if let Centroids::Ready(centroids) = &mut self.centroids {
            for (c, centroid) in centroids.iter_mut().enumerate() {
                if centroid.is_vacant() {
                    let v = ds.vectors().choose(&mut self.rng).ok_or(KMeansError::NoData)?;
                    debug!(cluster = c, "Reseeded vacant centroid");
                    *centroid = Centroid::Position(v.clone());
                }
            }
        }
        Ok(())
    }

    /// Assigns every vector to the cluster of its nearest centroid (initializing
    /// centroids first if needed, and drawing new positions for vacant ones),
    /// replacing the previous clusters. Returns how many vectors changed cluster.
    pub fn cluster_points(&mut self) -> Result<usize, KMeansError> {
        if let Centroids::Uninitialized = self.centroids {
            self.init_centroids()?;
        }
        self.reseed_vacant()?;
        let ds = self.dataset.as_ref().ok_or(KMeansError::NoData)?;
        let partition = Partition::assign(ds.vectors(), self.centroids.as_slice());
        let n_reallocated = partition.reallocated(self.assignment.partition());
        debug!(reallocated = n_reallocated, "Assigned vectors to nearest centroids");
        self.assignment = Assignment::Assigned(partition);
        Ok(n_reallocated)
    }

    /// Moves each centroid to the mean of its cluster (assigning vectors first
    /// if needed). Centroids of empty clusters follow the empty-cluster policy.
    pub fn update_centroid_pos(&mut self) -> Result<(), KMeansError> {
        if let Assignment::Unassigned = self.assignment {
            self.cluster_points()?;
        }
        let ds = self.dataset.as_ref().ok_or(KMeansError::NoData)?;
        let partition = self.assignment.partition().ok_or(KMeansError::NoData)?;
        let previous = self.centroids.as_slice();
        let mut updated = Vec::with_capacity(partition.clusters().len());
        for c in 0..partition.clusters().len() {
            match centroid::mean(partition.members(c, ds.vectors()), ds.dimensions(), c) {
                Ok(m) => updated.push(Centroid::Position(m)),
                Err(e) => {
                    warn!(cluster = c, policy = ?self.empty_cluster, "{}", e);
                    let fallback = match self.empty_cluster {
                        EmptyClusterPolicy::Retain => previous.get(c).cloned().unwrap_or(Centroid::Vacant),
                        EmptyClusterPolicy::Reseed => Centroid::Vacant
                    };
                    updated.push(fallback);
                }
            }
        }
        debug!(k = updated.len(), "Updated centroid positions");
        self.centroids = Centroids::Ready(updated);
        Ok(())
    }

    /// Sum over clusters of the squared distances between each member and the
    /// mean of its cluster. The means are recomputed from the members, not taken
    /// from the stored centroids. Zero before the first assignment.
    pub fn calculate_sse(&self) -> f64 {
        match (&self.dataset, &self.assignment) {
            (Some(ds), Assignment::Assigned(p)) => {
                (0..p.clusters().len())
                    .map(|c| centroid::squared_error(p.members(c, ds.vectors()), ds.dimensions()) )
                    .sum()
            },
            _ => 0.0
        }
    }

    /// Performs the current phase (assignment or centroid update), then moves to
    /// the other one. Returns the phase that was performed.
    pub fn step(&mut self) -> Result<Phase, KMeansError> {
        let phase = self.phase;
        match phase {
            Phase::Assign => {
                self.cluster_points()?;
            },
            Phase::Update => {
                self.update_centroid_pos()?;
            }
        }
        self.data_displayed = true;
        self.phase = phase.next();
        Ok(phase)
    }

    /// Performs exactly `repetitions` assign/update cycles. A run issued after a
    /// completed run starts over from fresh centroids.
    pub fn run(&mut self) -> Result<RunSummary, KMeansError> {
        if self.dataset.is_none() {
            return Err(KMeansError::NoData);
        }
        if self.completed {
            self.clear();
        }
        let mut reallocated = 0;
        for cycle in 0..self.repetitions {
            reallocated = self.cluster_points()?;
            self.update_centroid_pos()?;
            debug!(cycle, reallocated, "Finished assign/update cycle");
        }
        self.phase = Phase::Assign;
        self.data_displayed = true;
        self.completed = true;
        let sse = self.calculate_sse();
        info!(k = self.k, cycles = self.repetitions, reallocated, sse, "Run complete");
        Ok(RunSummary { cycles : self.repetitions, reallocated, sse })
    }

    pub fn snapshot(&self) -> Snapshot {
        let centroids = match &self.centroids {
            Centroids::Ready(c) => Some(
                c.iter().map(|c| c.position().map(|p| p.as_slice().to_vec() ) ).collect()
            ),
            Centroids::Uninitialized => None
        };
        Snapshot {
            k : self.k,
            repetitions : self.repetitions,
            dimensions : self.dimensions(),
            vectors : self.vectors().len(),
            next_phase : self.phase,
            data_displayed : self.data_displayed,
            completed : self.completed,
            centroids,
            clusters : self.assignment.partition().map(|p| p.clusters().to_vec() ),
            sse : self.calculate_sse()
        }
    }

}

impl fmt::Display for KMeans {

    fn fmt(&self, f : &mut fmt::Formatter) -> Result<(), fmt::Error> {
        let mut dst = String::new();
        for (c, centroid) in self.centroids().iter().enumerate() {
            let mean = match centroid.position() {
                Some(p) => format!("{:?}", p.as_slice()),
                None => String::from("(vacant)")
            };
            let obs_ix = self.clusters().get(c).cloned().unwrap_or_default();
            dst += &format!("Cluster {}: Mean = {}; Observations = {:?}\n", c, mean, obs_ix);
        }
        write!(f, "{}", dst)
    }
}
