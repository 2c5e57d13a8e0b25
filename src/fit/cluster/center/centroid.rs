use nalgebra::DVector;
use serde::{Serialize, Deserialize};
use crate::fit::cluster::{Distance, Euclidian, SquaredEuclidian};
use super::KMeansError;

/// Representative point of one cluster. A cluster that lost all of its members
/// during a centroid update has no mean; under EmptyClusterPolicy::Reseed its
/// centroid is Vacant until the next assignment draws a new position.
#[derive(Debug, Clone, PartialEq)]
pub enum Centroid {
    Position(DVector<f64>),
    Vacant
}

impl Centroid {

    pub fn position(&self) -> Option<&DVector<f64>> {
        match self {
            Centroid::Position(p) => Some(p),
            Centroid::Vacant => None
        }
    }

    pub fn is_vacant(&self) -> bool {
        matches!(self, Centroid::Vacant)
    }

    /// Euclidian distance to the informed vector. Vacant centroids are infinitely
    /// far from everything, so they never win an assignment.
    pub fn distance_to(&self, v : &DVector<f64>) -> f64 {
        match self {
            Centroid::Position(p) => Distance::<Euclidian>::distance(p, v),
            Centroid::Vacant => f64::INFINITY
        }
    }

}

impl From<DVector<f64>> for Centroid {

    fn from(v : DVector<f64>) -> Self {
        Centroid::Position(v)
    }

}

/// What happens to the centroid of a cluster left without members when
/// centroids are recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyClusterPolicy {

    /// Centroid keeps its previous position and competes for vectors again
    /// in the next assignment.
    Retain,

    /// Centroid becomes Vacant, and the next assignment replaces it by a vector
    /// drawn uniformly from the dataset.
    Reseed
}

impl Default for EmptyClusterPolicy {

    fn default() -> Self {
        EmptyClusterPolicy::Retain
    }

}

/// Per-dimension arithmetic mean of the members. The mean of zero members is
/// undefined, which is reported as KMeansError::EmptyClusterMean for cluster_ix.
pub fn mean<'a>(
    members : impl Iterator<Item=&'a DVector<f64>>,
    dim : usize,
    cluster_ix : usize
) -> Result<DVector<f64>, KMeansError> {
    let mut sum = DVector::zeros(dim);
    let mut count = 0;
    for m in members {
        sum += m;
        count += 1;
    }
    if count == 0 {
        return Err(KMeansError::EmptyClusterMean(cluster_ix));
    }
    sum.scale_mut(1. / (count as f64));
    Ok(sum)
}

/// Sum of squared Euclidian distances from the members to their own mean.
/// Zero for an empty cluster.
pub fn squared_error<'a>(
    members : impl Iterator<Item=&'a DVector<f64>> + Clone,
    dim : usize
) -> f64 {
    match mean(members.clone(), dim, 0) {
        Ok(m) => members.map(|v| Distance::<SquaredEuclidian>::distance(v, &m) ).sum(),
        Err(_) => 0.0
    }
}
