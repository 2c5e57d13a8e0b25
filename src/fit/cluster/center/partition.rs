use nalgebra::DVector;
use super::centroid::Centroid;

/// Split of the dataset indices into exactly K ordered clusters. Every index
/// is held by exactly one cluster; clusters may be empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {

    // Indices held by each cluster, in dataset order.
    clusters : Vec<Vec<usize>>,

    // Cluster of each vector, in dataset order.
    allocations : Vec<usize>
}

/// Index of the centroid nearest to el. Scans the centroids in index order and
/// only moves on a strictly smaller distance, so ties go to the lowest index.
pub fn closest(centroids : &[Centroid], el : &DVector<f64>) -> usize {
    let mut min_dist = f64::INFINITY;
    let mut min_ix = 0;
    for (cand_ix, cand) in centroids.iter().enumerate() {
        let dist_to_cand = cand.distance_to(el);
        if dist_to_cand < min_dist {
            min_ix = cand_ix;
            min_dist = dist_to_cand;
        }
    }
    min_ix
}

impl Partition {

    /// Assigns every vector to its nearest centroid. The partition always has
    /// as many clusters as there are centroids.
    pub fn assign(vectors : &[DVector<f64>], centroids : &[Centroid]) -> Self {
        let mut clusters = vec![Vec::new(); centroids.len()];
        let mut allocations = Vec::with_capacity(vectors.len());
        for (ix, v) in vectors.iter().enumerate() {
            let best = closest(centroids, v);
            clusters[best].push(ix);
            allocations.push(best);
        }
        Self { clusters, allocations }
    }

    pub fn clusters(&self) -> &[Vec<usize>] {
        &self.clusters[..]
    }

    /// Return cluster of each observation, in the order they were supplied
    pub fn allocations(&self) -> &[usize] {
        &self.allocations[..]
    }

    /// Member vectors of the cluster, resolved against the vectors the
    /// partition was built from.
    pub fn members<'a>(
        &'a self,
        cluster_ix : usize,
        vectors : &'a [DVector<f64>]
    ) -> impl Iterator<Item=&'a DVector<f64>> + Clone + 'a {
        self.clusters[cluster_ix].iter().map(move |ix| &vectors[*ix] )
    }

    /// How many vectors sit in a different cluster than in prev. Every vector
    /// counts when there is no previous partition.
    pub fn reallocated(&self, prev : Option<&Partition>) -> usize {
        match prev {
            Some(p) if p.allocations.len() == self.allocations.len() => {
                self.allocations.iter()
                    .zip(p.allocations.iter())
                    .filter(|(a, b)| a != b )
                    .count()
            },
            _ => self.allocations.len()
        }
    }

}

#[cfg(test)]
mod tests {

    use super::*;

    fn v(vals : &[f64]) -> DVector<f64> {
        DVector::from_column_slice(vals)
    }

    #[test]
    fn ties_go_to_lowest_index() {
        let centroids = vec![Centroid::from(v(&[-1.])), Centroid::from(v(&[1.]))];
        assert_eq!(closest(&centroids, &v(&[0.])), 0);
        let dup = vec![Centroid::from(v(&[2.])), Centroid::from(v(&[2.]))];
        assert_eq!(closest(&dup, &v(&[5.])), 0);
    }

    #[test]
    fn vacant_centroids_are_skipped() {
        let centroids = vec![Centroid::Vacant, Centroid::from(v(&[100.]))];
        assert_eq!(closest(&centroids, &v(&[0.])), 1);
    }

    #[test]
    fn every_index_in_one_cluster() {
        let vectors : Vec<_> = (0..20).map(|i| v(&[i as f64, (i % 3) as f64])).collect();
        let centroids = vec![
            Centroid::from(v(&[0., 0.])),
            Centroid::from(v(&[10., 1.])),
            Centroid::from(v(&[50., 50.]))
        ];
        let part = Partition::assign(&vectors, &centroids);
        assert_eq!(part.clusters().len(), 3);
        let mut seen : Vec<usize> = part.clusters().iter().flatten().cloned().collect();
        seen.sort();
        assert_eq!(seen, (0..20).collect::<Vec<_>>());
        assert!(part.clusters()[2].is_empty());
        for (ix, alloc) in part.allocations().iter().enumerate() {
            assert!(part.clusters()[*alloc].contains(&ix));
        }
    }

    #[test]
    fn reallocation_count() {
        let vectors = vec![v(&[0.]), v(&[4.]), v(&[10.])];
        let first = Partition::assign(&vectors, &[Centroid::from(v(&[0.])), Centroid::from(v(&[10.]))]);
        assert_eq!(first.reallocated(None), 3);
        let second = Partition::assign(&vectors, &[Centroid::from(v(&[0.])), Centroid::from(v(&[6.]))]);
        assert_eq!(second.reallocated(Some(&first)), 1);
        assert_eq!(second.reallocated(Some(&second)), 0);
    }

}
