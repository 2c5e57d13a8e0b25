use serde::Serialize;
use std::ops::RangeInclusive;
use tracing::debug;
use crate::table::Dataset;
use super::{KMeans, KMeansError, KMeansSettings};

/// Clustering quality reached for one candidate number of clusters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ElbowPoint {
    pub k : usize,
    pub sse : f64
}

/// Runs a fresh engine for every K in ks, reporting each point to on_point as
/// soon as it is available. All other settings (repetitions, seed, empty-cluster
/// policy) are shared by the runs.
pub fn sweep<F>(
    dataset : &Dataset,
    ks : RangeInclusive<usize>,
    settings : &KMeansSettings,
    mut on_point : F
) -> Result<Vec<ElbowPoint>, KMeansError>
where
    F : FnMut(&ElbowPoint)
{
    let mut points = Vec::new();
    for k in ks {
        let k_settings = KMeansSettings { k, ..settings.clone() };
        let mut km = KMeans::with_dataset(dataset.clone(), &k_settings)?;
        let summary = km.run()?;
        let pt = ElbowPoint { k, sse : summary.sse };
        debug!(k, sse = pt.sse, "Elbow point");
        on_point(&pt);
        points.push(pt);
    }
    Ok(points)
}

pub fn elbow(
    dataset : &Dataset,
    ks : RangeInclusive<usize>,
    settings : &KMeansSettings
) -> Result<Vec<ElbowPoint>, KMeansError> {
    sweep(dataset, ks, settings, |_| { })
}

/// K at the sharpest bend of the SSE curve: the point with the largest second
/// difference sse[i-1] - 2 sse[i] + sse[i+1]. Points must be sorted by K with unit
/// spacing; at least three are needed. Ties go to the smallest K.
pub fn recommend_k(points : &[ElbowPoint]) -> Option<usize> {
    if points.len() < 3 {
        return None;
    }
    let mut best : Option<(usize, f64)> = None;
    for w in points.windows(3) {
        let bend = w[0].sse - 2. * w[1].sse + w[2].sse;
        match best {
            Some((_, b)) if bend <= b => { },
            _ => best = Some((w[1].k, bend))
        }
    }
    best.map(|(k, _)| k )
}

#[cfg(test)]
mod tests {

    use super::*;
    use nalgebra::DVector;

    fn pts(sse : &[f64]) -> Vec<ElbowPoint> {
        sse.iter().enumerate().map(|(i, s)| ElbowPoint { k : i + 1, sse : *s }).collect()
    }

    #[test]
    fn bend_of_curve() {
        assert_eq!(recommend_k(&pts(&[100., 40., 10., 8., 7.])), Some(2));
        assert_eq!(recommend_k(&pts(&[100., 90., 20., 18., 17.])), Some(3));
    }

    #[test]
    fn too_few_points() {
        assert_eq!(recommend_k(&pts(&[10., 5.])), None);
        assert_eq!(recommend_k(&[]), None);
    }

    #[test]
    fn one_point_per_k() {
        let ds = Dataset::from_vectors(
            (0..12).map(|i| DVector::from_vec(vec![(i % 4) as f64, (i / 4) as f64])).collect()
        ).unwrap();
        let settings = KMeansSettings { seed : Some(3), ..Default::default() };
        let mut seen = Vec::new();
        let points = sweep(&ds, 1..=4, &settings, |p| seen.push(p.k) ).unwrap();
        assert_eq!(seen, vec![1, 2, 3, 4]);
        assert_eq!(points.len(), 4);

        // With a single cluster the SSE is the total scatter around the mean (1.5, 1.0):
        // x contributes 3 * (2.25 + 0.25 + 0.25 + 2.25), y contributes 4 * (1 + 0 + 1).
        assert!((points[0].sse - 23.0).abs() < 1E-9);
        assert!(points.iter().all(|p| p.sse >= 0.0 ));
    }

}
