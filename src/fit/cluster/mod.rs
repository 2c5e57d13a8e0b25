use nalgebra::DVector;

/// Centroid-based (or prototype-based) clustering implementation
pub mod center;

/// Types which can be thought of as living in a space and can have their distance compared.
/// The generic type parameter M designates a metric, usually a zero-sized type used just to
/// disambiguate between the implementations a type offers.
pub trait Distance<M>
where
    M : ?Sized
{

    fn distance(&self, other : &Self) -> f64;

}

/// Straight-line distance.
pub struct Euclidian { }

/// Euclidian distance without the final square root; preserves the ordering of
/// Euclidian distances and is the quantity summed by the SSE.
pub struct SquaredEuclidian { }

impl Distance<SquaredEuclidian> for [f64] {

    fn distance(&self, other : &Self) -> f64 {
        assert!(self.len() == other.len());
        self.iter().zip(other.iter())
            .map(|(a, b)| (a - b).powi(2) )
            .sum::<f64>()
    }

}

impl Distance<Euclidian> for [f64] {

    fn distance(&self, other : &Self) -> f64 {
        Distance::<SquaredEuclidian>::distance(self, other).sqrt()
    }

}

impl Distance<Euclidian> for DVector<f64> {

    fn distance(&self, other : &Self) -> f64 {
        Distance::<Euclidian>::distance(self.as_slice(), other.as_slice())
    }

}

impl Distance<SquaredEuclidian> for DVector<f64> {

    fn distance(&self, other : &Self) -> f64 {
        Distance::<SquaredEuclidian>::distance(self.as_slice(), other.as_slice())
    }

}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn euclidian_distance() {
        let a = DVector::from_vec(vec![0., 0.]);
        let b = DVector::from_vec(vec![3., 4.]);
        assert_eq!(Distance::<Euclidian>::distance(&a, &b), 5.);
        assert_eq!(Distance::<SquaredEuclidian>::distance(&a, &b), 25.);
        assert_eq!(Distance::<Euclidian>::distance(&b, &b), 0.);
    }

}
