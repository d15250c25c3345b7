//! Separable derivative estimators.
//!
//! A stencil estimates one partial derivative of a batch by chaining
//! one-sample passes along each axis: `order` differences followed by
//! `kernel - 1 - order` smoothing sums. Every stencil with the same kernel
//! therefore shrinks the batch by exactly `kernel - 1` on each axis, so
//! terms of any derivative order line up voxel for voxel.

use super::FeatureError;
use crate::config::FeatureMode;
use crate::field::{self, Batch, DEPTH, HEIGHT, TIME, WIDTH};
use ndarray::{ArrayView4, Zip};

const AXIS_NAMES: [char; 4] = ['t', 'z', 'y', 'x'];

/// Estimator of one partial derivative, in batch axis order `(t, z, y, x)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stencil {
    orders: [usize; 4],
    kernel: [usize; 4],
}

impl Stencil {
    /// Creates a stencil taking `orders[a]` differences along axis `a`.
    ///
    /// Fails when an axis asks for more differences than its kernel has
    /// passes.
    pub fn new(orders: [usize; 4], kernel: [usize; 4]) -> Result<Self, FeatureError> {
        for axis in 0..4 {
            if orders[axis] > 0 && orders[axis] >= kernel[axis] {
                return Err(FeatureError::InsufficientKernel {
                    axis: AXIS_NAMES[axis],
                    order: orders[axis],
                    size: kernel[axis],
                });
            }
        }
        Ok(Self { orders, kernel })
    }

    /// Derivative order per axis.
    pub fn orders(&self) -> [usize; 4] {
        self.orders
    }

    /// Applies the stencil, returning a batch shrunk by `kernel - 1` per axis.
    pub fn apply(&self, batch: ArrayView4<'_, f32>) -> Batch {
        let mut current: Option<Batch> = None;
        for axis in 0..4 {
            for pass in 0..self.kernel[axis].saturating_sub(1) {
                let input = current.as_ref().map_or(batch.view(), |b| b.view());
                let next = if pass < self.orders[axis] {
                    field::difference(input, axis)
                } else {
                    field::smooth(input, axis)
                };
                current = Some(next);
            }
        }
        current.unwrap_or_else(|| batch.to_owned())
    }
}

/// A weighted, squared stencil response.
#[derive(Debug, Clone)]
pub struct FeatureTerm {
    pub stencil: Stencil,
    pub weight: f32,
}

/// The derivative terms of one feature mode, evaluated together.
#[derive(Debug, Clone)]
pub struct FeatureSet {
    terms: Vec<FeatureTerm>,
    kernel: [usize; 4],
}

impl FeatureSet {
    /// Builds the derivative terms for `mode`.
    ///
    /// `kernel` is in batch axis order; planar data skips the depth axis.
    pub fn new(mode: FeatureMode, kernel: [usize; 4], volumetric: bool) -> Result<Self, FeatureError> {
        let axes: &[usize] = if volumetric {
            &[TIME, DEPTH, HEIGHT, WIDTH]
        } else {
            &[TIME, HEIGHT, WIDTH]
        };

        let term = |orders: [usize; 4], weight: f32| -> Result<FeatureTerm, FeatureError> {
            Ok(FeatureTerm {
                stencil: Stencil::new(orders, kernel)?,
                weight,
            })
        };

        let mut terms = Vec::new();
        match mode {
            FeatureMode::Full | FeatureMode::Diagonal => {
                for &axis in axes {
                    let mut orders = [0; 4];
                    orders[axis] = 2;
                    terms.push(term(orders, 1.0)?);
                }
                if mode == FeatureMode::Full {
                    for (i, &a) in axes.iter().enumerate() {
                        for &b in &axes[i + 1..] {
                            let mut orders = [0; 4];
                            orders[a] = 1;
                            orders[b] = 1;
                            terms.push(term(orders, 2.0)?);
                        }
                    }
                }
            }
            FeatureMode::Motion => {
                let spatial: &[usize] = if volumetric {
                    &[WIDTH, HEIGHT, DEPTH]
                } else {
                    &[WIDTH, HEIGHT]
                };
                for &axis in spatial {
                    let mut orders = [0; 4];
                    orders[TIME] = 2;
                    orders[axis] = 1;
                    terms.push(term(orders, 1.0)?);
                }
            }
        }
        Ok(Self { terms, kernel })
    }

    pub fn terms(&self) -> &[FeatureTerm] {
        &self.terms
    }

    /// Shape of the feature field of a batch with shape `dim`.
    pub fn output_dim(&self, dim: (usize, usize, usize, usize)) -> (usize, usize, usize, usize) {
        let shrink = |n: usize, axis: usize| (n + 1).saturating_sub(self.kernel[axis]);
        (
            shrink(dim.0, TIME),
            shrink(dim.1, DEPTH),
            shrink(dim.2, HEIGHT),
            shrink(dim.3, WIDTH),
        )
    }

    /// Weighted sum of squared responses of every term.
    pub fn evaluate(&self, batch: ArrayView4<'_, f32>) -> Batch {
        let mut total = Batch::zeros(self.output_dim(batch.dim()));
        for term in &self.terms {
            let estimate = term.stencil.apply(batch.view());
            let weight = term.weight;
            Zip::from(&mut total)
                .and(&estimate)
                .par_for_each(|a, &v| *a += weight * v * v);
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array4;

    #[test]
    fn test_second_difference_of_quadratic() {
        let batch = Array4::from_shape_fn((3, 1, 1, 1), |(t, _, _, _)| (t * t) as f32);
        let stencil = Stencil::new([2, 0, 0, 0], [3, 1, 1, 1]).unwrap();

        let out = stencil.apply(batch.view());
        assert_eq!(out.dim(), (1, 1, 1, 1));
        assert_eq!(out[[0, 0, 0, 0]], 2.0);
    }

    #[test]
    fn test_mixed_partial_of_product() {
        // f = t * x: one difference then one smoothing pass per axis
        let batch = Array4::from_shape_fn((3, 1, 1, 3), |(t, _, _, x)| (t * x) as f32);
        let stencil = Stencil::new([1, 0, 0, 1], [3, 1, 1, 3]).unwrap();

        let out = stencil.apply(batch.view());
        assert_eq!(out.dim(), (1, 1, 1, 1));
        assert_eq!(out[[0, 0, 0, 0]], 4.0);
    }

    #[test]
    fn test_every_term_shrinks_equally() {
        let batch = Array4::from_shape_fn((6, 5, 5, 5), |(t, z, y, x)| (t + z * y + x) as f32);
        let kernel = [4, 3, 3, 5];
        let features = FeatureSet::new(FeatureMode::Full, kernel, true).unwrap();
        for term in features.terms() {
            assert_eq!(term.stencil.apply(batch.view()).dim(), (3, 3, 3, 1));
        }
    }

    #[test]
    fn test_term_counts() {
        let k = [3, 3, 3, 3];
        let planar = [3, 1, 3, 3];
        assert_eq!(FeatureSet::new(FeatureMode::Full, k, true).unwrap().terms().len(), 10);
        assert_eq!(FeatureSet::new(FeatureMode::Full, planar, false).unwrap().terms().len(), 6);
        assert_eq!(FeatureSet::new(FeatureMode::Diagonal, k, true).unwrap().terms().len(), 4);
        assert_eq!(FeatureSet::new(FeatureMode::Diagonal, planar, false).unwrap().terms().len(), 3);
        assert_eq!(FeatureSet::new(FeatureMode::Motion, k, true).unwrap().terms().len(), 3);
        assert_eq!(FeatureSet::new(FeatureMode::Motion, planar, false).unwrap().terms().len(), 2);
    }

    #[test]
    fn test_mixed_terms_weighted_twice() {
        let features = FeatureSet::new(FeatureMode::Full, [3, 1, 3, 3], false).unwrap();
        for term in features.terms() {
            let mixed = term.stencil.orders().iter().filter(|&&o| o == 1).count() == 2;
            assert_eq!(term.weight, if mixed { 2.0 } else { 1.0 });
        }
    }

    #[test]
    fn test_order_exceeding_kernel_rejected() {
        assert!(matches!(
            Stencil::new([3, 0, 0, 0], [3, 3, 3, 3]),
            Err(FeatureError::InsufficientKernel { axis: 't', order: 3, size: 3 })
        ));
        // planar depth has no passes at all
        assert!(Stencil::new([0, 1, 0, 0], [3, 1, 3, 3]).is_err());
    }

    #[test]
    fn test_feature_field_sums_squares() {
        let batch = Array4::from_shape_fn((3, 1, 1, 3), |(t, _, _, x)| (t * x) as f32);
        let features = FeatureSet {
            terms: vec![FeatureTerm {
                stencil: Stencil::new([1, 0, 0, 1], [3, 1, 1, 3]).unwrap(),
                weight: 2.0,
            }],
            kernel: [3, 1, 1, 3],
        };
        let out = features.evaluate(batch.view());
        assert_eq!(out.dim(), (1, 1, 1, 1));
        assert_eq!(out[[0, 0, 0, 0]], 32.0);
    }

    #[test]
    fn test_feature_field_matches_window_shape() {
        let batch = Array4::from_elem((5, 4, 6, 7), 1.0);
        let features = FeatureSet::new(FeatureMode::Motion, [3, 3, 5, 3], true).unwrap();

        let out = features.evaluate(batch.view());
        assert_eq!(out.dim(), (3, 2, 2, 5));
        assert_eq!(out.dim(), features.output_dim(batch.dim()));
        assert!(out.iter().all(|&v| v == 0.0));
    }
}
