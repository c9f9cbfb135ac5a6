/// Density-based clustering (DBSCAN) over face embeddings.
///
/// A point is a core point when at least `min_samples` points, itself
/// included, lie within `eps` Euclidean distance. Clusters grow from core
/// points through their neighborhoods; border points join the first
/// cluster that reaches them and everything else is noise.
use ndarray::{ArrayView1, ArrayView2};

use crate::clustering::domain::cluster_assignment::ClusterLabel;
use crate::clustering::domain::face_clusterer::FaceClusterer;

pub struct DbscanClusterer {
    eps: f64,
    min_samples: usize,
}

impl DbscanClusterer {
    pub fn new(eps: f64, min_samples: usize) -> Self {
        Self {
            eps,
            min_samples: min_samples.max(1),
        }
    }

    /// Indices within `eps` of every row, each row included in its own list.
    fn neighborhoods(&self, points: ArrayView2<'_, f32>) -> Vec<Vec<usize>> {
        let n = points.nrows();
        let eps_sq = self.eps * self.eps;
        let mut neighbors: Vec<Vec<usize>> = (0..n).map(|i| vec![i]).collect();

        for i in 0..n {
            let a = points.row(i);
            for j in (i + 1)..n {
                if squared_euclidean(a, points.row(j)) <= eps_sq {
                    neighbors[i].push(j);
                    neighbors[j].push(i);
                }
            }
        }
        neighbors
    }
}

impl FaceClusterer for DbscanClusterer {
    fn fit(&self, embeddings: ArrayView2<'_, f32>) -> Vec<ClusterLabel> {
        let n = embeddings.nrows();
        let neighbors = self.neighborhoods(embeddings);
        let is_core: Vec<bool> = neighbors
            .iter()
            .map(|nb| nb.len() >= self.min_samples)
            .collect();

        let mut labels: Vec<Option<u32>> = vec![None; n];
        let mut next_label: u32 = 0;
        let mut stack: Vec<usize> = Vec::new();

        for seed in 0..n {
            if labels[seed].is_some() || !is_core[seed] {
                continue;
            }
            let label = next_label;
            next_label += 1;

            labels[seed] = Some(label);
            stack.push(seed);
            while let Some(point) = stack.pop() {
                if !is_core[point] {
                    continue;
                }
                for &nb in &neighbors[point] {
                    if labels[nb].is_none() {
                        labels[nb] = Some(label);
                        stack.push(nb);
                    }
                }
            }
        }

        log::debug!(
            "DBSCAN (eps={}, min_samples={}) found {next_label} clusters in {n} points",
            self.eps,
            self.min_samples
        );

        labels
            .into_iter()
            .map(|l| l.map_or(ClusterLabel::Noise, ClusterLabel::Identity))
            .collect()
    }
}

fn squared_euclidean(a: ArrayView1<'_, f32>, b: ArrayView1<'_, f32>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = *x as f64 - *y as f64;
            d * d
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};
    use ClusterLabel::{Identity, Noise};

    fn points(rows: &[[f32; 2]]) -> Array2<f32> {
        let flat: Vec<f32> = rows.iter().flatten().copied().collect();
        Array2::from_shape_vec((rows.len(), 2), flat).unwrap()
    }

    #[test]
    fn test_squared_euclidean() {
        let a = array![0.0f32, 0.0];
        let b = array![3.0f32, 4.0];
        assert!((squared_euclidean(a.view(), b.view()) - 25.0).abs() < 1e-12);
    }

    #[test]
    fn test_two_blobs_and_outlier() {
        let data = points(&[
            [0.0, 0.0],
            [0.1, 0.0],
            [0.0, 0.1],
            [10.0, 10.0],
            [10.1, 10.0],
            [10.0, 10.1],
            [50.0, -50.0],
        ]);
        let labels = DbscanClusterer::new(0.5, 3).fit(data.view());
        assert_eq!(
            labels,
            vec![
                Identity(0),
                Identity(0),
                Identity(0),
                Identity(1),
                Identity(1),
                Identity(1),
                Noise
            ]
        );
    }

    #[test]
    fn test_chain_connects_through_core_points() {
        // Each point is within eps of its neighbors only; density-reachability
        // links the whole chain into one cluster.
        let data = points(&[[0.0, 0.0], [1.0, 0.0], [2.0, 0.0], [3.0, 0.0], [4.0, 0.0]]);
        let labels = DbscanClusterer::new(1.0, 2).fit(data.view());
        assert!(labels.iter().all(|l| *l == Identity(0)));
    }

    #[test]
    fn test_border_point_joins_but_does_not_expand() {
        // Point 4 sits next to core point 3 but has too few neighbors to be
        // core itself; point 5 neighbors only point 4 and stays noise.
        let data = points(&[
            [0.0, 0.0],
            [0.2, 0.0],
            [0.4, 0.0],
            [0.6, 0.0],
            [1.5, 0.0],
            [2.4, 0.0],
        ]);
        let labels = DbscanClusterer::new(1.0, 4).fit(data.view());
        assert_eq!(
            labels,
            vec![
                Identity(0),
                Identity(0),
                Identity(0),
                Identity(0),
                Identity(0),
                Noise
            ]
        );
    }

    #[test]
    fn test_single_point_with_min_samples_one_is_identity() {
        let data = points(&[[1.0, 1.0]]);
        assert_eq!(DbscanClusterer::new(0.5, 1).fit(data.view()), vec![Identity(0)]);
    }

    #[test]
    fn test_single_point_with_default_density_is_noise() {
        let data = points(&[[1.0, 1.0]]);
        assert_eq!(DbscanClusterer::new(0.5, 5).fit(data.view()), vec![Noise]);
    }

    #[test]
    fn test_empty_input() {
        let data = Array2::<f32>::zeros((0, 8));
        assert!(DbscanClusterer::new(0.5, 5).fit(data.view()).is_empty());
    }

    #[test]
    fn test_boundary_distance_is_inclusive() {
        let data = points(&[[0.0, 0.0], [0.5, 0.0]]);
        let labels = DbscanClusterer::new(0.5, 2).fit(data.view());
        assert_eq!(labels, vec![Identity(0), Identity(0)]);
    }

    #[test]
    fn test_zero_min_samples_is_clamped() {
        let data = points(&[[0.0, 0.0], [100.0, 0.0]]);
        let labels = DbscanClusterer::new(0.5, 0).fit(data.view());
        assert_eq!(labels, vec![Identity(0), Identity(1)]);
    }
}
