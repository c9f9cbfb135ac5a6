use ndarray::ArrayView2;

use crate::clustering::domain::cluster_assignment::ClusterLabel;

/// Domain interface for grouping embeddings by identity.
///
/// Takes one embedding per row and returns one label per row, in row order.
pub trait FaceClusterer: Send {
    fn fit(&self, embeddings: ArrayView2<'_, f32>) -> Vec<ClusterLabel>;
}
