pub mod cluster_assignment;
pub mod face_clusterer;
pub mod sampler;
