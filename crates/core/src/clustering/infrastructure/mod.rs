pub mod dbscan_clusterer;
