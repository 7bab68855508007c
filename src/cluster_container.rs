use std::cell::OnceCell;
use std::collections::{BTreeMap, BTreeSet, HashSet};

use itertools::Itertools;

use crate::cluster::{Cluster, LocationType};

/// Lazily built indexes over `ClusterContainer::clusters`.  Index values are
/// positions in that vector, kept in insertion order for equal keys.
///
/// The container replaces this wholesale on every `&mut self` mutation, and
/// everything handed out borrows the container, so a view can never be read
/// after the clusters it describes have changed.
#[derive(Clone, Debug, Default)]
struct SortedViews {
    by_key: OnceCell<BTreeMap<i32, Vec<usize>>>,
    by_name: OnceCell<BTreeMap<String, Vec<usize>>>,
    sorted_by_key: OnceCell<Vec<usize>>,
    sorted_by_name: OnceCell<Vec<usize>>,
    keys: OnceCell<Vec<i32>>,
}

/// Owns a collection of clusters and answers key/name queries about them.
#[derive(Clone, Debug, Default)]
pub struct ClusterContainer {
    clusters: Vec<Cluster>,
    /// Label keys known to the label table that no cluster uses.
    keys_not_in_any_cluster: BTreeSet<i32>,
    views: SortedViews,
}

impl ClusterContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_cluster(&mut self, cluster: Cluster) {
        self.clusters.push(cluster);
        self.invalidate();
    }

    pub fn clear(&mut self) {
        self.clusters.clear();
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.views = SortedViews::default();
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Clusters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Cluster> {
        self.clusters.iter()
    }

    fn key_index(&self) -> &BTreeMap<i32, Vec<usize>> {
        self.views.by_key.get_or_init(|| {
            let mut index: BTreeMap<i32, Vec<usize>> = BTreeMap::new();
            for (i, cluster) in self.clusters.iter().enumerate() {
                index.entry(cluster.key()).or_default().push(i);
            }
            index
        })
    }

    fn name_index(&self) -> &BTreeMap<String, Vec<usize>> {
        self.views.by_name.get_or_init(|| {
            let mut index: BTreeMap<String, Vec<usize>> = BTreeMap::new();
            for (i, cluster) in self.clusters.iter().enumerate() {
                index.entry(cluster.name().to_string()).or_default().push(i);
            }
            index
        })
    }

    fn resolve(&self, indices: &[usize]) -> Vec<&Cluster> {
        indices.iter().map(|&i| &self.clusters[i]).collect()
    }

    pub fn clusters_sorted_by_key(&self) -> Vec<&Cluster> {
        let sorted = self
            .views
            .sorted_by_key
            .get_or_init(|| self.key_index().values().flatten().copied().collect());
        self.resolve(sorted)
    }

    pub fn clusters_sorted_by_name(&self) -> Vec<&Cluster> {
        let sorted = self
            .views
            .sorted_by_name
            .get_or_init(|| self.name_index().values().flatten().copied().collect());
        self.resolve(sorted)
    }

    /// All clusters with the given key in insertion order; empty if none.
    pub fn clusters_with_key(&self, key: i32) -> Vec<&Cluster> {
        match self.key_index().get(&key) {
            Some(indices) => self.resolve(indices),
            None => Vec::new(),
        }
    }

    pub fn clusters_with_name(&self, name: &str) -> Vec<&Cluster> {
        match self.name_index().get(name) {
            Some(indices) => self.resolve(indices),
            None => Vec::new(),
        }
    }

    pub fn add_key_not_in_any_cluster(&mut self, key: i32) {
        self.keys_not_in_any_cluster.insert(key);
    }

    /// Keys that don't map to any brainordinates.
    pub fn keys_not_in_any_cluster(&self) -> &BTreeSet<i32> {
        &self.keys_not_in_any_cluster
    }

    /// Distinct keys of all clusters, ascending.
    pub fn all_cluster_keys(&self) -> &[i32] {
        self.views
            .keys
            .get_or_init(|| self.key_index().keys().copied().collect())
    }

    /// Merge clusters sharing a key into at most one cluster per location
    /// type.
    ///
    /// Central clusters are first split along X = 0 and the halves are added
    /// to this container, where they take the split cluster's place in the
    /// merge.  The returned container holds, for each key, the union of the
    /// unknown, central, left and right clusters (in that order, skipping
    /// empty buckets).
    pub fn merge_disjoint_right_left_clusters(&mut self) -> ClusterContainer {
        let all_keys = self.all_cluster_keys().to_vec();

        let mut split_indices = HashSet::new();
        let mut split_clusters = Vec::new();
        for (index, cluster) in self.clusters.iter().enumerate() {
            if cluster.location_type() != LocationType::Central {
                continue;
            }
            let halves = cluster.split_into_right_and_left();
            if !halves.is_empty() {
                split_indices.insert(index);
                split_clusters.extend(halves);
            }
        }
        for cluster in split_clusters {
            self.add_cluster(cluster);
        }

        let mut merged = ClusterContainer::new();
        let key_index = self.key_index();
        for key in all_keys {
            let mut buckets: [Option<Cluster>; 4] = [None, None, None, None];
            for &index in key_index.get(&key).map(Vec::as_slice).unwrap_or_default() {
                if split_indices.contains(&index) {
                    continue;
                }
                let cluster = &self.clusters[index];
                match &mut buckets[bucket_index(cluster.location_type())] {
                    Some(bucket) => bucket.merge_coordinates(cluster),
                    slot => *slot = Some(cluster.clone()),
                }
            }
            for cluster in buckets.into_iter().flatten() {
                merged.add_cluster(cluster);
            }
        }

        debug!(
            "merged {} clusters into {} for {} keys",
            self.clusters.len(),
            merged.len(),
            merged.all_cluster_keys().len()
        );
        merged
    }

    /// A text table of every cluster sorted by name.
    pub fn clusters_formatted_string(&self) -> String {
        let clusters = self.clusters_sorted_by_name();
        if clusters.is_empty() {
            return "No clusters were found.".to_string();
        }

        let mut rows = vec![vec![
            "Key".to_string(),
            "Count".to_string(),
            "X".to_string(),
            "Y".to_string(),
            "Z".to_string(),
            "Location".to_string(),
            format!("Cluster Name  ({} total clusters)", clusters.len()),
        ]];
        for cluster in &clusters {
            let cog = cluster
                .center_of_gravity()
                .map(|xyz| xyz.map(|v| format!("{:.2}", v)))
                .unwrap_or_default();
            let [x, y, z] = cog;
            rows.push(vec![
                cluster.key().to_string(),
                cluster.number_of_brainordinates().to_string(),
                x,
                y,
                z,
                cluster.location_type().name().to_string(),
                cluster.name().to_string(),
            ]);
        }

        // Numeric columns are right aligned, the rest left aligned.
        const RIGHT_ALIGNED_COLUMNS: usize = 5;
        let widths: Vec<usize> = (0..rows[0].len())
            .map(|column| rows.iter().map(|row| row[column].len()).max().unwrap_or(0))
            .collect();
        rows.iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .map(|(column, cell)| {
                        if column < RIGHT_ALIGNED_COLUMNS {
                            format!("{:>width$}", cell, width = widths[column])
                        } else {
                            format!("{:<width$}", cell, width = widths[column])
                        }
                    })
                    .join("  ")
                    .trim_end()
                    .to_string()
            })
            .join("\n")
    }
}

fn bucket_index(location: LocationType) -> usize {
    match location {
        LocationType::Unknown => 0,
        LocationType::Central => 1,
        LocationType::Left => 2,
        LocationType::Right => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container() -> ClusterContainer {
        let mut container = ClusterContainer::new();
        container.add_cluster(Cluster::new("beta", 7, vec![[1.0, 0.0, 0.0]]));
        container.add_cluster(Cluster::new("alpha", 3, vec![[-1.0, 0.0, 0.0]]));
        container.add_cluster(Cluster::new("gamma", 7, vec![[-3.0, 0.0, 0.0]]));
        container
    }

    #[test]
    fn test_lookup_by_key_and_name() {
        let container = container();
        let sevens: Vec<&str> = container
            .clusters_with_key(7)
            .iter()
            .map(|c| c.name())
            .collect();
        assert_eq!(sevens, vec!["beta", "gamma"]);
        assert!(container.clusters_with_key(99).is_empty());
        assert_eq!(container.clusters_with_name("alpha").len(), 1);
        assert!(container.clusters_with_name("delta").is_empty());
    }

    #[test]
    fn test_sorted_views_follow_mutation() {
        let mut container = container();
        let by_key: Vec<i32> = container
            .clusters_sorted_by_key()
            .iter()
            .map(|c| c.key())
            .collect();
        assert_eq!(by_key, vec![3, 7, 7]);
        assert_eq!(container.all_cluster_keys(), &[3, 7]);

        container.add_cluster(Cluster::new("aardvark", 1, vec![[2.0, 2.0, 2.0]]));
        let by_name: Vec<&str> = container
            .clusters_sorted_by_name()
            .iter()
            .map(|c| c.name())
            .collect();
        assert_eq!(by_name, vec!["aardvark", "alpha", "beta", "gamma"]);
        assert_eq!(container.all_cluster_keys(), &[1, 3, 7]);
        assert_eq!(container.clusters_with_key(1).len(), 1);

        container.clear();
        assert!(container.clusters_sorted_by_key().is_empty());
        assert!(container.all_cluster_keys().is_empty());
    }

    #[test]
    fn test_keys_not_in_any_cluster() {
        let mut container = container();
        container.add_key_not_in_any_cluster(12);
        container.add_key_not_in_any_cluster(4);
        container.add_key_not_in_any_cluster(12);
        assert_eq!(
            container.keys_not_in_any_cluster().iter().copied().collect::<Vec<_>>(),
            vec![4, 12]
        );
    }

    #[test]
    fn test_merge_splits_central_into_left_and_right() {
        let mut container = ClusterContainer::new();
        container.add_cluster(Cluster::new(
            "five",
            5,
            vec![[-1.0, 0.0, 0.0], [1.0, 0.0, 0.0]],
        ));
        container.add_cluster(Cluster::new("five", 5, vec![[-5.0, 1.0, 0.0]]));
        container.add_cluster(Cluster::new("five", 5, vec![[5.0, 1.0, 0.0]]));

        let merged = container.merge_disjoint_right_left_clusters();
        // The split halves were added to the input container.
        assert_eq!(container.len(), 5);

        let fives = merged.clusters_with_key(5);
        assert_eq!(fives.len(), 2);
        assert_eq!(fives[0].location_type(), LocationType::Left);
        assert_eq!(fives[0].coordinates(), &[[-5.0, 1.0, 0.0], [-1.0, 0.0, 0.0]]);
        assert_eq!(fives[1].location_type(), LocationType::Right);
        assert_eq!(fives[1].coordinates(), &[[5.0, 1.0, 0.0], [1.0, 0.0, 0.0]]);
    }

    #[test]
    fn test_merge_keeps_unknown_separate() {
        let mut container = ClusterContainer::new();
        container.add_cluster(Cluster::with_location(
            "u",
            2,
            LocationType::Unknown,
            vec![[1.0, 1.0, 1.0]],
        ));
        container.add_cluster(Cluster::new("r", 2, vec![[2.0, 2.0, 2.0]]));
        container.add_cluster(Cluster::new("r2", 2, vec![[3.0, 2.0, 2.0]]));
        container.add_cluster(Cluster::new("only-unknown", 8, vec![]));

        let merged = container.merge_disjoint_right_left_clusters();
        let twos = merged.clusters_with_key(2);
        assert_eq!(twos.len(), 2);
        assert_eq!(twos[0].location_type(), LocationType::Unknown);
        assert_eq!(twos[1].location_type(), LocationType::Right);
        assert_eq!(twos[1].name(), "r");
        assert_eq!(twos[1].number_of_brainordinates(), 2);

        let eights = merged.clusters_with_key(8);
        assert_eq!(eights.len(), 1);
        assert_eq!(eights[0].location_type(), LocationType::Unknown);
    }

    #[test]
    fn test_formatted_string() {
        assert_eq!(
            ClusterContainer::new().clusters_formatted_string(),
            "No clusters were found."
        );

        let mut container = ClusterContainer::new();
        container.add_cluster(Cluster::new("V1", 12, vec![[-10.0, 2.0, 4.0]]));
        let text = container.clusters_formatted_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Key  Count       X     Y     Z  Location"));
        assert!(lines[0].ends_with("Cluster Name  (1 total clusters)"));
        assert_eq!(lines[1], " 12      1  -10.00  2.00  4.00  Left      V1");
    }
}
