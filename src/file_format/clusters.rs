use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::cluster::{Cluster, Vector3};
use crate::cluster_container::ClusterContainer;
use crate::errors::{LabelTreeError, Result};

/// Schema of cluster JSON files, as written by the parcellation tooling.
#[derive(Clone, Debug, Deserialize)]
struct ClusterFileJson {
    clusters: Vec<ClusterJson>,
    #[serde(default)]
    keys_not_in_any_cluster: Vec<i32>,
}

#[derive(Clone, Debug, Deserialize)]
struct ClusterJson {
    name: String,
    key: i32,
    #[serde(default)]
    coordinates: Vec<Vector3>,
}

pub fn read_cluster_container(text: &str) -> Result<ClusterContainer> {
    let parsed: ClusterFileJson = serde_json::from_str(text)
        .map_err(|err| LabelTreeError::Clusters(err.to_string()))?;

    let mut container = ClusterContainer::new();
    for cluster in parsed.clusters {
        container.add_cluster(Cluster::new(&cluster.name, cluster.key, cluster.coordinates));
    }
    for key in parsed.keys_not_in_any_cluster {
        container.add_key_not_in_any_cluster(key);
    }
    info!(
        "read {} clusters covering {} keys",
        container.len(),
        container.all_cluster_keys().len()
    );
    Ok(container)
}

pub fn read_cluster_container_file(path: &Path) -> Result<ClusterContainer> {
    let text = fs::read_to_string(path)?;
    read_cluster_container(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::LocationType;

    #[test]
    fn test_read_cluster_container() {
        let container = read_cluster_container(
            r#"{
                "clusters": [
                    { "name": "V1", "key": 1, "coordinates": [[-4, 0, 0], [-2, 2, 0]] },
                    { "name": "V1", "key": 1, "coordinates": [[3, 0, 0]] },
                    { "name": "empty", "key": 9 }
                ],
                "keys_not_in_any_cluster": [5]
            }"#,
        )
        .unwrap();

        assert_eq!(container.len(), 3);
        let ones = container.clusters_with_key(1);
        assert_eq!(ones[0].location_type(), LocationType::Left);
        assert_eq!(ones[0].center_of_gravity(), Some([-3.0, 1.0, 0.0]));
        assert_eq!(ones[1].location_type(), LocationType::Right);
        assert_eq!(
            container.clusters_with_key(9)[0].location_type(),
            LocationType::Unknown
        );
        assert!(container.keys_not_in_any_cluster().contains(&5));
    }

    #[test]
    fn test_read_cluster_container_errors() {
        let err = read_cluster_container(r#"{ "clusters": [{ "key": 1 }] }"#).unwrap_err();
        assert!(err.to_string().starts_with("Cluster file error: "));
    }
}
