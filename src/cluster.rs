use std::collections::HashSet;
use std::fmt;

pub type Vector3 = [f32; 3];

/// Which side of the X = 0 midline a cluster's brainordinates lie on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LocationType {
    Unknown,
    Central,
    Left,
    Right,
}

impl LocationType {
    pub fn name(&self) -> &'static str {
        match self {
            LocationType::Unknown => "Unknown",
            LocationType::Central => "Central",
            LocationType::Left => "Left",
            LocationType::Right => "Right",
        }
    }

    /// Negative X is left, positive X is right; anything straddling or
    /// touching the midline is central.
    pub fn from_coordinates(coordinates: &[Vector3]) -> LocationType {
        if coordinates.is_empty() {
            return LocationType::Unknown;
        }
        if coordinates.iter().all(|xyz| xyz[0] < 0.0) {
            LocationType::Left
        } else if coordinates.iter().all(|xyz| xyz[0] > 0.0) {
            LocationType::Right
        } else {
            LocationType::Central
        }
    }
}

impl fmt::Display for LocationType {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str(self.name())
    }
}

/// A group of brainordinates sharing a label key.
///
/// Coordinates behave as a set: merging or constructing with an identical
/// coordinate twice keeps a single copy.
#[derive(Clone, Debug, PartialEq)]
pub struct Cluster {
    name: String,
    key: i32,
    location: LocationType,
    coordinates: Vec<Vector3>,
    center_of_gravity: Option<Vector3>,
}

impl Cluster {
    /// Create a cluster whose location is derived from its coordinates.
    pub fn new(name: &str, key: i32, coordinates: Vec<Vector3>) -> Self {
        let location = LocationType::from_coordinates(&coordinates);
        Self::with_location(name, key, location, coordinates)
    }

    pub fn with_location(
        name: &str,
        key: i32,
        location: LocationType,
        coordinates: Vec<Vector3>,
    ) -> Self {
        let mut cluster = Cluster {
            name: name.to_string(),
            key,
            location,
            coordinates: Vec::with_capacity(coordinates.len()),
            center_of_gravity: None,
        };
        cluster.extend_coordinates(&coordinates);
        cluster
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> i32 {
        self.key
    }

    pub fn location_type(&self) -> LocationType {
        self.location
    }

    pub fn coordinates(&self) -> &[Vector3] {
        &self.coordinates
    }

    pub fn number_of_brainordinates(&self) -> usize {
        self.coordinates.len()
    }

    /// Mean of the coordinates, `None` for an empty cluster.
    pub fn center_of_gravity(&self) -> Option<Vector3> {
        self.center_of_gravity
    }

    /// Union `other`'s coordinates into this cluster and recompute the
    /// center of gravity.  Name, key and location are kept.
    pub fn merge_coordinates(&mut self, other: &Cluster) {
        self.extend_coordinates(&other.coordinates);
    }

    /// Split a cluster along X = 0 into a left (X < 0) and a right (X >= 0)
    /// cluster.  Halves without coordinates are omitted.
    pub fn split_into_right_and_left(&self) -> Vec<Cluster> {
        let (left, right): (Vec<Vector3>, Vec<Vector3>) =
            self.coordinates.iter().partition(|xyz| xyz[0] < 0.0);

        let mut clusters = Vec::new();
        if !left.is_empty() {
            clusters.push(Cluster::with_location(
                &self.name,
                self.key,
                LocationType::Left,
                left,
            ));
        }
        if !right.is_empty() {
            clusters.push(Cluster::with_location(
                &self.name,
                self.key,
                LocationType::Right,
                right,
            ));
        }
        clusters
    }

    fn extend_coordinates(&mut self, coordinates: &[Vector3]) {
        let mut seen: HashSet<[u32; 3]> = self.coordinates.iter().map(coordinate_bits).collect();
        for xyz in coordinates {
            if seen.insert(coordinate_bits(xyz)) {
                self.coordinates.push(*xyz);
            }
        }
        self.center_of_gravity = center_of_gravity(&self.coordinates);
    }
}

fn coordinate_bits(xyz: &Vector3) -> [u32; 3] {
    [xyz[0].to_bits(), xyz[1].to_bits(), xyz[2].to_bits()]
}

/// Mean position of `coordinates`, accumulated in double precision.
pub fn center_of_gravity(coordinates: &[Vector3]) -> Option<Vector3> {
    if coordinates.is_empty() {
        return None;
    }
    let mut sum = [0.0f64; 3];
    for xyz in coordinates {
        for axis in 0..3 {
            sum[axis] += xyz[axis] as f64;
        }
    }
    let count = coordinates.len() as f64;
    Some([
        (sum[0] / count) as f32,
        (sum[1] / count) as f32,
        (sum[2] / count) as f32,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_from_coordinates() {
        assert_eq!(LocationType::from_coordinates(&[]), LocationType::Unknown);
        assert_eq!(
            LocationType::from_coordinates(&[[-1.0, 0.0, 0.0], [-2.0, 5.0, 5.0]]),
            LocationType::Left
        );
        assert_eq!(
            LocationType::from_coordinates(&[[1.0, 0.0, 0.0]]),
            LocationType::Right
        );
        assert_eq!(
            LocationType::from_coordinates(&[[-1.0, 0.0, 0.0], [1.0, 0.0, 0.0]]),
            LocationType::Central
        );
        assert_eq!(
            LocationType::from_coordinates(&[[0.0, 0.0, 0.0]]),
            LocationType::Central
        );
    }

    #[test]
    fn test_merge_coordinates_is_a_union() {
        let mut a = Cluster::new("a", 3, vec![[-2.0, 0.0, 0.0], [-4.0, 0.0, 0.0]]);
        let b = Cluster::new("b", 3, vec![[-4.0, 0.0, 0.0], [-6.0, 3.0, 0.0]]);
        a.merge_coordinates(&b);

        assert_eq!(a.number_of_brainordinates(), 3);
        assert_eq!(a.name(), "a");
        assert_eq!(a.location_type(), LocationType::Left);
        assert_eq!(a.center_of_gravity(), Some([-4.0, 1.0, 0.0]));
    }

    #[test]
    fn test_duplicate_coordinates_collapse() {
        let cluster = Cluster::new("a", 1, vec![[1.0, 1.0, 1.0], [1.0, 1.0, 1.0]]);
        assert_eq!(cluster.coordinates(), &[[1.0, 1.0, 1.0]]);
    }

    #[test]
    fn test_split_into_right_and_left() {
        let central = Cluster::new(
            "midline",
            5,
            vec![[-1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [2.0, 2.0, 0.0]],
        );
        assert_eq!(central.location_type(), LocationType::Central);

        let halves = central.split_into_right_and_left();
        assert_eq!(halves.len(), 2);
        assert_eq!(halves[0].location_type(), LocationType::Left);
        assert_eq!(halves[0].coordinates(), &[[-1.0, 0.0, 0.0]]);
        assert_eq!(halves[1].location_type(), LocationType::Right);
        assert_eq!(halves[1].coordinates(), &[[0.0, 1.0, 0.0], [2.0, 2.0, 0.0]]);
        assert!(halves.iter().all(|c| c.key() == 5 && c.name() == "midline"));

        let empty = Cluster::with_location("empty", 1, LocationType::Central, vec![]);
        assert!(empty.split_into_right_and_left().is_empty());
        assert_eq!(empty.center_of_gravity(), None);
    }
}
