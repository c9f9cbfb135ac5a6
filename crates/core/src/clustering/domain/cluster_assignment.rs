use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity label of one detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum ClusterLabel {
    Identity(u32),
    /// Not dense enough to belong to any identity.
    Noise,
}

impl ClusterLabel {
    /// Wire value of the noise sentinel.
    pub const NOISE_VALUE: i64 = -1;

    pub fn identity(&self) -> Option<u32> {
        match self {
            ClusterLabel::Identity(id) => Some(*id),
            ClusterLabel::Noise => None,
        }
    }

    pub fn is_noise(&self) -> bool {
        matches!(self, ClusterLabel::Noise)
    }
}

impl From<ClusterLabel> for i64 {
    fn from(label: ClusterLabel) -> Self {
        match label {
            ClusterLabel::Identity(id) => id as i64,
            ClusterLabel::Noise => ClusterLabel::NOISE_VALUE,
        }
    }
}

impl TryFrom<i64> for ClusterLabel {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            ClusterLabel::NOISE_VALUE => Ok(ClusterLabel::Noise),
            v => u32::try_from(v)
                .map(ClusterLabel::Identity)
                .map_err(|_| format!("invalid cluster label {v}")),
        }
    }
}

impl fmt::Display for ClusterLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusterLabel::Identity(id) => write!(f, "{id}"),
            ClusterLabel::Noise => write!(f, "noise"),
        }
    }
}

/// All detections sharing one label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterAssignment {
    pub label: ClusterLabel,
    pub member_indices: Vec<usize>,
}

/// Groups per-detection labels into assignments.
///
/// Identities come first in label order, followed by a single noise
/// assignment when any detection is noise. Member indices ascend.
pub fn group_labels(labels: &[ClusterLabel]) -> Vec<ClusterAssignment> {
    let mut groups: BTreeMap<ClusterLabel, Vec<usize>> = BTreeMap::new();
    for (index, label) in labels.iter().enumerate() {
        groups.entry(*label).or_default().push(index);
    }
    groups
        .into_iter()
        .map(|(label, member_indices)| ClusterAssignment {
            label,
            member_indices,
        })
        .collect()
}

/// Number of distinct identities, noise excluded.
pub fn identity_count(assignments: &[ClusterAssignment]) -> usize {
    assignments.iter().filter(|a| !a.label.is_noise()).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use ClusterLabel::{Identity, Noise};

    #[test]
    fn test_group_labels_partitions_indices() {
        let labels = vec![Identity(1), Noise, Identity(0), Identity(1), Noise];
        let groups = group_labels(&labels);

        assert_eq!(
            groups,
            vec![
                ClusterAssignment {
                    label: Identity(0),
                    member_indices: vec![2]
                },
                ClusterAssignment {
                    label: Identity(1),
                    member_indices: vec![0, 3]
                },
                ClusterAssignment {
                    label: Noise,
                    member_indices: vec![1, 4]
                },
            ]
        );
        assert_eq!(identity_count(&groups), 2);
    }

    #[test]
    fn test_group_labels_without_noise() {
        let groups = group_labels(&[Identity(0), Identity(0)]);
        assert_eq!(groups.len(), 1);
        assert!(!groups[0].label.is_noise());
    }

    #[test]
    fn test_group_labels_empty() {
        let groups = group_labels(&[]);
        assert!(groups.is_empty());
        assert_eq!(identity_count(&groups), 0);
    }

    #[rstest]
    #[case(Identity(0), 0)]
    #[case(Identity(42), 42)]
    #[case(Noise, -1)]
    fn test_label_wire_value(#[case] label: ClusterLabel, #[case] wire: i64) {
        assert_eq!(serde_json::to_value(label).unwrap(), serde_json::json!(wire));
        let back: ClusterLabel = serde_json::from_value(serde_json::json!(wire)).unwrap();
        assert_eq!(back, label);
    }

    #[test]
    fn test_label_rejects_other_negatives() {
        assert!(serde_json::from_value::<ClusterLabel>(serde_json::json!(-2)).is_err());
    }

    #[test]
    fn test_identity_accessor() {
        assert_eq!(Identity(3).identity(), Some(3));
        assert_eq!(Noise.identity(), None);
        assert_eq!(Noise.to_string(), "noise");
    }
}
