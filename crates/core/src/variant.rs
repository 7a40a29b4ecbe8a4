use serde::{Deserialize, Serialize};

/// Separator used in human-readable variant paths (CSV exports, logs).
pub const PATH_SEPARATOR: &str = " → ";

/// Label of the synthetic entry node in tries and flow graphs.
pub const START: &str = "START";

/// Label of the synthetic exit node in flow graphs.
pub const END: &str = "END";

/// An ordered sequence of activity labels: the full path of one case.
///
/// Two variants are equal iff their sequences are equal element-for-element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Variant(pub Vec<String>);

impl Variant {
    pub fn new<I, S>(activities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(activities.into_iter().map(Into::into).collect())
    }

    pub fn activities(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Order-preserving, space-joined text used as embedding input.
    pub fn to_text(&self) -> String {
        self.0.join(" ")
    }

    /// Human-readable path, e.g. `A → B → C`.
    pub fn to_path(&self) -> String {
        self.0.join(PATH_SEPARATOR)
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_path())
    }
}

impl From<Vec<String>> for Variant {
    fn from(activities: Vec<String>) -> Self {
        Self(activities)
    }
}

impl From<&[&str]> for Variant {
    fn from(activities: &[&str]) -> Self {
        Self::new(activities.iter().copied())
    }
}

/// A variant together with the number of distinct cases exhibiting it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantCount {
    pub variant: Variant,
    pub frequency: u64,
}

impl VariantCount {
    pub fn new(variant: impl Into<Variant>, frequency: u64) -> Self {
        Self {
            variant: variant.into(),
            frequency,
        }
    }
}

/// Sum of frequencies over a variant list.
pub fn total_frequency(variants: &[VariantCount]) -> u64 {
    variants.iter().map(|v| v.frequency).sum()
}
