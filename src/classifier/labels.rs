//! Class label set

use crate::config::DEFAULT_LABELS;
use crate::error::{LesionError, Result};

/// Ordered class labels.
///
/// Index `i` names output `i` of the network, so the order must be the one
/// the output layer was trained with. A wrong order cannot be detected at
/// runtime and silently swaps predictions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassLabels {
    labels: Vec<String>,
}

impl ClassLabels {
    /// Create a label set. Labels must be non-empty and unique.
    pub fn new<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if labels.is_empty() {
            return Err(LesionError::Config("Class label set is empty".to_string()));
        }
        for (i, label) in labels.iter().enumerate() {
            if labels[..i].contains(label) {
                return Err(LesionError::Config(format!("Duplicate class label: {}", label)));
            }
        }
        Ok(Self { labels })
    }

    /// Number of classes.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Always false; a label set has at least one entry.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Label for an output index.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    /// Whether `label` is in the set.
    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}

impl Default for ClassLabels {
    fn default() -> Self {
        Self {
            labels: DEFAULT_LABELS.iter().map(|l| l.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_order() {
        let labels = ClassLabels::default();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels.get(0), Some("benign"));
        assert_eq!(labels.get(1), Some("malignant"));
        assert_eq!(labels.get(2), None);
    }

    #[test]
    fn test_rejects_duplicates_and_empty() {
        assert!(ClassLabels::new(["a", "a"]).is_err());
        assert!(ClassLabels::new(Vec::<String>::new()).is_err());
        assert!(ClassLabels::new(["a", "b", "c"]).is_ok());
    }

    #[test]
    fn test_contains() {
        let labels = ClassLabels::default();
        assert!(labels.contains("benign"));
        assert!(!labels.contains("Benign"));
        assert_eq!(labels.iter().collect::<Vec<_>>(), vec!["benign", "malignant"]);
    }
}
