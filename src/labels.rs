//! Class-index to label resolution.

use crate::trace::trace_warn;
use crate::util::DetPostResult;
use std::path::Path;

/// How to resolve a class index that does not fit the label table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LabelPolicy {
    /// Out-of-range indices get no label.
    #[default]
    Strict,
    /// Out-of-range indices wrap modulo the table size. Silently mislabels
    /// detections when the model and label file disagree.
    Wrap,
}

/// Ordered list of class labels, one per class index.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LabelTable {
    labels: Vec<String>,
}

impl LabelTable {
    /// Wraps labels ordered by class index.
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels }
    }

    /// Parses a newline-separated label list, one label per line.
    pub fn from_lines(text: &str) -> Self {
        Self::new(text.lines().map(str::to_owned).collect())
    }

    /// Reads a newline-separated label file.
    pub fn load<P: AsRef<Path>>(path: P) -> DetPostResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::from_lines(&text))
    }

    /// Returns the number of labels.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns `true` when no labels are loaded; detections stay unlabeled.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Returns the label at `class_index` without any policy applied.
    pub fn get(&self, class_index: usize) -> Option<&str> {
        self.labels.get(class_index).map(String::as_str)
    }

    /// Resolves `class_index` under `policy`, warning on out-of-range indices.
    pub fn resolve(&self, class_index: usize, policy: LabelPolicy) -> Option<&str> {
        if let Some(label) = self.get(class_index) {
            return Some(label);
        }
        trace_warn!(
            "label_out_of_range",
            class_index = class_index,
            labels = self.labels.len()
        );
        match policy {
            LabelPolicy::Strict => None,
            LabelPolicy::Wrap if self.labels.is_empty() => None,
            LabelPolicy::Wrap => self.get(class_index % self.labels.len()),
        }
    }
}

impl<S: Into<String>> FromIterator<S> for LabelTable {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}
