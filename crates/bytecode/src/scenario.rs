//! Decoded scenarios.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::element::{InstructionElement, Marker, ScenarioId, TextEncoding};

/// One decoded, independently addressable unit of bytecode.
///
/// Scenarios are immutable once built. Jump targets are resolved through the
/// label and entrypoint tables, which map marker values to element indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    id: ScenarioId,
    encoding: TextEncoding,
    elements: Vec<InstructionElement>,
    labels: HashMap<u32, usize>,
    entrypoints: BTreeMap<u8, usize>,
}

impl Scenario {
    /// Build a scenario and index its markers.
    ///
    /// When a label or entrypoint appears more than once, the first occurrence
    /// is the target.
    pub fn new(id: ScenarioId, encoding: TextEncoding, elements: Vec<InstructionElement>) -> Self {
        let mut labels = HashMap::new();
        let mut entrypoints = BTreeMap::new();
        for (index, element) in elements.iter().enumerate() {
            match element {
                InstructionElement::Marker(Marker::Label(label)) => {
                    if labels.contains_key(label) {
                        debug!(%id, label, index, "duplicate label ignored");
                    } else {
                        labels.insert(*label, index);
                    }
                }
                InstructionElement::Marker(Marker::Entrypoint(entry)) => {
                    entrypoints.entry(*entry).or_insert(index);
                }
                _ => {}
            }
        }
        Self {
            id,
            encoding,
            elements,
            labels,
            entrypoints,
        }
    }

    /// Id this scenario was loaded under.
    pub fn id(&self) -> ScenarioId {
        self.id
    }

    /// Text encoding declared by the scenario header.
    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// All elements in stream order.
    pub fn elements(&self) -> &[InstructionElement] {
        &self.elements
    }

    /// Element at `index`, if any.
    pub fn element(&self, index: usize) -> Option<&InstructionElement> {
        self.elements.get(index)
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the scenario has no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Element index of a label marker.
    pub fn label(&self, label: u32) -> Option<usize> {
        self.labels.get(&label).copied()
    }

    /// Element index of an entrypoint marker.
    ///
    /// Entrypoint `0` falls back to the start of the scenario when the stream
    /// does not declare one.
    pub fn entrypoint(&self, entry: u8) -> Option<usize> {
        match self.entrypoints.get(&entry) {
            Some(index) => Some(*index),
            None if entry == 0 => Some(0),
            None => None,
        }
    }

    /// Declared entrypoints in ascending order.
    pub fn entrypoints(&self) -> impl Iterator<Item = (u8, usize)> + '_ {
        self.entrypoints.iter().map(|(entry, index)| (*entry, *index))
    }

    /// First line marker in the stream, if any.
    pub fn first_line(&self) -> Option<u16> {
        self.elements.iter().find_map(|element| match element {
            InstructionElement::Marker(Marker::Line(line)) => Some(*line),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Command;

    fn sample() -> Scenario {
        Scenario::new(
            ScenarioId::new(7),
            TextEncoding::Utf8,
            vec![
                Marker::Line(10).into(),
                Marker::Entrypoint(1).into(),
                Marker::Label(5).into(),
                Command::new(0, 1, 0, 0).into(),
                Marker::Label(5).into(),
            ],
        )
    }

    #[test]
    fn test_label_table() {
        let scenario = sample();
        assert_eq!(scenario.label(5), Some(2));
        assert_eq!(scenario.label(6), None);
    }

    #[test]
    fn test_entrypoint_table() {
        let scenario = sample();
        assert_eq!(scenario.entrypoint(1), Some(1));
        assert_eq!(scenario.entrypoint(0), Some(0));
        assert_eq!(scenario.entrypoint(2), None);
        assert_eq!(scenario.entrypoints().collect::<Vec<_>>(), vec![(1, 1)]);
    }

    #[test]
    fn test_first_line() {
        assert_eq!(sample().first_line(), Some(10));
    }
}
