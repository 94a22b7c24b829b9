//! The layer registry: what each translated ONNX tensor became in the
//! target graph.
use std::collections::HashMap;

use tfbridge_core::internal::*;

/// Registry entry for one ONNX tensor.
#[derive(Clone, Debug, PartialEq, new)]
pub struct LayerRecord {
    /// ONNX op type of the producer ("Input" for graph inputs).
    pub op_type: String,
    /// Shape declared by the ONNX graph.
    pub shape: ShapeFact,
    pub datum_type: DatumType,
    /// The produced tensor in the target model.
    pub outlet: OutletId,
}

/// Tensor name to record mapping, iterated in insertion order.
///
/// Entries are only ever added during a conversion run. Registering a name
/// twice replaces the record in place.
#[derive(Clone, Debug, Default)]
pub struct LayerRegistry {
    records: Vec<(String, LayerRecord)>,
    index: HashMap<String, usize>,
}

impl LayerRegistry {
    pub fn insert(&mut self, name: impl Into<String>, record: LayerRecord) {
        let name = name.into();
        trace!("registry: {} -> {:?}", name, record);
        if let Some(&ix) = self.index.get(&name) {
            self.records[ix].1 = record;
        } else {
            self.index.insert(name.clone(), self.records.len());
            self.records.push((name, record));
        }
    }

    pub fn get(&self, name: &str) -> Option<&LayerRecord> {
        self.index.get(name).map(|&ix| &self.records[ix].1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LayerRecord)> {
        self.records.iter().map(|(n, r)| (n.as_str(), r))
    }
}
