use crate::bytecode::values::value::Value;
use std::collections::HashMap;

pub type HeapId = usize;

enum GCData {
    String(String),
}

impl GCData {
    fn as_str(&self) -> Option<&str> {
        match self {
            GCData::String(s) => Some(s),
        }
    }
}

pub struct GCVal {
    data: GCData,
}

impl GCVal {
    fn from(data: GCData) -> GCVal {
        GCVal { data }
    }
}

/// VM-owned storage for heap objects. Strings are interned, so two equal
/// strings always share one `HeapId`.
#[derive(Default)]
pub struct Heap {
    bytes_allocated: usize,
    id_counter: usize,
    values: HashMap<HeapId, GCVal>,
    interned: HashMap<String, HeapId>,
}

impl Heap {
    pub fn summarize_stats(&self) -> String {
        format!(
            "Heap stats: bytes_allocated {}\n\
                         num_values: {}",
            self.bytes_allocated,
            self.values.len()
        )
    }

    pub fn manage_str(&mut self, s: String) -> HeapId {
        if let Some(id) = self.interned.get(&s) {
            return *id;
        }
        self.bytes_allocated += s.len();
        let id = self.generate_id();
        self.interned.insert(s.clone(), id);
        self.values.insert(id, GCVal::from(GCData::String(s)));
        id
    }

    fn generate_id(&mut self) -> HeapId {
        self.id_counter += 1;
        loop {
            if !self.values.contains_key(&self.id_counter) {
                return self.id_counter;
            }
            self.id_counter += 1;
        }
    }

    pub fn get_str(&self, id: HeapId) -> Option<&str> {
        self.values.get(&id).and_then(|val| val.data.as_str())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn bytes_allocated(&self) -> usize {
        self.bytes_allocated
    }

    /// Drops every object. Handles issued before the call dangle afterwards,
    /// so callers must also discard any `Value` that still holds one.
    pub fn free_all(&mut self) -> usize {
        let freed = self.values.len();
        self.values.clear();
        self.interned.clear();
        self.bytes_allocated = 0;
        freed
    }

    pub fn extract_id(val: &Value) -> Option<HeapId> {
        match val {
            Value::String(id) => Some(*id),
            Value::Nil | Value::Bool(_) | Value::Number(_) => None,
        }
    }
}
