use slotmap::{SlotMap, new_key_type};
use std::collections::HashMap;

use crate::domain::model::model::Model;
use crate::domain::utils::id::ModelId;

new_key_type! {
    pub struct ModelKey;
}

/// The active model set of one cycle.
///
/// Models are addressed by a stable [`ModelKey`]; removing a model never invalidates
/// the keys of the others. Iteration follows insertion order of the scenario file.
#[derive(Debug, Default, Clone)]
pub struct ModelStore {
    /// Model storage.
    slots: SlotMap<ModelKey, Model>,

    /// Index lookup ModelKey using the model name (ModelId).
    name_index: HashMap<ModelId, ModelKey>,

    order: Vec<ModelKey>,
}

impl ModelStore {
    pub fn new() -> Self {
        ModelStore { slots: SlotMap::with_key(), name_index: HashMap::new(), order: Vec::new() }
    }

    /// Adds a model to the store.
    ///
    /// # Returns
    /// Returns `None` if a model with the same name is already present.
    pub fn add(&mut self, model: Model) -> Option<ModelKey> {
        if self.name_index.contains_key(&model.id) {
            return None;
        }

        let id = model.id.clone();
        let key = self.slots.insert(model);
        self.name_index.insert(id, key);
        self.order.push(key);
        Some(key)
    }

    pub fn get(&self, key: ModelKey) -> Option<&Model> {
        self.slots.get(key)
    }

    pub fn get_mut(&mut self, key: ModelKey) -> Option<&mut Model> {
        self.slots.get_mut(key)
    }

    pub fn key_of(&self, id: &ModelId) -> Option<ModelKey> {
        self.name_index.get(id).copied()
    }

    pub fn get_by_name(&self, id: &ModelId) -> Option<&Model> {
        self.key_of(id).and_then(|key| self.slots.get(key))
    }

    /// Removes a model from the active set. Links of the remaining models are left untouched.
    pub fn remove(&mut self, key: ModelKey) -> Option<Model> {
        let model = self.slots.remove(key)?;
        self.name_index.remove(&model.id);
        self.order.retain(|k| *k != key);
        Some(model)
    }

    pub fn contains(&self, key: ModelKey) -> bool {
        self.slots.contains_key(key)
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> Vec<ModelKey> {
        self.order.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ModelKey, &Model)> {
        self.order.iter().filter_map(|key| self.slots.get(*key).map(|model| (*key, model)))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::model_type::ModelType;

    #[test]
    fn test_add_get_remove() {
        let mut store = ModelStore::new();
        let a = store.add(Model::new("a", ModelType::Sfincs)).unwrap();
        let b = store.add(Model::new("b", ModelType::HurryWave)).unwrap();
        assert!(store.add(Model::new("a", ModelType::Ww3)).is_none());

        assert_eq!(store.len(), 2);
        assert_eq!(store.key_of(&ModelId::new("b")), Some(b));
        assert_eq!(store.get_by_name(&ModelId::new("a")).unwrap().model_type, ModelType::Sfincs);

        let removed = store.remove(a).unwrap();
        assert_eq!(removed.id.as_str(), "a");
        assert!(!store.contains(a));
        assert!(store.get_by_name(&ModelId::new("a")).is_none());
        assert_eq!(store.keys(), vec![b]);
    }

    #[test]
    fn test_iteration_keeps_insertion_order() {
        let mut store = ModelStore::new();
        for name in ["z", "m", "a"] {
            store.add(Model::new(name, ModelType::Sfincs));
        }
        let names: Vec<&str> = store.iter().map(|(_, m)| m.id.as_str()).collect();
        assert_eq!(names, vec!["z", "m", "a"]);
    }
}
