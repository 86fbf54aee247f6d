use std::collections::HashMap;

use crate::domain::model::model_kind_trait::ModelKind;
use crate::domain::model::model_type::ModelType;

/// Lifecycle implementation per model type.
#[derive(Debug)]
pub struct ModelKindRegistry {
    kinds: HashMap<ModelType, Box<dyn ModelKind>>,
}

impl ModelKindRegistry {
    pub fn empty() -> Self {
        ModelKindRegistry { kinds: HashMap::new() }
    }

    /// Registry with the built-in implementation of every model type.
    pub fn standard() -> Self {
        let mut registry = ModelKindRegistry::empty();
        for model_type in ModelType::ALL {
            registry.register(model_type, model_type.get_instance());
        }
        registry
    }

    /// Replaces the implementation of `model_type`.
    pub fn register(&mut self, model_type: ModelType, kind: Box<dyn ModelKind>) -> &mut Self {
        self.kinds.insert(model_type, kind);
        self
    }

    pub fn get(&self, model_type: ModelType) -> Option<&dyn ModelKind> {
        self.kinds.get(&model_type).map(|kind| kind.as_ref())
    }
}

impl Default for ModelKindRegistry {
    fn default() -> Self {
        ModelKindRegistry::standard()
    }
}
