pub mod model;
pub mod model_kind_base;
pub mod model_kind_mock;
pub mod model_kind_registry;
pub mod model_kind_trait;
pub mod model_kinds;
pub mod model_store;
pub mod model_type;
