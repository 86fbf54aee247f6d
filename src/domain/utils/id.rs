use serde::Serialize;
use std::fmt;
use std::marker::PhantomData;

/// Name based identifier, typed by a tag so model and cluster names cannot be mixed up.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Serialize)]
pub struct Id<T> {
    pub id: String,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T> Id<T> {
    pub fn new(id: impl Into<String>) -> Self {
        Id { id: id.into(), _marker: PhantomData }
    }

    pub fn as_str(&self) -> &str {
        &self.id
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl<T> From<Id<T>> for String {
    fn from(id_wrapper: Id<T>) -> Self {
        id_wrapper.id
    }
}

impl<T> From<&str> for Id<T> {
    fn from(id: &str) -> Self {
        Id::new(id)
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let full_name = std::any::type_name::<T>();
        let clean_name = full_name.split("::").last().unwrap_or(full_name);
        let display_name = clean_name.replace("Tag", "Id");

        write!(f, "{}: {:?}", display_name, self.id)
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Copy)]
pub struct ModelTag;
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Copy)]
pub struct ClusterTag;
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Copy)]
pub struct ScenarioTag;

pub type ModelId = Id<ModelTag>;
pub type ClusterId = Id<ClusterTag>;
pub type ScenarioId = Id<ScenarioTag>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_uses_tag_name() {
        let id = ModelId::new("sfincs_coast");
        assert_eq!(format!("{:?}", id), "ModelId: \"sfincs_coast\"");
        assert_eq!(format!("{}", id), "sfincs_coast");

        let cluster: ClusterId = "east".into();
        assert_eq!(format!("{:?}", cluster), "ClusterId: \"east\"");
    }
}
