use std::collections::HashSet;

use crate::domain::model::model::BoundaryKind;
use crate::domain::model::model_store::{ModelKey, ModelStore};
use crate::error::{Error, Result};

/// Resolves the configured parent names into keys and derives the child lists.
///
/// Fails on unknown parents, self nesting and nesting loops, so that the edges of every
/// boundary kind form a forest afterwards.
pub fn link(store: &mut ModelStore) -> Result<()> {
    let keys = store.keys();

    for key in &keys {
        if let Some(model) = store.get_mut(*key) {
            model.parents = Default::default();
            model.children = Default::default();
        }
    }

    let mut edges: Vec<(BoundaryKind, ModelKey, ModelKey)> = Vec::new();

    for (key, model) in store.iter() {
        for kind in BoundaryKind::ALL {
            let Some(parent_id) = model.nested_in.get(kind) else {
                continue;
            };

            let parent = store.key_of(parent_id).ok_or_else(|| {
                Error::ConfigurationError(format!("Model {} is {}-nested in unknown model {}.", model.id, kind, parent_id))
            })?;

            if parent == key {
                return Err(Error::ConfigurationError(format!("Model {} is {}-nested in itself.", model.id, kind)));
            }

            edges.push((kind, key, parent));
        }
    }

    for (kind, child, parent) in edges {
        if let Some(model) = store.get_mut(child) {
            *model.parents.get_mut(kind) = Some(parent);
        }
        if let Some(model) = store.get_mut(parent) {
            model.children.get_mut(kind).push(child);
        }
    }

    for kind in BoundaryKind::ALL {
        check_acyclic(store, kind)?;
    }

    Ok(())
}

fn check_acyclic(store: &ModelStore, kind: BoundaryKind) -> Result<()> {
    for (start, model) in store.iter() {
        let mut seen = HashSet::from([start]);
        let mut current = *model.parents.get(kind);

        while let Some(key) = current {
            if !seen.insert(key) {
                return Err(Error::ConfigurationError(format!("The {} nesting of model {} contains a loop.", kind, model.id)));
            }
            current = store.get(key).and_then(|parent| *parent.parents.get(kind));
        }
    }

    Ok(())
}

/// Keys of all models without a parent of `kind`.
pub fn roots(store: &ModelStore, kind: BoundaryKind) -> Vec<ModelKey> {
    store.iter().filter(|(_, model)| model.parents.get(kind).is_none()).map(|(key, _)| key).collect()
}

/// Keys of all models of `kind` that nothing is nested into.
pub fn leaves(store: &ModelStore, kind: BoundaryKind) -> Vec<ModelKey> {
    store.iter().filter(|(_, model)| model.children.get(kind).is_empty()).map(|(key, _)| key).collect()
}
