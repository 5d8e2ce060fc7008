//! The global name → model registry.
//!
//! Populated at registration time and effectively immutable afterwards.
//! Re-registering a name replaces the previous entry.

use std::collections::HashMap;
use std::sync::RwLock;

use once_cell::sync::Lazy;

use crate::model::Model;

static REGISTRY: Lazy<RwLock<HashMap<String, Model>>> = Lazy::new(|| RwLock::new(HashMap::new()));

/// Registers a model under its name, replacing any previous entry.
pub fn insert(model: Model) {
    let mut registry = match REGISTRY.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    registry.insert(String::from(model.name()), model);
}

/// Looks up a registered model by name.
pub fn get(name: &str) -> Option<Model> {
    let registry = match REGISTRY.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    registry.get(name).cloned()
}
