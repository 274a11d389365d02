//! Cart templates and inheritance resolution
//!
//! A cart bundles entity templates ("stubs") and scene templates. Entity
//! stubs may inherit from other stubs; resolution flattens every lineage into
//! a single stub once, at load time.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::EcsError;
use crate::foundation::merge::merge_into;

/// Serialized entity definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityStub {
    /// Stubs this one extends; later entries override earlier ones
    pub inherits: Vec<String>,
    /// Component name to component data, `identity` included
    pub components: Map<String, Value>,
    /// Child stub name to per-instance identity overrides
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<BTreeMap<String, Vec<Value>>>,
}

/// Serialized scene definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneStub {
    /// Explicit system execution prefix
    #[serde(skip_serializing_if = "Option::is_none")]
    pub systems: Option<Vec<String>>,
    /// Entity stub name to per-instance identity overrides
    pub entities: BTreeMap<String, Vec<Value>>,
}

/// A cart manifest: metadata plus every template it ships
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CartManifest {
    /// Display name
    pub name: String,
    /// Author credit
    pub author: String,
    /// Scene to load on boot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_scene: Option<String>,
    /// Entity templates by name
    pub entities: BTreeMap<String, EntityStub>,
    /// Scene templates by name
    pub scenes: BTreeMap<String, SceneStub>,
}

impl CartManifest {
    /// Parse a manifest from JSON text
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Order in which `name` and its ancestors are merged.
///
/// Post-order depth-first walk of `inherits`: every ancestor precedes its
/// descendants, parents appear in declaration order, and a stub reached
/// through several paths appears once.
pub fn resolve_lineage(name: &str, stubs: &BTreeMap<String, EntityStub>) -> Result<Vec<String>, EcsError> {
    fn visit(
        name: &str,
        stubs: &BTreeMap<String, EntityStub>,
        visiting: &mut HashSet<String>,
        order: &mut Vec<String>,
    ) -> Result<(), EcsError> {
        if order.iter().any(|done| done == name) {
            return Ok(());
        }
        if !visiting.insert(name.to_owned()) {
            return Err(EcsError::InheritanceCycle(name.to_owned()));
        }
        let stub = stubs.get(name).ok_or_else(|| EcsError::UnknownStub(name.to_owned()))?;
        for parent in &stub.inherits {
            visit(parent, stubs, visiting, order)?;
        }
        visiting.remove(name);
        order.push(name.to_owned());
        Ok(())
    }

    let mut order = Vec::new();
    visit(name, stubs, &mut HashSet::new(), &mut order)?;
    Ok(order)
}

/// Merge a lineage, ancestors first, into one stub without `inherits`
pub fn apply_inheritance(lineage: &[String], stubs: &BTreeMap<String, EntityStub>) -> Result<EntityStub, EcsError> {
    let mut merged = Value::Object(Map::new());
    for name in lineage {
        let stub = stubs.get(name).ok_or_else(|| EcsError::UnknownStub(name.clone()))?;
        merge_into(&mut merged, &serde_json::to_value(stub)?);
    }

    let mut resolved: EntityStub = serde_json::from_value(merged)?;
    resolved.inherits.clear();
    Ok(resolved)
}

/// Flatten every entity stub of a cart
pub fn resolve_stubs(cart: &CartManifest) -> Result<HashMap<String, EntityStub>, EcsError> {
    cart.entities
        .keys()
        .map(|name| {
            let lineage = resolve_lineage(name, &cart.entities)?;
            log::trace!("Lineage of '{name}': {lineage:?}");
            Ok((name.clone(), apply_inheritance(&lineage, &cart.entities)?))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cart(entities: Value) -> CartManifest {
        serde_json::from_value(json!({ "name": "test", "entities": entities })).unwrap()
    }

    #[test]
    fn test_descendant_wins_and_ancestor_fields_survive() {
        let cart = cart(json!({
            "A": {"components": {"sprite": {"frame": 1, "tint": "red"}, "health": {"hp": 3}}},
            "B": {"inherits": ["A"], "components": {"sprite": {"frame": 2}}}
        }));

        let stubs = resolve_stubs(&cart).unwrap();
        let b = &stubs["B"];
        assert_eq!(b.components["sprite"], json!({"frame": 2, "tint": "red"}));
        assert_eq!(b.components["health"], json!({"hp": 3}));
        assert!(b.inherits.is_empty());
    }

    #[test]
    fn test_multi_level_lineage_is_transitive() {
        let cart = cart(json!({
            "Base": {"components": {"base": {}}},
            "Mid": {"inherits": ["Base"], "components": {"mid": {}}},
            "Leaf": {"inherits": ["Mid"], "components": {"leaf": {}}}
        }));

        assert_eq!(resolve_lineage("Leaf", &cart.entities).unwrap(), ["Base", "Mid", "Leaf"]);
        let leaf = &resolve_stubs(&cart).unwrap()["Leaf"];
        assert!(leaf.components.contains_key("base"));
        assert!(leaf.components.contains_key("mid"));
    }

    #[test]
    fn test_later_parent_overrides_earlier() {
        let cart = cart(json!({
            "Red": {"components": {"color": {"value": "red"}}},
            "Blue": {"components": {"color": {"value": "blue"}}},
            "Mix": {"inherits": ["Red", "Blue"]}
        }));

        let mix = &resolve_stubs(&cart).unwrap()["Mix"];
        assert_eq!(mix.components["color"], json!({"value": "blue"}));
    }

    #[test]
    fn test_arrays_do_not_accumulate() {
        let cart = cart(json!({
            "A": {"components": {"anim": {"frames": [1, 2]}}},
            "B": {"inherits": ["A"], "components": {"anim": {"frames": [3]}}}
        }));

        let b = &resolve_stubs(&cart).unwrap()["B"];
        assert_eq!(b.components["anim"]["frames"], json!([3]));
    }

    #[test]
    fn test_cycles_and_missing_parents_are_errors() {
        let cyclic = cart(json!({
            "A": {"inherits": ["B"]},
            "B": {"inherits": ["A"]}
        }));
        assert!(matches!(resolve_stubs(&cyclic), Err(EcsError::InheritanceCycle(_))));

        let orphan = cart(json!({"A": {"inherits": ["Ghost"]}}));
        assert!(matches!(resolve_stubs(&orphan), Err(EcsError::UnknownStub(name)) if name == "Ghost"));
    }

    #[test]
    fn test_manifest_field_names() {
        let manifest = CartManifest::from_json_str(
            r#"{"name": "demo", "author": "someone", "defaultScene": "main",
                "scenes": {"main": {"systems": ["Move"], "entities": {"Ship": [{}]}}}}"#,
        )
        .unwrap();

        assert_eq!(manifest.default_scene.as_deref(), Some("main"));
        assert_eq!(manifest.scenes["main"].systems.as_deref(), Some(&["Move".to_owned()][..]));
        assert_eq!(manifest.scenes["main"].entities["Ship"].len(), 1);
    }
}
