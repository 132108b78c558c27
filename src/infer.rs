//! Structural type inference over decoded JSON values.
//!
//! Nested objects are not inlined: each one is registered in a [`TypeRegistry`]
//! under a name derived from the key that holds it, and referenced by that
//! name. Repeated shapes (the elements of an array of objects, say) therefore
//! collapse into a single declaration. Two differently shaped objects that
//! derive the same name overwrite each other; the later shape wins and keeps
//! the earlier entry's position.

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::Serialize;
use serde_json::Value;

use crate::path::ROOT;

/// Arrays with at least this many elements infer their elements on the rayon pool.
pub const PARALLEL_THRESHOLD: usize = 2048;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TypeNode {
    String,
    Number,
    Boolean,
    Null,
    Unknown,
    Array { element: Box<TypeNode> },
    Object { fields: IndexMap<String, TypeNode> },
    Union { types: Vec<TypeNode> },
    Ref { name: String },
}

// Field order is significant, so `IndexMap`'s order-insensitive equality is not used.
impl PartialEq for TypeNode {
    fn eq(&self, other: &Self) -> bool {
        use TypeNode::*;
        match (self, other) {
            (String, String)
            | (Number, Number)
            | (Boolean, Boolean)
            | (Null, Null)
            | (Unknown, Unknown) => true,
            (Array { element: a }, Array { element: b }) => a == b,
            (Object { fields: a }, Object { fields: b }) => {
                a.len() == b.len()
                    && a.iter().zip(b.iter()).all(|((ka, va), (kb, vb))| ka == kb && va == vb)
            }
            (Union { types: a }, Union { types: b }) => a == b,
            (Ref { name: a }, Ref { name: b }) => a == b,
            _ => false,
        }
    }
}

impl Eq for TypeNode {}

impl TypeNode {
    pub fn array_of(element: TypeNode) -> Self {
        TypeNode::Array {
            element: Box::new(element),
        }
    }

    pub fn is_union(&self) -> bool {
        matches!(self, TypeNode::Union { .. })
    }
}

/// Named object shapes produced by one inference run, in registration order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TypeRegistry {
    entries: IndexMap<String, TypeNode>,
}

// Registration order is render order.
impl PartialEq for TypeRegistry {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len() && self.iter().eq(other.iter())
    }
}

impl Eq for TypeRegistry {}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `node` under `name`, replacing any earlier shape with that name.
    pub fn register(&mut self, name: &str, node: TypeNode) {
        if let Some(previous) = self.entries.insert(name.to_string(), node) {
            if Some(&previous) != self.entries.get(name) {
                tracing::trace!(name, "type name reused by a different shape");
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&TypeNode> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TypeNode)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn absorb(&mut self, other: TypeRegistry) {
        for (name, node) in other.entries {
            self.register(&name, node);
        }
    }
}

/// Result of [`infer_type`]: the root type and the shapes it refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Inference {
    pub root: TypeNode,
    pub registry: TypeRegistry,
}

pub fn infer_type(value: &Value) -> Inference {
    let mut registry = TypeRegistry::new();
    let root = infer_node(value, &mut registry, ROOT, true);
    Inference { root, registry }
}

/// Infers the type of `value`, registering nested objects under names derived
/// from `name`. The root object is returned inline instead of registered.
pub fn infer_node(value: &Value, registry: &mut TypeRegistry, name: &str, is_root: bool) -> TypeNode {
    match value {
        Value::Null => TypeNode::Null,
        Value::Bool(_) => TypeNode::Boolean,
        Value::Number(_) => TypeNode::Number,
        Value::String(_) => TypeNode::String,
        Value::Array(items) if items.is_empty() => TypeNode::array_of(TypeNode::Unknown),
        Value::Array(items) => {
            let element_name = singular_name(name);
            let types = infer_elements(items, registry, &element_name);
            TypeNode::array_of(unify(types))
        }
        Value::Object(map) => {
            let fields = map
                .iter()
                .map(|(key, v)| (key.clone(), infer_node(v, registry, &type_name(key), false)))
                .collect();
            let node = TypeNode::Object { fields };
            if is_root {
                node
            } else {
                registry.register(name, node);
                TypeNode::Ref {
                    name: name.to_string(),
                }
            }
        }
    }
}

fn infer_elements(items: &[Value], registry: &mut TypeRegistry, name: &str) -> Vec<TypeNode> {
    if items.len() < PARALLEL_THRESHOLD {
        return items
            .iter()
            .map(|item| infer_node(item, registry, name, false))
            .collect();
    }

    // Each element gets a private registry; merging them in element order
    // reproduces the sequential registration order.
    let partials: Vec<(TypeNode, TypeRegistry)> = items
        .par_iter()
        .map(|item| {
            let mut local = TypeRegistry::new();
            let node = infer_node(item, &mut local, name, false);
            (node, local)
        })
        .collect();

    partials
        .into_iter()
        .map(|(node, local)| {
            registry.absorb(local);
            node
        })
        .collect()
}

/// Collapses element types into one: the shared type when all are equal,
/// otherwise a union of the distinct types in order of first appearance.
fn unify(types: Vec<TypeNode>) -> TypeNode {
    let mut unique: Vec<TypeNode> = Vec::new();
    for t in types {
        if !unique.contains(&t) {
            unique.push(t);
        }
    }
    if unique.len() == 1 {
        unique.remove(0)
    } else {
        TypeNode::Union { types: unique }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Type name for the value held under object key `key`.
pub fn type_name(key: &str) -> String {
    if key.is_empty() {
        "Field".to_string()
    } else {
        capitalize(key)
    }
}

/// Name for the elements of an array named `name`: `Users` gives `User`.
/// Names without a trailing `s` get an `Item` suffix so the element never
/// shares the array's own name.
pub fn singular_name(name: &str) -> String {
    match name.strip_suffix('s') {
        Some(stem) if !stem.is_empty() => capitalize(stem),
        _ => format!("{}Item", capitalize(name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(fields: &[(&str, TypeNode)]) -> TypeNode {
        TypeNode::Object {
            fields: fields.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
        }
    }

    fn reference(name: &str) -> TypeNode {
        TypeNode::Ref { name: name.into() }
    }

    #[test]
    fn primitives() {
        assert_eq!(infer_type(&json!(null)).root, TypeNode::Null);
        assert_eq!(infer_type(&json!("x")).root, TypeNode::String);
        assert_eq!(infer_type(&json!(1.5)).root, TypeNode::Number);
        assert_eq!(infer_type(&json!(false)).root, TypeNode::Boolean);
    }

    #[test]
    fn empty_array_is_unknown_elements() {
        let inference = infer_type(&json!([]));
        assert_eq!(inference.root, TypeNode::array_of(TypeNode::Unknown));
        assert!(inference.registry.is_empty());
    }

    #[test]
    fn mixed_array_becomes_deduplicated_union() {
        let inference = infer_type(&json!([1, "a", 2, "b"]));
        assert_eq!(
            inference.root,
            TypeNode::array_of(TypeNode::Union {
                types: vec![TypeNode::Number, TypeNode::String],
            })
        );
    }

    #[test]
    fn homogeneous_object_array_registers_one_type() {
        let inference = infer_type(&json!([{ "a": 1 }, { "a": 2 }]));
        assert_eq!(inference.root, TypeNode::array_of(reference("RootItem")));
        assert_eq!(inference.registry.len(), 1);
        assert_eq!(
            inference.registry.get("RootItem"),
            Some(&object(&[("a", TypeNode::Number)]))
        );
    }

    #[test]
    fn root_object_stays_inline() {
        let inference = infer_type(&json!({ "x": 1, "profile": { "name": "a" } }));
        assert_eq!(
            inference.root,
            object(&[("x", TypeNode::Number), ("profile", reference("Profile"))])
        );
        assert_eq!(
            inference.registry.iter().map(|(n, _)| n).collect::<Vec<_>>(),
            vec!["Profile"]
        );
    }

    #[test]
    fn plural_field_names_singularize() {
        let inference = infer_type(&json!({ "users": [{ "id": 1, "tags": ["a"] }] }));
        assert_eq!(
            inference.root,
            object(&[("users", TypeNode::array_of(reference("User")))])
        );
        assert_eq!(
            inference.registry.get("User"),
            Some(&object(&[
                ("id", TypeNode::Number),
                ("tags", TypeNode::array_of(TypeNode::String)),
            ]))
        );
    }

    #[test]
    fn nested_shapes_register_inner_first() {
        let inference = infer_type(&json!({ "a": { "b": { "c": true } } }));
        let names: Vec<_> = inference.registry.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["B", "A"]);
    }

    #[test]
    fn colliding_names_keep_the_last_shape() {
        let inference = infer_type(&json!({ "items": [{ "a": 1 }, { "b": "x" }] }));
        assert_eq!(
            inference.root,
            object(&[("items", TypeNode::array_of(reference("Item")))])
        );
        assert_eq!(
            inference.registry.get("Item"),
            Some(&object(&[("b", TypeNode::String)]))
        );
    }

    #[test]
    fn field_order_matters_for_equality() {
        let ab = object(&[("a", TypeNode::Number), ("b", TypeNode::String)]);
        let ba = object(&[("b", TypeNode::String), ("a", TypeNode::Number)]);
        assert_ne!(ab, ba);
    }

    #[test]
    fn registry_order_matters_for_equality() {
        let ab = infer_type(&json!({ "a": { "x": 1 }, "b": { "y": "z" } }));
        let ba = infer_type(&json!({ "b": { "y": "z" }, "a": { "x": 1 } }));
        let names: Vec<_> = ab.registry.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_ne!(ab.registry, ba.registry);
    }

    #[test]
    fn inference_is_repeatable() {
        let value = json!({ "users": [{ "id": 1 }, { "id": 2, "meta": null }], "n": [1, "x"] });
        assert_eq!(infer_type(&value), infer_type(&value));
    }

    #[test]
    fn parallel_inference_matches_sequential() {
        let items: Vec<Value> = (0..PARALLEL_THRESHOLD + 5)
            .map(|i| {
                if i % 3 == 0 {
                    json!({ "id": i, "child": { "x": i } })
                } else {
                    json!(i)
                }
            })
            .collect();
        let value = Value::Array(items.clone());

        let mut sequential = TypeRegistry::new();
        let types: Vec<_> = items
            .iter()
            .map(|item| infer_node(item, &mut sequential, "RootItem", false))
            .collect();

        let inference = infer_type(&value);
        assert_eq!(inference.root, TypeNode::array_of(unify(types)));
        assert_eq!(inference.registry, sequential);
    }

    #[test]
    fn naming_helpers() {
        assert_eq!(singular_name("Users"), "User");
        assert_eq!(singular_name("Root"), "RootItem");
        assert_eq!(singular_name("s"), "SItem");
        assert_eq!(type_name("userName"), "UserName");
        assert_eq!(type_name(""), "Field");
    }
}
