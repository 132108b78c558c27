use crate::infer::{Inference, TypeNode, TypeRegistry};

const INDENT: &str = "  ";

/// Renders every registered shape followed by the root declaration, separated
/// by blank lines.
pub fn render_types(root_name: &str, root: &TypeNode, registry: &TypeRegistry) -> String {
    registry
        .iter()
        .map(|(name, node)| render_declaration(name, node))
        .chain(std::iter::once(render_declaration(root_name, root)))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn render_inference(root_name: &str, inference: &Inference) -> String {
    render_types(root_name, &inference.root, &inference.registry)
}

/// `interface Name { ... }` for objects, `type Name = ...;` for everything else.
pub fn render_declaration(name: &str, node: &TypeNode) -> String {
    match node {
        TypeNode::Object { .. } => format!("interface {} {}", name, render_type(node, 0)),
        _ => format!("type {} = {};", name, render_type(node, 0)),
    }
}

pub fn render_type(node: &TypeNode, indent: usize) -> String {
    match node {
        TypeNode::String => "string".into(),
        TypeNode::Number => "number".into(),
        TypeNode::Boolean => "boolean".into(),
        TypeNode::Null => "null".into(),
        TypeNode::Unknown => "unknown".into(),
        TypeNode::Array { element } => {
            let inner = render_type(element, indent);
            if element.is_union() {
                format!("({})[]", inner)
            } else {
                format!("{}[]", inner)
            }
        }
        TypeNode::Union { types } => types
            .iter()
            .map(|member| render_type(member, indent))
            .collect::<Vec<_>>()
            .join(" | "),
        TypeNode::Object { fields } => {
            if fields.is_empty() {
                return "{}".into();
            }
            let pad = INDENT.repeat(indent);
            let lines: Vec<String> = fields
                .iter()
                .map(|(key, field)| {
                    format!("{}{}{}: {};", pad, INDENT, key, render_type(field, indent + 1))
                })
                .collect();
            format!("{{\n{}\n{}}}", lines.join("\n"), pad)
        }
        TypeNode::Ref { name } => name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infer::infer_type;
    use serde_json::json;

    fn render(value: serde_json::Value) -> String {
        render_inference("Root", &infer_type(&value))
    }

    #[test]
    fn object_root_renders_interface() {
        assert_eq!(render(json!({ "x": 1 })), "interface Root {\n  x: number;\n}");
    }

    #[test]
    fn primitive_root_renders_alias() {
        assert_eq!(render(json!("hi")), "type Root = string;");
        assert_eq!(render(json!(null)), "type Root = null;");
        assert_eq!(render(json!([])), "type Root = unknown[];");
    }

    #[test]
    fn empty_object_renders_braces() {
        assert_eq!(render(json!({})), "interface Root {}");
    }

    #[test]
    fn union_elements_are_parenthesized() {
        assert_eq!(render(json!([1, "a", null])), "type Root = (number | string | null)[];");
        assert_eq!(render(json!([[1], ["a"]])), "type Root = (number[] | string[])[];");
    }

    #[test]
    fn registered_shapes_come_first() {
        let out = render(json!({
            "users": [{ "id": 1, "name": "a" }],
            "owner": { "id": 2 }
        }));
        assert_eq!(
            out,
            "interface User {\n  id: number;\n  name: string;\n}\n\n\
             interface Owner {\n  id: number;\n}\n\n\
             interface Root {\n  users: User[];\n  owner: Owner;\n}"
        );
    }

    #[test]
    fn array_root_of_objects_renders_alias_and_item() {
        assert_eq!(
            render(json!([{ "a": 1 }, { "a": 2 }])),
            "interface RootItem {\n  a: number;\n}\n\ntype Root = RootItem[];"
        );
    }

    #[test]
    fn nested_inline_objects_indent() {
        let mut fields = indexmap::IndexMap::new();
        let mut inner = indexmap::IndexMap::new();
        inner.insert("b".to_string(), TypeNode::Boolean);
        fields.insert("a".to_string(), TypeNode::Object { fields: inner });
        let node = TypeNode::Object { fields };
        assert_eq!(
            render_declaration("Root", &node),
            "interface Root {\n  a: {\n    b: boolean;\n  };\n}"
        );
    }
}
