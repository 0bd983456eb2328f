use page_patch::{denormalize_all, normalize_all, ContractRegistry, Node, PageEditor};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

#[derive(Debug, Clone)]
struct Shape {
    name: &'static str,
    text: String,
    entries: usize,
    children: Vec<Shape>,
}

fn name_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["hero", "navbar", "list", "form", "footer", "layout"])
}

fn shape_strategy() -> impl Strategy<Value = Shape> {
    let leaf = (name_strategy(), "[a-z ]{0,12}", 0usize..4).prop_map(|(name, text, entries)| {
        Shape {
            name,
            text,
            entries,
            children: Vec::new(),
        }
    });
    leaf.prop_recursive(3, 24, 4, |inner| {
        (
            name_strategy(),
            "[a-z ]{0,12}",
            0usize..4,
            prop::collection::vec(inner, 0..4),
        )
            .prop_map(|(name, text, entries, children)| Shape {
                name,
                text,
                entries,
                children,
            })
    })
}

/// Turn a shape into a node whose keys are unique among siblings.
fn build(shape: &Shape, key: String, contracts: &ContractRegistry) -> Node {
    let mut props = Map::new();
    props.insert("text".into(), Value::String(shape.text.clone()));
    for prop in contracts.structural_props(shape.name) {
        let entries = (0..shape.entries)
            .map(|i| json!({"key": format!("{key}-{prop}-{i}"), "label": format!("entry {i}")}))
            .collect();
        props.insert(prop.clone(), Value::Array(entries));
    }
    let mut node = Node::new(key.clone(), shape.name).with_props(Value::Object(props));
    if !shape.children.is_empty() {
        let children = shape
            .children
            .iter()
            .enumerate()
            .map(|(i, child)| build(child, format!("{key}.{i}"), contracts))
            .collect();
        node = node.with_children(children);
    }
    node
}

fn tree_strategy() -> impl Strategy<Value = Vec<Node>> {
    prop::collection::vec(shape_strategy(), 1..6).prop_map(|shapes| {
        let contracts = ContractRegistry::default();
        shapes
            .iter()
            .enumerate()
            .map(|(i, shape)| build(shape, format!("n{i}"), &contracts))
            .collect()
    })
}

proptest! {
    #[test]
    fn normalize_then_denormalize_is_identity(tree in tree_strategy()) {
        let contracts = ContractRegistry::default();
        let working = normalize_all(tree.clone(), &contracts).unwrap();
        let back = denormalize_all(working, &contracts);
        prop_assert_eq!(back, tree);
    }

    #[test]
    fn edit_touches_only_its_target(tree in tree_strategy(), pick in any::<prop::sample::Index>()) {
        let target = pick.index(tree.len());
        let editor = PageEditor::default();
        let field = format!("patch.component_data.{target}.props.text");
        let updated = editor.apply_form(&tree, [(field.as_str(), "edited")]).unwrap();

        prop_assert_eq!(updated.len(), tree.len());
        for (i, (before, after)) in tree.iter().zip(&updated).enumerate() {
            if i == target {
                prop_assert_eq!(after.prop("text"), Some(&json!("edited")));
                prop_assert_eq!(&after.component_data, &before.component_data);
                prop_assert_eq!(&after.key, &before.key);
            } else {
                prop_assert_eq!(after, before);
            }
        }
    }
}
