#![no_main]

use std::sync::LazyLock;

use dom::{Document, NodeId, Structure};
use libfuzzer_sys::fuzz_target;
use pipeline::{CleanOptions, CollectDiagnostics, CompiledPolicy, Policy, SerializeOptions, clean};
use serialize::serialize_children;

static POLICY: LazyLock<CompiledPolicy> = LazyLock::new(|| {
    Policy::default()
        .compile()
        .expect("default policy compiles")
});

const TAGS: &[&str] = &[
    "p", "div", "span", "b", "u", "font", "h1", "li", "ul", "td", "table", "pre", "hr", "iframe",
    "o:p", "ins", "a", "img", "blockquote", "script",
];
const TEXTS: &[&str] = &["x", " ", "\u{a0}", "a b", "\n\t", "<&>", "é"];
const ATTRIBUTES: &[(&str, &str)] = &[
    ("class", "MsoNormal"),
    ("class", "Section1"),
    ("style", "color:red;text-align:center"),
    ("align", "right"),
    ("width", "10"),
    ("href", "http://example.com:99999/"),
    ("src", "data:x"),
    ("data-container", ""),
];

/// Builds a tree under a `div` root from a byte program. The arena keeps deep inputs off the
/// call stack.
fn build(data: &[u8]) -> (Document, NodeId) {
    let mut doc = Document::new();
    let root = doc.create_element("div");
    let mut open = vec![root];
    let mut bytes = data.iter().copied();
    while let Some(op) = bytes.next() {
        let arg = bytes.next().unwrap_or(0) as usize;
        let Some(&parent) = open.last() else {
            break;
        };
        match op % 6 {
            0 => {
                let child = doc.create_element(TAGS[arg % TAGS.len()]);
                if doc.append_child(parent, child).is_ok() {
                    open.push(child);
                }
            }
            1 => {
                let child = doc.create_text(TEXTS[arg % TEXTS.len()]);
                let _ = doc.append_child(parent, child);
            }
            2 => {
                let child = doc.create_element("br");
                let _ = doc.append_child(parent, child);
            }
            3 => {
                let (name, value) = ATTRIBUTES[arg % ATTRIBUTES.len()];
                if parent != root {
                    let _ = doc.set_attr(parent, name, value);
                }
            }
            4 => {
                let child = doc.create(dom::NodeData::Comment("c".to_string()));
                let _ = doc.append_child(parent, child);
            }
            _ => {
                if open.len() > 1 {
                    open.pop();
                }
            }
        }
    }
    (doc, root)
}

fn canonical(doc: &mut Document, root: NodeId) -> Option<String> {
    let mut diagnostics = CollectDiagnostics::default();
    clean(doc, root, &POLICY, &CleanOptions::default(), &mut diagnostics).ok()?;
    let options = SerializeOptions::default();
    let first = serialize_children(doc, root, &options).ok()?;
    let second = serialize_children(doc, root, &options).ok()?;
    assert_eq!(first, second, "serialization is not deterministic");
    Some(first)
}

fuzz_target!(|data: &[u8]| {
    let (mut doc, root) = build(data);
    let Some(text) = canonical(&mut doc, root) else {
        return;
    };

    let structure = POLICY.structure();
    let elements: Vec<NodeId> = doc
        .descendants(root)
        .filter(|&id| doc.is_element(id))
        .collect();
    for id in elements {
        let tag = doc.tag(id).unwrap_or_default();
        assert!(POLICY.allows_tag(tag), "disallowed tag {tag} survived");
        if structure.classify(tag) == Structure::Empty {
            assert!(doc.children(id).is_empty(), "{tag} kept children");
        }
    }

    let Ok(node) = doc.to_node(root) else {
        return;
    };
    let (mut again, again_root) = Document::from_node(&node);
    if let Some(second) = canonical(&mut again, again_root) {
        assert_eq!(text, second, "cleaning is not idempotent");
    }
});
