//! Shared helpers for building trees and comparing line-oriented output in tests.

use dom::{Document, Node, NodeId};

pub fn el(tag: &str, children: Vec<Node>) -> Node {
    Node::Element {
        tag: tag.to_string(),
        attributes: Vec::new(),
        children,
    }
}

pub fn el_attrs(tag: &str, attributes: &[(&str, &str)], children: Vec<Node>) -> Node {
    Node::Element {
        tag: tag.to_string(),
        attributes: attributes
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        children,
    }
}

pub fn text(value: &str) -> Node {
    Node::text(value)
}

pub fn comment(value: &str) -> Node {
    Node::comment(value)
}

pub fn br() -> Node {
    el("br", Vec::new())
}

/// Loads `node` into a fresh document.
pub fn load(node: &Node) -> (Document, NodeId) {
    Document::from_node(node)
}

/// Compares snapshot lines and panics with the first differing line, the element lines that
/// enclose it, and the whole actual snapshot.
pub fn assert_lines_eq(expected: &[&str], actual: &[String]) {
    if let Some(index) = first_mismatch(expected, actual) {
        panic!("{}", describe_mismatch(expected, actual, index));
    }
}

fn first_mismatch(expected: &[&str], actual: &[String]) -> Option<usize> {
    let len = expected.len().max(actual.len());
    (0..len).find(|&i| expected.get(i).copied() != actual.get(i).map(String::as_str))
}

fn indent(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

/// Element lines enclosing snapshot line `index`, outermost first.
fn enclosing(lines: &[String], index: usize) -> Vec<&str> {
    let Some(line) = lines.get(index) else {
        return Vec::new();
    };
    let mut depth = indent(line);
    let mut path = Vec::new();
    for line in lines[..index].iter().rev() {
        if depth == 0 {
            break;
        }
        if indent(line) < depth {
            depth = indent(line);
            path.push(line.trim_start());
        }
    }
    path.reverse();
    path
}

fn describe_mismatch(expected: &[&str], actual: &[String], index: usize) -> String {
    let missing = "<missing>";
    let mut out = format!("snapshots differ at line {}\n", index + 1);
    let path = enclosing(actual, index);
    if !path.is_empty() {
        out.push_str(&format!("  inside: {}\n", path.join(" > ")));
    }
    out.push_str(&format!("  expected: {}\n", expected.get(index).copied().unwrap_or(missing)));
    out.push_str(&format!(
        "    actual: {}\n",
        actual.get(index).map_or(missing, String::as_str)
    ));
    out.push_str(&format!(
        "expected {} lines, actual {} lines; actual snapshot:\n",
        expected.len(),
        actual.len()
    ));
    for line in actual {
        out.push_str(line);
        out.push('\n');
    }
    out
}
