use crate::{Document, NodeData, NodeId};
use std::fmt::Write;

const INDENT_STEP: &str = "  ";
const PREVIEW_CHARS: usize = 40;

/// Deterministic one-line-per-node rendering of a subtree, for test comparisons.
///
/// Not a stable format. Attribute order is kept; text and comments are escaped so whitespace
/// differences stay visible.
pub fn snapshot(doc: &Document, root: NodeId) -> Vec<String> {
    let mut lines = Vec::new();
    walk(doc, root, |id, depth| {
        let mut line = INDENT_STEP.repeat(depth);
        write_node_line(&mut line, doc, id, None);
        lines.push(line);
        true
    });
    lines
}

/// Abbreviated outline of at most `cap` nodes, with long text cut to a short preview.
pub fn outline(doc: &Document, root: NodeId, cap: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut left = cap;
    walk(doc, root, |id, depth| {
        if left == 0 {
            return false;
        }
        left -= 1;
        if let Some(NodeData::Text(text)) = doc.data(id) {
            if text.trim().is_empty() {
                return true;
            }
        }
        let mut line = INDENT_STEP.repeat(depth);
        write_node_line(&mut line, doc, id, Some(PREVIEW_CHARS));
        lines.push(line);
        true
    });
    lines
}

fn walk(doc: &Document, root: NodeId, mut visit: impl FnMut(NodeId, usize) -> bool) {
    let mut stack = vec![(root, 0usize)];
    while let Some((id, depth)) = stack.pop() {
        if !doc.contains(id) {
            continue;
        }
        if !visit(id, depth) {
            return;
        }
        for &child in doc.children(id).iter().rev() {
            stack.push((child, depth + 1));
        }
    }
}

fn write_node_line(out: &mut String, doc: &Document, id: NodeId, preview: Option<usize>) {
    let Some(data) = doc.data(id) else {
        return;
    };
    match data {
        NodeData::Element { tag, attributes } => {
            out.push('<');
            out.push_str(tag);
            for (name, value) in attributes {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                write_escaped(out, value, preview);
                out.push('"');
            }
            out.push('>');
        }
        NodeData::Text(text) => {
            out.push('"');
            write_escaped(out, text, preview);
            out.push('"');
        }
        NodeData::Comment(text) => {
            out.push_str("<!-- ");
            write_escaped(out, text, preview);
            out.push_str(" -->");
        }
        NodeData::ProcessingInstruction { target, data } => {
            out.push_str("<?");
            out.push_str(target);
            out.push(' ');
            write_escaped(out, data, preview);
            out.push_str("?>");
        }
    }
}

fn write_escaped(out: &mut String, value: &str, max_chars: Option<usize>) {
    for (i, ch) in value.chars().enumerate() {
        if max_chars == Some(i) {
            out.push('…');
            return;
        }
        match ch {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            _ if ch.is_ascii() => out.push(ch),
            _ => {
                let _ = write!(out, "\\u{{{:X}}}", ch as u32);
            }
        }
    }
}
