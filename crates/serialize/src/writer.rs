use dom::{Document, NodeData, NodeId, default_structure, is_empty_tag};

use crate::SerializeError;
use crate::SerializeOptions;
use crate::buffer::{Flag, LineBuffer, Scope};
use crate::entities::escape_into;

/// Serializes `id` and its subtree.
pub fn serialize(
    doc: &Document,
    id: NodeId,
    options: &SerializeOptions,
) -> Result<String, SerializeError> {
    if !doc.contains(id) {
        return Err(SerializeError::UnknownNode(id));
    }
    Ok(Writer::new(doc, options, Some(id)).run(&[id]))
}

/// Serializes the children of `id`, the usual "inner" form of a container.
pub fn serialize_children(
    doc: &Document,
    id: NodeId,
    options: &SerializeOptions,
) -> Result<String, SerializeError> {
    if !doc.contains(id) {
        return Err(SerializeError::UnknownNode(id));
    }
    Ok(Writer::new(doc, options, None).run(doc.children(id)))
}

enum Task {
    Visit(NodeId),
    CloseInline(NodeId),
    EndBlock { id: NodeId, spawned: bool },
    EndPre { id: NodeId, was_preformatted: bool },
}

struct Writer<'a> {
    doc: &'a Document,
    options: &'a SerializeOptions,
    buffer: LineBuffer<'a>,
    /// Node serialized on its own; its surroundings in the document are ignored.
    detached: Option<NodeId>,
}

fn is_block_tag(tag: &str) -> bool {
    default_structure(tag).is_block()
}

impl<'a> Writer<'a> {
    fn new(doc: &'a Document, options: &'a SerializeOptions, detached: Option<NodeId>) -> Self {
        Self {
            doc,
            options,
            buffer: LineBuffer::new(&options.indent),
            detached,
        }
    }

    fn run(mut self, nodes: &[NodeId]) -> String {
        let mut tasks: Vec<Task> = nodes.iter().rev().map(|&id| Task::Visit(id)).collect();
        while let Some(task) = tasks.pop() {
            match task {
                Task::Visit(id) => self.visit(id, &mut tasks),
                Task::CloseInline(id) => self.close_tag(id),
                Task::EndBlock { id, spawned } => self.end_block(id, spawned),
                Task::EndPre {
                    id,
                    was_preformatted,
                } => {
                    self.close_tag(id);
                    self.buffer.end_line(true);
                    if !was_preformatted {
                        self.buffer.clear_flag(Flag::Preformatted);
                    }
                }
            }
        }
        let out = self.buffer.finish();
        log::trace!(target: "serialize", "wrote {} bytes", out.len());
        out
    }

    fn is_block_element(&self, id: NodeId) -> bool {
        self.doc.tag(id).is_some_and(is_block_tag)
    }

    fn push_children(&self, id: NodeId, tasks: &mut Vec<Task>) {
        tasks.extend(self.doc.children(id).iter().rev().map(|&c| Task::Visit(c)));
    }

    fn visit(&mut self, id: NodeId, tasks: &mut Vec<Task>) {
        let Some(data) = self.doc.data(id) else {
            return;
        };
        match data {
            NodeData::Text(text) => self.text(id, text),
            NodeData::Comment(text) => {
                let mut out = String::from("<!--");
                escape_into(&mut out, text, self.options.escape_non_ascii, false);
                out.push_str("-->");
                self.buffer.write(&out);
            }
            NodeData::ProcessingInstruction { target, data } => {
                self.buffer.write(&format!("<?{target} {data}?>"));
            }
            NodeData::Element { tag, .. } => {
                let has_children = !self.doc.children(id).is_empty();
                if tag == "pre" {
                    let was_preformatted = self.buffer.flagged(Flag::Preformatted);
                    self.buffer.set_flag(Flag::Preformatted, Scope::Manual);
                    self.open_tag(id, false);
                    tasks.push(Task::EndPre {
                        id,
                        was_preformatted,
                    });
                    self.push_children(id, tasks);
                } else if !has_children && is_empty_tag(tag) {
                    self.open_tag(id, self.options.xhtml);
                    if tag == "param" {
                        self.buffer.end_line(false);
                    }
                } else if is_block_tag(tag)
                    && has_children
                    && !self.buffer.flagged(Flag::Preformatted)
                {
                    self.start_block(id, tasks);
                } else {
                    self.open_tag(id, false);
                    tasks.push(Task::CloseInline(id));
                    self.push_children(id, tasks);
                }
            }
        }
    }

    fn start_block(&mut self, id: NodeId, tasks: &mut Vec<Task>) {
        if self.buffer.flagged(Flag::AfterIndentedBlock) {
            self.buffer.end_line(false);
        }
        let spawned = self
            .doc
            .children(id)
            .iter()
            .any(|&c| self.is_block_element(c));
        self.open_tag(id, false);
        if spawned {
            self.buffer.spawn();
        }
        tasks.push(Task::EndBlock { id, spawned });
        self.push_children(id, tasks);
    }

    fn end_block(&mut self, id: NodeId, spawned: bool) {
        if spawned {
            self.buffer.close();
            self.buffer.end_line(true);
        }
        self.close_tag(id);
        self.buffer.end_line(false);
        if spawned {
            self.buffer.set_flag(Flag::AfterIndentedBlock, Scope::Write);
        }
    }

    fn open_tag(&mut self, id: NodeId, self_close: bool) {
        let Some(NodeData::Element { tag, attributes }) = self.doc.data(id) else {
            return;
        };
        let mut out = String::with_capacity(tag.len() + 2);
        out.push('<');
        out.push_str(tag);
        for (name, value) in attributes {
            if name.starts_with('_') {
                continue;
            }
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            escape_into(&mut out, value, self.options.escape_non_ascii, true);
            out.push('"');
        }
        out.push_str(if self_close { " />" } else { ">" });
        self.buffer.write(&out);
    }

    fn close_tag(&mut self, id: NodeId) {
        if let Some(tag) = self.doc.tag(id) {
            self.buffer.write(&format!("</{tag}>"));
        }
    }

    /// Whether leading and trailing whitespace of text `id` sits against a block boundary.
    fn block_boundaries(&self, id: NodeId) -> (bool, bool) {
        if self.detached == Some(id) {
            return (false, false);
        }
        let Some(parent) = self.doc.parent(id) else {
            return (false, false);
        };
        let parent_is_block = self.is_block_element(parent);
        let siblings = self.doc.children(parent);
        let first = siblings.first() == Some(&id);
        let last = siblings.last() == Some(&id);
        let after_block = self
            .doc
            .prev_sibling(id)
            .is_some_and(|s| self.is_block_element(s));
        let before_block = self
            .doc
            .next_sibling(id)
            .is_some_and(|s| self.is_block_element(s));
        (
            (parent_is_block && first) || after_block,
            (parent_is_block && last) || before_block,
        )
    }

    fn text(&mut self, id: NodeId, text: &str) {
        let mut out = String::with_capacity(text.len());
        if self.buffer.flagged(Flag::Preformatted) {
            escape_into(&mut out, text, self.options.escape_non_ascii, false);
        } else {
            let collapsed = collapse_whitespace(text);
            let (trim_start, trim_end) = self.block_boundaries(id);
            let mut slice = collapsed.as_str();
            if trim_start {
                slice = slice.trim_start_matches(' ');
            }
            if trim_end {
                slice = slice.trim_end_matches(' ');
            }
            escape_into(&mut out, slice, self.options.escape_non_ascii, false);
        }
        if !out.is_empty() {
            self.buffer.write(&out);
        }
    }
}

/// Runs of space, tab, CR and LF become one space. Other whitespace (NBSP) is kept.
fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_run = false;
    for ch in text.chars() {
        if matches!(ch, ' ' | '\t' | '\r' | '\n') {
            if !in_run {
                out.push(' ');
            }
            in_run = true;
        } else {
            out.push(ch);
            in_run = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use dom::Node;

    fn el(tag: &str, children: Vec<Node>) -> Node {
        Node::Element {
            tag: tag.to_string(),
            attributes: Vec::new(),
            children,
        }
    }

    fn render(node: Node) -> String {
        let (doc, root) = Document::from_node(&node);
        serialize(&doc, root, &SerializeOptions::default()).unwrap()
    }

    #[test]
    fn collapse_keeps_nbsp() {
        assert_eq!(collapse_whitespace("a \t\n b\u{a0}\u{a0}c"), "a b\u{a0}\u{a0}c");
    }

    #[test]
    fn paragraphs_stay_on_one_line() {
        assert_eq!(
            render(el("p", vec![Node::text("\n  hello \n world  ")])),
            "<p>hello world</p>"
        );
    }

    #[test]
    fn inline_whitespace_is_kept_between_words() {
        assert_eq!(
            render(el(
                "p",
                vec![Node::text(" a "), el("b", vec![Node::text("bold")]), Node::text(" c ")]
            )),
            "<p>a <b>bold</b> c</p>"
        );
    }

    #[test]
    fn block_children_are_indented() {
        assert_eq!(
            render(el(
                "div",
                vec![el("p", vec![Node::text("a")]), el("p", vec![Node::text("b")])]
            )),
            "<div>\n\t<p>a</p>\n\t<p>b</p>\n</div>"
        );
    }

    #[test]
    fn preformatted_text_is_verbatim() {
        assert_eq!(
            render(el(
                "div",
                vec![el("pre", vec![Node::text("a\n  b"), el("p", vec![Node::text(" c ")])])]
            )),
            "<div>\n\t<pre>a\n  b<p> c </p></pre>\n</div>"
        );
    }

    #[test]
    fn empty_tags() {
        let img = Node::Element {
            tag: "img".into(),
            attributes: vec![("src".into(), "a&b.png".into()), ("_tmp".into(), "x".into())],
            children: Vec::new(),
        };
        assert_eq!(render(img.clone()), "<img src=\"a&amp;b.png\" />");
        let (doc, root) = Document::from_node(&img);
        let html = SerializeOptions {
            xhtml: false,
            ..SerializeOptions::default()
        };
        assert_eq!(serialize(&doc, root, &html).unwrap(), "<img src=\"a&amp;b.png\">");
        assert_eq!(
            render(el("object", vec![el("param", vec![]), el("param", vec![])])),
            "<object><param />\n<param />\n</object>"
        );
    }

    #[test]
    fn comments_and_instructions() {
        assert_eq!(
            render(el(
                "span",
                vec![
                    Node::comment(" é "),
                    Node::ProcessingInstruction {
                        target: "php".into(),
                        data: "echo 1 < 2;".into()
                    }
                ]
            )),
            "<span><!-- &eacute; --><?php echo 1 < 2;?></span>"
        );
    }

    #[test]
    fn unknown_node_is_an_error() {
        let (doc, _) = Document::from_node(&el("p", vec![]));
        assert_eq!(
            serialize(&doc, NodeId(7), &SerializeOptions::default()),
            Err(SerializeError::UnknownNode(NodeId(7)))
        );
    }
}
