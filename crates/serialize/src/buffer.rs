//! Indentation-aware line buffer.
//!
//! Frames form a stack: [`LineBuffer::spawn`] flushes the active frame and opens a child one
//! level deeper, [`LineBuffer::close`] flushes the child and appends its lines to the parent.
//! Each frame carries flags that are cleared manually, on the next write or on the next flush.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Flag {
    /// Inside `pre`: text is written verbatim.
    Preformatted,
    /// The last thing written was a block with indented content.
    AfterIndentedBlock,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Scope {
    Manual,
    Write,
    Flush,
}

#[derive(Debug, Default)]
struct Frame {
    lines: Vec<String>,
    current: String,
    flags: Vec<(Flag, Scope)>,
}

impl Frame {
    fn clear_scope(&mut self, scope: Scope) {
        self.flags.retain(|&(_, s)| s != scope);
    }
}

#[derive(Debug)]
pub(crate) struct LineBuffer<'a> {
    frames: Vec<Frame>,
    indent: &'a str,
}

impl<'a> LineBuffer<'a> {
    pub(crate) fn new(indent: &'a str) -> Self {
        Self {
            frames: vec![Frame::default()],
            indent,
        }
    }

    fn active(&mut self) -> &mut Frame {
        if self.frames.is_empty() {
            self.frames.push(Frame::default());
        }
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    pub(crate) fn depth(&self) -> usize {
        self.frames.len().saturating_sub(1)
    }

    pub(crate) fn write(&mut self, text: &str) {
        let frame = self.active();
        frame.clear_scope(Scope::Write);
        frame.current.push_str(text);
    }

    /// Commits the current line with indentation. An empty line is only committed when
    /// `always` is set, and then without indentation.
    pub(crate) fn flush(&mut self, always: bool) {
        let depth = self.depth();
        let indent = self.indent;
        let frame = self.active();
        frame.clear_scope(Scope::Flush);
        if frame.current.is_empty() {
            if always {
                frame.lines.push(String::new());
            }
            return;
        }
        let mut line = indent.repeat(depth);
        line.push_str(&frame.current);
        frame.current.clear();
        frame.lines.push(line);
    }

    pub(crate) fn end_line(&mut self, only_if_content: bool) {
        self.flush(!only_if_content);
    }

    pub(crate) fn spawn(&mut self) {
        self.flush(false);
        self.frames.push(Frame::default());
    }

    /// Closes the innermost spawned frame. The root frame is never closed here.
    pub(crate) fn close(&mut self) {
        if self.frames.len() < 2 {
            return;
        }
        self.flush(false);
        if let Some(child) = self.frames.pop() {
            self.active().lines.extend(child.lines);
        }
    }

    pub(crate) fn set_flag(&mut self, flag: Flag, scope: Scope) {
        let frame = self.active();
        frame.flags.retain(|&(f, _)| f != flag);
        frame.flags.push((flag, scope));
    }

    pub(crate) fn clear_flag(&mut self, flag: Flag) {
        self.active().flags.retain(|&(f, _)| f != flag);
    }

    pub(crate) fn flagged(&self, flag: Flag) -> bool {
        self.frames
            .last()
            .is_some_and(|frame| frame.flags.iter().any(|&(f, _)| f == flag))
    }

    /// Closes every frame and joins the lines.
    pub(crate) fn finish(mut self) -> String {
        while self.frames.len() > 1 {
            self.close();
        }
        self.flush(false);
        self.frames
            .pop()
            .map(|frame| frame.lines.join("\n"))
            .unwrap_or_default()
    }
}
