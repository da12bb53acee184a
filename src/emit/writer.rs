//! Indentation-aware line builder shared by the language templates.

/// Accumulates source text one line at a time.
///
/// Lines are terminated with `\n` on every platform so that output is
/// byte-identical wherever it is generated. Blank lines carry no indentation.
#[derive(Debug)]
pub struct SourceWriter {
    buf: String,
    depth: usize,
    indent: &'static str,
}

impl SourceWriter {
    pub fn new(indent: &'static str) -> Self {
        Self {
            buf: String::new(),
            depth: 0,
            indent,
        }
    }

    /// Write one line at the current depth.
    pub fn line(&mut self, text: impl AsRef<str>) -> &mut Self {
        let text = text.as_ref();
        if text.is_empty() {
            self.buf.push('\n');
            return self;
        }
        for _ in 0..self.depth {
            self.buf.push_str(self.indent);
        }
        self.buf.push_str(text);
        self.buf.push('\n');
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.buf.push('\n');
        self
    }

    /// Write `text` then indent everything after it.
    pub fn open(&mut self, text: impl AsRef<str>) -> &mut Self {
        self.line(text);
        self.depth += 1;
        self
    }

    /// Dedent, then write `text`.
    pub fn close(&mut self, text: impl AsRef<str>) -> &mut Self {
        self.depth = self.depth.saturating_sub(1);
        self.line(text)
    }

    pub fn indent(&mut self) -> &mut Self {
        self.depth += 1;
        self
    }

    pub fn dedent(&mut self) -> &mut Self {
        self.depth = self.depth.saturating_sub(1);
        self
    }

    pub fn finish(self) -> String {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_blocks() {
        let mut w = SourceWriter::new("    ");
        w.open("namespace A").open("{").line("x").close("}").close("");
        assert_eq!(w.finish(), "namespace A\n    {\n        x\n    }\n\n");
    }

    #[test]
    fn test_blank_lines_have_no_indent() {
        let mut w = SourceWriter::new("  ");
        w.indent().line("a").blank().line("").line("b");
        assert_eq!(w.finish(), "  a\n\n\n  b\n");
    }

    #[test]
    fn test_close_at_depth_zero_does_not_underflow() {
        let mut w = SourceWriter::new("\t");
        w.close("}").dedent().line("x");
        assert_eq!(w.finish(), "}\nx\n");
    }
}
