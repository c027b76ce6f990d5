//! Indentation-aware text formatting shared by the report renderers.

use std::fmt;

/// A line-oriented formatter that tracks indentation.
#[derive(Debug)]
pub struct CodeFormatter {
    output: String,
    indent_level: usize,
    indent_str: String,
    at_line_start: bool,
}

impl CodeFormatter {
    /// Create a new formatter with the given indent string.
    pub fn new(indent_str: &str) -> Self {
        Self {
            output: String::new(),
            indent_level: 0,
            indent_str: indent_str.to_string(),
            at_line_start: true,
        }
    }

    /// Create a formatter with default settings (2 spaces).
    pub fn default_indent() -> Self {
        Self::new("  ")
    }

    pub fn indent(&mut self) {
        self.indent_level += 1;
    }

    pub fn dedent(&mut self) {
        self.indent_level = self.indent_level.saturating_sub(1);
    }

    /// Run `f` one indentation level deeper.
    pub fn nested<F: FnOnce(&mut Self)>(&mut self, f: F) {
        self.indent();
        f(self);
        self.dedent();
    }

    pub fn write(&mut self, s: &str) {
        for c in s.chars() {
            if c == '\n' {
                self.output.push('\n');
                self.at_line_start = true;
            } else {
                if self.at_line_start {
                    for _ in 0..self.indent_level {
                        self.output.push_str(&self.indent_str);
                    }
                    self.at_line_start = false;
                }
                self.output.push(c);
            }
        }
    }

    pub fn writeln(&mut self, s: &str) {
        self.write(s);
        self.write("\n");
    }

    pub fn finish(self) -> String {
        self.output
    }
}

impl fmt::Write for CodeFormatter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write(s);
        Ok(())
    }
}

/// Format a list with separators using a custom formatter.
pub fn format_list_with<T, F: Fn(&T) -> String>(items: &[T], sep: &str, f: F) -> String {
    items
        .iter()
        .map(f)
        .collect::<Vec<_>>()
        .join(sep)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::Write;

    #[test]
    fn test_nested_indentation() {
        let mut out = CodeFormatter::default_indent();
        out.writeln("Found a function");
        out.nested(|f| {
            f.writeln("jacobi");
            f.nested(|f| f.writeln("Found a loop"));
        });
        out.writeln("Done");
        assert_eq!(out.finish(), "Found a function\n  jacobi\n    Found a loop\nDone\n");
    }

    #[test]
    fn test_fmt_write() {
        let mut out = CodeFormatter::new("\t");
        out.indent();
        write!(out, "step = {}", 1).unwrap();
        assert_eq!(out.finish(), "\tstep = 1");
    }

    #[test]
    fn test_dedent_saturates() {
        let mut out = CodeFormatter::default_indent();
        out.dedent();
        out.writeln("x");
        assert_eq!(out.finish(), "x\n");
    }

    #[test]
    fn test_format_list_with() {
        let items = [1, 2, 3];
        assert_eq!(format_list_with(&items, ", ", |x| format!("i{}", x)), "i1, i2, i3");
    }
}
