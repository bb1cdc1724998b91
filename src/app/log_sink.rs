// app/log_sink.rs - Log Pane Contents
//
// Append-only, ordered lines shown in the form's scrollable log area.
// No size bound: a session is short-lived and manually triggered.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogSink {
    lines: Vec<String>,
}

impl LogSink {
    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Everything joined with newlines, as rendered in the pane
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}
