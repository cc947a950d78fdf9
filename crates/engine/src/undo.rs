use relabel_core::Command;

/// Forward-oriented command history with a cursor.
///
/// `pc` is the index of the last applied entry, `None` when nothing is
/// applied. Entries after `pc` form the redo tail. Stored commands are
/// never rewritten; callers invert them on the way through.
#[derive(Debug, Clone, Default)]
pub struct CommandLog {
    entries: Vec<Command>,
    pc: Option<usize>,
}

impl CommandLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a log; a cursor past the end is clamped to the head.
    pub fn from_entries(entries: Vec<Command>, pc: Option<usize>) -> Self {
        let pc = match pc {
            Some(i) if i >= entries.len() => entries.len().checked_sub(1),
            other => other,
        };
        Self { entries, pc }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn pc(&self) -> Option<usize> {
        self.pc
    }

    pub fn entries(&self) -> &[Command] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&Command> {
        self.entries.get(index)
    }

    pub fn current(&self) -> Option<&Command> {
        self.pc.and_then(|i| self.entries.get(i))
    }

    pub fn is_at_tail(&self) -> bool {
        self.pc.is_none()
    }

    pub fn is_at_head(&self) -> bool {
        self.pc == self.entries.len().checked_sub(1)
    }

    /// Entry that `undo` would revert.
    pub fn undo_candidate(&self) -> Option<(usize, &Command)> {
        self.current().zip(self.pc).map(|(c, i)| (i, c))
    }

    /// Entry that `redo` would re-apply.
    pub fn redo_candidate(&self) -> Option<(usize, &Command)> {
        let next = self.next_index();
        self.entries.get(next).map(|c| (next, c))
    }

    /// Drop the redo tail, append `command` and move the cursor onto it.
    pub fn push(&mut self, command: Command) -> usize {
        self.entries.truncate(self.next_index());
        self.entries.push(command);
        let index = self.entries.len() - 1;
        self.pc = Some(index);
        index
    }

    pub fn step_back(&mut self) {
        self.pc = self.pc.and_then(|i| i.checked_sub(1));
    }

    pub fn step_forward(&mut self) {
        if !self.is_at_head() {
            self.pc = Some(self.next_index());
        }
    }

    fn next_index(&self) -> usize {
        self.pc.map_or(0, |i| i + 1)
    }
}
