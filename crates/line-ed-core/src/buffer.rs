/// Line buffer with a 1-based cursor and a search status that gates edits.
///
/// Every operation consumes the buffer and returns the next one. Lines are
/// shared copy-on-write, so `buf.clone()` forks an edit chain cheaply and the
/// fork never observes edits made on the other branch.
use std::fmt;
use std::sync::Arc;

use crate::io::{join_lines, split_lines, SourceFile};
use crate::search::{Direction, LineMatcher};

/// Outcome of the most recent search.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    #[default]
    Ok,
    /// The last search found nothing. Edits are skipped until the cursor
    /// is moved or a search succeeds.
    NotFound,
}

/// An ordered sequence of lines plus a cursor and a status flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buffer {
    source: Option<SourceFile>,
    lines: Arc<Vec<String>>,
    line_num: usize,
    col: usize,
    status: Status,
}

impl Default for Buffer {
    fn default() -> Self {
        Self::from_lines(Vec::new(), None)
    }
}

impl From<&str> for Buffer {
    fn from(text: &str) -> Self {
        Self::from_lines(split_lines(text), None)
    }
}

impl fmt::Display for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&join_lines(&self.lines))
    }
}

impl Buffer {
    /// Creates a buffer with the cursor at `1:1` and status `Ok`.
    pub fn from_lines(lines: Vec<String>, source: Option<SourceFile>) -> Self {
        Self {
            source,
            lines: Arc::new(lines),
            line_num: 1,
            col: 1,
            status: Status::Ok,
        }
    }

    /// The file this buffer was loaded from, if any.
    pub fn source(&self) -> Option<&SourceFile> {
        self.source.as_ref()
    }

    /// Replaces the source handle, e.g. for "save as".
    #[must_use]
    pub fn with_source(self, source: Option<SourceFile>) -> Self {
        Self { source, ..self }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len_lines(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Cursor line, 1-based. May point past the last line.
    pub fn line_num(&self) -> usize {
        self.line_num
    }

    /// Cursor column, 1-based. Never checked against the line length.
    pub fn col(&self) -> usize {
        self.col
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    /// Returns the line at a 1-based line number.
    pub fn line_at(&self, line_num: usize) -> Option<&str> {
        line_num
            .checked_sub(1)
            .and_then(|idx| self.lines.get(idx))
            .map(String::as_str)
    }

    /// Returns the line under the cursor, or `None` when the cursor is out of range.
    pub fn current_line(&self) -> Option<&str> {
        self.line_at(self.line_num)
    }

    /// Lazily yields exactly `count` entries starting at the cursor line.
    ///
    /// Entries that fall outside the buffer are `None` rather than being
    /// dropped, so the length is always `count`.
    pub fn lines_from(&self, count: usize) -> impl ExactSizeIterator<Item = Option<&str>> + '_ {
        (0..count).map(move |offset| self.line_at(self.line_num.saturating_add(offset)))
    }

    // ── Navigation ──────────────────────────────────────────────────

    /// Moves the cursor to an absolute position and resets the status to `Ok`.
    ///
    /// Both coordinates are floored at 1; there is no upper bound.
    #[must_use]
    pub fn move_to(self, line_num: usize, col: usize) -> Self {
        Self {
            line_num: line_num.max(1),
            col: col.max(1),
            status: Status::Ok,
            ..self
        }
    }

    /// Moves the cursor by signed offsets from its current position.
    #[must_use]
    pub fn move_relative(self, line_offset: isize, col_offset: isize) -> Self {
        let line_num = self.line_num.saturating_add_signed(line_offset);
        let col = self.col.saturating_add_signed(col_offset);
        self.move_to(line_num, col)
    }

    /// Moves the cursor to the last line, keeping the column.
    #[must_use]
    pub fn move_to_end(self) -> Self {
        let last = self.lines.len();
        let col = self.col;
        self.move_to(last, col)
    }

    // ── Search ──────────────────────────────────────────────────────

    /// Finds the nearest matching line in `direction`, starting at the cursor line.
    ///
    /// The cursor line itself is part of the scanned range, so repeating a
    /// search from a matching line stays on that line. On a match the cursor
    /// moves there (column kept) and the status becomes `Ok`; otherwise only
    /// the status changes, to `NotFound`.
    #[must_use]
    pub fn search<M>(self, matcher: &M, direction: Direction) -> Self
    where
        M: LineMatcher + ?Sized,
    {
        let start = self.line_num - 1;
        let numbered = self.lines.iter().enumerate();
        let found = match direction {
            Direction::Down => numbered
                .skip(start)
                .find(|(_, line)| matcher.is_match(line)),
            Direction::Up => numbered
                .take(start.saturating_add(1))
                .rev()
                .find(|(_, line)| matcher.is_match(line)),
        }
        .map(|(idx, _)| idx + 1);

        match found {
            Some(line_num) => {
                let col = self.col;
                self.move_to(line_num, col)
            }
            None => Self {
                status: Status::NotFound,
                ..self
            },
        }
    }

    // ── Mutation ────────────────────────────────────────────────────

    /// Runs `edit` only while the status is `Ok`; otherwise returns `self` untouched.
    fn if_ok(self, edit: impl FnOnce(Self) -> Self) -> Self {
        match self.status {
            Status::Ok => edit(self),
            Status::NotFound => self,
        }
    }

    /// Inserts `text` before the cursor line and advances the cursor by one line.
    ///
    /// The insert index is clamped to the end of the buffer, so a cursor past
    /// the end appends.
    #[must_use]
    pub fn insert_line(self, text: impl Into<String>) -> Self {
        self.if_ok(|mut buf| {
            let idx = (buf.line_num - 1).min(buf.lines.len());
            Arc::make_mut(&mut buf.lines).insert(idx, text.into());
            buf.line_num = buf.line_num.saturating_add(1);
            buf.status = Status::Ok;
            buf
        })
    }

    /// Inserts each text in order, as repeated [`Buffer::insert_line`] calls.
    ///
    /// Always finishes with status `Ok`, even when the input was `NotFound`
    /// and every individual insert was skipped.
    #[must_use]
    pub fn insert_lines<I, S>(self, texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let buf = texts
            .into_iter()
            .fold(self, |buf, text| buf.insert_line(text));
        Self {
            status: Status::Ok,
            ..buf
        }
    }

    /// Removes the cursor line. The cursor does not move.
    ///
    /// Deleting with the cursor past the end leaves the lines unchanged.
    #[must_use]
    pub fn delete_line(self) -> Self {
        self.if_ok(|mut buf| {
            let idx = buf.line_num - 1;
            if idx < buf.lines.len() {
                Arc::make_mut(&mut buf.lines).remove(idx);
            }
            buf.status = Status::Ok;
            buf
        })
    }

    /// Removes `count` consecutive lines starting at the cursor line.
    #[must_use]
    pub fn delete_lines(self, count: usize) -> Self {
        // Deletes past the last line are no-ops, so never loop more than len times.
        let count = count.min(self.lines.len());
        (0..count).fold(self, |buf, _| buf.delete_line())
    }

    /// Replaces the cursor line with the text produced by `replace`.
    ///
    /// `replace` receives the buffer with the line already removed and the
    /// original text (empty when the cursor is out of range). The new line
    /// is inserted the same way [`Buffer::insert_line`] does, so the cursor
    /// ends up one line past the replaced line.
    #[must_use]
    pub fn replace_line<F>(self, replace: F) -> Self
    where
        F: FnOnce(&Buffer, &str) -> String,
    {
        self.if_ok(|buf| {
            let original = buf.current_line().unwrap_or_default().to_owned();
            let removed = buf.delete_line();
            let text = replace(&removed, &original);
            removed.insert_line(text)
        })
    }

    /// Replaces the first occurrence of `find` in the cursor line with `replace`.
    #[must_use]
    pub fn replace_in_line(self, find: &str, replace: &str) -> Self {
        self.replace_line(|_, line| line.replacen(find, replace, 1))
    }
}
