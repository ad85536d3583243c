//! Ed-style command scripts that drive a [`Buffer`] through a chain of edits.
//!
//! One command per line:
//!
//! | command       | effect                                      |
//! |---------------|---------------------------------------------|
//! | `12`, `12:4`  | move to line 12 (column 4)                  |
//! | `+3`, `-2`    | move relative to the current line           |
//! | `$`           | move to the last line                       |
//! | `/re/`        | search down, starting at the current line   |
//! | `?re?`        | search up, starting at the current line     |
//! | `i text`      | insert a line before the current line       |
//! | `d`, `d3`     | delete one or more lines                    |
//! | `s/old/new/`  | replace the first `old` in the current line |
//! | `p`, `p5`     | print lines starting at the current line    |
//!
//! Blank lines and lines starting with `#` are ignored.

use std::collections::HashMap;
use std::io::Write;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::buffer::{Buffer, Status};
use crate::search::{Direction, Pattern, SearchOptions};

/// A single parsed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Absolute move. `col: None` keeps the current column.
    MoveTo { line: usize, col: Option<usize> },
    MoveBy(isize),
    MoveToEnd,
    Search {
        pattern: String,
        direction: Direction,
    },
    Insert(String),
    Delete(usize),
    Substitute {
        find: String,
        replace: String,
    },
    /// Print lines from the cursor. `None` uses the session default.
    Print(Option<usize>),
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(input: &str) -> Result<Self> {
        let raw = input.trim_start().trim_end_matches(['\r', '\n']);

        // Insert text is taken verbatim, trailing whitespace included.
        if raw == "i" {
            return Ok(Self::Insert(String::new()));
        }
        if let Some(text) = raw.strip_prefix("i ") {
            return Ok(Self::Insert(text.to_owned()));
        }

        let cmd = raw.trim_end();
        let Some(first) = cmd.chars().next() else {
            anyhow::bail!("empty command");
        };
        let rest = &cmd[first.len_utf8()..];

        match first {
            '/' => parse_search(rest, '/', Direction::Down),
            '?' => parse_search(rest, '?', Direction::Up),
            '$' if rest.is_empty() => Ok(Self::MoveToEnd),
            '+' | '-' => {
                let amount: isize = if rest.is_empty() {
                    1
                } else {
                    rest.parse::<isize>()
                        .with_context(|| format!("invalid line offset: {cmd}"))?
                };
                let amount = if first == '-' {
                    amount
                        .checked_neg()
                        .with_context(|| format!("invalid line offset: {cmd}"))?
                } else {
                    amount
                };
                Ok(Self::MoveBy(amount))
            }
            '0'..='9' => parse_move_to(cmd),
            'd' => Ok(Self::Delete(parse_count(rest, cmd)?.unwrap_or(1))),
            'p' => Ok(Self::Print(parse_count(rest, cmd)?)),
            's' => parse_substitute(rest),
            _ => anyhow::bail!("unknown command: {cmd}"),
        }
    }
}

fn parse_search(rest: &str, delimiter: char, direction: Direction) -> Result<Command> {
    let pattern = rest.strip_suffix(delimiter).unwrap_or(rest);
    if pattern.is_empty() {
        anyhow::bail!("empty search pattern");
    }
    Ok(Command::Search {
        pattern: pattern.to_owned(),
        direction,
    })
}

fn parse_move_to(cmd: &str) -> Result<Command> {
    let (line, col) = match cmd.split_once(':') {
        Some((line, col)) => (line, Some(col)),
        None => (cmd, None),
    };
    let line = line
        .parse::<usize>()
        .with_context(|| format!("invalid line number: {cmd}"))?;
    let col = col
        .map(str::parse::<usize>)
        .transpose()
        .with_context(|| format!("invalid column: {cmd}"))?;
    Ok(Command::MoveTo { line, col })
}

fn parse_count(rest: &str, cmd: &str) -> Result<Option<usize>> {
    if rest.is_empty() {
        return Ok(None);
    }
    rest.parse::<usize>()
        .map(Some)
        .with_context(|| format!("invalid count: {cmd}"))
}

fn parse_substitute(rest: &str) -> Result<Command> {
    let Some(delimiter) = rest.chars().next() else {
        anyhow::bail!("substitute needs a delimiter, e.g. s/old/new/");
    };
    let body = &rest[delimiter.len_utf8()..];
    let (find, replace) = body
        .split_once(delimiter)
        .with_context(|| format!("substitute is missing its replacement: s{rest}"))?;
    let replace = replace.strip_suffix(delimiter).unwrap_or(replace);
    if find.is_empty() {
        anyhow::bail!("substitute needs text to find");
    }
    Ok(Command::Substitute {
        find: find.to_owned(),
        replace: replace.to_owned(),
    })
}

/// An ordered list of commands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    commands: Vec<Command>,
}

impl Script {
    /// Parses script text, one command per line.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first line that fails to parse.
    pub fn parse(text: &str) -> Result<Self> {
        let mut commands = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let command = line
                .parse::<Command>()
                .with_context(|| format!("script line {}", idx + 1))?;
            commands.push(command);
        }
        Ok(Self { commands })
    }

    pub fn from_commands(commands: Vec<Command>) -> Self {
        Self { commands }
    }

    pub fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Extend<Command> for Script {
    fn extend<T: IntoIterator<Item = Command>>(&mut self, iter: T) {
        self.commands.extend(iter);
    }
}

/// Runs commands against buffers, caching compiled search patterns.
#[derive(Debug)]
pub struct Session {
    search: SearchOptions,
    print_count: usize,
    patterns: HashMap<String, Pattern>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SearchOptions::default(), 1)
    }
}

impl Session {
    /// `search` supplies the regex/case/word flags for every search; its
    /// query is ignored. `print_count` is used by a bare `p`.
    pub fn new(search: SearchOptions, print_count: usize) -> Self {
        Self {
            search,
            print_count,
            patterns: HashMap::new(),
        }
    }

    /// Runs every command in order, threading the buffer through.
    ///
    /// # Errors
    ///
    /// Returns an error if a search pattern is invalid or output fails.
    pub fn run(&mut self, buffer: Buffer, script: &Script, out: &mut impl Write) -> Result<Buffer> {
        script
            .commands()
            .iter()
            .try_fold(buffer, |buffer, command| self.execute(buffer, command, &mut *out))
    }

    /// Applies one command.
    ///
    /// # Errors
    ///
    /// Returns an error if a search pattern is invalid or output fails.
    pub fn execute(
        &mut self,
        buffer: Buffer,
        command: &Command,
        out: &mut impl Write,
    ) -> Result<Buffer> {
        tracing::debug!("{command:?} at {}:{}", buffer.line_num(), buffer.col());
        let next = match command {
            Command::MoveTo { line, col } => {
                let col = col.unwrap_or(buffer.col());
                buffer.move_to(*line, col)
            }
            Command::MoveBy(offset) => buffer.move_relative(*offset, 0),
            Command::MoveToEnd => buffer.move_to_end(),
            Command::Search { pattern, direction } => {
                let pattern = self.pattern(pattern)?;
                let next = buffer.search(pattern, *direction);
                if next.status() == Status::NotFound {
                    tracing::info!("Pattern not found: {}", pattern.as_str());
                }
                next
            }
            Command::Insert(text) => buffer.insert_line(text.as_str()),
            Command::Delete(count) => buffer.delete_lines(*count),
            Command::Substitute { find, replace } => buffer.replace_in_line(find, replace),
            Command::Print(count) => {
                let count = count.unwrap_or(self.print_count);
                // Lines past the end are all absent; stop at the first one.
                for line in buffer.lines_from(count).map_while(|line| line) {
                    writeln!(out, "{line}").context("failed to write output")?;
                }
                buffer
            }
        };
        Ok(next)
    }

    fn pattern(&mut self, query: &str) -> Result<&Pattern> {
        if !self.patterns.contains_key(query) {
            let pattern = Pattern::compile(&self.search.with_query(query))
                .with_context(|| format!("bad pattern: {query}"))?;
            self.patterns.insert(query.to_owned(), pattern);
        }
        self.patterns
            .get(query)
            .context("pattern cache lost an entry")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(cmd: &str) -> Command {
        cmd.parse().unwrap()
    }

    fn sample() -> Buffer {
        Buffer::from("Test file\n\nWally\nline 4\nline 5\nline 6\n")
    }

    fn run(buffer: Buffer, script: &str) -> (Buffer, String) {
        let script = Script::parse(script).unwrap();
        let mut out = Vec::new();
        let buffer = Session::default().run(buffer, &script, &mut out).unwrap();
        (buffer, String::from_utf8(out).unwrap())
    }

    // ── Parsing ─────────────────────────────────────────────────────

    #[test]
    fn test_parse_moves() {
        assert_eq!(parse("12"), Command::MoveTo { line: 12, col: None });
        assert_eq!(parse("3:7"), Command::MoveTo { line: 3, col: Some(7) });
        assert_eq!(parse("+2"), Command::MoveBy(2));
        assert_eq!(parse("-"), Command::MoveBy(-1));
        assert_eq!(parse("$"), Command::MoveToEnd);
    }

    #[test]
    fn test_parse_searches() {
        assert_eq!(
            parse("/Wally/"),
            Command::Search {
                pattern: "Wally".to_string(),
                direction: Direction::Down
            }
        );
        assert_eq!(
            parse("?line \\d"),
            Command::Search {
                pattern: "line \\d".to_string(),
                direction: Direction::Up
            }
        );
    }

    #[test]
    fn test_parse_insert_keeps_text_verbatim() {
        assert_eq!(parse("i  indented "), Command::Insert(" indented ".to_string()));
        assert_eq!(parse("i"), Command::Insert(String::new()));
    }

    #[test]
    fn test_parse_delete_and_print() {
        assert_eq!(parse("d"), Command::Delete(1));
        assert_eq!(parse("d3"), Command::Delete(3));
        assert_eq!(parse("p"), Command::Print(None));
        assert_eq!(parse("p5"), Command::Print(Some(5)));
    }

    #[test]
    fn test_parse_substitute() {
        assert_eq!(
            parse("s/old/new/"),
            Command::Substitute {
                find: "old".to_string(),
                replace: "new".to_string()
            }
        );
        assert_eq!(
            parse("s|a/b|c"),
            Command::Substitute {
                find: "a/b".to_string(),
                replace: "c".to_string()
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        for bad in [
            "",
            "x",
            "/",
            "d-1",
            "pz",
            "s",
            "s/only",
            "s//x/",
            "1:a",
            "+x",
            "--9223372036854775808",
        ] {
            assert!(bad.parse::<Command>().is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn test_parse_extreme_offsets() {
        assert_eq!(parse("-9223372036854775807"), Command::MoveBy(-isize::MAX));
        assert_eq!(parse("+9223372036854775807"), Command::MoveBy(isize::MAX));
        let (buf, _) = run(Buffer::from("a\nb"), "2\n-9223372036854775807");
        assert_eq!(buf.line_num(), 1);
    }

    #[test]
    fn test_script_skips_comments_and_blanks() {
        let script = Script::parse("# header\n\n/Wally/\n  \nd\n").unwrap();
        assert_eq!(script.len(), 2);
    }

    #[test]
    fn test_script_error_names_line() {
        let err = Script::parse("/Wally/\nbogus\n").unwrap_err();
        assert!(format!("{err:#}").contains("script line 2"));
    }

    // ── Execution ───────────────────────────────────────────────────

    #[test]
    fn test_search_then_delete() {
        let (buf, _) = run(sample(), "/Wally/\nd");
        assert_eq!(
            buf.lines(),
            ["Test file", "", "line 4", "line 5", "line 6", ""]
        );
    }

    #[test]
    fn test_failed_search_skips_edits() {
        let (buf, _) = run(sample(), "/Not here/\nd\ni new");
        assert_eq!(buf.lines(), sample().lines());
        assert_eq!(buf.status(), Status::NotFound);
    }

    #[test]
    fn test_move_clears_not_found() {
        let (buf, _) = run(sample(), "/Not here/\n2\ni New line 2");
        assert_eq!(buf.line_at(2), Some("New line 2"));
        assert!(buf.is_ok());
    }

    #[test]
    fn test_substitute_and_print() {
        let (buf, out) = run(sample(), "/line 5/\ns/5/five/\n-1\np2");
        assert_eq!(buf.line_at(5), Some("line five"));
        assert_eq!(out, "line five\nline 6\n");
    }

    #[test]
    fn test_print_skips_lines_past_end() {
        let (_, out) = run(Buffer::from("a\nb"), "2\np5");
        assert_eq!(out, "b\n");
    }

    #[test]
    fn test_huge_counts_finish() {
        let (buf, out) = run(
            Buffer::from("a\nb\nc"),
            "2\np18446744073709551615\nd18446744073709551615",
        );
        assert_eq!(out, "b\nc\n");
        assert_eq!(buf.lines(), ["a"]);
    }

    #[test]
    fn test_print_past_end_prints_nothing() {
        let (_, out) = run(Buffer::from("a\nb"), "9\np18446744073709551615");
        assert_eq!(out, "");
    }

    #[test]
    fn test_print_uses_session_default() {
        let mut session = Session::new(SearchOptions::default(), 2);
        let mut out = Vec::new();
        session
            .execute(Buffer::from("a\nb\nc"), &Command::Print(None), &mut out)
            .unwrap();
        assert_eq!(out, b"a\nb\n");
    }

    #[test]
    fn test_search_up_from_end() {
        let (buf, _) = run(sample(), "$\n?^line");
        assert_eq!(buf.line_num(), 6);
    }

    #[test]
    fn test_case_insensitive_session() {
        let options = SearchOptions {
            case_sensitive: false,
            ..SearchOptions::default()
        };
        let mut session = Session::new(options, 1);
        let command = parse("/wally/");
        let buf = session
            .execute(sample(), &command, &mut std::io::sink())
            .unwrap();
        assert_eq!(buf.line_num(), 3);
    }

    #[test]
    fn test_invalid_pattern_is_error() {
        let script = Script::parse("/(oops/").unwrap();
        let result = Session::default().run(sample(), &script, &mut std::io::sink());
        assert!(result.is_err());
    }

    #[test]
    fn test_pattern_cache_reused() {
        let mut session = Session::default();
        let script = Script::parse("/Wally/\n1\n/Wally/").unwrap();
        let buf = session
            .run(sample(), &script, &mut std::io::sink())
            .unwrap();
        assert_eq!(buf.line_num(), 3);
        assert_eq!(session.patterns.len(), 1);
    }

    #[test]
    fn test_move_keeps_col_when_omitted() {
        let (buf, _) = run(sample(), "2:5\n4");
        assert_eq!((buf.line_num(), buf.col()), (4, 5));
    }
}
