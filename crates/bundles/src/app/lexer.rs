//! Line-oriented lexing of bundle sources.
//!
//! Every non-blank, non-comment line is either a label line (`name:`) or an item
//! line (`action, value`). Item lines attach to the most recent label; the open
//! bundle is closed when the next label arrives or the input ends.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::app::validate::ValueRules;
use crate::domain::errors::Diagnostic;
use crate::domain::model::{Action, Bundle, Item};

static LABEL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]+:$").expect("label pattern compiles"));
static ITEM_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?i:app|file|shell|url)\s*,\s*[^\n`]+$").expect("item pattern compiles")
});

/// How a single trimmed line is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Label,
    Item,
    Ignorable,
    IllegalChar,
    Invalid,
}

/// Classify a trimmed line. Order matters: a backtick only counts as illegal
/// once the line has failed both grammars.
pub fn classify(line: &str) -> LineKind {
    if LABEL_PATTERN.is_match(line) {
        LineKind::Label
    } else if ITEM_PATTERN.is_match(line) {
        LineKind::Item
    } else if line.is_empty() || line.starts_with('#') {
        LineKind::Ignorable
    } else if line.contains('`') {
        LineKind::IllegalChar
    } else {
        LineKind::Invalid
    }
}

/// Turns source lines into validated bundles.
#[derive(Debug, Clone, Default)]
pub struct Lexer {
    rules: ValueRules,
}

impl Lexer {
    pub fn new(rules: ValueRules) -> Self {
        Self { rules }
    }

    /// Scan every line in order. The first problem found is returned.
    pub fn tokenize<S: AsRef<str>>(&self, lines: &[S]) -> Result<Vec<Bundle>, Diagnostic> {
        let scan = lines
            .iter()
            .enumerate()
            .try_fold(Scan::default(), |scan, (index, line)| {
                self.step(scan, index + 1, line.as_ref().trim())
            })?;
        let bundles = scan.finish(lines.len())?;
        tracing::debug!(bundles = bundles.len(), "tokenized source");
        Ok(bundles)
    }

    fn step(&self, mut scan: Scan, line_no: usize, line: &str) -> Result<Scan, Diagnostic> {
        match classify(line) {
            LineKind::Label => {
                let label = line.trim_matches(':');
                scan.open(label, line_no)?;
            }
            LineKind::Item => {
                let Some(current) = scan.current.as_mut() else {
                    return Err(Diagnostic::syntax(line_no, None, "Unlabelled bundle."));
                };
                let item = self.parse_item(line, line_no, &current.label)?;
                current.items.push(item);
            }
            LineKind::Ignorable => {}
            LineKind::IllegalChar => {
                return Err(Diagnostic::illegal_char(
                    line_no,
                    scan.label(),
                    "` is an illegal character.",
                ));
            }
            LineKind::Invalid => {
                return Err(Diagnostic::syntax(line_no, scan.label(), "Invalid token/s."));
            }
        }
        Ok(scan)
    }

    fn parse_item(&self, line: &str, line_no: usize, label: &str) -> Result<Item, Diagnostic> {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let (keyword, rest) = fields
            .split_first()
            .ok_or_else(|| Diagnostic::syntax(line_no, Some(label), "Invalid token/s."))?;

        let action: Action = keyword
            .parse()
            .map_err(|_| Diagnostic::syntax(line_no, Some(label), "Unrecognized action."))?;
        let value = strip_quotes(&rest.join(",")).to_owned();

        self.rules
            .check(action, &value)
            .map_err(|message| Diagnostic::value(line_no, Some(label), message))?;

        Ok(Item { action, value })
    }
}

/// Remove one pair of matching single or double quotes around a value.
pub fn strip_quotes(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Accumulator threaded through the scan.
#[derive(Debug, Default)]
struct Scan {
    bundles: Vec<Bundle>,
    current: Option<Bundle>,
    seen: HashSet<String>,
}

impl Scan {
    fn label(&self) -> Option<&str> {
        self.current.as_ref().map(|bundle| bundle.label.as_str())
    }

    /// Start a new bundle. An empty open bundle is reported before a reused label.
    fn open(&mut self, label: &str, line_no: usize) -> Result<(), Diagnostic> {
        if let Some(current) = &self.current
            && current.is_empty()
        {
            return Err(Diagnostic::syntax(
                line_no,
                Some(&current.label),
                "Empty bundle.",
            ));
        }
        if self.seen.contains(label) {
            return Err(Diagnostic::syntax(line_no, self.label(), "Duplicate bundle."));
        }
        self.close(line_no)?;
        self.seen.insert(label.to_owned());
        self.current = Some(Bundle::new(label));
        Ok(())
    }

    fn close(&mut self, line_no: usize) -> Result<(), Diagnostic> {
        if let Some(bundle) = self.current.take() {
            if bundle.is_empty() {
                return Err(Diagnostic::syntax(
                    line_no,
                    Some(&bundle.label),
                    "Empty bundle.",
                ));
            }
            self.bundles.push(bundle);
        }
        Ok(())
    }

    fn finish(mut self, last_line: usize) -> Result<Vec<Bundle>, Diagnostic> {
        self.close(last_line)?;
        Ok(self.bundles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::domain::errors::DiagnosticKind;

    fn lex(source: &str) -> Result<Vec<Bundle>, Diagnostic> {
        let lines: Vec<&str> = source.split('\n').collect();
        Lexer::default().tokenize(&lines)
    }

    #[test]
    fn classifies_lines_by_priority() {
        assert_eq!(classify("morning:"), LineKind::Label);
        assert_eq!(classify("shell, echo hi"), LineKind::Item);
        assert_eq!(classify("URL , https://example.com"), LineKind::Item);
        assert_eq!(classify(""), LineKind::Ignorable);
        assert_eq!(classify("# note"), LineKind::Ignorable);
        assert_eq!(classify("shell, echo `date`"), LineKind::IllegalChar);
        assert_eq!(classify("launch, thing"), LineKind::Invalid);
        assert_eq!(classify("two words:"), LineKind::Invalid);
        assert_eq!(classify("double::"), LineKind::Invalid);
    }

    #[test]
    fn groups_items_under_labels_in_order() {
        let bundles = lex("build:\n  shell, cargo build\nshell, cargo test\n\n# docs\ndocs:\nurl, https://docs.rs\n")
            .unwrap();
        assert_eq!(bundles.len(), 2);
        assert_eq!(bundles[0].label, "build");
        assert_eq!(
            bundles[0].items,
            vec![
                Item::new(Action::Shell, "cargo build"),
                Item::new(Action::Shell, "cargo test"),
            ]
        );
        assert_eq!(bundles[1].label, "docs");
        assert_eq!(bundles[1].items, vec![Item::new(Action::Url, "https://docs.rs")]);
    }

    #[test]
    fn comments_only_yield_no_bundles() {
        assert!(lex("# nothing here\n\n   \n# still nothing").unwrap().is_empty());
        assert!(lex("").unwrap().is_empty());
    }

    #[test]
    fn label_after_label_is_an_empty_bundle() {
        let err = lex("first:\nsecond:\nshell, ls").unwrap_err();
        assert_eq!(err.kind, DiagnosticKind::Syntax);
        assert_eq!(err.line, 2);
        assert_eq!(err.label.as_deref(), Some("first"));
        assert_eq!(err.message, "Empty bundle.");
    }

    #[test]
    fn trailing_empty_bundle_reported_on_last_line() {
        let err = lex("a:\nshell, ls\nb:\n").unwrap_err();
        assert_eq!(err.to_string(), "SyntaxError: in b, on line 4\n\tEmpty bundle.");
    }

    #[test]
    fn item_before_label_is_unlabelled() {
        let err = lex("# header\nshell, ls\nwork:").unwrap_err();
        assert_eq!(err.to_string(), "SyntaxError: on line 2\n\tUnlabelled bundle.");
    }

    #[test]
    fn invalid_token_carries_open_label() {
        let err = lex("work:\nshell, ls\nopen the door").unwrap_err();
        assert_eq!(err.to_string(), "SyntaxError: in work, on line 3\n\tInvalid token/s.");
    }

    #[test]
    fn backtick_rejected_before_validation() {
        let err = lex("work:\nfile, `missing.txt`").unwrap_err();
        assert_eq!(err.kind, DiagnosticKind::IllegalChar);
        assert_eq!(err.message, "` is an illegal character.");
    }

    #[test]
    fn duplicate_labels_are_rejected() {
        let err = lex("a:\nshell, ls\nb:\nshell, pwd\na:\nshell, whoami").unwrap_err();
        assert_eq!(err.to_string(), "SyntaxError: in b, on line 5\n\tDuplicate bundle.");
    }

    #[test]
    fn value_errors_name_the_constraint() {
        let err = lex("a:\napp, foo.txt").unwrap_err();
        assert_eq!(err.to_string(), "ValueError: in a, on line 2\n\tNo .exe at path.");

        let err = lex("a:\nfile, does/not/exist.txt").unwrap_err();
        assert_eq!(err.message, "No file at path.");

        let err = lex("a:\nurl, not a url").unwrap_err();
        assert_eq!(err.message, "Invalid URL.");

        assert!(lex("a:\nurl, https://example.com").is_ok());
    }

    #[test]
    fn values_are_rejoined_and_unquoted() {
        let bundles = lex("a:\nshell, echo one , two\nSHELL,'echo quoted'\nshell, \"it's\"").unwrap();
        let values: Vec<_> = bundles[0].items.iter().map(|item| item.value.as_str()).collect();
        assert_eq!(values, ["echo one,two", "echo quoted", "it's"]);
        assert!(bundles[0].items.iter().all(|item| item.action == Action::Shell));
    }

    #[test]
    fn empty_shell_command_is_rejected() {
        let err = lex("a:\nshell, \"\"").unwrap_err();
        assert_eq!(err.kind, DiagnosticKind::Value);
        assert_eq!(err.message, "Empty command.");
    }

    #[test]
    fn accepts_existing_files_and_apps() -> std::io::Result<()> {
        let temp = tempfile::tempdir()?;
        let notes = temp.path().join("notes with spaces.txt");
        let tool = temp.path().join("tool.exe");
        std::fs::write(&notes, "hello")?;
        std::fs::write(&tool, "MZ")?;

        let source = format!(
            "open:\nfile, \"{}\"\napp, {}\n",
            notes.display(),
            tool.display()
        );
        let bundles = lex(&source).unwrap();
        assert_eq!(bundles[0].items[0], Item::new(Action::File, notes.display().to_string()));
        assert_eq!(bundles[0].items[1], Item::new(Action::App, tool.display().to_string()));
        Ok(())
    }

    #[test]
    fn strip_quotes_removes_one_matching_pair() {
        assert_eq!(strip_quotes("\"a b\""), "a b");
        assert_eq!(strip_quotes("''x''"), "'x'");
        assert_eq!(strip_quotes("\"mixed'"), "\"mixed'");
        assert_eq!(strip_quotes("'"), "'");
    }
}
