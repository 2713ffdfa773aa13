//! Line classification for the flat list views.
//!
//! Each view turns one raw output line into an [`Entry`]: the text to show,
//! a style, and the key used for sorting and selection. The rules live in
//! small strategy values implementing [`LineClassifier`], so one
//! [`ListRefresher`](crate::vcs::list::ListRefresher) drives every view.

/// Visual category of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StyleTag {
    #[default]
    Normal,
    Error,
    Added,
    Removed,
    Dimmed,
    Emphasized,
}

/// One row of a flat list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub display_text: String,
    pub sort_key: String,
    pub style: StyleTag,
    pub is_error_line: bool,
    pub selected: bool,
}

impl Entry {
    /// A row carrying a diagnostic written by the tool on stderr.
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            display_text: text.into(),
            sort_key: String::new(),
            style: StyleTag::Error,
            is_error_line: true,
            selected: false,
        }
    }
}

/// Outcome of classifying one stdout line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classified {
    Suppressed,
    Accepted(Entry),
}

/// Per-view rules for turning output lines into entries.
pub trait LineClassifier {
    /// Short label used in log records.
    fn name(&self) -> &'static str;

    /// Stable identity of the line, independent of volatile columns.
    fn extract_key(&self, line: &str) -> String;

    fn classify(&self, line: &str) -> StyleTag;

    fn should_display(&self, line: &str) -> bool;

    fn display_text(&self, line: &str) -> String {
        line.to_string()
    }

    fn accept(&self, line: &str) -> Classified {
        if !self.should_display(line) {
            return Classified::Suppressed;
        }
        Classified::Accepted(Entry {
            display_text: self.display_text(line),
            sort_key: self.extract_key(line),
            style: self.classify(line),
            is_error_line: false,
            selected: false,
        })
    }
}

// ---------------------------------------------------------------------------
// status
// ---------------------------------------------------------------------------

/// Characters that may appear in the seven status columns of `svn status`.
const STATUS_COLUMNS: &str = " ACDIMRX?!~LSKOTB*+";

/// `svn status` output.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusClassifier;

impl StatusClassifier {
    /// Byte offset where the path starts: 8 for the seven-column layout,
    /// 2 for the compact one.
    fn path_offset(line: &str) -> usize {
        let bytes = line.as_bytes();
        let long_form = bytes.len() > 8
            && bytes[7] == b' '
            && line
                .get(..7)
                .map(|cols| cols.chars().all(|c| STATUS_COLUMNS.contains(c)))
                .unwrap_or(false);
        if long_form {
            8
        } else {
            2
        }
    }

    fn column(line: &str, index: usize) -> char {
        line.chars().nth(index).unwrap_or(' ')
    }
}

impl LineClassifier for StatusClassifier {
    fn name(&self) -> &'static str {
        "status"
    }

    fn extract_key(&self, line: &str) -> String {
        let offset = Self::path_offset(line);
        line.get(offset..).unwrap_or("").trim().to_string()
    }

    fn classify(&self, line: &str) -> StyleTag {
        let first = Self::column(line, 0);
        if first == 'C'
            || first == '!'
            || Self::column(line, 1) == 'C'
            || (Self::path_offset(line) == 8 && Self::column(line, 6) == 'C')
        {
            return StyleTag::Error;
        }
        match first {
            'A' => StyleTag::Added,
            'D' => StyleTag::Removed,
            '?' | 'I' => StyleTag::Dimmed,
            _ => StyleTag::Normal,
        }
    }

    fn should_display(&self, line: &str) -> bool {
        let trimmed = line.trim();
        !trimmed.is_empty() && !trimmed.starts_with("Performing status on external item")
    }
}

// ---------------------------------------------------------------------------
// update
// ---------------------------------------------------------------------------

const UPDATE_COLUMNS: &str = " ADUCGER";
const UPDATE_PATH_OFFSET: usize = 5;

/// `svn update` output.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateClassifier;

impl UpdateClassifier {
    /// Whether the line reports a change to one path rather than a summary.
    fn is_change_line(line: &str) -> bool {
        let Some(cols) = line.get(..UPDATE_PATH_OFFSET - 1) else {
            return false;
        };
        cols.chars().all(|c| UPDATE_COLUMNS.contains(c))
            && cols.chars().any(|c| c != ' ')
            && line.as_bytes().get(UPDATE_PATH_OFFSET - 1) == Some(&b' ')
            && line.len() > UPDATE_PATH_OFFSET
    }

    /// The trailing `Summary of conflicts:` block and its indented counts.
    fn is_conflict_summary(line: &str) -> bool {
        let trimmed = line.trim();
        if trimmed.starts_with("Summary of conflicts") {
            return true;
        }
        line.starts_with("  ")
            && trimmed.contains(':')
            && trimmed
                .rsplit(' ')
                .next()
                .map(|count| count.parse::<u64>().is_ok())
                .unwrap_or(false)
    }
}

impl LineClassifier for UpdateClassifier {
    fn name(&self) -> &'static str {
        "update"
    }

    fn extract_key(&self, line: &str) -> String {
        if !Self::is_change_line(line) {
            return String::new();
        }
        line.get(UPDATE_PATH_OFFSET..)
            .unwrap_or("")
            .trim()
            .to_string()
    }

    fn classify(&self, line: &str) -> StyleTag {
        if !Self::is_change_line(line) {
            return StyleTag::Dimmed;
        }
        let cols = line.get(..UPDATE_PATH_OFFSET - 1).unwrap_or("");
        if cols.contains('C') {
            return StyleTag::Error;
        }
        match cols.chars().next() {
            Some('A') => StyleTag::Added,
            Some('D') => StyleTag::Removed,
            _ => StyleTag::Normal,
        }
    }

    fn should_display(&self, line: &str) -> bool {
        !line.trim().is_empty() && !Self::is_conflict_summary(line)
    }
}

// ---------------------------------------------------------------------------
// proplist
// ---------------------------------------------------------------------------

/// Properties with a meaning to the tool itself.
const SPECIAL_PROPERTIES: &[&str] = &[
    "svn:ignore",
    "svn:keywords",
    "svn:executable",
    "svn:eol-style",
    "svn:mime-type",
    "svn:externals",
    "svn:needs-lock",
];

/// `svn proplist FILE` output.
#[derive(Debug, Clone, Copy, Default)]
pub struct PropListClassifier;

impl LineClassifier for PropListClassifier {
    fn name(&self) -> &'static str {
        "proplist"
    }

    fn extract_key(&self, line: &str) -> String {
        line.trim().to_string()
    }

    fn classify(&self, line: &str) -> StyleTag {
        if SPECIAL_PROPERTIES.contains(&line.trim()) {
            StyleTag::Emphasized
        } else {
            StyleTag::Normal
        }
    }

    // The header ("Properties on 'x':") is the only unindented line.
    fn should_display(&self, line: &str) -> bool {
        line.starts_with(' ') && !line.trim().is_empty()
    }

    fn display_text(&self, line: &str) -> String {
        line.trim().to_string()
    }
}

// ---------------------------------------------------------------------------
// output
// ---------------------------------------------------------------------------

/// Free-form output of an action such as `svn add`.
///
/// Every key is empty, so rows stay in arrival order.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputClassifier;

impl LineClassifier for OutputClassifier {
    fn name(&self) -> &'static str {
        "output"
    }

    fn extract_key(&self, _line: &str) -> String {
        String::new()
    }

    fn classify(&self, _line: &str) -> StyleTag {
        StyleTag::Normal
    }

    fn should_display(&self, line: &str) -> bool {
        !line.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accepted(classifier: &dyn LineClassifier, line: &str) -> Entry {
        match classifier.accept(line) {
            Classified::Accepted(entry) => entry,
            Classified::Suppressed => panic!("line was suppressed: {:?}", line),
        }
    }

    #[test]
    fn status_compact_form() {
        let c = StatusClassifier;
        assert_eq!(c.extract_key("A  foo.txt"), "foo.txt");
        assert_eq!(c.classify("A  foo.txt"), StyleTag::Added);
        assert_eq!(c.classify("?  bar.txt"), StyleTag::Dimmed);
        assert_eq!(c.classify("M  baz.txt"), StyleTag::Normal);
    }

    #[test]
    fn status_seven_column_form() {
        let c = StatusClassifier;
        assert_eq!(c.extract_key("M       src/main.c"), "src/main.c");
        assert_eq!(c.extract_key("?       dir with space/x"), "dir with space/x");
        assert_eq!(c.classify("D       old.c"), StyleTag::Removed);
        assert_eq!(c.classify("I       build"), StyleTag::Dimmed);
    }

    #[test]
    fn status_compact_path_with_space_is_not_long_form() {
        let c = StatusClassifier;
        assert_eq!(c.extract_key("M  foo bar.txt"), "foo bar.txt");
    }

    #[test]
    fn status_conflicts_are_errors() {
        let c = StatusClassifier;
        assert_eq!(c.classify("C       a.c"), StyleTag::Error);
        assert_eq!(c.classify("!       gone.c"), StyleTag::Error);
        assert_eq!(c.classify(" C      props.c"), StyleTag::Error);
        assert_eq!(c.classify("      C tree.c"), StyleTag::Error);
    }

    #[test]
    fn status_suppresses_noise() {
        let c = StatusClassifier;
        assert_eq!(c.accept(""), Classified::Suppressed);
        assert_eq!(c.accept("   "), Classified::Suppressed);
        assert_eq!(
            c.accept("Performing status on external item at 'vendor/lib':"),
            Classified::Suppressed
        );
    }

    #[test]
    fn status_key_ignores_volatile_columns() {
        let c = StatusClassifier;
        assert_eq!(c.extract_key("M       a.c"), c.extract_key("MM   K  a.c"));
    }

    #[test]
    fn unmatched_line_is_shown_plain() {
        let entry = accepted(&StatusClassifier, "Status against revision:    42");
        assert_eq!(entry.style, StyleTag::Normal);
        assert!(!entry.is_error_line);
    }

    #[test]
    fn update_change_lines() {
        let c = UpdateClassifier;
        assert_eq!(c.extract_key("A    trunk/new.c"), "trunk/new.c");
        assert_eq!(c.classify("A    trunk/new.c"), StyleTag::Added);
        assert_eq!(c.classify("D    trunk/old.c"), StyleTag::Removed);
        assert_eq!(c.classify("C    trunk/clash.c"), StyleTag::Error);
        assert_eq!(c.classify(" C   trunk/props.c"), StyleTag::Error);
        assert_eq!(c.classify("U    trunk/main.c"), StyleTag::Normal);
        assert_eq!(c.classify("G    trunk/merged.c"), StyleTag::Normal);
    }

    #[test]
    fn update_summary_lines_are_dimmed_and_unkeyed() {
        let c = UpdateClassifier;
        for line in ["Updating '.':", "At revision 12.", "Updated to revision 13."] {
            let entry = accepted(&c, line);
            assert_eq!(entry.sort_key, "", "{}", line);
            assert_eq!(entry.style, StyleTag::Dimmed, "{}", line);
        }
    }

    #[test]
    fn update_conflict_summary_is_suppressed() {
        let c = UpdateClassifier;
        assert_eq!(c.accept("Summary of conflicts:"), Classified::Suppressed);
        assert_eq!(c.accept("  Text conflicts: 1"), Classified::Suppressed);
        assert_eq!(c.accept("  Tree conflicts: 2"), Classified::Suppressed);
        assert!(matches!(c.accept(" U   a.c"), Classified::Accepted(_)));
    }

    #[test]
    fn proplist_shows_only_indented_names() {
        let c = PropListClassifier;
        assert_eq!(c.accept("Properties on 'main.c':"), Classified::Suppressed);
        let entry = accepted(&c, "  svn:eol-style");
        assert_eq!(entry.display_text, "svn:eol-style");
        assert_eq!(entry.sort_key, "svn:eol-style");
        assert_eq!(entry.style, StyleTag::Emphasized);
        assert_eq!(accepted(&c, "  owner").style, StyleTag::Normal);
    }

    #[test]
    fn output_keeps_every_non_blank_line() {
        let c = OutputClassifier;
        let entry = accepted(&c, "A         new.c");
        assert_eq!(entry.sort_key, "");
        assert_eq!(entry.display_text, "A         new.c");
        assert_eq!(c.accept(""), Classified::Suppressed);
    }

    #[test]
    fn error_entry() {
        let entry = Entry::error("svn: E155007: not a working copy");
        assert!(entry.is_error_line);
        assert_eq!(entry.style, StyleTag::Error);
    }
}
