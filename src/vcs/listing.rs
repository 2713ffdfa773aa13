//! Extraction of `svn list --xml` output.
//!
//! ```xml
//! <lists>
//!   <list path="https://host/repo/trunk">
//!     <entry kind="dir">
//!       <name>lib</name>
//!       <commit revision="12">
//!         <author>alice</author>
//!         <date>2024-03-01T10:20:30.123456Z</date>
//!       </commit>
//!     </entry>
//!   </list>
//! </lists>
//! ```

use chrono::{DateTime, NaiveDateTime, Utc};
use roxmltree::{Document, Node};

use crate::error::{AppError, Result};

const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// One child described by the listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub name: String,
    pub kind: EntryKind,
    pub size: Option<u64>,
    pub revision: Option<u64>,
    pub author: String,
    pub date: Option<DateTime<Utc>>,
}

/// The contents of one listed directory.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Listing {
    /// Repository path the entries belong to.
    pub path: String,
    pub entries: Vec<ListingEntry>,
}

/// Repository path of a child named `name` under `parent`.
pub fn join_repo_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else if parent.ends_with('/') {
        format!("{}{}", parent, name)
    } else {
        format!("{}/{}", parent, name)
    }
}

pub fn parse_listing(xml: &str) -> Result<Listing> {
    let doc = Document::parse(xml).map_err(|e| AppError::Parse(e.to_string()))?;
    let root = doc.root_element();
    if root.tag_name().name() != "lists" {
        return Err(AppError::Parse(format!(
            "unexpected root element <{}>",
            root.tag_name().name()
        )));
    }

    let list = child_element(root, "list")
        .ok_or_else(|| AppError::Parse("listing has no <list> element".into()))?;

    let entries = list
        .children()
        .filter(|n| n.is_element() && n.has_tag_name("entry"))
        .filter_map(parse_entry)
        .collect();

    Ok(Listing {
        path: list.attribute("path").unwrap_or_default().to_string(),
        entries,
    })
}

fn parse_entry(node: Node) -> Option<ListingEntry> {
    let name = child_text(node, "name").filter(|n| !n.is_empty())?;
    let kind = match node.attribute("kind") {
        Some("dir") => EntryKind::Directory,
        _ => EntryKind::File,
    };
    let size = child_text(node, "size").and_then(|s| s.trim().parse().ok());

    let commit = child_element(node, "commit");
    let revision = commit
        .and_then(|c| c.attribute("revision"))
        .and_then(|r| r.parse().ok());
    let author = commit
        .and_then(|c| child_text(c, "author"))
        .unwrap_or_default();
    let date = commit
        .and_then(|c| child_text(c, "date"))
        .and_then(|d| parse_date(&d));

    Some(ListingEntry {
        name,
        kind,
        size,
        revision,
        author,
        date,
    })
}

fn child_element<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|n| n.is_element() && n.has_tag_name(name))
}

fn child_text(node: Node, name: &str) -> Option<String> {
    child_element(node, name).map(|n| n.text().unwrap_or_default().trim().to_string())
}

/// Parse `2024-03-01T10:20:30.123456Z`; the fractional suffix is ignored.
pub fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let seconds = text.trim().split('.').next()?.trim_end_matches('Z');
    NaiveDateTime::parse_from_str(seconds, DATE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// "N units" elapsed between `then` and `now`.
pub fn format_age(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds().max(0);
    let (count, unit) = match secs {
        s if s < 60 => (s, "second"),
        s if s < 3_600 => (s / 60, "minute"),
        s if s < 86_400 => (s / 3_600, "hour"),
        s if s < 30 * 86_400 => (s / 86_400, "day"),
        s if s < 365 * 86_400 => (s / (30 * 86_400), "month"),
        s => (s / (365 * 86_400), "year"),
    };
    if count == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", count, unit)
    }
}

/// Human-readable file size.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const TWO_FILES_ONE_DIR: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<lists>
<list path="https://svn.example.com/repo/trunk">
<entry kind="file">
<name>README</name>
<size>1024</size>
<commit revision="10">
<author>alice</author>
<date>2024-03-01T10:20:30.123456Z</date>
</commit>
</entry>
<entry kind="dir">
<name>lib</name>
<commit revision="12">
<author>bob</author>
<date>2024-03-02T08:00:00.000000Z</date>
</commit>
</entry>
<entry kind="file">
<name>build.sh</name>
<size>77</size>
<commit revision="3">
<author>carol</author>
<date>2023-12-24T23:59:59.5Z</date>
</commit>
</entry>
</list>
</lists>
"#;

    #[test]
    fn parses_entries() {
        let listing = parse_listing(TWO_FILES_ONE_DIR).unwrap();
        assert_eq!(listing.path, "https://svn.example.com/repo/trunk");
        assert_eq!(listing.entries.len(), 3);

        let readme = &listing.entries[0];
        assert_eq!(readme.name, "README");
        assert_eq!(readme.kind, EntryKind::File);
        assert_eq!(readme.size, Some(1024));
        assert_eq!(readme.revision, Some(10));
        assert_eq!(readme.author, "alice");
        assert_eq!(
            readme.date,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 10, 20, 30).unwrap())
        );

        let lib = &listing.entries[1];
        assert_eq!(lib.kind, EntryKind::Directory);
        assert_eq!(lib.size, None);
    }

    #[test]
    fn entry_without_name_is_skipped() {
        let xml = r#"<lists><list path="/r">
            <entry kind="file"><size>1</size></entry>
            <entry kind="file"><name></name></entry>
            <entry kind="file"><name>kept</name></entry>
        </list></lists>"#;
        let listing = parse_listing(xml).unwrap();
        assert_eq!(listing.entries.len(), 1);
        assert_eq!(listing.entries[0].name, "kept");
        assert_eq!(listing.entries[0].revision, None);
        assert_eq!(listing.entries[0].author, "");
    }

    #[test]
    fn empty_directory() {
        let listing = parse_listing(r#"<lists><list path="/r/empty"></list></lists>"#).unwrap();
        assert!(listing.entries.is_empty());
    }

    #[test]
    fn malformed_xml_is_parse_error() {
        let result = parse_listing("<lists><list path=\"/r\"><entry");
        assert!(matches!(result, Err(AppError::Parse(_))));
    }

    #[test]
    fn wrong_root_is_parse_error() {
        let err = parse_listing("<info/>").unwrap_err();
        assert!(err.to_string().contains("<info>"));
    }

    #[test]
    fn missing_list_is_parse_error() {
        assert!(matches!(parse_listing("<lists/>"), Err(AppError::Parse(_))));
    }

    #[test]
    fn child_paths() {
        assert_eq!(join_repo_path("https://h/r/trunk", "lib"), "https://h/r/trunk/lib");
        assert_eq!(join_repo_path("https://h/r/", "lib"), "https://h/r/lib");
        assert_eq!(join_repo_path("", "lib"), "lib");
    }

    #[test]
    fn dates_tolerate_missing_fraction() {
        assert!(parse_date("2024-03-01T10:20:30Z").is_some());
        assert!(parse_date("not a date").is_none());
    }

    #[test]
    fn age_strings() {
        let then = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let at = |secs: i64| then + chrono::Duration::seconds(secs);
        assert_eq!(format_age(then, at(1)), "1 second");
        assert_eq!(format_age(then, at(125)), "2 minutes");
        assert_eq!(format_age(then, at(3 * 86_400)), "3 days");
        assert_eq!(format_age(then, at(400 * 86_400)), "1 year");
        assert_eq!(format_age(then, at(-5)), "0 seconds");
    }

    #[test]
    fn size_strings() {
        assert_eq!(format_size(77), "77 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }
}
