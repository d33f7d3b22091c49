// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Workyard Authors

//! A minimal Atom feed model and writer for `GET /jobs` and
//! `GET /jobs/{name}` (§6.1).
//!
//! `§1` scopes full `application/vnd.otto.jobs+xml`/media-type fidelity
//! out: this writer emits just enough well-formed Atom to satisfy the
//! feed/entry shape in the route table, not a general-purpose XML/Atom
//! library.

use std::fmt::Write as _;

/// One `<entry>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomEntry {
    pub id: String,
    pub title: String,
    pub updated: String,
    pub link: String,
    pub content: String,
}

impl AtomEntry {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        updated: impl Into<String>,
        link: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            updated: updated.into(),
            link: link.into(),
            content: content.into(),
        }
    }
}

/// The feed document as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomFeed {
    pub id: String,
    pub title: String,
    pub updated: String,
    pub self_link: String,
    pub entries: Vec<AtomEntry>,
}

impl AtomFeed {
    pub fn new(id: impl Into<String>, title: impl Into<String>, updated: impl Into<String>, self_link: impl Into<String>) -> Self {
        Self { id: id.into(), title: title.into(), updated: updated.into(), self_link: self_link.into(), entries: Vec::new() }
    }

    pub fn with_entries(mut self, entries: Vec<AtomEntry>) -> Self {
        self.entries = entries;
        self
    }

    /// Serializes to a well-formed `application/atom+xml` document.
    ///
    /// Text fields are escaped for the five XML predefined entities; no
    /// attempt is made to validate that `updated` is RFC 3339 (callers pass
    /// epoch-derived timestamps already formatted that way).
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        out.push_str("<feed xmlns=\"http://www.w3.org/2005/Atom\">\n");
        let _ = writeln!(out, "  <id>{}</id>", escape(&self.id));
        let _ = writeln!(out, "  <title>{}</title>", escape(&self.title));
        let _ = writeln!(out, "  <updated>{}</updated>", escape(&self.updated));
        let _ = writeln!(out, "  <link rel=\"self\" href=\"{}\"/>", escape(&self.self_link));
        for entry in &self.entries {
            out.push_str("  <entry>\n");
            let _ = writeln!(out, "    <id>{}</id>", escape(&entry.id));
            let _ = writeln!(out, "    <title>{}</title>", escape(&entry.title));
            let _ = writeln!(out, "    <updated>{}</updated>", escape(&entry.updated));
            let _ = writeln!(out, "    <link href=\"{}\"/>", escape(&entry.link));
            let _ = writeln!(
                out,
                "    <content type=\"text\">{}</content>",
                escape(&entry.content)
            );
            out.push_str("  </entry>\n");
        }
        out.push_str("</feed>\n");
        out
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
#[path = "atom_tests.rs"]
mod tests;
