//! Indentation based model of an IOS-style configuration.
//!
//! Every unindented line is a section header; indented lines below it are its
//! children. `exit` closes the current section, `!` lines are comments.
//! A `no <line>` removes `<line>` at the same level when merged.

use std::fmt;

const NEGATION: &str = "no ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub header: String,
    pub children: Vec<String>,
}

impl Section {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            children: Vec::new(),
        }
    }

    pub fn has_child(&self, child: &str) -> bool {
        self.children.iter().any(|c| c == child)
    }

    /// Argument of the first child starting with `keyword`, e.g. "description".
    pub fn child_value(&self, keyword: &str) -> Option<&str> {
        self.children.iter().find_map(|c| keyword_value(c, keyword))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigTree {
    sections: Vec<Section>,
}

impl ConfigTree {
    pub fn parse(text: &str) -> Self {
        let mut tree = ConfigTree::default();
        let mut current: Option<usize> = None;

        for raw in text.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('!') || line == "end" {
                continue;
            }
            if line == "exit" {
                current = None;
                continue;
            }

            let indented = raw.starts_with(char::is_whitespace);
            match current {
                Some(idx) if indented => {
                    let section = &mut tree.sections[idx];
                    if !section.has_child(line) {
                        section.children.push(line.to_string());
                    }
                }
                _ => current = Some(tree.upsert(line)),
            }
        }

        tree
    }

    /// Lines as they would be typed, children indented by one space.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for section in &self.sections {
            lines.push(section.header.clone());
            lines.extend(section.children.iter().map(|c| format!(" {c}")));
        }
        lines
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, header: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.header == header)
    }

    /// Sections whose header starts with `keyword`, e.g. every "interface".
    pub fn sections_starting_with<'a>(&'a self, keyword: &'a str) -> impl Iterator<Item = &'a Section> {
        self.sections
            .iter()
            .filter(move |s| keyword_value(&s.header, keyword).is_some())
    }

    /// Argument of a top-level statement, e.g. `value("hostname")`.
    pub fn value(&self, keyword: &str) -> Option<&str> {
        self.sections.iter().find_map(|s| keyword_value(&s.header, keyword))
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Applies `other` on top of `self`.
    pub fn merge(&mut self, other: &ConfigTree) {
        for incoming in &other.sections {
            if let Some(target) = incoming.header.strip_prefix(NEGATION) {
                self.sections.retain(|s| s.header != target);
                continue;
            }

            let idx = self.upsert(&incoming.header);
            let section = &mut self.sections[idx];
            for child in &incoming.children {
                match child.strip_prefix(NEGATION) {
                    Some(target) => section.children.retain(|c| c != target),
                    None if section.has_child(child) => {}
                    None => section.children.push(child.clone()),
                }
            }
        }
    }

    /// Line diff turning `self` into `target`. Context headers are prefixed
    /// with a space, additions with `+`, removals with `-`.
    pub fn diff(&self, target: &ConfigTree) -> String {
        let mut out: Vec<String> = Vec::new();

        for wanted in &target.sections {
            match self.section(&wanted.header) {
                None => {
                    out.push(format!("+{}", wanted.header));
                    out.extend(wanted.children.iter().map(|c| format!("+ {c}")));
                }
                Some(current) => {
                    let removed = current.children.iter().filter(|c| !wanted.has_child(c));
                    let added = wanted.children.iter().filter(|c| !current.has_child(c));
                    let changes: Vec<String> = removed
                        .map(|c| format!("- {c}"))
                        .chain(added.map(|c| format!("+ {c}")))
                        .collect();
                    if !changes.is_empty() {
                        out.push(format!(" {}", wanted.header));
                        out.extend(changes);
                    }
                }
            }
        }

        for gone in self.sections.iter().filter(|s| target.section(&s.header).is_none()) {
            out.push(format!("-{}", gone.header));
            out.extend(gone.children.iter().map(|c| format!("- {c}")));
        }

        out.join("\n")
    }

    fn upsert(&mut self, header: &str) -> usize {
        match self.sections.iter().position(|s| s.header == header) {
            Some(idx) => idx,
            None => {
                self.sections.push(Section::new(header));
                self.sections.len() - 1
            }
        }
    }
}

impl fmt::Display for ConfigTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for section in &self.sections {
            writeln!(f, "{}", section.header)?;
            for child in &section.children {
                writeln!(f, " {child}")?;
            }
            if !section.children.is_empty() {
                writeln!(f, "!")?;
            }
        }
        Ok(())
    }
}

/// First whitespace separated word of a line.
pub fn first_keyword(line: &str) -> &str {
    line.split_whitespace().next().unwrap_or("")
}

fn keyword_value<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    line.strip_prefix(keyword)
        .filter(|rest| rest.starts_with(' '))
        .map(str::trim)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
