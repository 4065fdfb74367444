//! Release history parsing and linting
//!
//! The release history is a reStructuredText document: a title, an
//! optional Backlog section, then one section per release headed
//! `x.y.z (YYYY-MM-DD)` and underlined with dashes. Each release groups
//! bullet items under the four fixed bold subsections; public API names
//! appear as double-backtick literals.
//!
//! [`ReleaseHistory::lint`] checks the structural rules: header shape,
//! real calendar dates, strictly decreasing version order, well-formed
//! API paths under the package prefix, and known subsection names.

use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

/// The subsection names every release section may carry, in order.
pub const SUBSECTIONS: [&str; 4] = [
    "Features and Improvements",
    "Minor Improvements",
    "Bugfixes",
    "Miscellaneous",
];

/// A `major.minor.patch` release version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ReleaseVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for ReleaseVersion {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() != 3 {
            anyhow::bail!("invalid release version: {s:?}");
        }
        let parse = |part: &str| -> Result<u32, anyhow::Error> {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                anyhow::bail!("invalid release version: {s:?}");
            }
            Ok(part.parse()?)
        };
        Ok(Self {
            major: parse(parts[0])?,
            minor: parse(parts[1])?,
            patch: parse(parts[2])?,
        })
    }
}

/// One bullet item inside a release section.
#[derive(Debug, Clone)]
pub struct ReleaseItem {
    pub subsection: String,
    pub text: String,
    pub line: usize,
}

impl ReleaseItem {
    /// Double-backtick literals inside this item.
    pub fn literals(&self) -> Vec<String> {
        backtick_literals(&self.text)
    }

    /// Whether the whole item is a single double-backtick literal, which
    /// is how public API names are listed.
    pub fn as_api_name(&self) -> Option<String> {
        let text = self.text.trim();
        let inner = text.strip_prefix("``")?.strip_suffix("``")?;
        if inner.contains('`') {
            return None;
        }
        Some(inner.to_string())
    }
}

/// One dated release section.
#[derive(Debug, Clone)]
pub struct Release {
    pub version: ReleaseVersion,
    pub date: NaiveDate,
    pub line: usize,
    pub items: Vec<ReleaseItem>,
}

impl Release {
    /// All API names listed in this release.
    pub fn api_names(&self) -> Vec<String> {
        self.items.iter().filter_map(ReleaseItem::as_api_name).collect()
    }
}

/// A structural problem found while parsing or linting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintIssue {
    pub line: usize,
    pub message: String,
}

impl fmt::Display for LintIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// The parsed release history document.
#[derive(Debug, Clone, Default)]
pub struct ReleaseHistory {
    pub title: Option<String>,
    pub has_backlog: bool,
    pub backlog_items: Vec<ReleaseItem>,
    pub releases: Vec<Release>,
    parse_issues: Vec<LintIssue>,
}

enum Section {
    None,
    Backlog,
    Release,
}

impl ReleaseHistory {
    /// Parse a reStructuredText release history. Parsing is lenient;
    /// malformed constructs are recorded and reported by [`Self::lint`].
    pub fn parse(text: &str) -> Self {
        let lines: Vec<&str> = text.lines().collect();
        let mut history = ReleaseHistory::default();
        let mut section = Section::None;
        let mut subsection = String::new();

        let mut index = 0;
        while index < lines.len() {
            let line = lines[index];
            let line_no = index + 1;
            let trimmed = line.trim_end();
            let underline = lines.get(index + 1).map(|l| l.trim_end());

            if !trimmed.is_empty() && !trimmed.starts_with(' ') {
                if is_underline(underline, '=') {
                    history.title = Some(trimmed.to_string());
                    index += 2;
                    continue;
                }
                if is_underline(underline, '-') {
                    section = history.start_section(trimmed, line_no);
                    subsection.clear();
                    index += 2;
                    continue;
                }
            }

            let stripped = trimmed.trim_start();
            if let Some(name) = stripped.strip_prefix("**").and_then(|s| s.strip_suffix("**")) {
                subsection = name.to_string();
            } else if let Some(item_text) = stripped.strip_prefix("- ") {
                let item = ReleaseItem {
                    subsection: subsection.clone(),
                    text: item_text.trim().to_string(),
                    line: line_no,
                };
                match section {
                    Section::Release => {
                        if let Some(release) = history.releases.last_mut() {
                            release.items.push(item);
                        }
                    }
                    Section::Backlog => history.backlog_items.push(item),
                    Section::None => {}
                }
            }
            index += 1;
        }
        history
    }

    fn start_section(&mut self, header: &str, line: usize) -> Section {
        if header.starts_with("Backlog") {
            self.has_backlog = true;
            return Section::Backlog;
        }
        match parse_release_header(header) {
            Ok((version, date)) => {
                self.releases.push(Release {
                    version,
                    date,
                    line,
                    items: Vec::new(),
                });
                Section::Release
            }
            Err(reason) => {
                // only version-shaped headers count as broken releases
                if header.starts_with(|c: char| c.is_ascii_digit()) {
                    self.parse_issues.push(LintIssue {
                        line,
                        message: reason,
                    });
                    Section::Release
                } else {
                    Section::None
                }
            }
        }
    }

    /// Check structural rules. API names must start with `package_prefix`
    /// (e.g. `aws_env_config::`) and be well-formed paths.
    pub fn lint(&self, package_prefix: &str) -> Vec<LintIssue> {
        let mut issues = self.parse_issues.clone();

        for pair in self.releases.windows(2) {
            if pair[0].version <= pair[1].version {
                issues.push(LintIssue {
                    line: pair[1].line,
                    message: format!(
                        "version {} is not lower than the {} above it",
                        pair[1].version, pair[0].version
                    ),
                });
            }
        }

        for item in self
            .releases
            .iter()
            .flat_map(|r| r.items.iter())
            .chain(self.backlog_items.iter())
        {
            if !item.subsection.is_empty() && !SUBSECTIONS.contains(&item.subsection.as_str()) {
                issues.push(LintIssue {
                    line: item.line,
                    message: format!("unknown subsection {:?}", item.subsection),
                });
            }
            if let Some(name) = item.as_api_name() {
                if !name.starts_with(package_prefix) {
                    issues.push(LintIssue {
                        line: item.line,
                        message: format!(
                            "API name {name:?} does not start with {package_prefix:?}"
                        ),
                    });
                } else if !is_valid_api_path(&name) {
                    issues.push(LintIssue {
                        line: item.line,
                        message: format!("API name {name:?} is not a well-formed path"),
                    });
                }
            }
        }
        issues
    }
}

fn is_underline(line: Option<&str>, marker: char) -> bool {
    match line {
        Some(line) if line.len() >= 3 => line.chars().all(|c| c == marker),
        _ => false,
    }
}

/// Parse a `x.y.z (YYYY-MM-DD)` release header.
fn parse_release_header(header: &str) -> Result<(ReleaseVersion, NaiveDate), String> {
    let (version_part, rest) = header
        .split_once(" (")
        .ok_or_else(|| format!("release header {header:?} is not `x.y.z (YYYY-MM-DD)`"))?;
    let date_part = rest
        .strip_suffix(')')
        .ok_or_else(|| format!("release header {header:?} is missing the closing parenthesis"))?;
    let version: ReleaseVersion = version_part
        .parse()
        .map_err(|_| format!("release header {header:?} has an invalid version"))?;
    if !is_iso_date_shape(date_part) {
        return Err(format!("release header {header:?} date is not YYYY-MM-DD"));
    }
    let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|_| format!("release header {header:?} has an invalid date"))?;
    Ok((version, date))
}

fn is_iso_date_shape(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit())
}

fn is_valid_api_path(name: &str) -> bool {
    name.split("::")
        .flat_map(|part| part.split('.'))
        .all(|segment| {
            let mut chars = segment.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

fn backtick_literals(text: &str) -> Vec<String> {
    let mut literals = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find("``") {
        let after = &rest[start + 2..];
        match after.find("``") {
            Some(end) => {
                literals.push(after[..end].to_string());
                rest = &after[end + 2..];
            }
            None => break,
        }
    }
    literals
}
