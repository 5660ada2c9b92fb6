//! Keep-a-Changelog release sections → highlight props for the release video.

use crate::error::{OrkitError, Result};
use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Added,
    Changed,
    Fixed,
}

impl Category {
    pub fn parse(heading: &str) -> Option<Self> {
        match heading.trim().to_ascii_lowercase().as_str() {
            "added" => Some(Category::Added),
            "changed" => Some(Category::Changed),
            "fixed" => Some(Category::Fixed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Highlight {
    pub category: Category,
    pub title: String,
    pub description: String,
}

/// A `before → after label` figure quoted in the release notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatDelta {
    pub label: String,
    pub before: i64,
    pub after: i64,
    pub delta: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    pub version: String,
    pub date: String,
    pub highlights: Vec<Highlight>,
    pub raw_lines: Vec<String>,
    pub stats: Vec<StatDelta>,
}

// ---------------------------------------------------------------------------
// Regexes
// ---------------------------------------------------------------------------

fn header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^##\s+\[v?(\d+\.\d+\.\d+[^\]]*)\](?:\s*[-–—]\s*(\d{4}-\d{2}-\d{2}))?").unwrap()
    })
}

fn subsection_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^###\s+(.+?)\s*$").unwrap())
}

fn bullet_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[-*]\s+(.+?)\s*$").unwrap())
}

fn backtick_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^`([^`]+)`\s*[:\-–—]?\s*(.*)$").unwrap())
}

fn bold_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\*\*([^*]+?)\*\*\s*[:\-–—]?\s*(.*)$").unwrap())
}

fn stat_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\d[\d,]*)\s*(?:→|->)\s*(\d[\d,]*)\s+([A-Za-z][A-Za-z0-9-]*)").unwrap()
    })
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Split a bullet into title and description. The heuristics are tried in a
/// fixed order and the first that applies wins.
pub fn split_bullet(text: &str) -> (String, String) {
    if let Some(caps) = backtick_re().captures(text) {
        return (clean_title(&caps[1]), caps[2].trim().to_string());
    }
    if let Some(caps) = bold_re().captures(text) {
        return (clean_title(&caps[1]), caps[2].trim().to_string());
    }
    for sep in [" — ", "—", " - "] {
        if let Some((title, desc)) = text.split_once(sep) {
            if !title.trim().is_empty() {
                return (clean_title(title), desc.trim().to_string());
            }
        }
    }
    let words: Vec<&str> = text.split_whitespace().collect();
    let title = words.iter().take(5).copied().collect::<Vec<_>>().join(" ");
    (clean_title(&title), text.trim().to_string())
}

fn clean_title(s: &str) -> String {
    s.trim().trim_end_matches(':').trim().to_string()
}

fn parse_number(s: &str) -> Option<i64> {
    s.replace(',', "").parse().ok()
}

pub fn parse_stats(lines: &[String]) -> Vec<StatDelta> {
    let mut stats = Vec::new();
    for line in lines {
        for caps in stat_re().captures_iter(line) {
            let (Some(before), Some(after)) = (parse_number(&caps[1]), parse_number(&caps[2]))
            else {
                continue;
            };
            stats.push(StatDelta {
                label: caps[3].to_lowercase(),
                before,
                after,
                delta: after - before,
            });
        }
    }
    stats
}

/// Parse the release matching `target`, or the first release when `None`.
pub fn parse(text: &str, target: Option<&str>) -> Result<Release> {
    let target = target.map(|t| t.trim().trim_start_matches('v'));
    let mut release: Option<Release> = None;
    let mut category: Option<Category> = None;

    for line in text.lines() {
        let line = line.trim_end();
        if let Some(caps) = header_re().captures(line) {
            if release.is_some() {
                break;
            }
            let version = caps[1].to_string();
            if target.is_some_and(|t| t != version) {
                continue;
            }
            release = Some(Release {
                version,
                date: caps.get(2).map(|m| m.as_str().to_string()).unwrap_or_default(),
                highlights: Vec::new(),
                raw_lines: Vec::new(),
                stats: Vec::new(),
            });
            category = None;
            continue;
        }

        let Some(rel) = release.as_mut() else {
            continue;
        };
        if line.starts_with("## ") {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }
        rel.raw_lines.push(line.to_string());

        if let Some(caps) = subsection_re().captures(line) {
            category = Category::parse(&caps[1]);
            continue;
        }
        let (Some(cat), Some(caps)) = (category, bullet_re().captures(line)) else {
            continue;
        };
        let (title, description) = split_bullet(&caps[1]);
        rel.highlights.push(Highlight {
            category: cat,
            title,
            description,
        });
    }

    match (release, target) {
        (Some(mut rel), _) => {
            rel.stats = parse_stats(&rel.raw_lines);
            Ok(rel)
        }
        (None, Some(t)) => Err(OrkitError::VersionNotFound(t.to_string())),
        (None, None) => Err(OrkitError::NoRelease),
    }
}

// ---------------------------------------------------------------------------
// Props
// ---------------------------------------------------------------------------

pub const LANDSCAPE_SIZE: (u32, u32) = (1920, 1080);
pub const SQUARE_SIZE: (u32, u32) = (1080, 1080);
const SQUARE_MAX_STATS: usize = 2;

/// `2026-02-06` → `February 6, 2026`. Unparseable dates are passed through.
pub fn date_label(date: &str) -> String {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|d| d.format("%B %-d, %Y").to_string())
        .unwrap_or_else(|_| date.to_string())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryCounts {
    pub added: usize,
    pub changed: usize,
    pub fixed: usize,
}

impl CategoryCounts {
    fn tally(highlights: &[Highlight]) -> Self {
        let mut counts = Self::default();
        for h in highlights {
            match h.category {
                Category::Added => counts.added += 1,
                Category::Changed => counts.changed += 1,
                Category::Fixed => counts.fixed += 1,
            }
        }
        counts
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LandscapeProps {
    pub version: String,
    pub date: String,
    pub date_label: String,
    pub width: u32,
    pub height: u32,
    pub highlights: Vec<Highlight>,
    /// Counts over the whole release, not only the shown highlights.
    pub counts: CategoryCounts,
    pub stats: Vec<StatDelta>,
}

impl LandscapeProps {
    pub fn from_release(release: &Release, max_highlights: usize) -> Self {
        Self {
            version: release.version.clone(),
            date: release.date.clone(),
            date_label: date_label(&release.date),
            width: LANDSCAPE_SIZE.0,
            height: LANDSCAPE_SIZE.1,
            highlights: release.highlights.iter().take(max_highlights).cloned().collect(),
            counts: CategoryCounts::tally(&release.highlights),
            stats: release.stats.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SquareProps {
    pub version: String,
    pub date_label: String,
    pub width: u32,
    pub height: u32,
    pub highlights: Vec<Highlight>,
    pub stats: Vec<StatDelta>,
}

impl SquareProps {
    pub fn from_release(release: &Release, max_highlights: usize) -> Self {
        Self {
            version: release.version.clone(),
            date_label: date_label(&release.date),
            width: SQUARE_SIZE.0,
            height: SQUARE_SIZE.1,
            highlights: release.highlights.iter().take(max_highlights).cloned().collect(),
            stats: release.stats.iter().take(SQUARE_MAX_STATS).cloned().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const CHANGELOG: &str = "\
# Changelog

## [6.0.3] - 2026-02-10

### Fixed

- Hook runner no longer crashes on empty stdin

## [6.0.2] - 2026-02-06

### Added

- **Feature**: description text

### Changed

- `ork:commit` — now validates conventional prefixes
- Skills trimmed - 200 → 180 skills after consolidation
- Renamed the memory fabric package for clarity and reuse

### Removed

- Old docs site

## [6.0.1] - 2026-01-30

### Added

- Something older
";

    #[test]
    fn target_version_yields_its_highlights() {
        let rel = parse("## [6.0.2] - 2026-02-06\n### Added\n- **Feature**: description text\n", Some("6.0.2")).unwrap();
        assert_eq!(rel.version, "6.0.2");
        assert_eq!(rel.date, "2026-02-06");
        assert_eq!(rel.highlights.len(), 1);
        assert_eq!(rel.highlights[0].category, Category::Added);
        assert_eq!(rel.highlights[0].title, "Feature");
        assert_eq!(rel.highlights[0].description, "description text");
    }

    #[test]
    fn missing_version_is_an_error() {
        let err = parse(CHANGELOG, Some("9.9.9")).unwrap_err();
        assert!(matches!(err, OrkitError::VersionNotFound(v) if v == "9.9.9"));
    }

    #[test]
    fn no_header_is_an_error() {
        assert!(matches!(parse("# Changelog\n", None), Err(OrkitError::NoRelease)));
    }

    #[test]
    fn default_is_first_release() {
        let rel = parse(CHANGELOG, None).unwrap();
        assert_eq!(rel.version, "6.0.3");
        assert_eq!(rel.highlights.len(), 1);
        assert_eq!(rel.highlights[0].category, Category::Fixed);
    }

    #[test]
    fn section_stops_at_next_release_and_skips_unknown_subsections() {
        let rel = parse(CHANGELOG, Some("v6.0.2")).unwrap();
        assert_eq!(rel.highlights.len(), 4);
        assert!(rel.highlights.iter().all(|h| h.title != "Old docs site"));
        assert!(rel.raw_lines.iter().any(|l| l == "### Removed"));
        assert!(!rel.raw_lines.iter().any(|l| l.contains("Something older")));
    }

    #[test]
    fn heuristics_apply_in_order() {
        assert_eq!(
            split_bullet("`ork:commit` — validates prefixes"),
            ("ork:commit".to_string(), "validates prefixes".to_string())
        );
        assert_eq!(
            split_bullet("**Faster builds:** half the time"),
            ("Faster builds".to_string(), "half the time".to_string())
        );
        assert_eq!(
            split_bullet("Hooks — now typed"),
            ("Hooks".to_string(), "now typed".to_string())
        );
        assert_eq!(
            split_bullet("Skills trimmed - fewer duplicates"),
            ("Skills trimmed".to_string(), "fewer duplicates".to_string())
        );
        let (title, desc) = split_bullet("Renamed the memory fabric package for clarity");
        assert_eq!(title, "Renamed the memory fabric package");
        assert_eq!(desc, "Renamed the memory fabric package for clarity");
    }

    #[test]
    fn stats_come_from_arrow_phrases() {
        let rel = parse(CHANGELOG, Some("6.0.2")).unwrap();
        assert_eq!(
            rel.stats,
            vec![StatDelta {
                label: "skills".to_string(),
                before: 200,
                after: 180,
                delta: -20,
            }]
        );
        let ascii = parse_stats(&["hooks 1,200 -> 1,350 tokens".to_string()]);
        assert_eq!(ascii[0].before, 1200);
        assert_eq!(ascii[0].delta, 150);
    }

    #[test]
    fn props_shapes_limit_highlights() {
        let mut rel = parse(CHANGELOG, Some("6.0.2")).unwrap();
        rel.stats = parse_stats(&[
            "1 → 2 a".to_string(),
            "3 → 4 b".to_string(),
            "5 → 6 c".to_string(),
        ]);

        let landscape = LandscapeProps::from_release(&rel, 6);
        assert_eq!((landscape.width, landscape.height), (1920, 1080));
        assert_eq!(landscape.highlights.len(), 4);
        assert_eq!(landscape.counts, CategoryCounts { added: 1, changed: 3, fixed: 0 });
        assert_eq!(landscape.date_label, "February 6, 2026");
        assert_eq!(landscape.stats.len(), 3);

        let square = SquareProps::from_release(&rel, 2);
        assert_eq!((square.width, square.height), (1080, 1080));
        assert_eq!(square.highlights.len(), 2);
        assert_eq!(square.stats.len(), 2);

        let json = serde_json::to_value(&square).unwrap();
        assert_eq!(json["dateLabel"], "February 6, 2026");
        assert_eq!(json["highlights"][0]["category"], "added");
    }

    #[test]
    fn date_label_passes_through_unparseable() {
        assert_eq!(date_label(""), "");
        assert_eq!(date_label("soon"), "soon");
    }
}
