//! The list of selectable sources.
//!
//! Built-in news outlets and social platforms are known up front; sites the
//! user added through the universal parser arrive later from
//! `GET /api/sources` and are appended once.

use std::collections::BTreeMap;

/// Which list endpoint serves a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    News,
    Social,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    pub id: String,
    pub label: String,
    pub kind: SourceKind,
}

impl SourceEntry {
    fn new(id: &str, label: &str, kind: SourceKind) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            kind,
        }
    }
}

const NEWS_SOURCES: &[(&str, &str)] = &[
    ("all", "All"),
    ("telegram", "Telegram"),
    ("ria", "RIA"),
    ("israil", "7kanal"),
    ("lenta", "Lenta"),
    ("rbc", "RBC"),
    ("gazeta", "Gazeta"),
    ("kommersant", "Kommersant"),
    ("tsn", "TSN"),
    ("unian", "UNIAN"),
    ("rt", "RT"),
    ("cnn", "CNN"),
    ("aljazeera", "Al Jazeera"),
    ("reuters", "Reuters"),
    ("france24", "France 24"),
    ("dw", "DW"),
    ("euronews", "Euronews"),
    ("bbc", "BBC"),
];

const SOCIAL_SOURCES: &[(&str, &str)] = &[("twitter", "Twitter"), ("vk", "VK"), ("ok", "OK")];

/// Ordered source list with a selection cursor.
#[derive(Debug, Clone)]
pub struct SourceCatalog {
    entries: Vec<SourceEntry>,
    selected: usize,
}

impl Default for SourceCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SourceCatalog {
    pub fn builtin() -> Self {
        let entries = NEWS_SOURCES
            .iter()
            .map(|(id, label)| SourceEntry::new(id, label, SourceKind::News))
            .chain(
                SOCIAL_SOURCES
                    .iter()
                    .map(|(id, label)| SourceEntry::new(id, label, SourceKind::Social)),
            )
            .collect();
        Self {
            entries,
            selected: 0,
        }
    }

    pub fn entries(&self) -> &[SourceEntry] {
        &self.entries
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected(&self) -> &SourceEntry {
        &self.entries[self.selected]
    }

    /// Kind of `id`.  Unknown ids are assumed to be news tables.
    pub fn kind_of(&self, id: &str) -> SourceKind {
        self.entries
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.kind)
            .unwrap_or(SourceKind::News)
    }

    /// Move the cursor to `id`.  Returns `false` if the id is unknown.
    pub fn select_id(&mut self, id: &str) -> bool {
        match self.entries.iter().position(|e| e.id == id) {
            Some(i) => {
                self.selected = i;
                true
            }
            None => false,
        }
    }

    /// Move the cursor by `delta`, wrapping around.  Returns the new entry.
    pub fn step(&mut self, delta: isize) -> &SourceEntry {
        let len = self.entries.len() as isize;
        self.selected = (self.selected as isize + delta).rem_euclid(len) as usize;
        self.selected()
    }

    /// Append user-added sources that are not listed yet.
    ///
    /// Returns how many entries were added.
    pub fn merge_custom(&mut self, custom: &BTreeMap<String, String>) -> usize {
        let mut added = 0;
        for (id, name) in custom {
            if self.entries.iter().any(|e| &e.id == id) {
                continue;
            }
            self.entries.push(SourceEntry {
                id: id.clone(),
                label: name.clone(),
                kind: SourceKind::News,
            });
            added += 1;
        }
        added
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_starts_on_all() {
        let catalog = SourceCatalog::builtin();
        assert_eq!(catalog.selected().id, "all");
        assert_eq!(catalog.kind_of("vk"), SourceKind::Social);
        assert_eq!(catalog.kind_of("ria"), SourceKind::News);
    }

    #[test]
    fn unknown_source_is_news() {
        let catalog = SourceCatalog::builtin();
        assert_eq!(catalog.kind_of("custom_x_headlines"), SourceKind::News);
    }

    #[test]
    fn step_wraps_both_ways() {
        let mut catalog = SourceCatalog::builtin();
        let last = catalog.entries().len() - 1;
        catalog.step(-1);
        assert_eq!(catalog.selected_index(), last);
        catalog.step(1);
        assert_eq!(catalog.selected_index(), 0);
    }

    #[test]
    fn merge_custom_skips_duplicates() {
        let mut catalog = SourceCatalog::builtin();
        let before = catalog.entries().len();

        let mut custom = BTreeMap::new();
        custom.insert("custom_site_ru_headlines".to_string(), "Site.Ru".to_string());
        custom.insert("ria".to_string(), "RIA again".to_string());

        assert_eq!(catalog.merge_custom(&custom), 1);
        assert_eq!(catalog.merge_custom(&custom), 0);
        assert_eq!(catalog.entries().len(), before + 1);
        assert!(catalog.select_id("custom_site_ru_headlines"));
        assert_eq!(catalog.selected().label, "Site.Ru");
    }

    #[test]
    fn select_unknown_id_keeps_cursor() {
        let mut catalog = SourceCatalog::builtin();
        catalog.step(2);
        assert!(!catalog.select_id("nope"));
        assert_eq!(catalog.selected_index(), 2);
    }
}
