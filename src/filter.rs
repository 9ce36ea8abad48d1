//! The single dynamic equality filter.
//!
//! Which field is filterable depends on the source: telegram lists channels,
//! the outlets with their own rubrics list categories, everything else has no
//! filter.  The choices come from the last list response.

use crate::api::ListResponse;
use crate::query::QueryState;

/// Where a filter's choices come from in a [`ListResponse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterValues {
    Channels,
    Categories,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterSpec {
    pub field: &'static str,
    pub label: &'static str,
    pub values: FilterValues,
}

pub fn spec_for(source: &str) -> Option<FilterSpec> {
    match source {
        "telegram" => Some(FilterSpec {
            field: "telegram_channel",
            label: "Channel",
            values: FilterValues::Channels,
        }),
        "israil" | "ria" => Some(FilterSpec {
            field: "category",
            label: "Category",
            values: FilterValues::Categories,
        }),
        _ => None,
    }
}

/// Label of the option that clears the filter.
pub const ALL_OPTION: &str = "All";

#[derive(Debug, Clone, Default)]
pub struct FilterController {
    spec: Option<FilterSpec>,
    choices: Vec<String>,
}

impl FilterController {
    pub fn spec(&self) -> Option<FilterSpec> {
        self.spec
    }

    /// Rebuild from a fresh response.  Hidden when the source has no filter
    /// or the response carries no choices for it.
    pub fn update(&mut self, source: &str, response: &ListResponse) {
        let spec = spec_for(source);
        let choices = spec.and_then(|s| match s.values {
            FilterValues::Channels => response.available_channels.clone(),
            FilterValues::Categories => response.available_categories.clone(),
        });
        match choices {
            Some(choices) => {
                self.spec = spec;
                self.choices = choices;
            }
            None => self.reset(),
        }
    }

    pub fn reset(&mut self) {
        self.spec = None;
        self.choices.clear();
    }

    pub fn is_visible(&self) -> bool {
        self.spec.is_some()
    }

    /// Position of the active value, `0` being "all".
    pub fn selected_index(&self, query: &QueryState) -> usize {
        let (Some(spec), Some(filter)) = (self.spec, query.filter()) else {
            return 0;
        };
        if filter.field != spec.field {
            return 0;
        }
        self.choices
            .iter()
            .position(|c| *c == filter.value)
            .map(|i| i + 1)
            .unwrap_or(0)
    }

    /// Select option `index` (`0` = all).  Returns `true` when the query
    /// changed and a fetch is due.
    pub fn select(&mut self, index: usize, query: &mut QueryState) -> bool {
        let Some(spec) = self.spec else {
            return false;
        };
        match index {
            0 => query.clear_filter(),
            i => match self.choices.get(i - 1) {
                Some(value) => query.set_filter(spec.field, value.clone()),
                None => return false,
            },
        }
        true
    }

    /// Move the selection by `delta`, wrapping through "all".
    pub fn cycle(&mut self, delta: isize, query: &mut QueryState) -> bool {
        if !self.is_visible() {
            return false;
        }
        let options = self.choices.len() as isize + 1;
        let current = self.selected_index(query) as isize;
        let next = (current + delta).rem_euclid(options) as usize;
        self.select(next, query)
    }

    /// Display text of the current selection.
    pub fn selected_label(&self, query: &QueryState) -> &str {
        match self.selected_index(query) {
            0 => ALL_OPTION,
            i => &self.choices[i - 1],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_with_channels(channels: &[&str]) -> ListResponse {
        ListResponse {
            available_channels: Some(channels.iter().map(|c| c.to_string()).collect()),
            ..Default::default()
        }
    }

    #[test]
    fn field_depends_on_source() {
        assert_eq!(spec_for("telegram").unwrap().field, "telegram_channel");
        assert_eq!(spec_for("ria").unwrap().field, "category");
        assert_eq!(spec_for("israil").unwrap().values, FilterValues::Categories);
        assert!(spec_for("bbc").is_none());
    }

    #[test]
    fn update_hides_filter_without_choices() {
        let mut f = FilterController::default();
        f.update("telegram", &ListResponse::default());
        assert!(!f.is_visible());

        f.update("bbc", &response_with_channels(&["x"]));
        assert!(!f.is_visible());
    }

    #[test]
    fn selecting_value_sets_filter_and_resets_page() {
        let mut f = FilterController::default();
        f.update("telegram", &response_with_channels(&["rian_ru", "tass"]));

        let mut q = QueryState::new("telegram", 7);
        q.set_page(6);
        assert!(f.select(2, &mut q));

        let filter = q.filter().unwrap();
        assert_eq!(filter.field, "telegram_channel");
        assert_eq!(filter.value, "tass");
        assert_eq!(q.page(), 1);
        assert_eq!(f.selected_index(&q), 2);
        assert_eq!(f.selected_label(&q), "tass");
    }

    #[test]
    fn selecting_all_clears_filter() {
        let mut f = FilterController::default();
        f.update("telegram", &response_with_channels(&["rian_ru"]));
        let mut q = QueryState::new("telegram", 7);
        f.select(1, &mut q);
        q.set_page(3);

        assert!(f.select(0, &mut q));
        assert!(q.filter().is_none());
        assert_eq!(q.page(), 1);
        assert_eq!(f.selected_label(&q), ALL_OPTION);
    }

    #[test]
    fn out_of_range_index_is_ignored() {
        let mut f = FilterController::default();
        f.update("telegram", &response_with_channels(&["a"]));
        let mut q = QueryState::new("telegram", 7);
        assert!(!f.select(5, &mut q));
        assert!(q.filter().is_none());
    }

    #[test]
    fn cycle_wraps_through_all() {
        let mut f = FilterController::default();
        f.update("telegram", &response_with_channels(&["a", "b"]));
        let mut q = QueryState::new("telegram", 7);

        f.cycle(1, &mut q);
        assert_eq!(f.selected_label(&q), "a");
        f.cycle(1, &mut q);
        assert_eq!(f.selected_label(&q), "b");
        f.cycle(1, &mut q);
        assert_eq!(f.selected_label(&q), ALL_OPTION);
        f.cycle(-1, &mut q);
        assert_eq!(f.selected_label(&q), "b");
    }

    #[test]
    fn hidden_filter_ignores_input() {
        let mut f = FilterController::default();
        let mut q = QueryState::default();
        assert!(!f.cycle(1, &mut q));
        assert!(!f.select(0, &mut q));
    }
}
