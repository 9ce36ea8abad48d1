//! Page-selector controls.
//!
//! The window arithmetic is deliberately literal: `start = max(1, current-2)`,
//! `end = min(total, start+4)`.  Near the last page the window shrinks
//! instead of shifting back, e.g. `total=10, current=10` shows `8..=10`.

use std::ops::RangeInclusive;

use crate::query::QueryState;

/// Maximum number of page-number controls shown at once.
pub const WINDOW: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageControl {
    Previous(u32),
    Page { number: u32, active: bool },
    Next(u32),
}

impl PageControl {
    /// Page this control requests when activated.
    pub fn target(&self) -> u32 {
        match *self {
            Self::Previous(p) | Self::Next(p) => p,
            Self::Page { number, .. } => number,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Previous(_) => "«".to_string(),
            Self::Page { number, .. } => number.to_string(),
            Self::Next(_) => "»".to_string(),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Page { active: true, .. })
    }
}

/// Page numbers shown for `(total_pages, current_page)`.
pub fn window(total_pages: u32, current_page: u32) -> RangeInclusive<u32> {
    let start = current_page.saturating_sub(2).max(1);
    let end = total_pages.min(start.saturating_add(WINDOW - 1));
    start..=end
}

/// Build the controls.  Nothing at all when there is at most one page.
pub fn build_controls(total_pages: u32, current_page: u32) -> Vec<PageControl> {
    if total_pages <= 1 {
        return Vec::new();
    }
    let mut controls = Vec::with_capacity(WINDOW as usize + 2);
    if current_page > 1 {
        controls.push(PageControl::Previous(current_page - 1));
    }
    controls.extend(window(total_pages, current_page).map(|number| PageControl::Page {
        number,
        active: number == current_page,
    }));
    if current_page < total_pages {
        controls.push(PageControl::Next(current_page + 1));
    }
    controls
}

/// Apply a control to the query.
///
/// Returns `true` when the requested page changed and a fetch is due;
/// activating the page already shown does nothing.
pub fn activate(control: &PageControl, query: &mut QueryState) -> bool {
    let target = control.target();
    if target == query.page() {
        return false;
    }
    query.set_page(target);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(controls: &[PageControl]) -> Vec<u32> {
        controls
            .iter()
            .filter_map(|c| match c {
                PageControl::Page { number, .. } => Some(*number),
                _ => None,
            })
            .collect()
    }

    fn has_prev(controls: &[PageControl]) -> bool {
        controls.iter().any(|c| matches!(c, PageControl::Previous(_)))
    }

    fn has_next(controls: &[PageControl]) -> bool {
        controls.iter().any(|c| matches!(c, PageControl::Next(_)))
    }

    #[test]
    fn single_page_renders_nothing() {
        assert!(build_controls(1, 1).is_empty());
        assert!(build_controls(0, 1).is_empty());
    }

    #[test]
    fn near_end_window() {
        let controls = build_controls(10, 9);
        assert_eq!(numbers(&controls), vec![7, 8, 9, 10]);
        assert!(has_prev(&controls));
        assert!(has_next(&controls));
    }

    #[test]
    fn huge_server_page_numbers_do_not_overflow() {
        let controls = build_controls(u32::MAX, u32::MAX);
        assert_eq!(
            numbers(&controls),
            vec![u32::MAX - 2, u32::MAX - 1, u32::MAX]
        );
        assert!(has_prev(&controls));
        assert!(!has_next(&controls));
    }

    #[test]
    fn window_matches_literal_arithmetic_exhaustively() {
        for total in 1..=25u32 {
            for current in 1..=total {
                let controls = build_controls(total, current);
                if total <= 1 {
                    assert!(controls.is_empty());
                    continue;
                }
                let start = std::cmp::max(1, current as i64 - 2) as u32;
                let end = std::cmp::min(total, start + 4);
                let expected: Vec<u32> = (start..=end).collect();
                assert_eq!(numbers(&controls), expected, "total={total} current={current}");
                assert_eq!(has_prev(&controls), current > 1);
                assert_eq!(has_next(&controls), current < total);
            }
        }
    }

    #[test]
    fn first_page_shows_five_and_next() {
        let controls = build_controls(10, 1);
        assert_eq!(numbers(&controls), vec![1, 2, 3, 4, 5]);
        assert_eq!(controls.first(), Some(&PageControl::Page { number: 1, active: true }));
        assert_eq!(controls.last(), Some(&PageControl::Next(2)));
    }

    #[test]
    fn exactly_one_active_control() {
        let controls = build_controls(8, 4);
        let active: Vec<_> = controls.iter().filter(|c| c.is_active()).collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].target(), 4);
    }

    #[test]
    fn labels() {
        assert_eq!(PageControl::Previous(1).label(), "«");
        assert_eq!(PageControl::Next(3).label(), "»");
        assert_eq!(PageControl::Page { number: 12, active: false }.label(), "12");
    }

    #[test]
    fn activating_current_page_is_noop() {
        let mut q = QueryState::default();
        q.set_page(4);
        assert!(!activate(&PageControl::Page { number: 4, active: true }, &mut q));
        assert_eq!(q.page(), 4);
    }

    #[test]
    fn activating_other_page_updates_query() {
        let mut q = QueryState::default();
        q.set_page(4);
        assert!(activate(&PageControl::Next(5), &mut q));
        assert_eq!(q.page(), 5);
        assert!(activate(&PageControl::Page { number: 2, active: false }, &mut q));
        assert_eq!(q.page(), 2);
    }
}
