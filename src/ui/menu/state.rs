//! Selection state engine for the paginated menu.
//!
//! Pure state transitions: no terminal I/O happens here. The controller
//! feeds decoded keys in and renders whatever this state says. Items are
//! never reordered in place; sorting and filtering produce a projection
//! (`view`) of original item positions, and selection is keyed by original
//! position so it survives any rebuild of the projection.

use std::collections::BTreeSet;

use crate::ui::keys::Key;

/// One selectable row. `index` is the stable identity (original position).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub index: usize,
    pub label: String,
    /// Unix epoch of last use, when known
    pub last_used: Option<i64>,
    /// Size in kilobytes, when known
    pub size_kb: Option<i64>,
}

impl MenuItem {
    pub fn new(index: usize, label: impl Into<String>) -> Self {
        Self {
            index,
            label: label.into(),
            last_used: None,
            size_kb: None,
        }
    }

    pub fn with_metadata(mut self, last_used: Option<i64>, size_kb: Option<i64>) -> Self {
        self.last_used = last_used;
        self.size_kb = size_kb;
        self
    }
}

/// Sort key. Each key has a natural polarity: date and name ascend,
/// size descends (largest first). The reverse flag inverts the current
/// key's natural order, not a global direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Date,
    Name,
    Size,
}

impl SortKey {
    fn next(self) -> Self {
        match self {
            SortKey::Date => SortKey::Name,
            SortKey::Name => SortKey::Size,
            SortKey::Size => SortKey::Date,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortKey::Date => "date",
            SortKey::Name => "name",
            SortKey::Size => "size",
        }
    }
}

/// Outcome of feeding one key to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Keep looping
    Continue,
    /// User committed; ascending original indices of the chosen items
    Confirmed(Vec<usize>),
    /// User backed out
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct MenuState {
    items: Vec<MenuItem>,
    selected: BTreeSet<usize>,
    /// In-progress query while editing
    filter_text: String,
    /// Committed query that persists after editing ends
    applied_filter: String,
    filter_mode: bool,
    sort_key: SortKey,
    sort_reversed: bool,
    sort_enabled: bool,
    help_visible: bool,
    /// Filtered + sorted projection of original positions
    view: Vec<usize>,
    cursor_row: usize,
    top_index: usize,
    page_size: usize,
}

impl MenuState {
    pub fn new(items: Vec<MenuItem>, page_size: usize, preselected: &[usize]) -> Self {
        let sort_enabled = items
            .iter()
            .any(|it| it.last_used.is_some() || it.size_kb.is_some());
        // Without metadata a date/size order would be fabricated from
        // zeros, so sorting degrades to name-only and the controls go dark.
        let sort_key = if sort_enabled {
            SortKey::Date
        } else {
            SortKey::Name
        };

        let selected = preselected
            .iter()
            .copied()
            .filter(|&i| i < items.len())
            .collect();

        let mut state = Self {
            items,
            selected,
            filter_text: String::new(),
            applied_filter: String::new(),
            filter_mode: false,
            sort_key,
            sort_reversed: false,
            sort_enabled,
            help_visible: false,
            view: Vec::new(),
            cursor_row: 0,
            top_index: 0,
            page_size: page_size.max(1),
        };
        state.rebuild_view();
        state
    }

    /// Feed one decoded key and get the next state transition.
    pub fn handle(&mut self, key: Key) -> Transition {
        if self.filter_mode {
            self.handle_filter_edit(key)
        } else {
            self.handle_normal(key)
        }
    }

    fn handle_normal(&mut self, key: Key) -> Transition {
        match key {
            Key::Up => {
                self.move_up();
                Transition::Continue
            }
            Key::Down => {
                self.move_down();
                Transition::Continue
            }
            Key::Space => {
                self.toggle_current();
                Transition::Continue
            }
            Key::Enter => match self.commit() {
                Some(indices) => Transition::Confirmed(indices),
                None => Transition::Continue,
            },
            Key::Quit => Transition::Cancelled,
            Key::Filter => {
                if !self.applied_filter.is_empty() {
                    // Second toggle on an applied filter clears it.
                    self.applied_filter.clear();
                } else {
                    self.filter_mode = true;
                    self.filter_text.clear();
                }
                self.rebuild_view();
                Transition::Continue
            }
            Key::SortToggle => {
                if self.sort_enabled {
                    self.sort_key = self.sort_key.next();
                    self.sort_reversed = false;
                    self.rebuild_view();
                }
                Transition::Continue
            }
            Key::SortReverse => {
                if self.sort_enabled {
                    self.sort_reversed = !self.sort_reversed;
                    self.rebuild_view();
                }
                Transition::Continue
            }
            Key::Help => {
                self.help_visible = !self.help_visible;
                Transition::Continue
            }
            _ => Transition::Continue,
        }
    }

    fn handle_filter_edit(&mut self, key: Key) -> Transition {
        match key {
            Key::Char(c) => {
                self.filter_text.push(c);
                self.rebuild_view();
            }
            Key::Delete => {
                self.filter_text.pop();
                self.rebuild_view();
            }
            Key::Enter => {
                // Commit: the live query becomes the applied filter.
                self.applied_filter = self.filter_text.clone();
                self.filter_mode = false;
                self.rebuild_view();
            }
            Key::Quit => {
                // Cancel clears both live and applied queries and
                // returns to the top of the full view.
                self.filter_text.clear();
                self.applied_filter.clear();
                self.filter_mode = false;
                self.rebuild_view();
                self.cursor_row = 0;
                self.top_index = 0;
            }
            _ => {}
        }
        Transition::Continue
    }

    /// Recompute the projection: filter on the active query, then a stable
    /// sort on the active key. Runs after every state-affecting input.
    fn rebuild_view(&mut self) {
        let query = self.active_query().to_lowercase();
        self.view = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, it)| query.is_empty() || it.label.to_lowercase().contains(&query))
            .map(|(i, _)| i)
            .collect();

        let key = self.sort_key;
        let reversed = self.sort_reversed;
        let items = &self.items;
        // Stable sort; equal keys keep original index order.
        self.view.sort_by(|&a, &b| {
            let ord = match key {
                SortKey::Date => {
                    let da = items[a].last_used.unwrap_or(i64::MAX);
                    let db = items[b].last_used.unwrap_or(i64::MAX);
                    da.cmp(&db)
                }
                SortKey::Name => items[a]
                    .label
                    .to_lowercase()
                    .cmp(&items[b].label.to_lowercase()),
                // Natural size order is largest first.
                SortKey::Size => {
                    let sa = items[a].size_kb.unwrap_or(i64::MIN);
                    let sb = items[b].size_kb.unwrap_or(i64::MIN);
                    sb.cmp(&sa)
                }
            };
            if reversed { ord.reverse() } else { ord }
        });

        self.clamp_window();
    }

    /// Keep the scroll window and cursor valid after any rebuild, clamping
    /// to the nearest position rather than jumping back to the top.
    fn clamp_window(&mut self) {
        if self.view.is_empty() {
            self.top_index = 0;
            self.cursor_row = 0;
            return;
        }
        let max_top = self.view.len().saturating_sub(self.page_size);
        if self.top_index > max_top {
            self.top_index = max_top;
        }
        let visible = self.visible_rows();
        if self.cursor_row >= visible {
            self.cursor_row = visible - 1;
        }
    }

    fn move_up(&mut self) {
        if self.cursor_row > 0 {
            self.cursor_row -= 1;
        } else if self.top_index > 0 {
            self.top_index -= 1;
        }
    }

    fn move_down(&mut self) {
        if self.cursor_row + 1 < self.visible_rows() {
            self.cursor_row += 1;
        } else if self.top_index + self.visible_rows() < self.view.len() {
            // Line scroll, not page jump.
            self.top_index += 1;
        }
    }

    /// Flip selection for the item under the cursor, resolved through the
    /// view so a row number never leaks out as an identity.
    fn toggle_current(&mut self) {
        if let Some(index) = self.cursor_item_index() {
            if !self.selected.remove(&index) {
                self.selected.insert(index);
            }
        }
    }

    /// Chosen original indices in ascending order, or None when there is
    /// nothing to act on. With no explicit selection the cursor item is
    /// the implied choice; with any explicit selection only that set is
    /// returned.
    fn commit(&mut self) -> Option<Vec<usize>> {
        if self.selected.is_empty() {
            let index = self.cursor_item_index()?;
            self.selected.insert(index);
        }
        Some(self.selected.iter().copied().collect())
    }

    fn active_query(&self) -> &str {
        if self.filter_mode {
            &self.filter_text
        } else {
            &self.applied_filter
        }
    }

    // --- accessors for rendering and tests ---

    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    pub fn view_indices(&self) -> &[usize] {
        &self.view
    }

    /// Original index of the item under the cursor, if any.
    pub fn cursor_item_index(&self) -> Option<usize> {
        self.view.get(self.top_index + self.cursor_row).copied()
    }

    /// Rows currently on screen: `(original index, is cursor row)`.
    pub fn page(&self) -> impl Iterator<Item = (usize, bool)> + '_ {
        let cursor_pos = self.top_index + self.cursor_row;
        self.view
            .iter()
            .enumerate()
            .skip(self.top_index)
            .take(self.visible_rows())
            .map(move |(pos, &index)| (index, pos == cursor_pos))
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.selected.contains(&index)
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    pub fn visible_rows(&self) -> usize {
        self.page_size
            .min(self.view.len().saturating_sub(self.top_index))
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn top_index(&self) -> usize {
        self.top_index
    }

    pub fn cursor_row(&self) -> usize {
        self.cursor_row
    }

    pub fn filter_mode(&self) -> bool {
        self.filter_mode
    }

    pub fn live_filter(&self) -> &str {
        &self.filter_text
    }

    pub fn applied_filter(&self) -> &str {
        &self.applied_filter
    }

    pub fn sort_key(&self) -> SortKey {
        self.sort_key
    }

    pub fn sort_reversed(&self) -> bool {
        self.sort_reversed
    }

    pub fn sort_enabled(&self) -> bool {
        self.sort_enabled
    }

    pub fn help_visible(&self) -> bool {
        self.help_visible
    }

    /// The window/cursor invariant; checked by tests after transitions.
    #[cfg(test)]
    fn assert_window_invariant(&self) {
        if self.view.is_empty() {
            assert_eq!(self.cursor_row, 0);
            assert_eq!(self.top_index, 0);
        } else {
            assert!(self.top_index < self.view.len());
            assert!(self.cursor_row < self.visible_rows());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_items(labels: &[&str]) -> Vec<MenuItem> {
        labels
            .iter()
            .enumerate()
            .map(|(i, l)| MenuItem::new(i, *l))
            .collect()
    }

    fn meta_items(rows: &[(&str, i64, i64)]) -> Vec<MenuItem> {
        rows.iter()
            .enumerate()
            .map(|(i, (l, used, kb))| {
                MenuItem::new(i, *l).with_metadata(Some(*used), Some(*kb))
            })
            .collect()
    }

    fn type_filter(state: &mut MenuState, text: &str) {
        state.handle(Key::Filter);
        assert!(state.filter_mode());
        for c in text.chars() {
            state.handle(Key::Char(c));
        }
    }

    #[test]
    fn no_metadata_forces_name_sort_and_disables_controls() {
        let mut state = MenuState::new(plain_items(&["b", "a", "c"]), 10, &[]);
        assert!(!state.sort_enabled());
        assert_eq!(state.sort_key(), SortKey::Name);

        let before = state.view_indices().to_vec();
        state.handle(Key::SortToggle);
        state.handle(Key::SortReverse);
        assert_eq!(state.view_indices(), before.as_slice());
        assert_eq!(state.sort_key(), SortKey::Name);
    }

    #[test]
    fn default_sort_is_oldest_first_when_metadata_present() {
        let items = meta_items(&[("new", 300, 1), ("old", 100, 1), ("mid", 200, 1)]);
        let state = MenuState::new(items, 10, &[]);
        assert_eq!(state.sort_key(), SortKey::Date);
        assert_eq!(state.view_indices(), &[1, 2, 0]);
    }

    #[test]
    fn size_sort_is_largest_first_by_default() {
        let items = meta_items(&[("a", 0, 10), ("b", 0, 300), ("c", 0, 50)]);
        let mut state = MenuState::new(items, 10, &[]);
        state.handle(Key::SortToggle); // date -> name
        state.handle(Key::SortToggle); // name -> size
        assert_eq!(state.sort_key(), SortKey::Size);
        assert_eq!(state.view_indices(), &[1, 2, 0]);

        state.handle(Key::SortReverse);
        assert_eq!(state.view_indices(), &[0, 2, 1]);
    }

    #[test]
    fn switching_sort_key_resets_reverse_to_natural() {
        let items = meta_items(&[("a", 1, 1), ("b", 2, 2)]);
        let mut state = MenuState::new(items, 10, &[]);
        state.handle(Key::SortReverse);
        assert!(state.sort_reversed());
        state.handle(Key::SortToggle);
        assert!(!state.sort_reversed());
    }

    #[test]
    fn sort_ties_keep_original_index_order() {
        let items = meta_items(&[("x", 5, 7), ("y", 5, 7), ("z", 5, 7)]);
        let mut state = MenuState::new(items, 10, &[]);
        assert_eq!(state.view_indices(), &[0, 1, 2]);
        state.handle(Key::SortToggle); // name differs, skip
        state.handle(Key::SortToggle); // size: all tied
        assert_eq!(state.view_indices(), &[0, 1, 2]);
    }

    #[test]
    fn filter_is_case_insensitive_substring() {
        let mut state = MenuState::new(
            plain_items(&["Homebrew cache", "Xcode logs", "User caches"]),
            10,
            &[],
        );
        type_filter(&mut state, "CACHE");
        assert_eq!(state.view_indices(), &[0, 2]);
    }

    #[test]
    fn entering_filter_mode_matches_all_items() {
        let mut state = MenuState::new(plain_items(&["a", "b"]), 10, &[]);
        state.handle(Key::Filter);
        assert!(state.filter_mode());
        assert_eq!(state.view_indices().len(), 2);
    }

    #[test]
    fn live_filter_updates_while_typing_and_commit_applies_it() {
        let mut state = MenuState::new(plain_items(&["alpha", "beta", "ab"]), 10, &[]);
        type_filter(&mut state, "a");
        assert_eq!(state.view_indices(), &[0, 1, 2]); // all contain 'a'
        state.handle(Key::Char('l'));
        assert_eq!(state.view_indices(), &[0]);

        state.handle(Key::Enter);
        assert!(!state.filter_mode());
        assert_eq!(state.applied_filter(), "al");
        assert_eq!(state.view_indices(), &[0]);
    }

    #[test]
    fn cancelling_filter_edit_clears_both_queries_and_resets_scroll() {
        let mut state = MenuState::new(plain_items(&["alpha", "beta", "gamma"]), 2, &[]);
        state.handle(Key::Down);
        state.handle(Key::Down); // scrolled
        type_filter(&mut state, "bet");
        state.handle(Key::Quit);

        assert!(!state.filter_mode());
        assert_eq!(state.live_filter(), "");
        assert_eq!(state.applied_filter(), "");
        assert_eq!(state.view_indices().len(), 3);
        assert_eq!(state.top_index(), 0);
        assert_eq!(state.cursor_row(), 0);
        state.assert_window_invariant();
    }

    #[test]
    fn second_filter_toggle_clears_applied_filter() {
        let mut state = MenuState::new(plain_items(&["alpha", "beta"]), 10, &[]);
        type_filter(&mut state, "bet");
        state.handle(Key::Enter);
        assert_eq!(state.view_indices(), &[1]);

        state.handle(Key::Filter);
        assert!(!state.filter_mode());
        assert_eq!(state.applied_filter(), "");
        assert_eq!(state.view_indices().len(), 2);
    }

    #[test]
    fn backspace_edits_live_query() {
        let mut state = MenuState::new(plain_items(&["alpha", "beta"]), 10, &[]);
        type_filter(&mut state, "bx");
        assert!(state.view_indices().is_empty());
        state.handle(Key::Delete);
        assert_eq!(state.live_filter(), "b");
        assert_eq!(state.view_indices(), &[1]);
    }

    #[test]
    fn selection_survives_filtering_out_of_view() {
        let mut state = MenuState::new(plain_items(&["alpha", "beta"]), 10, &[]);
        state.handle(Key::Space); // select alpha (index 0)
        assert!(state.is_selected(0));

        type_filter(&mut state, "beta");
        state.handle(Key::Enter);
        assert_eq!(state.view_indices(), &[1]);
        assert!(state.is_selected(0), "selection keyed by index, not view");

        state.handle(Key::Filter); // clear applied filter
        assert!(state.is_selected(0));
    }

    #[test]
    fn toggle_resolves_through_view_not_row_number() {
        let items = meta_items(&[("new", 300, 1), ("old", 100, 1)]);
        let mut state = MenuState::new(items, 10, &[]);
        // Date sort puts "old" (index 1) on row 0.
        state.handle(Key::Space);
        assert!(state.is_selected(1));
        assert!(!state.is_selected(0));
    }

    #[test]
    fn down_at_page_bottom_line_scrolls() {
        let mut state = MenuState::new(plain_items(&["a", "b", "c", "d"]), 2, &[]);
        state.handle(Key::Down); // row 1
        assert_eq!((state.top_index(), state.cursor_row()), (0, 1));
        state.handle(Key::Down); // scroll by one line
        assert_eq!((state.top_index(), state.cursor_row()), (1, 1));
        state.handle(Key::Down);
        state.handle(Key::Down); // at end, no further
        assert_eq!((state.top_index(), state.cursor_row()), (2, 1));
    }

    #[test]
    fn up_at_page_top_scrolls_back() {
        let mut state = MenuState::new(plain_items(&["a", "b", "c", "d"]), 2, &[]);
        for _ in 0..3 {
            state.handle(Key::Down);
        }
        for _ in 0..3 {
            state.handle(Key::Up);
        }
        assert_eq!((state.top_index(), state.cursor_row()), (0, 0));
    }

    #[test]
    fn commit_with_no_selection_acts_on_cursor_item() {
        let mut state = MenuState::new(plain_items(&["a", "b", "c"]), 10, &[]);
        state.handle(Key::Down); // cursor on index 1
        match state.handle(Key::Enter) {
            Transition::Confirmed(indices) => assert_eq!(indices, vec![1]),
            other => panic!("expected Confirmed, got {:?}", other),
        }
    }

    #[test]
    fn commit_with_explicit_selection_ignores_cursor() {
        let mut state = MenuState::new(plain_items(&["a", "b", "c"]), 10, &[]);
        state.handle(Key::Space); // select index 0
        state.handle(Key::Down);
        state.handle(Key::Down); // cursor now on index 2, unselected
        match state.handle(Key::Enter) {
            Transition::Confirmed(indices) => assert_eq!(indices, vec![0]),
            other => panic!("expected Confirmed, got {:?}", other),
        }
    }

    #[test]
    fn commit_order_is_ascending_regardless_of_view_order() {
        // Items ["b","a","c"]; select view rows for original indices 2 and 0.
        let mut state = MenuState::new(plain_items(&["b", "a", "c"]), 10, &[]);
        // Name sort view: a(1), b(0), c(2)
        assert_eq!(state.view_indices(), &[1, 0, 2]);
        state.handle(Key::Down);
        state.handle(Key::Space); // selects index 0
        state.handle(Key::Down);
        state.handle(Key::Space); // selects index 2
        match state.handle(Key::Enter) {
            Transition::Confirmed(indices) => assert_eq!(indices, vec![0, 2]),
            other => panic!("expected Confirmed, got {:?}", other),
        }
    }

    #[test]
    fn quit_cancels() {
        let mut state = MenuState::new(plain_items(&["a"]), 10, &[]);
        assert_eq!(state.handle(Key::Quit), Transition::Cancelled);
    }

    #[test]
    fn preselection_out_of_range_is_dropped() {
        let state = MenuState::new(plain_items(&["a", "b"]), 10, &[1, 9]);
        assert!(state.is_selected(1));
        assert_eq!(state.selected_count(), 1);
    }

    #[test]
    fn twenty_five_items_filter_scenario() {
        // 25 items, page 10, no metadata: name sort forced, filter to 3.
        let labels: Vec<String> = (0..25).map(|i| format!("item-{:02}", i)).collect();
        let items: Vec<MenuItem> = labels
            .iter()
            .enumerate()
            .map(|(i, l)| MenuItem::new(i, l.clone()))
            .collect();
        let mut state = MenuState::new(items, 10, &[]);
        assert!(!state.sort_enabled());

        // Scroll deep, then filter down to the three "item-1x" with x in {0,1,2}.
        for _ in 0..15 {
            state.handle(Key::Down);
        }
        type_filter(&mut state, "item-1");
        state.handle(Key::Char('0'));
        state.handle(Key::Delete);
        state.handle(Key::Enter);

        let matches: Vec<usize> = (10..20).collect();
        assert_eq!(state.view_indices(), matches.as_slice());

        // Toggling filter again clears the applied query.
        state.handle(Key::Filter);
        assert_eq!(state.view_indices().len(), 25);

        type_filter(&mut state, "item-02");
        state.handle(Key::Enter);
        assert_eq!(state.view_indices(), &[2]);
        assert_eq!(state.top_index(), 0);
        state.assert_window_invariant();
    }

    #[test]
    fn empty_view_while_typing_keeps_invariant() {
        let mut state = MenuState::new(plain_items(&["a", "b"]), 10, &[]);
        type_filter(&mut state, "zzz");
        assert!(state.view_indices().is_empty());
        assert_eq!(state.cursor_item_index(), None);
        state.assert_window_invariant();

        // Space and Enter on an empty view are no-ops.
        state.handle(Key::Enter); // commits the (matchless) filter
        assert_eq!(state.handle(Key::Space), Transition::Continue);
        assert_eq!(state.handle(Key::Enter), Transition::Continue);
    }

    #[test]
    fn filter_rebuild_clamps_rather_than_resetting_when_possible() {
        let labels: Vec<String> = (0..30).map(|i| format!("row {:02}", i)).collect();
        let items: Vec<MenuItem> = labels
            .iter()
            .enumerate()
            .map(|(i, l)| MenuItem::new(i, l.clone()))
            .collect();
        let mut state = MenuState::new(items, 10, &[]);
        for _ in 0..25 {
            state.handle(Key::Down);
        }
        let deep_top = state.top_index();
        assert!(deep_top > 0);

        // A filter that still matches everything keeps the window in place.
        type_filter(&mut state, "row");
        assert_eq!(state.top_index(), deep_top);
        state.assert_window_invariant();
    }

    #[test]
    fn help_key_toggles_help() {
        let mut state = MenuState::new(plain_items(&["a"]), 10, &[]);
        assert!(!state.help_visible());
        state.handle(Key::Help);
        assert!(state.help_visible());
        state.handle(Key::Help);
        assert!(!state.help_visible());
    }
}
