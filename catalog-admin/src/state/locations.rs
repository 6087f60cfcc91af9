//! Location picker: checkbox multi-select over the location candidates,
//! filtered by a search box. Same working-copy pattern as the image picker.

use catalog::prelude::*;

#[derive(Debug, Clone)]
pub struct LocationPicker {
    candidates: Option<Vec<Location>>,
    filter: String,
    selected: Vec<String>,
    cursor: usize,
}

impl LocationPicker {
    /// Creates a picker. `candidates` is None while the location list is loading.
    pub fn new(candidates: Option<Vec<Location>>, initial_ids: Vec<String>) -> Self {
        let mut picker = Self {
            candidates: None,
            filter: String::new(),
            selected: initial_ids,
            cursor: 0,
        };
        if let Some(candidates) = candidates {
            picker.set_candidates(candidates);
        }
        picker
    }

    pub fn set_candidates(&mut self, candidates: Vec<Location>) {
        self.candidates = Some(candidates);
        self.order_selection();
        self.cursor = self.cursor.min(self.visible().len().saturating_sub(1));
    }

    pub fn is_loaded(&self) -> bool {
        self.candidates.is_some()
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Filters by case-insensitive substring of the location name.
    pub fn set_filter(&mut self, text: &str) {
        self.filter = text.trim().to_string();
        self.cursor = 0;
    }

    pub fn visible(&self) -> Vec<&Location> {
        let needle = self.filter.to_lowercase();
        self.candidates
            .iter()
            .flatten()
            .filter(|l| needle.is_empty() || l.name.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.iter().any(|s| s == id)
    }

    pub fn toggle(&mut self, id: &str) {
        if let Some(pos) = self.selected.iter().position(|s| s == id) {
            self.selected.remove(pos);
        } else {
            self.selected.push(id.to_string());
            self.order_selection();
        }
    }

    pub fn unselect_all(&mut self) {
        self.selected.clear();
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.visible().len();
        self.cursor = if len == 0 {
            0
        } else {
            self.cursor.saturating_add_signed(delta).min(len - 1)
        };
    }

    pub fn toggle_at_cursor(&mut self) {
        let id = self.visible().get(self.cursor).map(|l| l.id.clone());
        if let Some(id) = id {
            self.toggle(&id);
        }
    }

    /// Ends the picker, returning the selected ids for the editor to commit.
    pub fn confirm(self) -> Vec<String> {
        self.selected
    }

    // candidate order; ids not among the candidates keep their place at the end
    fn order_selection(&mut self) {
        let Some(candidates) = &self.candidates else {
            return;
        };
        let rank = |id: &String| {
            candidates
                .iter()
                .position(|c| &c.id == id)
                .unwrap_or(usize::MAX)
        };
        self.selected.sort_by_key(rank);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_ids() -> Vec<String> {
        default_locations().into_iter().map(|l| l.id).collect()
    }

    #[test]
    fn starts_with_initial_selection() {
        let picker = LocationPicker::new(Some(default_locations()), all_ids());
        assert_eq!(picker.selected().len(), 4);
        assert!(picker.is_selected("3"));
    }

    #[test]
    fn filter_is_case_insensitive() {
        let mut picker = LocationPicker::new(Some(default_locations()), Vec::new());
        picker.set_filter("SQU");
        let names: Vec<&str> = picker.visible().iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Square"]);
        picker.set_filter("locations");
        assert_eq!(picker.visible().len(), 2);
    }

    #[test]
    fn toggle_keeps_candidate_order() {
        let mut picker = LocationPicker::new(Some(default_locations()), Vec::new());
        picker.toggle("4");
        picker.toggle("2");
        assert_eq!(picker.selected(), ["2", "4"]);
        picker.toggle("4");
        assert_eq!(picker.selected(), ["2"]);
    }

    #[test]
    fn unselect_all_then_confirm() {
        let mut picker = LocationPicker::new(Some(default_locations()), all_ids());
        picker.unselect_all();
        picker.move_cursor(1);
        picker.toggle_at_cursor();
        assert_eq!(picker.confirm(), vec!["2".to_string()]);
    }

    #[test]
    fn loading_picker_keeps_initial_ids() {
        let mut picker = LocationPicker::new(None, vec!["3".to_string(), "1".to_string()]);
        assert!(!picker.is_loaded());
        assert!(picker.visible().is_empty());
        picker.set_candidates(default_locations());
        assert_eq!(picker.selected(), ["1", "3"]);
    }
}
