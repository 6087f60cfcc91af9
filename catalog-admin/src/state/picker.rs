//! Image picker: multi-select over a product's image library.
//!
//! The picker works on a copy of the editor's selection. Nothing reaches the
//! editor until [`ImagePicker::confirm`]; dropping the picker discards it.

use catalog::prelude::*;

/// Display order of the image grid.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ImageSort {
    /// fetch order
    #[default]
    Newest,
    /// reverse fetch order
    Oldest,
}

impl ImageSort {
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Newest => Self::Oldest,
            Self::Oldest => Self::Newest,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImagePicker {
    images: Option<ImageSet>,
    filter: String,
    sort: ImageSort,
    selected: Vec<Image>,
    cursor: usize,
}

impl ImagePicker {
    /// Creates a picker whose working copy starts as `initial`.
    pub fn new(initial: Vec<Image>) -> Self {
        let mut picker = Self {
            images: None,
            filter: String::new(),
            sort: ImageSort::default(),
            selected: initial,
            cursor: 0,
        };
        picker.order_selection();
        picker
    }

    /// Sets the library once it has loaded.
    pub fn set_images(&mut self, images: ImageSet) {
        // refresh positions of already-selected images from the new library
        for image in &mut self.selected {
            if let Some(fresh) = images.get(&image.id) {
                image.clone_from(fresh);
            }
        }
        self.images = Some(images);
        self.order_selection();
        self.clamp_cursor();
    }

    pub fn is_loaded(&self) -> bool {
        self.images.is_some()
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Filters by case-insensitive substring of the image name.
    pub fn set_filter(&mut self, text: &str) {
        self.filter = text.trim().to_string();
        self.cursor = 0;
    }

    pub fn sort(&self) -> ImageSort {
        self.sort
    }

    pub fn toggle_sort(&mut self) {
        self.sort = self.sort.toggled();
        self.cursor = 0;
    }

    /// Filtered and sorted view of the library.
    pub fn visible(&self) -> Vec<&Image> {
        let Some(images) = &self.images else {
            return Vec::new();
        };
        let needle = self.filter.to_lowercase();
        let mut visible: Vec<&Image> = images
            .iter()
            .filter(|image| needle.is_empty() || image.name.to_lowercase().contains(&needle))
            .collect();
        if self.sort == ImageSort::Oldest {
            visible.reverse();
        }
        visible
    }

    /// Working copy, in fetch order.
    pub fn selected(&self) -> &[Image] {
        &self.selected
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.iter().any(|image| image.id == id)
    }

    /// Adds or removes `image` from the working copy.
    pub fn toggle(&mut self, image: &Image) {
        if let Some(pos) = self.selected.iter().position(|s| s.id == image.id) {
            self.selected.remove(pos);
        } else {
            self.selected.push(image.clone());
            self.order_selection();
        }
    }

    /// Clears the working copy.
    pub fn unselect_all(&mut self) {
        self.selected.clear();
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.visible().len();
        if len == 0 {
            self.cursor = 0;
            return;
        }
        self.cursor = self.cursor.saturating_add_signed(delta).min(len - 1);
    }

    pub fn jump_last(&mut self) {
        self.cursor = self.visible().len().saturating_sub(1);
    }

    /// Toggles the image under the cursor.
    pub fn toggle_at_cursor(&mut self) {
        let image = self.visible().get(self.cursor).map(|image| (*image).clone());
        if let Some(image) = image {
            self.toggle(&image);
        }
    }

    /// Ends the picker, returning the selection for the editor to commit.
    pub fn confirm(self) -> Vec<Image> {
        self.selected
    }

    fn order_selection(&mut self) {
        self.selected.sort_by_key(|image| image.index);
    }

    fn clamp_cursor(&mut self) {
        let len = self.visible().len();
        self.cursor = self.cursor.min(len.saturating_sub(1));
    }
}
