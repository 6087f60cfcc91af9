//! Screen stack and load-result routing.
//!
//! The list is always at the bottom of the stack. The editor sits on top
//! of it, and at most one picker sits on top of the editor. A picker holds a
//! working copy of the editor's selection; `back` drops it, `confirm`
//! commits it to the editor.

use catalog::prelude::*;
use tracing::debug;

use super::editor::{EditorDefaults, EditorOptions, ItemEditor, TierKind, TierRequest};
use super::list::{Applied, CatalogList, Page, PageRequest};
use super::locations::LocationPicker;
use super::picker::ImagePicker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Screen {
    List,
    Editor,
    ImagePicker,
    LocationPicker,
}

/// A fetch the ui wants performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Page(PageRequest),
    Tier(TierRequest),
}

/// Result of a fetch, tagged with the request that produced it.
#[derive(Debug, Clone)]
pub enum LoadEvent {
    Page {
        request: PageRequest,
        result: Result<Page, String>,
    },
    Detail {
        request: TierRequest,
        result: Result<Product, String>,
    },
    Images {
        request: TierRequest,
        result: Result<ImageSet, String>,
    },
    Locations {
        request: TierRequest,
        result: Result<Vec<Location>, String>,
    },
}

#[derive(Debug)]
pub enum Overlay {
    Images(ImagePicker),
    Locations(LocationPicker),
}

#[derive(Debug)]
pub struct Navigator {
    list: CatalogList,
    editor: Option<ItemEditor>,
    overlay: Option<Overlay>,
}

impl Navigator {
    pub fn new(list: CatalogList) -> Self {
        Self {
            list,
            editor: None,
            overlay: None,
        }
    }

    pub fn screen(&self) -> Screen {
        match (&self.editor, &self.overlay) {
            (None, _) => Screen::List,
            (Some(_), None) => Screen::Editor,
            (Some(_), Some(Overlay::Images(_))) => Screen::ImagePicker,
            (Some(_), Some(Overlay::Locations(_))) => Screen::LocationPicker,
        }
    }

    pub fn list(&self) -> &CatalogList {
        &self.list
    }

    pub fn list_mut(&mut self) -> &mut CatalogList {
        &mut self.list
    }

    pub fn editor(&self) -> Option<&ItemEditor> {
        self.editor.as_ref()
    }

    pub fn editor_mut(&mut self) -> Option<&mut ItemEditor> {
        self.editor.as_mut()
    }

    pub fn image_picker(&self) -> Option<&ImagePicker> {
        match &self.overlay {
            Some(Overlay::Images(picker)) => Some(picker),
            _ => None,
        }
    }

    pub fn image_picker_mut(&mut self) -> Option<&mut ImagePicker> {
        match &mut self.overlay {
            Some(Overlay::Images(picker)) => Some(picker),
            _ => None,
        }
    }

    pub fn location_picker(&self) -> Option<&LocationPicker> {
        match &self.overlay {
            Some(Overlay::Locations(picker)) => Some(picker),
            _ => None,
        }
    }

    pub fn location_picker_mut(&mut self) -> Option<&mut LocationPicker> {
        match &mut self.overlay {
            Some(Overlay::Locations(picker)) => Some(picker),
            _ => None,
        }
    }

    /// Opens the editor for a product, replacing any open editor.
    pub fn open_editor(
        &mut self,
        product_id: u64,
        options: EditorOptions,
        defaults: EditorDefaults,
    ) -> Vec<TierRequest> {
        let (editor, requests) = ItemEditor::open(product_id, options, defaults);
        self.overlay = None;
        self.editor = Some(editor);
        requests
    }

    /// Opens the image picker over the editor. Returns false without an editor.
    pub fn open_image_picker(&mut self) -> bool {
        let Some(editor) = &self.editor else {
            return false;
        };
        self.overlay = Some(Overlay::Images(editor.open_image_picker()));
        true
    }

    /// Opens the location picker over the editor. Returns false without an editor.
    pub fn open_location_picker(&mut self) -> bool {
        let Some(editor) = &self.editor else {
            return false;
        };
        self.overlay = Some(Overlay::Locations(editor.open_location_picker()));
        true
    }

    /// Closes the top screen, discarding its state. Returns the screen now shown.
    pub fn back(&mut self) -> Screen {
        if self.overlay.take().is_none() {
            self.editor = None;
        }
        self.screen()
    }

    /// Commits the open picker's selection to the editor and closes the picker.
    /// Returns false if no picker is open.
    pub fn confirm_picker(&mut self) -> bool {
        let (Some(editor), Some(overlay)) = (self.editor.as_mut(), self.overlay.take()) else {
            return false;
        };
        match overlay {
            Overlay::Images(picker) => editor.commit_images(picker.confirm()),
            Overlay::Locations(picker) => editor.commit_locations(picker.confirm()),
        }
        true
    }

    /// Routes a load result to the screen that requested it.
    /// Returns false if the result was dropped.
    pub fn deliver(&mut self, event: LoadEvent) -> bool {
        match event {
            LoadEvent::Page { request, result } => {
                self.list.apply_page(&request, result) != Applied::Stale
            }
            LoadEvent::Detail { request, result } => self
                .editor_for(&request)
                .is_some_and(|editor| editor.apply_detail(&request, result)),
            LoadEvent::Images { request, result } => {
                let Some(editor) = self.editor_for(&request) else {
                    return false;
                };
                if !editor.apply_images(&request, result) {
                    return false;
                }
                let images = editor.images().ready().cloned();
                if let (Some(images), Some(picker)) = (images, self.image_picker_mut()) {
                    picker.set_images(images);
                }
                true
            }
            LoadEvent::Locations { request, result } => {
                let Some(editor) = self.editor_for(&request) else {
                    return false;
                };
                if !editor.apply_locations(&request, result) {
                    return false;
                }
                let candidates = editor.locations().ready().cloned();
                if let (Some(candidates), Some(picker)) = (candidates, self.location_picker_mut()) {
                    picker.set_candidates(candidates);
                }
                true
            }
        }
    }

    fn editor_for(&mut self, request: &TierRequest) -> Option<&mut ItemEditor> {
        let editor = self.editor.as_mut();
        if editor.is_none() {
            debug!(?request, "editor closed, dropping result");
        }
        editor
    }
}

impl LoadEvent {
    /// Kind of tier this event resolves, if it is a tier event.
    pub fn tier(&self) -> Option<TierKind> {
        match self {
            Self::Page { .. } => None,
            Self::Detail { .. } => Some(TierKind::Detail),
            Self::Images { .. } => Some(TierKind::Images),
            Self::Locations { .. } => Some(TierKind::Locations),
        }
    }
}
