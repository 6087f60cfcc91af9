//! Item editor overlay.
//!
//! An editor session loads three tiers independently: the product detail,
//! the image library, and the location candidates. Each tier renders its
//! own loading and error state, so a slow or failed tier never blocks the
//! others. Results are tagged with the session id and dropped if the editor
//! they were requested for is gone.

use std::{
    collections::HashSet,
    sync::atomic::{AtomicU64, Ordering},
};

use catalog::prelude::*;
use tracing::{debug, info, warn};

use super::form::{
    EditForm, EditSubmission, Field, ItemType, ValidationErrors, format_price,
};
use super::locations::LocationPicker;
use super::picker::ImagePicker;

static NEXT_SESSION: AtomicU64 = AtomicU64::new(1);

/// Identifies one opening of the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    fn next() -> Self {
        Self(NEXT_SESSION.fetch_add(1, Ordering::Relaxed))
    }
}

/// Load state of one tier.
#[derive(Debug, Clone, PartialEq)]
pub enum Tier<T> {
    Pending,
    Ready(T),
    Failed(String),
}

impl<T> Tier<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum TierKind {
    Detail,
    Images,
    Locations,
}

/// Token for one tier fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TierRequest {
    pub session: SessionId,
    pub product_id: u64,
    pub kind: TierKind,
}

/// Optional editor sections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditorOptions {
    pub with_price_field: bool,
    pub with_availability_panel: bool,
}

/// Caller-supplied initial values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorDefaults {
    /// Initial locations. None selects every candidate once the list loads.
    pub location_ids: Option<Vec<String>>,
    pub item_type: ItemType,
}

/// Receives a valid submission.
pub trait SubmitHandler {
    fn submit(&mut self, submission: &EditSubmission);
}

/// Logs each submission as json.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSubmitHandler;

impl SubmitHandler for LogSubmitHandler {
    fn submit(&mut self, submission: &EditSubmission) {
        match serde_json::to_string(submission) {
            Ok(json) => info!(product_id = submission.product_id, %json, "item submitted"),
            Err(e) => warn!(product_id = submission.product_id, error = %e, "submission not serializable"),
        }
    }
}

#[derive(Debug)]
pub struct ItemEditor {
    session: SessionId,
    product_id: u64,
    options: EditorOptions,
    detail: Tier<Product>,
    images: Tier<ImageSet>,
    locations: Tier<Vec<Location>>,
    form: EditForm,
    // text fields typed by the user; the detail tier leaves these alone
    edited: HashSet<Field>,
    selected_images: Vec<Image>,
    // true once the location selection has been seeded or committed
    locations_set: bool,
    focus: Field,
    errors: Option<ValidationErrors>,
}

impl ItemEditor {
    /// Opens an editor session and returns the requests for its three tiers.
    pub fn open(
        product_id: u64,
        options: EditorOptions,
        defaults: EditorDefaults,
    ) -> (Self, Vec<TierRequest>) {
        let session = SessionId::next();
        let locations_set = defaults.location_ids.is_some();
        let form = EditForm {
            item_type: defaults.item_type,
            available: true,
            location_ids: defaults.location_ids.unwrap_or_default(),
            ..EditForm::default()
        };
        let editor = Self {
            session,
            product_id,
            options,
            detail: Tier::Pending,
            images: Tier::Pending,
            locations: Tier::Pending,
            form,
            edited: HashSet::new(),
            selected_images: Vec::new(),
            locations_set,
            focus: Field::Name,
            errors: None,
        };
        debug!(product_id, session = session.0, "open editor");
        let requests = [TierKind::Detail, TierKind::Images, TierKind::Locations]
            .into_iter()
            .map(|kind| editor.request(kind))
            .collect();
        (editor, requests)
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn product_id(&self) -> u64 {
        self.product_id
    }

    pub fn options(&self) -> EditorOptions {
        self.options
    }

    pub fn detail(&self) -> &Tier<Product> {
        &self.detail
    }

    pub fn images(&self) -> &Tier<ImageSet> {
        &self.images
    }

    pub fn locations(&self) -> &Tier<Vec<Location>> {
        &self.locations
    }

    pub fn form(&self) -> &EditForm {
        &self.form
    }

    pub fn selected_images(&self) -> &[Image] {
        &self.selected_images
    }

    pub fn location_ids(&self) -> &[String] {
        &self.form.location_ids
    }

    /// Names of the selected locations, when the candidates are known.
    pub fn location_names(&self) -> Vec<String> {
        let candidates = self.locations.ready();
        self.form
            .location_ids
            .iter()
            .map(|id| {
                candidates
                    .and_then(|all| all.iter().find(|l| &l.id == id))
                    .map_or_else(|| id.clone(), |l| l.name.clone())
            })
            .collect()
    }

    /// Validation messages from the last failed submit.
    pub fn errors(&self) -> Option<&ValidationErrors> {
        self.errors.as_ref()
    }

    fn request(&self, kind: TierKind) -> TierRequest {
        TierRequest {
            session: self.session,
            product_id: self.product_id,
            kind,
        }
    }

    fn accepts(&self, request: &TierRequest, kind: TierKind) -> bool {
        let ok = request.session == self.session && request.kind == kind;
        if !ok {
            debug!(?request, session = self.session.0, "dropping result for another editor");
        }
        ok
    }

    /// Applies the detail tier. Returns false if the result is for another session.
    ///
    /// Seeds the text fields from the product, except fields the user has
    /// already edited.
    pub fn apply_detail(&mut self, request: &TierRequest, result: Result<Product, String>) -> bool {
        if !self.accepts(request, TierKind::Detail) {
            return false;
        }
        self.detail = match result {
            Ok(product) => {
                self.seed(Field::Name, &product.title);
                self.seed(Field::Description, &product.description);
                self.seed(Field::Price, &format_price(product.price));
                Tier::Ready(product)
            }
            Err(message) => Tier::Failed(message),
        };
        true
    }

    /// Applies the image tier. Returns false if the result is for another session.
    pub fn apply_images(&mut self, request: &TierRequest, result: Result<ImageSet, String>) -> bool {
        if !self.accepts(request, TierKind::Images) {
            return false;
        }
        self.images = match result {
            Ok(images) => Tier::Ready(images),
            Err(message) => Tier::Failed(message),
        };
        true
    }

    /// Applies the location tier. Returns false if the result is for another session.
    pub fn apply_locations(
        &mut self,
        request: &TierRequest,
        result: Result<Vec<Location>, String>,
    ) -> bool {
        if !self.accepts(request, TierKind::Locations) {
            return false;
        }
        self.locations = match result {
            Ok(locations) => {
                if !self.locations_set {
                    self.form.location_ids = locations.iter().map(|l| l.id.clone()).collect();
                    self.locations_set = true;
                }
                Tier::Ready(locations)
            }
            Err(message) => Tier::Failed(message),
        };
        true
    }

    /// Resets failed tiers to pending and returns their requests.
    pub fn retry_failed(&mut self) -> Vec<TierRequest> {
        let mut requests = Vec::new();
        if self.detail.error().is_some() {
            self.detail = Tier::Pending;
            requests.push(self.request(TierKind::Detail));
        }
        if self.images.error().is_some() {
            self.images = Tier::Pending;
            requests.push(self.request(TierKind::Images));
        }
        if self.locations.error().is_some() {
            self.locations = Tier::Pending;
            requests.push(self.request(TierKind::Locations));
        }
        requests
    }

    /// Opens the image picker on a copy of the current selection.
    pub fn open_image_picker(&self) -> ImagePicker {
        let mut picker = ImagePicker::new(self.selected_images.clone());
        if let Some(images) = self.images.ready() {
            picker.set_images(images.clone());
        }
        picker
    }

    /// Opens the location picker on a copy of the current selection.
    pub fn open_location_picker(&self) -> LocationPicker {
        LocationPicker::new(
            self.locations.ready().cloned(),
            self.form.location_ids.clone(),
        )
    }

    /// Replaces the image selection.
    pub fn commit_images(&mut self, images: Vec<Image>) {
        self.form.image_ids = images.iter().map(|i| i.id.clone()).collect();
        self.selected_images = images;
        debug!(count = self.selected_images.len(), "images committed");
    }

    /// Replaces the location selection.
    pub fn commit_locations(&mut self, ids: Vec<String>) {
        self.form.location_ids = ids;
        self.locations_set = true;
        debug!(count = self.form.location_ids.len(), "locations committed");
    }

    /// Rows the editor shows, in focus order.
    pub fn fields(&self) -> Vec<Field> {
        let mut fields = vec![Field::Name, Field::Description];
        if self.options.with_price_field {
            fields.push(Field::Price);
        }
        fields.push(Field::ItemType);
        if self.options.with_availability_panel {
            fields.push(Field::Available);
        }
        fields.extend([Field::Images, Field::Locations]);
        fields
    }

    pub fn focus(&self) -> Field {
        self.focus
    }

    /// Moves focus by `delta` rows, wrapping around.
    pub fn move_focus(&mut self, delta: isize) {
        let fields = self.fields();
        let len = fields.len();
        let current = fields
            .iter()
            .position(|f| *f == self.focus)
            .unwrap_or_default();
        let step = delta.unsigned_abs() % len;
        let next = if delta >= 0 {
            (current + step) % len
        } else {
            (current + len - step) % len
        };
        if let Some(field) = fields.get(next) {
            self.focus = *field;
        }
    }

    pub fn set_text(&mut self, field: Field, value: &str) {
        let before = self.form.text(field);
        self.form.set_text(field, value);
        if self.form.text(field) != before {
            self.edited.insert(field);
        }
    }

    fn seed(&mut self, field: Field, value: &str) {
        if self.edited.contains(&field) {
            debug!(%field, "keeping edited value");
        } else {
            self.form.set_text(field, value);
        }
    }

    pub fn cycle_item_type(&mut self) {
        self.form.item_type = self.form.item_type.next();
    }

    pub fn toggle_available(&mut self) {
        self.form.available = !self.form.available;
    }

    /// Validates the form and, if valid, passes the snapshot to `handler`.
    ///
    /// The handler is not called when validation fails.
    pub fn submit(
        &mut self,
        handler: &mut dyn SubmitHandler,
    ) -> Result<EditSubmission, ValidationErrors> {
        match self.form.validate(
            self.product_id,
            self.options.with_price_field,
            self.options.with_availability_panel,
        ) {
            Ok(submission) => {
                self.errors = None;
                handler.submit(&submission);
                Ok(submission)
            }
            Err(errors) => {
                debug!(%errors, "submit blocked");
                if let Some(field) = errors.fields().next() {
                    self.focus = field;
                }
                self.errors = Some(errors.clone());
                Err(errors)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::fixtures::{image_set, product};

    #[derive(Default)]
    struct Recorder {
        calls: Vec<EditSubmission>,
    }

    impl SubmitHandler for Recorder {
        fn submit(&mut self, submission: &EditSubmission) {
            self.calls.push(submission.clone());
        }
    }

    fn find(requests: &[TierRequest], kind: TierKind) -> TierRequest {
        *requests.iter().find(|r| r.kind == kind).expect("request")
    }

    fn ready_editor(options: EditorOptions) -> ItemEditor {
        let (mut editor, requests) = ItemEditor::open(1, options, EditorDefaults::default());
        editor.apply_detail(&find(&requests, TierKind::Detail), Ok(product(1)));
        editor.apply_images(&find(&requests, TierKind::Images), Ok(image_set(1)));
        editor.apply_locations(&find(&requests, TierKind::Locations), Ok(default_locations()));
        editor
    }

    #[test]
    fn open_requests_three_tiers() {
        let (editor, requests) = ItemEditor::open(5, EditorOptions::default(), EditorDefaults::default());
        assert_eq!(requests.len(), 3);
        assert!(requests.iter().all(|r| r.session == editor.session() && r.product_id == 5));
        assert!(editor.detail().is_pending());
        assert!(editor.images().is_pending());
        assert!(editor.locations().is_pending());
    }

    #[test]
    fn tiers_resolve_independently() {
        let (mut editor, requests) =
            ItemEditor::open(1, EditorOptions::default(), EditorDefaults::default());
        assert!(editor.apply_images(&find(&requests, TierKind::Images), Err("offline".into())));
        assert!(editor.detail().is_pending());
        assert_eq!(editor.images().error(), Some("offline"));

        assert!(editor.apply_detail(&find(&requests, TierKind::Detail), Ok(product(1))));
        assert_eq!(editor.form().name, "Product 001");
        assert_eq!(editor.form().description, "A fine product");
        assert_eq!(editor.form().price, "12.50");

        let retry = editor.retry_failed();
        assert_eq!(retry, vec![find(&requests, TierKind::Images)]);
        assert!(editor.images().is_pending());
        assert!(editor.retry_failed().is_empty());
    }

    #[test]
    fn late_detail_keeps_typed_fields() {
        let options = EditorOptions {
            with_price_field: true,
            with_availability_panel: false,
        };
        let (mut editor, requests) = ItemEditor::open(1, options, EditorDefaults::default());
        let detail = find(&requests, TierKind::Detail);
        editor.set_text(Field::Name, "Typed by user");
        // confirming an unchanged field is not an edit
        editor.set_text(Field::Price, "");

        assert!(editor.apply_detail(&detail, Ok(product(1))));
        assert_eq!(editor.form().name, "Typed by user");
        assert_eq!(editor.form().description, "A fine product");
        assert_eq!(editor.form().price, "12.50");
    }

    #[test]
    fn retried_detail_keeps_edits_made_during_failure() {
        let (mut editor, requests) =
            ItemEditor::open(1, EditorOptions::default(), EditorDefaults::default());
        let detail = find(&requests, TierKind::Detail);
        assert!(editor.apply_detail(&detail, Err("timeout".into())));
        editor.set_text(Field::Description, "Written offline");

        assert_eq!(editor.retry_failed(), vec![detail]);
        assert!(editor.apply_detail(&detail, Ok(product(1))));
        assert_eq!(editor.form().name, "Product 001");
        assert_eq!(editor.form().description, "Written offline");
    }

    #[test]
    fn results_for_other_sessions_are_dropped() {
        let (_old, old_requests) =
            ItemEditor::open(1, EditorOptions::default(), EditorDefaults::default());
        let (mut editor, _) = ItemEditor::open(1, EditorOptions::default(), EditorDefaults::default());
        assert!(!editor.apply_detail(&find(&old_requests, TierKind::Detail), Ok(product(1))));
        assert!(editor.detail().is_pending());
        assert!(editor.form().name.is_empty());
    }

    #[test]
    fn locations_default_to_all_candidates() {
        let editor = ready_editor(EditorOptions::default());
        assert_eq!(editor.location_ids(), ["1", "2", "3", "4"]);
        assert_eq!(editor.location_names()[1], "Square");
    }

    #[test]
    fn caller_default_locations_are_kept() {
        let defaults = EditorDefaults {
            location_ids: Some(vec!["2".to_string()]),
            item_type: ItemType::Service,
        };
        let (mut editor, requests) = ItemEditor::open(1, EditorOptions::default(), defaults);
        editor.apply_locations(&find(&requests, TierKind::Locations), Ok(default_locations()));
        assert_eq!(editor.location_ids(), ["2"]);
        assert_eq!(editor.form().item_type, ItemType::Service);
    }

    #[test]
    fn dismissed_picker_leaves_editor_unchanged() {
        let mut editor = ready_editor(EditorOptions::default());
        let set = image_set(1);
        editor.commit_images(vec![set[0].clone()]);

        let mut picker = editor.open_image_picker();
        picker.toggle(&set[1]);
        picker.toggle(&set[2]);
        picker.toggle(&set[0]);
        assert_eq!(picker.selected().len(), 2);
        drop(picker);

        assert_eq!(editor.selected_images(), &[set[0].clone()]);
        assert_eq!(editor.form().image_ids, vec![set[0].id.clone()]);
    }

    #[test]
    fn reopened_picker_extends_committed_selection() {
        let mut editor = ready_editor(EditorOptions::default());
        let set = image_set(1);

        let mut picker = editor.open_image_picker();
        picker.toggle(&set[4]);
        picker.toggle(&set[2]);
        editor.commit_images(picker.confirm());

        let mut picker = editor.open_image_picker();
        assert!(picker.is_selected(&set[2].id));
        assert!(picker.is_selected(&set[4].id));
        picker.toggle(&set[7]);
        editor.commit_images(picker.confirm());

        let ids: Vec<&str> = editor.selected_images().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec![set[2].id.as_str(), set[4].id.as_str(), set[7].id.as_str()]);
        assert_eq!(editor.form().image_ids.len(), 3);
    }

    #[test]
    fn location_picker_commit_replaces_selection() {
        let mut editor = ready_editor(EditorOptions::default());
        let mut picker = editor.open_location_picker();
        picker.unselect_all();
        picker.toggle("3");
        editor.commit_locations(picker.confirm());
        assert_eq!(editor.location_ids(), ["3"]);
        assert_eq!(editor.location_names(), vec!["Test 2".to_string()]);
    }

    #[test]
    fn submit_with_empty_name_is_blocked() {
        let (mut editor, _) = ItemEditor::open(1, EditorOptions::default(), EditorDefaults::default());
        let mut handler = Recorder::default();
        editor.move_focus(3);
        let errors = editor.submit(&mut handler).expect_err("blocked");
        assert!(errors.get(Field::Name).is_some());
        assert!(handler.calls.is_empty());
        assert_eq!(editor.focus(), Field::Name);
        assert!(editor.errors().is_some());
    }

    #[test]
    fn submit_calls_handler_once_with_selection() {
        let mut editor = ready_editor(EditorOptions {
            with_price_field: true,
            with_availability_panel: true,
        });
        let set = image_set(1);
        editor.commit_images(vec![set[0].clone(), set[3].clone()]);
        let mut handler = Recorder::default();

        let submission = editor.submit(&mut handler).expect("valid");
        assert_eq!(handler.calls.len(), 1);
        assert_eq!(handler.calls[0], submission);
        assert_eq!(submission.image_ids, vec![set[0].id.clone(), set[3].id.clone()]);
        assert_eq!(submission.price, Some(12.5));
        assert_eq!(submission.available, Some(true));
        assert!(editor.errors().is_none());
    }

    #[test]
    fn invalid_price_blocks_submit() {
        let mut editor = ready_editor(EditorOptions {
            with_price_field: true,
            with_availability_panel: false,
        });
        editor.set_text(Field::Price, "-3");
        let mut handler = Recorder::default();
        let errors = editor.submit(&mut handler).expect_err("blocked");
        assert!(errors.get(Field::Price).is_some());
        assert!(handler.calls.is_empty());
    }

    #[test]
    fn focus_follows_enabled_fields() {
        let mut editor = ready_editor(EditorOptions::default());
        assert_eq!(
            editor.fields(),
            vec![Field::Name, Field::Description, Field::ItemType, Field::Images, Field::Locations]
        );
        editor.move_focus(-1);
        assert_eq!(editor.focus(), Field::Locations);
        editor.move_focus(1);
        assert_eq!(editor.focus(), Field::Name);
        editor.move_focus(2);
        editor.cycle_item_type();
        assert_eq!(editor.focus(), Field::ItemType);
        assert_eq!(editor.form().item_type, ItemType::Digital);
    }
}
