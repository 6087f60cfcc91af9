//! Item edit form: field values, validation, and the submission snapshot.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of item being edited.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Deserialize,
    Serialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ItemType {
    #[default]
    Physical,
    Digital,
    Service,
}

impl ItemType {
    /// Next variant, wrapping around.
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::Physical => Self::Digital,
            Self::Digital => Self::Service,
            Self::Service => Self::Physical,
        }
    }
}

/// Focusable rows of the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Field {
    Name,
    Description,
    Price,
    ItemType,
    Available,
    Images,
    Locations,
}

impl Field {
    /// True for fields edited as a line of text.
    pub fn is_text(self) -> bool {
        matches!(self, Self::Name | Self::Description | Self::Price)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Description => "Description",
            Self::Price => "Price",
            Self::ItemType => "Item type",
            Self::Available => "Available",
            Self::Images => "Images",
            Self::Locations => "Locations",
        }
    }
}

/// Field values of the item editor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditForm {
    pub name: String,
    pub description: String,
    /// price as typed
    pub price: String,
    pub item_type: ItemType,
    pub available: bool,
    /// hidden field mirroring the selected images, in selection order
    pub image_ids: Vec<String>,
    pub location_ids: Vec<String>,
}

/// Snapshot of a valid form, handed to the submit handler.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditSubmission {
    pub product_id: u64,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    pub item_type: ItemType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
    pub image_ids: Vec<String>,
    pub location_ids: Vec<String>,
}

/// Per-field validation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<(Field, String)>,
}

impl ValidationErrors {
    fn push(&mut self, field: Field, message: impl Into<String>) {
        self.errors.push((field, message.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Message for `field`, if it failed validation.
    pub fn get(&self, field: Field) -> Option<&str> {
        self.errors
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, message)| message.as_str())
    }

    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.errors.iter().map(|(field, _)| *field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|(field, message)| format!("{field}: {message}"))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

impl EditForm {
    /// Current text of a field, for line editing.
    pub fn text(&self, field: Field) -> String {
        match field {
            Field::Name => self.name.clone(),
            Field::Description => self.description.clone(),
            Field::Price => self.price.clone(),
            Field::ItemType => self.item_type.to_string(),
            Field::Available => self.available.to_string(),
            Field::Images | Field::Locations => String::new(),
        }
    }

    /// Sets a text field. Non-text fields are unchanged.
    pub fn set_text(&mut self, field: Field, value: &str) {
        match field {
            Field::Name => self.name = value.to_string(),
            Field::Description => self.description = value.to_string(),
            Field::Price => self.price = value.trim().to_string(),
            _ => {}
        }
    }

    /// Validates the form and builds the submission snapshot.
    ///
    /// Name is required. When `with_price` is set, price must be a
    /// non-negative decimal. Availability is included only when `with_availability` is set.
    pub fn validate(
        &self,
        product_id: u64,
        with_price: bool,
        with_availability: bool,
    ) -> Result<EditSubmission, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let name = self.name.trim();
        if name.is_empty() {
            errors.push(Field::Name, "name is required");
        }

        let price = if with_price {
            match parse_price(&self.price) {
                Ok(price) => Some(price),
                Err(message) => {
                    errors.push(Field::Price, message);
                    None
                }
            }
        } else {
            None
        };

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(EditSubmission {
            product_id,
            name: name.to_string(),
            description: self.description.trim().to_string(),
            price,
            item_type: self.item_type,
            available: with_availability.then_some(self.available),
            image_ids: self.image_ids.clone(),
            location_ids: self.location_ids.clone(),
        })
    }
}

fn parse_price(text: &str) -> Result<f64, &'static str> {
    let text = text.trim();
    if text.is_empty() {
        return Err("price is required");
    }
    // plain decimal only: digits with at most one '.'
    if !text.chars().all(|c| c.is_ascii_digit() || c == '.')
        || text.chars().filter(|c| *c == '.').count() > 1
        || !text.chars().any(|c| c.is_ascii_digit())
    {
        return Err("price must be a non-negative decimal");
    }
    text.parse::<f64>()
        .map_err(|_| "price must be a non-negative decimal")
}

/// Formats an api price for the price field.
pub fn format_price(price: Option<f64>) -> String {
    price.map(|p| format!("{p:.2}")).unwrap_or_default()
}
