//! Create/edit form: field state, validation, and submission.
//!
//! # Design
//! [`validate`] is a pure function from raw field input to either a
//! payload or the complete set of field errors. Validation failures never
//! reach the network and never notify; they are shown next to the fields.
//! [`ItemForm::submit`] runs validation and then routes the payload to
//! create or update depending on whether an item is being edited.

use std::fmt;

use crate::error::ApiError;
use crate::service::ItemService;
use crate::transport::Transport;
use crate::types::{CreateItem, Item, ItemGroup, ItemId, UpdateItem};

pub const NAME_REQUIRED: &str = "Name is required";
pub const INVALID_GROUP: &str = "Please select a valid group.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Group,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Group => "group",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub message: &'static str,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field.as_str(), self.message)
    }
}

/// Every failed field, in form order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    /// Message for `field`, if it failed.
    pub fn get(&self, field: Field) -> Option<&'static str> {
        self.0.iter().find(|e| e.field == field).map(|e| e.message)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

/// Check raw form input. The returned payload carries the trimmed name.
pub fn validate(name: &str, group: &str) -> Result<CreateItem, FieldErrors> {
    let mut errors = Vec::new();

    let name = name.trim();
    if name.is_empty() {
        errors.push(FieldError {
            field: Field::Name,
            message: NAME_REQUIRED,
        });
    }

    let group = group.parse::<ItemGroup>();
    if group.is_err() {
        errors.push(FieldError {
            field: Field::Group,
            message: INVALID_GROUP,
        });
    }

    match group {
        Ok(group) if errors.is_empty() => Ok(CreateItem {
            name: name.to_string(),
            group,
        }),
        _ => Err(FieldErrors(errors)),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("{0}")]
    Invalid(#[from] FieldErrors),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Raw field values plus the item being edited, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemForm {
    pub name: String,
    pub group: String,
    editing: Option<ItemId>,
}

impl Default for ItemForm {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ItemForm {
    /// A blank create form, or one pre-filled from `target`.
    pub fn new(target: Option<&Item>) -> Self {
        let mut form = Self {
            name: String::new(),
            group: String::new(),
            editing: None,
        };
        form.reset(target);
        form
    }

    /// Discard edits and re-populate from `target`.
    pub fn reset(&mut self, target: Option<&Item>) {
        match target {
            Some(item) => {
                self.name = item.name.clone();
                self.group = item.group.as_str().to_string();
                self.editing = Some(item.id);
            }
            None => {
                self.name.clear();
                self.group = ItemGroup::default().as_str().to_string();
                self.editing = None;
            }
        }
    }

    pub fn editing(&self) -> Option<ItemId> {
        self.editing
    }

    pub fn title(&self) -> &'static str {
        if self.editing.is_some() {
            "Edit Item"
        } else {
            "Create New Item"
        }
    }

    pub fn submit_label(&self) -> &'static str {
        if self.editing.is_some() {
            "Save Changes"
        } else {
            "Create Item"
        }
    }

    pub fn validate(&self) -> Result<CreateItem, FieldErrors> {
        validate(&self.name, &self.group)
    }

    /// Validate, then create or update. On error the form is left as is so
    /// the user can correct it and try again.
    pub async fn submit<T: Transport>(&self, service: &ItemService<T>) -> Result<Item, SubmitError> {
        let payload = self.validate()?;
        let item = match self.editing {
            Some(id) => service.update_item(id, &UpdateItem::from(payload)).await?,
            None => service.create_item(&payload).await?,
        };
        Ok(item)
    }
}
