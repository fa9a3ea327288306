//! Post form validation.
//!
//! Rules are evaluated in full on every call; there is no incremental state.
//! Validation never touches the network and only gates whether a mutation is
//! attempted.

use std::collections::BTreeMap;
use std::fmt;

use postdeck_api_types::PostDraft;

use super::error::ResourceError;

pub const TITLE_MIN_LENGTH: usize = 3;
pub const TITLE_MAX_LENGTH: usize = 100;
pub const BODY_MIN_LENGTH: usize = 10;
pub const BODY_MAX_LENGTH: usize = 1000;

const REQUIRED: &str = "This field is required";
const AUTHOR_REQUIRED: &str = "Please select an author";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Title,
    Body,
    Author,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Body => "body",
            Self::Author => "author",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field name → message for every failing field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<Field, String>);

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(field, msg)| (*field, msg.as_str()))
    }

    fn insert(&mut self, field: Field, message: String) {
        self.0.insert(field, message);
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

pub fn min_length_message(min: usize) -> String {
    format!("Must be at least {min} characters")
}

pub fn max_length_message(max: usize) -> String {
    format!("Must be no more than {max} characters")
}

/// Raw create/edit form input, before trimming.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostForm {
    pub title: String,
    pub body: String,
    pub author: Option<u64>,
}

impl PostForm {
    pub fn new(title: impl Into<String>, body: impl Into<String>, author: Option<u64>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            author,
        }
    }

    /// Validate and produce the trimmed draft sent to the server.
    pub fn into_draft(self) -> Result<PostDraft, ResourceError> {
        let errors = validate(&self);
        if !errors.is_empty() {
            return Err(ResourceError::validation(errors));
        }
        let user_id = self
            .author
            .ok_or_else(|| ResourceError::unknown("author missing after validation"))?;
        Ok(PostDraft {
            title: self.title.trim().to_string(),
            body: self.body.trim().to_string(),
            user_id,
        })
    }
}

pub fn validate(form: &PostForm) -> FieldErrors {
    let mut errors = FieldErrors::default();

    if let Some(message) = check_length(&form.title, TITLE_MIN_LENGTH, TITLE_MAX_LENGTH) {
        errors.insert(Field::Title, message);
    }
    if let Some(message) = check_length(&form.body, BODY_MIN_LENGTH, BODY_MAX_LENGTH) {
        errors.insert(Field::Body, message);
    }
    if form.author.is_none() {
        errors.insert(Field::Author, AUTHOR_REQUIRED.to_string());
    }

    errors
}

fn check_length(value: &str, min: usize, max: usize) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Some(REQUIRED.to_string());
    }
    let len = trimmed.chars().count();
    if len < min {
        Some(min_length_message(min))
    } else if len > max {
        Some(max_length_message(max))
    } else {
        None
    }
}
