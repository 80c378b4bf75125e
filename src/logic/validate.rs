use serde_json::{Map, Value};

use crate::error::{ApiError, ApiResult, FieldError};
use crate::model::{AdvertisementField, FieldValue, NewAdvertisement};

const MAX_TITLE_CHARS: usize = 100;
const MAX_OWNER_CHARS: usize = 100;
const MAX_DESCRIPTION_CHARS: usize = 1000;

/// Named input contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSchema {
    /// `title` and `owner` required; unknown keys ignored.
    Create,
    /// Every field optional; unknown keys rejected.
    Update,
}

impl InputSchema {
    fn is_required(&self, field: AdvertisementField) -> bool {
        match self {
            InputSchema::Create => matches!(
                field,
                AdvertisementField::Title | AdvertisementField::Owner
            ),
            InputSchema::Update => false,
        }
    }

    fn forbids_unknown(&self) -> bool {
        matches!(self, InputSchema::Update)
    }
}

/// Normalized values for exactly the fields present in the input, in
/// declaration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldMap {
    values: Vec<FieldValue>,
}

impl FieldMap {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn get(&self, field: AdvertisementField) -> Option<&FieldValue> {
        self.values.iter().find(|value| value.field() == field)
    }

    pub fn fields(&self) -> impl Iterator<Item = AdvertisementField> + '_ {
        self.values.iter().map(FieldValue::field)
    }

    fn into_new_advertisement(self) -> Option<NewAdvertisement> {
        let mut title = None;
        let mut description = None;
        let mut owner = None;
        for value in self.values {
            match value {
                FieldValue::Title(v) => title = Some(v),
                FieldValue::Description(v) => description = v,
                FieldValue::Owner(v) => owner = Some(v),
            }
        }

        Some(NewAdvertisement {
            title: title?,
            description,
            owner: owner?,
        })
    }
}

impl IntoIterator for FieldMap {
    type Item = FieldValue;
    type IntoIter = std::vec::IntoIter<FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

/// Check a body against `InputSchema::Create` and build the insert model.
pub fn validate_create(raw: &Value) -> ApiResult<NewAdvertisement> {
    validate_json(raw, InputSchema::Create)?
        .into_new_advertisement()
        .ok_or_else(|| {
            ApiError::Internal(anyhow::anyhow!(
                "create schema accepted a body without title or owner"
            ))
        })
}

/// Check a decoded request body against `schema`.
///
/// Every problem is collected before failing, so the client sees all field
/// errors at once.
pub fn validate_json(raw: &Value, schema: InputSchema) -> ApiResult<FieldMap> {
    let Some(object) = raw.as_object() else {
        return Err(ApiError::InvalidInput(vec![FieldError::new(
            &[],
            "model_type",
            "input should be a JSON object",
        )]));
    };

    let mut values = Vec::new();
    let mut errors = Vec::new();

    for field in AdvertisementField::ALL {
        match object.get(field.name()) {
            Some(value) => match normalize(field, value) {
                Ok(value) => values.push(value),
                Err(err) => errors.push(err),
            },
            None if schema.is_required(field) => errors.push(missing(field)),
            None => {}
        }
    }

    if schema.forbids_unknown() {
        errors.extend(unknown_keys(object));
    }

    if errors.is_empty() {
        Ok(FieldMap { values })
    } else {
        Err(ApiError::InvalidInput(errors))
    }
}

fn unknown_keys(object: &Map<String, Value>) -> Vec<FieldError> {
    object
        .keys()
        .filter(|key| AdvertisementField::from_name(key).is_none())
        .map(|key| FieldError::new(&[key.as_str()], "extra_forbidden", "extra fields not permitted"))
        .collect()
}

fn normalize(field: AdvertisementField, value: &Value) -> Result<FieldValue, FieldError> {
    match field {
        AdvertisementField::Title => {
            required_text(field, value, MAX_TITLE_CHARS).map(FieldValue::Title)
        }
        AdvertisementField::Owner => {
            required_text(field, value, MAX_OWNER_CHARS).map(FieldValue::Owner)
        }
        AdvertisementField::Description => match value {
            Value::Null => Ok(FieldValue::Description(None)),
            Value::String(text) => {
                check_length(field, text, MAX_DESCRIPTION_CHARS)?;
                Ok(FieldValue::Description(Some(text.clone())))
            }
            _ => Err(not_a_string(field)),
        },
    }
}

fn required_text(
    field: AdvertisementField,
    value: &Value,
    max_chars: usize,
) -> Result<String, FieldError> {
    // Stored exactly as sent; only the emptiness check ignores whitespace.
    let text = value.as_str().ok_or_else(|| not_a_string(field))?;
    if text.trim().is_empty() {
        return Err(FieldError::new(
            &[field.name()],
            "string_too_short",
            "value must not be empty",
        ));
    }
    check_length(field, text, max_chars)?;
    Ok(text.to_string())
}

fn check_length(field: AdvertisementField, text: &str, max_chars: usize) -> Result<(), FieldError> {
    if text.chars().count() > max_chars {
        return Err(FieldError::new(
            &[field.name()],
            "string_too_long",
            format!("value must have at most {max_chars} characters"),
        ));
    }
    Ok(())
}

fn not_a_string(field: AdvertisementField) -> FieldError {
    FieldError::new(&[field.name()], "string_type", "input should be a valid string")
}

fn missing(field: AdvertisementField) -> FieldError {
    FieldError::new(&[field.name()], "missing", "field required")
}
