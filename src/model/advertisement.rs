use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type AdvertisementId = i64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advertisement {
    pub id: AdvertisementId,
    pub title: String,
    pub description: Option<String>,
    pub owner: String,
    pub created_at: DateTime<Utc>,
}

impl Advertisement {
    /// Apply a single validated field onto the entity.
    ///
    /// `id` and `created_at` have no setter: they are assigned by the store.
    pub fn apply(&mut self, value: FieldValue) {
        match value {
            FieldValue::Title(title) => self.title = title,
            FieldValue::Description(description) => self.description = description,
            FieldValue::Owner(owner) => self.owner = owner,
        }
    }
}

/// Input model for inserting a new advertisement; the store fills in the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAdvertisement {
    pub title: String,
    pub description: Option<String>,
    pub owner: String,
}

/// Every field a client may write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AdvertisementField {
    Title,
    Description,
    Owner,
}

impl AdvertisementField {
    /// Declaration order, which is also the order errors are reported in.
    pub const ALL: [AdvertisementField; 3] = [
        AdvertisementField::Title,
        AdvertisementField::Description,
        AdvertisementField::Owner,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AdvertisementField::Title => "title",
            AdvertisementField::Description => "description",
            AdvertisementField::Owner => "owner",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.name() == name)
    }
}

/// A normalized value for one writable field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Title(String),
    Description(Option<String>),
    Owner(String),
}

impl FieldValue {
    pub fn field(&self) -> AdvertisementField {
        match self {
            FieldValue::Title(_) => AdvertisementField::Title,
            FieldValue::Description(_) => AdvertisementField::Description,
            FieldValue::Owner(_) => AdvertisementField::Owner,
        }
    }
}
