pub mod repository;
pub mod validate;

pub use repository::AdvertisementRepository;
pub use validate::{validate_create, validate_json, FieldMap, InputSchema};
