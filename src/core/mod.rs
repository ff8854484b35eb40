pub mod container;
pub mod error;
pub mod metadata;

pub use container::SignalDataContainer;
pub use error::{SignalError, SignalResult};
pub use metadata::{validate, FieldLimit, MetadataValue, RevolvingManner, SignalMetadata};
