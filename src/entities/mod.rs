//! Data model - measurement log, layout, and reduced characteristic tables

pub mod characteristic;
pub mod layout;
pub mod measurement;
pub mod value;

pub use characteristic::{CharacteristicRow, CharacteristicTable};
pub use layout::{LayoutRecord, LayoutTable};
pub use measurement::{MeasurementRecord, MeasurementTable};
pub use value::Value;
