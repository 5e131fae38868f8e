pub mod definition;
pub mod fields;

pub use definition::FormDefinition;
pub use fields::{FieldClass, FormField};
