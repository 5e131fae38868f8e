pub mod focus;
pub mod registry;
