//! Column schema derived from a sample template.

mod model;
mod roles;

pub use model::SchemaModel;
pub use roles::{RoleBindings, RoleTable, SpecialRole};
