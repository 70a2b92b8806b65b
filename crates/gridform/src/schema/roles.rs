//! Special-field roles mapped onto structurally discovered columns.
//!
//! The template format carries an implicit positional contract: the second
//! column identifies the logical record (the group key), and the fifth and
//! sixth columns hold the attribute name and description that accumulate
//! into each record's child list. The positions live in an explicit table so
//! alternate templates can override them without code change.

use serde::{Deserialize, Serialize};

/// A semantic role a column can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialRole {
    /// Identifies which logical record a row belongs to.
    GroupKey,
    /// Child attribute name accumulated per row.
    AttributeName,
    /// Child attribute description accumulated per row.
    AttributeDescription,
}

/// Role-to-column-index assignments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleTable {
    pub group_key: usize,
    pub attribute_name: usize,
    pub attribute_description: usize,
}

impl Default for RoleTable {
    fn default() -> Self {
        Self {
            group_key: 1,
            attribute_name: 4,
            attribute_description: 5,
        }
    }
}

impl RoleTable {
    /// The highest column index any role points at.
    fn max_index(&self) -> usize {
        self.group_key.max(self.attribute_name).max(self.attribute_description)
    }

    /// Resolve the table against an ordered column list.
    ///
    /// All-or-nothing: if any role index falls outside the column list, no
    /// roles are identified. Templates too narrow to carry the special
    /// fields simply produce no grouped records downstream.
    pub fn resolve(&self, columns: &[String]) -> Option<RoleBindings> {
        if self.max_index() >= columns.len() {
            return None;
        }
        Some(RoleBindings {
            group_key_field: columns[self.group_key].clone(),
            attribute_name_field: columns[self.attribute_name].clone(),
            attribute_description_field: columns[self.attribute_description].clone(),
        })
    }
}

/// Resolved special-field column names, in template spelling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleBindings {
    pub group_key_field: String,
    pub attribute_name_field: String,
    pub attribute_description_field: String,
}

impl RoleBindings {
    /// Name bound to the given role.
    pub fn field(&self, role: SpecialRole) -> &str {
        match role {
            SpecialRole::GroupKey => &self.group_key_field,
            SpecialRole::AttributeName => &self.attribute_name_field,
            SpecialRole::AttributeDescription => &self.attribute_description_field,
        }
    }
}
