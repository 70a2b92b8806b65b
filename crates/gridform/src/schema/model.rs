//! The column schema model: ordered columns, validation rules, lineage.

use indexmap::IndexMap;

use crate::matching::normalize_name;
use crate::rules::ValidationRule;

use super::roles::{RoleBindings, RoleTable};

/// Schema derived from a sample template.
///
/// Constructed once per parse/validate request from the current template
/// bytes and immutable afterwards; never persisted, since the template may
/// change between calls.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaModel {
    /// Column names in template order. Order is semantically significant:
    /// the role table indexes into it.
    columns: Vec<String>,
    /// Normalized sub-header name -> normalized merged parent label.
    /// Informational lineage; not consulted during matching.
    merged_lineage: IndexMap<String, String>,
    /// Validation rules keyed by normalized column name.
    rules: IndexMap<String, ValidationRule>,
    roles: RoleTable,
}

impl SchemaModel {
    /// Empty schema with the default role table.
    pub fn new() -> Self {
        Self::with_roles(RoleTable::default())
    }

    /// Empty schema with an explicit role table.
    pub fn with_roles(roles: RoleTable) -> Self {
        Self {
            columns: Vec::new(),
            merged_lineage: IndexMap::new(),
            rules: IndexMap::new(),
            roles,
        }
    }

    /// Append a column, preserving template order.
    pub fn add_column(&mut self, name: &str) {
        self.columns.push(name.to_string());
    }

    /// Record that `child` sits under the merged parent header `parent`.
    pub fn add_merged_header(&mut self, parent: &str, child: &str) {
        self.merged_lineage
            .insert(normalize_name(child), normalize_name(parent));
    }

    /// Bind a validation rule to a column name (normalized internally).
    pub fn add_rule(&mut self, column_name: &str, rule: ValidationRule) {
        self.rules.insert(normalize_name(column_name), rule);
    }

    /// Column names in template order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// True when no columns were derived: either a legitimately empty
    /// template or a failed read; see `TemplateOutcome::read_succeeded`.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// All rules, keyed by normalized column name.
    pub fn rules(&self) -> &IndexMap<String, ValidationRule> {
        &self.rules
    }

    /// Rule bound to the given column name, if any.
    pub fn rule_for(&self, column_name: &str) -> Option<&ValidationRule> {
        self.rules.get(&normalize_name(column_name))
    }

    /// Merged parent label for a sub-header column, if any (normalized).
    pub fn merged_parent(&self, child: &str) -> Option<&str> {
        self.merged_lineage.get(&normalize_name(child)).map(String::as_str)
    }

    pub fn role_table(&self) -> RoleTable {
        self.roles
    }

    /// Resolve the special-field roles against the derived columns.
    ///
    /// `None` when the template is too narrow to carry the special fields.
    pub fn role_bindings(&self) -> Option<RoleBindings> {
        self.roles.resolve(&self.columns)
    }

    /// Recover a column's original (template) spelling from its normalized
    /// form. Falls back to the normalized form when no column matches.
    pub fn original_name<'a>(&'a self, normalized: &'a str) -> &'a str {
        self.columns
            .iter()
            .find(|name| normalize_name(name) == normalized)
            .map(String::as_str)
            .unwrap_or(normalized)
    }
}

impl Default for SchemaModel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{RuleKind, ValidationRule};

    #[test]
    fn test_columns_preserve_insertion_order() {
        let mut schema = SchemaModel::new();
        schema.add_column("No");
        schema.add_column("Dataset Name");
        schema.add_column("Owner");

        assert_eq!(schema.columns(), ["No", "Dataset Name", "Owner"]);
        assert_eq!(schema.column_count(), 3);
        assert!(!schema.is_empty());
    }

    #[test]
    fn test_rules_keyed_by_normalized_name() {
        let mut schema = SchemaModel::new();
        schema.add_column("Year");
        schema.add_rule("  YEAR ", ValidationRule::new(RuleKind::Numeric).with_range(2024, 2024));

        assert!(schema.rule_for("year").is_some());
        assert!(schema.rule_for("Year").is_some());
        assert!(schema.rule_for("month").is_none());
    }

    #[test]
    fn test_merged_lineage_is_normalized() {
        let mut schema = SchemaModel::new();
        schema.add_merged_header("Priority  Ratings", "User Demand");
        assert_eq!(schema.merged_parent("user   demand"), Some("priority ratings"));
    }

    #[test]
    fn test_role_bindings_use_template_spelling() {
        let mut schema = SchemaModel::new();
        for name in ["No", "Dataset Name", "Owner", "Year", "Attribute", "Attribute Description"] {
            schema.add_column(name);
        }

        let bindings = schema.role_bindings().unwrap();
        assert_eq!(bindings.group_key_field, "Dataset Name");
        assert_eq!(bindings.attribute_description_field, "Attribute Description");
    }

    #[test]
    fn test_original_name_round_trip() {
        let mut schema = SchemaModel::new();
        schema.add_column("Dataset   Classification");
        assert_eq!(schema.original_name("dataset classification"), "Dataset   Classification");
        assert_eq!(schema.original_name("unknown"), "unknown");
    }
}
