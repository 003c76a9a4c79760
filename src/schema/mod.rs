//! Schema reconciliation: decide which live database columns receive which book field.
//!
//! A database schema arrives as an untyped JSON object; every column is
//! ingested as a [`ColumnDescriptor`] with a closed [`ColumnKind`]. The
//! [`reconcile`] function then binds the three [`Role`]s:
//!
//! - title: the (single) title-kind column, whatever its name
//! - author: the column named [`AUTHOR_COLUMN`], if it is rich text
//! - link: the column named [`LINK_COLUMN`], if it is a URL column
//!
//! Missing roles and wrong-typed columns are reported, never raised. A role
//! left unbound is simply omitted when a record is written.

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;

use crate::database::CollectionDescriptor;

/// Fixed column name for the author role.
pub const AUTHOR_COLUMN: &str = "작가";

/// Fixed column name for the link role.
pub const LINK_COLUMN: &str = "링크";

/// Title column assumed before any schema has been fetched.
pub const DEFAULT_TITLE_COLUMN: &str = "Name";

/// Column name to column descriptor.
pub type Schema = BTreeMap<String, ColumnDescriptor>;

/// Column types known to the workspace API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Title,
    RichText,
    Url,
    Number,
    Select,
    MultiSelect,
    Status,
    Date,
    People,
    Files,
    Checkbox,
    Email,
    PhoneNumber,
    Formula,
    Relation,
    Rollup,
    CreatedTime,
    CreatedBy,
    LastEditedTime,
    LastEditedBy,
    UniqueId,
    /// Any tag this build does not recognise.
    Unknown,
}

impl ColumnKind {
    /// Maps the API's `type` tag. Unrecognised tags become [`ColumnKind::Unknown`].
    #[must_use]
    pub fn from_api(tag: &str) -> Self {
        match tag {
            "title" => Self::Title,
            "rich_text" => Self::RichText,
            "url" => Self::Url,
            "number" => Self::Number,
            "select" => Self::Select,
            "multi_select" => Self::MultiSelect,
            "status" => Self::Status,
            "date" => Self::Date,
            "people" => Self::People,
            "files" => Self::Files,
            "checkbox" => Self::Checkbox,
            "email" => Self::Email,
            "phone_number" => Self::PhoneNumber,
            "formula" => Self::Formula,
            "relation" => Self::Relation,
            "rollup" => Self::Rollup,
            "created_time" => Self::CreatedTime,
            "created_by" => Self::CreatedBy,
            "last_edited_time" => Self::LastEditedTime,
            "last_edited_by" => Self::LastEditedBy,
            "unique_id" => Self::UniqueId,
            _ => Self::Unknown,
        }
    }

    /// The API's `type` tag (`"unknown"` for [`ColumnKind::Unknown`]).
    #[must_use]
    pub fn as_api(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::RichText => "rich_text",
            Self::Url => "url",
            Self::Number => "number",
            Self::Select => "select",
            Self::MultiSelect => "multi_select",
            Self::Status => "status",
            Self::Date => "date",
            Self::People => "people",
            Self::Files => "files",
            Self::Checkbox => "checkbox",
            Self::Email => "email",
            Self::PhoneNumber => "phone_number",
            Self::Formula => "formula",
            Self::Relation => "relation",
            Self::Rollup => "rollup",
            Self::CreatedTime => "created_time",
            Self::CreatedBy => "created_by",
            Self::LastEditedTime => "last_edited_time",
            Self::LastEditedBy => "last_edited_by",
            Self::UniqueId => "unique_id",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_api())
    }
}

/// One column of a database schema.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawColumn")]
pub struct ColumnDescriptor {
    /// Opaque column id, when the API supplied one.
    pub id: Option<String>,
    pub kind: ColumnKind,
}

impl ColumnDescriptor {
    /// A column of `kind` without an id.
    #[must_use]
    pub fn of_kind(kind: ColumnKind) -> Self {
        Self { id: None, kind }
    }
}

#[derive(Deserialize)]
struct RawColumn {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

impl From<RawColumn> for ColumnDescriptor {
    fn from(raw: RawColumn) -> Self {
        Self {
            id: raw.id,
            kind: raw
                .kind
                .as_deref()
                .map_or(ColumnKind::Unknown, ColumnKind::from_api),
        }
    }
}

/// Semantic field a collection must accept for archiving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    Title,
    Author,
    Link,
}

impl Role {
    /// Lowercase label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Author => "author",
            Self::Link => "link",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role to column binding. An empty entry means "omit this role on write".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyMap {
    pub title_column: String,
    pub author_column: String,
    pub link_column: String,
}

impl PropertyMap {
    /// Binding assumed before the active collection's schema is known.
    #[must_use]
    pub fn default_columns() -> Self {
        Self {
            title_column: DEFAULT_TITLE_COLUMN.to_string(),
            author_column: AUTHOR_COLUMN.to_string(),
            link_column: LINK_COLUMN.to_string(),
        }
    }

    /// Column bound to `role`, or `None` when unbound.
    #[must_use]
    pub fn column(&self, role: Role) -> Option<&str> {
        let column = match role {
            Role::Title => &self.title_column,
            Role::Author => &self.author_column,
            Role::Link => &self.link_column,
        };
        (!column.is_empty()).then_some(column.as_str())
    }
}

/// Result of reconciling a schema against the three roles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub map: PropertyMap,
    /// Roles with no column of that name at all.
    pub missing: BTreeSet<Role>,
    /// One diagnostic per column that exists with the wrong type.
    pub type_errors: Vec<String>,
}

impl Reconciliation {
    /// True when every role is bound.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.type_errors.is_empty()
    }
}

/// Binds roles to columns of `schema`. Total and deterministic.
#[must_use]
pub fn reconcile(schema: &Schema) -> Reconciliation {
    let mut reconciliation = Reconciliation::default();

    match schema
        .iter()
        .find(|(_, column)| column.kind == ColumnKind::Title)
    {
        Some((name, _)) => reconciliation.map.title_column.clone_from(name),
        None => {
            reconciliation.missing.insert(Role::Title);
        }
    }

    reconciliation.map.author_column = bind_named_role(
        schema,
        AUTHOR_COLUMN,
        ColumnKind::RichText,
        Role::Author,
        &mut reconciliation,
    );
    reconciliation.map.link_column = bind_named_role(
        schema,
        LINK_COLUMN,
        ColumnKind::Url,
        Role::Link,
        &mut reconciliation,
    );

    reconciliation
}

fn bind_named_role(
    schema: &Schema,
    name: &str,
    required: ColumnKind,
    role: Role,
    reconciliation: &mut Reconciliation,
) -> String {
    match schema.get(name) {
        Some(column) if column.kind == required => name.to_string(),
        Some(column) => {
            reconciliation.type_errors.push(format!(
                "column '{name}' must be of type {required} (found {})",
                column.kind
            ));
            String::new()
        }
        None => {
            reconciliation.missing.insert(role);
            String::new()
        }
    }
}

/// Reconciles the active collection, recomputed from the current inputs.
///
/// When `active_id` is not among `collections` (nothing discovered yet), the
/// default binding is returned without diagnostics.
#[must_use]
pub fn resolve_for_collection(
    collections: &[CollectionDescriptor],
    active_id: &str,
) -> Reconciliation {
    let active_id = active_id.trim();
    collections
        .iter()
        .find(|collection| collection.id == active_id)
        .map_or_else(
            || Reconciliation {
                map: PropertyMap::default_columns(),
                ..Reconciliation::default()
            },
            |collection| reconcile(&collection.schema),
        )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn schema(columns: &[(&str, ColumnKind)]) -> Schema {
        columns
            .iter()
            .map(|(name, kind)| ((*name).to_string(), ColumnDescriptor::of_kind(*kind)))
            .collect()
    }

    fn collection(id: &str, columns: &[(&str, ColumnKind)]) -> CollectionDescriptor {
        CollectionDescriptor {
            id: id.to_string(),
            display_title: id.to_string(),
            schema: schema(columns),
        }
    }

    #[test]
    fn test_reconcile_complete_schema() {
        let result = reconcile(&schema(&[
            ("Name", ColumnKind::Title),
            ("작가", ColumnKind::RichText),
            ("링크", ColumnKind::Url),
        ]));
        assert_eq!(
            result.map,
            PropertyMap {
                title_column: "Name".to_string(),
                author_column: "작가".to_string(),
                link_column: "링크".to_string(),
            }
        );
        assert!(result.missing.is_empty());
        assert!(result.type_errors.is_empty());
        assert!(result.is_complete());
    }

    #[test]
    fn test_reconcile_title_column_found_under_any_name() {
        let result = reconcile(&schema(&[
            ("도서명", ColumnKind::Title),
            ("Tags", ColumnKind::MultiSelect),
        ]));
        assert_eq!(result.map.title_column, "도서명");
        assert!(!result.missing.contains(&Role::Title));
    }

    #[test]
    fn test_reconcile_without_title_column() {
        let result = reconcile(&schema(&[
            ("작가", ColumnKind::RichText),
            ("링크", ColumnKind::Url),
        ]));
        assert!(result.missing.contains(&Role::Title));
        assert_eq!(result.map.title_column, "");
        assert_eq!(result.map.column(Role::Title), None);
    }

    #[test]
    fn test_reconcile_author_with_wrong_type() {
        let result = reconcile(&schema(&[
            ("Name", ColumnKind::Title),
            ("작가", ColumnKind::Number),
            ("링크", ColumnKind::Url),
        ]));
        assert_eq!(result.map.author_column, "");
        assert_eq!(result.type_errors.len(), 1);
        assert!(result.type_errors[0].contains("작가"));
        assert!(result.type_errors[0].contains("rich_text"));
        assert!(result.type_errors[0].contains("number"));
        assert!(!result.missing.contains(&Role::Author));
    }

    #[test]
    fn test_reconcile_empty_schema_reports_every_role_missing() {
        let result = reconcile(&Schema::new());
        assert_eq!(
            result.missing,
            BTreeSet::from([Role::Title, Role::Author, Role::Link])
        );
        assert_eq!(result.map, PropertyMap::default());
    }

    #[test]
    fn test_reconcile_is_deterministic() {
        let input = schema(&[
            ("Name", ColumnKind::Title),
            ("링크", ColumnKind::RichText),
        ]);
        assert_eq!(reconcile(&input), reconcile(&input));
    }

    #[test]
    fn test_resolve_falls_back_to_default_map_before_discovery() {
        let result = resolve_for_collection(&[], "db-unknown");
        assert_eq!(result.map, PropertyMap::default_columns());
        assert!(result.is_complete());
    }

    #[test]
    fn test_resolve_uses_active_collection_schema_only() {
        let collections = [
            collection(
                "db-a",
                &[
                    ("Name", ColumnKind::Title),
                    ("작가", ColumnKind::RichText),
                    ("링크", ColumnKind::Url),
                ],
            ),
            collection("db-b", &[("제목", ColumnKind::Title)]),
        ];

        let a = resolve_for_collection(&collections, "db-a");
        assert!(a.is_complete());

        let b = resolve_for_collection(&collections, "db-b");
        assert_eq!(b.map.title_column, "제목");
        assert_eq!(b.map.author_column, "");
        assert_eq!(b.missing, BTreeSet::from([Role::Author, Role::Link]));

        let padded = resolve_for_collection(&collections, "  db-b\n");
        assert_eq!(padded.map.title_column, "제목");
    }

    #[test]
    fn test_column_descriptor_ingests_unknown_and_missing_types() {
        let parsed: Schema = serde_json::from_value(serde_json::json!({
            "Name": {"id": "title", "type": "title", "title": {}},
            "Mood": {"id": "a%3Fb", "type": "button"},
            "Bare": {}
        }))
        .unwrap();
        assert_eq!(parsed["Name"].kind, ColumnKind::Title);
        assert_eq!(parsed["Name"].id.as_deref(), Some("title"));
        assert_eq!(parsed["Mood"].kind, ColumnKind::Unknown);
        assert_eq!(parsed["Bare"].kind, ColumnKind::Unknown);
    }

    #[test]
    fn test_column_kind_tags_round_trip_for_known_kinds() {
        for tag in ["title", "rich_text", "url", "number", "multi_select", "unique_id"] {
            assert_eq!(ColumnKind::from_api(tag).as_api(), tag);
        }
        assert_eq!(ColumnKind::from_api("verification"), ColumnKind::Unknown);
    }
}
