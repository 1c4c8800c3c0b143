// ABOUTME: Table view and add/edit form for a single registered model
// ABOUTME: Builds inputs from column metadata and row actions from the model's identity

use super::{attr, escape};
use crate::config::AdminConfig;
use crate::database::SearchFilter;
use crate::utils::{get_obj_id_from_row, rowid_alias};
use crud_admin_core::models::{ColumnData, ColumnType, FieldValue, ObjectId, Row, TableDetails};
use std::fmt::Write;

const HIDDEN_HASH: &str = "********";
/// Pages linked on each side of the current one
const PAGE_WINDOW: u32 = 2;

/// One page of a model's rows
#[derive(Debug, Clone, Copy)]
pub struct TablePage<'a> {
    /// Model shown
    pub details: &'a TableDetails,
    /// Rows of the current page
    pub rows: &'a [Row],
    /// Rows matching the filter across all pages
    pub total: i64,
    /// Current page, starting at 1
    pub page: u32,
    /// Rows per page
    pub page_size: u32,
    /// Active search
    pub search: Option<&'a SearchFilter>,
}

impl TablePage<'_> {
    /// Number of pages, at least 1
    #[must_use]
    pub fn page_count(&self) -> u32 {
        let total = u64::try_from(self.total).unwrap_or(0);
        let size = u64::from(self.page_size.max(1));
        u32::try_from(total.div_ceil(size)).unwrap_or(u32::MAX).max(1)
    }
}

/// Link to the edit form of a row
#[must_use]
pub fn edit_link(config: &AdminConfig, model_id: &str, object_id: &ObjectId) -> String {
    format!(
        "{}/edit?_id={}",
        config.path(model_id),
        urlencoding::encode(&object_id.to_string())
    )
}

/// Render the table view of a model
#[must_use]
pub fn model_table(config: &AdminConfig, table: &TablePage<'_>) -> String {
    let details = table.details;
    let base = config.path(&details.model_id);
    let mut html = String::new();

    let _ = write!(
        html,
        r#"<div class="toolbar"><a href="{add}">Add {model}</a>{search}<form class="inline" method="post" action="{delete_all}" onsubmit="return confirm('Delete all rows?');"><button type="submit">Delete all</button></form></div>"#,
        add = attr(&format!("{base}/add")),
        model = escape(&details.model_id),
        search = search_form(&base, details, table.search),
        delete_all = attr(&format!("{base}/delete_all")),
    );

    html.push_str("<table><thead><tr>");
    for name in &details.columns_names {
        let _ = write!(html, "<th>{}</th>", escape(name));
    }
    html.push_str("<th>Actions</th></tr></thead><tbody>");

    for row in table.rows {
        html.push_str("<tr>");
        for column in &details.columns_data {
            let value = row.get(&column.name).unwrap_or(&FieldValue::Null);
            let shown = if column.is_hashed() && !value.is_null() {
                HIDDEN_HASH.to_owned()
            } else {
                value.to_string()
            };
            let _ = write!(html, "<td>{}</td>", escape(&shown));
        }
        let object_id = get_obj_id_from_row(details, row);
        let _ = write!(
            html,
            r#"<td><a href="{}">Edit</a> <form class="inline" method="post" action="{}">{}<button type="submit">Delete</button></form></td></tr>"#,
            attr(&edit_link(config, &details.model_id, &object_id)),
            attr(&format!("{base}/delete")),
            identity_inputs(&object_id),
        );
    }
    html.push_str("</tbody></table>");

    let _ = write!(
        html,
        "<p>{} rows, page {} of {}</p>",
        table.total,
        table.page,
        table.page_count()
    );
    html.push_str(&pagination(&base, table));

    let _ = write!(
        html,
        r#"<h2>Upload CSV</h2><form method="post" action="{}" enctype="multipart/form-data"><input type="file" name="file" accept=".csv,text/csv" required> <button type="submit">Upload</button></form>"#,
        attr(&format!("{base}/upload")),
    );

    html
}

fn search_form(base: &str, details: &TableDetails, search: Option<&SearchFilter>) -> String {
    let mut options = String::new();
    for name in &details.columns_names {
        let selected = search.is_some_and(|s| &s.column == name);
        let _ = write!(
            options,
            r#"<option value="{}"{}>{}</option>"#,
            attr(name),
            if selected { " selected" } else { "" },
            escape(name)
        );
    }
    format!(
        r#"<form class="inline" method="get" action="{}"><select name="field">{options}</select> <input name="search" value="{}" placeholder="Search"> <button type="submit">Search</button></form>"#,
        attr(base),
        attr(search.map_or("", |s| s.text.as_str())),
    )
}

/// The row identity travels as JSON so NULL, empty text and `None` stay distinct
fn identity_inputs(object_id: &ObjectId) -> String {
    format!(
        r#"<input type="hidden" name="_id" value="{}">"#,
        attr(&object_id.to_string())
    )
}

fn pagination(base: &str, table: &TablePage<'_>) -> String {
    let pages = table.page_count();
    if pages <= 1 {
        return String::new();
    }
    let filter_query = table.search.map_or_else(String::new, |s| {
        format!(
            "&field={}&search={}",
            urlencoding::encode(&s.column),
            urlencoding::encode(&s.text)
        )
    });

    let current = table.page.clamp(1, pages);
    let first = current.saturating_sub(PAGE_WINDOW).max(1);
    let last = current.saturating_add(PAGE_WINDOW).min(pages);
    let mut shown: Vec<u32> = (first..=last).collect();
    shown.push(1);
    shown.push(pages);
    shown.sort_unstable();
    shown.dedup();

    let mut html = String::from(r#"<div class="pagination">"#);
    let mut previous = 0;
    for page in shown {
        if page > previous + 1 {
            html.push_str(r#"<span class="gap">&hellip;</span>"#);
        }
        previous = page;
        if page == current {
            let _ = write!(html, "<span>{page}</span>");
        } else {
            let _ = write!(
                html,
                r#"<a href="{}">{page}</a>"#,
                attr(&format!("{base}?page={page}{filter_query}"))
            );
        }
    }
    html.push_str("</div>");
    html
}

/// Whether the form adds a row or edits an existing one
#[derive(Debug, Clone, Copy)]
pub enum FormMode<'a> {
    /// New row
    Add,
    /// Existing row with this identity
    Edit(&'a ObjectId),
}

/// Render the add or edit form of a model
#[must_use]
pub fn model_form(
    config: &AdminConfig,
    details: &TableDetails,
    mode: FormMode<'_>,
    values: Option<&Row>,
) -> String {
    let base = config.path(&details.model_id);
    let action = match mode {
        FormMode::Add => format!("{base}/add"),
        FormMode::Edit(object_id) => edit_link(config, &details.model_id, object_id),
    };
    let editing = matches!(mode, FormMode::Edit(_));
    let assigned_by_db = rowid_alias(details);

    let mut html = format!(r#"<form method="post" action="{}">"#, attr(&action));
    for column in &details.columns_data {
        let required = details.required_columns.contains(&column.name)
            && Some(column.name.as_str()) != assigned_by_db;
        let value = values
            .and_then(|row| row.get(&column.name))
            .unwrap_or(&FieldValue::Null);

        let _ = write!(
            html,
            r#"<div class="field"><label for="{id}">{name}{mark}</label>{input}<div class="hint">{hint}</div></div>"#,
            id = attr(&column.name),
            name = escape(&column.name),
            mark = if required { r#" <span class="required">*</span>"# } else { "" },
            input = render_input(column, value, required, editing),
            hint = column_hint(config, column, editing),
        );
    }
    let _ = write!(
        html,
        r#"<button type="submit">{}</button> <a href="{}">Back to {}</a></form>"#,
        if editing { "Save" } else { "Add" },
        attr(&base),
        escape(&details.model_id)
    );
    html
}

fn render_input(column: &ColumnData, value: &FieldValue, required: bool, editing: bool) -> String {
    let name = attr(&column.name);
    let required_attr = if required && !(editing && column.is_hashed()) {
        " required"
    } else {
        ""
    };
    let value_text = attr(&input_value(value));

    match column.column_type {
        ColumnType::Hash => format!(
            r#"<input id="{name}" name="{name}" type="password" autocomplete="new-password"{required_attr}>"#
        ),
        ColumnType::Boolean => {
            let current = match value {
                FieldValue::Boolean(true) => "true",
                FieldValue::Boolean(false) => "false",
                _ => "",
            };
            let mut options = String::new();
            if column.nullable {
                options.push_str(r#"<option value="">None</option>"#);
            }
            for option in ["true", "false"] {
                let _ = write!(
                    options,
                    r#"<option value="{option}"{}>{option}</option>"#,
                    if option == current { " selected" } else { "" }
                );
            }
            format!(r#"<select id="{name}" name="{name}"{required_attr}>{options}</select>"#)
        }
        ColumnType::Json => format!(
            r#"<textarea id="{name}" name="{name}" rows="4"{required_attr}>{}</textarea>"#,
            escape(&input_value(value))
        ),
        other => {
            let (input_type, extra) = match other {
                ColumnType::Integer => ("number", r#" step="1""#.to_owned()),
                ColumnType::Float | ColumnType::Decimal => ("number", r#" step="any""#.to_owned()),
                ColumnType::Date => ("date", String::new()),
                ColumnType::DateTime => ("datetime-local", r#" step="any""#.to_owned()),
                ColumnType::Time => ("time", r#" step="any""#.to_owned()),
                _ => (
                    "text",
                    column
                        .len
                        .map_or_else(String::new, |len| format!(r#" maxlength="{len}""#)),
                ),
            };
            format!(
                r#"<input id="{name}" name="{name}" type="{input_type}" value="{value_text}"{extra}{required_attr}>"#
            )
        }
    }
}

fn column_hint(config: &AdminConfig, column: &ColumnData, editing: bool) -> String {
    let mut hint = escape(&column.db_type);
    if column.is_hashed() {
        hint.push_str(if editing {
            " (hashed, leave empty to keep the current value)"
        } else {
            " (hashed before saving)"
        });
    }
    for fk in &column.foreign_keys {
        let _ = write!(
            hint,
            r#" references <a href="{}">{}.{}</a>"#,
            attr(&config.path(&fk.target_table)),
            escape(&fk.target_table),
            escape(&fk.target_column)
        );
    }
    hint
}

/// Text placed in an input for a cell value
fn input_value(value: &FieldValue) -> String {
    match value {
        FieldValue::DateTime(dt) => dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::extract_column_data;
    use crate::schema::introspect::{RawColumn, RawTable};

    fn details() -> TableDetails {
        extract_column_data(
            "users",
            &RawTable {
                columns: vec![
                    RawColumn::new(0, "id", "INTEGER").primary_key(),
                    RawColumn::new(1, "email", "VARCHAR(64)").not_null(),
                    RawColumn::new(2, "password_hash", "TEXT"),
                    RawColumn::new(3, "active", "BOOLEAN"),
                ],
                ..RawTable::default()
            },
        )
    }

    fn row() -> Row {
        let mut row = Row::new();
        row.insert("id".into(), FieldValue::Integer(7));
        row.insert("email".into(), FieldValue::Text("<a@b.c>".into()));
        row.insert("password".into(), FieldValue::Text("$2b$secret".into()));
        row.insert("active".into(), FieldValue::Boolean(true));
        row
    }

    #[test]
    fn test_table_hides_hashes_and_escapes_cells() {
        let config = AdminConfig::default();
        let details = details();
        let rows = vec![row()];
        let html = model_table(
            &config,
            &TablePage {
                details: &details,
                rows: &rows,
                total: 1,
                page: 1,
                page_size: 50,
                search: None,
            },
        );
        assert!(html.contains("&lt;a@b.c&gt;"));
        assert!(!html.contains("$2b$secret"));
        assert!(html.contains(HIDDEN_HASH));
        assert!(html.contains(r#"<input type="hidden" name="_id" value="{&quot;id&quot;:7}">"#));
        assert!(html.contains("/admin/users/edit?_id=%7B%22id%22%3A7%7D"));
    }

    #[test]
    fn test_page_count_and_pagination_links() {
        let details = details();
        let search = SearchFilter::new("email", "a b").unwrap();
        let table = TablePage {
            details: &details,
            rows: &[],
            total: 101,
            page: 2,
            page_size: 50,
            search: Some(&search),
        };
        assert_eq!(table.page_count(), 3);
        let html = pagination("/admin/users", &table);
        assert!(html.contains("<span>2</span>"));
        assert!(html.contains("page=3&amp;field=email&amp;search=a%20b"));
        assert!(!html.contains("gap"));
    }

    #[test]
    fn test_pagination_links_a_window_around_current_page() {
        let details = details();
        let table = TablePage {
            details: &details,
            rows: &[],
            total: 50_000,
            page: 500,
            page_size: 50,
            search: None,
        };
        let html = pagination("/admin/users", &table);

        assert_eq!(html.matches("<a ").count(), 6);
        assert!(html.contains("<span>500</span>"));
        for page in [1, 498, 499, 501, 502, 1000] {
            assert!(html.contains(&format!(r#"page={page}""#)));
        }
        assert!(!html.contains(r#"page=497""#));
        assert_eq!(html.matches("&hellip;").count(), 2);
    }

    #[test]
    fn test_form_inputs_follow_column_types() {
        let config = AdminConfig::default();
        let details = details();
        let html = model_form(&config, &details, FormMode::Add, None);
        assert!(html.contains(r#"action="/admin/users/add""#));
        assert!(html.contains(r#"name="password" type="password""#));
        assert!(html.contains(r#"type="number" value="" step="1">"#));
        assert!(html.contains(r#"maxlength="64" required"#));

        let row = row();
        let id = get_obj_id_from_row(&details, &row);
        let html = model_form(&config, &details, FormMode::Edit(&id), Some(&row));
        assert!(html.contains(r#"<option value="true" selected>"#));
        assert!(!html.contains("$2b$secret"));
        assert!(html.contains("leave empty to keep"));
    }
}
