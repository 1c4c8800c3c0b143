// ABOUTME: Login, index, history, and presets pages of the admin panel
// ABOUTME: Bodies are wrapped by the shared layout except the standalone login page

use super::{attr, escape, fill, layout, render_flashes, PageContext, LOGIN_TEMPLATE};
use crate::config::AdminConfig;
use crate::database::HistoryEntry;
use crate::flash::Flashes;
use crate::presets::Preset;
use std::fmt::Write;

/// Standalone login form
#[must_use]
pub fn login_page(config: &AdminConfig, flashes: &Flashes) -> String {
    let action = attr(&config.login_path());
    let panel_name = escape(&config.name);
    let flashes = render_flashes(flashes);
    fill(
        LOGIN_TEMPLATE,
        &[
            ("ACTION", action.as_str()),
            ("PANEL_NAME", panel_name.as_str()),
            ("FLASHES", flashes.as_str()),
        ],
    )
}

/// Registered models with their row counts
#[must_use]
pub fn index_page(page: PageContext<'_>, flashes: &Flashes, counts: &[(String, i64)]) -> String {
    let mut body = String::from("<table><thead><tr><th>Model</th><th>Rows</th></tr></thead><tbody>");
    for (model_id, count) in counts {
        let _ = write!(
            body,
            r#"<tr><td><a href="{}">{}</a></td><td>{count}</td></tr>"#,
            attr(&page.config.path(model_id)),
            escape(model_id)
        );
    }
    body.push_str("</tbody></table>");
    layout("Models", page, flashes, &body)
}

/// Change history, newest first
#[must_use]
pub fn history_page(
    page: PageContext<'_>,
    flashes: &Flashes,
    entries: &[HistoryEntry],
    model_filter: Option<&str>,
) -> String {
    let mut options = String::from(r#"<option value="">All models</option>"#);
    for model_id in page.registry.ids() {
        let _ = write!(
            options,
            r#"<option value="{}"{}>{}</option>"#,
            attr(model_id),
            if model_filter == Some(model_id) { " selected" } else { "" },
            escape(model_id)
        );
    }

    let mut body = format!(
        r#"<form class="toolbar" method="get" action="{}"><select name="model">{options}</select> <button type="submit">Filter</button></form>"#,
        attr(&page.config.path("history"))
    );
    body.push_str("<table><thead><tr><th>When</th><th>User</th><th>Route</th><th>Model</th><th>Object</th><th>Change</th></tr></thead><tbody>");
    for entry in entries {
        let _ = write!(
            body,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(&entry.display_time()),
            escape(&entry.user),
            escape(&entry.route),
            escape(entry.model_id.as_deref().unwrap_or("")),
            escape(entry.object_id.as_deref().unwrap_or("")),
            escape(&entry.log_message),
        );
    }
    body.push_str("</tbody></table>");
    if entries.is_empty() {
        body.push_str("<p>No changes recorded yet.</p>");
    }
    layout("History", page, flashes, &body)
}

/// Available presets plus the form that clears the database
#[must_use]
pub fn presets_page(page: PageContext<'_>, flashes: &Flashes, presets: &[Preset]) -> String {
    let config = page.config;
    let mut body = String::new();

    if presets.is_empty() {
        let _ = write!(
            body,
            "<p>No presets found in {}.</p>",
            escape(&config.presets_folder.display().to_string())
        );
    } else {
        body.push_str("<table><thead><tr><th>Preset</th><th>Description</th><th>Files</th><th></th></tr></thead><tbody>");
        for preset in presets {
            let files = preset
                .files
                .iter()
                .map(|(model_id, path)| format!("{model_id}: {}", path.display()))
                .collect::<Vec<_>>()
                .join(", ");
            let _ = write!(
                body,
                r#"<tr><td>{}</td><td>{}</td><td>{}</td><td><form class="inline" method="post" action="{}"><input type="hidden" name="preset_id" value="{}"><label><input type="checkbox" name="with_db" value="true"> clear database first</label> <button type="submit">Load</button></form></td></tr>"#,
                escape(&preset.name),
                escape(&preset.description),
                escape(&files),
                attr(&config.path("presets")),
                attr(&preset.id),
            );
        }
        body.push_str("</tbody></table>");
    }

    let _ = write!(
        body,
        r#"<h2>Database</h2><form method="post" action="{}" onsubmit="return confirm('Delete all rows of all models?');"><button type="submit">Delete all data</button></form>"#,
        attr(&config.path("init_db"))
    );
    layout("Presets", page, flashes, &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ModelRegistry;

    #[test]
    fn test_login_page_posts_to_login_path() {
        let config = AdminConfig {
            route: "/panel".into(),
            ..AdminConfig::default()
        };
        let mut flashes = Flashes::new();
        flashes.error("Wrong username or password");
        let html = login_page(&config, &flashes);
        assert!(html.contains(r#"action="/panel/login""#));
        assert!(html.contains("Wrong username or password"));
    }

    #[test]
    fn test_index_lists_counts() {
        let config = AdminConfig::default();
        let registry = ModelRegistry::default();
        let page = PageContext {
            config: &config,
            registry: &registry,
            user: "admin",
        };
        let html = index_page(page, &Flashes::new(), &[("users".into(), 3)]);
        assert!(html.contains(r#"<a href="/admin/users">users</a></td><td>3</td>"#));
    }
}
