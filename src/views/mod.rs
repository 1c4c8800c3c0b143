// ABOUTME: Server-rendered HTML for the admin panel: layout, login, model tables and forms
// ABOUTME: Every dynamic value is escaped with html-escape before it reaches the page
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # HTML Views
//!
//! Page shells are compile-time embedded templates with `{{KEY}}` placeholders.
//! Placeholders are filled in a single pass, so text inserted for one key is
//! never scanned for another.

mod model;
mod pages;

pub use model::{model_form, model_table, FormMode, TablePage};
pub use pages::{history_page, index_page, login_page, presets_page};

use crate::config::AdminConfig;
use crate::flash::Flashes;
use crate::schema::ModelRegistry;
use std::fmt::Write;

const LAYOUT_TEMPLATE: &str = include_str!("../../templates/layout.html");
const LOGIN_TEMPLATE: &str = include_str!("../../templates/login.html");

/// Escape text for element content
#[must_use]
pub fn escape(text: &str) -> String {
    html_escape::encode_text(text).into_owned()
}

/// Escape text for a double-quoted attribute value
#[must_use]
pub fn attr(text: &str) -> String {
    html_escape::encode_double_quoted_attribute(text).into_owned()
}

/// Replace `{{KEY}}` placeholders in one pass; unknown keys are left as they are
#[must_use]
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };
        let key = &after[..end];
        match values.iter().find(|(k, _)| *k == key) {
            Some((_, value)) => out.push_str(value),
            None => {
                out.push_str("{{");
                out.push_str(key);
                out.push_str("}}");
            }
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}

/// Render flash messages
#[must_use]
pub fn render_flashes(flashes: &Flashes) -> String {
    flashes.iter().fold(String::new(), |mut out, flash| {
        let _ = write!(
            out,
            r#"<div class="{}">{}</div>"#,
            flash.level.css_class(),
            escape(&flash.message)
        );
        out
    })
}

/// What every page around the body needs
#[derive(Debug, Clone, Copy)]
pub struct PageContext<'a> {
    /// Panel configuration
    pub config: &'a AdminConfig,
    /// Registered models for the navigation
    pub registry: &'a ModelRegistry,
    /// Logged-in admin
    pub user: &'a str,
}

/// Wrap a page body in the panel layout
#[must_use]
pub fn layout(title: &str, page: PageContext<'_>, flashes: &Flashes, body: &str) -> String {
    let config = page.config;
    let mut navigation = String::new();
    for model_id in page.registry.ids() {
        let _ = write!(
            navigation,
            r#"<a href="{}">{}</a>"#,
            attr(&config.path(model_id)),
            escape(model_id)
        );
    }
    let _ = write!(
        navigation,
        r#"<a href="{}">History</a><a href="{}">Presets</a><a href="{}">Logout</a>"#,
        attr(&config.path("history")),
        attr(&config.path("presets")),
        attr(&config.path("logout")),
    );

    let title = escape(title);
    let panel_name = escape(&config.name);
    let home = attr(&config.route);
    let user = escape(page.user);
    let flashes = render_flashes(flashes);
    fill(
        LAYOUT_TEMPLATE,
        &[
            ("TITLE", title.as_str()),
            ("PANEL_NAME", panel_name.as_str()),
            ("HOME", home.as_str()),
            ("NAVIGATION", navigation.as_str()),
            ("USER", user.as_str()),
            ("FLASHES", flashes.as_str()),
            ("BODY", body),
        ],
    )
}
