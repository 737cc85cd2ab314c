//! Page shell: header, routed content, and the HTML document that carries
//! the hydration payload.

#[cfg(test)]
#[path = "page_test.rs"]
mod page_test;

use super::menu::HeaderMenu;
use super::routes::Route;
use crate::state::auth::AuthState;
use crate::state::main::InitialData;

pub const SITE_TITLE: &str = "MySite";
pub const MOUNT_ID: &str = "app-main";
pub const INITIAL_DATA_ID: &str = "initial-data";

/// Header plus routed content for one auth snapshot.
#[must_use]
pub fn render_layout(auth: &AuthState, route: Route) -> String {
    format!(
        concat!(
            r#"<div class="layout"><header class="layout-header">"#,
            r#"<a class="brand" href="/">{title}</a>"#,
            r#"<ul class="menu">{menu}</ul>"#,
            r#"</header><main class="layout-content">{content}</main></div>"#,
        ),
        title = escape_html(SITE_TITLE),
        menu = HeaderMenu::from_state(auth).render(),
        content = route.render(),
    )
}

/// Full HTML document for the first paint, embedding `data` so the client
/// store can hydrate without another round-trip.
///
/// # Errors
///
/// Returns a serialization error if `data` cannot be encoded.
pub fn render_document(data: &InitialData, route: Route) -> Result<String, serde_json::Error> {
    let payload = script_safe_json(&serde_json::to_string(data)?);
    let layout = render_layout(&AuthState::from(data.auth.clone()), route);
    Ok(format!(
        concat!(
            "<!DOCTYPE html>\n",
            r#"<html lang="en"><head><meta charset="utf-8">"#,
            r#"<meta name="viewport" content="width=device-width, initial-scale=1">"#,
            r#"<title>{title}</title><link rel="stylesheet" href="/css/main.css"></head>"#,
            r#"<body><div id="{mount}">{layout}</div>"#,
            r#"<script id="{data_id}" type="application/json">{payload}</script>"#,
            "</body></html>",
        ),
        title = escape_html(SITE_TITLE),
        mount = MOUNT_ID,
        layout = layout,
        data_id = INITIAL_DATA_ID,
        payload = payload,
    ))
}

#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// JSON is inert inside a `<script>` block once `<` can no longer open a tag.
fn script_safe_json(json: &str) -> String {
    json.replace('<', "\\u003c")
}
