//! Client-side routing table.

#[cfg(test)]
#[path = "routes_test.rs"]
mod routes_test;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Page {
    Home,
}

/// A resolved path. Unknown paths fall through to the home page and are
/// flagged so the server or shell can report a 404.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Route {
    pub page: Page,
    pub not_found: bool,
}

impl Route {
    #[must_use]
    pub fn resolve(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let known = path == "/" || path == "/index" || path.starts_with("/index/");
        Self { page: Page::Home, not_found: !known }
    }

    #[must_use]
    pub fn render(self) -> String {
        match self.page {
            Page::Home => "<div><h1>Hello world</h1></div>".to_owned(),
        }
    }
}
