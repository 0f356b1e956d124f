//! Page identity, slugged routes and the draft/locked lifecycle.
//!
//! [`PageStore`] is the single owner of every [`Page`]. Routes are derived
//! from page names while a page is a draft; navigating to a page locks it,
//! after which its route never changes again. The route index is a cache
//! rebuilt from the full page set on every mutation.

use crate::error::RouteConflict;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Page identifier, e.g. `page_3fa8c1`.
pub type PageId = String;

/// Lifecycle of a page. `Draft -> Locked` is the only transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PageStatus {
    Draft,
    Locked,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,
    pub name: String,
    pub route: String,
    pub aliases: Vec<String>,
    pub status: PageStatus,
}

impl Page {
    pub fn is_locked(&self) -> bool {
        self.status == PageStatus::Locked
    }
}

/// Kind tag used to scope generated element ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Button,
    Image,
    Text,
}

impl ElementKind {
    pub fn tag(self) -> &'static str {
        match self {
            ElementKind::Button => "btn",
            ElementKind::Image => "img",
            ElementKind::Text => "text",
        }
    }
}

/// Turn a page name into a URL-safe route.
///
/// The result always starts with `/` and otherwise contains only `a-z`,
/// `0-9` and `-`. Whitespace runs collapse into a single hyphen.
pub fn slugify(name: &str) -> String {
    let mut route = String::with_capacity(name.len() + 1);
    route.push('/');

    let mut in_whitespace = false;
    for c in name.trim().chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                route.push('-');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        for lower in c.to_lowercase() {
            if lower.is_ascii_lowercase() || lower.is_ascii_digit() || lower == '-' {
                route.push(lower);
            }
        }
    }

    route
}

fn short_id(prefix: &str) -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("{}_{}", prefix, &hex[..6])
}

/// Owned registry of pages, their routes and their element ids.
///
/// Create one per editor session; nothing here is process-global, so
/// several sessions (or tests) can run side by side.
#[derive(Debug, Default)]
pub struct PageStore {
    pages: Vec<Page>,
    route_index: HashMap<String, PageId>,
    elements: HashMap<PageId, HashSet<String>>,
}

impl PageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a draft page named `name`.
    ///
    /// The route is `slugify(name)`. If another page already answers to that
    /// route, `-2`, `-3`, ... is appended so every route keeps resolving to
    /// exactly one page.
    pub fn create_page(&mut self, name: &str) -> Page {
        let mut id = short_id("page");
        while self.page(&id).is_some() {
            id = short_id("page");
        }

        let route = self.unique_route(&slugify(name), None);
        let page = Page {
            id: id.clone(),
            name: name.to_string(),
            route,
            aliases: Vec::new(),
            status: PageStatus::Draft,
        };

        tracing::debug!(page_id = %page.id, route = %page.route, "page created");
        self.pages.push(page.clone());
        self.elements.insert(id, HashSet::new());
        self.rebuild_route_index();
        page
    }

    /// Rename a page. Draft pages follow the new name with their route;
    /// locked pages keep the route they were visited under.
    pub fn rename_page(&mut self, page_id: &str, new_name: &str) {
        let Some(index) = self.position(page_id) else {
            tracing::debug!(page_id, "rename ignored: unknown page");
            return;
        };

        self.pages[index].name = new_name.to_string();

        if self.pages[index].status == PageStatus::Draft {
            let route = self.unique_route(&slugify(new_name), Some(page_id));
            self.pages[index].route = route;
            self.rebuild_route_index();
        }
    }

    /// Lock a page. Idempotent, and a no-op for unknown ids.
    pub fn lock_page(&mut self, page_id: &str) {
        let Some(page) = self.pages.iter_mut().find(|p| p.id == page_id) else {
            tracing::debug!(page_id, "lock ignored: unknown page");
            return;
        };
        if page.status == PageStatus::Locked {
            return;
        }
        page.status = PageStatus::Locked;
        tracing::debug!(page_id, route = %page.route, "page locked");
    }

    /// Register an extra route for a page.
    ///
    /// A missing leading `/` is added. Unknown pages are ignored; an alias
    /// that already resolves to a different page is rejected.
    pub fn add_alias(&mut self, page_id: &str, alias: &str) -> Result<(), RouteConflict> {
        let Some(index) = self.position(page_id) else {
            tracing::debug!(page_id, "alias ignored: unknown page");
            return Ok(());
        };

        let alias = normalize_alias(alias);
        match self.route_index.get(&alias) {
            Some(owner) if owner != page_id => {
                return Err(RouteConflict {
                    route: alias,
                    owner: owner.clone(),
                });
            }
            Some(_) => return Ok(()),
            None => {}
        }

        self.pages[index].aliases.push(alias);
        self.rebuild_route_index();
        Ok(())
    }

    /// Drop a page along with its routes and element ids. No-op if missing.
    pub fn remove_page(&mut self, page_id: &str) {
        let Some(index) = self.position(page_id) else {
            return;
        };
        self.pages.remove(index);
        self.elements.remove(page_id);
        self.rebuild_route_index();
    }

    pub fn page(&self, page_id: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.id == page_id)
    }

    /// Resolve a route or alias to its page id.
    pub fn page_id_by_url(&self, path: &str) -> Option<&PageId> {
        self.route_index.get(path)
    }

    /// All pages in creation order.
    pub fn pages(&self) -> impl Iterator<Item = &Page> + '_ {
        self.pages.iter()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Generate a DOM id such as `btn_9c01fe` and record it for the page.
    ///
    /// Uniqueness is only enforced within the page: every page runs in its
    /// own sandbox, so ids may repeat across pages. Returns `None` for
    /// unknown pages.
    pub fn register_element(&mut self, page_id: &str, kind: ElementKind) -> Option<String> {
        let ids = self.elements.get_mut(page_id)?;
        let mut id = short_id(kind.tag());
        while ids.contains(&id) {
            id = short_id(kind.tag());
        }
        ids.insert(id.clone());
        Some(id)
    }

    /// Element ids registered for a page.
    pub fn elements(&self, page_id: &str) -> Option<&HashSet<String>> {
        self.elements.get(page_id)
    }

    fn position(&self, page_id: &str) -> Option<usize> {
        self.pages.iter().position(|p| p.id == page_id)
    }

    fn route_taken(&self, route: &str, except: Option<&str>) -> bool {
        self.pages
            .iter()
            .filter(|p| Some(p.id.as_str()) != except)
            .any(|p| p.route == route || p.aliases.iter().any(|a| a == route))
    }

    fn unique_route(&self, base: &str, except: Option<&str>) -> String {
        if !self.route_taken(base, except) {
            return base.to_string();
        }
        let mut n = 2;
        loop {
            let candidate = format!("{}-{}", base, n);
            if !self.route_taken(&candidate, except) {
                return candidate;
            }
            n += 1;
        }
    }

    fn rebuild_route_index(&mut self) {
        self.route_index.clear();
        for page in &self.pages {
            self.route_index.insert(page.route.clone(), page.id.clone());
            for alias in &page.aliases {
                self.route_index.insert(alias.clone(), page.id.clone());
            }
        }
    }
}

fn normalize_alias(alias: &str) -> String {
    let alias = alias.trim();
    if alias.starts_with('/') {
        alias.to_string()
    } else {
        format!("/{}", alias)
    }
}
