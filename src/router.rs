//! Client-side routing with an authentication guard.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every navigation (first load included) resolves the target against the
//! static route table and then runs [`guard`] against the live session.
//! Decisions are never cached: each call re-reads `is_authenticated`.

#[cfg(test)]
#[path = "router_test.rs"]
mod router_test;

use std::collections::BTreeMap;

use percent_encoding::percent_decode_str;

use crate::session::SessionStore;

pub const LOGIN_PATH: &str = "/login";

/// Page a route renders.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum View {
    Home,
    Login,
    Register,
    Onboarding,
    Dashboard,
    Profiles,
    Article,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RouteMeta {
    pub requires_auth: bool,
}

/// One entry of the route table. `:name` path segments capture parameters,
/// percent-decoded.
#[derive(Debug, PartialEq, Eq)]
pub struct RouteDef {
    pub path: &'static str,
    pub name: &'static str,
    pub view: View,
    pub meta: RouteMeta,
}

const PUBLIC: RouteMeta = RouteMeta { requires_auth: false };
const PRIVATE: RouteMeta = RouteMeta { requires_auth: true };

pub static ROUTES: &[RouteDef] = &[
    RouteDef { path: "/", name: "Home", view: View::Home, meta: PUBLIC },
    RouteDef { path: "/login", name: "Login", view: View::Login, meta: PUBLIC },
    RouteDef { path: "/register", name: "Register", view: View::Register, meta: PUBLIC },
    RouteDef { path: "/onboarding", name: "Onboarding", view: View::Onboarding, meta: PRIVATE },
    RouteDef { path: "/dashboard", name: "Dashboard", view: View::Dashboard, meta: PRIVATE },
    RouteDef { path: "/profiles", name: "Profiles", view: View::Profiles, meta: PRIVATE },
    RouteDef { path: "/article/:pmid", name: "Article", view: View::Article, meta: PRIVATE },
];

pub type Params = BTreeMap<String, String>;

impl RouteDef {
    /// Match `path` (no query string) against this route's pattern.
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<Params> {
        let pattern = segments(self.path);
        let actual = segments(path);
        if pattern.len() != actual.len() {
            return None;
        }
        let mut params = Params::new();
        for (expected, given) in pattern.iter().zip(&actual) {
            match expected.strip_prefix(':') {
                Some(name) => {
                    let decoded = percent_decode_str(given).decode_utf8_lossy();
                    params.insert(name.to_owned(), decoded.into_owned());
                }
                None if expected == given => {}
                None => return None,
            }
        }
        Some(params)
    }
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// A resolved navigation target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Location {
    pub route: &'static RouteDef,
    pub path: String,
    pub params: Params,
    pub query: Option<String>,
}

impl Location {
    #[must_use]
    pub fn view(&self) -> View {
        self.route.view
    }

    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

/// Outcome of a navigation that reached a route.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Navigation {
    pub location: Location,
    /// Requested path when the guard sent us elsewhere.
    pub redirected_from: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    Proceed,
    Redirect(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouterError {
    #[error("no route matches '{0}'")]
    NotFound(String),
    #[error("auth redirect from '{0}' lands on another protected route")]
    RedirectLoop(String),
}

/// Redirect to login when `route` needs auth and the session has none.
#[must_use]
pub fn guard(route: &RouteDef, authenticated: bool) -> GuardDecision {
    if route.meta.requires_auth && !authenticated {
        GuardDecision::Redirect(LOGIN_PATH)
    } else {
        GuardDecision::Proceed
    }
}

pub struct Router {
    routes: &'static [RouteDef],
    session: SessionStore,
    current: Option<Location>,
}

impl Router {
    pub fn new(session: SessionStore) -> Self {
        Self::with_routes(ROUTES, session)
    }

    pub fn with_routes(routes: &'static [RouteDef], session: SessionStore) -> Self {
        Self { routes, session, current: None }
    }

    #[must_use]
    pub fn routes(&self) -> &'static [RouteDef] {
        self.routes
    }

    #[must_use]
    pub fn current(&self) -> Option<&Location> {
        self.current.as_ref()
    }

    /// Match `target` against the table without running the guard.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::NotFound`] when no route matches.
    pub fn resolve(&self, target: &str) -> Result<Location, RouterError> {
        let without_fragment = target.split_once('#').map_or(target, |(head, _)| head);
        let (path, query) = match without_fragment.split_once('?') {
            Some((path, query)) => (path, Some(query.to_owned()).filter(|q| !q.is_empty())),
            None => (without_fragment, None),
        };
        let path = if path.is_empty() { "/" } else { path };

        self.routes
            .iter()
            .find_map(|route| {
                route.matches(path).map(|params| Location {
                    route,
                    path: path.to_owned(),
                    params,
                    query: query.clone(),
                })
            })
            .ok_or_else(|| RouterError::NotFound(target.to_owned()))
    }

    /// Resolve `target`, apply the auth guard, and make the result current.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::NotFound`] for unknown paths (the current
    /// location is left unchanged) and [`RouterError::RedirectLoop`] if the
    /// login route itself requires auth.
    pub fn navigate(&mut self, target: &str) -> Result<Navigation, RouterError> {
        let requested = self.resolve(target)?;
        let authenticated = self.session.is_authenticated();

        let navigation = match guard(requested.route, authenticated) {
            GuardDecision::Proceed => Navigation { location: requested, redirected_from: None },
            GuardDecision::Redirect(to) => {
                let location = self.resolve(to)?;
                if guard(location.route, authenticated) != GuardDecision::Proceed {
                    return Err(RouterError::RedirectLoop(target.to_owned()));
                }
                tracing::debug!(from = %requested.path, %to, "auth guard redirect");
                Navigation { location, redirected_from: Some(requested.path) }
            }
        };

        self.current = Some(navigation.location.clone());
        Ok(navigation)
    }
}
