//! Method + path dispatch table.
//!
//! Patterns are literal paths with `{name}` placeholders, each matching one
//! non-empty run of non-slash characters. Lookup tries an exact pattern match
//! first, then the patterns for the method in registration order; the first
//! match wins and its captures are returned positionally.

use std::collections::HashMap;
use std::fmt;

use axum::http::Method;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{(\w+)\}").expect("placeholder pattern"));

#[derive(Debug, Error)]
#[error("invalid route pattern '{pattern}': {source}")]
pub struct RoutePatternError {
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("route not found: {method} {path}")]
pub struct RouteNotFound {
    pub method: Method,
    pub path: String,
}

struct Route<H> {
    pattern: String,
    regex: Regex,
    handler: H,
}

/// A resolved route: the handler plus its positional path arguments.
#[derive(Debug)]
pub struct RouteMatch<'a, H> {
    pub handler: &'a H,
    pub pattern: &'a str,
    pub params: Vec<String>,
}

pub struct RouteTable<H> {
    base_path: String,
    routes: HashMap<Method, Vec<Route<H>>>,
}

impl<H> fmt::Debug for RouteTable<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut routes: Vec<String> = self
            .routes
            .iter()
            .flat_map(|(method, routes)| routes.iter().map(move |r| format!("{} {}", method, r.pattern)))
            .collect();
        routes.sort();
        f.debug_struct("RouteTable")
            .field("base_path", &self.base_path)
            .field("routes", &routes)
            .finish()
    }
}

impl<H> Default for RouteTable<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> RouteTable<H> {
    pub fn new() -> Self {
        Self::with_base_path("")
    }

    /// `base_path` is stripped from incoming paths that start with it.
    pub fn with_base_path(base_path: &str) -> Self {
        let trimmed = base_path.trim().trim_end_matches('/');
        let base_path = if trimmed.is_empty() || trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{}", trimmed)
        };

        Self {
            base_path,
            routes: HashMap::new(),
        }
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Registering the same method and pattern twice replaces the handler in place.
    pub fn register(&mut self, method: Method, pattern: &str, handler: H) -> Result<(), RoutePatternError> {
        let pattern = pattern.trim_end_matches('/').to_string();
        let regex = compile_pattern(&pattern).map_err(|source| RoutePatternError {
            pattern: pattern.clone(),
            source,
        })?;

        let routes = self.routes.entry(method).or_default();
        match routes.iter_mut().find(|r| r.pattern == pattern) {
            Some(existing) => existing.handler = handler,
            None => routes.push(Route { pattern, regex, handler }),
        }
        Ok(())
    }

    pub fn get(&mut self, pattern: &str, handler: H) -> Result<(), RoutePatternError> {
        self.register(Method::GET, pattern, handler)
    }

    pub fn post(&mut self, pattern: &str, handler: H) -> Result<(), RoutePatternError> {
        self.register(Method::POST, pattern, handler)
    }

    pub fn put(&mut self, pattern: &str, handler: H) -> Result<(), RoutePatternError> {
        self.register(Method::PUT, pattern, handler)
    }

    pub fn delete(&mut self, pattern: &str, handler: H) -> Result<(), RoutePatternError> {
        self.register(Method::DELETE, pattern, handler)
    }

    pub fn len(&self) -> usize {
        self.routes.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Strips the base prefix and any trailing slashes.
    pub fn normalize_path<'p>(&self, path: &'p str) -> &'p str {
        let path = match path.strip_prefix(self.base_path.as_str()) {
            Some(rest) if !self.base_path.is_empty() && (rest.is_empty() || rest.starts_with('/')) => rest,
            _ => path,
        };
        path.trim_end_matches('/')
    }

    pub fn dispatch(&self, method: &Method, path: &str) -> Result<RouteMatch<'_, H>, RouteNotFound> {
        let path = self.normalize_path(path);
        let not_found = || RouteNotFound {
            method: method.clone(),
            path: path.to_string(),
        };

        let routes = self.routes.get(method).ok_or_else(not_found)?;

        if let Some(route) = routes.iter().find(|r| r.pattern == path) {
            return Ok(RouteMatch {
                handler: &route.handler,
                pattern: &route.pattern,
                params: Vec::new(),
            });
        }

        routes
            .iter()
            .find_map(|route| {
                let captures = route.regex.captures(path)?;
                let params = captures
                    .iter()
                    .skip(1)
                    .flatten()
                    .map(|m| m.as_str().to_string())
                    .collect();
                Some(RouteMatch {
                    handler: &route.handler,
                    pattern: &route.pattern,
                    params,
                })
            })
            .ok_or_else(not_found)
    }
}

/// `/patients/{id}` becomes `^/patients/([^/]+)$`; literal text is escaped.
fn compile_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    let mut expr = String::from("^");
    let mut last = 0;

    for placeholder in PLACEHOLDER.find_iter(pattern) {
        expr.push_str(&regex::escape(&pattern[last..placeholder.start()]));
        expr.push_str("([^/]+)");
        last = placeholder.end();
    }

    expr.push_str(&regex::escape(&pattern[last..]));
    expr.push('$');
    Regex::new(&expr)
}
