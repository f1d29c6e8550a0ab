//! Route access policy
//!
//! An ordered table of `(method, path pattern) -> requirement` rules. The
//! first rule matching a request decides; requests matching no rule require
//! an authenticated principal.
//!
//! Patterns support `*` (one path segment), `**` (any number of segments)
//! and `{name}` placeholders (one segment). A trailing `/**` also matches the
//! bare prefix, so `/animes/**` covers `/animes`.

use axum::http::Method;
use regex::Regex;

use super::{Principal, Role};
use crate::error::Error;

/// What a matching request must satisfy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// No authentication needed
    PermitAll,
    /// Any authenticated principal
    Authenticated,
    /// An authenticated principal holding at least one of the roles
    AnyRole(Vec<Role>),
}

impl Requirement {
    pub fn requires_authentication(&self) -> bool {
        !matches!(self, Requirement::PermitAll)
    }

    /// Whether an authenticated principal satisfies this requirement
    pub fn is_satisfied_by(&self, principal: &Principal) -> bool {
        match self {
            Requirement::PermitAll | Requirement::Authenticated => true,
            Requirement::AnyRole(roles) => principal.has_any_role(roles),
        }
    }
}

static FALLBACK: Requirement = Requirement::Authenticated;

/// One compiled policy rule
#[derive(Debug, Clone)]
pub struct AccessRule {
    pattern: String,
    method: Option<Method>,
    regex: Regex,
    requirement: Requirement,
}

impl AccessRule {
    pub fn new(
        method: Option<Method>,
        pattern: &str,
        requirement: Requirement,
    ) -> Result<Self, Error> {
        let regex = compile_pattern_to_regex(pattern).map_err(|e| {
            Error::Internal(format!("Invalid access pattern '{}': {}", pattern, e))
        })?;
        Ok(Self {
            pattern: pattern.to_string(),
            method,
            regex,
            requirement,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn matches(&self, method: &Method, path: &str) -> bool {
        self.method.as_ref().is_none_or(|m| m == method) && self.regex.is_match(path)
    }
}

/// Ordered access rules, first match wins
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    rules: Vec<AccessRule>,
}

impl AccessPolicy {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a rule
    pub fn rule(
        mut self,
        method: Option<Method>,
        pattern: &str,
        requirement: Requirement,
    ) -> Result<Self, Error> {
        self.rules.push(AccessRule::new(method, pattern, requirement)?);
        Ok(self)
    }

    /// Policy protecting the anime API
    ///
    /// Health probes and API docs are public, reads need USER or ADMIN,
    /// writes need ADMIN.
    pub fn anime_defaults() -> Result<Self, Error> {
        let user_or_admin = Requirement::AnyRole(vec![Role::User, Role::Admin]);
        let admin = Requirement::AnyRole(vec![Role::Admin]);
        let policy = Self::new()
            .rule(Some(Method::GET), "/health", Requirement::PermitAll)?
            .rule(Some(Method::GET), "/ready", Requirement::PermitAll)?;

        #[cfg(feature = "openapi")]
        let policy = policy
            .rule(Some(Method::GET), "/v3/api-docs/**", Requirement::PermitAll)?
            .rule(Some(Method::GET), "/swagger-ui/**", Requirement::PermitAll)?
            .rule(Some(Method::GET), "/swagger-ui.html", Requirement::PermitAll)?;

        policy
            .rule(Some(Method::POST), "/animes/**", admin.clone())?
            .rule(Some(Method::GET), "/animes/**", user_or_admin)?
            .rule(Some(Method::DELETE), "/animes/**", admin.clone())?
            .rule(Some(Method::PUT), "/animes/**", admin)
    }

    /// Requirement for a request, `Authenticated` when no rule matches
    pub fn requirement(&self, method: &Method, path: &str) -> &Requirement {
        self.rules
            .iter()
            .find(|rule| rule.matches(method, path))
            .map_or(&FALLBACK, |rule| &rule.requirement)
    }

    pub fn rules(&self) -> &[AccessRule] {
        &self.rules
    }
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// Compile a path pattern into an anchored regex
fn compile_pattern_to_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let pattern = pattern.trim();
    let (body, any_suffix) = match pattern.strip_suffix("/**") {
        Some(prefix) => (prefix, true),
        None => (pattern, false),
    };

    let mut regex_str = String::from("^");
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => {
                if chars.peek() == Some(&'*') {
                    chars.next();
                    regex_str.push_str(".*");
                } else {
                    regex_str.push_str("[^/]+");
                }
            }
            '{' => {
                for c in chars.by_ref() {
                    if c == '}' {
                        break;
                    }
                }
                regex_str.push_str("[^/]+");
            }
            '.' | '+' | '?' | '(' | ')' | '[' | ']' | '^' | '$' | '|' | '\\' => {
                regex_str.push('\\');
                regex_str.push(c);
            }
            _ => regex_str.push(c),
        }
    }
    if any_suffix {
        regex_str.push_str("(/.*)?");
    }
    regex_str.push('$');

    Regex::new(&regex_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(roles: Vec<Role>) -> Principal {
        Principal {
            username: "test".into(),
            roles,
        }
    }

    #[test]
    fn test_double_star_suffix_matches_prefix() {
        let regex = compile_pattern_to_regex("/animes/**").unwrap();

        assert!(regex.is_match("/animes"));
        assert!(regex.is_match("/animes/"));
        assert!(regex.is_match("/animes/1"));
        assert!(regex.is_match("/animes/batch/x"));
        assert!(!regex.is_match("/animesx"));
        assert!(!regex.is_match("/api/animes"));
    }

    #[test]
    fn test_single_star_and_placeholder() {
        let star = compile_pattern_to_regex("/animes/*").unwrap();
        assert!(star.is_match("/animes/1"));
        assert!(!star.is_match("/animes/1/2"));
        assert!(!star.is_match("/animes"));

        let placeholder = compile_pattern_to_regex("/animes/{id}").unwrap();
        assert!(placeholder.is_match("/animes/42"));
        assert!(!placeholder.is_match("/animes/"));
    }

    #[test]
    fn test_special_characters_escaped() {
        let regex = compile_pattern_to_regex("/v1.0/items").unwrap();

        assert!(regex.is_match("/v1.0/items"));
        assert!(!regex.is_match("/v1x0/items"));
    }

    #[test]
    fn test_anime_defaults() {
        let policy = AccessPolicy::anime_defaults().unwrap();
        let admin = Requirement::AnyRole(vec![Role::Admin]);
        let reader = Requirement::AnyRole(vec![Role::User, Role::Admin]);

        assert_eq!(policy.requirement(&Method::GET, "/health"), &Requirement::PermitAll);
        assert_eq!(policy.requirement(&Method::GET, "/ready"), &Requirement::PermitAll);
        assert_eq!(policy.requirement(&Method::GET, "/animes"), &reader);
        assert_eq!(policy.requirement(&Method::GET, "/animes/1"), &reader);
        assert_eq!(policy.requirement(&Method::POST, "/animes"), &admin);
        assert_eq!(policy.requirement(&Method::POST, "/animes/batch"), &admin);
        assert_eq!(policy.requirement(&Method::PUT, "/animes/1"), &admin);
        assert_eq!(policy.requirement(&Method::DELETE, "/animes/1"), &admin);
    }

    #[cfg(feature = "openapi")]
    #[test]
    fn test_api_docs_are_public() {
        let policy = AccessPolicy::anime_defaults().unwrap();

        for path in [
            "/v3/api-docs/openapi.json",
            "/swagger-ui",
            "/swagger-ui/index.html",
            "/swagger-ui.html",
        ] {
            assert_eq!(policy.requirement(&Method::GET, path), &Requirement::PermitAll, "{}", path);
        }
        assert_eq!(
            policy.requirement(&Method::POST, "/swagger-ui/index.html"),
            &Requirement::Authenticated
        );
    }

    #[test]
    fn test_unmatched_requires_authentication() {
        let policy = AccessPolicy::anime_defaults().unwrap();

        assert_eq!(
            policy.requirement(&Method::PATCH, "/animes/1"),
            &Requirement::Authenticated
        );
        assert_eq!(
            policy.requirement(&Method::POST, "/health"),
            &Requirement::Authenticated
        );
        assert_eq!(
            policy.requirement(&Method::GET, "/unknown"),
            &Requirement::Authenticated
        );
    }

    #[test]
    fn test_first_match_wins() {
        let policy = AccessPolicy::new()
            .rule(None, "/animes/**", Requirement::PermitAll)
            .unwrap()
            .rule(Some(Method::GET), "/animes/**", Requirement::Authenticated)
            .unwrap();

        assert_eq!(policy.requirement(&Method::GET, "/animes"), &Requirement::PermitAll);
        assert_eq!(policy.rules().len(), 2);
        assert_eq!(policy.rules()[0].pattern(), "/animes/**");
    }

    #[test]
    fn test_requirement_satisfaction() {
        let user = principal(vec![Role::User]);
        let admin_only = Requirement::AnyRole(vec![Role::Admin]);

        assert!(!admin_only.is_satisfied_by(&user));
        assert!(admin_only.is_satisfied_by(&principal(vec![Role::Admin])));
        assert!(Requirement::Authenticated.is_satisfied_by(&principal(vec![])));
        assert!(!Requirement::PermitAll.requires_authentication());
    }
}
