//! Named string-format predicates.
//!
//! The `format` keyword delegates to a pluggable registry of named
//! predicates. Unknown format names are ignored, matching draft-7's
//! annotation-by-default behavior.

use std::collections::HashMap;
use std::sync::Arc;

use regex::Regex;

/// A format predicate: returns true when the string conforms.
pub type FormatCheck = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// A registry of named string-format predicates.
///
/// The default set covers the common draft-7 formats. Custom predicates can
/// be registered and override defaults of the same name.
///
/// # Example
///
/// ```rust
/// use waypoint::FormatRegistry;
///
/// let mut formats = FormatRegistry::default();
/// formats.register("even-length", |s| s.len() % 2 == 0);
///
/// assert!(formats.check("even-length", "ab").unwrap());
/// assert!(formats.get("no-such-format").is_none());
/// ```
#[derive(Clone)]
pub struct FormatRegistry {
    checks: HashMap<String, FormatCheck>,
}

impl FormatRegistry {
    /// Creates an empty registry with no predicates.
    pub fn empty() -> Self {
        Self {
            checks: HashMap::new(),
        }
    }

    /// Registers a predicate under the given format name.
    pub fn register<F>(&mut self, name: impl Into<String>, check: F)
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.checks.insert(name.into(), Arc::new(check));
    }

    /// Returns the predicate registered under `name`, if any.
    pub fn get(&self, name: &str) -> Option<FormatCheck> {
        self.checks.get(name).cloned()
    }

    /// Runs the named predicate, or `None` when the format is unknown.
    pub fn check(&self, name: &str, value: &str) -> Option<bool> {
        self.checks.get(name).map(|check| check(value))
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();

        registry.register_regex(
            "date",
            r"^\d{4}-(0[1-9]|1[0-2])-(0[1-9]|[12]\d|3[01])$",
        );
        registry.register_regex(
            "time",
            r"^([01]\d|2[0-3]):[0-5]\d:([0-5]\d|60)(\.\d+)?(Z|z|[+-]([01]\d|2[0-3]):[0-5]\d)$",
        );
        registry.register_regex(
            "date-time",
            r"^\d{4}-(0[1-9]|1[0-2])-(0[1-9]|[12]\d|3[01])[Tt]([01]\d|2[0-3]):[0-5]\d:([0-5]\d|60)(\.\d+)?(Z|z|[+-]([01]\d|2[0-3]):[0-5]\d)$",
        );
        registry.register_regex(
            "email",
            r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$",
        );
        registry.register_regex(
            "hostname",
            r"^[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$",
        );
        registry.register_regex(
            "uuid",
            r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$",
        );

        registry.register("ipv4", |s| s.parse::<std::net::Ipv4Addr>().is_ok());
        registry.register("ipv6", |s| s.parse::<std::net::Ipv6Addr>().is_ok());
        registry.register("uri", |s| url::Url::parse(s).is_ok());
        registry.register("regex", |s| Regex::new(s).is_ok());

        registry
    }
}

impl FormatRegistry {
    fn register_regex(&mut self, name: &str, pattern: &str) {
        let regex = Regex::new(pattern).expect("default format patterns are valid");
        self.register(name, move |s: &str| regex.is_match(s));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_formats() {
        let formats = FormatRegistry::default();
        assert_eq!(formats.check("date", "2023-04-01"), Some(true));
        assert_eq!(formats.check("date", "2023-13-01"), Some(false));
        assert_eq!(formats.check("date-time", "2023-04-01T10:30:00Z"), Some(true));
        assert_eq!(formats.check("email", "a@example.com"), Some(true));
        assert_eq!(formats.check("email", "not-an-email"), Some(false));
        assert_eq!(formats.check("ipv4", "192.168.0.1"), Some(true));
        assert_eq!(formats.check("ipv4", "999.0.0.1"), Some(false));
        assert_eq!(formats.check("ipv6", "::1"), Some(true));
        assert_eq!(
            formats.check("uuid", "123e4567-e89b-12d3-a456-426614174000"),
            Some(true)
        );
        assert_eq!(formats.check("regex", "a(b"), Some(false));
    }

    #[test]
    fn test_unknown_format_is_none() {
        let formats = FormatRegistry::default();
        assert_eq!(formats.check("no-such", "x"), None);
    }

    #[test]
    fn test_custom_format_overrides() {
        let mut formats = FormatRegistry::default();
        formats.register("date", |_| true);
        assert_eq!(formats.check("date", "anything"), Some(true));
    }
}
