//! RFC 6901 JSON Pointer representation and navigation.
//!
//! This module provides the [`Pointer`] type for addressing locations inside
//! a JSON document, plus generic query/write walks over the
//! [`Cursor`](crate::cursor::Cursor)/[`CursorMut`](crate::cursor::CursorMut)
//! capabilities so the same algorithm works for plain JSON trees and for the
//! router's address tree.

use std::fmt::{self, Display};

use serde_json::Value;

use crate::cursor::{Cursor, CursorMut};
use crate::uri;

/// Errors raised while parsing pointer text.
///
/// Pointer syntax is checked at parse time only; `query` and `write` never
/// raise, they report "no match" through their return values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PointerError {
    /// A non-empty pointer did not start with `/`.
    #[error("invalid json pointer '{0}': non-empty pointer must start with '/'")]
    MissingLeadingSlash(String),

    /// A `~` escape was not followed by `0` or `1`.
    #[error("invalid json pointer '{0}': '~' must be followed by '0' or '1'")]
    InvalidEscape(String),
}

/// An RFC 6901 JSON Pointer, optionally anchored to a base URI.
///
/// A pointer is an ordered sequence of unescaped reference tokens plus an
/// optional starting URI it is relative to. Tokens are stored unescaped and
/// escaped (`~`→`~0`, `/`→`~1`) only at serialization. A pointer with zero
/// tokens is the *root pointer*, addressing the whole document.
///
/// Pointers are immutable; [`push`](Pointer::push), [`extend`](Pointer::extend)
/// and [`parent`](Pointer::parent) return new instances (copy-on-append).
///
/// # Example
///
/// ```rust
/// use waypoint::Pointer;
/// use serde_json::json;
///
/// let ptr = Pointer::parse("/users/0/email").unwrap();
/// let doc = json!({"users": [{"email": "a@example.com"}]});
///
/// assert_eq!(ptr.query_json(&doc), Some(&json!("a@example.com")));
/// assert_eq!(ptr.build(), "/users/0/email");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Pointer {
    base: Option<String>,
    tokens: Vec<String>,
}

impl Pointer {
    /// Creates the root pointer with no base URI.
    pub fn root() -> Self {
        Self::default()
    }

    /// Creates the root pointer anchored to the given base URI.
    pub fn root_of(base: impl Into<String>) -> Self {
        Self {
            base: Some(base.into()),
            tokens: Vec::new(),
        }
    }

    /// Parses pointer text into a `Pointer`.
    ///
    /// The empty string parses to the root pointer. Non-empty text must match
    /// the grammar `("/" (unescaped-char | "~0" | "~1")*)*`.
    ///
    /// # Errors
    ///
    /// Returns [`PointerError`] on malformed text. Syntax is the only failure
    /// mode; any well-formed pointer parses regardless of what it addresses.
    ///
    /// # Example
    ///
    /// ```rust
    /// use waypoint::Pointer;
    ///
    /// assert!(Pointer::parse("").unwrap().is_root());
    /// assert!(Pointer::parse("/a/b").is_ok());
    /// assert!(Pointer::parse("a/b").is_err());
    /// assert!(Pointer::parse("/a~2b").is_err());
    /// ```
    pub fn parse(text: &str) -> Result<Self, PointerError> {
        let tokens = parse_tokens(text)?;
        Ok(Self { base: None, tokens })
    }

    /// Parses a URI whose fragment is a JSON pointer.
    ///
    /// Everything before the `#` becomes the base URI; the fragment is
    /// percent-decoded and parsed as pointer text. A fragment that is neither
    /// empty nor pointer-shaped (a plain-name anchor like `#foo`) yields a
    /// root pointer whose base retains the full URI, so it can still be
    /// resolved through the router's alias map.
    ///
    /// # Example
    ///
    /// ```rust
    /// use waypoint::Pointer;
    ///
    /// let ptr = Pointer::from_uri("https://example.com/s.json#/definitions/a").unwrap();
    /// assert_eq!(ptr.build(), "/definitions/a");
    /// assert!(!ptr.is_local());
    /// ```
    pub fn from_uri(uri_text: &str) -> Result<Self, PointerError> {
        let (base, fragment) = match uri_text.split_once('#') {
            Some((b, f)) => (b, Some(f)),
            None => (uri_text, None),
        };
        match fragment {
            None | Some("") => Ok(Self {
                base: non_empty(base),
                tokens: Vec::new(),
            }),
            Some(f) if f.starts_with('/') => {
                let decoded = uri::percent_decode(f);
                let tokens = parse_tokens(&decoded)?;
                Ok(Self {
                    base: non_empty(base),
                    tokens,
                })
            }
            // Plain-name fragment: keep it on the base so the alias map can
            // resolve it as a whole URI.
            Some(_) => Ok(Self {
                base: Some(uri_text.to_string()),
                tokens: Vec::new(),
            }),
        }
    }

    /// Returns a new pointer with one unescaped token appended.
    ///
    /// The token must not be pre-escaped; escaping happens only at
    /// serialization.
    pub fn push(&self, token: impl Into<String>) -> Self {
        let mut tokens = self.tokens.clone();
        tokens.push(token.into());
        Self {
            base: self.base.clone(),
            tokens,
        }
    }

    /// Returns a new pointer with several unescaped tokens appended.
    pub fn extend<I, T>(&self, extra: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut tokens = self.tokens.clone();
        tokens.extend(extra.into_iter().map(Into::into));
        Self {
            base: self.base.clone(),
            tokens,
        }
    }

    /// Returns the parent pointer (all tokens except the last).
    ///
    /// The root pointer is its own parent.
    pub fn parent(&self) -> Self {
        let mut tokens = self.tokens.clone();
        tokens.pop();
        Self {
            base: self.base.clone(),
            tokens,
        }
    }

    /// Returns true if this pointer has zero tokens.
    pub fn is_root(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Returns true if this pointer carries no URI content.
    ///
    /// A pointer anchored to any non-empty URI is not local, even when the
    /// URI is relative.
    pub fn is_local(&self) -> bool {
        self.base.as_deref().unwrap_or("").is_empty()
    }

    /// Returns the base URI this pointer is relative to, if any.
    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    /// Returns the unescaped reference tokens in order.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Serializes to pointer text: `""` for root, else `/`-joined escaped
    /// tokens.
    ///
    /// # Example
    ///
    /// ```rust
    /// use waypoint::Pointer;
    ///
    /// let ptr = Pointer::root().push("a/b").push("m~n");
    /// assert_eq!(ptr.build(), "/a~1b/m~0n");
    /// ```
    pub fn build(&self) -> String {
        let mut out = String::new();
        for token in &self.tokens {
            out.push('/');
            out.push_str(&escape(token));
        }
        out
    }

    /// Serializes to URI form: the base URI followed by `#` and the pointer
    /// text.
    pub fn to_uri(&self) -> String {
        let base = self.base.as_deref().unwrap_or("");
        if base.contains('#') {
            // Plain-name fragment kept on the base; the pointer part is root.
            return base.to_string();
        }
        format!("{}#{}", base, self.build())
    }

    /// Queries the location this pointer addresses, walking a cursor.
    ///
    /// The root pointer returns the cursor unmodified. Out-of-bounds array
    /// access and the `-` token yield `None`, never an error.
    pub fn query<C: Cursor>(&self, cursor: C) -> Option<C> {
        let mut current = cursor;
        for token in &self.tokens {
            current = current.step(token)?;
        }
        Some(current)
    }

    /// Writes `value` at the location this pointer addresses.
    ///
    /// The root pointer replaces the document wholesale and always succeeds.
    /// Otherwise the walk descends to the parent container, optionally
    /// creating missing objects when `create_missing` is set (arrays are
    /// never auto-extended), then writes the final token: object key
    /// set/replace, array index replace, or `-` append.
    ///
    /// Returns `false` when the target container type does not match the
    /// token kind; a failed write leaves the document unmodified.
    pub fn write<C: CursorMut>(&self, cursor: C, value: C::Value, create_missing: bool) -> bool {
        let (last, walk) = match self.tokens.split_last() {
            Some((last, walk)) => (last, walk),
            None => {
                cursor.replace(value);
                return true;
            }
        };
        let mut current = cursor;
        for token in walk {
            current = if create_missing {
                match current.ensure(token) {
                    Some(c) => c,
                    None => return false,
                }
            } else {
                match current.step_mut(token) {
                    Some(c) => c,
                    None => return false,
                }
            };
        }
        current.write(last, value)
    }

    /// Queries a JSON document, returning the addressed value.
    ///
    /// # Example
    ///
    /// ```rust
    /// use waypoint::Pointer;
    /// use serde_json::json;
    ///
    /// let doc = json!({"a/b": 1});
    /// assert_eq!(Pointer::parse("/a~1b").unwrap().query_json(&doc), Some(&json!(1)));
    /// ```
    pub fn query_json<'a>(&self, doc: &'a Value) -> Option<&'a Value> {
        self.query(doc)
    }

    /// Writes a value into a JSON document at this pointer's location.
    pub fn write_json(&self, doc: &mut Value, value: Value, create_missing: bool) -> bool {
        self.write(doc, value, create_missing)
    }
}

impl Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.build())
    }
}

fn non_empty(text: &str) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn parse_tokens(text: &str) -> Result<Vec<String>, PointerError> {
    if text.is_empty() {
        return Ok(Vec::new());
    }
    if !text.starts_with('/') {
        return Err(PointerError::MissingLeadingSlash(text.to_string()));
    }
    text[1..].split('/').map(|raw| unescape(raw, text)).collect()
}

fn unescape(raw: &str, whole: &str) -> Result<String, PointerError> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '~' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('0') => out.push('~'),
            Some('1') => out.push('/'),
            _ => return Err(PointerError::InvalidEscape(whole.to_string())),
        }
    }
    Ok(out)
}

fn escape(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}
