//! Document cursor capabilities for pointer navigation.
//!
//! The pointer engine is written against these small capability traits, not
//! against JSON concretely; [`Cursor`]/[`CursorMut`] are implemented here for
//! `serde_json::Value` trees and again inside the router for its address
//! tree, so the walk algorithm exists once.

use serde_json::{Map, Value};

/// Read-side cursor capability: step to a child by unescaped token.
///
/// Implementations decide how a token addresses a child. The JSON
/// implementation looks up object keys and parses array indices; the
/// router's address tree treats every token as a key.
pub trait Cursor: Sized {
    /// Steps to the child addressed by `token`, or `None` if there is no
    /// such child.
    fn step(self, token: &str) -> Option<Self>;

    /// True when the current position holds an object-like container.
    fn is_object(&self) -> bool;

    /// True when the current position holds an array.
    fn is_array(&self) -> bool;
}

/// Write-side cursor capability used by [`Pointer::write`](crate::Pointer::write).
pub trait CursorMut: Sized {
    /// The value type written at the final token.
    type Value;

    /// Steps to an existing child addressed by `token`.
    fn step_mut(self, token: &str) -> Option<Self>;

    /// Steps to the child addressed by `token`, creating missing objects.
    ///
    /// Arrays are never auto-extended: an in-bounds index steps through, the
    /// `-` token fails, and a non-index token converts the step into an
    /// object-style write so a single pointer can address values nested
    /// under keyword maps and router nodes.
    fn ensure(self, token: &str) -> Option<Self>;

    /// Writes `value` at the final token. Returns `false` when the container
    /// type does not match the token kind.
    fn write(self, token: &str, value: Self::Value) -> bool;

    /// Replaces the current value wholesale (root pointer write).
    fn replace(self, value: Self::Value);
}

/// Parses a token as an RFC 6901 array index: non-negative, no leading
/// zeros (except `0` itself), never the `-` token.
pub(crate) fn parse_index(token: &str) -> Option<usize> {
    if token.len() > 1 && token.starts_with('0') {
        return None;
    }
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

impl<'a> Cursor for &'a Value {
    fn step(self, token: &str) -> Option<Self> {
        match self {
            Value::Object(map) => map.get(token),
            Value::Array(items) => {
                if token == "-" {
                    return None;
                }
                items.get(parse_index(token)?)
            }
            _ => None,
        }
    }

    fn is_object(&self) -> bool {
        Value::is_object(self)
    }

    fn is_array(&self) -> bool {
        Value::is_array(self)
    }
}

impl<'a> CursorMut for &'a mut Value {
    type Value = Value;

    fn step_mut(self, token: &str) -> Option<Self> {
        match self {
            Value::Object(map) => map.get_mut(token),
            Value::Array(items) => {
                if token == "-" {
                    return None;
                }
                let idx = parse_index(token)?;
                items.get_mut(idx)
            }
            _ => None,
        }
    }

    fn ensure(self, token: &str) -> Option<Self> {
        if self.is_object() {
            return Some(
                self.as_object_mut()?
                    .entry(token.to_string())
                    .or_insert_with(|| Value::Object(Map::new())),
            );
        }
        if self.is_array() {
            if token == "-" {
                return None;
            }
            if let Some(idx) = parse_index(token) {
                return self.as_array_mut()?.get_mut(idx);
            }
            // fall through: non-index token promotes the step to object-style
        }
        *self = Value::Object(Map::new());
        Some(
            self.as_object_mut()?
                .entry(token.to_string())
                .or_insert_with(|| Value::Object(Map::new())),
        )
    }

    fn write(self, token: &str, value: Value) -> bool {
        match self {
            Value::Object(map) => {
                map.insert(token.to_string(), value);
                true
            }
            Value::Array(items) => {
                if token == "-" {
                    items.push(value);
                    return true;
                }
                match parse_index(token) {
                    Some(idx) if idx < items.len() => {
                        items[idx] = value;
                        true
                    }
                    _ => false,
                }
            }
            _ => false,
        }
    }

    fn replace(self, value: Value) {
        *self = value;
    }
}
