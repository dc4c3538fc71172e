//! Directive tokenizer for `/key value` payloads
//!
//! A payload is a list of `/`-separated directives. `//` stands for a literal
//! `/` inside a value. Directives are scanned from the end of the payload
//! backwards: a segment whose key is not part of the schema is folded back
//! onto the segment before it, so free text that happens to contain `/word`
//! stays attached to the value it belongs to.

use std::fmt::Debug;

use super::error::DecodeError;

/// A closed set of directive names understood by one payload schema.
pub trait DirectiveKey: Copy + Eq + Debug {
    /// Directive name as written in payloads (lowercase).
    fn name(self) -> &'static str;

    /// Resolve a lowercase directive name to a key of this schema.
    fn from_name(name: &str) -> Option<Self>;
}

/// A value type that can be produced from a directive.
pub trait DirectiveValue: Sized {
    /// When true the directive is a flag and its text is ignored.
    const PRESENCE_ONLY: bool = false;

    fn from_directive(value: &str) -> Self;

    /// Value used when the directive does not appear in the payload.
    fn absent() -> Self;
}

impl DirectiveValue for String {
    fn from_directive(value: &str) -> Self {
        value.to_string()
    }

    fn absent() -> Self {
        String::new()
    }
}

impl DirectiveValue for bool {
    const PRESENCE_ONLY: bool = true;

    fn from_directive(_value: &str) -> Self {
        true
    }

    fn absent() -> Self {
        false
    }
}

impl DirectiveValue for i64 {
    fn from_directive(value: &str) -> Self {
        value.parse().unwrap_or(0)
    }

    fn absent() -> Self {
        0
    }
}

/// One recognized directive with its trimmed value (possibly empty).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive<K> {
    pub key: K,
    pub value: String,
}

/// Split a payload on unescaped `/`, turning `//` into a literal `/`.
/// Empty segments are dropped.
pub(crate) fn split_segments(payload: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = payload.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '/' {
            current.push(c);
            continue;
        }
        if chars.peek() == Some(&'/') {
            chars.next();
            current.push('/');
            continue;
        }
        if !current.is_empty() {
            segments.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }

    segments
}

/// Split a raw segment into its lowercase leading token and the trimmed rest.
pub(crate) fn split_directive(segment: &str) -> (String, &str) {
    let segment = segment.trim_start();
    match segment.split_once(char::is_whitespace) {
        Some((name, rest)) => (name.to_lowercase(), rest.trim()),
        None => (segment.to_lowercase(), ""),
    }
}

/// Scan `segments` from the end and collect the directives of schema `K`.
///
/// The result is in scan order, so the last occurrence of a directive in the
/// payload comes first.
fn fold_directives<K: DirectiveKey>(mut segments: Vec<String>) -> Vec<Directive<K>> {
    segments.reverse();
    let mut directives = Vec::new();

    for index in 0..segments.len() {
        let (name, value) = split_directive(&segments[index]);
        match K::from_name(&name) {
            Some(key) => directives.push(Directive {
                key,
                value: value.to_string(),
            }),
            None => {
                // The first segment of the payload has nothing to fold into.
                if index + 1 < segments.len() {
                    let folded = format!("{}/{}", segments[index + 1], segments[index]);
                    segments[index + 1] = folded;
                }
            }
        }
    }

    directives
}

/// Lenient scan used by parsers that treat an empty payload as "no change".
pub fn scan<K: DirectiveKey>(payload: &str) -> Vec<Directive<K>> {
    fold_directives(split_segments(payload))
}

/// Typed access to the directives of one payload.
#[derive(Debug, Clone)]
pub struct PayloadDecoder<K> {
    directives: Vec<Directive<K>>,
}

impl<K: DirectiveKey> PayloadDecoder<K> {
    pub fn new(payload: &str) -> Result<Self, DecodeError> {
        let segments = split_segments(payload);
        if segments.is_empty() {
            return Err(DecodeError::EmptyPayload);
        }
        Ok(Self {
            directives: fold_directives(segments),
        })
    }

    /// Decode `key` as `T`.
    ///
    /// Absent directives yield `T::absent()`. A present directive with an
    /// empty value is an error unless `T` is a flag.
    pub fn decode<T: DirectiveValue>(&self, key: K) -> Result<T, DecodeError> {
        match self.directives.iter().find(|d| d.key == key) {
            None => Ok(T::absent()),
            Some(_) if T::PRESENCE_ONLY => Ok(T::from_directive("")),
            Some(d) if d.value.is_empty() => Err(DecodeError::MissingValue(key.name())),
            Some(d) => Ok(T::from_directive(&d.value)),
        }
    }

    /// Resolve a key by name, rejecting names outside the schema.
    pub fn key_named(&self, name: &str) -> Result<K, DecodeError> {
        K::from_name(&name.to_lowercase()).ok_or_else(|| DecodeError::UnknownKey(name.to_string()))
    }

    pub fn directives(&self) -> &[Directive<K>] {
        &self.directives
    }
}
