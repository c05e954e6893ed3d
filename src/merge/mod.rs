//! The overlay merge engine
//!
//! Transforms customize documents by merging a partial patch onto them and
//! then deleting fields explicitly. Both halves live here:
//!
//! - [`overlay`]: deep merge of a patch onto a target, with sequences merged
//!   by element identity (`name` or `metadata.name`) when every element on
//!   both sides has one, and replaced wholesale otherwise.
//! - [`unset`]: removal of values at structured paths, silently skipping
//!   paths that do not resolve.
//!
//! ## Paths
//!
//! Unset paths are configured as strings such as
//! `spec.template.spec.containers[0].resources` and parsed into
//! [`PathSegment`]s with [`parse_path`].

pub mod overlay;
pub mod unset;

pub use overlay::{merge, merge_with, ArrayMergeMode};
pub use unset::{unset, unset_path};

/// A segment in a path through a document tree
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathSegment {
    /// A mapping key
    Key(String),
    /// A sequence index
    Index(usize),
}

/// A parsed path: the ordered segments from the document root.
pub type FieldPath = Vec<PathSegment>;

/// Parse a path string into segments
///
/// Supports:
/// - Dot notation: `spec.template.spec`
/// - Array indices: `containers[0]` or `containers[1].env`
/// - Quoted keys: `annotations["prometheus.io/port"]` or `data['a.b']`
/// - Escaped dots: `data.tls\.crt`
///
/// # Examples
///
/// ```
/// use manifest_customizer::merge::{parse_path, PathSegment};
///
/// let segments = parse_path("spec.containers[0].resources");
/// assert_eq!(segments.len(), 4);
/// assert_eq!(segments[2], PathSegment::Index(0));
/// ```
pub fn parse_path(path: &str) -> FieldPath {
    let mut segments = Vec::new();
    if path.trim().is_empty() {
        return segments;
    }

    let mut current = String::new();
    let mut chars = path.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            '.' => flush_key(&mut current, &mut segments),
            '[' => {
                flush_key(&mut current, &mut segments);
                if let Some(segment) = parse_bracket(&mut chars) {
                    segments.push(segment);
                }
            }
            _ => current.push(ch),
        }
    }
    flush_key(&mut current, &mut segments);

    segments
}

fn flush_key(current: &mut String, segments: &mut FieldPath) {
    if !current.is_empty() {
        segments.push(PathSegment::Key(std::mem::take(current)));
    }
}

/// Parse the inside of `[...]`, consuming the closing bracket.
fn parse_bracket(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<PathSegment> {
    let quote = match chars.peek() {
        Some(&q) if q == '"' || q == '\'' => {
            chars.next();
            Some(q)
        }
        _ => None,
    };

    let mut content = String::new();
    match quote {
        Some(quote) => {
            while let Some(ch) = chars.next() {
                if ch == '\\' {
                    if let Some(escaped) = chars.next() {
                        content.push(escaped);
                    }
                } else if ch == quote && chars.peek() == Some(&']') {
                    chars.next();
                    break;
                } else {
                    content.push(ch);
                }
            }
            if content.is_empty() {
                None
            } else {
                Some(PathSegment::Key(content))
            }
        }
        None => {
            for ch in chars.by_ref() {
                if ch == ']' {
                    break;
                }
                content.push(ch);
            }
            let content = content.trim();
            if let Ok(idx) = content.parse::<usize>() {
                Some(PathSegment::Index(idx))
            } else if content.is_empty() {
                None
            } else {
                Some(PathSegment::Key(content.to_string()))
            }
        }
    }
}
