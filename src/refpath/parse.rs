//! Reference path parsing
//!
//! Grammar: `path := NAME (arrow NAME)+` with
//! `arrow := "(" NAME ")>"` (active) or `"<(" NAME ")"` (passive),
//! `NAME := [A-Za-z_][A-Za-z0-9_]*`.
//!
//! Validation is two-phase: whitespace is stripped and the character set is
//! checked first, so malformed paths fail with a clear character-level error
//! before any grammar matching.

use super::element::{PathElement, PathElementKind};
use super::{PathError, PathResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An ordered chain of path elements with a derived overall source and target.
///
/// Invariant: `elements[i].target == elements[i + 1].source`; guaranteed by
/// construction since consecutive elements share the class name between the
/// arrows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReferencePath {
    pub elements: Vec<PathElement>,
    /// First element's source class
    pub source: String,
    /// Last element's target class
    pub target: String,
}

impl ReferencePath {
    /// Parse a path string, greedily consuming one element at a time.
    pub fn parse(text: &str) -> PathResult<Self> {
        let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();

        // Phase 1: character filter
        for c in cleaned.chars() {
            if !(c.is_ascii_alphanumeric() || c == '_' || matches!(c, '(' | ')' | '<' | '>')) {
                return Err(PathError::InvalidCharacter {
                    path: text.to_string(),
                    found: c,
                });
            }
        }

        // Phase 2: grammar match
        let (source, mut rest) = take_name(&cleaned).ok_or_else(|| PathError::Format {
            path: text.to_string(),
            reason: "expected a class name at the start".to_string(),
        })?;

        let mut elements = Vec::new();
        let mut current_source = source.to_string();
        while !rest.is_empty() {
            let (element, remaining) = take_element(&current_source, rest)?;
            current_source = element.target.clone();
            elements.push(element);
            rest = remaining;
        }

        if elements.is_empty() {
            return Err(PathError::Format {
                path: text.to_string(),
                reason: "a path needs at least one hop".to_string(),
            });
        }

        let target = elements.last().map(|e| e.target.clone()).unwrap_or_default();
        Ok(Self {
            elements,
            source: source.to_string(),
            target,
        })
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl fmt::Display for ReferencePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)?;
        for element in &self.elements {
            match element.kind {
                PathElementKind::Active => write!(f, "({})>{}", element.slot, element.target)?,
                PathElementKind::Passive => write!(f, "<({}){}", element.slot, element.target)?,
            }
        }
        Ok(())
    }
}

impl TryFrom<String> for ReferencePath {
    type Error = PathError;

    fn try_from(s: String) -> PathResult<Self> {
        Self::parse(&s)
    }
}

impl From<ReferencePath> for String {
    fn from(path: ReferencePath) -> Self {
        path.to_string()
    }
}

/// Consume a leading NAME, returning it and the remaining input.
fn take_name(input: &str) -> Option<(&str, &str)> {
    let mut end = 0;
    for (i, c) in input.char_indices() {
        let valid = if i == 0 {
            c.is_ascii_alphabetic() || c == '_'
        } else {
            c.is_ascii_alphanumeric() || c == '_'
        };
        if !valid {
            break;
        }
        end = i + c.len_utf8();
    }
    if end == 0 {
        None
    } else {
        Some((&input[..end], &input[end..]))
    }
}

/// Consume one arrow-plus-target fragment, producing the element it encodes.
fn take_element<'a>(source: &str, input: &'a str) -> PathResult<(PathElement, &'a str)> {
    if let Some(rest) = input.strip_prefix("<(") {
        let (slot, rest) = take_name(rest).ok_or_else(|| element_error(input, "expected a slot name after '<('"))?;
        let rest = rest
            .strip_prefix(')')
            .ok_or_else(|| element_error(input, "expected ')' after the slot name"))?;
        let (target, rest) =
            take_name(rest).ok_or_else(|| element_error(input, "expected a class name after ')'"))?;
        Ok((PathElement::passive(source, slot, target), rest))
    } else if let Some(rest) = input.strip_prefix('(') {
        let (slot, rest) =
            take_name(rest).ok_or_else(|| element_error(input, "expected a slot name after '('"))?;
        let rest = rest
            .strip_prefix(")>")
            .ok_or_else(|| element_error(input, "expected ')>' after the slot name"))?;
        let (target, rest) = take_name(rest)
            .ok_or_else(|| element_error(input, "expected a class name after ')>'"))?;
        Ok((PathElement::active(source, slot, target), rest))
    } else {
        Err(element_error(input, "expected '(' or '<(' to start an arrow"))
    }
}

fn element_error(fragment: &str, reason: &str) -> PathError {
    PathError::Element {
        fragment: fragment.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_two_active_hops() {
        let path = ReferencePath::parse("A(x)>B(y)>C").unwrap();
        assert_eq!(path.len(), 2);
        assert_eq!(path.source, "A");
        assert_eq!(path.target, "C");
        assert_eq!(path.elements[0], PathElement::active("A", "x", "B"));
        assert_eq!(path.elements[1], PathElement::active("B", "y", "C"));
    }

    #[test]
    fn test_parse_passive_hop() {
        let path = ReferencePath::parse("B<(s)A").unwrap();
        assert_eq!(path.elements[0], PathElement::passive("B", "s", "A"));
        assert_eq!(path.source, "B");
        assert_eq!(path.target, "A");
    }

    #[test]
    fn test_parse_mixed_hops_chains_classes() {
        let path = ReferencePath::parse("File<(files)Sample(experiment)>Experiment").unwrap();
        assert_eq!(path.len(), 2);
        assert_eq!(path.elements[0].target, path.elements[1].source);
    }

    #[test]
    fn test_whitespace_is_stripped() {
        let path = ReferencePath::parse("A (x)> \n B").unwrap();
        assert_eq!(path.to_string(), "A(x)>B");
    }

    #[test]
    fn test_invalid_character_rejected_first() {
        let err = ReferencePath::parse("A-(x)>B").unwrap_err();
        assert!(matches!(err, PathError::InvalidCharacter { found: '-', .. }));
    }

    #[test]
    fn test_single_name_is_not_a_path() {
        let err = ReferencePath::parse("A").unwrap_err();
        assert!(matches!(err, PathError::Format { .. }));
    }

    #[test]
    fn test_malformed_arrow() {
        let err = ReferencePath::parse("A(x)B").unwrap_err();
        assert!(matches!(err, PathError::Element { .. }));
    }

    #[test]
    fn test_missing_target() {
        let err = ReferencePath::parse("A(x)>").unwrap_err();
        assert!(matches!(err, PathError::Element { .. }));
    }

    #[test]
    fn test_display_round_trip() {
        for text in ["A(x)>B", "B<(s)A", "A(x)>B<(y)C(z)>D"] {
            let path = ReferencePath::parse(text).unwrap();
            assert_eq!(path.to_string(), text);
            assert_eq!(ReferencePath::parse(&path.to_string()).unwrap(), path);
        }
    }
}
