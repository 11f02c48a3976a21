//! Parser for `uiautomator dump` output
//!
//! The dump is flat, attribute-only XML (`<hierarchy>` root, nested `<node .../>`
//! elements, no text content), so a tag scanner is enough.

use std::sync::LazyLock;

use regex::Regex;

use super::types::{Attributes, HierarchyNode};
use super::HierarchyError;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<(/?)([A-Za-z_][\w.\-]*)((?:\s+[^\s=/>]+\s*=\s*"[^"]*")*)\s*(/?)>"#)
        .expect("tag regex is valid")
});

static ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([^\s=]+)\s*=\s*"([^"]*)""#).expect("attribute regex is valid"));

struct OpenNode {
    tag: String,
    attributes: Attributes,
    children: Vec<HierarchyNode>,
}

/// Parse a raw dump into a tree. Attributes keep their document order.
pub fn parse_dump(raw: &str) -> Result<HierarchyNode, HierarchyError> {
    let mut stack: Vec<OpenNode> = Vec::new();
    let mut root: Option<HierarchyNode> = None;

    for captures in TAG_RE.captures_iter(raw) {
        let closing = !captures[1].is_empty();
        let tag = captures[2].to_string();
        let self_closing = !captures[4].is_empty();

        if closing {
            let open = stack.pop().ok_or_else(|| HierarchyError::MismatchedTag {
                expected: String::new(),
                found: tag.clone(),
            })?;
            if open.tag != tag {
                return Err(HierarchyError::MismatchedTag {
                    expected: open.tag,
                    found: tag,
                });
            }
            let node = HierarchyNode::from_parts(open.tag, open.attributes, open.children);
            attach(&mut stack, &mut root, node)?;
            continue;
        }

        let attributes = parse_attributes(&captures[3]);
        if self_closing {
            attach(&mut stack, &mut root, HierarchyNode::from_parts(tag, attributes, Vec::new()))?;
        } else {
            stack.push(OpenNode {
                tag,
                attributes,
                children: Vec::new(),
            });
        }
    }

    if let Some(open) = stack.pop() {
        return Err(HierarchyError::UnclosedTag(open.tag));
    }
    root.ok_or(HierarchyError::EmptyDump)
}

fn attach(
    stack: &mut [OpenNode],
    root: &mut Option<HierarchyNode>,
    node: HierarchyNode,
) -> Result<(), HierarchyError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None if root.is_none() => *root = Some(node),
        None => return Err(HierarchyError::MultipleRoots),
    }
    Ok(())
}

fn parse_attributes(raw: &str) -> Attributes {
    ATTR_RE
        .captures_iter(raw)
        .map(|c| (c[1].to_string(), unescape(&c[2])))
        .collect()
}

/// Resolve the predefined XML entities and numeric character references
fn unescape(value: &str) -> String {
    if !value.contains('&') {
        return value.to_string();
    }

    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let decoded = tail.find(';').and_then(|end| {
            let entity = &tail[1..end];
            let ch = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => entity
                    .strip_prefix("#x")
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                    .and_then(char::from_u32),
            };
            ch.map(|c| (c, end))
        });

        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
