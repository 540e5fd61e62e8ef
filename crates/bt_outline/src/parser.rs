//! Outline rendering and point extraction.
//!
//! `outline_text` flattens a node subtree into fixed-indent bullet text;
//! `parse_section` reads that text back as ordered points. The indirection
//! keeps the point rules (main line vs sub-line, discard on empty main)
//! independent of the tree encoding.

use std::collections::HashMap;

use bt_core::signature;
use bt_core::types::{Node, Point, Section};

use crate::strip_markup;

const INDENT: &str = "  ";

#[derive(Debug, Clone)]
pub struct ParsedSection {
    pub section: Section,
    pub title: Option<String>,
    pub points: Vec<Point>,
}

/// Renders the children of `root_id` as bullet text, `# <root name>` first.
/// Children at depth 0 become main lines, everything deeper becomes
/// sub-lines; node notes are emitted as lines one level below their node.
pub fn outline_text(nodes: &[Node], root_id: &str) -> String {
    let mut children: HashMap<&str, Vec<&Node>> = HashMap::new();
    for node in nodes {
        if let Some(parent) = node.parent_id.as_deref() {
            children.entry(parent).or_default().push(node);
        }
    }
    for siblings in children.values_mut() {
        siblings.sort_by_key(|n| n.order);
    }

    let mut out = String::new();
    if let Some(root) = nodes.iter().find(|n| n.id == root_id) {
        let title = strip_markup(&root.name);
        let title = title.trim();
        if !title.is_empty() {
            out.push_str(&format!("# {}\n", title));
        }
    }
    if let Some(top) = children.get(root_id) {
        for node in top {
            render_node(node, 0, &children, &mut out);
        }
    }
    out
}

fn render_node(node: &Node, depth: usize, children: &HashMap<&str, Vec<&Node>>, out: &mut String) {
    let name = strip_markup(&node.name);
    out.push_str(&format!("{}- {}\n", INDENT.repeat(depth), name.trim()));
    if let Some(note) = &node.note {
        for line in strip_markup(note).lines() {
            let line = line.trim();
            if !line.is_empty() {
                out.push_str(&format!("{}- {}\n", INDENT.repeat(depth + 1), line));
            }
        }
    }
    if let Some(kids) = children.get(node.id.as_str()) {
        for kid in kids {
            render_node(kid, depth + 1, children, out);
        }
    }
}

/// Scans bullet text into points. Zero-indent lines open a new point, deeper
/// lines attach as sub-points; a point whose main content is empty after
/// trimming is discarded, never emitted.
pub fn parse_section(text: &str, section: Section) -> ParsedSection {
    let mut title = None;
    let mut points: Vec<Point> = Vec::new();
    let mut current: Option<(String, Vec<String>)> = None;

    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let trimmed = line.trim_start();
        if trimmed.starts_with('#') && title.is_none() && points.is_empty() && current.is_none() {
            let header = trimmed.trim_start_matches('#').trim();
            if !header.is_empty() {
                title = Some(header.to_string());
            }
            continue;
        }

        let indent = line.len() - trimmed.len();
        let content = strip_bullet(trimmed).trim();

        if indent == 0 {
            flush(&mut points, current.take(), section);
            current = Some((content.to_string(), Vec::new()));
        } else if let Some((_, subs)) = current.as_mut() {
            if !content.is_empty() {
                subs.push(content.to_string());
            }
        }
        // sub-line with no open point: dropped
    }
    flush(&mut points, current.take(), section);

    ParsedSection {
        section,
        title,
        points,
    }
}

fn strip_bullet(line: &str) -> &str {
    line.strip_prefix("- ")
        .or_else(|| line.strip_prefix("* "))
        .or_else(|| line.strip_prefix('-'))
        .or_else(|| line.strip_prefix('*'))
        .unwrap_or(line)
}

fn flush(points: &mut Vec<Point>, pending: Option<(String, Vec<String>)>, section: Section) {
    let Some((main, subs)) = pending else {
        return;
    };
    let main = main.trim();
    if main.is_empty() {
        return;
    }
    points.push(Point {
        content_signature: signature::signature(main, &subs),
        main_content: main.to_string(),
        sub_points: subs,
        section,
        point_number: points.len() + 1,
    });
}
