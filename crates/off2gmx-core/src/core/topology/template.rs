//! # Topology Template Splicing
//!
//! ## Overview
//!
//! Inserts generated rows into user-supplied GROMACS topology templates.
//! Sections are recognized by their `[ keyword ]` header line; a section
//! body runs to the first blank line or the next header. Generated rows
//! are appended after any rows the template already carries, so template
//! content always stays ahead of generated content. Lines whose first
//! non-blank character is `;` are comments and never match as headers.

use super::TopologyError;
use super::bonded::MoleculeSections;

/// The section keyword when `line` is an uncommented `[ keyword ]` header.
fn header_keyword(line: &str) -> Option<&str> {
    let inner = line.trim_start().strip_prefix('[')?;
    let end = inner.find(']')?;
    Some(inner[..end].trim())
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn is_body_line(line: &str) -> bool {
    !is_blank(line) && header_keyword(line).is_none()
}

/// Splices rendered pair rows into the `[ nonbond_params ]` section of a
/// topology template.
///
/// The rows land after the section's existing lines, before the blank
/// line (or end of input) that terminates it. Only the first uncommented
/// section is filled.
///
/// # Errors
///
/// Fails when the template has no uncommented `[ nonbond_params ]`
/// section.
pub fn splice_nonbond_params(template: &str, rendered: &str) -> Result<String, TopologyError> {
    let mut out = String::new();
    let mut lines = template.lines().peekable();
    let mut spliced = false;

    while let Some(line) = lines.next() {
        out.push_str(line);
        out.push('\n');
        if spliced || header_keyword(line) != Some("nonbond_params") {
            continue;
        }
        while let Some(row) = lines.next_if(|line| is_body_line(line)) {
            out.push_str(row);
            out.push('\n');
        }
        out.push_str(rendered);
        spliced = true;
    }

    if spliced {
        Ok(out)
    } else {
        Err(TopologyError::MissingSection {
            section: "nonbond_params".to_string(),
        })
    }
}

/// Splices per-molecule bonded rows into each matching `[ moleculetype ]`
/// block of a topology template.
///
/// A block matches when one of its comment-stripped body tokens equals a
/// rendered molecule name; the first matching molecule in `molecules`
/// wins. Within a matched block every following section receives the
/// rendered body for its keyword, after the template's own rows. The
/// block ends at the next `[ moleculetype ]`, `[ system ]`, or
/// `[ molecules ]` header. Unmatched blocks, and molecules the template
/// never names, pass through untouched.
pub fn splice_moleculetypes(template: &str, molecules: &[(String, MoleculeSections)]) -> String {
    let mut out = String::new();
    let mut lines = template.lines().peekable();
    let mut active: Option<&MoleculeSections> = None;

    while let Some(line) = lines.next() {
        out.push_str(line);
        out.push('\n');
        let Some(keyword) = header_keyword(line) else {
            continue;
        };
        match keyword {
            "moleculetype" => {
                let mut tokens: Vec<&str> = Vec::new();
                while let Some(row) = lines.next_if(|line| is_body_line(line)) {
                    let content = row.split_once(';').map_or(row, |(data, _)| data);
                    tokens.extend(content.split_whitespace());
                    out.push_str(row);
                    out.push('\n');
                }
                active = molecules
                    .iter()
                    .find(|(name, _)| tokens.contains(&name.as_str()))
                    .map(|(_, sections)| sections);
            }
            "system" | "molecules" => active = None,
            _ => {
                while let Some(row) = lines.next_if(|line| is_body_line(line)) {
                    out.push_str(row);
                    out.push('\n');
                }
                if let Some(body) = active.and_then(|sections| sections.section(keyword)) {
                    out.push_str(body);
                }
            }
        }
    }
    out
}
