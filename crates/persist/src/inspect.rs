//! Read-only outline of an encoded stream, for tooling and debugging.
//!
//! Works without any field tables or registered types: every record is
//! described from its header alone.

use std::fmt::{self, Write as _};
use std::ops::Range;

use serde::Serialize;

use crate::config::CodecConfig;
use crate::error::PersistError;
use crate::scanner::{Record, Scanner};
use crate::tag::Tag;

/// One record of the outline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlineNode {
    pub offset: usize,
    pub tag: String,
    pub name_hash: i32,
    /// Start record of a compound; its End record is folded into it.
    pub compound: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extents: Option<Vec<u8>>,
    /// Scalar value, formatted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<OutlineNode>,
}

/// Totals over a whole outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OutlineSummary {
    pub records: usize,
    pub compounds: usize,
    pub max_depth: usize,
}

impl fmt::Display for OutlineSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "records={} compounds={} max_depth={}",
            self.records, self.compounds, self.max_depth
        )
    }
}

/// Outline every record in `bytes`, descending into compounds.
pub fn outline(bytes: &[u8], config: &CodecConfig) -> Result<Vec<OutlineNode>, PersistError> {
    outline_range(bytes, 0..bytes.len(), config, 0)
}

fn outline_range(
    bytes: &[u8],
    range: Range<usize>,
    config: &CodecConfig,
    depth: usize,
) -> Result<Vec<OutlineNode>, PersistError> {
    Scanner::new(bytes, range)
        .map(|record| describe(bytes, &record?, config, depth))
        .collect()
}

fn describe(
    bytes: &[u8],
    record: &Record,
    config: &CodecConfig,
    depth: usize,
) -> Result<OutlineNode, PersistError> {
    let mut node = OutlineNode {
        offset: record.offset,
        tag: record.tag.to_string(),
        name_hash: record.name_hash,
        compound: record.is_compound(),
        identity: None,
        category: None,
        extents: None,
        value: None,
        children: Vec::new(),
    };
    let mut payload = record.payload(bytes);
    match record.tag {
        Tag::Byte => node.value = Some(payload.u8()?.to_string()),
        Tag::Int => node.value = Some(payload.i32()?.to_string()),
        Tag::UInt => node.value = Some(payload.u32()?.to_string()),
        Tag::Double => node.value = Some(payload.f64()?.to_string()),
        Tag::Text => node.value = Some(format!("{:?}", payload.str(config.max_string_len)?)),
        Tag::Vector3 => {
            let v = payload.vec3()?;
            node.value = Some(format!("({}, {}, {})", v.x, v.y, v.z));
        }
        Tag::ClassStart | Tag::ListStart | Tag::EnumStart => {
            node.identity = Some(payload.str(config.max_string_len)?.to_string());
        }
        Tag::ArrayStart => {
            node.identity = Some(payload.str(config.max_string_len)?.to_string());
            let rank = payload.u8()?;
            node.extents = Some((0..rank).map(|_| payload.u8()).collect::<Result<_, _>>()?);
        }
        Tag::WrapperStart => node.category = Some(payload.u8()?),
        _ => {}
    }
    if node.compound {
        if depth >= config.max_depth {
            return Err(PersistError::NestingTooDeep {
                limit: config.max_depth,
            });
        }
        node.children = outline_range(bytes, record.inner.clone(), config, depth + 1)?;
    }
    Ok(node)
}

/// Count records and measure nesting across an outline.
pub fn summarize(nodes: &[OutlineNode]) -> OutlineSummary {
    fn walk(nodes: &[OutlineNode], depth: usize, summary: &mut OutlineSummary) {
        for node in nodes {
            summary.records += 1;
            if node.compound {
                summary.compounds += 1;
                summary.max_depth = summary.max_depth.max(depth + 1);
            }
            walk(&node.children, depth + 1, summary);
        }
    }
    let mut summary = OutlineSummary {
        records: 0,
        compounds: 0,
        max_depth: 0,
    };
    walk(nodes, 0, &mut summary);
    summary
}

/// Indented, one-line-per-record text rendering.
pub fn render(nodes: &[OutlineNode]) -> String {
    fn line(out: &mut String, node: &OutlineNode, indent: usize) {
        let _ = write!(
            out,
            "{:indent$}{} #{:08x} @{}",
            "",
            node.tag,
            node.name_hash as u32,
            node.offset,
            indent = indent * 2
        );
        if let Some(category) = node.category {
            let _ = write!(out, " category={category}");
        }
        if let Some(identity) = &node.identity {
            let _ = write!(out, " <{identity}>");
        }
        if let Some(extents) = &node.extents {
            let _ = write!(out, " {extents:?}");
        }
        if let Some(value) = &node.value {
            let _ = write!(out, " = {value}");
        }
        out.push('\n');
        for child in &node.children {
            line(out, child, indent + 1);
        }
    }
    let mut out = String::new();
    for node in nodes {
        line(&mut out, node, 0);
    }
    out
}

pub fn to_json(nodes: &[OutlineNode]) -> Result<String, PersistError> {
    Ok(serde_json::to_string_pretty(nodes)?)
}
