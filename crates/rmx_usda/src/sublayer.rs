//! Sublayer stitching for an existing root layer.
//!
//! The root layer (usually the mod's `mod.usda`) may be hand-authored or
//! written by the Remix toolkit, so it is edited as text: only the
//! `subLayers = [...]` entry of the layer header is rewritten and every other
//! byte of the file is preserved. Existing entries keep their order and their
//! exact text (including layer offsets); new references are appended.

use std::ops::Range;

use camino::{Utf8Path, Utf8PathBuf};
use itertools::Itertools;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::writer::{write_document, WriteOutcome};

const SUBLAYERS_KEY: &str = "subLayers";
const INDENT: &str = "    ";

/// One entry of a `subLayers` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SublayerEntry {
    /// Entry text as authored, e.g. `@./mod_normal.usda@ (offset = 10)`.
    pub raw: String,
    /// The asset path between the `@` delimiters.
    pub path: String,
    /// `#` comments on the lines above the entry.
    pub leading: Vec<String>,
    /// `#` comments after the entry, the first one on the entry's line.
    pub trailing: Vec<String>,
}

impl SublayerEntry {
    fn new(path: &str) -> Self {
        Self {
            raw: format!("@{}@", path),
            path: path.to_string(),
            leading: Vec::new(),
            trailing: Vec::new(),
        }
    }
}

/// Where the sublayer list lives, or where a new one has to go.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ListSite {
    /// Existing `[ ... ]` list, brackets included.
    Existing { span: Range<usize>, indent: String },
    /// Header without `subLayers`; insert a new entry at this offset.
    MissingEntry { at: usize, needs_newline: bool },
    /// No header block at all; insert one at this offset.
    MissingHeader { at: usize, needs_newline: bool },
}

/// A parsed root layer whose sublayer list can be extended in place.
#[derive(Debug, Clone)]
pub struct RootLayer {
    text: String,
    site: ListSite,
    entries: Vec<SublayerEntry>,
    /// Comments after the last entry.
    tail: Vec<String>,
}

impl RootLayer {
    pub fn parse(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        let bytes = text.as_bytes();

        if !text.starts_with("#usda") {
            return Err(Error::MalformedLayer(
                "missing '#usda' magic line".to_string(),
            ));
        }

        let first_line_end = match text.find('\n') {
            Some(idx) => idx + 1,
            None => text.len(),
        };

        let header_open = skip_trivia(bytes, first_line_end);
        if bytes.get(header_open) != Some(&b'(') {
            return Ok(Self {
                site: ListSite::MissingHeader {
                    at: first_line_end,
                    needs_newline: !text[..first_line_end].ends_with('\n'),
                },
                entries: Vec::new(),
                tail: Vec::new(),
                text,
            });
        }

        let header_close = find_closing(bytes, header_open).ok_or_else(|| {
            Error::MalformedLayer("unterminated layer header".to_string())
        })?;

        let (site, entries, tail) = match find_sublayers(bytes, header_open + 1, header_close)? {
            Some(span) => {
                let (entries, tail) = parse_entries(&text, span.start + 1, span.end - 1)?;
                let indent = line_indent(&text, span.start);
                (ListSite::Existing { span, indent }, entries, tail)
            }
            None => {
                let line_start = text[..header_close].rfind('\n').map_or(0, |idx| idx + 1);
                let only_ws_before = text[line_start..header_close]
                    .chars()
                    .all(|c| c == ' ' || c == '\t');
                let site = if only_ws_before && line_start > header_open {
                    ListSite::MissingEntry {
                        at: line_start,
                        needs_newline: false,
                    }
                } else {
                    ListSite::MissingEntry {
                        at: header_close,
                        needs_newline: true,
                    }
                };
                (site, Vec::new(), Vec::new())
            }
        };

        Ok(Self {
            text,
            site,
            entries,
            tail,
        })
    }

    /// Current sublayer asset paths, in composition order.
    pub fn sublayers(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.path.as_str()).collect()
    }

    pub fn entries(&self) -> &[SublayerEntry] {
        &self.entries
    }

    pub fn contains(&self, path: &str) -> bool {
        let wanted = normalize(path);
        self.entries
            .iter()
            .any(|entry| normalize(&entry.path) == wanted)
    }

    /// Append `paths` that are not listed yet, preserving order.
    ///
    /// Returns the paths that were actually appended.
    pub fn append(&mut self, paths: &[String]) -> Result<Vec<String>> {
        let appended: Vec<String> = paths
            .iter()
            .filter(|path| !self.contains(path))
            .unique_by(|path| normalize(path))
            .cloned()
            .collect();
        if appended.is_empty() {
            return Ok(appended);
        }

        let mut entries = self.entries.clone();
        entries.extend(appended.iter().map(|path| SublayerEntry::new(path)));

        let text = match &self.site {
            ListSite::Existing { span, indent } => format!(
                "{}{}{}",
                &self.text[..span.start],
                render_list(&entries, &self.tail, indent),
                &self.text[span.end..]
            ),
            ListSite::MissingEntry { at, needs_newline } => format!(
                "{}{}{}{} = {}\n{}",
                &self.text[..*at],
                if *needs_newline { "\n" } else { "" },
                INDENT,
                SUBLAYERS_KEY,
                render_list(&entries, &self.tail, INDENT),
                &self.text[*at..]
            ),
            ListSite::MissingHeader { at, needs_newline } => format!(
                "{}{}(\n{}{} = {}\n)\n{}",
                &self.text[..*at],
                if *needs_newline { "\n" } else { "" },
                INDENT,
                SUBLAYERS_KEY,
                render_list(&entries, &self.tail, INDENT),
                &self.text[*at..]
            ),
        };

        *self = Self::parse(text)?;
        Ok(appended)
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

/// Result of [`stitch_sublayers`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StitchOutcome {
    pub root: Utf8PathBuf,
    /// References appended to the root's sublayer list.
    pub appended: Vec<String>,
    /// `Some` only if the root layer was rewritten.
    pub write: Option<WriteOutcome>,
}

/// Append references to every existing `candidates` document to the root
/// layer's sublayer list.
///
/// Candidates that do not exist on disk or are already listed are skipped.
/// The root is only rewritten when something was appended, so stitching is
/// idempotent.
pub fn stitch_sublayers(root: &Utf8Path, candidates: &[Utf8PathBuf]) -> Result<StitchOutcome> {
    if !root.as_std_path().is_file() {
        return Err(Error::RootDocumentMissing(root.to_path_buf()));
    }

    let root_dir = root.parent().unwrap_or(Utf8Path::new(""));
    let references: Vec<String> = candidates
        .iter()
        .filter(|candidate| {
            let exists = candidate.as_std_path().is_file();
            if !exists {
                tracing::debug!("Not stitching {}: file does not exist", candidate);
            }
            exists
        })
        .map(|candidate| layer_reference(root_dir, candidate))
        .collect();

    let text = std::fs::read_to_string(root.as_std_path())?;
    let mut layer = RootLayer::parse(text)?;
    let appended = layer.append(&references)?;

    let write = if appended.is_empty() {
        tracing::info!("Sublayers of {} already up to date", root);
        None
    } else {
        for reference in &appended {
            tracing::info!("Stitched {} into {}", reference, root);
        }
        Some(write_document(root, layer.as_str())?)
    };

    Ok(StitchOutcome {
        root: root.to_path_buf(),
        appended,
        write,
    })
}

/// Path of `layer` as referenced from a layer in `root_dir`.
fn layer_reference(root_dir: &Utf8Path, layer: &Utf8Path) -> String {
    match layer.strip_prefix(root_dir) {
        Ok(relative) if relative.is_relative() && !relative.as_str().is_empty() => {
            format!("./{}", relative.as_str().replace('\\', "/"))
        }
        _ => layer.as_str().replace('\\', "/"),
    }
}

fn normalize(path: &str) -> String {
    let path = path.replace('\\', "/");
    path.strip_prefix("./").unwrap_or(&path).to_string()
}

/// One entry per line, separators ahead of any trailing comment.
fn render_list(entries: &[SublayerEntry], tail: &[String], indent: &str) -> String {
    let inner = format!("{}{}", indent, INDENT);
    let mut out = String::from("[\n");
    for (idx, entry) in entries.iter().enumerate() {
        for comment in &entry.leading {
            out.push_str(&format!("{}{}\n", inner, comment));
        }
        out.push_str(&inner);
        out.push_str(&entry.raw);
        if idx + 1 < entries.len() {
            out.push(',');
        }
        let mut trailing = entry.trailing.iter();
        if let Some(first) = trailing.next() {
            out.push(' ');
            out.push_str(first);
        }
        out.push('\n');
        for comment in trailing {
            out.push_str(&format!("{}{}\n", inner, comment));
        }
    }
    for comment in tail {
        out.push_str(&format!("{}{}\n", inner, comment));
    }
    out.push_str(indent);
    out.push(']');
    out
}

/// Leading whitespace of the line containing `pos`.
fn line_indent(text: &str, pos: usize) -> String {
    let line_start = text[..pos].rfind('\n').map_or(0, |idx| idx + 1);
    text[line_start..pos]
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .collect()
}

/// Find the `[ ... ]` span of a top-level `subLayers` entry inside the header.
fn find_sublayers(bytes: &[u8], start: usize, end: usize) -> Result<Option<Range<usize>>> {
    let mut i = start;
    while i < end {
        let b = bytes[i];
        if b == b'(' || b == b'[' || b == b'{' {
            i = find_closing(bytes, i)
                .ok_or_else(|| Error::MalformedLayer("unbalanced brackets in header".to_string()))?
                + 1;
            continue;
        }
        if is_ident_start(b) {
            let ident_end = scan_ident(bytes, i);
            if &bytes[i..ident_end] == SUBLAYERS_KEY.as_bytes() {
                let eq = skip_trivia(bytes, ident_end);
                if bytes.get(eq) != Some(&b'=') {
                    return Err(Error::MalformedLayer(
                        "expected '=' after subLayers".to_string(),
                    ));
                }
                let open = skip_trivia(bytes, eq + 1);
                if bytes.get(open) != Some(&b'[') {
                    return Err(Error::MalformedLayer(
                        "expected '[' after subLayers =".to_string(),
                    ));
                }
                let close = find_closing(bytes, open).ok_or_else(|| {
                    Error::MalformedLayer("unterminated subLayers list".to_string())
                })?;
                return Ok(Some(open..close + 1));
            }
            i = ident_end;
            continue;
        }
        i = skip_token(bytes, i);
    }
    Ok(None)
}

/// Split the list body `text[start..end]` into entries at top-level commas.
///
/// Comments are kept apart from the entry text. A comment on the line of the
/// separating comma belongs to the entry before it. Comments on the lines
/// after the last entry are returned as the list's tail.
fn parse_entries(
    text: &str,
    start: usize,
    end: usize,
) -> Result<(Vec<SublayerEntry>, Vec<String>)> {
    let bytes = text.as_bytes();
    let mut entries: Vec<SublayerEntry> = Vec::new();
    let mut pending: Vec<String> = Vec::new();
    let mut segment_start = start;
    let mut body: Option<Range<usize>> = None;
    let mut trailing: Vec<String> = Vec::new();
    // Comments after the body on later lines.
    let mut detached: Vec<String> = Vec::new();
    let mut i = start;

    let flush = |body: Option<Range<usize>>,
                 trailing: Vec<String>,
                 pending: &mut Vec<String>,
                 entries: &mut Vec<SublayerEntry>|
     -> Result<()> {
        let Some(body) = body else {
            return Ok(());
        };
        let raw = &text[body];
        let path = first_asset_path(raw).ok_or_else(|| {
            Error::MalformedLayer(format!("sublayer entry without asset path: {}", raw))
        })?;
        entries.push(SublayerEntry {
            raw: raw.to_string(),
            path,
            leading: std::mem::take(pending),
            trailing,
        });
        Ok(())
    };

    while i < end {
        match bytes[i] {
            b' ' | b'\t' | b'\r' | b'\n' => i += 1,
            b'#' => {
                let comment_end = skip_token(bytes, i).min(end);
                let comment = text[i..comment_end].trim_end().to_string();
                if let Some(range) = &body {
                    if trailing.is_empty() && !text[range.end..i].contains('\n') {
                        trailing.push(comment);
                    } else {
                        detached.push(comment);
                    }
                } else if !text[segment_start..i].contains('\n') && !entries.is_empty() {
                    if let Some(previous) = entries.last_mut() {
                        previous.trailing.push(comment);
                    }
                } else {
                    pending.push(comment);
                }
                i = comment_end;
            }
            b',' => {
                trailing.append(&mut detached);
                flush(body.take(), std::mem::take(&mut trailing), &mut pending, &mut entries)?;
                i += 1;
                segment_start = i;
            }
            b => {
                let token_end = if closing_for(b).is_some() {
                    find_closing(bytes, i).ok_or_else(|| {
                        Error::MalformedLayer("unbalanced brackets in subLayers".to_string())
                    })? + 1
                } else {
                    skip_token(bytes, i)
                };
                if !trailing.is_empty() || !detached.is_empty() {
                    return Err(Error::MalformedLayer(format!(
                        "missing ',' before {}",
                        &text[i..token_end.min(end)]
                    )));
                }
                let token_end = token_end.min(end);
                body = Some(match body {
                    Some(range) => range.start..token_end,
                    None => i..token_end,
                });
                i = token_end;
            }
        }
    }
    flush(body, trailing, &mut pending, &mut entries)?;
    pending.append(&mut detached);

    Ok((entries, pending))
}

fn first_asset_path(raw: &str) -> Option<String> {
    if let Some(rest) = raw.strip_prefix("@@@") {
        let end = rest.find("@@@")?;
        return Some(rest[..end].to_string());
    }
    let rest = raw.strip_prefix('@')?;
    let end = rest.find('@')?;
    Some(rest[..end].to_string())
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn scan_ident(bytes: &[u8], start: usize) -> usize {
    let mut i = start;
    while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_' || bytes[i] == b':') {
        i += 1;
    }
    i
}

/// Skip whitespace and `#` comments.
fn skip_trivia(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() {
        match bytes[i] {
            b' ' | b'\t' | b'\r' | b'\n' => i += 1,
            b'#' => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            _ => break,
        }
    }
    i
}

/// Index just past the string, asset path or comment starting at `i`, or
/// `i + 1` for any other byte.
fn skip_token(bytes: &[u8], i: usize) -> usize {
    match bytes[i] {
        quote @ (b'"' | b'\'') => {
            if bytes[i..].starts_with(&[quote; 3]) {
                find_seq(bytes, i + 3, &[quote; 3]).map_or(bytes.len(), |end| end + 3)
            } else {
                let mut j = i + 1;
                while j < bytes.len() {
                    match bytes[j] {
                        b'\\' => j += 2,
                        b if b == quote => return j + 1,
                        b'\n' => return j,
                        _ => j += 1,
                    }
                }
                bytes.len()
            }
        }
        b'@' => {
            if bytes[i..].starts_with(b"@@@") {
                find_seq(bytes, i + 3, b"@@@").map_or(bytes.len(), |end| end + 3)
            } else {
                find_seq(bytes, i + 1, b"@").map_or(bytes.len(), |end| end + 1)
            }
        }
        b'#' => {
            let mut j = i;
            while j < bytes.len() && bytes[j] != b'\n' {
                j += 1;
            }
            j
        }
        _ => i + 1,
    }
}

fn find_seq(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if from >= bytes.len() {
        return None;
    }
    bytes[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| pos + from)
}

/// Index of the bracket closing the one at `open`.
fn find_closing(bytes: &[u8], open: usize) -> Option<usize> {
    let mut stack = vec![closing_for(bytes[open])?];
    let mut i = open + 1;
    while i < bytes.len() {
        let b = bytes[i];
        if let Some(close) = closing_for(b) {
            stack.push(close);
            i += 1;
            continue;
        }
        if b == b')' || b == b']' || b == b'}' {
            if stack.pop() != Some(b) {
                return None;
            }
            if stack.is_empty() {
                return Some(i);
            }
            i += 1;
            continue;
        }
        i = skip_token(bytes, i);
    }
    None
}

fn closing_for(b: u8) -> Option<u8> {
    match b {
        b'(' => Some(b')'),
        b'[' => Some(b']'),
        b'{' => Some(b'}'),
        _ => None,
    }
}
