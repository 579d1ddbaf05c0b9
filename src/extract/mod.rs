//! Decompression, loading and typed accessors for supplier XML files.
//!
//! Tag names in these files carry no useful casing information (the
//! meaningful content is Hebrew), so the whole document is lowercased
//! before parsing — this is cheaper and exactly as safe as the original's
//! "serialize back to a string, lowercase it, re-parse" trick, without the
//! extra round trip through a second tree.

pub mod unit;

use crate::grammar;
use once_cell::sync::Lazy;
use regex::Regex;
use roxmltree::{Document, Node};
use rust_decimal::Decimal;
use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unrecognized file extension for {0}")]
    UnknownExtension(PathBuf),
    #[error("no entry in zip archive {0} matched the filename grammar")]
    NoMatchingZipEntry(PathBuf),
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("zip archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("xml parse error: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("could not decode {0} as UTF-16 or UTF-8")]
    Decode(PathBuf),
}

/// Loads and decompresses a supplier file into its raw (not yet
/// case-folded) XML text, dispatching purely on file extension.
pub fn load_raw_xml(path: &Path) -> Result<String, ExtractError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("gz") => load_gz(path),
        Some("zip") => load_zip(path),
        Some("xml") => load_plain_xml(path),
        _ => Err(ExtractError::UnknownExtension(path.to_path_buf())),
    }
}

fn load_gz(path: &Path) -> Result<String, ExtractError> {
    let file = File::open(path).map_err(|source| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut decoder = flate2::read::GzDecoder::new(file);
    let mut bytes = Vec::new();
    decoder
        .read_to_end(&mut bytes)
        .map_err(|source| ExtractError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    decode_bytes(path, &bytes)
}

fn load_zip(path: &Path) -> Result<String, ExtractError> {
    let file = File::open(path).map_err(|source| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut archive = zip::ZipArchive::new(file)?;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let name = entry.name().to_string();
        if grammar::parse(&name).is_some() {
            let mut bytes = Vec::new();
            entry
                .read_to_end(&mut bytes)
                .map_err(|source| ExtractError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
            return decode_bytes(path, &bytes);
        }
    }

    Err(ExtractError::NoMatchingZipEntry(path.to_path_buf()))
}

fn load_plain_xml(path: &Path) -> Result<String, ExtractError> {
    let bytes = std::fs::read(path).map_err(|source| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    decode_bytes(path, &bytes)
}

/// Tries UTF-16 first (with BOM detection), then UTF-8.
fn decode_bytes(path: &Path, bytes: &[u8]) -> Result<String, ExtractError> {
    if bytes.len() >= 2 {
        let bom_le = bytes[0] == 0xFF && bytes[1] == 0xFE;
        let bom_be = bytes[0] == 0xFE && bytes[1] == 0xFF;
        if bom_le || bom_be {
            let encoding = if bom_le {
                encoding_rs::UTF_16LE
            } else {
                encoding_rs::UTF_16BE
            };
            let (text, _, had_errors) = encoding.decode(bytes);
            if !had_errors {
                return Ok(text.into_owned());
            }
        }
    }

    match std::str::from_utf8(bytes) {
        Ok(text) => Ok(text.to_string()),
        Err(_) => {
            let (text, _, had_errors) = encoding_rs::UTF_16LE.decode(bytes);
            if had_errors {
                Err(ExtractError::Decode(path.to_path_buf()))
            } else {
                Ok(text.into_owned())
            }
        }
    }
}

/// Loads a file and returns its fully case-folded XML text, ready to be
/// parsed with [roxmltree::Document::parse].
pub fn load_case_folded(path: &Path) -> Result<String, ExtractError> {
    Ok(load_raw_xml(path)?.to_lowercase())
}

/// Parses already-loaded (and already lowercased) XML text.
pub fn parse_document(xml: &str) -> Result<Document<'_>, ExtractError> {
    Ok(Document::parse(xml)?)
}

static LEADING_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+\.?\d*").expect("leading-number regex is valid"));

/// Typed accessors over a parsed element, matching the defaulting
/// behavior of the original ElementTree-based accessors: a missing tag
/// or malformed number never panics, it falls back to the empty/zero
/// value.
pub trait ElementAccess<'a, 'input: 'a> {
    fn first_descendant(&self, tag: &str) -> Option<Node<'a, 'input>>;

    fn as_string(&self, tag: &str) -> String {
        self.first_descendant(tag)
            .and_then(|n| n.text())
            .map(|t| t.trim().to_string())
            .unwrap_or_default()
    }

    fn as_float(&self, tag: &str) -> Decimal {
        let text = match self.first_descendant(tag).and_then(|n| n.text()) {
            Some(t) => t,
            None => return Decimal::ZERO,
        };
        match LEADING_NUMBER.find(text) {
            Some(m) => m.as_str().parse().unwrap_or(Decimal::ZERO),
            None => Decimal::ZERO,
        }
    }

    fn as_int(&self, tag: &str) -> i64 {
        use rust_decimal::prelude::ToPrimitive;
        self.as_float(tag).trunc().to_i64().unwrap_or(0)
    }

    fn as_bool(&self, tag: &str) -> bool {
        self.as_int(tag) == 1
    }
}

impl<'a, 'input: 'a> ElementAccess<'a, 'input> for Node<'a, 'input> {
    fn first_descendant(&self, tag: &str) -> Option<Node<'a, 'input>> {
        self.descendants().find(|n| n.has_tag_name(tag))
    }
}

/// Iterates direct-or-nested descendants with the given tag name, the way
/// `ElementTree.iter(tag)` walks a whole subtree regardless of depth.
pub fn iter_tag<'a, 'input: 'a>(
    root: Node<'a, 'input>,
    tag: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    root.descendants().filter(move |n| n.has_tag_name(tag))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_default_on_missing_or_malformed_data() {
        let xml = "<root><item><itemname>  widget  </itemname><itemprice>9.90abc</itemprice></item></root>";
        let doc = Document::parse(xml).unwrap();
        let item = doc
            .root()
            .descendants()
            .find(|n| n.has_tag_name("item"))
            .unwrap();

        assert_eq!(item.as_string("itemname"), "widget");
        assert_eq!(item.as_float("itemprice"), Decimal::new(990, 2));
        assert_eq!(item.as_int("missing"), 0);
        assert_eq!(item.as_string("missing"), "");
        assert!(!item.as_bool("missing"));
    }

    #[test]
    fn as_bool_is_true_only_for_exactly_one() {
        let xml = "<root><item><itemtype>1</itemtype></item><item><itemtype>2</itemtype></item></root>";
        let doc = Document::parse(xml).unwrap();
        let items: Vec<_> = doc
            .root()
            .descendants()
            .filter(|n| n.has_tag_name("item"))
            .collect();
        assert!(items[0].as_bool("itemtype"));
        assert!(!items[1].as_bool("itemtype"));
    }
}
