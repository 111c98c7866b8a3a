//! Per-document font registry
//!
//! Fonts keep the order in which they were registered. Each one gets a
//! stable `object_index`, and every distinct `/Differences` string gets a
//! 1-based index shared by all fonts that use it.

use super::{FontInfo, FontKey, FontKind};
use crate::error::{PdfError, Result};
use std::collections::HashMap;

/// Result of [`FontRegistry::register`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterOutcome {
    pub object_index: usize,
    /// The key was registered before; the new font was discarded
    pub already_present: bool,
}

/// Fonts registered for one document
#[derive(Debug, Clone, Default)]
pub struct FontRegistry {
    fonts: Vec<(FontKey, FontInfo)>,
    index: HashMap<FontKey, usize>,
    differences: Vec<String>,
}

impl FontRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `info` under `key`. Registering a key twice keeps the first
    /// font untouched.
    pub fn register(&mut self, key: FontKey, mut info: FontInfo) -> Result<RegisterOutcome> {
        if let Some(&object_index) = self.index.get(&key) {
            tracing::debug!("Font {} already registered", key);
            return Ok(RegisterOutcome {
                object_index,
                already_present: true,
            });
        }

        check_program(&info)?;

        let object_index = self.fonts.len();
        info.object_index = object_index;
        info.diff_index = match info.differences.as_deref() {
            Some(diff) if !diff.is_empty() => Some(self.differences_index(diff)),
            _ => None,
        };

        tracing::debug!(
            "Registered font {} as {} ({})",
            key,
            object_index,
            info.kind().name()
        );
        self.index.insert(key.clone(), object_index);
        self.fonts.push((key, info));

        Ok(RegisterOutcome {
            object_index,
            already_present: false,
        })
    }

    /// 1-based position of `diff`, appending it when unseen
    fn differences_index(&mut self, diff: &str) -> usize {
        match self.differences.iter().position(|d| d == diff) {
            Some(position) => position + 1,
            None => {
                self.differences.push(diff.to_string());
                self.differences.len()
            }
        }
    }

    pub fn lookup(&self, key: &FontKey) -> Option<&FontInfo> {
        self.index.get(key).map(|&i| &self.fonts[i].1)
    }

    pub fn contains(&self, key: &FontKey) -> bool {
        self.index.contains_key(key)
    }

    /// Keys in registration order
    pub fn keys(&self) -> impl Iterator<Item = &FontKey> {
        self.fonts.iter().map(|(key, _)| key)
    }

    /// Fonts in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&FontKey, &FontInfo)> {
        self.fonts.iter().map(|(key, info)| (key, info))
    }

    pub(crate) fn font_mut(&mut self, object_index: usize) -> Option<&mut FontInfo> {
        self.fonts.get_mut(object_index).map(|(_, info)| info)
    }

    /// Distinct differences strings; entry `i` has diff index `i + 1`
    pub fn differences(&self) -> &[String] {
        &self.differences
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }
}

fn check_program(info: &FontInfo) -> Result<()> {
    match info.kind() {
        FontKind::TrueType(Some(program)) if program.original_length == 0 => {
            Err(PdfError::ParseError(format!(
                "{}: embedded TrueType program has no original length",
                info.postscript_name
            )))
        }
        FontKind::Type1(Some(program)) => {
            if program.segment1_length == 0 {
                return Err(PdfError::ParseError(format!(
                    "{}: embedded Type1 program has an empty first segment",
                    info.postscript_name
                )));
            }
            let declared = program
                .segment1_length
                .checked_add(program.segment2_length);
            if declared.map_or(true, |declared| program.data.len() < declared) {
                return Err(PdfError::ParseError(format!(
                    "{}: Type1 program is shorter than its segments",
                    info.postscript_name
                )));
            }
            Ok(())
        }
        _ => Ok(()),
    }
}
