// crates/hongd-cli/src/xlate.rs
// ============================================================================
// Module: Name Translation Reports
// Description: Turns a caller-supplied name into every external name form.
// Purpose: Back `hongd xlate` and root extension for directory admin commands.
// Dependencies: hongd-core
// ============================================================================

//! ## Overview
//! [`describe_name`] accepts a 64-character hex name, a printable name, or a
//! human name. Hex input is decoded directly; everything else goes through
//! the resolver. The report also carries the legacy "old form" (the SHA-256
//! of the human name) and, when the directory knows it, the registered human
//! name for the result.

// ============================================================================
// SECTION: Imports
// ============================================================================

use hongd_core::GDP_HEX_NAME_LEN;
use hongd_core::GdpName;
use hongd_core::NameError;
use hongd_core::ResolutionKind;
use hongd_core::ResolverContext;
use hongd_core::from_hex;
use hongd_core::legacy_sha256;

use crate::t;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Output selection for a name report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    /// Multi-line summary of every form.
    #[default]
    Summary,
    /// Printable (base64) name only.
    Printable,
    /// Hex name only.
    Hex,
    /// Storage file name root only.
    FileName,
    /// Legacy SHA-256 printable name only.
    OldForm,
}

/// Every external form of one resolved name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameReport {
    /// Fully qualified human name used for resolution.
    pub fqhn: String,
    /// How the name was obtained.
    pub method: String,
    /// Internal name.
    pub name: GdpName,
    /// Printable SHA-256 of the human name, or the printable name itself when
    /// the input was already printable.
    pub old_form: String,
    /// Human name registered for `name`, if any.
    pub hongd: Option<String>,
}

impl NameReport {
    /// Renders the report in `format`, one line per entry without a
    /// trailing newline.
    #[must_use]
    pub fn render(&self, format: ReportFormat) -> String {
        match format {
            ReportFormat::Printable => self.name.to_printable(),
            ReportFormat::Hex => self.name.to_hex(),
            ReportFormat::FileName => self.name.file_name_root(),
            ReportFormat::OldForm => self.old_form.clone(),
            ReportFormat::Summary => {
                let mut lines = vec![
                    t!("xlate.label.fqhn", value = self.fqhn),
                    t!("xlate.label.method", value = self.method),
                    t!("xlate.label.printable", value = self.name.to_printable()),
                    t!("xlate.label.old_form", value = self.old_form),
                    t!("xlate.label.hex", value = self.name.to_hex()),
                ];
                if let Some(hongd) = &self.hongd {
                    lines.push(t!("xlate.label.hongd", value = hongd));
                }
                lines.join("\n")
            }
        }
    }
}

// ============================================================================
// SECTION: Operations
// ============================================================================

/// Builds a [`NameReport`] for `input`.
///
/// # Errors
///
/// Returns [`NameError`] when `input` is not hex and does not resolve.
pub fn describe_name(ctx: &ResolverContext, input: &str) -> Result<NameReport, NameError> {
    let (name, fqhn, method, old_form) = if input.len() == GDP_HEX_NAME_LEN
        && let Ok(name) = from_hex(input)
    {
        (name, input.to_string(), t!("xlate.method.hex"), legacy_sha256(input).to_printable())
    } else {
        let resolution = ctx.resolve(input)?;
        let old_form = if resolution.kind == ResolutionKind::DirectPrintable {
            resolution.name.to_printable()
        } else {
            legacy_sha256(&resolution.xname).to_printable()
        };
        (resolution.name, resolution.xname, resolution.kind.as_str().to_string(), old_form)
    };
    let hongd = ctx.resolve_reverse(&name).ok();
    Ok(NameReport {
        fqhn,
        method,
        name,
        old_form,
        hongd,
    })
}

/// Prefixes an undotted `human_name` with `root`.
///
/// Dotted names and an empty or missing root leave the name unchanged.
#[must_use]
pub fn root_extend(human_name: &str, root: Option<&str>) -> String {
    match root {
        Some(root) if !root.is_empty() && !human_name.contains('.') => {
            format!("{root}.{human_name}")
        }
        _ => human_name.to_string(),
    }
}
