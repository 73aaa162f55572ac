use std::io::Write;

use owo_colors::OwoColorize;
use reflow_core::{BackendInfo, TextBlockMatch};
use reflow_parsing::{Conversion, ConversionWarning, NormalizedReferences};

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Print the one-line summary after a document is converted.
pub fn print_conversion_summary(
    w: &mut dyn Write,
    name: &str,
    conversion: &Conversion,
    color: ColorMode,
) -> std::io::Result<()> {
    let refs = conversion.references.as_ref().map_or(0, |r| r.entries.len());
    let line = format!(
        "{}: {} paragraphs, {} references",
        name,
        conversion.paragraphs.len(),
        refs
    );
    if color.enabled() {
        writeln!(w, "{}", line.bold())?;
    } else {
        writeln!(w, "{}", line)?;
    }
    Ok(())
}

pub fn print_warnings(
    w: &mut dyn Write,
    name: &str,
    warnings: &[ConversionWarning],
    color: ColorMode,
) -> std::io::Result<()> {
    for warning in warnings {
        if color.enabled() {
            writeln!(w, "{} {}: {}", "WARNING:".yellow(), name, warning)?;
        } else {
            writeln!(w, "WARNING: {}: {}", name, warning)?;
        }
    }
    Ok(())
}

/// Paragraphs as plain text, separated by blank lines.
pub fn print_paragraphs(w: &mut dyn Write, paragraphs: &[String]) -> std::io::Result<()> {
    for (i, p) in paragraphs.iter().enumerate() {
        if i > 0 {
            writeln!(w)?;
        }
        writeln!(w, "{}", p)?;
    }
    Ok(())
}

/// Numbered reference entries followed by the block's quality score.
pub fn print_references(
    w: &mut dyn Write,
    references: Option<&NormalizedReferences>,
    color: ColorMode,
) -> std::io::Result<()> {
    let Some(references) = references else {
        if color.enabled() {
            writeln!(w, "{}", "No references block found".red())?;
        } else {
            writeln!(w, "No references block found")?;
        }
        return Ok(());
    };

    for (i, entry) in references.entries.iter().enumerate() {
        if color.enabled() {
            writeln!(w, "{} {}", format!("[{}]", i + 1).dimmed(), entry.text)?;
        } else {
            writeln!(w, "[{}] {}", i + 1, entry.text)?;
        }
    }
    writeln!(w)?;

    let score = format!("{:.2}", references.score);
    if color.enabled() {
        let score = if references.score >= 0.7 {
            score.green().to_string()
        } else if references.score >= 0.4 {
            score.yellow().to_string()
        } else {
            score.red().to_string()
        };
        writeln!(w, "{} entries, score {}", references.entries.len(), score)?;
    } else {
        writeln!(w, "{} entries, score {}", references.entries.len(), score)?;
    }
    Ok(())
}

pub fn print_blocks(w: &mut dyn Write, matches: &[TextBlockMatch], color: ColorMode) -> std::io::Result<()> {
    if matches.is_empty() {
        writeln!(w, "No blocks found")?;
        return Ok(());
    }
    for m in matches {
        let b = &m.expanded_bbox;
        let header = format!(
            "page {} \"{}\" [{:.1}, {:.1}, {:.1}, {:.1}]",
            m.page, m.term, b.x0, b.top, b.x1, b.bottom
        );
        if color.enabled() {
            writeln!(w, "{}", header.cyan())?;
        } else {
            writeln!(w, "{}", header)?;
        }
        for line in m.text.lines() {
            writeln!(w, "  {}", line)?;
        }
    }
    Ok(())
}

pub fn print_backends(w: &mut dyn Write, infos: &[BackendInfo], color: ColorMode) -> std::io::Result<()> {
    for info in infos {
        let extensions = info
            .extensions
            .iter()
            .map(|e| format!(".{e}"))
            .collect::<Vec<_>>()
            .join(", ");
        let status = if info.available { "available" } else { "not compiled in" };
        if color.enabled() {
            let status = if info.available {
                status.green().to_string()
            } else {
                status.red().to_string()
            };
            writeln!(w, "{:<8} {:<16} {}", info.name.bold(), status, extensions)?;
        } else {
            writeln!(w, "{:<8} {:<16} {}", info.name, status, extensions)?;
        }
    }
    Ok(())
}
