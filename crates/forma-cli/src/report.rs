//! Terminal rendering of diagnostics.

use std::io::{self, Write};

use forma_ir::{Diagnostic, Diagnostics, Severity};
use nu_ansi_term::Color;

pub fn write_diagnostic(out: &mut impl Write, diagnostic: &Diagnostic, color: bool) -> io::Result<()> {
    let label = match diagnostic.severity {
        Severity::Error => paint(color, Color::Red, "error"),
        Severity::Warning => paint(color, Color::Yellow, "warning"),
    };
    writeln!(out, "{label}: {}", diagnostic.message)?;
    let arrow = paint(color, Color::Blue, "-->");
    writeln!(
        out,
        "  {arrow} {} ({})",
        diagnostic.origin.location(),
        diagnostic.origin.element
    )?;
    if let Some(setting) = &diagnostic.origin.setting {
        writeln!(out, "  {} {setting}", paint(color, Color::Blue, "= note:"))?;
    }
    Ok(())
}

pub fn write_diagnostics(out: &mut impl Write, diagnostics: &Diagnostics, color: bool) -> io::Result<()> {
    for diagnostic in diagnostics {
        write_diagnostic(out, diagnostic, color)?;
    }
    Ok(())
}

fn paint(color: bool, c: Color, text: &str) -> String {
    if color {
        c.bold().paint(text).to_string()
    } else {
        text.to_owned()
    }
}
