use crate::analysis::{FileAnalysis, MatchKind, TestKind};
use crate::errors::Result;
use crate::output::json::Metadata;
use crate::report::ProjectReport;
use std::io::Write;

/// Write analyze output as a human-readable report.
pub fn write_analyze_text<W: Write>(
    writer: &mut W,
    report: &ProjectReport,
    metadata: &Metadata,
) -> Result<()> {
    let totals = &report.totals;

    writeln!(writer, "pysurvey Analysis Report")?;
    writeln!(writer, "========================")?;
    writeln!(writer)?;
    writeln!(writer, "Root:         {}", metadata.root.display())?;
    writeln!(writer, "Parsed:       {} files", metadata.files_parsed)?;
    writeln!(writer, "Failed:       {} files", metadata.files_failed)?;
    if metadata.files_skipped > 0 {
        writeln!(writer, "Skipped:      {} files (cancelled)", metadata.files_skipped)?;
    }
    writeln!(writer)?;

    writeln!(writer, "Summary")?;
    writeln!(writer, "-------")?;
    writeln!(writer, "Symbols:      {}", totals.symbols)?;
    writeln!(
        writer,
        "Calls:        {} ({} unresolved)",
        totals.calls, totals.unresolved_calls
    )?;
    writeln!(writer, "Endpoints:    {}", totals.endpoints)?;
    writeln!(writer, "Client calls: {}", totals.client_calls)?;
    writeln!(
        writer,
        "Protocols:    {} ({} implementers)",
        totals.protocols, totals.implementers
    )?;
    writeln!(writer, "Tests:        {}", totals.tests)?;
    writeln!(writer)?;

    for file in &report.files {
        write_file_section(writer, file)?;
    }

    if !report.diagnostics.is_empty() {
        writeln!(writer, "Diagnostics")?;
        writeln!(writer, "{:-<60}", "")?;
        for diagnostic in &report.diagnostics {
            writeln!(writer, "  {diagnostic}")?;
        }
        writeln!(writer)?;
    }

    writeln!(
        writer,
        "Completed in {:.2}s ({:.0} files/sec)",
        metadata.elapsed_ms as f64 / 1000.0,
        metadata.files_per_second
    )?;

    Ok(())
}

fn write_file_section<W: Write>(writer: &mut W, file: &FileAnalysis) -> Result<()> {
    let has_facts = !file.endpoints.is_empty()
        || !file.client_calls.is_empty()
        || !file.protocols.is_empty()
        || !file.tests.is_empty();

    writeln!(
        writer,
        "{} ({} symbols, {} calls)",
        file.path.display(),
        file.symbols.len(),
        file.calls.len()
    )?;
    if !has_facts {
        writeln!(writer)?;
        return Ok(());
    }

    for endpoint in &file.endpoints {
        let path = endpoint.full_path.as_deref().unwrap_or(&endpoint.path);
        writeln!(
            writer,
            "  endpoint  {:<7} {:<30} -> {} [{}]",
            endpoint.method, path, endpoint.handler, endpoint.framework
        )?;
    }
    for call in &file.client_calls {
        writeln!(
            writer,
            "  client    {:<7} {:<30} in {} [{}{}]",
            call.method,
            call.path.text(),
            call.caller.as_deref().unwrap_or("<module>"),
            call.library,
            if call.is_async { ", async" } else { "" }
        )?;
    }
    for protocol in &file.protocols {
        let members: Vec<&str> = protocol.required_members.iter().map(String::as_str).collect();
        writeln!(writer, "  protocol  {} {{{}}}", protocol.name, members.join(", "))?;
    }
    for implementer in &file.implementers {
        let how = match implementer.match_kind {
            MatchKind::Nominal => "nominal",
            MatchKind::Structural => "structural",
        };
        writeln!(
            writer,
            "  implements {} -> {} ({how})",
            implementer.class_name, implementer.protocol
        )?;
    }
    for test in &file.tests {
        let kind = match test.kind {
            TestKind::TestFunction => "function",
            TestKind::TestMethod => "method",
        };
        writeln!(writer, "  test      {} ({kind})", test.symbol)?;
    }
    writeln!(writer)?;
    Ok(())
}
