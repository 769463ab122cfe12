use crate::config::provenance::{Section, Source};
use crate::config::ResolvedConfig;
use std::io::Write;

/// Render `config show` output.
pub fn render_show<W: Write>(w: &mut W, config: &ResolvedConfig) -> std::io::Result<()> {
    if config.loaded_files.is_empty() {
        writeln!(w, "Loaded config files: (none)")?;
    } else {
        writeln!(w, "Loaded config files:")?;
        for (i, path) in config.loaded_files.iter().enumerate() {
            writeln!(w, "  {}. {}", i + 1, path.display())?;
        }
    }
    writeln!(w)?;

    writeln!(w, "Resolved settings:")?;
    for section in Section::ALL {
        write_section(w, config, section)?;
    }

    let overridden = config.provenance.overridden().count();
    writeln!(w)?;
    writeln!(w, "{overridden} setting(s) differ from the built-in defaults")?;
    Ok(())
}

/// Render `config explain <section>` output.
pub fn render_explain<W: Write>(
    w: &mut W,
    config: &ResolvedConfig,
    section: Section,
) -> std::io::Result<()> {
    writeln!(w, "Section: {section}")?;
    writeln!(w)?;
    write_section(w, config, section)?;

    let all_default = config
        .provenance
        .section(section)
        .all(|(_, source)| *source == Source::Default);
    if all_default {
        writeln!(w)?;
        writeln!(w, "Every {section} setting is a built-in default.")?;
    }
    Ok(())
}

fn write_section<W: Write>(
    w: &mut W,
    config: &ResolvedConfig,
    section: Section,
) -> std::io::Result<()> {
    for (key, source) in config.provenance.section(section) {
        writeln!(w, "  {}: {} <- {}", key, value_of(config, key), source)?;
    }
    Ok(())
}

fn list(values: &[String]) -> String {
    if values.is_empty() {
        "(none)".to_string()
    } else {
        format!("{:?}", values)
    }
}

fn value_of(config: &ResolvedConfig, key: &str) -> String {
    match key {
        "defaults.format" => config.format.clone(),
        "defaults.quiet" => config.quiet.to_string(),
        "defaults.jobs" => match config.jobs {
            0 => "0 (one per core)".to_string(),
            n => n.to_string(),
        },
        "targeting.include" => list(&config.include),
        "targeting.exclude" => list(&config.exclude),
        "targeting.ignore" => config
            .ignore_file
            .as_ref()
            .map_or_else(|| "(none)".to_string(), |ignore| list(ignore.patterns())),
        "clients.libraries" => list(&config.clients.libraries),
        "tests.function_prefixes" => list(&config.tests.function_prefixes),
        "tests.class_prefixes" => list(&config.tests.class_prefixes),
        "tests.base_classes" => list(&config.tests.base_classes),
        "protocols.require_protocol_base" => config.protocols.require_protocol_base.to_string(),
        _ => "(unknown)".to_string(),
    }
}
