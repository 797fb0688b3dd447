//! The reconcile pipeline behind `labelrecon <input>`.

use std::path::{Path, PathBuf};

use labelrecon::ReconConfig;
use labelrecon_io::format::{format_for_path, Readers};
use labelrecon_io::output::{write_all, PendingOutput};
use labelrecon_io::report::{render_summary, ReportOptions};
use labelrecon_io::{archive, csv};

use crate::{Cli, CliError};

const DEFAULT_FORMAT: &str = "csv";

pub fn cmd_run(cli: Cli) -> Result<(), CliError> {
    let config = build_config(&cli)?;
    let readers = Readers::builtin();

    let format = match cli.format.as_deref() {
        Some(f) => f.to_ascii_lowercase(),
        None => format_for_path(&cli.input).unwrap_or(DEFAULT_FORMAT).to_string(),
    };
    if readers.get(&format).is_none() {
        let known: Vec<&str> = readers.names().collect();
        return Err(CliError::args(format!(
            "unknown input format '{format}' (expected one of: {})",
            known.join(", ")
        )));
    }
    let (zip_path, keep_originals) = zip_target(&cli)?;

    let input = readers.read(&format, &cli.input, &config)?;
    log::info!("read {} classifications from {}", input.len(), cli.input.display());

    let output = labelrecon::run(&input, &config)?;

    // Render everything before touching the filesystem
    let mut pending = Vec::new();
    if let Some(path) = &cli.unreconciled {
        pending.push(PendingOutput::new(path, csv::render(&input, false).map_err(CliError::io)?));
    }
    if let Some(path) = &cli.reconciled {
        let bytes = csv::render(&output.reconciled, cli.explanations).map_err(CliError::io)?;
        pending.push(PendingOutput::new(path, bytes));
    }
    if let Some(path) = &cli.summary {
        let options = ReportOptions {
            page_size: cli.page_size,
            detail: !cli.no_summary_detail,
            input_name: display_name(&cli.input),
            generated: chrono::Local::now().naive_local(),
        };
        let html = render_summary(&input, &output.reconciled, &output.summary, &config, &options);
        pending.push(PendingOutput::new(path, html));
    }

    let written = write_all(pending).map_err(CliError::io)?;

    if let Some(zip_path) = zip_path {
        if let Err(e) = archive::zip_outputs(zip_path, &written, keep_originals) {
            for path in &written {
                let _ = std::fs::remove_file(path);
            }
            let _ = std::fs::remove_file(zip_path);
            return Err(CliError::io(e));
        }
        eprintln!("wrote {}", zip_path.display());
        if keep_originals {
            report_written(&written);
        }
    } else {
        report_written(&written);
    }

    let s = &output.summary;
    eprintln!(
        "{}: {} subjects from {} transcripts, problems: {}",
        s.workflow,
        s.subjects,
        s.transcripts,
        s.problems.len()
    );

    if cli.json {
        let json = serde_json::to_string_pretty(s)
            .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
        println!("{json}");
    }

    Ok(())
}

/// File configuration (if any) with command-line overrides applied.
fn build_config(cli: &Cli) -> Result<ReconConfig, CliError> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| CliError::io(format!("cannot read config {}: {e}", path.display())))?;
            ReconConfig::from_toml(&text)?
        }
        None => ReconConfig::default(),
    };

    if let Some(v) = cli.fuzzy_ratio_threshold {
        config.fuzzy_ratio_threshold = v;
    }
    if let Some(v) = cli.fuzzy_set_threshold {
        config.fuzzy_set_threshold = v;
    }
    if let Some(v) = cli.join_distance {
        config.join_distance = v;
    }
    if let Some(v) = &cli.group_by {
        config.group_by = v.clone();
    }
    if let Some(v) = cli.workflow_id {
        config.workflow_id = Some(v);
    }
    if let Some(v) = &cli.workflow_name {
        config.workflow_name = Some(v.clone());
    }
    if let Some(v) = cli.max_transcriptions {
        config.max_transcriptions = Some(v);
    }
    for pairs in &cli.column_types {
        config.parse_column_types(pairs)?;
    }
    for pairs in &cli.user_weights {
        config.parse_user_weights(pairs)?;
    }

    config.validate()?;
    Ok(config)
}

fn zip_target(cli: &Cli) -> Result<(Option<&Path>, bool), CliError> {
    let target = match (&cli.zip, &cli.zip_keep) {
        (Some(p), _) => Some((p.as_path(), false)),
        (None, Some(p)) => Some((p.as_path(), true)),
        (None, None) => None,
    };
    let Some((path, keep)) = target else {
        return Ok((None, false));
    };
    if cli.unreconciled.is_none() && cli.reconciled.is_none() && cli.summary.is_none() {
        return Err(CliError::args("nothing to archive")
            .with_hint("add at least one of -u, -r or -s"));
    }
    Ok((Some(path), keep))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn report_written(paths: &[PathBuf]) {
    for path in paths {
        eprintln!("wrote {}", path.display());
    }
}
