use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use toolspec_audit::config::{AuditConfig, CliArgs};
use toolspec_audit::export::{
    CodeMetaExporter, CwlConfig, DoapConfig, ExportFormat, Exporter, GalaxyExporter,
    GalaxyConfig, RdfFormat, SchemaOrgExporter,
};
use toolspec_audit::export::{CwlExporter, DoapExporter};
use toolspec_audit::github::GithubProvider;
use toolspec_audit::logging::{LoggingConfig, init_logging};
use toolspec_audit::metadata::UnifiedSoftwareMetadata;
use toolspec_audit::pipeline::{AnalysisRunner, AnalysisStatus, CheckStatus};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging(LoggingConfig::from_env())?;

    let cli = CliArgs::parse();
    let config = AuditConfig::from_args(cli)?;

    let provider = GithubProvider::new(config.github_api.clone(), config.github_token.clone())
        .context("failed to construct the content provider")?;
    let runner = AnalysisRunner::new(Arc::new(provider));

    if config.list_checks {
        println!("Declared check plan:");
        for (id, title, required) in runner.plan() {
            let marker = if required { "required" } else { "optional" };
            println!("  {id:<22} {marker:<9} {title}");
        }
        return Ok(());
    }

    let repo = config.repo.as_deref().expect("validated by AuditConfig");

    // Ctrl-C requests a cooperative cancel; the running check finishes.
    let cancel = runner.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("cancellation requested");
            cancel.cancel();
        }
    });

    let state = runner.run(repo, config.release_tag.as_deref()).await;
    print_report(&state);

    match state.status {
        AnalysisStatus::Completed => {}
        AnalysisStatus::Cancelled => anyhow::bail!("analysis cancelled"),
        _ => anyhow::bail!("analysis failed; see the check report above"),
    }

    let metadata = state
        .metadata
        .as_ref()
        .context("analysis completed without unified metadata")?;

    fs::create_dir_all(&config.output_dir).with_context(|| {
        format!("failed to create output directory {:?}", config.output_dir)
    })?;

    for format in &config.formats {
        let (document, filename) = render(*format, metadata, &config)?;
        let path = config.output_dir.join(filename);
        fs::write(&path, document)
            .with_context(|| format!("failed to write {:?}", path))?;
        println!("wrote {}", path.display());
    }

    Ok(())
}

fn render(
    format: ExportFormat,
    metadata: &UnifiedSoftwareMetadata,
    config: &AuditConfig,
) -> Result<(String, String)> {
    let mut filename = format.default_filename(&metadata.name);
    let document = match format {
        ExportFormat::Codemeta => {
            report_issues(format, CodeMetaExporter.validate(metadata, &()));
            CodeMetaExporter.export(metadata, &())?
        }
        ExportFormat::Schemaorg => {
            report_issues(format, SchemaOrgExporter.validate(metadata, &()));
            SchemaOrgExporter.export(metadata, &())?
        }
        ExportFormat::Galaxy => {
            let galaxy = Some(galaxy_config(metadata, config));
            report_issues(format, GalaxyExporter.validate(metadata, &galaxy));
            GalaxyExporter.export(metadata, &galaxy)?
        }
        ExportFormat::Cwl => {
            let cwl = CwlConfig {
                cwl_version: config.cwl_version,
                outputs: Vec::new(),
                base_command: None,
                container: config.container.clone(),
            };
            report_issues(format, CwlExporter.validate(metadata, &cwl));
            CwlExporter.export(metadata, &cwl)?
        }
        ExportFormat::Doap => {
            let doap = DoapConfig {
                maintainer: config.maintainer.clone(),
                format: config.rdf_format,
            };
            if config.rdf_format == RdfFormat::Rdfxml {
                filename = filename.replace(".ttl", ".rdf");
            }
            report_issues(format, DoapExporter.validate(metadata, &doap));
            DoapExporter.export(metadata, &doap)?
        }
    };
    Ok((document, filename))
}

// The export-time configuration starts from the scaffold on the metadata
// record; CLI overrides are applied per call and never written back.
fn galaxy_config(metadata: &UnifiedSoftwareMetadata, config: &AuditConfig) -> GalaxyConfig {
    let mut galaxy = metadata.galaxy_defaults.clone();
    if let Some(command) = config.command.as_deref() {
        galaxy.command = command.to_string();
    }
    if let Some(container) = config.container.as_deref() {
        galaxy.container = container.to_string();
    }
    galaxy
}

fn report_issues(format: ExportFormat, issues: Vec<String>) {
    for issue in issues {
        tracing::warn!(format = %format, "{issue}");
    }
}

fn print_report(state: &toolspec_audit::pipeline::AnalysisState) {
    println!("\nAnalysis of {}", state.repo_url);
    for result in state.checks.values() {
        let status = match result.status {
            CheckStatus::Pending => "pending",
            CheckStatus::Running => "running",
            CheckStatus::Completed => "ok",
            CheckStatus::Failed => "failed",
            CheckStatus::Skipped => "skipped",
        };
        print!("  [{status:>7}] {}", result.title);
        if let Some(duration) = result.duration_ms {
            print!(" ({duration} ms)");
        }
        println!();
        if let Some(error) = result.error.as_deref() {
            println!("            error: {error}");
        }
        if let Some(warning) = result.warning.as_deref() {
            println!("            warning: {warning}");
        }
    }
    if !state.warnings.is_empty() {
        println!("  {} warning(s) recorded", state.warnings.len());
    }
}
