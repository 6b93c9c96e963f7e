use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use curie_resolver::capitalization::{CapitalizationStrategy, MinimalSampler};
use curie_resolver::config::{ConfigLoader, ResolvedConfig};
use curie_resolver::error::CurieError;
use curie_resolver::output::{JsonOutput, OutputMode, ResolvedItem};
use curie_resolver::refresh::{RegistryHttpClient, refresh_snapshot};
use curie_resolver::resolver::CurieResolver;
use curie_resolver::store::SnapshotStore;

#[derive(Parser)]
#[command(name = "curie")]
#[command(about = "Standardize compact identifiers (prefix:accession) against identifiers.org")]
#[command(version)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<String>,

    #[arg(long, global = true)]
    snapshot: Option<String>,

    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Print CURIEs with the registry's expected prefix capitalization")]
    Standardize(CurieArgs),
    #[command(about = "Print identifiers.org URLs for CURIEs")]
    Url(CurieArgs),
    #[command(about = "Show the namespace registered for a prefix")]
    Lookup(LookupArgs),
    #[command(about = "List registered namespaces")]
    List,
    #[command(about = "Download the registry and rewrite the namespace snapshot")]
    Refresh(RefreshArgs),
}

#[derive(Args)]
struct CurieArgs {
    #[arg(required = true)]
    curies: Vec<String>,
}

#[derive(Args)]
struct LookupArgs {
    prefix: String,
}

#[derive(Args)]
struct RefreshArgs {
    #[arg(long)]
    api_url: Option<String>,

    #[arg(long)]
    page_size: Option<u32>,

    #[arg(long, value_enum, default_value_t = CapitalizationStrategy::SampleIdFirst)]
    strategy: CapitalizationStrategy,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<CurieError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &CurieError) -> u8 {
    match error {
        CurieError::NotText { .. }
        | CurieError::MalformedCurie { .. }
        | CurieError::UnrecognizedPrefix { .. } => 2,
        CurieError::RegistryHttp(_) | CurieError::RegistryStatus { .. } => 3,
        CurieError::RegistryUnavailable { .. }
        | CurieError::RegistryDataDefect { .. }
        | CurieError::InvalidPattern { .. } => 4,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    let mut config = ConfigLoader::resolve(cli.config.as_deref())?;
    if let Some(snapshot) = cli.snapshot {
        config.snapshot_path = snapshot.into();
    }

    match cli.command {
        Commands::Standardize(args) => {
            let resolver = open_resolver(&config);
            run_curies(&args.curies, output_mode, |curie| resolver.standardize(curie))
        }
        Commands::Url(args) => {
            let resolver = open_resolver(&config);
            run_curies(&args.curies, output_mode, |curie| resolver.to_url(curie))
        }
        Commands::Lookup(args) => {
            let record = open_resolver(&config).lookup(&args.prefix)?;
            match output_mode {
                OutputMode::Json => JsonOutput::print_namespace(&record).into_diagnostic(),
                OutputMode::Human => {
                    println!("prefix:       {}", record.prefix);
                    println!("curie prefix: {}", record.curie_prefix);
                    println!("name:         {}", record.name);
                    println!("mir id:       {}", record.mir_id);
                    println!("pattern:      {}", record.pattern);
                    if let Some(sample) = &record.sample_id {
                        println!("sample id:    {sample}");
                    }
                    Ok(())
                }
            }
        }
        Commands::List => {
            let namespaces = open_resolver(&config).namespaces()?;
            match output_mode {
                OutputMode::Json => JsonOutput::print_namespaces(&namespaces).into_diagnostic(),
                OutputMode::Human => {
                    for record in &namespaces {
                        println!("{}\t{}", record.curie_prefix, record.name);
                    }
                    Ok(())
                }
            }
        }
        Commands::Refresh(args) => {
            let client = RegistryHttpClient::with_endpoint(
                args.api_url
                    .as_deref()
                    .unwrap_or(&config.registry_api_url),
                args.page_size.unwrap_or(config.page_size),
            )?;
            let summary = refresh_snapshot(
                &client,
                &MinimalSampler,
                args.strategy,
                &config.snapshot_path,
            )?;
            match output_mode {
                OutputMode::Json => JsonOutput::print_refresh(&summary).into_diagnostic(),
                OutputMode::Human => {
                    println!(
                        "wrote {} namespaces ({} embedded) to {}",
                        summary.namespaces, summary.embedded, summary.snapshot_path
                    );
                    if summary.truncated {
                        println!("warning: registry returned more than one page; snapshot is truncated");
                    }
                    Ok(())
                }
            }
        }
    }
}

fn open_resolver(config: &ResolvedConfig) -> CurieResolver<SnapshotStore> {
    CurieResolver::with_resolver_url(
        SnapshotStore::new(config.snapshot_path.clone()),
        &config.resolver_url,
    )
}

/// Resolve every argument; the first failure becomes the exit status after
/// all results have been printed. In human mode that failure is left to the
/// final report and only the remaining ones are printed per item.
fn run_curies<F>(curies: &[String], output_mode: OutputMode, resolve: F) -> miette::Result<()>
where
    F: Fn(&str) -> Result<String, CurieError>,
{
    let mut items = Vec::with_capacity(curies.len());
    let mut first_error: Option<(usize, CurieError)> = None;
    for curie in curies {
        match resolve(curie) {
            Ok(output) => items.push(ResolvedItem {
                input: curie.clone(),
                output: Some(output),
                error: None,
            }),
            Err(
                err @ (CurieError::RegistryUnavailable { .. }
                | CurieError::RegistryDataDefect { .. }),
            ) => {
                return Err(err.into());
            }
            Err(err) => {
                items.push(ResolvedItem {
                    input: curie.clone(),
                    output: None,
                    error: Some(err.to_string()),
                });
                if first_error.is_none() {
                    first_error = Some((items.len() - 1, err));
                }
            }
        }
    }

    match output_mode {
        OutputMode::Json => JsonOutput::print_items(&items).into_diagnostic()?,
        OutputMode::Human => {
            let reported = first_error.as_ref().map(|(position, _)| *position);
            let (resolved, failed) = human_lines(&items, reported);
            for line in resolved {
                println!("{line}");
            }
            for line in failed {
                eprintln!("{line}");
            }
        }
    }

    match first_error {
        Some((_, err)) => Err(err.into()),
        None => Ok(()),
    }
}

/// Split items into stdout and stderr lines, leaving out the failure at
/// `reported` since the final diagnostic already covers it.
fn human_lines(items: &[ResolvedItem], reported: Option<usize>) -> (Vec<String>, Vec<String>) {
    let mut resolved = Vec::new();
    let mut failed = Vec::new();
    for (position, item) in items.iter().enumerate() {
        match (&item.output, &item.error) {
            (Some(output), _) => resolved.push(output.clone()),
            (None, Some(error)) if reported != Some(position) => {
                failed.push(format!("{}: {error}", item.input));
            }
            _ => {}
        }
    }
    (resolved, failed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(input: &str, output: Option<&str>, error: Option<&str>) -> ResolvedItem {
        ResolvedItem {
            input: input.to_string(),
            output: output.map(str::to_string),
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn first_failure_is_left_to_the_final_report() {
        let items = vec![
            item("chebi:1", Some("CHEBI:1"), None),
            item("pmid:1", None, Some("unknown pmid")),
            item("nocolon", None, Some("malformed")),
        ];
        let (resolved, failed) = human_lines(&items, Some(1));
        assert_eq!(resolved, vec!["CHEBI:1"]);
        assert_eq!(failed, vec!["nocolon: malformed"]);
    }

    #[test]
    fn run_curies_returns_first_failure() {
        let curies = vec!["chebi:1".to_string(), "pmid:1".to_string()];
        let report = run_curies(&curies, OutputMode::Human, |curie| {
            if curie.starts_with("chebi") {
                Ok("CHEBI:1".to_string())
            } else {
                Err(CurieError::UnrecognizedPrefix {
                    prefix: "pmid".to_string(),
                    curie: curie.to_string(),
                })
            }
        })
        .unwrap_err();
        let error = report.downcast_ref::<CurieError>().unwrap();
        assert_eq!(map_exit_code(error), 2);
    }
}
