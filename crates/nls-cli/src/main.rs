use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use nls_adapters::default_registry;
use nls_core::NicheCriteria;
use nls_storage::{sample_free_proxies, ContactStore};
use nls_sync::{format_findings, load_niche_config, run_niche_pipeline, Pipeline, PipelineConfig};
use tracing::info_span;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "nls")]
#[command(about = "Niche lead scout: score niches, query sources, store deduplicated contacts")]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    run: RunArgs,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Score keywords, run every source and persist outputs (default).
    Run(RunArgs),
    /// Filter/rank niches from a YAML config and scan them on its sources.
    Niches { config: PathBuf },
    /// List registered sources.
    Sources,
    /// Show rows in the contact store.
    Contacts {
        #[arg(long)]
        db_path: Option<PathBuf>,
    },
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Keywords or niches to target.
    #[arg(long, num_args = 0..)]
    keywords: Option<Vec<String>>,
    /// Max items per source.
    #[arg(long)]
    limit: Option<usize>,
    /// Where to save per-source JSONL/CSV files.
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// SQLite file for deduplicated contacts.
    #[arg(long)]
    db_path: Option<PathBuf>,
    /// Proxy URL (e.g. http://host:port). Repeatable.
    #[arg(long = "proxy")]
    proxies: Vec<String>,
    /// Newline-delimited proxy file.
    #[arg(long)]
    proxy_file: Option<PathBuf>,
    /// Append the placeholder free-proxy entries.
    #[arg(long)]
    sample_proxies: bool,
    /// Skip adapters and emit placeholder records.
    #[arg(long)]
    preview: bool,
}

impl RunArgs {
    fn into_config(self, mut config: PipelineConfig) -> PipelineConfig {
        if let Some(keywords) = self.keywords {
            config.keywords = keywords;
        }
        if let Some(limit) = self.limit {
            config.limit = limit;
        }
        if let Some(output_dir) = self.output_dir {
            config.output_dir = output_dir;
        }
        if let Some(db_path) = self.db_path {
            config.db_path = db_path;
        }
        if self.proxy_file.is_some() {
            config.proxy_file = self.proxy_file;
        }
        config.inline_proxies = self.proxies;
        if self.sample_proxies {
            config.inline_proxies.extend(sample_free_proxies());
        }
        config.preview = self.preview;
        config
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    match cli.command.unwrap_or(Commands::Run(cli.run)) {
        Commands::Run(args) => {
            let config = args.into_config(PipelineConfig::from_env());
            let span = info_span!("run", preview = config.preview);
            let pipeline = Pipeline::new(config, default_registry(), span);
            let summary = pipeline.run_once().await?;
            println!(
                "run complete: run_id={} sources={} records={} inserted={} skipped={} output_dir={} db={}",
                summary.run_id,
                summary.sources,
                summary.records,
                summary.inserted,
                summary.skipped,
                summary.output_dir,
                summary.db_path
            );
        }
        Commands::Niches { config } => {
            let niche_config = load_niche_config(&config).await?;
            let span = info_span!("niches", config = %config.display());
            let findings = run_niche_pipeline(
                &niche_config,
                &default_registry(),
                &NicheCriteria::default(),
                &span,
            )
            .await?;
            println!("{}", format_findings(&findings));
        }
        Commands::Sources => {
            for adapter in default_registry().iter() {
                let profile = adapter.profile();
                println!(
                    "{:<8} {:<10} {} [{}]",
                    adapter.source_id(),
                    profile.display_name,
                    profile.description,
                    profile.recommended_tools.join(", ")
                );
            }
        }
        Commands::Contacts { db_path } => {
            let db_path = db_path.unwrap_or_else(|| PipelineConfig::from_env().db_path);
            let mut store = ContactStore::open_existing(&db_path).await?;
            println!("{} contacts in {}", store.count().await?, db_path.display());
            for row in store.contacts().await? {
                println!(
                    "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                    row.id,
                    row.source,
                    row.keyword,
                    row.handle,
                    row.url,
                    row.note.unwrap_or_default(),
                    row.created_at
                );
            }
            store.close().await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn bare_invocation_runs_with_defaults() {
        let cli = Cli::try_parse_from(["nls"]).unwrap();
        assert!(cli.command.is_none());
        let config = cli.run.into_config(PipelineConfig::default());
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn top_level_flags_override_config() {
        let cli = Cli::try_parse_from([
            "nls",
            "--keywords",
            "keto",
            "vpn",
            "--limit",
            "3",
            "--proxy",
            "http://a:1",
            "--proxy",
            "http://b:2",
            "--preview",
        ])
        .unwrap();
        let config = cli.run.into_config(PipelineConfig::default());
        assert_eq!(config.keywords, vec!["keto".to_string(), "vpn".to_string()]);
        assert_eq!(config.limit, 3);
        assert_eq!(config.inline_proxies.len(), 2);
        assert!(config.preview);
    }

    #[test]
    fn niches_subcommand_takes_a_config_path() {
        let cli = Cli::try_parse_from(["nls", "niches", "pipeline.yaml"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Niches { ref config }) if config == &PathBuf::from("pipeline.yaml")));
    }

    #[test]
    fn sample_proxies_are_appended() {
        let cli = Cli::try_parse_from(["nls", "--sample-proxies"]).unwrap();
        let config = cli.run.into_config(PipelineConfig::default());
        assert_eq!(config.inline_proxies, sample_free_proxies());
    }
}
