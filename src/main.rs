use clap::Parser;
use miette::Result;
use tracing_subscriber::EnvFilter;

use quill_core::BotConfig;
use quill_diff::filter::DiffFilter;
use quill_review::backend::build_backend;
use quill_review::github::GitHubClient;
use quill_review::pipeline::{ReviewOutcome, ReviewPipeline};

#[derive(Parser)]
#[command(
    name = "quill",
    version,
    about = "Review a GitHub pull request with an LLM and post the feedback as a comment",
    long_about = "Review a GitHub pull request with an LLM and post the feedback as a comment.\n\n\
                   Designed to run inside a GitHub Actions `pull_request` workflow: every option\n\
                   falls back to the environment variable shown in its help.\n\n\
                   Examples:\n  \
                     quill                              Review with Gemini (needs GEMINI_API_KEY)\n  \
                     quill --backend ollama             Review with a local CodeLlama model\n  \
                     quill --dry-run                    Print the comment instead of posting it\n  \
                     quill --exclude '**/*.lock,docs/**' Override the exclude patterns"
)]
struct Cli {
    /// GitHub API token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    /// Repository as owner/name
    #[arg(long, env = "GITHUB_REPOSITORY")]
    repository: Option<String>,

    /// Pull request ref (refs/pull/<number>/merge)
    #[arg(long, env = "GITHUB_REF")]
    git_ref: Option<String>,

    /// GitHub REST API base URL
    #[arg(long, env = "GITHUB_API_URL")]
    github_api_url: Option<String>,

    /// Generation backend: gemini or ollama
    #[arg(long, env = "QUILL_BACKEND")]
    backend: Option<String>,

    /// API key for the Gemini backend
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    gemini_api_key: Option<String>,

    /// Gemini model (default: gemini-1.5-flash)
    #[arg(long, env = "GEMINI_MODEL")]
    gemini_model: Option<String>,

    /// Gemini API base, up to and including /models
    #[arg(long, env = "GEMINI_ENDPOINT", hide = true)]
    gemini_endpoint: Option<String>,

    /// Ollama server address (default: http://localhost:11434)
    #[arg(long, env = "OLLAMA_ADDRESS")]
    ollama_address: Option<String>,

    /// Ollama model (default: codellama)
    #[arg(long, env = "OLLAMA_MODEL")]
    ollama_model: Option<String>,

    /// Comma-separated globs whose diff headers are dropped (default: **/*.json,**/*.md)
    #[arg(long, env = "QUILL_EXCLUDE")]
    exclude: Option<String>,

    /// Print the comment to stdout instead of posting it
    #[arg(long)]
    dry_run: bool,

    /// Enable debug logging
    #[arg(long, short)]
    verbose: bool,
}

impl Cli {
    /// Map the configuration variable names onto the parsed options.
    fn lookup(&self, key: &str) -> Option<String> {
        let value = match key {
            "GITHUB_TOKEN" => &self.github_token,
            "GITHUB_REPOSITORY" => &self.repository,
            "GITHUB_REF" => &self.git_ref,
            "GITHUB_API_URL" => &self.github_api_url,
            "QUILL_BACKEND" => &self.backend,
            "GEMINI_API_KEY" => &self.gemini_api_key,
            "GEMINI_MODEL" => &self.gemini_model,
            "GEMINI_ENDPOINT" => &self.gemini_endpoint,
            "OLLAMA_ADDRESS" => &self.ollama_address,
            "OLLAMA_MODEL" => &self.ollama_model,
            "QUILL_EXCLUDE" => &self.exclude,
            _ => return None,
        };
        value.clone()
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "info,quill_bot=debug,quill_core=debug,quill_diff=debug,quill_review=debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = BotConfig::from_lookup(|key| cli.lookup(key))?;
    tracing::debug!(
        pr = %config.pull_request,
        backend = %config.backend,
        exclude = ?config.exclude_patterns,
        "resolved configuration"
    );

    let filter = DiffFilter::from_config(&config)?;
    let github = GitHubClient::from_config(&config)?;
    let backend = build_backend(&config)?;

    let outcome = ReviewPipeline::new(&github, backend.as_ref(), filter)
        .dry_run(cli.dry_run)
        .run(&config.pull_request)
        .await?;

    if let ReviewOutcome::DryRun { body } = &outcome {
        println!("{body}");
    }

    Ok(())
}
