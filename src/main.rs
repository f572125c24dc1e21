mod analysis;
mod ci;
mod config;
mod provider;
mod report;
mod review;
mod scoring;

use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// PR Reviewer: automated pull-request review combining static analyzers and
/// an LLM reviewer into a quality score, inline comments, and artifacts.
#[derive(Parser, Debug)]
#[command(name = "pr-reviewer", version, about)]
struct Cli {
    /// PR/MR URL, e.g. https://github.com/org/repo/pull/42
    ///
    /// Not required when --mock is used.
    pr_url: Option<String>,

    /// Output directory for review artifacts
    #[arg(short, long, default_value = "artifacts")]
    output: PathBuf,

    /// Skip the LLM reviewer even when an API key is configured
    #[arg(long)]
    no_llm: bool,

    /// Post review comments back to the provider (GitHub only)
    #[arg(long)]
    post_comments: bool,

    /// Use a built-in mock PR for demo purposes (no tokens needed)
    #[arg(long)]
    r#mock: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    info!("loading configuration");
    let config = config::Config::load()?;

    let pr_context = if cli.r#mock {
        info!("using mock PR data for demo");
        build_mock_pr()
    } else {
        let pr_url = cli.pr_url.as_deref().ok_or(
            "PR URL is required unless --mock is used. Usage: pr-reviewer <URL> or pr-reviewer --mock",
        )?;

        info!(url = %pr_url, "parsing PR URL");
        let locator = provider::parse_pr_url(pr_url)?;
        debug!(
            provider = %locator.provider,
            owner = %locator.owner,
            repo = %locator.repo,
            pr = locator.pr_number,
            "parsed PR URL"
        );

        let prov = provider::for_locator(&locator, &config)?;
        info!(provider = prov.name(), "fetching pull request");
        let fetched = prov.fetch_pr(&locator).await?;
        info!(
            files = fetched.files.len(),
            additions = fetched.total_additions(),
            deletions = fetched.total_deletions(),
            "fetched PR metadata"
        );
        fetched
    };

    let llm = if cli.no_llm {
        None
    } else {
        analysis::llm::LlmReviewer::from_config(&config.llm)
    };

    info!("running analysis");
    let findings = analysis::run_all(&pr_context, llm.as_ref()).await;
    info!(findings = findings.len(), "analysis complete");

    info!("scoring and generating review");
    let score = scoring::calculate_score(&findings, &pr_context, &config.weights);
    let review = review::generate_review(&findings, &pr_context);

    let artifact_path = ci::save_artifacts(&review, &score, &pr_context, &cli.output)?;

    if cli.post_comments || config.ci.post_review {
        match ci::post_review_comments(&pr_context, &review.comments, config.github_token()).await
        {
            Ok(count) => info!(count, "posted review comments"),
            Err(err) => warn!(error = %err, "failed to post review comments"),
        }
    }

    report::print_report(&pr_context, &score, &review, &artifact_path);
    info!(score = score.score, grade = %score.grade, "done");

    // CI gate: the exit code reflects review quality.
    if score.score < 60.0 {
        std::process::exit(2);
    } else if score.score < 80.0 {
        std::process::exit(1);
    }
    Ok(())
}

/// Build a mock PrContext from the embedded sample diff fixture. This runs
/// the full pipeline without tokens or network access.
fn build_mock_pr() -> provider::PrContext {
    let diff_text = include_str!("../tests/fixtures/sample_pr.diff");
    let files: Vec<provider::types::FileChange> = provider::diff::split_diff(diff_text)
        .into_iter()
        .map(|file| {
            let (additions, deletions) = provider::diff::count_changes(&file.patch);
            provider::types::FileChange {
                path: file.path,
                additions,
                deletions,
                status: file.status,
                patch: file.patch,
            }
        })
        .collect();

    provider::PrContext {
        provider: "mock".to_string(),
        owner: "acme".to_string(),
        repo: "payments".to_string(),
        pr_number: 42,
        title: "Add OAuth2 login flow".to_string(),
        head_ref: "feature/oauth".to_string(),
        base_ref: "main".to_string(),
        head_sha: "0000000000000000000000000000000000000000".to_string(),
        files,
    }
}
