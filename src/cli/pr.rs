//! `tutils pr`: create a pull request for a configured branch pair and merge it.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::io::Write;
use tokio::io::AsyncBufRead;
use tracing::{debug, warn};

use super::prompt::Prompter;
use super::{AppContext, Flow};
use crate::core::ToolError;
use crate::git;
use crate::repos::github::{self, PullRequestLinks};
use crate::repos::{BranchPair, RepoConfig, RepoRegistry, infer_pairs, parse_remote_slug};

#[derive(Args, Debug, Default)]
pub struct PrCommand {
    /// Repository slug (`owner/name`) or configured name; skips the repository menu
    #[arg(long)]
    repo: Option<String>,

    /// Head branch; with --base skips the branch menu
    #[arg(long, requires = "base")]
    head: Option<String>,

    /// Base branch
    #[arg(long, requires = "head")]
    base: Option<String>,
}

/// What the user picked.
#[derive(Debug)]
struct Selection {
    repo: String,
    pair: BranchPair,
}

/// Outcome of the branch pair menu.
#[derive(Debug, PartialEq)]
enum PairChoice {
    Picked(BranchPair),
    Back,
    Cancel,
}

impl PrCommand {
    pub async fn execute<R, W>(self, ctx: &AppContext, p: &mut Prompter<R, W>) -> Result<Flow>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        ctx.notify_pending_update().await;
        github::ensure_available().await?;

        let mut registry = RepoRegistry::load(&ctx.paths.repos)?;

        p.say("Detecting repository...")?;
        let remote = match git::origin_url(None).await {
            Ok(url) => Some(url),
            Err(e) => {
                debug!("No origin remote: {}", e);
                None
            }
        };

        if let Some(url) = &remote {
            offer_registration(ctx, p, &mut registry, url).await?;
        }

        let detected: Vec<RepoConfig> = match &remote {
            Some(url) => registry.detect(url).into_iter().cloned().collect(),
            None => Vec::new(),
        };
        match detected.as_slice() {
            [] => p.say("Could not detect repository from git remote URL in current folder.")?,
            [one] => p.say(format!("Detected repository: {} in current folder.", one.label().green()))?,
            [first, ..] => p.say(format!(
                "Detected repository: {} (x{} configs) in current folder.",
                first.label().green(),
                detected.len()
            ))?,
        }

        let selection = match self.repo.as_deref() {
            Some(wanted) => {
                let pair = self.head.as_deref().zip(self.base.as_deref());
                select_named(p, &registry, wanted, pair).await?
            }
            None => select(p, &registry, &detected, self.head.zip(self.base)).await?,
        };
        let Some(selection) = selection else {
            p.say("No selection made.".yellow())?;
            return Ok(Flow::Back);
        };

        run_pull_request(p, &selection).await?;
        Ok(Flow::Done)
    }
}

/// Offer to add the current repository when its remote is not configured.
async fn offer_registration<R, W>(
    ctx: &AppContext,
    p: &mut Prompter<R, W>,
    registry: &mut RepoRegistry,
    remote_url: &str,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let Some(slug) = parse_remote_slug(remote_url) else {
        return Ok(());
    };
    if registry.contains_slug(&slug) {
        return Ok(());
    }

    let question =
        format!("Repository {slug} detected but not present in config. Add it with inferred branches?");
    if !p.confirm(&question, false).await? {
        return Ok(());
    }

    let branches = match git::remote_heads(None).await {
        Ok(branches) => branches,
        Err(e) => {
            warn!("Could not list remote branches: {}", e);
            Vec::new()
        }
    };
    let pairs = infer_pairs(&branches);
    let count = pairs.len();
    registry.push(RepoConfig::from_slug(&slug, pairs));

    match registry.save(&ctx.paths.repos) {
        Ok(()) => p.say(format!("Added {slug} to {} with {count} pairs.", ctx.paths.repos.display())),
        Err(e) => p.say(format!("Failed to add repository to repos.json: {e:#}").red()),
    }
}

/// Repository, then branch pair. "Back" in the pair menu returns to the repository menu.
async fn select<R, W>(
    p: &mut Prompter<R, W>,
    registry: &RepoRegistry,
    detected: &[RepoConfig],
    pair_override: Option<(String, String)>,
) -> Result<Option<Selection>>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    if registry.is_empty() && detected.is_empty() {
        return Err(ToolError::Other {
            message: "No repositories configured. Run tutils pr inside a git repository to add one."
                .to_string(),
        }
        .into());
    }

    loop {
        let Some(repo) = choose_repository(p, registry, detected).await? else {
            return Ok(None);
        };

        if let Some((head, base)) = &pair_override {
            return Ok(Some(Selection {
                repo: repo.repo.clone(),
                pair: BranchPair::new(head.as_str(), base.as_str()),
            }));
        }

        match choose_pair(p, repo).await? {
            PairChoice::Picked(pair) => {
                return Ok(Some(Selection {
                    repo: repo.repo.clone(),
                    pair,
                }));
            }
            PairChoice::Back => continue,
            PairChoice::Cancel => return Ok(None),
        }
    }
}

/// `--repo` given: no repository menu.
///
/// A known repository goes straight to its pair menu, or to its only pair.
/// An unknown one is used as a slug only together with `--head`/`--base`.
async fn select_named<R, W>(
    p: &mut Prompter<R, W>,
    registry: &RepoRegistry,
    wanted: &str,
    pair_override: Option<(&str, &str)>,
) -> Result<Option<Selection>>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let config = registry.find(wanted);

    if let Some((head, base)) = pair_override {
        let repo = config.map_or_else(|| wanted.to_string(), |c| c.repo.clone());
        return Ok(Some(Selection {
            repo,
            pair: BranchPair::new(head, base),
        }));
    }

    let Some(config) = config else {
        return Err(ToolError::InvalidInput {
            reason: format!(
                "repository '{wanted}' is not in repos.json; pass --head and --base to use it anyway"
            ),
        }
        .into());
    };

    if let [only] = config.pairs.as_slice() {
        return Ok(Some(Selection {
            repo: config.repo.clone(),
            pair: only.clone(),
        }));
    }

    // no repository menu to go back to
    match choose_pair(p, config).await? {
        PairChoice::Picked(pair) => Ok(Some(Selection {
            repo: config.repo.clone(),
            pair,
        })),
        PairChoice::Back | PairChoice::Cancel => Ok(None),
    }
}

async fn choose_pair<R, W>(p: &mut Prompter<R, W>, repo: &RepoConfig) -> Result<PairChoice>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    if repo.pairs.is_empty() {
        p.say("No branch pairs configured for this repository.".red())?;
        return Ok(PairChoice::Cancel);
    }

    let mut choices = vec!["Back".to_string()];
    choices.extend(repo.pairs.iter().map(ToString::to_string));
    choices.push("Cancel".to_string());

    let title = format!("Select branch pair for {} ({}):", repo.display_name(), repo.repo);
    Ok(match p.select(&title, &choices).await? {
        Some(0) => PairChoice::Back,
        Some(i) if i <= repo.pairs.len() => PairChoice::Picked(repo.pairs[i - 1].clone()),
        _ => PairChoice::Cancel,
    })
}

async fn choose_repository<'a, R, W>(
    p: &mut Prompter<R, W>,
    registry: &'a RepoRegistry,
    detected: &'a [RepoConfig],
) -> Result<Option<&'a RepoConfig>>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    if let Some(first) = detected.first() {
        let title = format!("Detected repository: {}\nWhat do you want to do?", first.label());
        let choices = ["Use detected repository", "Choose another repository", "Cancel"];
        match p.select(&title, &choices).await? {
            Some(0) => return Ok(Some(first)),
            Some(1) => {}
            _ => return Ok(None),
        }
    }

    if registry.is_empty() {
        return Ok(None);
    }
    let labels: Vec<String> = registry.repos.iter().map(RepoConfig::label).collect();
    let picked = p.select("Select a repository to create and merge a pull request:", &labels).await?;
    Ok(picked.map(|i| &registry.repos[i]))
}

async fn run_pull_request<R, W>(p: &mut Prompter<R, W>, selection: &Selection) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let Selection {
        repo,
        pair,
    } = selection;

    p.say(format!(
        "Creating pull request from '{}' to '{}' for '{}'...",
        pair.head.cyan(),
        pair.base.cyan(),
        repo
    ))?;
    github::create_pull_request(repo, pair).await?;

    let number = github::find_pull_request(repo, &pair.head).await?.ok_or_else(|| ToolError::Other {
        message: format!("Could not find an open pull request from '{}' in {repo}", pair.head),
    })?;

    p.say(format!("Merging pull request #{number}..."))?;
    github::merge_pull_request(repo, &number).await?;

    let links = PullRequestLinks::new(repo, &number);
    p.say("Pull request created and merged.".green().bold())?;
    p.say(format!("  Repository:   {}", links.repository))?;
    p.say(format!("  Pull request: {}", links.pull_request))?;
    p.say(format!("  Actions:      {}", links.actions))
}
