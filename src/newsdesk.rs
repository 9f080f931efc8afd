use anyhow::{bail, Context, Result};

use chrono::Utc;

use techflow::admin::{news_csv, AdminConsole, PasswordGate, TemplateBook};
use techflow::display::{format_date, format_number, time_ago};
use techflow::persist::{GitHubSync, LocalStore, Persistence, RemoteOutcome};
use techflow::portal::{CommentDraft, Portal};
use techflow::projection::{CategoryFilter, SortKey};
use techflow::settings::Settings;
use techflow::source::DocumentSource;
use techflow::store::ContentStore;

const USAGE: &str = "usage: newsdesk [stats | page N [CATEGORY] [SORT] | search QUERY | popular N \
                     | open ID | comment ID AUTHOR TEXT | templates | export FILE | import FILE | csv FILE \
                     | publish TEMPLATE TITLE | delete ID | clear-comments]";

/// Authoring commands read the shared password from this variable.
const PASSWORD_VAR: &str = "NEWSDESK_PASSWORD";

fn unlocked_console(cfg: &Settings) -> Result<AdminConsole> {
    let mut console = AdminConsole::new(PasswordGate::from_hex(&cfg.admin_password_hash)?);
    let password = std::env::var(PASSWORD_VAR).with_context(|| format!("{} is not set", PASSWORD_VAR))?;
    if !console.login(&password) {
        bail!("wrong admin password");
    }
    Ok(console)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    simple_logger::init_with_level(log::Level::Info)?;
    let cfg = Settings::new()?;
    log::info!(
        "Sources: news={} comments={} db={}",
        cfg.news_source,
        cfg.comments_source,
        cfg.database_name
    );
    let http_client = reqwest::Client::new();
    let local = match LocalStore::open(&cfg.database_name, cfg.db_compression_enabled) {
        Ok(local) => Some(local),
        Err(e) => {
            log::warn!("Local store unavailable, changes will NOT be saved: {}", e);
            None
        }
    };

    let mut store = ContentStore::new();
    let summary = store.load(&cfg.sources(), &http_client).await;
    if !summary.failures.is_empty() {
        log::warn!("{} problem(s) while loading source documents", summary.failures.len());
    }
    if let Some(local) = &local {
        local.restore_into(&mut store);
    }
    let persistence =
        local.map(|local| Persistence::new(local, GitHubSync::from_settings(&cfg, http_client.clone())));

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let mut portal = Portal::new(store, cfg.page_size);
    let message = run(&mut portal, &cfg, &http_client, &args).await?;

    if portal.store().is_dirty() {
        match &persistence {
            Some(persistence) => {
                let report = persistence.save(portal.store_mut(), &message).await?;
                match report.remote {
                    RemoteOutcome::Disabled => log::info!("Saved locally"),
                    RemoteOutcome::Synced => log::info!("Saved locally and synced"),
                    RemoteOutcome::Failed(e) => log::warn!("Saved locally only: {}", e),
                }
            }
            None => log::warn!("Changes discarded, no local store to save them to"),
        }
    }
    Ok(())
}

/// Runs one command, returning the commit message for any resulting save.
async fn run(
    portal: &mut Portal,
    cfg: &Settings,
    client: &reqwest::Client,
    args: &[&str],
) -> Result<String> {
    match args {
        [] | ["stats"] => {
            println!("{}", serde_json::to_string_pretty(&portal.store().stats())?);
        }
        ["page", page, rest @ ..] => {
            if let Some(category) = rest.first() {
                portal.filter_by(CategoryFilter::from_slug(category));
            }
            if let Some(sort) = rest.get(1) {
                match SortKey::from_slug(sort) {
                    Some(key) => portal.sort_by(key),
                    None => bail!("unknown sort {}, expected date, popular or comments", sort),
                }
            }
            portal.go_to(page.parse().context("page must be a number")?);
            print_listing(portal);
        }
        ["search", query @ ..] => {
            portal.search(&query.join(" "));
            print_listing(portal);
        }
        ["popular", limit] => {
            let limit: usize = limit.parse().context("limit must be a number")?;
            for item in portal.store().popular(limit) {
                println!("{:>9}  {}  {}", format_number(item.views), item.id, item.title);
            }
        }
        ["open", id] => match portal.open(id) {
            Some(detail) => {
                let now = Utc::now();
                println!("{} {}", detail.item.category.emoji(), detail.item.title);
                println!(
                    "{} · {} · {} views",
                    detail.item.author,
                    format_date(detail.item.date, now.date_naive()),
                    format_number(detail.item.views)
                );
                println!("{}", detail.body_html);
                for comment in detail.comments {
                    println!("  [{}] {}: {}", time_ago(comment.date, now), comment.author, comment.text);
                }
                return Ok(format!("View recorded: {}", detail.item.title));
            }
            None => bail!("no news item with id {}", id),
        },
        ["comment", id, author, text @ ..] => {
            let comment = portal.post_comment(id, CommentDraft::new(author, &text.join(" ")))?;
            println!("Comment {} added", comment.id);
            return Ok(format!("Comment on {}", id));
        }
        ["templates"] => {
            let templates: TemplateBook = DocumentSource::parse(&cfg.templates_source)
                .fetch_json(client)
                .await?;
            let mut names: Vec<&String> = templates.keys().collect();
            names.sort();
            for name in names {
                println!("{}", name);
            }
        }
        ["export", path] => {
            let snapshot = portal.store().export();
            std::fs::write(path, serde_json::to_string_pretty(&snapshot)?)
                .with_context(|| format!("writing {}", path))?;
            log::info!("Exported {} news items to {}", snapshot.data.news.len(), path);
        }
        ["import", path] => {
            let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path))?;
            portal.store_mut().try_import(serde_json::from_str(&raw)?)?;
            return Ok(format!("Import from {}", path));
        }
        ["publish", template, title @ ..] => {
            let console = unlocked_console(cfg)?;
            let templates: TemplateBook = DocumentSource::parse(&cfg.templates_source)
                .fetch_json(client)
                .await?;
            let mut draft = console.apply_template(&templates, template)?;
            draft.title = format!("{}{}", draft.title, title.join(" "));
            let item = console.publish(portal.store_mut(), draft)?;
            println!("Published {}", item.id);
            return Ok(format!("News published: {}", item.title));
        }
        ["delete", id] => {
            let console = unlocked_console(cfg)?;
            if !console.delete(portal.store_mut(), id)? {
                bail!("no news item with id {}", id);
            }
            return Ok(format!("News deleted: {}", id));
        }
        ["clear-comments"] => {
            unlocked_console(cfg)?.clear_comments(portal.store_mut())?;
            return Ok("All comments cleared".to_string());
        }
        ["csv", path] => {
            std::fs::write(path, news_csv(portal.store())?).with_context(|| format!("writing {}", path))?;
        }
        _ => bail!(USAGE),
    }
    Ok("Update content".to_string())
}

fn print_listing(portal: &Portal) {
    let today = Utc::now().date_naive();
    let listing = portal.listing();
    if !listing.ready {
        println!("Content is still loading");
        return;
    }
    if listing.items.is_empty() {
        println!("No news found");
    }
    for item in &listing.items {
        println!(
            "{} {}  {}  {} views, {} comments",
            item.category.emoji(),
            format_date(item.date, today),
            item.title,
            format_number(item.views),
            portal.store().comment_count(&item.id)
        );
    }
    println!(
        "page {}/{} ({} items)",
        listing.page, listing.total_pages, listing.total_items
    );
}
