mod cli;
mod config;
mod effects;
mod logging;
mod render;
mod session;

use std::process;
use std::sync::Arc;

use anyhow::Context;
use feed_logging::{feed_info, feed_warn};
use threadfeed_core::Msg;
use threadfeed_engine::{
    ensure_store_dir, EngineHandle, ForumListingExtractor, IgnoreStore, ReqwestFetcher,
    TriggerSource,
};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::cli::{CliError, Command, LookupKey, ScrollOptions, USAGE};
use crate::config::AppConfig;
use crate::render::TextTail;
use crate::session::FeedSession;

fn main() -> anyhow::Result<()> {
    let cli = match cli::parse_args(std::env::args().skip(1)) {
        Ok(cli) => cli,
        Err(CliError::Help) => {
            println!("{USAGE}");
            return Ok(());
        }
        Err(CliError::Usage(message)) => {
            eprintln!("error: {message}\n\n{USAGE}");
            process::exit(2);
        }
    };

    let config = config::load_config(cli.config.as_deref())?;
    logging::initialize(config.log_destination, config.log_level());
    feed_info!("threadfeed starting, store at {:?}", config.store_path);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")?;
    runtime.block_on(run(cli.command, &config))
}

async fn run(command: Command, config: &AppConfig) -> anyhow::Result<()> {
    let store = open_store(config)?;
    match command {
        Command::Scroll(options) => scroll(options, config, store).await,
        Command::Ignore { url, ids, pages } => ignore(&url, &ids, pages, config, store).await,
        Command::Unignore { ids } => {
            let mut session = build_session(config, store)?;
            for id in ids {
                if session.unignore(&id).await? {
                    println!("unignored {id}");
                } else {
                    println!("{id} was not ignored");
                }
            }
            Ok(())
        }
        Command::Lookup(key) => {
            let entry = match &key {
                LookupKey::Id(id) => store.get_by_key(id).await?,
                LookupKey::Url(url) => store.get_by_index(url).await?,
            };
            match entry {
                Some(data) => println!("ignored: {}\n    {}", data.title, data.url),
                None => println!("not ignored"),
            }
            Ok(())
        }
        Command::Ignored { json } => {
            let entries = store.entries().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                for entry in &entries {
                    println!("[{}] {}\n    {}", entry.id, entry.data.title, entry.data.url);
                }
                println!("{} ignored threads", entries.len());
            }
            Ok(())
        }
    }
}

fn open_store(config: &AppConfig) -> anyhow::Result<IgnoreStore> {
    if let Some(dir) = config.store_path.parent() {
        ensure_store_dir(dir)
            .with_context(|| format!("cannot use store directory {}", dir.display()))?;
    }
    Ok(IgnoreStore::new(&config.store_path))
}

fn build_session(config: &AppConfig, store: IgnoreStore) -> anyhow::Result<FeedSession> {
    let extractor = ForumListingExtractor::new(&config.listing_selectors())?;
    let fetcher = ReqwestFetcher::new(config.fetch_settings());
    let (engine, events) = EngineHandle::new(Arc::new(fetcher), Arc::new(extractor), store);
    Ok(FeedSession::new(
        engine,
        events,
        TriggerSource::new(),
        config.retry_policy(),
    ))
}

async fn open_listing(
    url: &str,
    config: &AppConfig,
    store: IgnoreStore,
) -> anyhow::Result<FeedSession> {
    let mut session = build_session(config, store)?;
    session
        .open(url)
        .await
        .with_context(|| format!("could not load listing {url}"))?;
    Ok(session)
}

/// Load up to `limit` further pages, or until pagination stops.
async fn load_pages(session: &mut FeedSession, limit: Option<u32>) {
    let mut loaded = 0;
    while limit.is_none_or(|limit| loaded < limit) {
        if !session.load_more().await {
            break;
        }
        loaded += 1;
    }
}

async fn scroll(options: ScrollOptions, config: &AppConfig, store: IgnoreStore) -> anyhow::Result<()> {
    let mut session = open_listing(&options.url, config, store).await?;

    if options.follow && !options.json {
        follow(&mut session).await?;
    } else {
        load_pages(&mut session, options.pages).await;
    }

    if options.ignore_all {
        session.dispatch(Msg::IgnoreAllRequested);
        session.settle().await;
    }
    if options.show_hidden {
        session.dispatch(Msg::ShowHiddenRequested);
    }

    let view = session.state().view();
    if options.json {
        println!("{}", render::render_json(&view)?);
    } else if options.follow {
        println!("{}", render::summary_line(&view));
    } else {
        print!("{}", render::render_text(&view));
    }
    Ok(())
}

/// Print the listing as it grows: every line read from stdin fires the
/// trigger once. Ends on EOF, `q`, or when there is nothing left to load.
async fn follow(session: &mut FeedSession) -> anyhow::Result<()> {
    let mut tail = TextTail::new();
    print!("{}", tail.take_new(&session.state().view()));
    session.state_mut().consume_dirty();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim() == "q" {
            break;
        }
        if !session.load_more().await {
            break;
        }
        if session.state_mut().consume_dirty() {
            print!("{}", tail.take_new(&session.state().view()));
        }
        if session.is_terminal() {
            break;
        }
    }
    Ok(())
}

async fn ignore(
    url: &str,
    ids: &[String],
    pages: Option<u32>,
    config: &AppConfig,
    store: IgnoreStore,
) -> anyhow::Result<()> {
    let mut session = open_listing(url, config, store).await?;
    let mut loaded = 0;
    while !ids.iter().all(|id| session.state().is_known(id))
        && pages.is_none_or(|limit| loaded < limit)
    {
        if !session.load_more().await {
            break;
        }
        loaded += 1;
    }

    for id in ids {
        let Some(item) = session.state().item(id) else {
            feed_warn!("thread {} not found in {}", id, url);
            println!("{id} not found in the listing");
            continue;
        };
        println!("ignored [{}] {}", item.id, item.title);
        session.dispatch(Msg::IgnoreRequested(id.clone()));
    }
    session.settle().await;
    Ok(())
}
