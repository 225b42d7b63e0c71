use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::{Cell, Table};
use dialoguer::{Confirm, Input, Select};
use serde::Serialize;

use crate::config::{self, Config};
use crate::core::session::{ActionError, Session};
use crate::core::store::PlaylistStore;
use crate::desktop::{self, SystemBrowser};
use crate::models::{is_web_url, LinkRecord, Mood};
use crate::sources::page_title::PageTitleResolver;
use crate::sources::{NoTitles, TitleSource};

#[derive(Parser)]
#[command(name = "moodplayer", about = "Mood-based music link player")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Open the desktop window
    #[arg(long)]
    pub gui: bool,

    /// Links file to use instead of the configured one
    #[arg(long, global = true, value_name = "FILE")]
    pub data: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the links of a mood
    List {
        /// happy, chill, energetic or mixed
        mood: Option<Mood>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Add a link (from the argument, the clipboard or a prompt)
    Add {
        url: Option<String>,
        /// Mood to add into
        #[arg(long)]
        mood: Option<Mood>,
        /// Title to use instead of the page title
        #[arg(long)]
        title: Option<String>,
        /// Do not look up the page title
        #[arg(long)]
        no_fetch: bool,
    },
    /// Delete the N-th link of a mood
    Delete {
        mood: Mood,
        /// Position as shown by `list` (starting at 1)
        index: usize,
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Open the N-th link of a mood in the browser
    Open {
        mood: Mood,
        /// Position as shown by `list` (starting at 1)
        index: usize,
    },
    /// Print the page title of a URL
    Title { url: String },
    /// Interactive playlist shell
    Shell,
    /// Edit settings
    Config,
}

pub fn run(cli: Cli) -> Result<()> {
    let mut cfg = config::load_config();
    if let Some(data) = cli.data {
        cfg.data_file = data;
    }

    match cli.command {
        Some(Commands::List { mood, json }) => cmd_list(&cfg, mood.unwrap_or(cfg.default_mood), json),
        Some(Commands::Add {
            url,
            mood,
            title,
            no_fetch,
        }) => cmd_add(&cfg, url, mood, title, no_fetch),
        Some(Commands::Delete { mood, index, yes }) => cmd_delete(&cfg, mood, index, yes),
        Some(Commands::Open { mood, index }) => cmd_open(&cfg, mood, index),
        Some(Commands::Title { url }) => cmd_title(&cfg, &url),
        Some(Commands::Shell) => cmd_shell(&cfg),
        Some(Commands::Config) => cmd_config(cfg),
        None => {
            if cli.gui {
                #[cfg(feature = "gui")]
                {
                    crate::gui::launch(cfg)
                }
                #[cfg(not(feature = "gui"))]
                {
                    anyhow::bail!("GUI support is not enabled. Rebuild with: cargo build --features gui");
                }
            } else {
                println!("usage: moodplayer <command> or moodplayer --gui");
                println!("Run moodplayer --help for details.");
                Ok(())
            }
        }
    }
}

fn load_session(cfg: &Config, mood: Mood) -> Result<Session> {
    let mut session = Session::new(PlaylistStore::new(), mood);
    session
        .load(&cfg.data_file)
        .context("could not load saved links")?;
    Ok(session)
}

fn title_source(cfg: &Config, no_fetch: bool) -> Box<dyn TitleSource> {
    if no_fetch || !cfg.fetch_titles {
        return Box::new(NoTitles);
    }
    match PageTitleResolver::new(cfg.fetch_timeout()) {
        Ok(resolver) => Box::new(resolver),
        Err(e) => {
            log::warn!("title lookup disabled: {:#}", e);
            Box::new(NoTitles)
        }
    }
}

/// 1-based position from the command line to a view index.
fn position(n: usize) -> Result<usize, ActionError> {
    n.checked_sub(1).ok_or(ActionError::NoSelection)
}

#[derive(Serialize)]
struct ListedLink<'a> {
    mood: Mood,
    #[serde(flatten)]
    link: &'a LinkRecord,
}

fn cmd_list(cfg: &Config, mood: Mood, json: bool) -> Result<()> {
    let session = load_session(cfg, mood)?;
    let rows: Vec<ListedLink> = session
        .store()
        .iter()
        .filter(|(m, _)| mood.is_derived() || *m == mood)
        .map(|(mood, link)| ListedLink { mood, link })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("No links in '{}' yet. Add one with: moodplayer add --mood {}", mood, mood);
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["#", "Mood", "Title", "URL"]);
    for (i, row) in rows.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(row.mood.label()),
            Cell::new(&row.link.title),
            Cell::new(&row.link.url),
        ]);
    }

    println!("{table}");
    println!("\n{}: {} links", mood.label(), rows.len());
    Ok(())
}

fn cmd_add(
    cfg: &Config,
    url: Option<String>,
    mood: Option<Mood>,
    title: Option<String>,
    no_fetch: bool,
) -> Result<()> {
    let mut session = load_session(cfg, mood.unwrap_or(cfg.default_mood))?;
    let titles = title_source(cfg, no_fetch);

    if add_flow(&mut session, titles.as_ref(), url, mood, title)?.is_some() {
        session.save(&cfg.data_file).context("could not save")?;
    }
    Ok(())
}

/// Asks for whatever is missing, then adds the link.
/// Returns `None` when the user cancelled a prompt.
fn add_flow(
    session: &mut Session,
    titles: &dyn TitleSource,
    url: Option<String>,
    mood: Option<Mood>,
    title: Option<String>,
) -> Result<Option<LinkRecord>> {
    let url = match url {
        Some(url) => url,
        None => {
            let clipboard = desktop::clipboard_url();
            match prompt_text("Paste a YouTube/Spotify/Apple Music URL", clipboard.as_deref())? {
                Some(url) => url,
                None => return cancelled(),
            }
        }
    };
    if !is_web_url(url.trim()) {
        return Err(ActionError::InvalidUrl(url).into());
    }

    let target = match session.add_target(mood) {
        Some(target) => target,
        None => prompt_mood("Add to which mood?")?,
    };

    let title = match title {
        Some(title) => title,
        None => match titles.fetch_title(url.trim()) {
            Some(found) => {
                println!("Found title: {}", found);
                found
            }
            None => match prompt_text("Enter a title for this link", None)? {
                Some(title) => title,
                None => return cancelled(),
            },
        },
    };

    session.add(target, &url, &title)?;
    let added = session
        .store()
        .get(target)
        .last()
        .cloned()
        .context("link vanished after add")?;
    println!("Added to {}: {}", target.label(), added.summary());
    Ok(Some(added))
}

fn cancelled<T>() -> Result<Option<T>> {
    println!("Cancelled.");
    Ok(None)
}

fn cmd_delete(cfg: &Config, mood: Mood, n: usize, yes: bool) -> Result<()> {
    let mut session = load_session(cfg, mood)?;
    let index = position(n)?;
    let item = session.selected(index)?.clone();

    if !yes && !confirm_delete(&item, mood)? {
        return Ok(());
    }
    delete_and_save(&mut session, index, &cfg.data_file)
}

fn confirm_delete(item: &LinkRecord, mood: Mood) -> Result<bool> {
    Ok(Confirm::new()
        .with_prompt(format!("Delete \"{}\" from \"{}\"?", item.title, mood))
        .default(false)
        .interact()?)
}

fn delete_and_save(session: &mut Session, index: usize, data_file: &Path) -> Result<()> {
    let removed = session.delete(index)?;
    if session.current().is_derived() {
        println!(
            "Hid \"{}\" from the mixed view. It is still in its own mood.",
            removed.title
        );
        return Ok(());
    }
    println!("Deleted \"{}\".", removed.title);
    session.save(data_file).context("could not save")
}

fn cmd_open(cfg: &Config, mood: Mood, n: usize) -> Result<()> {
    let mut session = load_session(cfg, mood)?;
    session.open(position(n)?, &SystemBrowser)?;
    if let Some(title) = session.now_playing() {
        println!("Now Playing: {}", title);
    }
    Ok(())
}

fn cmd_title(cfg: &Config, url: &str) -> Result<()> {
    match title_source(cfg, false).fetch_title(url) {
        Some(title) => println!("{}", title),
        None => println!("No title found."),
    }
    Ok(())
}

#[derive(Clone, Copy)]
enum ShellAction {
    ChooseMood,
    Add,
    Delete,
    Open,
    Quit,
}

const SHELL_ACTIONS: [(&str, ShellAction); 5] = [
    ("Select mood", ShellAction::ChooseMood),
    ("Add link", ShellAction::Add),
    ("Delete item", ShellAction::Delete),
    ("Open item", ShellAction::Open),
    ("Quit", ShellAction::Quit),
];

fn cmd_shell(cfg: &Config) -> Result<()> {
    let mut session = Session::new(PlaylistStore::new(), cfg.default_mood);
    if let Err(e) = session.load(&cfg.data_file) {
        println!("Could not load: {:#}", e);
    }
    let titles = title_source(cfg, false);
    let labels: Vec<&str> = SHELL_ACTIONS.iter().map(|(label, _)| *label).collect();

    loop {
        print_view(&session);

        let choice = Select::new()
            .with_prompt(format!(
                "[{}] Now Playing: {}",
                session.current().label(),
                session.now_playing().unwrap_or("-")
            ))
            .items(&labels)
            .default(0)
            .interact()?;

        let result = match SHELL_ACTIONS[choice].1 {
            ShellAction::ChooseMood => shell_choose_mood(&mut session),
            ShellAction::Add => shell_add(&mut session, titles.as_ref(), &cfg.data_file),
            ShellAction::Delete => shell_delete(&mut session, &cfg.data_file),
            ShellAction::Open => shell_open(&mut session),
            ShellAction::Quit => break,
        };

        if let Err(e) = result {
            println!("{:#}\n", e);
        }
    }

    Ok(())
}

fn print_view(session: &Session) {
    println!("\n== {} ==", session.current().label());
    if session.view().is_empty() {
        println!("(empty)\n");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["#", "Title", "URL"]);
    for (i, link) in session.view().iter().enumerate() {
        table.add_row(vec![Cell::new(i + 1), Cell::new(&link.title), Cell::new(&link.url)]);
    }
    println!("{table}");
}

fn shell_choose_mood(session: &mut Session) -> Result<()> {
    let labels: Vec<&str> = Mood::ALL.iter().map(|m| m.label()).collect();
    let current = Mood::ALL
        .iter()
        .position(|m| *m == session.current())
        .unwrap_or(0);
    let choice = Select::new()
        .with_prompt("Select mood")
        .items(&labels)
        .default(current)
        .interact()?;
    session.show(Mood::ALL[choice]);
    Ok(())
}

fn shell_add(session: &mut Session, titles: &dyn TitleSource, data_file: &Path) -> Result<()> {
    if add_flow(session, titles, None, None, None)?.is_some() {
        if let Err(e) = session.save(data_file) {
            println!("Could not save: {:#}", e);
        }
    }
    Ok(())
}

fn shell_delete(session: &mut Session, data_file: &Path) -> Result<()> {
    let index = pick_item(session, "Delete which item?")?;
    let item = session.selected(index)?.clone();
    if !confirm_delete(&item, session.current())? {
        return Ok(());
    }
    if let Err(e) = delete_and_save(session, index, data_file) {
        println!("{:#}", e);
    }
    Ok(())
}

fn shell_open(session: &mut Session) -> Result<()> {
    let index = pick_item(session, "Open which item?")?;
    session.open(index, &SystemBrowser)?;
    Ok(())
}

fn pick_item(session: &Session, prompt: &str) -> Result<usize> {
    if session.view().is_empty() {
        return Err(ActionError::NoSelection.into());
    }
    Ok(Select::new()
        .with_prompt(prompt)
        .items(session.view())
        .default(0)
        .interact()?)
}

fn prompt_text(prompt: &str, initial: Option<&str>) -> Result<Option<String>> {
    let mut input = Input::<String>::new().with_prompt(prompt).allow_empty(true);
    if let Some(initial) = initial {
        input = input.with_initial_text(initial);
    }
    let text = input.interact_text()?;
    let text = text.trim();
    Ok((!text.is_empty()).then(|| text.to_string()))
}

fn prompt_mood(prompt: &str) -> Result<Mood> {
    let labels: Vec<&str> = Mood::EDITABLE.iter().map(|m| m.label()).collect();
    let choice = Select::new()
        .with_prompt(prompt)
        .items(&labels)
        .default(0)
        .interact()?;
    Ok(Mood::EDITABLE[choice])
}

fn cmd_config(mut cfg: Config) -> Result<()> {
    println!("Mood Player settings\n");

    let data_file: String = Input::new()
        .with_prompt("Links file")
        .with_initial_text(cfg.data_file.display().to_string())
        .interact_text()?;

    let fetch_titles = Confirm::new()
        .with_prompt("Look up page titles when adding links?")
        .default(cfg.fetch_titles)
        .interact()?;

    let fetch_timeout_secs: u64 = Input::new()
        .with_prompt("Title lookup timeout (seconds)")
        .default(cfg.fetch_timeout_secs)
        .interact_text()?;

    let labels: Vec<&str> = Mood::ALL.iter().map(|m| m.label()).collect();
    let current = Mood::ALL
        .iter()
        .position(|m| *m == cfg.default_mood)
        .unwrap_or(0);
    let mood = Select::new()
        .with_prompt("Mood shown at startup")
        .items(&labels)
        .default(current)
        .interact()?;

    cfg.data_file = PathBuf::from(data_file.trim());
    cfg.fetch_titles = fetch_titles;
    cfg.fetch_timeout_secs = fetch_timeout_secs;
    cfg.default_mood = Mood::ALL[mood];

    config::save_config(&cfg)?;
    println!("\nSettings saved.");
    Ok(())
}
