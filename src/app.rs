use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tracing::{debug, info};

use crate::config::{self, Config};
use crate::deck::{DeckIndexStore, Subject};
use crate::group::{group_posts, AuthorBucket};
use crate::input::{load_dataset, sort_newest_first, Dataset};
use crate::layout::{feed_layout, timeline_layout};
use crate::post::{CategoryMap, Post};
use crate::render::{render_feed, render_thread, render_timeline, TextHost};
use crate::telemetry;
use crate::thread::ThreadPaginator;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Feed {
        input: PathBuf,
    },
    Timeline {
        input: PathBuf,
        user: Option<String>,
    },
    Thread {
        input: PathBuf,
        post_id: String,
        show_all: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command: Command,
    pub config_file: Option<PathBuf>,
}

pub fn parse_args<I>(args: I) -> Result<Invocation>
where
    I: IntoIterator<Item = String>,
{
    let mut config_file = None;
    let mut user = None;
    let mut show_all = false;
    let mut positional = Vec::new();

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args.next().context("--config expects a path")?;
                config_file = Some(PathBuf::from(path));
            }
            "--user" => {
                user = Some(args.next().context("--user expects a username")?);
            }
            "--all" => show_all = true,
            flag if flag.starts_with("--") => bail!("unknown option {flag}"),
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let verb = positional
        .next()
        .context("expected a command: feed, timeline or thread")?;
    let input = positional
        .next()
        .map(PathBuf::from)
        .with_context(|| format!("{verb} expects a posts file"))?;
    let command = match verb.as_str() {
        "feed" => Command::Feed { input },
        "timeline" => Command::Timeline { input, user },
        "thread" => Command::Thread {
            input,
            post_id: positional.next().context("thread expects a post id")?,
            show_all,
        },
        other => bail!("unknown command {other}"),
    };
    if let Some(extra) = positional.next() {
        bail!("unexpected argument {extra}");
    }

    Ok(Invocation {
        command,
        config_file,
    })
}

pub fn run() -> Result<()> {
    let invocation = parse_args(std::env::args().skip(1))?;
    let cfg = config::load(config::LoadOptions {
        config_file: invocation.config_file.clone(),
        env_prefix: None,
    })
    .context("load config")?;
    telemetry::init_logging(&cfg.log);
    debug!(?invocation, "starting");

    let output = execute(&invocation.command, &cfg)?;
    print!("{output}");
    Ok(())
}

/// Runs one command and returns the rendered text.
pub fn execute(command: &Command, cfg: &Config) -> Result<String> {
    let input = match command {
        Command::Feed { input } | Command::Timeline { input, .. } | Command::Thread { input, .. } => {
            input
        }
    };
    let mut dataset = load_dataset(input).context("load posts")?;
    sort_newest_first(&mut dataset.posts);
    info!(
        posts = dataset.posts.len(),
        replies = dataset.replies.len(),
        "dataset loaded"
    );

    let host = TextHost::new();
    let store = DeckIndexStore::new();
    let output = match command {
        Command::Feed { .. } => {
            let sorted = group_posts(&dataset.posts).into_sorted();
            let subjects = feed_layout(sorted.iter().map(|entry| &entry.data), cfg.layout.row_capacity);
            render_feed(&subjects, &store, &host, cfg.layout.width)
        }
        Command::Timeline { user, .. } => timeline_text(&dataset, user.as_deref(), cfg, &host, &store)?,
        Command::Thread {
            post_id, show_all, ..
        } => {
            if !dataset.posts.iter().any(|post| &post.id == post_id) {
                bail!("no post with id {post_id}");
            }
            let thread = ThreadPaginator::with_preview_limit(post_id.as_str(), cfg.thread.preview_limit);
            let mut replies = dataset.replies_for(post_id);
            replies.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            render_thread(&thread, &replies, *show_all, cfg.layout.width)
        }
    };
    Ok(output)
}

fn timeline_text(
    dataset: &Dataset,
    user: Option<&str>,
    cfg: &Config,
    host: &TextHost,
    store: &DeckIndexStore,
) -> Result<String> {
    let grouped;
    let all: CategoryMap<Vec<Post>>;
    let lists: CategoryMap<&[Post]> = match user {
        Some(name) => {
            grouped = group_posts(&dataset.posts);
            let bucket = grouped
                .iter()
                .find(|bucket| matches_user(bucket, name))
                .with_context(|| format!("no posts by {name}"))?;
            bucket.posts.map(|_, posts| posts.as_slice())
        }
        None => {
            all = CategoryMap::from_fn(|category| {
                dataset
                    .posts
                    .iter()
                    .filter(|post| post.category() == Some(category))
                    .cloned()
                    .collect()
            });
            all.map(|_, posts| posts.as_slice())
        }
    };
    let layout = timeline_layout(Subject::from_handle(user), lists, cfg.layout.row_capacity);
    Ok(render_timeline(&layout, store, host, cfg.layout.width))
}

fn matches_user(bucket: &AuthorBucket, name: &str) -> bool {
    bucket.author.handle() == name || bucket.author.id == name
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_commands_and_options() {
        let inv = parse_args(args(&["timeline", "posts.json", "--user", "ada", "--config", "c.yaml"])).unwrap();
        assert_eq!(
            inv.command,
            Command::Timeline {
                input: PathBuf::from("posts.json"),
                user: Some("ada".into())
            }
        );
        assert_eq!(inv.config_file, Some(PathBuf::from("c.yaml")));

        let thread = parse_args(args(&["thread", "posts.json", "p1", "--all"])).unwrap();
        assert!(matches!(thread.command, Command::Thread { show_all: true, .. }));
    }

    #[test]
    fn rejects_bad_invocations() {
        assert!(parse_args(args(&[])).is_err());
        assert!(parse_args(args(&["feed"])).is_err());
        assert!(parse_args(args(&["graph", "x.json"])).is_err());
        assert!(parse_args(args(&["feed", "x.json", "--user"])).is_err());
        assert!(parse_args(args(&["feed", "x.json", "--bogus"])).is_err());
        assert!(parse_args(args(&["feed", "x.json", "extra"])).is_err());
    }

    #[test]
    fn executes_each_command_against_a_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("posts.json");
        fs::write(
            &path,
            r#"{
                "posts": [
                    {"id": "a1", "author": {"id": "1", "username": "ada"}, "type": "thoughts", "content": "hello", "created_at": "2024-03-01T10:00:00Z"},
                    {"id": "b1", "author": {"id": "2", "username": "bob"}, "type": "media", "content": "pic", "created_at": "2024-03-02T10:00:00Z"}
                ],
                "replies": [
                    {"id": "r1", "post_id": "a1", "content": "nice", "author": {"id": "2", "username": "bob"}}
                ]
            }"#,
        )
        .unwrap();
        let cfg = Config::default();

        let feed = execute(&Command::Feed { input: path.clone() }, &cfg).unwrap();
        let bob = feed.find("== bob").unwrap();
        let ada = feed.find("== ada").unwrap();
        assert!(bob < ada);

        let timeline = execute(
            &Command::Timeline {
                input: path.clone(),
                user: Some("ada".into()),
            },
            &cfg,
        )
        .unwrap();
        assert!(timeline.starts_with("== ada  Thoughts 1 *"));
        assert!(timeline.contains("No media yet"));

        let thread = execute(
            &Command::Thread {
                input: path.clone(),
                post_id: "a1".into(),
                show_all: false,
            },
            &cfg,
        )
        .unwrap();
        assert!(thread.contains("bob"));
        assert!(thread.contains("nice"));

        let missing = execute(
            &Command::Timeline {
                input: path,
                user: Some("zed".into()),
            },
            &cfg,
        );
        assert!(missing.is_err());
    }
}
