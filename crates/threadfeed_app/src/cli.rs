use std::path::PathBuf;

pub const USAGE: &str = "\
usage: threadfeed [--config FILE] <command>

commands:
  scroll <listing-url> [--pages N] [--follow] [--show-hidden] [--ignore-all] [--json]
  ignore <listing-url> <id>... [--pages N]
  unignore <id>...
  lookup (--id ID | --url URL)
  ignored [--json]";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("help requested")]
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cli {
    pub config: Option<PathBuf>,
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollOptions {
    pub url: String,
    /// Additional pages to load after the first; `None` loads to the end.
    pub pages: Option<u32>,
    pub follow: bool,
    pub show_hidden: bool,
    pub ignore_all: bool,
    pub json: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupKey {
    Id(String),
    Url(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Scroll(ScrollOptions),
    Ignore {
        url: String,
        ids: Vec<String>,
        pages: Option<u32>,
    },
    Unignore {
        ids: Vec<String>,
    },
    Lookup(LookupKey),
    Ignored {
        json: bool,
    },
}

/// Parse arguments without the program name.
pub fn parse_args<I, S>(args: I) -> Result<Cli, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut config = None;
    let mut flags = Flags::default();
    let mut positional = Vec::new();

    let mut args = args.into_iter().map(Into::into);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Err(CliError::Help),
            "--config" => config = Some(PathBuf::from(value_for(&arg, args.next())?)),
            "--pages" => {
                let raw = value_for(&arg, args.next())?;
                let pages = raw
                    .parse()
                    .map_err(|_| CliError::Usage(format!("--pages expects a number, got {raw:?}")))?;
                flags.pages = Some(pages);
            }
            "--id" => flags.id = Some(value_for(&arg, args.next())?),
            "--url" => flags.url = Some(value_for(&arg, args.next())?),
            "--follow" => flags.follow = true,
            "--show-hidden" => flags.show_hidden = true,
            "--ignore-all" => flags.ignore_all = true,
            "--json" => flags.json = true,
            other if other.starts_with("--") => {
                return Err(CliError::Usage(format!("unknown option {other}")));
            }
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let Some(name) = positional.next() else {
        return Err(CliError::Usage("missing command".to_string()));
    };
    let rest: Vec<String> = positional.collect();

    let command = match name.as_str() {
        "scroll" => {
            let [url] = expect_args::<1>(&name, rest)?;
            Command::Scroll(ScrollOptions {
                url,
                pages: flags.pages,
                follow: flags.follow,
                show_hidden: flags.show_hidden,
                ignore_all: flags.ignore_all,
                json: flags.json,
            })
        }
        "ignore" => {
            let mut rest = rest.into_iter();
            let url = rest
                .next()
                .ok_or_else(|| CliError::Usage("ignore needs a listing url".to_string()))?;
            let ids: Vec<String> = rest.collect();
            if ids.is_empty() {
                return Err(CliError::Usage("ignore needs at least one id".to_string()));
            }
            Command::Ignore {
                url,
                ids,
                pages: flags.pages,
            }
        }
        "unignore" => {
            if rest.is_empty() {
                return Err(CliError::Usage("unignore needs at least one id".to_string()));
            }
            Command::Unignore { ids: rest }
        }
        "lookup" => {
            expect_args::<0>(&name, rest)?;
            match (flags.id, flags.url) {
                (Some(id), None) => Command::Lookup(LookupKey::Id(id)),
                (None, Some(url)) => Command::Lookup(LookupKey::Url(url)),
                _ => {
                    return Err(CliError::Usage(
                        "lookup needs exactly one of --id or --url".to_string(),
                    ))
                }
            }
        }
        "ignored" => {
            expect_args::<0>(&name, rest)?;
            Command::Ignored { json: flags.json }
        }
        other => return Err(CliError::Usage(format!("unknown command {other}"))),
    };

    Ok(Cli { config, command })
}

#[derive(Debug, Default)]
struct Flags {
    pages: Option<u32>,
    id: Option<String>,
    url: Option<String>,
    follow: bool,
    show_hidden: bool,
    ignore_all: bool,
    json: bool,
}

fn value_for(flag: &str, value: Option<String>) -> Result<String, CliError> {
    value.ok_or_else(|| CliError::Usage(format!("{flag} expects a value")))
}

fn expect_args<const N: usize>(command: &str, rest: Vec<String>) -> Result<[String; N], CliError> {
    let count = rest.len();
    rest.try_into().map_err(|_| {
        CliError::Usage(format!(
            "{command} takes {N} argument(s), got {count}"
        ))
    })
}
