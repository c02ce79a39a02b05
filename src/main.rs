use std::path::{Path, PathBuf};

use unspool::api::{collect_bounded, ApiClient, TimelineQuery};
use unspool::archive::search::{ArchiveSearcher, SearchSort};
use unspool::archive::{ArchiveWriter, WriteOutcome, WritePolicy};
use unspool::batch;
use unspool::cli::{Cli, Commands, ConfigAction};
use unspool::config::Config;
use unspool::error::{Result, UnspoolError};
use unspool::export::{start_time_from_date, CsvExporter};
use unspool::threads::{self, ReplyJoin};

/// Default cap for the export command, which flattens whole timelines
const DEFAULT_EXPORT_MAX_RESULTS: usize = 1000;

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    init_logging(cli.verbose, cli.export_logs_path.as_deref())?;

    match cli.command {
        Commands::Fetch {
            username,
            output_directory,
            max_results,
            after_id,
            since_id,
            dry_run,
            overwrite,
            overwrite_tweet_content,
        } => {
            cmd_fetch(FetchArgs {
                config: cli.config,
                username,
                output_directory,
                max_results,
                after_id,
                since_id,
                dry_run,
                policy: write_policy(overwrite, overwrite_tweet_content),
            })?;
        }
        Commands::Update {
            input_path,
            mode,
            output_directory,
            max_results,
            dry_run,
            overwrite,
            overwrite_tweet_content,
        } => {
            cmd_update(
                cli.config,
                &input_path,
                &mode,
                output_directory,
                max_results,
                dry_run,
                write_policy(overwrite, overwrite_tweet_content),
            )?;
        }
        Commands::Search {
            sort,
            directory,
            username,
            export_results_path,
        } => {
            cmd_search(&sort, &directory, username, export_results_path)?;
        }
        Commands::Export {
            username,
            input_file,
            output_file,
            max_results,
            start_date,
            after_id,
            since_id,
            dry_run,
            overwrite,
        } => {
            cmd_export(ExportArgs {
                config: cli.config,
                username,
                input_file,
                output_file,
                max_results,
                start_date,
                after_id,
                since_id,
                dry_run,
                overwrite,
            })?;
        }
        Commands::Config { action } => {
            cmd_config(cli.config, action)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool, export_logs_path: Option<&Path>) -> Result<()> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{fmt, EnvFilter};

    let default_filter = if verbose { "unspool=debug" } else { "unspool=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr));

    match export_logs_path {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| UnspoolError::Io {
                    source: e,
                    context: format!("Failed to open log export file: {}", path.display()),
                })?;
            registry
                .with(
                    fmt::layer()
                        .with_target(false)
                        .with_ansi(false)
                        .with_writer(std::sync::Mutex::new(file)),
                )
                .init();
        }
        None => registry.init(),
    }

    Ok(())
}

fn write_policy(overwrite: bool, overwrite_tweet_content: bool) -> WritePolicy {
    if overwrite_tweet_content {
        WritePolicy::OverwriteTweetContent
    } else if overwrite {
        WritePolicy::Overwrite
    } else {
        WritePolicy::SkipExisting
    }
}

struct FetchArgs {
    config: Option<PathBuf>,
    username: String,
    output_directory: Option<PathBuf>,
    max_results: Option<usize>,
    after_id: Option<String>,
    since_id: Option<String>,
    dry_run: bool,
    policy: WritePolicy,
}

fn cmd_fetch(args: FetchArgs) -> Result<()> {
    let config = load_config(args.config)?;
    let token = config.bearer_token()?;

    if args.dry_run {
        println!("Running in dry-run mode. This will not write to file.");
    }

    let directory = args
        .output_directory
        .unwrap_or_else(|| config.output.directory.clone());
    prepare_output_directory(&directory, args.dry_run)?;

    let client = ApiClient::new(&config.api.base_url, &token)?;
    let writer = ArchiveWriter::new(
        directory,
        args.policy,
        args.dry_run,
        config.output.title_max_chars,
    );
    let query = TimelineQuery {
        page_size: config.api.page_size,
        start_time: None,
        since_id: args.since_id,
        until_id: args.after_id,
    };
    let max_results = args.max_results.unwrap_or(config.output.max_results);

    archive_user(&client, &args.username, &query, max_results, &writer)
}

fn cmd_update(
    config_path: Option<PathBuf>,
    input_path: &Path,
    mode: &str,
    output_directory: Option<PathBuf>,
    max_results: Option<usize>,
    dry_run: bool,
    policy: WritePolicy,
) -> Result<()> {
    let config = load_config(config_path)?;
    let token = config.bearer_token()?;

    if dry_run {
        println!("Running in dry-run mode. This will not write to file.");
    }

    tracing::info!("Using input file: {}", input_path.display());
    let entries = batch::read_update_entries(input_path)?;
    if entries.is_empty() {
        tracing::info!("No users to update");
        return Ok(());
    }

    let directory = output_directory.unwrap_or_else(|| config.output.directory.clone());
    prepare_output_directory(&directory, dry_run)?;

    let client = ApiClient::new(&config.api.base_url, &token)?;
    let writer = ArchiveWriter::new(directory, policy, dry_run, config.output.title_max_chars);
    let max_results = max_results.unwrap_or(config.output.max_results);

    for entry in entries {
        tracing::info!("Updating {}, tweet ID {}", entry.username, entry.tweet_id);

        let query = TimelineQuery {
            page_size: config.api.page_size,
            start_time: None,
            since_id: (mode == "since").then(|| entry.tweet_id.clone()),
            until_id: (mode == "after").then(|| entry.tweet_id.clone()),
        };

        // One user's failure does not abort the remaining users
        if let Err(e) = archive_user(&client, &entry.username, &query, max_results, &writer) {
            tracing::error!("Skipping {}: {}", entry.username, e);
        }
    }

    Ok(())
}

/// The shared per-user pipeline: look up the user, paginate the timeline,
/// condense threads, drop replies to other users, write each document.
fn archive_user(
    client: &ApiClient,
    username: &str,
    query: &TimelineQuery,
    max_results: usize,
    writer: &ArchiveWriter,
) -> Result<()> {
    let user = client.lookup_user(username)?;

    let mut timeline = client.user_timeline(&user.id, query);
    let tweets = collect_bounded(&mut timeline, max_results)?;
    if tweets.is_empty() {
        tracing::info!("No tweets found for user {}", username);
        return Ok(());
    }

    let condensed = threads::condense(tweets, ReplyJoin::Annotated);

    let mut written = 0;
    let mut skipped = 0;
    for tweet in &condensed {
        // A thread rooted in a reply to someone else is not this user's own
        if tweet
            .in_reply_to_user_id
            .as_deref()
            .is_some_and(|id| id != user.id)
        {
            continue;
        }

        match writer.write(&user.username, tweet)? {
            WriteOutcome::Skipped => skipped += 1,
            WriteOutcome::Written | WriteOutcome::Overwritten | WriteOutcome::Merged => {
                written += 1
            }
        }
    }

    println!(
        "✓ {}: {} thread(s) written, {} skipped",
        user.username, written, skipped
    );
    Ok(())
}

fn cmd_search(
    sort: &str,
    directory: &Path,
    username: Option<String>,
    export_results_path: Option<PathBuf>,
) -> Result<()> {
    let searcher = ArchiveSearcher::new()?;
    let sort = match sort {
        "first" => SearchSort::First,
        _ => SearchSort::Last,
    };

    let usernames = match username {
        Some(name) => {
            tracing::debug!("Searching for {}.", name);
            vec![name]
        }
        None => {
            tracing::debug!("Searching for all usernames.");
            searcher.usernames_in(directory)?
        }
    };

    let mut results = String::new();
    for name in &usernames {
        match searcher.find_tweet_id(directory, name, sort)? {
            Some(hit) => {
                println!("{}, {}", name, hit.tweet_id);
                results.push_str(&format!("{}, {}\n", name, hit.tweet_id));
            }
            None => {
                tracing::warn!("No archived tweet id found for {}", name);
            }
        }
    }

    if let Some(path) = export_results_path {
        std::fs::write(&path, results).map_err(|e| UnspoolError::Io {
            source: e,
            context: format!("Failed to write results file: {}", path.display()),
        })?;
        println!("✓ Results written to {}", path.display());
    }

    Ok(())
}

struct ExportArgs {
    config: Option<PathBuf>,
    username: Option<String>,
    input_file: Option<PathBuf>,
    output_file: Option<PathBuf>,
    max_results: Option<usize>,
    start_date: Option<String>,
    after_id: Option<String>,
    since_id: Option<String>,
    dry_run: bool,
    overwrite: bool,
}

fn cmd_export(args: ExportArgs) -> Result<()> {
    let config = load_config(args.config)?;
    let token = config.bearer_token()?;

    // Reject a malformed date before any network activity
    let start_time = args
        .start_date
        .as_deref()
        .map(start_time_from_date)
        .transpose()?;

    if args.dry_run {
        println!("Running in dry-run mode. This will not write to file.");
    }

    let usernames = match args.username {
        Some(name) => vec![name],
        None => {
            let path = args
                .input_file
                .expect("clap requires --input-file when no username is given");
            read_username_lines(&path)?
        }
    };
    if usernames.is_empty() {
        return Err(UnspoolError::Config("No usernames to export".to_string()));
    }

    let output_file = args
        .output_file
        .unwrap_or_else(|| PathBuf::from("./tweets.csv"));
    tracing::info!("Using file: {}", output_file.display());

    let exporter = CsvExporter::new(&output_file, args.dry_run);
    if args.overwrite {
        tracing::debug!("Writing header row first");
        exporter.write_header()?;
    }

    let client = ApiClient::new(&config.api.base_url, &token)?;
    let query = TimelineQuery {
        page_size: config.api.page_size,
        start_time,
        since_id: args.since_id,
        until_id: args.after_id,
    };
    let max_results = args.max_results.unwrap_or(DEFAULT_EXPORT_MAX_RESULTS);

    for name in &usernames {
        if let Err(e) = export_user(&client, name, &query, max_results, &exporter) {
            tracing::error!("Skipping {}: {}", name, e);
        }
    }

    println!("✓ Exported to {}", exporter.path().display());
    Ok(())
}

fn export_user(
    client: &ApiClient,
    username: &str,
    query: &TimelineQuery,
    max_results: usize,
    exporter: &CsvExporter,
) -> Result<()> {
    let user = client.lookup_user(username)?;

    let mut timeline = client.user_timeline(&user.id, query);
    let tweets = collect_bounded(&mut timeline, max_results)?;
    if tweets.is_empty() {
        tracing::info!("No tweets found for user {}", username);
        return Ok(());
    }

    let condensed: Vec<_> = threads::condense(tweets, ReplyJoin::Plain)
        .into_iter()
        .filter(|tweet| {
            !tweet
                .in_reply_to_user_id
                .as_deref()
                .is_some_and(|id| id != user.id)
        })
        .collect();

    exporter.append(&user.username, &condensed)
}

fn cmd_config(config_path: Option<PathBuf>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(config_path)?;
            let json = serde_json::to_string_pretty(&config).map_err(|e| UnspoolError::Json {
                source: e,
                context: "Failed to serialize config".to_string(),
            })?;
            println!("{}", json);
        }
        ConfigAction::Validate { file } => {
            let path = match file {
                Some(path) => path,
                None => Config::default_path()?,
            };
            let config = Config::load(&path)?;
            println!("✓ Configuration is valid");
            println!("  Schema version: {}", config.meta.schema_version);
        }
        ConfigAction::Init { force } => {
            let path = Config::default_path()?;

            if path.exists() && !force {
                println!("Configuration file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| UnspoolError::Io {
                    source: e,
                    context: format!("Failed to create config directory: {:?}", parent),
                })?;
            }

            let config = Config::default();
            config.save(&path)?;

            println!("✓ Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

fn load_config(config_path: Option<PathBuf>) -> Result<Config> {
    let path = match config_path {
        Some(path) => path,
        None => Config::default_path()?,
    };

    if !path.exists() {
        tracing::warn!(
            "Config file not found, using defaults. Run 'unspool config init' to create one."
        );
        return Ok(Config::default());
    }

    Config::load(&path)
}

fn prepare_output_directory(directory: &Path, dry_run: bool) -> Result<()> {
    if !dry_run && !directory.exists() {
        tracing::debug!("Creating file directory: {}", directory.display());
        std::fs::create_dir_all(directory).map_err(|e| UnspoolError::Io {
            source: e,
            context: format!("Failed to create output directory: {}", directory.display()),
        })?;
    }
    tracing::debug!("Using file directory: {}", directory.display());
    Ok(())
}

fn read_username_lines(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path).map_err(|e| UnspoolError::Io {
        source: e,
        context: format!("Failed to read input file: {}", path.display()),
    })?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}
