use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use model::{
    Activity, Diet, Mood, PreferenceField, PreferenceForm, PreferenceInput, RecommendationList,
    SnackId,
};
use rand::Rng;
use session::{Session, SessionError, SessionView, DEFAULT_ALTERNATIVES};
use snack_client::{ClientConfig, HttpSnackClient};
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info};

/// VibeSnack - your tiny, delightful snack recommender
#[derive(Parser)]
#[command(name = "vibesnack")]
#[command(about = "Snack recommendations from your mood, hunger and context", long_about = None)]
struct Cli {
    /// Base URL of the snack service (overrides VIBESNACK_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Request timeout in seconds (overrides VIBESNACK_TIMEOUT_SECS)
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

/// Preference fields; anything left out keeps its default
#[derive(Args, Debug, Default)]
struct PreferenceArgs {
    /// Hour of the day, 0-23 (default: now)
    #[arg(long)]
    hour: Option<String>,

    /// happy, sad, bored, stressed, energetic or lazy
    #[arg(long)]
    mood: Option<String>,

    /// Hunger level, 1 (not hungry) to 5 (starving)
    #[arg(long)]
    hunger: Option<String>,

    /// veg or non-veg
    #[arg(long)]
    diet: Option<String>,

    /// none, studying, gaming, chilling or gym
    #[arg(long)]
    context: Option<String>,
}

impl PreferenceArgs {
    /// Apply every given field through the form so bad values are rejected
    /// with the field named.
    fn into_form(self) -> Result<PreferenceForm> {
        let mut form = PreferenceForm::new();
        for (field, value) in [
            (PreferenceField::Hour, self.hour),
            (PreferenceField::Mood, self.mood),
            (PreferenceField::Hunger, self.hunger),
            (PreferenceField::Diet, self.diet),
            (PreferenceField::Context, self.context),
        ] {
            if let Some(value) = value {
                form.update(field, &value)?;
            }
        }
        Ok(form)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Get a snack recommendation for one set of preferences
    Recommend {
        #[command(flatten)]
        prefs: PreferenceArgs,

        /// Number of alternatives to list below the pick
        #[arg(long, default_value_t = DEFAULT_ALTERNATIVES)]
        alternatives: usize,

        /// Show model confidence and the explanation
        #[arg(long)]
        explain: bool,

        /// Accept the top pick and record feedback
        #[arg(long)]
        accept: bool,
    },

    /// Interactive session: edit preferences, page through picks, accept
    Interactive {
        #[command(flatten)]
        prefs: PreferenceArgs,

        /// Number of alternatives to list below the pick
        #[arg(long, default_value_t = DEFAULT_ALTERNATIVES)]
        alternatives: usize,
    },

    /// Check that the snack service is up
    Health,

    /// Run benchmark to test request latency
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "50")]
        requests: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env();
    if let Some(url) = cli.api_url {
        config = config.with_base_url(url);
    }
    if let Some(secs) = cli.timeout_secs {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    let client = Arc::new(HttpSnackClient::new(&config).context("Invalid snack service configuration")?);
    info!("Using snack service at {}", client.service_address());

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Recommend {
            prefs,
            alternatives,
            explain,
            accept,
        } => handle_recommend(client, prefs, alternatives, explain, accept).await?,
        Commands::Interactive {
            prefs,
            alternatives,
        } => handle_interactive(client, prefs, alternatives).await?,
        Commands::Health => handle_health(&client).await?,
        Commands::Benchmark { requests } => handle_benchmark(client, requests).await?,
    }

    Ok(())
}

fn new_session(client: &Arc<HttpSnackClient>) -> Session {
    Session::new(client.clone(), client.clone())
}

/// Handle the 'recommend' command
async fn handle_recommend(
    client: Arc<HttpSnackClient>,
    prefs: PreferenceArgs,
    alternatives: usize,
    explain: bool,
    accept: bool,
) -> Result<()> {
    let form = prefs.into_form()?;
    let input = form.submit();
    print_preferences(&input);

    let session = new_session(&client);
    session
        .request_recommendations(input)
        .await
        .context("Failed to get recommendations")?;

    let view = session.view(alternatives);
    if view.current.is_none() {
        println!("{}", "No snacks match those preferences.".yellow());
        return Ok(());
    }

    if accept {
        accept_top_pick(&session).await?;
    }

    print_view(&session.view(alternatives), explain);
    Ok(())
}

/// Accept the current pick and wait for its feedback dispatch, since
/// one-shot mode exits right after. Delivery failures stay in the session's
/// feedback stats and logs.
async fn accept_top_pick(session: &Session) -> Result<Option<SnackId>> {
    let Some((id, dispatch)) = session.accept_current() else {
        return Ok(None);
    };
    if let Some(dispatch) = dispatch {
        dispatch.await?;
    }
    let stats = session.feedback_stats();
    debug!(
        "Feedback for snack {}: {} acknowledged, {} lost",
        id, stats.acknowledged, stats.failed
    );
    Ok(Some(id))
}

/// Handle the 'health' command
async fn handle_health(client: &HttpSnackClient) -> Result<()> {
    let healthy = client
        .health()
        .await
        .with_context(|| format!("Snack service at {} is unreachable", client.service_address()))?;
    if healthy {
        println!("{} Snack service at {} is up", "✓".green(), client.service_address());
        Ok(())
    } else {
        bail!("Snack service at {} reported unhealthy", client.service_address())
    }
}

enum ReplEvent {
    Line(Option<String>),
    Resolved(std::result::Result<std::result::Result<RecommendationList, SessionError>, JoinError>),
}

/// Resolve the background request, or never if there is none.
async fn wait_pending<T>(pending: &mut Option<JoinHandle<T>>) -> std::result::Result<T, JoinError> {
    match pending {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}

/// A submit is refused while a spawned request is still pending, even if that
/// task has not run far enough to mark the session loading.
fn request_in_flight<T>(pending: &Option<JoinHandle<T>>, session: &Session) -> bool {
    pending.is_some() || session.is_loading()
}

/// Handle the 'interactive' command
async fn handle_interactive(
    client: Arc<HttpSnackClient>,
    prefs: PreferenceArgs,
    alternatives: usize,
) -> Result<()> {
    let mut form = prefs.into_form()?;
    let session = new_session(&client);
    let mut pending: Option<JoinHandle<std::result::Result<RecommendationList, SessionError>>> = None;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print_help();
    print_preferences(form.current());
    prompt()?;

    loop {
        let event = tokio::select! {
            line = lines.next_line() => ReplEvent::Line(line?),
            resolved = wait_pending(&mut pending) => ReplEvent::Resolved(resolved),
        };

        match event {
            ReplEvent::Line(None) => break,
            ReplEvent::Line(Some(line)) => {
                let words: Vec<&str> = line.split_whitespace().collect();
                match words.as_slice() {
                    [] => {}
                    ["quit"] | ["exit"] => break,
                    ["help"] => print_help(),
                    ["prefs"] => print_preferences(form.current()),
                    ["set", field, value] => match field
                        .parse::<PreferenceField>()
                        .and_then(|field| form.update(field, value))
                    {
                        Ok(input) => print_preferences(&input),
                        Err(err) => println!("{} {}", "Rejected:".red(), err),
                    },
                    ["submit"] => {
                        let input = form.submit();
                        if request_in_flight(&pending, &session) {
                            println!("{}", SessionError::AlreadyInFlight.to_string().yellow());
                        } else {
                            let session = session.clone();
                            pending = Some(tokio::spawn(async move {
                                session.request_recommendations(input).await
                            }));
                            println!("{}", "Thinking...".dimmed());
                        }
                    }
                    ["show"] => print_view(&session.view(alternatives), false),
                    ["why"] => print_view(&session.view(alternatives), true),
                    ["next"] => {
                        let before = session.view(0).position;
                        if session.advance_cursor() == before {
                            println!("{}", "No more alternatives.".yellow());
                        }
                        print_view(&session.view(alternatives), false);
                    }
                    ["prev"] => {
                        session.retreat_cursor();
                        print_view(&session.view(alternatives), false);
                    }
                    ["accept"] => match session.accept_current() {
                        Some((id, Some(_dispatch))) => {
                            debug!("Feedback for snack {} dispatched", id);
                            println!("{} Accepted", "✓".green());
                        }
                        Some((_, None)) => println!("{} Already accepted", "✓".green()),
                        None => println!("{}", "Nothing to accept yet.".yellow()),
                    },
                    ["stats"] => {
                        let stats = session.feedback_stats();
                        println!(
                            "Feedback: {} sent, {} acknowledged, {} lost",
                            stats.dispatched, stats.acknowledged, stats.failed
                        );
                        if let Some(last) = stats.last_failure {
                            println!("  last failure: {}", last);
                        }
                    }
                    _ => println!("Unknown command '{}'. Type 'help'.", line.trim()),
                }
            }
            ReplEvent::Resolved(resolved) => {
                pending = None;
                match resolved? {
                    Ok(list) => debug!("Request resolved with {} recommendations", list.len()),
                    Err(err) => debug!("Request failed: {}", err),
                }
                print_view(&session.view(alternatives), false);
            }
        }
        prompt()?;
    }

    Ok(())
}

/// Handle the 'benchmark' command
async fn handle_benchmark(client: Arc<HttpSnackClient>, requests: usize) -> Result<()> {
    let session = new_session(&client);

    // Random preferences, generated up front
    let mut rng = rand::rng();
    let inputs: Vec<PreferenceInput> = (0..requests)
        .map(|_| {
            PreferenceInput::new(
                rng.random_range(0..=23),
                Mood::ALL[rng.random_range(0..Mood::ALL.len())],
                rng.random_range(1..=5),
                Diet::ALL[rng.random_range(0..Diet::ALL.len())],
                Activity::ALL[rng.random_range(0..Activity::ALL.len())],
            )
        })
        .collect::<std::result::Result<_, _>>()?;

    // One session allows one request at a time, so they run back to back
    let started = Instant::now();
    let mut timings = Vec::with_capacity(requests);
    let mut failures = 0usize;
    for input in inputs {
        let start = Instant::now();
        match session.request_recommendations(input).await {
            Ok(_) => timings.push(start.elapsed()),
            Err(err) => {
                debug!("Benchmark request failed: {}", err);
                failures += 1;
            }
        }
    }
    let total_time = started.elapsed();

    if timings.is_empty() {
        bail!("All {} requests failed", requests);
    }

    timings.sort();
    let percentile = |p: f32| timings[((timings.len() as f32 * p) as usize).min(timings.len() - 1)];
    let avg_latency = timings.iter().sum::<Duration>() / (timings.len() as u32);
    let throughput = timings.len() as f32 / total_time.as_secs_f32();

    println!("Benchmark results:");
    println!("Requests: {} ok, {} failed", timings.len(), failures);
    println!("Total time: {:?}", total_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", percentile(0.50));
    println!("P95 latency: {:?}", percentile(0.95));
    println!("P99 latency: {:?}", percentile(0.99));
    println!("Throughput: {:.2} requests/second", throughput);

    Ok(())
}

fn prompt() -> Result<()> {
    print!("{} ", "vibesnack>".bold().purple());
    std::io::stdout().flush()?;
    Ok(())
}

fn print_help() {
    println!("{}", "Commands:".bold().blue());
    println!("  set <field> <value>  edit hour, mood, hunger, diet or context");
    println!("  prefs                show current preferences");
    println!("  submit               ask for recommendations");
    println!("  show | why           show the current pick (why: with explanation)");
    println!("  next | prev          page through the picks");
    println!("  accept               accept the current pick");
    println!("  stats                feedback delivery counters");
    println!("  quit");
}

fn describe_preferences(input: &PreferenceInput) -> String {
    format!(
        "{}:00 ({}), feeling {}, hunger {}/5, {}, context: {}",
        input.hour(),
        input.time_of_day(),
        input.mood(),
        input.hunger(),
        input.diet(),
        input.context()
    )
}

fn print_preferences(input: &PreferenceInput) {
    println!("{} {}", "Preferences:".bold(), describe_preferences(input));
}

/// Helper function to format and print the current pick and alternatives
fn print_view(view: &SessionView, explain: bool) {
    if let Some(error) = &view.error {
        println!("{} {}", "Error:".red().bold(), error.red());
    }
    if view.is_loading {
        println!("{}", "Thinking...".dimmed());
    }

    let Some(current) = &view.current else {
        println!("{}", "Enter your vibe to get a snack!".dimmed());
        return;
    };

    println!("{}", "I recommend...".blue());
    let status = if view.current_accepted {
        format!(" {}", "✓ Accepted".green())
    } else {
        String::new()
    };
    println!(
        "{} {}{}",
        current.name.bold(),
        format!("({}/{})", view.position + 1, view.total).dimmed(),
        status
    );
    if !current.tags.is_empty() {
        println!("{}", current.tags.iter().map(|t| format!("#{t}")).collect::<Vec<_>>().join(" ").cyan());
    }
    if !current.message.is_empty() {
        println!("{}", current.message);
    }
    if explain {
        println!("Model confidence: {:.1}%", current.match_percent());
        if !current.explanation.is_empty() {
            println!("Why this snack? {}", current.explanation);
        }
    }

    if !view.alternatives.is_empty() {
        println!("{}", "Alternatives:".bold());
        for rec in &view.alternatives {
            println!("  - {} ({:.0}% Match)", rec.name, rec.match_percent());
        }
    } else if !view.has_next {
        println!("{}", "That's the last one.".dimmed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use model::Recommendation;
    use snack_client::{ClientError, FeedbackAck, FeedbackSink, Predictor};

    struct OnePick;

    #[async_trait]
    impl Predictor for OnePick {
        async fn predict(
            &self,
            _input: &PreferenceInput,
        ) -> std::result::Result<RecommendationList, ClientError> {
            Ok(vec![Recommendation {
                id: 7,
                name: "Masala Chai".into(),
                tags: vec!["warm".into()],
                message: "It's around 14:00 and you're feeling bored.".into(),
                explanation: "Warm and comforting.".into(),
                prob: 0.8,
            }])
        }
    }

    struct DownSink;

    #[async_trait]
    impl FeedbackSink for DownSink {
        async fn record_feedback(
            &self,
            _id: SnackId,
        ) -> std::result::Result<FeedbackAck, ClientError> {
            Err(ClientError::ConnectionError("connection refused".into()))
        }
    }

    fn session() -> Session {
        Session::new(Arc::new(OnePick), Arc::new(DownSink))
    }

    #[tokio::test]
    async fn test_accept_top_pick_absorbs_lost_feedback() {
        let session = session();
        session
            .request_recommendations(PreferenceInput::at_hour(14).unwrap())
            .await
            .unwrap();

        let accepted = accept_top_pick(&session).await.unwrap();
        assert_eq!(accepted, Some(7));

        let stats = session.feedback_stats();
        assert_eq!(stats.dispatched, 1);
        assert_eq!(stats.failed, 1);

        let view = session.view(DEFAULT_ALTERNATIVES);
        assert!(view.current_accepted);
        assert!(view.error.is_none());
    }

    #[tokio::test]
    async fn test_accept_top_pick_without_list() {
        let session = session();
        assert_eq!(accept_top_pick(&session).await.unwrap(), None);
        assert_eq!(session.feedback_stats().dispatched, 0);
    }

    #[tokio::test]
    async fn test_spawned_request_blocks_submit_before_it_runs() {
        let session = session();
        let task_session = session.clone();
        // current-thread runtime: the task cannot start until we yield
        let pending = Some(tokio::spawn(async move {
            task_session
                .request_recommendations(PreferenceInput::at_hour(9).unwrap())
                .await
        }));

        assert!(!session.is_loading());
        assert!(request_in_flight(&pending, &session));

        let none: Option<JoinHandle<()>> = None;
        assert!(!request_in_flight(&none, &session));

        pending.unwrap().await.unwrap().unwrap();
    }

    #[test]
    fn test_preferences_line_names_time_of_day() {
        let input = PreferenceInput::at_hour(14).unwrap();
        let line = describe_preferences(&input);
        assert!(line.starts_with("14:00 (afternoon)"));
        assert!(line.contains("hunger 3/5"));
    }
}
