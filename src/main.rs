mod api;
mod llm;
mod server;

use clap::{Args, Parser, Subcommand};
use growth_planner::execution::DayTasks;
use growth_planner::{
    format_float, format_number, format_stars, generate_plan, project, Cadence, ContentGenerator,
    GenerationError, Metrics, OperationPurpose, PlanInput, PlanSource, PlanStatus, PlanStore,
    PlannerConfig, PostingTime, StrategyPlan,
};
use jiff::civil::Date;
use jiff::Timestamp;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_TIMEZONE: &str = "Asia/Tokyo";

#[derive(Parser)]
#[command(name = "growth-planner", about = "Follower growth plan simulator")]
struct Cli {
    /// Config file (defaults to PLANNER_CONFIG_PATH or config/planner.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    Simulate(SimulateArgs),
    Today(TodayArgs),
    Serve(ServeArgs),
    InitConfig,
}

#[derive(Args, Debug, Clone)]
struct SimulateArgs {
    #[arg(long, default_value_t = 1000)]
    current_followers: u64,
    #[arg(long, default_value_t = 1100)]
    target_followers: u64,
    #[arg(long, default_value = "認知拡大")]
    purpose: String,
    #[arg(long, default_value = "weekly-3-4")]
    weekly_posts: String,
    #[arg(long, default_value = "weekly-1-2")]
    reels: String,
    #[arg(long, default_value = "weekly-3-4")]
    stories: String,
    /// YYYY-MM-DD; defaults to today in Asia/Tokyo
    #[arg(long)]
    start_date: Option<String>,
    #[arg(long)]
    audience: Option<String>,
    #[arg(long)]
    posting_time: Option<String>,
    /// JSON file with last month's metrics
    #[arg(long)]
    history: Option<PathBuf>,
    #[arg(long)]
    ai: bool,
    #[arg(long)]
    ai_model: Option<String>,
    #[arg(long)]
    json: bool,
    #[arg(long)]
    save: bool,
    #[arg(long, default_value = "local")]
    user: String,
}

impl Default for SimulateArgs {
    fn default() -> Self {
        Self {
            current_followers: 1000,
            target_followers: 1100,
            purpose: "認知拡大".to_string(),
            weekly_posts: "weekly-3-4".to_string(),
            reels: "weekly-1-2".to_string(),
            stories: "weekly-3-4".to_string(),
            start_date: None,
            audience: None,
            posting_time: None,
            history: None,
            ai: false,
            ai_model: None,
            json: false,
            save: false,
            user: "local".to_string(),
        }
    }
}

#[derive(Args, Debug, Clone)]
struct TodayArgs {
    #[arg(long, default_value = "local")]
    user: String,
    /// Plan id; defaults to the user's latest plan
    #[arg(long)]
    plan: Option<String>,
    #[arg(long, default_value = DEFAULT_TIMEZONE)]
    tz: String,
    /// RFC 3339 instant to project at instead of now
    #[arg(long)]
    at: Option<String>,
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    #[arg(long, default_value_t = 8787)]
    port: u16,
    #[arg(long, default_value = "../webapp/dist")]
    web_root: String,
}

#[tokio::main]
async fn main() {
    load_dotenv();
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let cli = Cli::parse();
    let (config, config_path) = PlannerConfig::load(cli.config).map_err(|err| err.to_string())?;
    let command = cli.command.unwrap_or(Command::Simulate(SimulateArgs::default()));

    match command {
        Command::Simulate(args) => run_simulate(args, &config).await,
        Command::Today(args) => run_today(args, &config).await,
        Command::Serve(args) => server::serve(args, config).await,
        Command::InitConfig => run_init_config(&config, config_path.as_deref()),
    }
}

async fn run_simulate(args: SimulateArgs, config: &PlannerConfig) -> Result<(), String> {
    let now = Timestamp::now();
    let input = build_input(&args, now)?;
    let history = match args.history.as_deref() {
        Some(path) => Some(read_history(path)?),
        None => None,
    };

    let client = if args.ai {
        let client = llm::LlmClient::from_env(&config.llm, args.ai_model.clone())
            .map_err(|err| err.to_string())?
            .ok_or_else(|| GenerationError::NotConfigured.to_string())?;
        info!(model = client.model(), "using generated content");
        Some(client)
    } else {
        None
    };

    let outcome = generate_plan(
        &input,
        history.as_ref(),
        client.as_ref().map(|client| client as &dyn ContentGenerator),
        config,
        now,
    )
    .await
    .map_err(|err| err.to_string())?;

    let plan = if args.save {
        let store = PlanStore::load(config.store.path.clone(), config.store.max_plans_per_user)
            .await
            .map_err(|err| err.to_string())?;
        store
            .save(&args.user, outcome.plan)
            .await
            .map_err(|err| err.to_string())?
    } else {
        outcome.plan
    };

    if args.json {
        let payload = serde_json::to_string_pretty(&plan)
            .map_err(|err| format!("failed to serialize plan: {}", err))?;
        println!("{}", payload);
        return Ok(());
    }

    print_plan(&plan, outcome.simulation.monthly_growth_rate);
    if args.save {
        println!("\nSaved plan {} for user {}", plan.id, args.user);
    }
    if !outcome.warnings.is_empty() {
        println!("\nWarnings:");
        for warning in &outcome.warnings {
            println!("- {}", warning);
        }
    }

    Ok(())
}

async fn run_today(args: TodayArgs, config: &PlannerConfig) -> Result<(), String> {
    let store = PlanStore::load(config.store.path.clone(), config.store.max_plans_per_user)
        .await
        .map_err(|err| err.to_string())?;
    let plan = match args.plan.as_deref() {
        Some(plan_id) => store.get(&args.user, plan_id).await,
        None => store.latest(&args.user).await,
    }
    .ok_or_else(|| format!("no saved plan for user {}", args.user))?;

    let now = match args.at.as_deref() {
        Some(value) => value
            .parse::<Timestamp>()
            .map_err(|err| format!("invalid --at '{}': {}", value, err))?,
        None => Timestamp::now(),
    };

    let state = project(&plan, now, &args.tz, &config.schedule).map_err(|err| err.to_string())?;
    if args.json {
        let payload = serde_json::to_string_pretty(&state)
            .map_err(|err| format!("failed to serialize state: {}", err))?;
        println!("{}", payload);
        return Ok(());
    }

    println!("Plan {} ({})", state.plan_id, state.timezone);
    match state.status {
        PlanStatus::NotStarted => {
            println!("Plan starts on {}", plan.input.start_date)
        }
        PlanStatus::Active { week } => println!(
            "Week {} | week target {} followers",
            week,
            format_number(state.month_goals.week_target.unwrap_or_default())
        ),
        PlanStatus::Completed => println!("Plan period has ended"),
    }
    print_day("Today", &state.today);
    print_day("Tomorrow", &state.tomorrow);
    println!(
        "\nMonth goal: {} → {} followers (+{})",
        format_number(state.month_goals.current_followers),
        format_number(state.month_goals.target_followers),
        format_number(state.month_goals.follower_gap)
    );

    Ok(())
}

fn run_init_config(config: &PlannerConfig, path: Option<&Path>) -> Result<(), String> {
    let path = path.unwrap_or_else(|| Path::new("config/planner.toml"));
    if path.exists() {
        return Err(format!("config already exists: {}", path.display()));
    }
    config.write(path).map_err(|err| err.to_string())?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn build_input(args: &SimulateArgs, now: Timestamp) -> Result<PlanInput, String> {
    let start_date = match args.start_date.as_deref() {
        Some(value) => value
            .trim()
            .parse::<Date>()
            .map_err(|err| format!("invalid start date '{}': {}", value, err))?,
        None => now
            .in_tz(DEFAULT_TIMEZONE)
            .map_err(|err| err.to_string())?
            .date(),
    };

    let posting_time = match args.posting_time.as_deref() {
        Some(value) => Some(
            PostingTime::from_str(value).ok_or_else(|| format!("invalid posting time: {}", value))?,
        ),
        None => None,
    };

    let input = PlanInput {
        current_followers: args.current_followers,
        target_followers: args.target_followers,
        operation_purpose: OperationPurpose::from_str(&args.purpose)
            .ok_or_else(|| format!("invalid purpose: {}", args.purpose))?,
        weekly_posts: parse_cadence(&args.weekly_posts)?,
        reel_capability: parse_cadence(&args.reels)?,
        story_frequency: parse_cadence(&args.stories)?,
        start_date,
        target_audience: args.audience.clone(),
        posting_time,
    };
    input.validate().map_err(|err| err.to_string())?;
    Ok(input)
}

fn parse_cadence(value: &str) -> Result<Cadence, String> {
    Cadence::from_str(value).ok_or_else(|| {
        format!(
            "invalid cadence '{}': expected none, weekly-1-2, weekly-3-4 or daily",
            value
        )
    })
}

fn read_history(path: &Path) -> Result<Metrics, String> {
    let data = std::fs::read_to_string(path)
        .map_err(|err| format!("failed reading history {}: {}", path.display(), err))?;
    serde_json::from_str(&data).map_err(|err| format!("failed to parse history: {}", err))
}

fn print_plan(plan: &StrategyPlan, growth_rate: f64) {
    let input = &plan.input;
    println!(
        "Growth goal: {} → {} followers (+{}, {}% this month)",
        format_number(input.current_followers),
        format_number(input.target_followers),
        format_number(input.follower_gap()),
        format_float(growth_rate, 1)
    );
    println!(
        "Difficulty: {} {} (industry {} | achievement {}%)",
        format_stars(plan.difficulty.stars),
        plan.difficulty.label,
        plan.difficulty.industry_range,
        format_float(plan.difficulty.achievement_rate, 0)
    );
    println!(
        "Cadence: {} feed ({}) | {} reels ({}) | {} stories ({}) per week",
        plan.schedule.feed_per_week,
        input.weekly_posts.label(),
        plan.schedule.reel_per_week,
        input.reel_capability.label(),
        plan.schedule.story_per_week,
        input.story_frequency.label()
    );
    let source = match plan.source {
        PlanSource::Generated => "AI generated",
        PlanSource::Fallback => "template",
    };
    println!("Content source: {}", source);

    println!("\nWeekly plan:");
    for week in &plan.weekly_plans {
        println!(
            "  Week {} | {} | +{} → {}",
            week.week,
            week.theme,
            format_number(week.increase),
            format_number(week.target_followers)
        );
        for post in &week.feed_posts {
            println!("    {} [{}] {}", post.day.short_label(), post.post_type.label(), post.content);
        }
    }

    println!("\nPosting schedule:");
    for slot in &plan.schedule.posting_days {
        println!("  {} {} {}", slot.day.label(), slot.time, slot.post_type.label());
    }
    for slot in &plan.schedule.story_days {
        println!("  {} {} story", slot.day.label(), slot.time);
    }

    let expected = &plan.expected_results;
    println!(
        "\nExpected: reach {} | engagement {} | profile views {} | saves {} | new followers {}",
        format_number(expected.monthly_reach),
        expected.engagement_rate,
        format_number(expected.profile_views),
        format_number(expected.saves),
        format_number(expected.new_followers)
    );
}

fn print_day(label: &str, tasks: &DayTasks) {
    println!("\n{} ({} {}):", label, tasks.date, tasks.weekday.label());
    if tasks.is_empty() {
        println!("  No scheduled posts");
        return;
    }
    for post in &tasks.posts {
        println!("  {} [{}] {}", post.time, post.post_type.label(), post.content);
    }
    if let Some(story) = &tasks.story {
        println!("  {} [story] {}", story.time, story.ideas.join(" / "));
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_dotenv() {
    let _ = dotenvy::dotenv();
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let manifest_path = Path::new(manifest_dir).join(".env");
    let _ = dotenvy::from_path(manifest_path);
}
