use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use stress_core::{ConfigResult, SimulationConfig};
use stress_runner::{RunReport, run_stress_test};

#[derive(Parser, Debug)]
#[command(name = "stress-test")]
#[command(about = "Concurrent fault-injection stress test for synthetic trading agents")]
struct Args {
    /// JSON configuration file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Agent identities (comma separated)
    #[arg(long, value_delimiter = ',')]
    agents: Option<Vec<String>>,

    /// Task labels (comma separated)
    #[arg(long, value_delimiter = ',')]
    tasks: Option<Vec<String>>,

    #[arg(long)]
    missing_data_prob: Option<f64>,

    #[arg(long)]
    failure_prob: Option<f64>,

    /// Attempts per agent
    #[arg(short = 'n', long)]
    operations: Option<u64>,

    /// Minimum delay before an attempt, in seconds
    #[arg(long)]
    min_delay: Option<f64>,

    /// Maximum delay before an attempt, in seconds
    #[arg(long)]
    max_delay: Option<f64>,

    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Seed for reproducible outcome streams
    #[arg(long)]
    seed: Option<u64>,

    /// Stop all workers after this many seconds
    #[arg(long)]
    deadline_secs: Option<f64>,

    /// Cap on attempts across all agents
    #[arg(long)]
    max_operations: Option<u64>,

    /// Log filter (error, warn, info, debug, trace); overrides RUST_LOG
    #[arg(long)]
    log_level: Option<log::LevelFilter>,

    /// Do not print the summary
    #[arg(short, long, default_value = "false")]
    quiet: bool,
}

impl Args {
    /// Load the base configuration and apply flag overrides
    fn to_config(&self) -> ConfigResult<SimulationConfig> {
        let mut config = match &self.config {
            Some(path) => SimulationConfig::from_file(path)?,
            None => SimulationConfig::default(),
        };

        if let Some(agents) = &self.agents {
            config = config.with_agents(agents.iter().map(String::as_str));
        }
        if let Some(tasks) = &self.tasks {
            config = config.with_tasks(tasks.iter().map(String::as_str));
        }
        if let Some(p) = self.missing_data_prob {
            config.missing_data_prob = p;
        }
        if let Some(p) = self.failure_prob {
            config.failure_prob = p;
        }
        if let Some(n) = self.operations {
            config.operations_per_agent = n;
        }
        if let Some(d) = self.min_delay {
            config.min_delay = d;
        }
        if let Some(d) = self.max_delay {
            config.max_delay = d;
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(secs) = self.deadline_secs {
            config.deadline_secs = Some(secs);
        }
        if let Some(max) = self.max_operations {
            config.max_total_operations = Some(max);
        }

        config.validate()?;
        Ok(config)
    }
}

fn print_summary(report: &RunReport) {
    let stats = &report.snapshot.statistics;

    println!("=== Stress Test Summary ===");
    println!("Run:                   {}", report.run_id);
    println!("Status:                {:?}", report.status);
    println!("Total operations:      {}", stats.total_operations());
    println!("Successful operations: {}", stats.successful_operations());
    println!("Failed operations:     {}", stats.failed_operations());
    println!("Missing data events:   {}", stats.missing_data_events());
    println!("Start time:            {}", stats.start_time);
    if let Some(end) = stats.end_time {
        println!("End time:              {}", end);
    }
    if report.stopped_early {
        println!("Stopped early:         yes");
    }

    println!();
    println!("Per agent:");
    for (agent, counts) in &stats.agent_stats {
        println!(
            "  {:<20} {:>6} ops  {:>6} ok  {:>6} failed  {:>6} missing",
            agent.as_str(),
            counts.total_operations,
            counts.successful_operations,
            counts.failed_operations,
            counts.missing_data_events
        );
    }

    for err in &report.worker_errors {
        println!("[Error] {}", err);
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(level) = args.log_level {
        logger.filter_level(level);
    }
    logger.init();

    let config = match args.to_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("[Config] {}", e);
            return ExitCode::from(1);
        }
    };

    let output_dir = config.output_dir.clone();
    match run_stress_test(config) {
        Ok((report, paths)) => {
            if !args.quiet {
                print_summary(&report);
                println!();
                println!("Artifacts in {}:", output_dir.display());
                println!("  {}", paths.memory_snapshot.display());
                println!("  {}", paths.statistics.display());
                println!("  {}", paths.audit_log.display());
            }
            if report.is_completed() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            }
        }
        Err(e) => {
            eprintln!("[Error] {}", e);
            ExitCode::from(1)
        }
    }
}
