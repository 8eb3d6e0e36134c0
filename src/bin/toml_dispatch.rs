use clap::Parser;
use dispatch_sim::core::ConfigProvider;
use dispatch_sim::utils::error::ErrorSeverity;
use dispatch_sim::utils::{logger, validation::Validate};
use dispatch_sim::{HttpWorld, SimulationEngine, TomlConfig};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "toml-dispatch")]
#[command(about = "Dispatch simulation driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "dispatch-sim.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override the simulation seed from config
    #[arg(long)]
    seed: Option<String>,

    /// Override the target number of resolved calls from config
    #[arg(long)]
    target_dispatches: Option<u64>,

    /// Dry run - show the effective configuration without contacting the server
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    let verbose = args.verbose || config.verbose();
    if config.json_logs() {
        logger::init_json_logger(verbose);
    } else {
        logger::init_cli_logger(verbose);
    }
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    // 套用命令列覆蓋設定
    if let Some(seed) = args.seed.clone() {
        tracing::info!("🔧 Seed overridden to: {}", seed);
        config.simulation.seed = Some(seed);
    }
    if let Some(target) = args.target_dispatches {
        tracing::info!("🔧 Target dispatches overridden to: {}", target);
        config.simulation.target_dispatches = Some(target);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - no requests will be sent");
        return Ok(());
    }

    let world = Arc::new(HttpWorld::new(&config)?);
    let engine = SimulationEngine::new(world, config);

    match engine.run().await {
        Ok(summary) => {
            println!("✅ Simulation finished");
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Err(e) => {
            tracing::error!(
                "❌ Simulation failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!("  Server: {}", config.base_url());
    println!("  Seed: {}", config.seed());
    println!("  Target Dispatches: {}", config.target_dispatches());
    println!("  Max Active Calls: {}", config.max_active_calls());
    println!(
        "  Services: {}",
        config
            .services()
            .iter()
            .map(|s| s.label())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("  Cache Refresh: {:?}", config.refresh_interval());
    println!(
        "  Poll Timeout: {:?} (stop after {} empty poll(s))",
        config.poll_timeout(),
        config.max_empty_polls()
    );
    println!("  Request Timeout: {:?}", config.request_timeout());

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}
