use clap::Parser;
use dispatch_sim::utils::error::{DispatchError, ErrorSeverity};
use dispatch_sim::utils::{logger, validation::Validate};
use dispatch_sim::{CliConfig, HttpWorld, SimulationEngine};
use std::sync::Arc;

fn exit_code(e: &DispatchError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

fn report_failure(e: &DispatchError) {
    tracing::error!(
        "❌ Simulation failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    if config.json_logs {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting dispatch-sim against {}", config.base_url);
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let world = match HttpWorld::new(&config) {
        Ok(world) => Arc::new(world),
        Err(e) => {
            report_failure(&e);
            std::process::exit(exit_code(&e).max(1));
        }
    };
    let engine = SimulationEngine::new(world, config);

    match engine.run().await {
        Ok(summary) => {
            println!("✅ Simulation finished");
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Err(e) => {
            report_failure(&e);
            let code = exit_code(&e);
            if code > 0 {
                std::process::exit(code);
            }
        }
    }

    Ok(())
}
