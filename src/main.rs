use anyhow::{Context, Result};
use nginx_deployer::cli::output::{format_execution_event, style, CROSS, INFO};
use nginx_deployer::cli::{Cli, Command};
use nginx_deployer::{Deployer, RunnerState};
use tracing::{error, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_str()));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    let options = cli.options.resolve().context("Failed to load options")?;
    let deployer = Deployer::from_env(options).with_event_handler(|event| {
        println!("{}", format_execution_event(&event));
    });

    match cli.command {
        Command::Deploy => configure(&deployer, Stage::Deploy).await,
        Command::Install => configure(&deployer, Stage::Install).await,
        Command::Run => start(&deployer).await?,
        Command::Up => {
            configure(&deployer, Stage::Deploy).await;
            configure(&deployer, Stage::Install).await;
            start(&deployer).await?;
        }
    }

    Ok(())
}

enum Stage {
    Deploy,
    Install,
}

/// Run a configuration pipeline; any failure terminates the process
async fn configure(deployer: &Deployer, stage: Stage) {
    let result = match stage {
        Stage::Deploy => deployer.deploy().await,
        Stage::Install => deployer.install().await,
    };

    if let Err(e) = result {
        println!("\n{} {}", CROSS, style(&e).red());
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn start(deployer: &Deployer) -> Result<()> {
    println!(
        "{} Starting {}",
        INFO,
        style(&deployer.options().nginx.binary).bold()
    );
    match deployer.run().await.context("nginx failed")? {
        RunnerState::Exited(Some(0)) => {}
        state => println!("{} nginx stopped: {:?}", INFO, state),
    }
    Ok(())
}
