//! chatstack - CLI entry point

use anyhow::Result;
use chatstack::cli::{Args, Commands};
use chatstack::config::Config;
use chatstack::doctor::Doctor;
use chatstack::launcher::{LaunchPlan, Launcher};
use chatstack::ollama::OllamaClient;
use clap::Parser;
use colored::Colorize;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    match &args.command {
        Some(Commands::Doctor) => run_doctor(&args).await,
        Some(Commands::Models) => list_models(&args).await,
        Some(Commands::Config) => show_config(&args),
        Some(Commands::Up) | None => run_up(&args).await,
    }
}

/// Build the launch plan from CLI args layered over the config file
fn build_plan(args: &Args) -> LaunchPlan {
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("{}: {} (using defaults)", "Warning".yellow(), e);
        Config::default()
    });

    LaunchPlan {
        model: args.model.clone(),
        ollama_host: args.ollama_host.clone(),
        backend_url: args.backend_url(),
        backend_port: args.backend_port,
        frontend_port: args.frontend_port,
        base_path: args.base_path.clone(),
        probe_url: args.probe_url.clone(),
        retries: args.retries.unwrap_or(config.launch.retries),
        poll_interval: Duration::from_secs(
            args.poll_interval.unwrap_or(config.launch.poll_interval_secs),
        ),
        log_dir: args
            .log_dir
            .clone()
            .unwrap_or_else(LaunchPlan::default_log_dir),
        commands: config.services,
        quiet: !args.verbosity().show_progress(),
    }
}

/// Start the full stack, then hold the frontend in the foreground
async fn run_up(args: &Args) -> Result<()> {
    let plan = build_plan(args);
    let frontend_url = args.frontend_url();
    let mut launcher = Launcher::new(plan);

    if let Err(e) = launcher.run().await {
        eprintln!("{} startup failed: {}", "✗".red(), e);
        std::process::exit(1);
    }

    if !args.quiet {
        println!(
            "\n{} stack is up - frontend at {}",
            "✓".green(),
            frontend_url.bold()
        );
    }

    // The frontend is the stack's foreground process; its exit ends ours
    match launcher.wait_for_frontend().await {
        Some(Ok(status)) if status.success() => Ok(()),
        Some(Ok(status)) => {
            eprintln!("{} frontend exited with {}", "✗".red(), status);
            launcher.teardown();
            std::process::exit(status.code().unwrap_or(1));
        }
        Some(Err(e)) => {
            launcher.teardown();
            Err(e.into())
        }
        None => Ok(()),
    }
}

/// Run health checks without starting anything
async fn run_doctor(args: &Args) -> Result<()> {
    let doctor = Doctor::new(
        args.ollama_host.clone(),
        args.backend_url(),
        args.model.clone(),
        args.log_dir
            .clone()
            .unwrap_or_else(LaunchPlan::default_log_dir),
    );

    let checks = doctor.run_diagnostics().await;
    Doctor::display_results(&checks);

    if !Doctor::overall_status(&checks) {
        std::process::exit(1);
    }

    Ok(())
}

/// List models installed on the Ollama server
async fn list_models(args: &Args) -> Result<()> {
    let client = OllamaClient::new(&args.ollama_host).silent();

    let models = match client.list_models().await {
        Ok(models) => models,
        Err(e) => {
            eprintln!("{} {}", "✗".red(), e);
            std::process::exit(1);
        }
    };

    if models.is_empty() {
        println!("No models installed. Pull one with: ollama pull {}", args.model);
        return Ok(());
    }

    println!("{:<30} {:>10}  {}", "NAME".bold(), "SIZE".bold(), "MODIFIED".bold());
    for model in models {
        let size_gb = model.size as f64 / (1024.0 * 1024.0 * 1024.0);
        let modified = model
            .modified_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!("{:<30} {:>8.1}GB  {}", model.name, size_gb, modified);
    }

    Ok(())
}

/// Display the resolved configuration
fn show_config(args: &Args) -> Result<()> {
    let plan = build_plan(args);

    println!("config file:    {}", Config::config_path()?.display());
    println!("model:          {}", plan.model);
    println!("ollama host:    {}", plan.ollama_host);
    println!("backend url:    {}", plan.backend_url);
    println!("frontend url:   {}", args.frontend_url());
    println!("probe url:      {}", plan.probe_url);
    println!("retries:        {}", plan.retries);
    println!("poll interval:  {}s", plan.poll_interval.as_secs());
    println!("log dir:        {}", plan.log_dir.display());
    println!("ollama cmd:     {}", plan.commands.ollama);
    println!("backend cmd:    {}", plan.commands.backend);
    println!("frontend cmd:   {}", plan.commands.frontend);

    Ok(())
}
