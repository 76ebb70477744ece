use anyhow::{Context, Result};
use pipeline_compiler::cli::commands::{CompileCommand, ResolverArgs, ValidateCommand};
use pipeline_compiler::cli::output::*;
use pipeline_compiler::cli::{Cli, Command};
use pipeline_compiler::{
    Compiler, CompilerOptions, StaticClusters, StaticTemplates, StaticTriggers,
};
use std::sync::Arc;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    match &cli.command {
        Command::Compile(cmd) => compile_pipeline(cmd).await?,
        Command::Validate(cmd) => validate_pipeline(cmd).await?,
    }

    Ok(())
}

async fn compile_pipeline(cmd: &CompileCommand) -> Result<()> {
    let compiler = build_compiler(&cmd.resolvers)?;
    let text = read_config(&cmd.file);

    let pipeline = compiler.compile(&text).await;
    print_warnings(&pipeline.warn_messages);

    let json = if cmd.pretty {
        serde_json::to_string_pretty(&pipeline)
    } else {
        serde_json::to_string(&pipeline)
    }
    .context("Failed to serialize compiled pipeline")?;
    println!("{}", json);

    Ok(())
}

async fn validate_pipeline(cmd: &ValidateCommand) -> Result<()> {
    let compiler = build_compiler(&cmd.resolvers)?;
    let text = read_config(&cmd.file);

    let pipeline = compiler.compile(&text).await;
    if cmd.json {
        let json = serde_json::json!({
            "valid": pipeline.errors.is_empty(),
            "errors": pipeline.errors,
            "warnings": pipeline.warn_messages,
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        print_verdict(&pipeline.errors, &pipeline.warn_messages);
    }

    if pipeline.errors.is_empty() {
        Ok(())
    } else {
        std::process::exit(1);
    }
}

fn build_compiler(args: &ResolverArgs) -> Result<Compiler> {
    let templates = match &args.templates {
        Some(path) => {
            let yaml = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read template registry {}", path))?;
            StaticTemplates::from_yaml(&yaml)
                .with_context(|| format!("Failed to parse template registry {}", path))?
        }
        None => StaticTemplates::new(),
    };

    let compiler = Compiler::new(
        Arc::new(templates),
        Arc::new(StaticClusters::new(args.cluster.clone())),
        Arc::new(StaticTriggers::new(args.trigger.clone())),
    )
    .with_options(CompilerOptions {
        pipeline_id: args.pipeline_id.clone(),
        notifications_fatal: args.strict_notifications,
    });

    Ok(compiler)
}

// A missing or unreadable config file is the canonical failure the
// compiler already handles: empty input produces the fallback pipeline.
fn read_config(path: &str) -> String {
    match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            debug!(%path, error = %e, "could not read configuration file");
            String::new()
        }
    }
}
