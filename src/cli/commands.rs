//! CLI command definitions

use clap::Args;

/// Resolver and pipeline context shared by both commands.
#[derive(Debug, Args, Clone)]
pub struct ResolverArgs {
    /// YAML file mapping template names to fragments (static template registry)
    #[arg(long)]
    pub templates: Option<String>,

    /// Known build cluster (repeatable)
    #[arg(long = "cluster")]
    pub cluster: Vec<String>,

    /// Resolvable external trigger reference, e.g. sd@123:main (repeatable)
    #[arg(long = "trigger")]
    pub trigger: Vec<String>,

    /// Identifier of the pipeline being compiled
    #[arg(long, default_value = "")]
    pub pipeline_id: String,

    /// Treat malformed notification rules as fatal
    #[arg(long)]
    pub strict_notifications: bool,
}

/// Compile a configuration file
#[derive(Debug, Args, Clone)]
pub struct CompileCommand {
    /// Path to the configuration YAML file
    #[arg(short, long)]
    pub file: String,

    #[command(flatten)]
    pub resolvers: ResolverArgs,

    /// Pretty-print the compiled JSON
    #[arg(long)]
    pub pretty: bool,
}

/// Validate a configuration file
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Path to the configuration YAML file
    #[arg(short, long)]
    pub file: String,

    #[command(flatten)]
    pub resolvers: ResolverArgs,

    /// Output the result in JSON format
    #[arg(long)]
    pub json: bool,
}

