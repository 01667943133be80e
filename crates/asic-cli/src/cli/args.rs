use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "asic",
    version,
    about = "Inspect and verify ASiC signature containers"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the entries, manifests and archive chain of a container
    Inspect(ContainerArgs),
    /// Re-verify every manifest digest and the archive manifest chain
    Verify(ContainerArgs),
}

#[derive(Debug, Args, Clone)]
pub struct ContainerArgs {
    /// Container path, or "-" for stdin
    #[arg(value_name = "CONTAINER", default_value = "-")]
    pub container: String,

    /// Output format: 'table' or 'json'
    #[arg(long, default_value = "table")]
    pub format: String,

    /// Extraction limits as JSON, or @path to load from file
    #[arg(long)]
    pub limits: Option<String>,
}
