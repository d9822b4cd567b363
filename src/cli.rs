use clap::Parser;

pub const DEFAULT_HOST: &str = "http://espa.cr.usgs.gov";

/// Download completed scenes for ESPA orders
#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub struct Args {
    /// Email address for the user that submitted the order
    #[arg(short, long)]
    pub email: String,

    /// Which order to download (use ALL for every order)
    #[arg(short, long)]
    pub order: String,

    /// Where to store the downloaded scenes
    #[arg(short = 'd', long = "target_directory")]
    pub target_directory: String,

    /// Skip files whose local size already matches the remote size
    #[arg(long)]
    pub resume: bool,

    /// Base URL of the ordering service
    #[arg(long, default_value = DEFAULT_HOST)]
    pub host: String,
}
