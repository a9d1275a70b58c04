use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "jotpad-digest")]
#[command(about = "Combine the top news headlines into one idea and deliver it")]
#[command(version)]
pub struct Cli {
    /// Print the generated idea instead of saving and sending it
    #[arg(long)]
    pub dry_run: bool,

    /// Run even if the configured interval has not elapsed
    #[arg(long)]
    pub force: bool,

    /// Number of news items to collect
    #[arg(long, value_name = "N", default_value_t = 3)]
    pub items: usize,
}
