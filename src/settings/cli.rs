use super::Parser;

#[derive(Parser, Debug)]
#[command(about = "Session coordinator and guarded page host")]
pub struct Cli {
    /// Path of the settings file to load.
    #[arg(long)]
    pub settings: Option<String>,
}
