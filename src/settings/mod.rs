//! Settings loaded from `settings/*.toml`, selectable with `--settings`.

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;
