pub mod cli;
pub mod error;
pub mod google_api;
pub mod guests;
pub mod handwriting;
pub mod intelligence;
pub mod notes;
pub mod state;
pub mod sync;
pub mod types;
pub mod voice;

use clap::Parser;

pub use error::NoteflowError;
pub use notes::{NoteDraft, NoteStore};
pub use state::AppContext;
pub use types::{Config, Note, Reminder};

/// Parse arguments, run one command on a fresh runtime and exit.
pub fn run() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = cli::Cli::parse();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            log::error!("Failed to start async runtime: {}", e);
            std::process::exit(1);
        }
    };

    let code = cli::report(runtime.block_on(cli::run(cli)));
    std::process::exit(code);
}
