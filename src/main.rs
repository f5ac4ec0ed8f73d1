mod classifier;
mod cli;
mod config;
mod logging;
mod pipeline;
mod trace;
mod tracker;

fn main() -> anyhow::Result<()> {
    logging::init();
    cli::run()
}
