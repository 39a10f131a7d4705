mod cli;
mod commands;
mod env_loader;
mod error;
mod report;

fn main() {
    env_loader::load_dotenv();
    env_loader::warn_unknown_env_keys();

    if let Err(err) = cli::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
