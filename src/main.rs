use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = tareas::cli::Cli::parse();
    let config = tareas::config::from_cli(&cli)?;

    match cli.command.clone() {
        Some(tareas::cli::CliCommand::Tui) | None => {
            tareas::tui::run(config, cli.offline)?;
        }
        Some(command) => {
            tareas::logging::init_stderr(&config)?;
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            tareas::commands::execute(&config, cli.offline, command, &mut handle)?;
        }
    }

    Ok(())
}
