//! salt-growl CLI entry point

use std::process::ExitCode;

use clap::Parser;

use salt_growl::cli::{
    app::load_merged_config,
    args::{Cli, Commands, WatchArgs},
    config_cmd::handle_config_command,
    logging,
    presenter::Presenter,
    run_notify, run_register, run_return, run_watch, EXIT_ERROR,
};
use salt_growl::infrastructure::XdgConfigStore;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let notifier_config = cli.notifier.to_config();

    match cli.command {
        Some(Commands::Config { action }) => {
            let presenter = Presenter::new();
            let store = XdgConfigStore::new();
            if let Err(e) = handle_config_command(action, &store, &presenter).await {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
            ExitCode::SUCCESS
        }
        Some(Commands::Notify {
            message,
            note_type,
            title,
        }) => {
            let config = load_merged_config(notifier_config).await;
            run_notify(config, &message, &note_type, &title).await
        }
        Some(Commands::Return) => run_return(load_merged_config(notifier_config).await).await,
        Some(Commands::Register) => run_register(load_merged_config(notifier_config).await).await,
        Some(Commands::Watch(watch)) => watch_with(watch, &cli.notifier).await,
        None => watch_with(WatchArgs::default(), &cli.notifier).await,
    }
}

async fn watch_with(watch: WatchArgs, notifier: &salt_growl::cli::NotifierArgs) -> ExitCode {
    let config = load_merged_config(watch.to_config(notifier)).await;
    run_watch(config, watch.stdin).await
}
