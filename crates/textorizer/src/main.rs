use crate::prelude::*;
use clap::{CommandFactory, FromArgMatches};
use textorizer_core::info::ProjectInfo;

mod edit;
mod error;
mod export;
mod prelude;
mod regions;
mod session;
mod text;

const COPYRIGHT_YEARS: &str = "2024";

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    long_about = "Find the text columns of PDF pages, edit them, and extract their text in reading order"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Whether to display additional information.
    #[clap(long, env = "TEXTORIZER_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// List the regions of a document
    Regions(crate::regions::App),

    /// Convert regions to plain text
    Text(crate::text::App),

    /// Detect every page and write a region file
    Export(crate::export::App),

    /// Change the regions stored in a region file
    Edit(crate::edit::App),
}

fn project_info() -> ProjectInfo {
    ProjectInfo::from_package(
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_HOMEPAGE"),
        env!("CARGO_PKG_AUTHORS"),
        COPYRIGHT_YEARS,
    )
}

/// The root command, with the texts taken from the package metadata.
fn command(info: &ProjectInfo) -> clap::Command {
    App::command()
        .about(info.summary.clone())
        .long_version(info.version_string())
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let matches = command(&project_info()).get_matches();
    let app = App::from_arg_matches(&matches).unwrap_or_else(|err| err.exit());

    let level = if app.global.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match app.command {
        SubCommands::Regions(sub_app) => crate::regions::run(sub_app, app.global),
        SubCommands::Text(sub_app) => crate::text::run(sub_app, app.global),
        SubCommands::Export(sub_app) => crate::export::run(sub_app, app.global),
        SubCommands::Edit(sub_app) => crate::edit::run(sub_app, app.global),
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_consistent() {
        App::command().debug_assert();
    }

    #[test]
    fn test_long_version() {
        let text = project_info().version_string();
        assert!(text.starts_with(&f!("textorizer {}\n", env!("CARGO_PKG_VERSION"))));
        assert!(text.contains("Copyright (c) 2024"));
    }

    #[test]
    fn test_about_is_the_package_summary() {
        let cmd = command(&project_info());
        assert_eq!(
            cmd.get_about().map(|about| about.to_string()).as_deref(),
            Some(env!("CARGO_PKG_DESCRIPTION"))
        );
    }

    #[test]
    fn test_verbose_is_global() {
        use clap::Parser;
        let app = App::try_parse_from(["textorizer", "regions", "a.pdf", "--verbose"]).unwrap();
        assert!(app.global.verbose);
    }
}
