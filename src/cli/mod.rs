//! Command-line interface for the compiler

mod config;
mod handlers;

use crate::error::{CompilerError, Result};
use crate::Stylus;
use clap::{Arg, ArgAction, Command, ValueEnum};
use std::path::Path;

#[derive(Debug, Clone, ValueEnum)]
pub enum StatsFormat {
    Text,
    Json,
}

pub struct Cli {
    config: config::ConfigFile,
}

impl Cli {
    pub fn new() -> Self {
        Self {
            config: config::ConfigFile::default(),
        }
    }

    pub fn run(&mut self) -> Result<()> {
        let matches = self.build_cli().get_matches();

        if let Some(config_path) = matches.get_one::<String>("config") {
            self.config = config::load(config_path)?;
        }

        self.setup_logging(matches.get_count("verbose"));

        match matches.subcommand() {
            Some(("compile", sub_matches)) => handlers::handle_compile_command(self, sub_matches),
            Some(("check", sub_matches)) => handlers::handle_check_command(sub_matches),
            _ => {
                println!("No subcommand specified. Use --help for usage information.");
                Ok(())
            }
        }
    }

    fn build_cli(&self) -> Command {
        Command::new(crate::NAME)
            .version(crate::VERSION)
            .about(crate::DESCRIPTION)
            .arg(
                Arg::new("config")
                    .short('c')
                    .long("config")
                    .value_name("FILE")
                    .help("Configuration file path (.json or .toml)")
                    .action(ArgAction::Set),
            )
            .arg(
                Arg::new("verbose")
                    .short('v')
                    .long("verbose")
                    .help("Increase verbosity (can be used multiple times)")
                    .action(ArgAction::Count),
            )
            .subcommand(
                Command::new("compile")
                    .about("Compile .styl files to CSS")
                    .arg(Arg::new("input").help("Input .styl file or directory").required(true).index(1))
                    .arg(Arg::new("output").short('o').long("output").value_name("FILE").help("Output CSS file (single-file mode)"))
                    .arg(Arg::new("out-dir").long("out-dir").value_name("DIR").help("Output directory (directory mode)"))
                    .arg(Arg::new("import-dir").short('I').long("import-dir").value_name("DIR").help("Directory @import paths resolve against"))
                    .arg(Arg::new("define").short('D').long("define").value_name("VAR=VALUE").help("Assign a variable ahead of the source").action(ArgAction::Append))
                    .arg(Arg::new("overwrite").long("overwrite").help("Overwrite existing CSS files in directory mode").action(ArgAction::SetTrue))
                    .arg(Arg::new("stats").long("stats").help("Show detailed render statistics").action(ArgAction::SetTrue))
                    .arg(Arg::new("stats-format").long("stats-format").value_parser(clap::value_parser!(StatsFormat)).default_value("text").help("Statistics output format"))
                    .arg(Arg::new("watch").short('w').long("watch").help("Watch for file changes and recompile").action(ArgAction::SetTrue)),
            )
            .subcommand(
                Command::new("check")
                    .about("Parse .styl files and report errors without writing output")
                    .arg(Arg::new("input").help("Input .styl file or directory").required(true).index(1))
                    .arg(Arg::new("recursive").short('r').long("recursive").help("Check all .styl files in directory recursively").action(ArgAction::SetTrue)),
            )
    }

    fn setup_logging(&self, verbose_count: u8) {
        let log_level = match verbose_count {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };
        env_logger::Builder::from_default_env()
            .filter_level(log_level)
            .format_timestamp_secs()
            .init();
    }

    /// Builds an engine from the config file and `compile` flags. Values
    /// given on the command line win over the config file.
    pub(crate) fn build_engine(
        &self,
        matches: &clap::ArgMatches,
        read_dir: &Path,
    ) -> Result<Stylus> {
        let mut stylus = Stylus::new();
        stylus.set_read_dir(read_dir)?;

        if let Some(dir) = matches.get_one::<String>("import-dir") {
            stylus.set_import_dir(dir)?;
        } else if let Some(dir) = &self.config.import_dir {
            stylus.set_import_dir(dir)?;
        }

        if let Some(config_vars) = &self.config.variables {
            for (name, value) in config_vars {
                stylus.assign(name, value);
            }
        }
        if let Some(defines) = matches.get_many::<String>("define") {
            for define in defines {
                let Some((name, value)) = define.split_once('=') else {
                    return Err(CompilerError::InvalidFormat {
                        message: format!(
                            "Invalid variable definition: {}. Use VAR=VALUE format.",
                            define
                        ),
                    });
                };
                stylus.assign(name, value);
            }
        }

        Ok(stylus)
    }

    pub(crate) fn output_directory(&self) -> Option<&String> {
        self.config.output_directory.as_ref()
    }

    pub(crate) fn overwrite_default(&self) -> bool {
        self.config.overwrite.unwrap_or(false)
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self::new()
    }
}
