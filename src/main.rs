use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use std::process::ExitCode;

use tracing::{debug, error, info, warn};

use dirmirror::config::{load_env_file, CliOverrides, Config, Credentials};
use dirmirror::logging::init_tracing;
use dirmirror::mirror;
use dirmirror::MirrorError;

fn cli() -> Command {
	Command::new("dirmirror")
		.version(env!("CARGO_PKG_VERSION"))
		.about("Replace a remote FTPS directory with the contents of a local one")
		.arg(
			Arg::new("include-excluded")
				.long("include-excluded")
				.visible_alias("images")
				.action(ArgAction::SetTrue)
				.help("Also clean and upload the excluded subtree"),
		)
		.arg(
			Arg::new("backup")
				.long("backup")
				.action(ArgAction::SetTrue)
				.help("Write a zip archive of the local tree before uploading"),
		)
		.arg(
			Arg::new("config")
				.short('c')
				.long("config")
				.value_name("FILE")
				.value_parser(value_parser!(PathBuf))
				.help("Config file (default: ./dirmirror.toml when present)"),
		)
		.arg(
			Arg::new("source")
				.short('s')
				.long("source")
				.value_name("DIR")
				.value_parser(value_parser!(PathBuf))
				.help("Local directory to mirror"),
		)
		.arg(
			Arg::new("root")
				.short('r')
				.long("root")
				.value_name("PATH")
				.help("Absolute remote directory to replace"),
		)
		.arg(Arg::new("host").long("host").value_name("HOST").help("FTPS server host"))
		.arg(
			Arg::new("port")
				.short('p')
				.long("port")
				.value_name("PORT")
				.value_parser(value_parser!(u16))
				.help("FTPS server port"),
		)
		.arg(
			Arg::new("exclude-name")
				.long("exclude-name")
				.value_name("NAME")
				.help("Name of the subtree left alone (default: media)"),
		)
		.arg(
			Arg::new("env-file")
				.long("env-file")
				.value_name("FILE")
				.value_parser(value_parser!(PathBuf))
				.help("Dotenv file with FTP credentials (default: ../.env)"),
		)
		.arg(
			Arg::new("verbose")
				.short('v')
				.long("verbose")
				.action(ArgAction::SetTrue)
				.help("Debug logging"),
		)
}

fn overrides(matches: &ArgMatches) -> CliOverrides {
	CliOverrides {
		source: matches.get_one::<PathBuf>("source").cloned(),
		remote_root: matches.get_one::<String>("root").cloned(),
		host: matches.get_one::<String>("host").cloned(),
		port: matches.get_one::<u16>("port").copied(),
		excluded_subtree: matches.get_one::<String>("exclude-name").cloned(),
		env_file: matches.get_one::<PathBuf>("env-file").cloned(),
		include_excluded: matches.get_flag("include-excluded"),
		backup: matches.get_flag("backup"),
		verbose: matches.get_flag("verbose"),
	}
}

fn run(matches: &ArgMatches) -> Result<(), MirrorError> {
	let cli = overrides(matches);
	let mut config = Config::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?;
	let env_file = cli.env_file.clone().unwrap_or_else(|| config.env_file.clone());
	let env_loaded = load_env_file(&env_file)?;
	config.apply_env();
	cli.apply(&mut config);

	init_tracing(&config.log_level);
	if env_loaded {
		debug!("Read environment from {}", env_file.display());
	}

	let credentials = Credentials::from_env()?;
	let report = mirror::run_ftp(&config, &credentials)?;

	info!("{}", report);
	if report.has_failures() {
		warn!("{} item(s) could not be transferred, see above", report.failures);
	}
	info!("All operations completed successfully");
	Ok(())
}

fn main() -> ExitCode {
	let matches = cli().get_matches();

	match run(&matches) {
		Ok(()) => ExitCode::SUCCESS,
		Err(err) => {
			// Errors before the subscriber is up still need to reach the user
			init_tracing("info");
			error!("Fatal error: {}", err);
			ExitCode::FAILURE
		}
	}
}


// vim: ts=4
