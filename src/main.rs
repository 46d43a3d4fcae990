use std::path::Path;
use std::process;

use clap::{Arg, ArgAction, Command};
use log::LevelFilter;
use mbox_sift::config::{Config, FetchErrorPolicy};
use mbox_sift::pipeline;

fn main() {
    let matches = Command::new("mbox-sift")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Extracts To/From/Subject/Date rows from an mbox archive, filtered against a live exclusion list")
        .arg(
            Arg::new("input")
                .value_name("INPUT")
                .help("Path to the mbox archive to read")
                .required_unless_present("generate-config"),
        )
        .arg(
            Arg::new("output")
                .value_name("OUTPUT")
                .help("Path of the CSV file to write")
                .required_unless_present("generate-config"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("mbox-sift.yaml"),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Generate a default configuration file and exit")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("endpoint")
                .long("endpoint")
                .value_name("URL")
                .help("Override the exclusion-service endpoint")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("token")
                .long("token")
                .value_name("TOKEN")
                .help("Override the exclusion-service token (or set MBOX_SIFT_TOKEN)")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("allow-missing-exclusions")
                .long("allow-missing-exclusions")
                .help("Proceed with an empty exclusion list if the service is unreachable")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("offline")
                .long("offline")
                .help("Skip the exclusion-service fetch entirely and write all records")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("year")
                .long("year")
                .value_name("YEAR")
                .help("Keep only messages dated in the given year")
                .value_parser(clap::value_parser!(i32))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("no-subject")
                .long("no-subject")
                .help("Drop the Subject column from the output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if let Some(generate_path) = matches.get_one::<String>("generate-config") {
        generate_default_config(generate_path);
        return;
    }

    let config_path = matches.get_one::<String>("config").unwrap();
    let mut config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            process::exit(1);
        }
    };
    apply_overrides(&mut config, &matches);

    let input = matches.get_one::<String>("input").unwrap();
    let output = matches.get_one::<String>("output").unwrap();

    match pipeline::run(&config, Path::new(input), Path::new(output)) {
        Ok(report) => {
            // Warnings were already streamed to stderr via the logger.
            println!("{}", report.summary());
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

fn load_config(path: &str) -> anyhow::Result<Config> {
    if std::path::Path::new(path).exists() {
        Ok(Config::from_file(path)?)
    } else {
        log::warn!("configuration file '{path}' not found, using default configuration");
        Ok(Config::default())
    }
}

fn apply_overrides(config: &mut Config, matches: &clap::ArgMatches) {
    if matches.get_flag("offline") {
        config.exclusion_service = None;
    }
    if let Some(service) = config.exclusion_service.as_mut() {
        if let Some(endpoint) = matches.get_one::<String>("endpoint") {
            service.endpoint = endpoint.clone();
        }
        if let Some(token) = matches.get_one::<String>("token") {
            service.token = Some(token.clone());
        }
        if matches.get_flag("allow-missing-exclusions") {
            service.on_fetch_error = FetchErrorPolicy::Proceed;
        }
    }
    if let Some(year) = matches.get_one::<i32>("year") {
        config.export.year = Some(*year);
    }
    if matches.get_flag("no-subject") {
        config.export.include_subject = false;
    }
}

fn generate_default_config(path: &str) {
    let config = Config::default();
    match config.to_file(path) {
        Ok(()) => {
            println!("Default configuration written to: {path}");
            println!("Please edit the configuration file to suit your needs.");
        }
        Err(e) => {
            eprintln!("Error writing configuration file: {e}");
            process::exit(1);
        }
    }
}
