use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, Command};
use rhombus_pattern::{PatternGenerator, Word};
use rhombus_web::{server, telemetry, ServerConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

fn cli() -> Command {
    Command::new("rhombus")
        .version(rhombus_web::VERSION)
        .about("Authenticated diamond-pattern text service")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("serve")
                .about("Run the HTTP server")
                .arg(
                    Arg::new("config")
                        .long("config")
                        .short('c')
                        .value_parser(value_parser!(PathBuf))
                        .help("Path to a TOML config file"),
                )
                .arg(
                    Arg::new("bind")
                        .long("bind")
                        .value_parser(value_parser!(SocketAddr))
                        .help("Listen address, overrides config and RHOMBUS_BIND"),
                ),
        )
        .subcommand(
            Command::new("pattern")
                .about("Print a diamond pattern")
                .arg(
                    Arg::new("lines")
                        .long("lines")
                        .short('n')
                        .required(true)
                        .allow_negative_numbers(true)
                        .value_parser(value_parser!(i64))
                        .help("Number of lines (even counts are bumped by one)"),
                )
                .arg(
                    Arg::new("word")
                        .long("word")
                        .help("Word to repeat instead of the default"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();

    match matches.subcommand() {
        Some(("serve", args)) => {
            let path = args.get_one::<PathBuf>("config");
            let mut config = ServerConfig::load(path.map(PathBuf::as_path))
                .context("loading configuration")?;
            if let Some(bind) = args.get_one::<SocketAddr>("bind") {
                config = config.with_bind_addr(*bind);
            }

            telemetry::init(&config.log_filter, config.log_json);
            tracing::info!("Starting rhombus {}", rhombus_web::VERSION);

            let state = Arc::new(server::build_state(config)?);
            server::run(state, server::shutdown_signal()).await?;
        }
        Some(("pattern", args)) => {
            let lines = *args
                .get_one::<i64>("lines")
                .context("--lines is required")?;
            let word = match args.get_one::<String>("word") {
                Some(word) => Word::new(word.clone())?,
                None => Word::default(),
            };

            let result = PatternGenerator::new(word).generate(lines)?;

            if args.get_flag("json") {
                println!("{}", serde_json::to_string_pretty(&result.into_rendered())?);
            } else {
                println!("{result}");
            }
        }
        _ => {}
    }

    Ok(())
}
