// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result, bail};
use config::Config;
use runtime::{RecordSource, SheetRuntime};
use saira_app::{AppCommand, AppEvent, AppState, CallRecord};
use saira_client::Client;
use std::env;
use std::path::PathBuf;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `saira --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    let source = if options.demo {
        RecordSource::demo()
    } else {
        let url = match &options.url {
            Some(url) => url.clone(),
            None => config.source_url()?,
        };
        let client = Client::new(&url, config.source_timeout()?).with_context(|| {
            format!(
                "invalid [source] config in {}; fix url/timeout values",
                options.config_path.display()
            )
        })?;
        RecordSource::Remote(client)
    };
    let view_options = config.view_options()?;
    if options.check_only {
        return Ok(());
    }

    logging::init(config.log_level(), &config.log_file()?)?;
    tracing::info!(config = %options.config_path.display(), demo = options.demo, "starting saira");

    if options.dump {
        let records = source.fetch()?;
        print!("{}", dump_table(records, options.query.as_deref()));
        return Ok(());
    }

    let mut state = AppState::with_contact_details(config.contact_details());
    let mut runtime = SheetRuntime::new(source);
    saira_tui::run_app(&mut state, &mut runtime, &view_options)
}

/// Loads `records` into a fresh state, settles `query` immediately, and renders
/// the visible rows as text.
fn dump_table(records: Vec<CallRecord>, query: Option<&str>) -> String {
    let mut state = AppState::default();
    state.dispatch(AppCommand::RecordsLoaded(records));
    if let Some(query) = query {
        for event in state.dispatch(AppCommand::SetSearch(query.to_owned())) {
            if let AppEvent::SearchScheduled { token } = event {
                state.dispatch(AppCommand::SearchSettled { token });
            }
        }
    }
    saira_tui::plain_table(&state)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    url: Option<String>,
    query: Option<String>,
    print_config_path: bool,
    print_example: bool,
    demo: bool,
    dump: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        url: None,
        query: None,
        print_config_path: false,
        print_example: false,
        demo: false,
        dump: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--url" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--url requires an endpoint URL"))?;
                options.url = Some(value.as_ref().to_owned());
            }
            "--query" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--query requires search text"))?;
                options.query = Some(value.as_ref().to_owned());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--dump" => {
                options.dump = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow::anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    if options.query.is_some() && !options.dump {
        bail!("--query only applies with --dump");
    }

    Ok(options)
}

fn print_help() {
    println!("saira lead dashboard");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a config template");
    println!("  --url <endpoint>         Fetch records from this URL instead of [source].url");
    println!("  --demo                   Launch with generated demo records (no network)");
    println!("  --dump                   Fetch once, print the table, and exit");
    println!("  --query <text>           Filter the --dump output");
    println!("  --check                  Validate config and record source, then exit");
    println!("  --help                   Show this help");
}
