mod cli;
mod conf;
mod logging;
mod utils;
use crate::cli::Cli;
use crate::conf::Config;
use crate::utils::{read_ready, ReadOutcome};
use clap::Parser;
use log::{info, warn, LevelFilter};
use pollmux::{Event, Interest, Poller};
use std::{fs, io};

const READ_BUFSIZE: usize = 128;

fn load_config(cli: &Cli) -> io::Result<Config> {
    let mut config: Config = match &cli.config {
        Some(path) => match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => toml::from_str(&fs::read_to_string(path)?)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?,
            _ => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "config file must have a .toml extension",
                ))
            }
        },
        None => Config::default(),
    };

    if let Some(poller) = cli.poller {
        config.poller = poller;
    }
    if let Some(timeout) = cli.timeout {
        config.timeout_ms = timeout;
    }
    if let Some(rounds) = cli.rounds {
        config.rounds = rounds;
    }
    Ok(config)
}

fn drain(poller: &Poller, ev: &Event) -> io::Result<()> {
    let mut buf = [0u8; READ_BUFSIZE];
    match read_ready(ev.fd, &mut buf)? {
        ReadOutcome::Data(n) => {
            info!("read {} bytes from fd {}", n, ev.fd);
            print!("{}", String::from_utf8_lossy(&buf[..n]));
        }
        ReadOutcome::Eof => {
            info!("fd {} reached end of stream, no longer watching it", ev.fd);
            poller.remove_event(ev)?;
        }
    }
    Ok(())
}

fn run(poller: &Poller, config: &Config) -> io::Result<()> {
    for watch in &config.watch {
        // Register with a placeholder interest first, then switch to the
        // configured one, so both registration paths get exercised.
        let mut event = Event::new(watch.fd, Interest::ERROR);
        let ret = poller.add_event(&event);
        info!("add fd {} ({}): {:?}", event.fd, event.interest, ret);
        ret?;

        event.interest = watch.interest();
        let ret = poller.update_event(&event);
        info!("update fd {} ({}): {:?}", event.fd, event.interest, ret);
        ret?;
    }

    let mut events = vec![Event::default(); config.max_events.max(1)];
    for round in 1..=config.rounds {
        if poller.is_empty() {
            warn!("nothing left to watch");
            break;
        }
        let n = poller.wait_event(&mut events, config.timeout_ms)?;
        info!("round {}: {} ready", round, n);

        for ev in &events[..n] {
            println!("fd {}: {}", ev.fd, ev.ready);
            if ev.is_readable() {
                drain(poller, ev)?;
            }
        }
    }

    for watch in &config.watch {
        let ret = poller.remove_event(&Event::new(watch.fd, watch.interest()));
        info!("remove fd {}: {:?}", watch.fd, ret);
        ret?;
    }
    Ok(())
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let level = match cli.verbose {
        0 => LevelFilter::from(config.log_level),
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    logging::init(level, config.log_file.as_deref())?;

    info!("{:#?}", config);

    let poller = Poller::new(config.poller, config.capacity)?;
    info!("created {:?}", poller);

    run(&poller, &config)
}
