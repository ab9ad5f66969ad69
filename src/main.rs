use clap::Parser;
use log::{info, warn};
use pulsestep::{
    cli::{
        input::{dispatch, parse_line, ConsoleCommand},
        validate_device, Args,
    },
    config::Settings,
    logging,
    midi::{MidiPort, MidirPort},
    midi_output::MidiOutputSink,
    sink::MonitorSink,
    Controller, EngineHandle, EventSink, Pattern,
};
use std::error::Error;
use std::io::{self, BufRead};
use std::thread;
use std::time::Duration;

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    if args.list_devices {
        return list_available_devices();
    }

    let settings = Settings::load(args.config.as_deref())?.with_overrides(&args)?;
    initialize_logging(&settings)?;

    let engine = EngineHandle::spawn(build_sinks(&settings)?)?;
    configure_engine(engine.controller(), &settings)?;

    match args.duration {
        Some(secs) => run_for(engine.controller(), secs)?,
        None => run_console(engine.controller())?,
    }

    engine.controller().stop()?;
    if let Some(sequencer) = engine.shutdown() {
        info!(
            "Engine shut down after {} pulses",
            sequencer.state().get_tick_count()
        );
    }
    Ok(())
}

fn initialize_logging(settings: &Settings) -> Result<(), Box<dyn Error>> {
    match logging::init_logger(settings.level_filter()?) {
        Ok(path) => info!("Application starting, logging to {}", path.display()),
        Err(e) => eprintln!("Logging disabled: {}", e),
    }
    Ok(())
}

fn list_available_devices() -> Result<(), Box<dyn Error>> {
    println!("Available MIDI output devices:");
    for device in MidirPort::list_available_ports()? {
        println!("  - {}", device);
    }
    Ok(())
}

fn build_sinks(settings: &Settings) -> Result<Vec<Box<dyn EventSink>>, Box<dyn Error>> {
    let mut sinks: Vec<Box<dyn EventSink>> = Vec::new();

    if let Some(device_name) = &settings.midi_output {
        let devices = MidirPort::list_available_ports()?;
        validate_device(device_name, &devices)?;
        let port = MidirPort::connect(device_name)?;
        println!("Sending MIDI to: {}", port.name());
        sinks.push(Box::new(MidiOutputSink::new(port, settings.panic_on_stop)));
    }

    if settings.monitor || sinks.is_empty() {
        if !settings.monitor {
            warn!("No MIDI output configured, printing events instead");
        }
        sinks.push(Box::new(MonitorSink::stdout()));
    }
    Ok(sinks)
}

fn configure_engine(controller: &Controller, settings: &Settings) -> Result<(), Box<dyn Error>> {
    controller.set_bpm(settings.bpm)?;
    controller.set_ppq(settings.ppq)?;
    controller.set_pattern(Pattern::demo())?;
    controller.start()?;
    Ok(())
}

fn run_for(controller: &Controller, secs: f64) -> Result<(), Box<dyn Error>> {
    let duration = Duration::try_from_secs_f64(secs)
        .map_err(|e| format!("invalid duration {}: {}", secs, e))?;
    info!("Running for {:?}", duration);
    thread::sleep(duration);
    controller.stop()?;
    Ok(())
}

fn run_console(controller: &Controller) -> Result<(), Box<dyn Error>> {
    println!("Commands: start, stop, bpm N, ppq N, quit");
    for line in io::stdin().lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(&line) {
            Ok(ConsoleCommand::Quit) => break,
            Ok(command) => {
                if let Err(e) = dispatch(controller, &command) {
                    eprintln!("{}", e);
                }
            }
            Err(e) => eprintln!("{}", e),
        }
    }
    Ok(())
}
