//! Pulse actuator daemon.
//!
//! Binds the signaling port, accepts a single operator session and drives
//! the GPIO pin. The process exits when the session ends; a supervisor
//! restarts it for the next one. `--console` swaps the GPIO backend for
//! stdout, for dry runs on machines without a pin.

use anyhow::{anyhow, Result};
use tokio::runtime::Runtime;

use chess_telegraph::transcoder::{run_actuator, ActuatorConfig, ConsolePin, SysfsPin};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PinBackend {
    Sysfs,
    Console,
}

fn parse_actuator_args(
    args: &[String],
    mut config: ActuatorConfig,
) -> Result<(ActuatorConfig, PinBackend)> {
    let mut backend = PinBackend::Sysfs;
    let mut i = 0usize;
    while i < args.len() {
        match args[i].as_str() {
            "--bind" => {
                i += 1;
                let v = args
                    .get(i)
                    .ok_or_else(|| anyhow!("missing value for --bind"))?;
                config.host = v.clone();
            }
            "--port" => {
                i += 1;
                let v = args
                    .get(i)
                    .ok_or_else(|| anyhow!("missing value for --port"))?;
                config.port = v
                    .parse::<u16>()
                    .map_err(|_| anyhow!("invalid --port value: {}", v))?;
            }
            "--pin" => {
                i += 1;
                let v = args
                    .get(i)
                    .ok_or_else(|| anyhow!("missing value for --pin"))?;
                config.pin = v
                    .parse::<u8>()
                    .map_err(|_| anyhow!("invalid --pin value: {}", v))?;
            }
            "--console" => backend = PinBackend::Console,
            other => {
                return Err(anyhow!("unknown argument: {}", other));
            }
        }
        i += 1;
    }
    Ok((config, backend))
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (config, backend) = parse_actuator_args(&args, ActuatorConfig::from_env())?;

    let runtime = Runtime::new()?;
    let result = match backend {
        PinBackend::Console => {
            println!("[Actuator] console pin backend (dry run)");
            runtime.block_on(run_actuator(config, ConsolePin::new(), None))
        }
        PinBackend::Sysfs => {
            let pin = SysfsPin::open(config.pin)
                .map_err(|e| anyhow!("failed to open gpio{}: {}", config.pin, e))?;
            runtime.block_on(run_actuator(config, pin, None))
        }
    };

    // A dropped session is the normal end of this process, not a failure.
    match result {
        Ok(()) => println!("[Actuator] session closed"),
        Err(err) => eprintln!("[Actuator] session ended: {:#}", err),
    }
    Ok(())
}
