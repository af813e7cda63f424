use clap::{Parser, ValueEnum};
use diffbot_core::mk_static;
use diffbot_core::utils::controllers::{
    DriveConfig, HBridgeChannel, MotionCommand, MotorActuator, Polarity, Speed, SystemController,
    Tick,
};
use diffbot_core::utils::{setpoint, Duration, DriveSetpoint, PipeRx};
use embassy_executor::Executor;
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, pipe::Pipe};
use serde::Serialize;
use static_cell::StaticCell;
use std::io::Read as _;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info, warn};

mod sim;

use sim::{ChannelPins, ChannelProbe, StdoutTx};

/// Size of the simulated UART receive buffer.
const RX_BUFFER: usize = 64;

type SerialPipe = Pipe<CriticalSectionRawMutex, RX_BUFFER>;

/// Set once stdin is exhausted.
static STDIN_EOF: AtomicBool = AtomicBool::new(false);

#[derive(Parser)]
#[clap(version = "1.0")]
struct Opts
{
    /// Duty applied to every motion command (0-255)
    #[clap(long, default_value_t = 255)]
    speed: u8,
    /// Control tick period in milliseconds
    #[clap(long, default_value_t = 10)]
    tick_ms: u64,
    /// Forward polarity of the left motor
    #[clap(long, value_enum, default_value = "inverted")]
    left_polarity: PolarityArg,
    /// Forward polarity of the right motor
    #[clap(long, value_enum, default_value = "normal")]
    right_polarity: PolarityArg,
    /// Leave the motors untouched until the first command
    #[clap(long)]
    no_stop_on_start: bool,
    /// Print a JSON snapshot of both channels after every applied command
    #[clap(long)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum PolarityArg {
    Normal,
    Inverted,
}

impl From<PolarityArg> for Polarity {
    fn from(arg: PolarityArg) -> Self {
        match arg {
            PolarityArg::Normal => Polarity::Normal,
            PolarityArg::Inverted => Polarity::Inverted,
        }
    }
}

impl Opts {
    fn drive_config(&self) -> DriveConfig {
        DriveConfig {
            left: self.left_polarity.into(),
            right: self.right_polarity.into(),
            ..DriveConfig::new(Some(Speed::new(self.speed)), Some(!self.no_stop_on_start))
        }
    }
}

#[derive(Serialize)]
struct Snapshot {
    tick: u64,
    command: MotionCommand,
    setpoint: DriveSetpoint,
    left: ChannelPins,
    right: ChannelPins,
}

/// Feed stdin into the receive pipe one byte at a time, like a UART RX ISR.
fn spawn_stdin_reader(pipe: &'static SerialPipe) {
    std::thread::spawn(move || {
        let mut stdin = std::io::stdin().lock();
        let mut byte = [0u8; 1];
        loop {
            match stdin.read(&mut byte) {
                Ok(0) => break,
                Ok(_) => {
                    while pipe.try_write(&byte).is_err() {
                        std::thread::sleep(std::time::Duration::from_millis(1));
                    }
                }
                Err(e) => {
                    error!("stdin read failed: {}", e);
                    break;
                }
            }
        }
        STDIN_EOF.store(true, Ordering::Release);
    });
}

fn print_snapshot(
    tick: u64,
    command: MotionCommand,
    speed: Speed,
    left: &ChannelProbe,
    right: &ChannelProbe,
) {
    let snapshot = Snapshot {
        tick,
        command,
        setpoint: setpoint(command, speed),
        left: left.snapshot(),
        right: right.snapshot(),
    };
    match serde_json::to_string(&snapshot) {
        Ok(line) => println!("{}", line),
        Err(e) => warn!("snapshot not serialized: {}", e),
    }
}

#[embassy_executor::task]
async fn main_task(opts: Opts) {
    let config = opts.drive_config();

    let rx_pipe: &'static SerialPipe = mk_static!(SerialPipe, Pipe::new());
    spawn_stdin_reader(rx_pipe);

    let (left_en, left_a, left_b, left_probe) = sim::channel_pins("left");
    let (right_en, right_a, right_b, right_probe) = sim::channel_pins("right");
    let channels = HBridgeChannel::new(left_en, left_a, left_b, config.left).and_then(|left| {
        HBridgeChannel::new(right_en, right_a, right_b, config.right).map(|right| (left, right))
    });
    let (left, right) = match channels {
        Ok(pair) => pair,
        Err(e) => {
            error!("motor pins failed to initialize: {:?}", e);
            std::process::exit(1);
        }
    };

    let mut ctrl = SystemController::new(
        PipeRx::new(rx_pipe),
        StdoutTx::new(),
        MotorActuator::new(left, right),
        &config,
    );
    if let Err(e) = ctrl.start() {
        error!("startup failed: {:?}", e);
    }

    let speed = ctrl.speed();
    let mut tick = 0u64;
    ctrl.run(Duration::from_millis(opts.tick_ms), |outcome| {
        tick += 1;
        match outcome {
            Ok(Tick::Applied(command)) if opts.json => {
                print_snapshot(tick, *command, speed, &left_probe, &right_probe);
            }
            Ok(Tick::Idle) if STDIN_EOF.load(Ordering::Acquire) && rx_pipe.is_empty() => {
                return ControlFlow::Break(());
            }
            _ => {}
        }
        ControlFlow::Continue(())
    })
    .await;

    info!("stdin closed after {} ticks, shutting down", tick);
    std::process::exit(0);
}

static EXECUTOR: StaticCell<Executor> = StaticCell::new();

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let opts: Opts = Opts::parse();
    info!(
        speed = opts.speed,
        tick_ms = opts.tick_ms,
        "Simulated differential-drive MCU, reading commands from stdin"
    );

    let executor = EXECUTOR.init(Executor::new());
    executor.run(|spawner| {
        if let Err(e) = spawner.spawn(main_task(opts)) {
            error!("failed to spawn main task: {:?}", e);
        }
    });
}
