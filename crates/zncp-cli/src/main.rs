//! Coprocessor monitor: prints firmware and network parameters, keeps the
//! device watchdog fed, polls the device state and logs every unsolicited
//! notification until interrupted.

use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tracing::level_filters::LevelFilter;
use tracing::{debug, error, info, warn};
use zncp_link::{Link, LinkCallbacks, LinkConfig, LinkError};
use zncp_protocol::{
    command_name, Notification, ReceiveFlags, SecurityMode, ZdoDescriptor,
    APP_ZDP_HANDLE_NODE_DESCRIPTOR, PARAM_APP_ZDP_HANDLING, PARAM_CURRENT_CHANNEL,
    PARAM_MAC_ADDRESS, PARAM_NETWORK_KEY, PARAM_NWK_ADDRESS, PARAM_NWK_PANID,
    PARAM_OPEN_NETWORK, PARAM_PROTOCOL_VERSION, PARAM_SECURITY_MODE, PARAM_WATCHDOG_TTL,
    PARAM_ZDO_SLOT,
};

#[derive(Copy, Clone, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "zncp", version, about = "ZigBee coprocessor monitor")]
struct Cli {
    /// Serial device of the coprocessor.
    #[arg(value_name = "PORT", default_value = "/dev/ttyACM0")]
    port: String,

    /// Handler threads; caps how many commands are in flight at once.
    #[arg(long, value_name = "COUNT", default_value_t = 1)]
    handlers: usize,

    /// Seconds between device state polls.
    #[arg(long, value_name = "SECONDS", default_value_t = 5)]
    poll_interval: u64,

    /// Device watchdog TTL in seconds, refreshed at half this interval.
    #[arg(long, value_name = "SECONDS", default_value_t = 600)]
    watchdog_ttl: u32,

    /// Open the network for joining for this many seconds after startup.
    #[arg(long, value_name = "SECONDS")]
    permit_join: Option<u8>,

    /// Register the default ZDO endpoint descriptors and let the firmware
    /// answer node descriptor requests itself.
    #[arg(long)]
    register_endpoints: bool,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    log_level: LogLevel,
}

fn init_logging(level: LogLevel) {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level.as_filter())
        .with_ansi(false)
        .with_target(false)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        if let Err(err) = ctrlc::set_handler(move || running.store(false, Ordering::SeqCst)) {
            error!("signal handler setup failed: {err}");
            process::exit(1);
        }
    }

    if let Err(err) = run(&cli, running) {
        error!("{err}");
        process::exit(1);
    }
}

fn run(cli: &Cli, running: Arc<AtomicBool>) -> Result<(), LinkError> {
    let callbacks = LinkCallbacks::default()
        .on_unsolicited(print_notification)
        .on_disconnect({
            let running = Arc::clone(&running);
            move || {
                warn!("device disconnected");
                running.store(false, Ordering::SeqCst);
            }
        });
    let config = LinkConfig {
        handler_count: cli.handlers,
        ..LinkConfig::default()
    };
    let link = Arc::new(Link::open_with(&cli.port, config, callbacks)?);

    info!("firmware {}", link.read_firmware_version()?);
    print_network_parameters(&link)?;

    spawn_watchdog(Arc::clone(&link), Arc::clone(&running), cli.watchdog_ttl);

    if cli.register_endpoints {
        register_endpoints(&link)?;
    }
    if let Some(seconds) = cli.permit_join {
        link.write_parameter(PARAM_OPEN_NETWORK, &seconds)?;
        info!("network open for joining for {seconds}s");
    }

    while running.load(Ordering::SeqCst) {
        poll_device(&link);
        sleep_while(&running, Duration::from_secs(cli.poll_interval));
    }

    link.close();
    Ok(())
}

fn print_network_parameters(link: &Link) -> Result<(), LinkError> {
    let mac: u64 = link.read_parameter(PARAM_MAC_ADDRESS)?;
    let nwk_address: u16 = link.read_parameter(PARAM_NWK_ADDRESS)?;
    let pan_id: u16 = link.read_parameter(PARAM_NWK_PANID)?;
    let channel: u8 = link.read_parameter(PARAM_CURRENT_CHANNEL)?;
    let protocol_version: u16 = link.read_parameter(PARAM_PROTOCOL_VERSION)?;
    info!(
        "MAC {mac:016X}, NWK {nwk_address:04X}, PAN {pan_id:04X}, \
         channel {channel}, protocol version {protocol_version:04X}"
    );

    let security = SecurityMode::from(link.read_parameter::<u8>(PARAM_SECURITY_MODE)?);
    info!("security mode {security:?}");
    let network_key: [u8; 16] = link.read_parameter(PARAM_NETWORK_KEY)?;
    debug!("network key {network_key:02X?}");
    Ok(())
}

fn register_endpoints(link: &Link) -> Result<(), LinkError> {
    link.write_parameter_with(PARAM_ZDO_SLOT, &[0], &ZdoDescriptor::default_slot0())?;
    link.write_parameter_with(PARAM_ZDO_SLOT, &[1], &ZdoDescriptor::default_slot1())?;
    link.write_parameter(PARAM_APP_ZDP_HANDLING, &APP_ZDP_HANDLE_NODE_DESCRIPTOR)?;

    let registered: ZdoDescriptor = link.read_parameter_with(PARAM_ZDO_SLOT, &[0])?;
    info!("registered {registered}");
    Ok(())
}

fn poll_device(link: &Link) {
    let state = match link.device_state() {
        Ok(state) => state,
        Err(err) => {
            warn!("device state poll failed: {err}");
            return;
        }
    };
    info!("device state: {state:?}");

    if state.data_indication {
        match link.read_received_data(ReceiveFlags::SHORT_SOURCE) {
            Ok(data) => info!("indication: {data:?}"),
            Err(err) => warn!("read received data failed: {err}"),
        }
    }
    if state.data_confirm {
        match link.query_send_data() {
            Ok(confirm) => info!("confirm: {confirm:?}"),
            Err(err) => warn!("query send data failed: {err}"),
        }
    }
}

fn print_notification(notification: Notification) {
    match notification {
        Notification::DeviceStateChanged(state) => info!("state change: {state:?}"),
        Notification::MacPoll(poll) => info!("poll: {poll:?}"),
        Notification::MacBeacon(beacon) => info!("beacon: {beacon:?}"),
        Notification::GreenPower(gp) => info!("green power: {gp:?}"),
        Notification::Other {
            command_id,
            payload,
        } => info!("{}: {payload:02X?}", command_name(command_id)),
    }
}

fn spawn_watchdog(link: Arc<Link>, running: Arc<AtomicBool>, ttl: u32) {
    thread::Builder::new()
        .name("zncp-watchdog".into())
        .spawn(move || {
            let refresh = Duration::from_secs(u64::from(ttl.max(2)) / 2);
            while running.load(Ordering::SeqCst) {
                match link.write_parameter(PARAM_WATCHDOG_TTL, &ttl) {
                    Ok(()) => debug!("watchdog refreshed, ttl {ttl}s"),
                    Err(LinkError::Closed) => return,
                    Err(err) => warn!("watchdog refresh failed: {err}"),
                }
                sleep_while(&running, refresh);
            }
        })
        .expect("Failed to spawn watchdog thread");
}

/// Sleep in short slices so ctrl-c and disconnects are noticed promptly.
fn sleep_while(running: &AtomicBool, total: Duration) {
    let step = Duration::from_millis(200);
    let mut remaining = total;
    while running.load(Ordering::SeqCst) && !remaining.is_zero() {
        let slice = remaining.min(step);
        thread::sleep(slice);
        remaining -= slice;
    }
}
