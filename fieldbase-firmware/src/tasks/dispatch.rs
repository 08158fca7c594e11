//! Dispatch task
//!
//! Runs the station start-up sequence, then drives the dispatcher forever,
//! logging what every step did.

use defmt::*;
use embassy_time::{Duration, Timer};
use fieldbase_core::datalog::LogWrite;
use fieldbase_core::{MessageKind, StartupReport, StepOutcome};
use fieldbase_hal::DateTime;

use crate::board::StationDispatcher;

/// Idle time between polls of the radio (ms)
const POLL_INTERVAL_MS: u64 = 5;

#[embassy_executor::task]
pub async fn dispatch_task(mut dispatcher: StationDispatcher, build_time: DateTime) {
    info!("Dispatch task started");

    let report = dispatcher.start(build_time);
    log_startup(&report);

    info!(
        "Listening on {} kHz as node {}",
        dispatcher.config().radio.frequency_khz,
        dispatcher.config().address
    );

    loop {
        match dispatcher.step().await {
            Some(outcome) => log_outcome(&outcome),
            None => Timer::after(Duration::from_millis(POLL_INTERVAL_MS)).await,
        }
    }
}

fn log_startup(report: &StartupReport) {
    match report.storage {
        Ok(()) => info!("Storage ready"),
        Err(e) => warn!("Storage failed to start ({}), logging disabled", e),
    }
    match report.clock_adjusted {
        Ok(true) => info!("RTC set to build time"),
        Ok(false) => {}
        Err(e) => warn!("RTC not available ({})", e),
    }
    match &report.start_time {
        Ok(time) => info!("Start time: {}", time.as_str()),
        Err(e) => warn!("Start time unknown ({})", e),
    }
}

fn log_outcome(outcome: &StepOutcome) {
    info!("{}", outcome.summary.as_str());
    match &outcome.time {
        Ok(time) => debug!("at {}", time.as_str()),
        Err(e) => warn!("clock read failed ({})", e),
    }

    if let Some(record) = &outcome.record {
        info!("{}", record.as_str());
    }
    if let Some(link) = &outcome.link {
        debug!(
            "RSSI {} dBm, SNR {} dB, good/bad packets: {}/{}",
            link.rssi_dbm, link.snr_db, link.rx_good, link.rx_bad
        );
    }
    if let Some(eui) = outcome.join_eui {
        info!("Join request from 0x{:016x}", eui);
    }
    if let Some(e) = outcome.malformed {
        warn!("Malformed {}: {}", outcome.kind.as_str(), e);
    }
    if outcome.kind == MessageKind::Unknown || outcome.malformed.is_some() {
        info!("raw: {=[u8]:02x}", outcome.raw.as_slice());
    }

    match outcome.storage {
        Some(Ok(LogWrite::Written)) | None => {}
        Some(Ok(LogWrite::Skipped)) => debug!("storage unhealthy, not logged"),
        Some(Err(e)) => warn!("log write failed ({})", e),
    }
    if let Some(Err(e)) = outcome.display {
        warn!("display update failed ({})", e);
    }

    if let Some(reply) = &outcome.reply {
        if reply.delivery.acked {
            info!("to 0x{:02x}: {}", reply.to, reply.summary.as_str());
        } else {
            warn!("to 0x{:02x}: {}", reply.to, reply.summary.as_str());
        }
    }
}
