// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// System-bus plumbing: the `com.redhat.NewPrinterNotification` object and
// the subscription to the spooler's state-changed broadcasts.
//
// Bus callbacks never touch service state.  They decode their arguments and
// post a `ServiceEvent`, so RPC callers return immediately.

use futures::StreamExt;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use zbus::{Connection, MatchRule, MessageStream, fdo, message};

use spoolnotify_core::config::{
    SERVICE_NAME, SERVICE_PATH, SPOOLER_SIGNAL_INTERFACE, SPOOLER_SIGNAL_PATH,
};
use spoolnotify_core::error::{NotifyError, Result};
use spoolnotify_core::types::{DriverStatus, PrinterEvent};

use super::event::ServiceEvent;
use super::job_wait::SpoolerSignals;

pub fn bus_error(e: zbus::Error) -> NotifyError {
    NotifyError::Bus(e.to_string())
}

/// The exported RPC object.
pub struct NewPrinterNotification {
    events: UnboundedSender<ServiceEvent>,
}

impl NewPrinterNotification {
    pub fn new(events: UnboundedSender<ServiceEvent>) -> Self {
        Self { events }
    }

    fn forward(&self, event: ServiceEvent) -> fdo::Result<()> {
        self.events
            .send(event)
            .map_err(|_| fdo::Error::Failed("service is shutting down".into()))
    }
}

#[zbus::interface(name = "com.redhat.NewPrinterNotification")]
impl NewPrinterNotification {
    fn get_ready(&self) -> fdo::Result<()> {
        debug!("GetReady");
        self.forward(ServiceEvent::GetReady)
    }

    fn new_printer(
        &self,
        status: i32,
        name: String,
        mfg: String,
        mdl: String,
        des: String,
        cmd: String,
    ) -> fdo::Result<()> {
        let event = decode_new_printer(status, name, mfg, mdl, des, cmd);
        debug!(printer = %event.name, status = ?event.status, "NewPrinter");
        self.forward(ServiceEvent::NewPrinter(event))
    }
}

fn decode_new_printer(
    status: i32,
    name: String,
    manufacturer: String,
    model: String,
    description: String,
    command: String,
) -> PrinterEvent {
    let decoded = DriverStatus::from_wire(status);
    if DriverStatus::try_from(status).is_err() {
        warn!(status, printer = %name, treated_as = ?decoded, "NewPrinter with unknown status");
    }
    PrinterEvent {
        status: decoded,
        name,
        manufacturer,
        model,
        description,
        command,
    }
}

/// Export the RPC object and claim its well-known name.
pub async fn export_service(
    connection: &Connection,
    events: UnboundedSender<ServiceEvent>,
) -> Result<()> {
    connection
        .object_server()
        .at(SERVICE_PATH, NewPrinterNotification::new(events))
        .await
        .map_err(bus_error)?;
    connection
        .request_name(SERVICE_NAME)
        .await
        .map_err(bus_error)?;
    info!(name = SERVICE_NAME, path = SERVICE_PATH, "RPC service exported");
    Ok(())
}

/// Spooler broadcasts received over the system bus.
pub struct BusSpoolerSignals {
    connection: Connection,
}

impl BusSpoolerSignals {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }
}

/// Forwarding task for one subscription. Aborted, and the match rule
/// removed, on drop.
pub struct SignalSubscription {
    task: JoinHandle<()>,
}

impl Drop for SignalSubscription {
    fn drop(&mut self) {
        self.task.abort();
        debug!("spooler signal subscription removed");
    }
}

impl SpoolerSignals for BusSpoolerSignals {
    type Subscription = SignalSubscription;

    async fn subscribe(&self, events: UnboundedSender<ServiceEvent>) -> Result<SignalSubscription> {
        let rule = MatchRule::builder()
            .msg_type(message::Type::Signal)
            .path(SPOOLER_SIGNAL_PATH)
            .map_err(bus_error)?
            .interface(SPOOLER_SIGNAL_INTERFACE)
            .map_err(bus_error)?
            .build();
        let mut stream = MessageStream::for_match_rule(rule, &self.connection, None)
            .await
            .map_err(bus_error)?;

        let task = tokio::spawn(async move {
            while let Some(message) = stream.next().await {
                match message {
                    Ok(message) => {
                        // The payload is irrelevant; any broadcast means "look again".
                        let header = message.header();
                        debug!(member = ?header.member(), "spooler state changed");
                        if events.send(ServiceEvent::SpoolerChanged).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!(error = %e, "bad message on spooler signal stream"),
                }
            }
        });

        debug!(
            path = SPOOLER_SIGNAL_PATH,
            interface = SPOOLER_SIGNAL_INTERFACE,
            "subscribed to spooler signals"
        );
        Ok(SignalSubscription { task })
    }
}
