// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory stand-ins for the service's collaborators.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc::UnboundedSender;

use spoolnotify_bridge::{Viewer, ViewerFactory};
use spoolnotify_core::error::{NotifyError, Result};
use spoolnotify_core::types::{
    JobSummary, MissingSoftware, PrinterInfo, PrinterNotification, ViewerFlags,
};
use spoolnotify_print::{DownloadedPpd, DriverResolver, Spooler};

use super::event::ServiceEvent;
use super::job_wait::SpoolerSignals;

/// Let spawned timer tasks run after the clock moved.
pub async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

const PPD: &[u8] = b"*PPD-Adobe: \"4.3\"\n*Manufacturer: \"HP\"\n";

#[derive(Clone, Default)]
pub struct FakeSpooler {
    printers: Vec<PrinterInfo>,
    jobs: Arc<AtomicUsize>,
    ppd_missing: bool,
    last_ppd: Arc<Mutex<Option<PathBuf>>>,
}

impl FakeSpooler {
    pub fn with_jobs(jobs: usize) -> Self {
        let spooler = Self::default();
        spooler.set_jobs(jobs);
        spooler
    }

    pub fn with_printer(mut self, name: &str, make_and_model: &str) -> Self {
        self.printers.push(PrinterInfo {
            name: name.into(),
            make_and_model: make_and_model.into(),
        });
        self
    }

    pub fn without_ppd(mut self) -> Self {
        self.ppd_missing = true;
        self
    }

    pub fn set_jobs(&self, jobs: usize) {
        self.jobs.store(jobs, Ordering::SeqCst);
    }

    /// Path of the most recently downloaded driver description.
    pub fn last_ppd(&self) -> Option<PathBuf> {
        self.last_ppd.lock().unwrap().clone()
    }
}

impl Spooler for FakeSpooler {
    async fn printers(&self) -> Result<Vec<PrinterInfo>> {
        Ok(self.printers.clone())
    }

    async fn fetch_ppd(&self, name: &str) -> Result<DownloadedPpd> {
        if self.ppd_missing {
            return Err(NotifyError::DriverUnavailable {
                printer: name.into(),
                detail: "HTTP 404".into(),
            });
        }
        let ppd = DownloadedPpd::from_bytes(name, PPD)?;
        *self.last_ppd.lock().unwrap() = Some(ppd.path().to_path_buf());
        Ok(ppd)
    }

    async fn own_jobs(&self) -> Result<Vec<JobSummary>> {
        let count = self.jobs.load(Ordering::SeqCst);
        Ok((1..=count)
            .map(|id| JobSummary {
                job_id: id as i32,
                job_name: format!("job-{id}"),
            })
            .collect())
    }
}

#[derive(Default)]
pub struct FakeResolver {
    pub missing: MissingSoftware,
}

impl FakeResolver {
    pub fn missing_packages(packages: &[&str]) -> Self {
        Self {
            missing: MissingSoftware {
                packages: packages.iter().map(|p| p.to_string()).collect(),
                executables: vec![],
            },
        }
    }
}

impl DriverResolver for FakeResolver {
    fn missing_software(&self, ppd: &Path) -> Result<MissingSoftware> {
        assert!(ppd.exists(), "driver description must exist while resolving");
        Ok(self.missing.clone())
    }
}

#[derive(Clone, Default)]
pub struct FakeSignals {
    subscribes: Arc<AtomicUsize>,
    active: Arc<AtomicUsize>,
    fail: bool,
}

impl FakeSignals {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn subscribe_count(&self) -> usize {
        self.subscribes.load(Ordering::SeqCst)
    }

    pub fn active_count(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

pub struct FakeSubscription(Arc<AtomicUsize>);

impl Drop for FakeSubscription {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl SpoolerSignals for FakeSignals {
    type Subscription = FakeSubscription;

    async fn subscribe(&self, _events: UnboundedSender<ServiceEvent>) -> Result<FakeSubscription> {
        if self.fail {
            return Err(NotifyError::Bus("match rule rejected".into()));
        }
        self.subscribes.fetch_add(1, Ordering::SeqCst);
        self.active.fetch_add(1, Ordering::SeqCst);
        Ok(FakeSubscription(Arc::clone(&self.active)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerCall {
    Notified(String, PrinterNotification),
    SearchingOn,
    SearchingOff,
    Disposed,
}

pub struct RecordingViewer {
    log: Arc<Mutex<Vec<ViewerCall>>>,
}

impl Viewer for RecordingViewer {
    async fn notify_new_printer(&mut self, printer: &str, notification: PrinterNotification) {
        self.log
            .lock()
            .unwrap()
            .push(ViewerCall::Notified(printer.into(), notification));
    }

    async fn set_searching_indicator(&mut self) {
        self.log.lock().unwrap().push(ViewerCall::SearchingOn);
    }

    async fn unset_searching_indicator(&mut self) {
        self.log.lock().unwrap().push(ViewerCall::SearchingOff);
    }

    async fn dispose(&mut self) {
        self.log.lock().unwrap().push(ViewerCall::Disposed);
    }
}

#[derive(Clone, Default)]
pub struct RecordingFactory {
    created: Arc<Mutex<Vec<ViewerFlags>>>,
    log: Arc<Mutex<Vec<ViewerCall>>>,
}

impl RecordingFactory {
    /// Flags of every viewer created so far.
    pub fn created(&self) -> Vec<ViewerFlags> {
        self.created.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<ViewerCall> {
        self.log.lock().unwrap().clone()
    }

    pub fn notifications(&self) -> Vec<PrinterNotification> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ViewerCall::Notified(_, n) => Some(n),
                _ => None,
            })
            .collect()
    }

    /// Whether the searching indicator is currently shown.
    pub fn searching(&self) -> bool {
        self.calls().iter().fold(false, |on, call| match call {
            ViewerCall::SearchingOn => true,
            ViewerCall::SearchingOff | ViewerCall::Disposed => false,
            _ => on,
        })
    }
}

impl ViewerFactory for RecordingFactory {
    type Viewer = RecordingViewer;

    async fn create(&mut self, flags: ViewerFlags) -> RecordingViewer {
        self.created.lock().unwrap().push(flags);
        RecordingViewer {
            log: Arc::clone(&self.log),
        }
    }
}
