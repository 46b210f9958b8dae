// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Async client for the local print spooler.
//
// Uses the `ipp` crate's async API for the queries the notification service
// needs:
//   - CUPS-Get-Printers  (list queues with their make-and-model)
//   - Get-Jobs           (with `my-jobs`, for the startup gate)
// and a plain HTTP GET of `/printers/<name>.ppd` for the driver description.
// Both clients are bounded by the same request timeout.

use std::time::Duration;

use ipp::operation::IppOperation;
use ipp::prelude::*;
use tracing::{debug, error, instrument};

use spoolnotify_core::AppConfig;
use spoolnotify_core::error::{NotifyError, Result};
use spoolnotify_core::types::{JobSummary, PrinterInfo};

use crate::ppd::{self, DownloadedPpd, FETCH_TIMEOUT};

/// The spooler operations the notification service depends on.
///
/// Every call may fail; callers treat failures as "not available right now".
#[allow(async_fn_in_trait)]
pub trait Spooler {
    /// All queues currently known to the spooler.
    async fn printers(&self) -> Result<Vec<PrinterInfo>>;

    /// Download the driver description of queue `name` to a temporary file.
    async fn fetch_ppd(&self, name: &str) -> Result<DownloadedPpd>;

    /// Not-yet-completed jobs owned by the requesting user.
    async fn own_jobs(&self) -> Result<Vec<JobSummary>>;

    /// Look up a single queue by name.
    async fn printer(&self, name: &str) -> Result<PrinterInfo> {
        self.printers()
            .await?
            .into_iter()
            .find(|p| p.name == name)
            .ok_or_else(|| NotifyError::PrinterNotFound(name.to_string()))
    }

    /// Whether the requesting user has at least one queued job.
    ///
    /// A failing query counts as "no jobs".
    async fn has_own_jobs(&self) -> bool {
        match self.own_jobs().await {
            Ok(jobs) => !jobs.is_empty(),
            Err(e) => {
                debug!(error = %e, "job query failed, assuming no jobs");
                false
            }
        }
    }
}

/// Spooler client speaking IPP to a CUPS server.
pub struct CupsSpooler {
    host: String,
    port: u16,
    user: String,
    /// Server root URI, e.g. `ipp://localhost:631/`.
    uri: Uri,
    ipp: AsyncIppClient,
    http: reqwest::Client,
}

impl CupsSpooler {
    /// Create a client for the spooler at `host:port`, querying jobs as `user`.
    pub fn new(host: &str, port: u16, user: &str) -> Result<Self> {
        Self::with_timeout(host, port, user, FETCH_TIMEOUT)
    }

    /// Like [`CupsSpooler::new`], with an explicit per-request timeout.
    pub fn with_timeout(host: &str, port: u16, user: &str, timeout: Duration) -> Result<Self> {
        let raw = format!("ipp://{host}:{port}/");
        let uri: Uri = raw
            .parse()
            .map_err(|e| NotifyError::Spooler(format!("invalid URI '{raw}': {e}")))?;
        let ipp = AsyncIppClient::builder(uri.clone())
            .request_timeout(timeout)
            .build();
        Ok(Self {
            host: host.to_string(),
            port,
            user: user.to_string(),
            uri,
            ipp,
            http: ppd::http_client(timeout)?,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            &config.spooler_host,
            config.spooler_port,
            &config.effective_user(),
        )
    }

    /// Return the server URI this client is targeting.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }
}

impl Spooler for CupsSpooler {
    #[instrument(skip(self), fields(uri = %self.uri))]
    async fn printers(&self) -> Result<Vec<PrinterInfo>> {
        let operation = IppOperationBuilder::cups().get_printers();

        debug!("sending CUPS-Get-Printers");
        let response = self
            .ipp
            .send(operation)
            .await
            .map_err(|e| NotifyError::Spooler(format!("CUPS-Get-Printers: {e}")))?;

        if !response.header().status_code().is_success() {
            let code = response.header().status_code();
            error!(status = ?code, "CUPS-Get-Printers failed");
            return Err(NotifyError::Spooler(format!(
                "CUPS-Get-Printers returned status {code:?}"
            )));
        }

        let printers = parse_printers(response.attributes());
        debug!(count = printers.len(), "received printer list");
        Ok(printers)
    }

    #[instrument(skip(self), fields(host = %self.host))]
    async fn fetch_ppd(&self, name: &str) -> Result<DownloadedPpd> {
        ppd::download(&self.http, &self.host, self.port, name).await
    }

    #[instrument(skip(self), fields(uri = %self.uri, user = %self.user))]
    async fn own_jobs(&self) -> Result<Vec<JobSummary>> {
        let mut request = IppOperationBuilder::get_jobs(self.uri.clone())
            .build()
            .into_ipp_request();
        let operation_attrs = request.attributes_mut();
        operation_attrs.add(
            DelimiterTag::OperationAttributes,
            IppAttribute::new(
                "requesting-user-name",
                IppValue::NameWithoutLanguage(self.user.as_str().into()),
            ),
        );
        operation_attrs.add(
            DelimiterTag::OperationAttributes,
            IppAttribute::new("my-jobs", IppValue::Boolean(true)),
        );

        debug!("sending Get-Jobs");
        let response = self
            .ipp
            .send(request)
            .await
            .map_err(|e| NotifyError::Spooler(format!("Get-Jobs: {e}")))?;

        if !response.header().status_code().is_success() {
            let code = response.header().status_code();
            error!(status = ?code, "Get-Jobs failed");
            return Err(NotifyError::Spooler(format!(
                "Get-Jobs returned status {code:?}"
            )));
        }

        let jobs = parse_jobs(response.attributes());
        debug!(count = jobs.len(), "received job list");
        Ok(jobs)
    }
}

// ---------------------------------------------------------------------------
// Helper functions for parsing IPP responses
// ---------------------------------------------------------------------------

/// Parse a CUPS-Get-Printers response. Each queue is its own Printer
/// Attributes group; groups without a `printer-name` are skipped.
fn parse_printers(attrs: &IppAttributes) -> Vec<PrinterInfo> {
    attrs
        .groups_of(DelimiterTag::PrinterAttributes)
        .filter_map(|group| {
            let attributes = group.attributes();
            let name = attributes
                .get("printer-name")
                .map(|a| format!("{}", a.value()))?;
            let make_and_model = attributes
                .get("printer-make-and-model")
                .map(|a| format!("{}", a.value()))
                .unwrap_or_default();
            Some(PrinterInfo {
                name,
                make_and_model,
            })
        })
        .collect()
}

/// Parse a Get-Jobs response into job summaries.
fn parse_jobs(attrs: &IppAttributes) -> Vec<JobSummary> {
    let mut jobs = Vec::new();

    for group in attrs.groups_of(DelimiterTag::JobAttributes) {
        let attributes = group.attributes();

        let job_id = attributes.get("job-id").and_then(|a| {
            if let IppValue::Integer(id) = a.value() {
                Some(*id)
            } else {
                None
            }
        });

        let job_name = attributes
            .get("job-name")
            .map(|a| format!("{}", a.value()))
            .unwrap_or_default();

        if let Some(job_id) = job_id {
            jobs.push(JobSummary { job_id, job_name });
        }
    }

    jobs
}
