// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Spoolnotify Print — spooler queries over IPP, driver description
// downloads, and missing-driver detection.  This crate bridges between the
// core domain types defined in `spoolnotify-core` and the local print spooler.

pub mod drivers;
pub mod ppd;
pub mod spooler;

pub use drivers::{DriverResolver, PpdDriverResolver};
pub use ppd::{DownloadedPpd, PpdDescription};
pub use spooler::{CupsSpooler, Spooler};
