// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Driver descriptions (PPD files).
//
// The spooler serves each queue's PPD at `/printers/<name>.ppd`.  We fetch it
// over HTTP into a temporary file that is removed when the
// `DownloadedPpd` is dropped, then scan it for the keywords that name the
// programs the driver runs.

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use reqwest::{Client, Url};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use spoolnotify_core::error::{NotifyError, Result};

/// Upper bound on a whole request to the spooler.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// A driver description downloaded to a temporary file.
///
/// The file is deleted when this value is dropped, on every path.
#[derive(Debug)]
pub struct DownloadedPpd {
    printer: String,
    file: NamedTempFile,
}

impl DownloadedPpd {
    /// Wrap already-fetched PPD text in a temporary file.
    pub fn from_bytes(printer: &str, contents: &[u8]) -> Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("spoolnotify-")
            .suffix(".ppd")
            .tempfile()?;
        file.write_all(contents)?;
        file.flush()?;
        Ok(Self {
            printer: printer.to_string(),
            file,
        })
    }

    pub fn printer(&self) -> &str {
        &self.printer
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// HTTP client used for driver description downloads.
pub fn http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| NotifyError::Spooler(format!("failed to create HTTP client: {e}")))
}

/// Fetch the PPD for queue `printer` from the spooler at `host:port`.
pub async fn download(
    client: &Client,
    host: &str,
    port: u16,
    printer: &str,
) -> Result<DownloadedPpd> {
    let unavailable = |detail: String| NotifyError::DriverUnavailable {
        printer: printer.to_string(),
        detail,
    };

    let url = ppd_url(host, port, printer).map_err(unavailable)?;
    let response = client
        .get(url)
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .map_err(|e| unavailable(e.to_string()))?;
    let body = response
        .bytes()
        .await
        .map_err(|e| unavailable(e.to_string()))?;

    debug!(printer, bytes = body.len(), "driver description fetched");
    DownloadedPpd::from_bytes(printer, &body)
}

/// `http://host:port/printers/<name>.ppd`, with the queue name encoded as a
/// single path segment.
fn ppd_url(host: &str, port: u16, printer: &str) -> std::result::Result<Url, String> {
    let file = format!("{printer}.ppd");
    let mut url = Url::parse(&format!("http://{host}:{port}/"))
        .map_err(|e| format!("invalid spooler address '{host}:{port}': {e}"))?;
    url.path_segments_mut()
        .map_err(|_| format!("spooler address '{host}:{port}' cannot carry a path"))?
        .clear()
        .extend(["printers", file.as_str()]);
    Ok(url)
}

// ---------------------------------------------------------------------------
// PPD scanning
// ---------------------------------------------------------------------------

/// The parts of a PPD that matter for missing-driver detection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PpdDescription {
    pub manufacturer: Option<String>,
    pub nickname: Option<String>,
    /// Filter programs named by `*cupsFilter`, `*cupsFilter2` and
    /// `*cupsPreFilter`, in file order.
    pub filters: Vec<String>,
    /// `*FoomaticRIPCommandLine`, with continuation lines joined.
    pub foomatic_command: Option<String>,
}

impl PpdDescription {
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(Self::parse(&String::from_utf8_lossy(&bytes)))
    }

    /// Scan PPD text. Unknown keywords are ignored.
    pub fn parse(text: &str) -> Self {
        let mut description = Self::default();
        let mut lines = text.lines();

        while let Some(line) = lines.next() {
            let Some((keyword, value)) = split_main_keyword(line) else {
                continue;
            };

            // Quoted values may span several lines.
            let mut value = value.to_string();
            if value.starts_with('"') && (value.len() == 1 || !value.ends_with('"')) {
                for next in lines.by_ref() {
                    value.push('\n');
                    value.push_str(next);
                    if next.trim_end().ends_with('"') {
                        break;
                    }
                }
            }
            let value = unquote(&value);

            match keyword {
                "Manufacturer" => description.manufacturer = Some(value),
                "NickName" => description.nickname = Some(value),
                "cupsFilter" | "cupsFilter2" | "cupsPreFilter" => {
                    match value.split_whitespace().last() {
                        Some(program) if program != "-" => {
                            description.filters.push(program.to_string())
                        }
                        Some(_) => {}
                        None => warn!(keyword, "empty filter entry in PPD"),
                    }
                }
                "FoomaticRIPCommandLine" => {
                    let joined = value.replace("&&\n", " ").replace('\n', " ");
                    description.foomatic_command = Some(joined);
                }
                _ => {}
            }
        }

        description
    }
}

/// Split `*Keyword Option: value` into `("Keyword", "value")`.
fn split_main_keyword(line: &str) -> Option<(&str, &str)> {
    let rest = line.strip_prefix('*')?;
    if rest.starts_with('%') {
        return None;
    }
    let (head, value) = rest.split_once(':')?;
    let keyword = head.split_whitespace().next()?;
    Some((keyword, value.trim()))
}

fn unquote(value: &str) -> String {
    let value = value.trim();
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"*PPD-Adobe: "4.3"
*% comment line
*Manufacturer: "HP"
*NickName: "HP LaserJet 1020 Foomatic/foo2zjs-z1 (recommended)"
*cupsFilter: "application/vnd.cups-postscript 100 foomatic-rip"
*cupsFilter2: "application/vnd.cups-raster application/vnd.cups-raster 0 -"
*cupsFilter2: "application/pdf application/vnd.cups-pdf 0 pdftopdf"
*FoomaticRIPCommandLine: "foo2zjs-wrapper %Z -z1 -P -L0 | gs -q -sDEVICE=pbmraw&&
-r600x600 -"
*End
"#;

    #[test]
    fn parses_keywords_of_interest() {
        let ppd = PpdDescription::parse(SAMPLE);
        assert_eq!(ppd.manufacturer.as_deref(), Some("HP"));
        assert_eq!(ppd.filters, vec!["foomatic-rip", "pdftopdf"]);
        let cmd = ppd.foomatic_command.unwrap();
        assert!(cmd.starts_with("foo2zjs-wrapper"));
        assert!(cmd.contains("-r600x600"));
    }

    #[test]
    fn comments_are_not_keywords() {
        assert!(split_main_keyword("*% cupsFilter: \"a b 0 foo\"").is_none());
        assert!(split_main_keyword("not a keyword").is_none());
    }

    #[test]
    fn url_encodes_queue_name_as_one_segment() {
        assert_eq!(
            ppd_url("localhost", 631, "Office_Laser").unwrap().as_str(),
            "http://localhost:631/printers/Office_Laser.ppd"
        );
        assert_eq!(
            ppd_url("localhost", 631, "a b/c").unwrap().path(),
            "/printers/a%20b%2Fc.ppd"
        );
        assert!(ppd_url("bad host", 631, "lp0").is_err());
    }

    #[test]
    fn downloaded_file_is_removed_on_drop() {
        let ppd = DownloadedPpd::from_bytes("lp0", SAMPLE.as_bytes()).unwrap();
        let path = ppd.path().to_path_buf();
        assert!(path.exists());
        assert_eq!(ppd.printer(), "lp0");

        let parsed = PpdDescription::from_path(&path).unwrap();
        assert_eq!(parsed.nickname.as_deref(), Some("HP LaserJet 1020 Foomatic/foo2zjs-z1 (recommended)"));

        drop(ppd);
        assert!(!path.exists());
    }

    /// Serve one canned HTTP response on a local port; resolves to the
    /// request that was received.
    async fn serve_once(response: Vec<u8>) -> (u16, tokio::task::JoinHandle<String>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            socket.write_all(&response).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });
        (port, server)
    }

    fn client() -> Client {
        http_client(Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn chunked_body_is_stored_without_framing() {
        let ppd = "*PPD-Adobe: \"4.3\"\n*Manufacturer: \"HP\"\n";
        let response = format!(
            "HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n{:x}\r\n{ppd}\r\n0\r\n\r\n",
            ppd.len()
        );
        let (port, server) = serve_once(response.into_bytes()).await;

        let downloaded = download(&client(), "127.0.0.1", port, "Office Laser").await.unwrap();
        assert_eq!(std::fs::read_to_string(downloaded.path()).unwrap(), ppd);
        assert_eq!(downloaded.printer(), "Office Laser");

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /printers/Office%20Laser.ppd "), "{request}");
    }

    #[tokio::test]
    async fn http_error_status_is_driver_unavailable() {
        let response = b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";
        let (port, _server) = serve_once(response.to_vec()).await;

        let result = download(&client(), "127.0.0.1", port, "lp0").await;
        assert!(matches!(
            result,
            Err(NotifyError::DriverUnavailable { printer, detail })
                if printer == "lp0" && detail.contains("404")
        ));
    }

    #[tokio::test]
    async fn unreachable_spooler_is_driver_unavailable() {
        // Port 9 (discard) on localhost is normally closed.
        let result = download(&client(), "127.0.0.1", 9, "lp0").await;
        assert!(matches!(
            result,
            Err(NotifyError::DriverUnavailable { printer, .. }) if printer == "lp0"
        ));
    }
}
