//! Download a reference structure from RCSB PDB.
//!
//! One best-effort GET for an interactively-run preparatory step: no retry,
//! no checksum, no resumption. The file lands in `modal/<id>.cif` next to
//! the design configuration that references it.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::info;

const DEFAULT_PDB_ID: &str = "2bit";
const RCSB_DOWNLOAD_BASE: &str = "https://files.rcsb.org/download";
const OUT_DIR: &str = "modal";

const TIMEOUT: Duration = Duration::from_secs(60);
/// Generous cap for large structures; the body is buffered in memory.
const BODY_LIMIT: u64 = 64 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
enum FetchError {
    #[error("http error: {0}")]
    Http(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Parser)]
#[command(name = "fetch-structure", version, about = "Download a structure from RCSB PDB")]
struct Cli {
    /// PDB ID to download
    #[arg(default_value = DEFAULT_PDB_ID)]
    pdb_id: String,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().init();

    let cli = Cli::parse();
    let agent = ureq::Agent::config_builder()
        .timeout_global(Some(TIMEOUT))
        .build()
        .new_agent();

    match fetch(&agent, RCSB_DOWNLOAD_BASE, &cli.pdb_id, Path::new(OUT_DIR)) {
        Ok(path) => {
            println!("Saved to {}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// GET `<base_url>/<id>.cif` and write the body verbatim to
/// `<out_dir>/<id>.cif`. Any non-success status is fatal and leaves the
/// output file untouched.
fn fetch(
    agent: &ureq::Agent,
    base_url: &str,
    pdb_id: &str,
    out_dir: &Path,
) -> Result<PathBuf, FetchError> {
    let pdb_id = pdb_id.to_lowercase();
    let url = format!("{base_url}/{pdb_id}.cif");

    info!(url = %url, "downloading structure");
    let mut response = agent
        .get(&url)
        .call()
        .map_err(|e| FetchError::Http(format!("GET {url}: {e}")))?;
    let body = response
        .body_mut()
        .with_config()
        .limit(BODY_LIMIT)
        .read_to_vec()
        .map_err(|e| FetchError::Http(format!("read {url}: {e}")))?;

    std::fs::create_dir_all(out_dir)?;
    let out_path = out_dir.join(format!("{pdb_id}.cif"));
    std::fs::write(&out_path, &body)?;
    Ok(out_path)
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    use super::*;

    /// Serve exactly one canned HTTP response on a loopback port, reporting
    /// the request line the client sent.
    fn serve_once(
        status_line: &'static str,
        body: &'static [u8],
    ) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 2048];
                let n = stream.read(&mut buf).unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..n]);
                let first_line = request.lines().next().unwrap_or_default().to_string();
                let _ = tx.send(first_line);

                let header = format!(
                    "HTTP/1.1 {status_line}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
                    body.len()
                );
                let _ = stream.write_all(header.as_bytes());
                let _ = stream.write_all(body);
            }
        });

        (format!("http://{addr}"), rx)
    }

    #[test]
    fn success_writes_byte_identical_file() {
        let (base, requests) = serve_once("200 OK", b"data_2BIT\n#\n");
        let dir = tempfile::tempdir().unwrap();
        let agent = ureq::Agent::new_with_defaults();

        let path = fetch(&agent, &base, "2bit", dir.path()).unwrap();

        assert_eq!(path, dir.path().join("2bit.cif"));
        assert_eq!(std::fs::read(&path).unwrap(), b"data_2BIT\n#\n");
        let request_line = requests.recv().unwrap();
        assert!(request_line.starts_with("GET /2bit.cif "), "{request_line}");
    }

    #[test]
    fn identifier_is_lowercased() {
        let (base, requests) = serve_once("200 OK", b"x");
        let dir = tempfile::tempdir().unwrap();
        let agent = ureq::Agent::new_with_defaults();

        let path = fetch(&agent, &base, "2BIT", dir.path()).unwrap();

        assert_eq!(path, dir.path().join("2bit.cif"));
        let request_line = requests.recv().unwrap();
        assert!(request_line.starts_with("GET /2bit.cif "), "{request_line}");
    }

    #[test]
    fn http_404_is_fatal_and_leaves_no_file() {
        let (base, _requests) = serve_once("404 Not Found", b"");
        let dir = tempfile::tempdir().unwrap();
        let agent = ureq::Agent::new_with_defaults();

        let err = fetch(&agent, &base, "2bit", dir.path()).unwrap_err();

        assert!(matches!(err, FetchError::Http(_)));
        assert!(!dir.path().join("2bit.cif").exists());
    }

    #[test]
    fn output_directory_is_created_if_absent() {
        let (base, _requests) = serve_once("200 OK", b"data");
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("modal");

        let agent = ureq::Agent::new_with_defaults();
        let path = fetch(&agent, &base, "1abc", &out_dir).unwrap();

        assert_eq!(path, out_dir.join("1abc.cif"));
        assert_eq!(std::fs::read(path).unwrap(), b"data");
    }
}
