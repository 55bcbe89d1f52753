//! [`StreamResolver`] backed by the `yt-dlp` CLI.
//!
//! Shells out to `yt-dlp -J --no-playlist <watch url>` and maps the
//! `formats` array of its JSON output into [`StreamInfo`]s.

use std::io::Read;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tubeforge_common::{Error, Result};

use super::{StreamInfo, StreamKind, StreamResolver};
use crate::uri::watch_url;

const TOOL: &str = "yt-dlp";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Deserialize)]
struct YtDlpOutput {
    #[serde(default)]
    formats: Vec<YtDlpFormat>,
}

#[derive(Debug, Deserialize)]
struct YtDlpFormat {
    url: Option<String>,
    ext: Option<String>,
    acodec: Option<String>,
    vcodec: Option<String>,
    abr: Option<f64>,
    tbr: Option<f64>,
}

fn has_codec(codec: &Option<String>) -> bool {
    codec.as_deref().is_some_and(|c| c != "none")
}

fn to_stream(format: YtDlpFormat) -> Option<StreamInfo> {
    let kind = match (has_codec(&format.acodec), has_codec(&format.vcodec)) {
        (true, false) => StreamKind::AudioOnly,
        (true, true) => StreamKind::Combined,
        (false, true) => StreamKind::VideoOnly,
        // Storyboards and other image-only formats.
        (false, false) => return None,
    };

    Some(StreamInfo {
        url: format.url?,
        extension: format.ext.unwrap_or_default(),
        kind,
        bitrate_kbps: format.abr.or(format.tbr),
    })
}

/// Parse the JSON printed by `yt-dlp -J`.
fn parse_output(json: &str) -> Result<Vec<StreamInfo>> {
    let output: YtDlpOutput = serde_json::from_str(json)
        .map_err(|e| Error::parse(format!("yt-dlp JSON parse error: {e}")))?;
    Ok(output.formats.into_iter().filter_map(to_stream).collect())
}

/// A resolver backed by the `yt-dlp` binary.
#[derive(Debug, Clone)]
pub struct YtDlpResolver {
    program: PathBuf,
    timeout: Duration,
}

impl YtDlpResolver {
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Create a resolver that finds yt-dlp on `PATH`.
    pub fn from_path() -> Option<Self> {
        which::which(TOOL).ok().map(Self::new)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run the tool, capturing stdout. Output pipes are drained on their own
    /// threads so a large JSON document cannot stall the child.
    fn run(&self, args: &[String]) -> Result<String> {
        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::tool(TOOL, format!("failed to spawn: {e}")))?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let stdout_reader = thread::spawn(move || drain(stdout));
        let stderr_reader = thread::spawn(move || drain(stderr));

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                return Err(Error::tool(
                    TOOL,
                    format!("timed out after {:?}", self.timeout),
                ));
            }
            thread::sleep(POLL_INTERVAL);
        };

        let stdout = stdout_reader.join().unwrap_or_default();
        let stderr = stderr_reader.join().unwrap_or_default();

        if !status.success() {
            return Err(Error::tool(
                TOOL,
                format!("exited with status {status}: {}", stderr.trim()),
            ));
        }
        Ok(stdout)
    }
}

fn drain(pipe: Option<impl Read>) -> String {
    let mut buf = String::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_string(&mut buf);
    }
    buf
}

impl StreamResolver for YtDlpResolver {
    fn name(&self) -> &'static str {
        TOOL
    }

    fn streams(&self, item_id: &str) -> Result<Vec<StreamInfo>> {
        let args = vec![
            "-J".to_string(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            "--".to_string(),
            watch_url(item_id),
        ];
        let json = self.run(&args)?;
        parse_output(&json)
    }
}
