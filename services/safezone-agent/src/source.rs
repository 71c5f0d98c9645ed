use async_trait::async_trait;
use safezone_core::{LocationFix, ZoneResult};
use safezone_monitor::LocationSource;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Stdin};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const FIX_BUFFER: usize = 64;

/// Location fixes as newline-delimited JSON, e.g. piped in from a GPS
/// daemon: `{"latitude": 12.97, "longitude": 77.59}`.
pub struct JsonLinesSource<R> {
    reader: Option<R>,
    task: Option<JoinHandle<()>>,
}

impl JsonLinesSource<Stdin> {
    pub fn stdin() -> Self {
        Self::new(tokio::io::stdin())
    }
}

impl<R> JsonLinesSource<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    pub fn new(reader: R) -> Self {
        Self {
            reader: Some(reader),
            task: None,
        }
    }
}

#[async_trait]
impl<R> LocationSource for JsonLinesSource<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    async fn start(&mut self) -> ZoneResult<mpsc::Receiver<LocationFix>> {
        let (tx, rx) = mpsc::channel(FIX_BUFFER);
        // A second start yields a stream that is already closed.
        if let Some(reader) = self.reader.take() {
            self.task = Some(tokio::spawn(read_fixes(reader, tx)));
        }
        Ok(rx)
    }

    async fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn read_fixes<R: AsyncRead + Unpin>(reader: R, tx: mpsc::Sender<LocationFix>) {
    let mut lines = BufReader::new(reader).lines();
    let mut line_no = 0usize;
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                warn!(error = %err, "failed to read location input");
                break;
            }
        };
        line_no += 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<LocationFix>(line) {
            Ok(fix) => {
                if tx.send(fix).await.is_err() {
                    break;
                }
            }
            Err(err) => warn!(line = line_no, error = %err, "skipping malformed fix"),
        }
    }
    debug!(lines = line_no, "location input closed");
}
