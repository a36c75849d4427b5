//! gpsd location provider.
//!
//! Talks to a local [gpsd](https://gpsd.io) daemon over its JSON socket
//! protocol. The provider connects, enables watch mode and waits for a TPV
//! (time-position-velocity) report that satisfies the request.
//!
//! # Protocol
//!
//! ```text
//! <- {"class":"VERSION",...}
//! -> ?WATCH={"enable":true,"json":true};
//! <- {"class":"DEVICES","devices":[...]}
//! <- {"class":"WATCH",...}
//! <- {"class":"TPV","mode":3,"lat":..,"lon":..,"altMSL":..,"epv":..,"time":".."}
//! ```
//!
//! When `maximum_age` is non-zero a `?POLL;` is issued first and the last
//! seen fix is reused if it is young enough.

use std::io::ErrorKind;

use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, trace};

use super::types::{LocationProvider, PlatformError, PositionFix, PositionRequest};
use crate::clock::{Clock, SystemClock};
use crate::BoxFuture;

/// Default gpsd host.
pub const DEFAULT_GPSD_HOST: &str = "127.0.0.1";

/// Default gpsd port.
pub const DEFAULT_GPSD_PORT: u16 = 2947;

const WATCH_COMMAND: &[u8] = b"?WATCH={\"enable\":true,\"json\":true};\n";
const POLL_COMMAND: &[u8] = b"?POLL;\n";

/// NMEA mode values reported in TPV.
const MODE_2D: u8 = 2;
const MODE_3D: u8 = 3;

/// A TPV report.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct Tpv {
    #[serde(default)]
    mode: u8,
    lat: Option<f64>,
    lon: Option<f64>,
    /// Altitude above mean sea level (gpsd >= 3.20).
    #[serde(rename = "altMSL")]
    alt_msl: Option<f64>,
    /// Legacy altitude field.
    alt: Option<f64>,
    /// Estimated vertical error, meters.
    epv: Option<f64>,
    time: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DeviceEntry {
    #[serde(default)]
    path: String,
}

/// Messages we care about; everything else is skipped.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "class")]
pub(crate) enum GpsdMessage {
    #[serde(rename = "TPV")]
    Tpv(Tpv),
    #[serde(rename = "DEVICES")]
    Devices {
        #[serde(default)]
        devices: Vec<DeviceEntry>,
    },
    #[serde(rename = "POLL")]
    Poll {
        #[serde(default)]
        tpv: Vec<Tpv>,
    },
    #[serde(rename = "ERROR")]
    Error {
        #[serde(default)]
        message: String,
    },
    #[serde(other)]
    Other,
}

impl GpsdMessage {
    pub(crate) fn parse(line: &str) -> Option<Self> {
        serde_json::from_str(line).ok()
    }
}

impl Tpv {
    /// Converts the report into a fix if it meets the request's quality bar.
    fn to_fix(&self, high_accuracy: bool, fallback_time_ms: i64) -> Option<PositionFix> {
        let required_mode = if high_accuracy { MODE_3D } else { MODE_2D };
        if self.mode < required_mode {
            return None;
        }
        let (latitude, longitude) = (self.lat?, self.lon?);

        let altitude = if self.mode >= MODE_3D {
            self.alt_msl.or(self.alt)
        } else {
            None
        };

        let timestamp_ms = self
            .time
            .as_deref()
            .and_then(|t| chrono::DateTime::parse_from_rfc3339(t).ok())
            .map(|t| t.timestamp_millis())
            .unwrap_or(fallback_time_ms);

        Some(PositionFix {
            latitude,
            longitude,
            altitude,
            altitude_accuracy: self.epv.filter(|_| altitude.is_some()),
            timestamp_ms,
        })
    }
}

/// Location provider backed by a gpsd daemon.
pub struct GpsdLocationProvider<K: Clock = SystemClock> {
    host: String,
    port: u16,
    clock: K,
}

impl GpsdLocationProvider<SystemClock> {
    /// Creates a provider for gpsd at `host:port`.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            clock: SystemClock,
        }
    }
}

impl Default for GpsdLocationProvider<SystemClock> {
    fn default() -> Self {
        Self::new(DEFAULT_GPSD_HOST, DEFAULT_GPSD_PORT)
    }
}

impl<K: Clock> GpsdLocationProvider<K> {
    /// Replaces the clock used to judge fix age.
    pub fn with_clock<K2: Clock>(self, clock: K2) -> GpsdLocationProvider<K2> {
        GpsdLocationProvider {
            host: self.host,
            port: self.port,
            clock,
        }
    }

    fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    async fn connect(&self) -> Result<TcpStream, PlatformError> {
        TcpStream::connect(self.address())
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::PermissionDenied => PlatformError::PermissionDenied(format!(
                    "access to gpsd at {} was refused: {}",
                    self.address(),
                    e
                )),
                ErrorKind::ConnectionRefused | ErrorKind::NotFound | ErrorKind::AddrNotAvailable => {
                    PlatformError::NotSupported(format!(
                        "no gpsd daemon reachable at {}",
                        self.address()
                    ))
                }
                _ => PlatformError::PositionUnavailable(format!(
                    "failed to connect to gpsd at {}: {}",
                    self.address(),
                    e
                )),
            })
    }

    async fn read_fix(&self, request: PositionRequest) -> Result<PositionFix, PlatformError> {
        let stream = self.connect().await?;
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);

        let io_err = |e: std::io::Error| {
            PlatformError::PositionUnavailable(format!("gpsd connection failed: {}", e))
        };

        let reuse_window_ms = request.maximum_age.as_millis() as i64;
        if reuse_window_ms > 0 {
            write_half.write_all(POLL_COMMAND).await.map_err(io_err)?;
        }
        write_half.write_all(WATCH_COMMAND).await.map_err(io_err)?;

        let mut line = String::new();
        loop {
            line.clear();
            let read = reader.read_line(&mut line).await.map_err(io_err)?;
            if read == 0 {
                return Err(PlatformError::PositionUnavailable(
                    "gpsd closed the connection before reporting a fix".to_string(),
                ));
            }

            let now = self.clock.now_ms();
            let Some(message) = GpsdMessage::parse(line.trim()) else {
                trace!(line = %line.trim(), "Skipping unparseable gpsd line");
                continue;
            };

            match message {
                GpsdMessage::Tpv(tpv) => {
                    if let Some(fix) = tpv.to_fix(request.high_accuracy, now) {
                        return Ok(fix);
                    }
                }
                GpsdMessage::Poll { tpv } => {
                    let reusable = tpv
                        .iter()
                        .filter_map(|t| t.to_fix(request.high_accuracy, now))
                        .find(|fix| now - fix.timestamp_ms <= reuse_window_ms);
                    if let Some(fix) = reusable {
                        debug!(age_ms = now - fix.timestamp_ms, "Reusing recent gpsd fix");
                        return Ok(fix);
                    }
                }
                GpsdMessage::Devices { devices } => {
                    if devices.is_empty() {
                        return Err(PlatformError::PositionUnavailable(
                            "gpsd has no GPS devices attached".to_string(),
                        ));
                    }
                    debug!(
                        devices = ?devices.iter().map(|d| d.path.as_str()).collect::<Vec<_>>(),
                        "gpsd devices"
                    );
                }
                GpsdMessage::Error { message } => {
                    return Err(PlatformError::PositionUnavailable(format!(
                        "gpsd error: {}",
                        message
                    )));
                }
                GpsdMessage::Other => {}
            }
        }
    }
}

impl<K: Clock> LocationProvider for GpsdLocationProvider<K> {
    fn current_position(
        &self,
        request: PositionRequest,
    ) -> BoxFuture<'_, Result<PositionFix, PlatformError>> {
        Box::pin(async move {
            match tokio::time::timeout(request.timeout, self.read_fix(request)).await {
                Ok(result) => result,
                Err(_) => Err(PlatformError::Timeout),
            }
        })
    }

    fn name(&self) -> &str {
        "gpsd"
    }
}
