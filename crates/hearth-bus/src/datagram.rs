// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Host-wide bus over Unix datagram sockets.
//!
//! Every subscriber binds its own socket in `<directory>/<channel>/`.
//! Publishing sends one datagram to every socket found there, so any process
//! on the host that agrees on the directory and channel name sees every
//! message. Sockets whose owner has died refuse delivery and are removed by
//! the next publisher.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::UnixDatagram;
use tracing::{debug, info, warn};
use uuid::Uuid;

use hearth_config::model::BusConfig;
use hearth_core::{BusMessage, BusReceiver, HearthError, MessageBus};

use crate::codec::{self, MAX_MESSAGE_BYTES};

const SOCKET_EXTENSION: &str = "sock";

/// Upper bound on waiting for room in one subscriber's receive queue.
const SEND_TIMEOUT: Duration = Duration::from_secs(1);

/// Bus shared by all processes that agree on a directory and channel name.
#[derive(Debug, Clone)]
pub struct DatagramBus {
    channel_dir: PathBuf,
}

impl DatagramBus {
    pub fn new(directory: impl AsRef<Path>, channel: &str) -> Self {
        Self {
            channel_dir: directory.as_ref().join(channel),
        }
    }

    pub fn from_config(config: &BusConfig) -> Self {
        Self::new(&config.directory, &config.channel_name)
    }

    /// Directory holding the subscriber sockets.
    pub fn channel_dir(&self) -> &Path {
        &self.channel_dir
    }

    fn ensure_dir(&self) -> Result<(), HearthError> {
        std::fs::create_dir_all(&self.channel_dir).map_err(|e| io_err("create bus directory", e))
    }

    fn subscriber_sockets(&self) -> Result<Vec<PathBuf>, HearthError> {
        let entries = match std::fs::read_dir(&self.channel_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_err("list bus subscribers", e)),
        };
        Ok(entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == SOCKET_EXTENSION))
            .collect())
    }
}

#[async_trait]
impl MessageBus for DatagramBus {
    async fn publish(&self, message: &BusMessage) -> Result<(), HearthError> {
        let bytes = codec::encode(message)?;
        let sockets = self.subscriber_sockets()?;
        if sockets.is_empty() {
            debug!(channel = %self.channel_dir.display(), "published with no subscribers");
            return Ok(());
        }

        let sender = UnixDatagram::unbound().map_err(|e| io_err("open sender socket", e))?;
        let mut delivered = 0usize;
        for path in sockets {
            match tokio::time::timeout(SEND_TIMEOUT, sender.send_to(&bytes, &path)).await {
                Ok(Ok(_)) => delivered += 1,
                Ok(Err(e))
                    if matches!(
                        e.kind(),
                        io::ErrorKind::ConnectionRefused | io::ErrorKind::NotFound
                    ) =>
                {
                    debug!(socket = %path.display(), "removing stale subscriber socket");
                    let _ = std::fs::remove_file(&path);
                }
                Ok(Err(e)) => {
                    warn!(socket = %path.display(), error = %e, "datagram delivery failed");
                }
                Err(_) => {
                    warn!(socket = %path.display(), "subscriber queue full, message dropped");
                }
            }
        }
        debug!(delivered, bytes = bytes.len(), "published on datagram bus");
        Ok(())
    }

    async fn subscribe(&self) -> Result<Box<dyn BusReceiver>, HearthError> {
        self.ensure_dir()?;
        let path = self
            .channel_dir
            .join(format!("{}.{SOCKET_EXTENSION}", Uuid::new_v4()));
        let socket = UnixDatagram::bind(&path).map_err(|e| io_err("bind subscriber socket", e))?;
        info!(socket = %path.display(), "subscribed to datagram bus");
        Ok(Box::new(DatagramReceiver {
            socket,
            path,
            buf: vec![0u8; MAX_MESSAGE_BYTES + 1],
        }))
    }
}

struct DatagramReceiver {
    socket: UnixDatagram,
    path: PathBuf,
    buf: Vec<u8>,
}

#[async_trait]
impl BusReceiver for DatagramReceiver {
    async fn recv(&mut self) -> Option<BusMessage> {
        loop {
            let len = match self.socket.recv(&mut self.buf).await {
                Ok(len) => len,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!(socket = %self.path.display(), error = %e, "bus receive failed, closing");
                    return None;
                }
            };
            match codec::decode(&self.buf[..len]) {
                Ok(message) => return Some(message),
                Err(e) => warn!(bytes = len, error = %e, "skipping undecodable datagram"),
            }
        }
    }
}

impl Drop for DatagramReceiver {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

fn io_err(action: &str, source: io::Error) -> HearthError {
    HearthError::Bus {
        message: format!("failed to {action}"),
        source: Some(Box::new(source)),
    }
}
