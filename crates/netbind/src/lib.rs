//! Acquisition of the network a transfer runs over.
//!
//! Narrowband links come and go, so the transfer engine asks its
//! [`NetworkBinder`] for a fresh [`BoundNetwork`] before every attempt and
//! never holds a handle across attempts. `None` from the binder means "no
//! usable network right now"; the engine treats that as a retryable
//! condition, not an error.

use std::net::IpAddr;
use std::sync::OnceLock;
use std::time::Duration;

use tracing::warn;

/// Per-connection timeouts attached to every client a binder hands out.
///
/// There is deliberately no whole-request deadline: a session on a slow link
/// is unbounded, and only individual connects and reads are time-limited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindConfig {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

impl Default for BindConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
            read_timeout: Duration::from_secs(15),
        }
    }
}

impl BindConfig {
    /// Upload-side timeouts. The server's response only arrives after the
    /// whole body has crawled over the link, so reads get a longer leash.
    pub fn for_upload() -> Self {
        Self {
            read_timeout: Duration::from_secs(30),
            ..Self::default()
        }
    }
}

/// Supplies the currently usable network, or none.
pub trait NetworkBinder: Send + Sync {
    fn current_network(&self) -> Option<BoundNetwork>;
}

/// Handle to the network one transfer attempt runs over.
///
/// Cheap to clone. All connections for the attempt are opened through the
/// wrapped client so they inherit its local binding and timeouts.
#[derive(Clone)]
pub struct BoundNetwork {
    label: String,
    client: reqwest::blocking::Client,
}

impl BoundNetwork {
    pub fn new(label: impl Into<String>, client: reqwest::blocking::Client) -> Self {
        Self {
            label: label.into(),
            client,
        }
    }

    /// Human-readable identifier of the underlying network, for logs.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The HTTP client bound to this network.
    pub fn http(&self) -> &reqwest::blocking::Client {
        &self.client
    }
}

fn build_client(config: &BindConfig, local_addr: Option<IpAddr>) -> Option<reqwest::blocking::Client> {
    let mut builder = reqwest::blocking::Client::builder()
        .connect_timeout(config.connect_timeout)
        .read_timeout(config.read_timeout);
    if let Some(addr) = local_addr {
        builder = builder.local_address(addr);
    }
    match builder.build() {
        Ok(client) => Some(client),
        Err(e) => {
            warn!(error = %e, "failed to build HTTP client for bound network");
            None
        }
    }
}

/// Binds through the system default route.
pub struct SystemBinder {
    config: BindConfig,
    client: OnceLock<Option<reqwest::blocking::Client>>,
}

impl SystemBinder {
    pub fn new() -> Self {
        Self::with_config(BindConfig::default())
    }

    pub fn with_config(config: BindConfig) -> Self {
        Self {
            config,
            client: OnceLock::new(),
        }
    }
}

impl Default for SystemBinder {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkBinder for SystemBinder {
    fn current_network(&self) -> Option<BoundNetwork> {
        self.client
            .get_or_init(|| build_client(&self.config, None))
            .as_ref()
            .map(|client| BoundNetwork::new("default-route", client.clone()))
    }
}

/// Binds every socket to one local address, pinning transfers to a specific
/// interface even when the default route points elsewhere.
pub struct InterfaceBinder {
    addr: IpAddr,
    config: BindConfig,
    client: OnceLock<Option<reqwest::blocking::Client>>,
}

impl InterfaceBinder {
    pub fn new(addr: IpAddr) -> Self {
        Self::with_config(addr, BindConfig::default())
    }

    pub fn with_config(addr: IpAddr, config: BindConfig) -> Self {
        Self {
            addr,
            config,
            client: OnceLock::new(),
        }
    }
}

impl NetworkBinder for InterfaceBinder {
    fn current_network(&self) -> Option<BoundNetwork> {
        self.client
            .get_or_init(|| build_client(&self.config, Some(self.addr)))
            .as_ref()
            .map(|client| BoundNetwork::new(format!("local:{}", self.addr), client.clone()))
    }
}
