pub mod record;
pub mod throttle;
pub mod buffer;
pub mod transport;
pub mod shipper;
pub mod config;
pub mod console;
pub mod logger;
pub mod layer;

#[cfg(feature = "http")]
pub mod axiom;
#[cfg(feature = "http")]
pub mod beacon;

pub mod init;
pub mod memory_transport;
pub mod noop_transport;

pub use config::{Deployment, LoggerConfig, OutputModes};
pub use logger::Logger;
pub use record::{LogRecord, Origin, Severity};
pub use transport::{Delivery, SettleReport, Transport, TransportError};
