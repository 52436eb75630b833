// acsgate-api: Async Rust client for a TR-069 ACS northbound interface

pub mod error;
pub mod nbi;
pub mod transport;

pub use error::Error;
pub use nbi::{
    DeviceCount, DeviceQuery, Filter, NbiClient, ParameterValue, Sort, SortOrder, Task, TaskAck,
    TaskOptions, TaskStatus, XsdType,
};
pub use transport::{TlsMode, TransportConfig};
