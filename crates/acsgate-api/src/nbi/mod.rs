// GenieACS-compatible northbound interface client.

pub mod client;
pub mod devices;
pub mod models;
pub mod query;
pub mod tasks;

pub use client::NbiClient;
pub use devices::TOTAL_COUNT_HEADER;
pub use models::{DeviceCount, ParameterValue, Task, TaskAck, TaskOptions, TaskStatus, XsdType};
pub use query::{DeviceQuery, Filter, Sort, SortOrder};
