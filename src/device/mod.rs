pub mod combined;
pub mod command;
pub mod error;
pub mod model;
pub mod query;
pub mod repository;
pub mod service;
pub mod store;

pub use combined::CombinedRepository;
pub use error::{DeviceError, DeviceResult};
pub use model::{Device, PageWindow, DEFAULT_STATE};
pub use repository::{
    CommandDeviceRepository, MirrorObserver, QueryDeviceRepository, ReadStore,
    SystemOfRecordStore, TracingMirrorObserver,
};
pub use service::DeviceService;
