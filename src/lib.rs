pub mod config;
pub mod dispatch;
pub mod error;
pub mod facility;
pub mod geo;
pub mod handlers;
pub mod map;
pub mod models;
pub mod service;
pub mod transport;

pub use crate::config::Config;
pub use crate::dispatch::{DispatchResult, QueryDispatcher};
pub use crate::error::{DataLoadError, DispatchError, GeoMeshError, Result};
pub use crate::facility::{FacilityIndex, FacilityRef};
pub use crate::geo::DistanceMetric;
pub use crate::models::{Facility, Query};
pub use crate::service::{GeoMeshService, QueryReport};
pub use crate::transport::{OpenAiTransport, Transport};
