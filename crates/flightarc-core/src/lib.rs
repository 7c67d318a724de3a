//! Flight arc engine: lifecycle simulation and great-circle interpolation
//! for rendering many flights in progress, one frame per simulated tick.

pub mod error;
pub mod geodesic;
pub mod lifecycle;
pub mod models;
pub mod render;
pub mod rules;
pub mod scheduler;

pub use error::{CollaboratorError, FlightRecordError, RejectedRecord, SimulationError};
pub use geodesic::{Ellipsoid, Geodesic, GreatCircleInterpolator, GreatCirclePath};
pub use lifecycle::{ActivePath, Fade, FlightLifecycleManager, TickUpdate};
pub use models::{
    Flight, FlightId, FlightRecord, GeoPoint, LifecycleState, PlotPoint, StateCounts,
};
pub use render::{
    CarrierPalette, FrameInfo, FrameSink, Identity, LineColor, Projection, RenderAdapter,
    SingleColor,
};
pub use rules::SimulationRules;
pub use scheduler::{Collaborators, RunSummary, SimulationWindow, TickReport, TimeStepScheduler};
