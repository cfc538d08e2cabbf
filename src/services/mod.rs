//! Service layer: validation, graph analysis, retry, dispatch, and the
//! mission pipeline that ties them together.

pub mod dependency_graph;
pub mod dispatcher;
pub mod mission_runner;
pub mod phase_runner;
pub mod retry;
pub mod validator;

pub use dispatcher::{CancelFlag, Dispatcher, ExecutionEvent};
pub use mission_runner::{run_mission, run_mission_with};
pub use validator::{validate_mission, MissionPlan};
