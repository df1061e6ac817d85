pub use crate::context::Context;
pub use crate::error::SeirsError;
pub use crate::log::{debug, error, info, trace, warn};
pub use crate::model::{run_replication, ContextSeirsExt, TrajectoryRow};
pub use crate::parameters::{ContextParametersExt, Parameters};
pub use crate::population::{AgentId, InfectionStatus, StatusCounts};
pub use crate::random::{replication_seed, ContextRandomExt, Xorshift64};
pub use crate::report::ContextReportExt;
pub use crate::{define_data_plugin, define_report};
