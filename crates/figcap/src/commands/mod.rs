//! CLI command implementations.

pub(crate) mod extract;
pub(crate) mod run;
pub(crate) mod stats;

pub(crate) use extract::ExtractArgs;
pub(crate) use run::RunArgs;
pub(crate) use stats::StatsArgs;
