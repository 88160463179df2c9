mod discovery;
mod extract;
mod labels;
mod matcher;
mod report;
mod run;
mod stats;
mod thresholds;

pub(crate) use run::run;
