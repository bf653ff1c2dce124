pub(crate) mod color;
pub(crate) mod log;
pub(crate) mod report;
