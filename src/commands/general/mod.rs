pub(crate) mod add;
pub(crate) mod hello;
pub(crate) mod help;
#[cfg(feature = "wolfram")]
pub(crate) mod math;
pub(crate) mod today;
