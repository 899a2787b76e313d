pub mod log;

#[cfg(feature = "x11")]
pub mod x11;
