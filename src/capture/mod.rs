pub mod median;
pub mod panel;
pub mod sampler;
pub mod session;
