pub mod cn0_estimator;
pub mod filter;
pub mod low_pass;

pub use cn0_estimator::Cn0Estimator;
pub use filter::Filter;
pub use low_pass::LowPassFilter;
