pub mod donors;
pub mod investigate;
pub mod outlier;
pub mod rank;
pub mod window;
