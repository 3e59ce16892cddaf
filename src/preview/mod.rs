pub mod capture;
pub mod compress;
pub mod display;
pub mod encode;
pub mod snapshot;
