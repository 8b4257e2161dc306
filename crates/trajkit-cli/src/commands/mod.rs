pub mod info;
pub mod reweight;
pub mod scan;
