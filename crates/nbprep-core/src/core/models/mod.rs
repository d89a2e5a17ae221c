pub mod ids;
pub mod neighborhood;
