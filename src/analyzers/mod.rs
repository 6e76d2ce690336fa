pub mod change_stats;
pub mod size;
