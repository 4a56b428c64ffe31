pub mod ingredient;
pub mod planner;
pub mod recipe;
pub mod shared;
