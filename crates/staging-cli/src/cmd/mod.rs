pub mod alias;
pub mod list;
pub mod suspend;
