pub mod controls;
pub mod panels;
pub mod table;
