pub mod csv;
pub mod multi_select;
pub mod normalize;
pub mod time;
