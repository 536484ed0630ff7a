pub mod cards;
pub mod pager;
pub mod theme;
