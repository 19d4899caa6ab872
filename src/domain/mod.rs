pub mod board;
pub mod entity;
pub mod form;
pub mod rules;
pub mod tile;
