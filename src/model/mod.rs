// File: ./src/model/mod.rs
pub mod display;
pub mod item;

pub use item::{
    Board, BoardId, Card, CardId, CardList, CourseTemplate, DueDate, ListId, NewBoard, NewCard,
    Priority, Role, User, UserId,
};
