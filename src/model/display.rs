// File: ./src/model/display.rs
use crate::model::item::{Card, Priority};
use chrono::Local;

pub trait CardDisplay {
    fn priority_symbol(&self) -> &'static str;
    fn due_label(&self) -> String;
    fn to_row_string(&self) -> String;
}

impl CardDisplay for Card {
    fn priority_symbol(&self) -> &'static str {
        match self.priority {
            Priority::High => "!!!",
            Priority::Med => "!! ",
            Priority::Low => "!  ",
        }
    }

    fn due_label(&self) -> String {
        match &self.due_date {
            Some(due) => format!(
                "@{} {}",
                due.local_date().format("%Y-%m-%d"),
                due.time_label_in(&Local)
            ),
            None => String::new(),
        }
    }

    fn to_row_string(&self) -> String {
        let due = self.due_label();
        let assignees = if self.assignees.is_empty() {
            String::new()
        } else {
            format!(" [{}]", self.assignees.len())
        };
        if due.is_empty() {
            format!("{} {}{}", self.priority_symbol(), self.title, assignees)
        } else {
            format!(
                "{} {} {}{}",
                self.priority_symbol(),
                self.title,
                due,
                assignees
            )
        }
    }
}
