// File: ./src/tasks.rs
/*! Task list helpers: server-side filters, the assignee editor and the
new-card form.

Filters are sent to `GET /cards/` as query parameters and also applied to
the returned cards, so a backend that ignores a parameter still yields the
list the user asked for.
*/

use crate::model::{Card, CardId, DueDate, ListId, NewCard, Priority, UserId};
use chrono::{Days, Local, NaiveDate};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssigneeFilter {
    #[default]
    All,
    Me,
}

impl AssigneeFilter {
    pub fn cycle(self) -> Self {
        match self {
            AssigneeFilter::All => AssigneeFilter::Me,
            AssigneeFilter::Me => AssigneeFilter::All,
        }
    }
}

/// How far ahead the due-date filter looks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DueWindow {
    #[default]
    All,
    Within(u32),
}

impl DueWindow {
    pub const WINDOWS: [DueWindow; 3] = [DueWindow::All, DueWindow::Within(7), DueWindow::Within(30)];

    pub fn cycle(self) -> Self {
        let idx = Self::WINDOWS.iter().position(|w| *w == self).unwrap_or(0);
        Self::WINDOWS[(idx + 1) % Self::WINDOWS.len()]
    }

    /// Last day included by the window, counted from `today`.
    pub fn limit(&self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            DueWindow::All => None,
            DueWindow::Within(days) => today.checked_add_days(Days::new(u64::from(*days))),
        }
    }
}

impl fmt::Display for AssigneeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssigneeFilter::All => write!(f, "everyone"),
            AssigneeFilter::Me => write!(f, "assigned to me"),
        }
    }
}

impl fmt::Display for DueWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DueWindow::All => write!(f, "any due date"),
            DueWindow::Within(days) => write!(f, "next {} days", days),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskFilter {
    pub assignee: AssigneeFilter,
    pub due: DueWindow,
}

impl TaskFilter {
    /// Query pairs for `GET /cards/`. `Me` without a known user id adds nothing.
    pub fn to_query(&self, my_id: Option<UserId>, today: NaiveDate) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if self.assignee == AssigneeFilter::Me
            && let Some(id) = my_id
        {
            params.push(("assignee".to_string(), id.to_string()));
        }
        if let Some(limit) = self.due.limit(today) {
            params.push((
                "due_before".to_string(),
                limit.format("%Y-%m-%d").to_string(),
            ));
        }
        params
    }

    pub fn matches(&self, card: &Card, my_id: Option<UserId>, today: NaiveDate) -> bool {
        if self.assignee == AssigneeFilter::Me
            && let Some(id) = my_id
            && !card.is_assigned_to(id)
        {
            return false;
        }
        match self.due.limit(today) {
            None => true,
            Some(limit) => card
                .due_date
                .is_some_and(|due| due.local_date() <= limit),
        }
    }

    pub fn apply(&self, cards: Vec<Card>, my_id: Option<UserId>, today: NaiveDate) -> Vec<Card> {
        cards
            .into_iter()
            .filter(|c| self.matches(c, my_id, today))
            .collect()
    }

    pub fn today() -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Assignees being edited for one card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignDraft {
    pub card: CardId,
    pub assignees: Vec<UserId>,
}

impl AssignDraft {
    pub fn for_card(card: &Card) -> Self {
        Self {
            card: card.id,
            assignees: card.assignees.clone(),
        }
    }

    /// Adds `user` at the end, or removes it if already selected.
    pub fn toggle(&mut self, user: UserId) {
        if let Some(idx) = self.assignees.iter().position(|u| *u == user) {
            self.assignees.remove(idx);
        } else {
            self.assignees.push(user);
        }
    }

    pub fn contains(&self, user: UserId) -> bool {
        self.assignees.contains(&user)
    }

    /// Mirrors a saved draft into the local copy. Returns false when the card
    /// is not in `cards`.
    pub fn apply_to(&self, cards: &mut [Card]) -> bool {
        match cards.iter_mut().find(|c| c.id == self.card) {
            Some(card) => {
                card.assignees = self.assignees.clone();
                true
            }
            None => false,
        }
    }
}

/// Raw input of the "new task" form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewCardForm {
    pub list: Option<ListId>,
    pub title: String,
    pub description: String,
    pub due_date: String,
    pub priority: Priority,
}

fn parse_priority(raw: &str) -> Option<Priority> {
    match raw.to_ascii_lowercase().as_str() {
        "low" | "l" => Some(Priority::Low),
        "med" | "medium" | "m" => Some(Priority::Med),
        "high" | "h" => Some(Priority::High),
        _ => None,
    }
}

impl NewCardForm {
    /// Reads one line of the form `title | due | priority | description`.
    /// Everything after the title is optional and blank fields are skipped;
    /// extra `|` go to the description.
    pub fn from_input(list: Option<ListId>, raw: &str) -> Result<Self, String> {
        let mut fields = raw.splitn(4, '|').map(str::trim);
        let title = fields.next().unwrap_or_default().to_string();
        let due_date = fields.next().unwrap_or_default().to_string();
        let priority = match fields.next().unwrap_or_default() {
            "" => Priority::default(),
            p => parse_priority(p)
                .ok_or_else(|| format!("Unknown priority '{}' (low, med, high)", p))?,
        };
        let description = fields.next().unwrap_or_default().to_string();

        Ok(Self {
            list,
            title,
            description,
            due_date,
            priority,
        })
    }

    pub fn validate(&self) -> Result<NewCard, String> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err("A title is required".to_string());
        }
        let Some(list) = self.list else {
            return Err("Pick a list for the task".to_string());
        };

        let description = Some(self.description.trim())
            .filter(|d| !d.is_empty())
            .map(str::to_string);

        let due_date = match self.due_date.trim() {
            "" => None,
            raw => Some(
                DueDate::parse(raw).ok_or_else(|| format!("Unrecognised due date '{}'", raw))?,
            ),
        };

        Ok(NewCard {
            list,
            title: title.to_string(),
            description,
            due_date,
            priority: self.priority,
        })
    }
}
