// File: ./src/calendar.rs
// Month grid and due-date buckets for the calendar screen.
use crate::model::{Card, CardId, UserId};
use chrono::{Datelike, Days, Local, Months, NaiveDate, TimeZone};
use std::collections::HashMap;

pub const WEEKDAY_LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// One square of the month grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCell {
    pub date: NaiveDate,
    pub in_month: bool,
}

impl DayCell {
    pub fn key(&self) -> String {
        day_key(self.date)
    }
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn last_of_month(date: NaiveDate) -> NaiveDate {
    let first = first_of_month(date);
    first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(first)
}

pub fn days_in_month(date: NaiveDate) -> u32 {
    last_of_month(date).day()
}

/// Monday-first grid for the month containing `reference`.
///
/// Days of neighbouring months pad the first and last week so the length is
/// always a multiple of 7.
pub fn month_grid(reference: NaiveDate) -> Vec<DayCell> {
    let first = first_of_month(reference);
    let last = last_of_month(reference);
    let leading = first.weekday().num_days_from_monday() as u64;

    let mut cells = Vec::with_capacity(42);
    for back in (1..=leading).rev() {
        if let Some(date) = first.checked_sub_days(Days::new(back)) {
            cells.push(DayCell {
                date,
                in_month: false,
            });
        }
    }

    cells.extend(first.iter_days().take_while(|d| *d <= last).map(|date| DayCell {
        date,
        in_month: true,
    }));

    let mut next = last.succ_opt();
    while cells.len() % 7 != 0 {
        let Some(date) = next else { break };
        cells.push(DayCell {
            date,
            in_month: false,
        });
        next = date.succ_opt();
    }
    cells
}

/// Zero-padded `YYYY-MM-DD`.
pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Groups cards by the local calendar date of their deadline.
pub fn bucket_by_due_date(cards: &[Card]) -> HashMap<String, Vec<&Card>> {
    bucket_by_due_date_in(cards, &Local)
}

/// Same as [`bucket_by_due_date`] with an explicit zone. Cards without a due
/// date are left out; each bucket keeps input order.
pub fn bucket_by_due_date_in<'a, Tz: TimeZone>(
    cards: &'a [Card],
    tz: &Tz,
) -> HashMap<String, Vec<&'a Card>> {
    let mut buckets: HashMap<String, Vec<&Card>> = HashMap::new();
    for card in cards {
        if let Some(due) = &card.due_date {
            buckets
                .entry(day_key(due.date_in(tz)))
                .or_default()
                .push(card);
        }
    }
    buckets
}

/// Adds `delta` months keeping the day of month. When the target month is
/// shorter the surplus days spill into the month after it, so Jan 31 plus
/// one month is Mar 3 (Mar 2 in a leap year).
pub fn shift_months(date: NaiveDate, delta: i32) -> NaiveDate {
    let first = first_of_month(date);
    let target = if delta >= 0 {
        first.checked_add_months(Months::new(delta.unsigned_abs()))
    } else {
        first.checked_sub_months(Months::new(delta.unsigned_abs()))
    };
    target
        .and_then(|t| t.checked_add_days(Days::new(u64::from(date.day() - 1))))
        .unwrap_or(date)
}

/// "March 2025".
pub fn month_label(date: NaiveDate) -> String {
    date.format("%B %Y").to_string()
}

/// State behind the calendar screen: the month shown, the selected day and
/// the cards to bucket.
#[derive(Debug, Clone)]
pub struct CalendarView {
    reference: NaiveDate,
    selected: Option<NaiveDate>,
    cards: Vec<Card>,
}

impl Default for CalendarView {
    fn default() -> Self {
        Self::new(Local::now().date_naive())
    }
}

impl CalendarView {
    /// Shows the month of `today`, nothing selected.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            reference: first_of_month(today),
            selected: None,
            cards: Vec::new(),
        }
    }

    pub fn reference(&self) -> NaiveDate {
        self.reference
    }

    pub fn grid(&self) -> Vec<DayCell> {
        month_grid(self.reference)
    }

    pub fn label(&self) -> String {
        month_label(self.reference)
    }

    pub fn next_month(&mut self) {
        self.reference = shift_months(self.reference, 1);
    }

    pub fn prev_month(&mut self) {
        self.reference = shift_months(self.reference, -1);
    }

    pub fn set_cards(&mut self, cards: Vec<Card>) {
        self.cards = cards;
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn set_assignees(&mut self, card: CardId, assignees: &[UserId]) -> bool {
        match self.cards.iter_mut().find(|c| c.id == card) {
            Some(c) => {
                c.assignees = assignees.to_vec();
                true
            }
            None => false,
        }
    }

    pub fn select(&mut self, date: NaiveDate) {
        self.selected = Some(date);
    }

    pub fn selected(&self) -> Option<NaiveDate> {
        self.selected
    }

    pub fn selected_key(&self) -> Option<String> {
        self.selected.map(day_key)
    }

    /// Moves the selection by `days`, starting from the first of the shown
    /// month when nothing is selected. The shown month follows the cursor.
    pub fn move_selection(&mut self, days: i64) {
        let from = self.selected.unwrap_or(self.reference);
        let to = if days >= 0 {
            from.checked_add_days(Days::new(days.unsigned_abs()))
        } else {
            from.checked_sub_days(Days::new(days.unsigned_abs()))
        };
        if let Some(date) = to {
            self.selected = Some(date);
            if first_of_month(date) != self.reference {
                self.reference = first_of_month(date);
            }
        }
    }

    /// Bucket of the selected day; empty when nothing is due or nothing is selected.
    pub fn selected_cards(&self) -> Vec<&Card> {
        self.selected_cards_in(&Local)
    }

    pub fn selected_cards_in<Tz: TimeZone>(&self, tz: &Tz) -> Vec<&Card> {
        let Some(key) = self.selected_key() else {
            return Vec::new();
        };
        bucket_by_due_date_in(&self.cards, tz)
            .remove(&key)
            .unwrap_or_default()
    }

    /// Number of cards due per day, keyed like the buckets.
    pub fn counts(&self) -> HashMap<String, usize> {
        bucket_by_due_date(&self.cards)
            .into_iter()
            .map(|(k, v)| (k, v.len()))
            .collect()
    }
}
