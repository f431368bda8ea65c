// Defines actions and events for TUI interaction and state updates.
use crate::board::{BoardSnapshot, PendingMove};
use crate::client::ApiError;
use crate::model::{
    Board, BoardId, Card, CardId, CardList, CourseTemplate, ListId, NewBoard, NewCard, User,
};
use crate::tasks::{AssignDraft, TaskFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Courses,
    Board,
    Calendar,
    Tasks,
}

impl Screen {
    pub const ALL: [Screen; 4] = [Screen::Courses, Screen::Board, Screen::Calendar, Screen::Tasks];

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|s| *s == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn title(self) -> &'static str {
        match self {
            Screen::Courses => "Courses",
            Screen::Board => "Board",
            Screen::Calendar => "Calendar",
            Screen::Tasks => "Tasks",
        }
    }
}

#[derive(Debug)]
pub enum Action {
    LoadBoards,
    LoadTemplates,
    CreateBoard(NewBoard),
    InviteMember(BoardId, String),
    LoadBoard(BoardId),
    MoveCard(PendingMove),
    LoadCalendar,
    LoadTasks(TaskFilter),
    LoadLists,
    /// Members of the board `card` lives on. `board` is resolved from
    /// `list` when the card does not say.
    LoadMembers {
        card: CardId,
        list: ListId,
        board: Option<BoardId>,
    },
    SaveAssignees(AssignDraft),
    CreateCard(NewCard),
    Quit,
}

#[derive(Debug)]
pub enum AppEvent {
    BoardsLoaded(Vec<Board>),
    TemplatesLoaded(Vec<CourseTemplate>),
    BoardCreated(Board),
    BoardLoaded(BoardId, Result<BoardSnapshot, ApiError>),
    MoveFinished(Result<(), ApiError>),
    CalendarLoaded(Vec<Card>),
    TasksLoaded(Vec<Card>),
    ListsLoaded(Vec<CardList>),
    MembersLoaded(CardId, Vec<User>),
    AssigneesSaved(AssignDraft),
    CardCreated(Card),
    Status(String),
    Error(ApiError),
}
