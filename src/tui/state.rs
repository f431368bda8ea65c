// File: ./src/tui/state.rs
// Manages the application state for the TUI.
use crate::board::BoardReconciler;
use crate::calendar::CalendarView;
use crate::config::{AppTheme, Config};
use crate::context::SharedContext;
use crate::model::{Board, Card, CardList, CourseTemplate, ListId, User, UserId};
use crate::session::SessionStore;
use crate::tasks::{AssignDraft, TaskFilter};
use crate::tui::action::Screen;
use ratatui::widgets::ListState;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum InputMode {
    Normal,
    CreatingBoard,
    Inviting,
    CreatingCard,
    PickingTemplate,
    PickingAssignees,
}

impl InputMode {
    /// Modes fed from the line editor in the footer.
    pub fn is_text(self) -> bool {
        matches!(
            self,
            InputMode::CreatingBoard | InputMode::Inviting | InputMode::CreatingCard
        )
    }
}

pub struct AppState {
    pub ctx: SharedContext,
    pub config: Config,
    pub session: SessionStore,

    pub screen: Screen,
    pub theme: AppTheme,
    pub mode: InputMode,
    pub input_buffer: String,
    pub message: String,
    pub loading: bool,

    // Courses
    pub boards: Vec<Board>,
    pub board_list: ListState,
    pub templates: Vec<CourseTemplate>,
    pub template_list: ListState,

    // Board
    pub board: BoardReconciler,
    pub column: usize,
    pub row: usize,

    // Calendar
    pub calendar: CalendarView,

    // Tasks
    pub tasks: Vec<Card>,
    pub task_filter: TaskFilter,
    pub task_list: ListState,
    pub assign: Option<AssignDraft>,
    pub members: Vec<User>,
    pub member_list: ListState,

    // New card form
    pub card_lists: Vec<CardList>,
    pub new_card_list: Option<ListId>,
}

impl AppState {
    pub fn new(ctx: SharedContext, config: Config, session: SessionStore) -> Self {
        let mut board_list = ListState::default();
        board_list.select(Some(0));
        let mut task_list = ListState::default();
        task_list.select(Some(0));

        Self {
            ctx,
            theme: config.theme,
            config,
            session,
            screen: Screen::Courses,
            mode: InputMode::Normal,
            input_buffer: String::new(),
            message: "Loading...".to_string(),
            loading: true,
            boards: Vec::new(),
            board_list,
            templates: Vec::new(),
            template_list: ListState::default(),
            board: BoardReconciler::new(),
            column: 0,
            row: 0,
            calendar: CalendarView::default(),
            tasks: Vec::new(),
            task_filter: TaskFilter::default(),
            task_list,
            assign: None,
            members: Vec::new(),
            member_list: ListState::default(),
            card_lists: Vec::new(),
            new_card_list: None,
        }
    }

    pub fn my_id(&self) -> Option<UserId> {
        self.session.user_id()
    }

    pub fn is_teacher(&self) -> bool {
        self.session.current().is_some_and(|s| s.is_teacher())
    }

    pub fn username(&self) -> String {
        self.session
            .current()
            .and_then(|s| s.username)
            .unwrap_or_else(|| self.config.username.clone())
    }

    /// Flips the theme and writes it to the config file.
    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
        self.config.theme = self.theme;
        match self.config.save(self.ctx.as_ref()) {
            Ok(()) => self.message = format!("{} theme.", self.theme),
            Err(e) => {
                log::warn!("Could not save theme: {:#}", e);
                self.message = format!("{} theme (not saved: {})", self.theme, e);
            }
        }
    }

    // --- COURSES ---

    pub fn selected_board(&self) -> Option<&Board> {
        self.board_list.selected().and_then(|i| self.boards.get(i))
    }

    pub fn set_boards(&mut self, boards: Vec<Board>) {
        self.boards = boards;
        let sel = self.board_list.selected().unwrap_or(0);
        self.board_list.select(if self.boards.is_empty() {
            None
        } else {
            Some(sel.min(self.boards.len() - 1))
        });
    }

    pub fn selected_template(&self) -> Option<&CourseTemplate> {
        self.template_list
            .selected()
            .and_then(|i| self.templates.get(i))
    }

    // --- BOARD ---

    pub fn column_count(&self) -> usize {
        self.board.lists().len()
    }

    pub fn current_list(&self) -> Option<ListId> {
        self.board.lists().get(self.column).map(|l| l.id)
    }

    pub fn column_len(&self) -> usize {
        let Some(list) = self.current_list() else {
            return 0;
        };
        self.board
            .group_by_list()
            .get(&list)
            .map(Vec::len)
            .unwrap_or(0)
    }

    pub fn card_under_cursor(&self) -> Option<&Card> {
        let list = self.current_list()?;
        let grouped = self.board.group_by_list();
        let id = grouped.get(&list)?.get(self.row)?.id;
        self.board.card(id)
    }

    /// Where a drop at the cursor lands: the cursor's row on a card, 0 in an empty column.
    pub fn drop_target(&self) -> Option<(ListId, i64)> {
        let list = self.current_list()?;
        let index = if self.column_len() == 0 { 0 } else { self.row };
        Some((list, index as i64))
    }

    /// Drop position after the last card of the focused column.
    pub fn tail_target(&self) -> Option<(ListId, i64)> {
        let list = self.current_list()?;
        Some((list, self.column_len() as i64))
    }

    /// Keeps the cursor inside the board after data changed.
    pub fn clamp_cursor(&mut self) {
        let cols = self.column_count();
        self.column = if cols == 0 { 0 } else { self.column.min(cols - 1) };
        let len = self.column_len();
        self.row = if len == 0 { 0 } else { self.row.min(len - 1) };
    }

    pub fn move_column(&mut self, delta: isize) {
        let cols = self.column_count();
        if cols == 0 {
            return;
        }
        self.column = self.column.saturating_add_signed(delta).min(cols - 1);
        self.clamp_cursor();
    }

    pub fn move_row(&mut self, delta: isize) {
        let len = self.column_len();
        if len == 0 {
            return;
        }
        self.row = self.row.saturating_add_signed(delta).min(len - 1);
    }

    // --- TASKS ---

    pub fn selected_task(&self) -> Option<&Card> {
        self.task_list.selected().and_then(|i| self.tasks.get(i))
    }

    pub fn set_tasks(&mut self, tasks: Vec<Card>) {
        self.tasks = tasks;
        let sel = self.task_list.selected().unwrap_or(0);
        self.task_list.select(if self.tasks.is_empty() {
            None
        } else {
            Some(sel.min(self.tasks.len() - 1))
        });
    }

    pub fn selected_member(&self) -> Option<&User> {
        self.member_list.selected().and_then(|i| self.members.get(i))
    }

    pub fn set_members(&mut self, members: Vec<User>) {
        self.members = members;
        self.member_list
            .select(if self.members.is_empty() { None } else { Some(0) });
    }

    // --- NEW CARD FORM ---

    pub fn new_card_list_title(&self) -> Option<&str> {
        let id = self.new_card_list?;
        self.card_lists
            .iter()
            .find(|l| l.id == id)
            .map(|l| l.title.as_str())
    }

    /// Stores the lists a new card can go to, keeping the current target
    /// when it is still among them.
    pub fn set_card_lists(&mut self, lists: Vec<CardList>) {
        self.card_lists = lists;
        let keep = self
            .new_card_list
            .is_some_and(|id| self.card_lists.iter().any(|l| l.id == id));
        if !keep {
            self.new_card_list = self.card_lists.first().map(|l| l.id);
        }
    }

    pub fn cycle_new_card_list(&mut self) {
        if self.card_lists.is_empty() {
            return;
        }
        let idx = self
            .new_card_list
            .and_then(|id| self.card_lists.iter().position(|l| l.id == id))
            .map_or(0, |i| (i + 1) % self.card_lists.len());
        self.new_card_list = Some(self.card_lists[idx].id);
    }

    // --- LIST NAVIGATION ---

    pub fn next(&mut self) {
        match self.screen {
            Screen::Courses => step(&mut self.board_list, self.boards.len(), 1),
            Screen::Tasks => step(&mut self.task_list, self.tasks.len(), 1),
            Screen::Board => self.move_row(1),
            Screen::Calendar => self.calendar.move_selection(7),
        }
    }

    pub fn previous(&mut self) {
        match self.screen {
            Screen::Courses => step(&mut self.board_list, self.boards.len(), -1),
            Screen::Tasks => step(&mut self.task_list, self.tasks.len(), -1),
            Screen::Board => self.move_row(-1),
            Screen::Calendar => self.calendar.move_selection(-7),
        }
    }
}

pub fn step(list: &mut ListState, len: usize, delta: isize) {
    if len == 0 {
        list.select(None);
        return;
    }
    let cur = list.selected().unwrap_or(0);
    list.select(Some(cur.saturating_add_signed(delta).min(len - 1)));
}
