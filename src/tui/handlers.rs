// File: src/tui/handlers.rs
// Handles keyboard input and network events for the TUI.
use crate::board::MoveOutcome;
use crate::client::ApiError;
use crate::model::{ListId, NewBoard};
use crate::tasks::{AssignDraft, NewCardForm};
use crate::tui::action::{Action, AppEvent, Screen};
use crate::tui::state::{AppState, InputMode, step};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

fn report(state: &mut AppState, err: &ApiError) {
    state.loading = false;
    state.message = if matches!(err, ApiError::Unauthorized { .. })
        && !state.session.is_authenticated()
    {
        "Session expired. Quit and run `tablero login`.".to_string()
    } else {
        format!("Error: {}", err.user_message())
    };
}

/// Applies a network answer. Returns a follow-up request when the event
/// invalidates data on screen.
pub fn handle_app_event(state: &mut AppState, event: AppEvent) -> Option<Action> {
    match event {
        AppEvent::Status(s) => state.message = s,
        AppEvent::Error(e) => report(state, &e),

        AppEvent::BoardsLoaded(boards) => {
            state.message = format!("{} courses.", boards.len());
            state.set_boards(boards);
            state.loading = false;
        }
        AppEvent::TemplatesLoaded(templates) => {
            state.loading = false;
            state.templates = templates;
            if state.templates.is_empty() {
                state.message = "No course templates available.".to_string();
            } else if state.mode == InputMode::Normal {
                state.template_list.select(Some(0));
                state.mode = InputMode::PickingTemplate;
                state.message = format!("{} course templates.", state.templates.len());
            }
        }
        AppEvent::BoardCreated(board) => {
            state.message = format!("Created '{}'.", board.name);
            state.boards.insert(0, board);
            state.board_list.select(Some(0));
        }

        AppEvent::BoardLoaded(board, result) => {
            // A slower answer for a board we already left.
            if state.board.loading_board() != Some(board) {
                return None;
            }
            match state.board.apply_load(result) {
                Ok(()) => {
                    state.message = format!(
                        "{} lists, {} cards.",
                        state.board.lists().len(),
                        state.board.cards().len()
                    );
                }
                Err(e) => state.message = e.to_string(),
            }
            state.clamp_cursor();
            state.loading = false;
        }

        AppEvent::MoveFinished(result) => match state.board.finish_move(result) {
            MoveOutcome::Applied(pending) => {
                state.message = format!("Moved to position {}.", pending.target_index);
                state.clamp_cursor();
            }
            MoveOutcome::Failed(_, e) => state.message = e.to_string(),
            MoveOutcome::NoPending => {}
        },

        AppEvent::CalendarLoaded(cards) => {
            let due = cards.iter().filter(|c| c.due_date.is_some()).count();
            state.calendar.set_cards(cards);
            state.message = format!("{} cards with a due date.", due);
            state.loading = false;
        }

        AppEvent::TasksLoaded(cards) => {
            state.message = format!(
                "{} tasks ({}, {}).",
                cards.len(),
                state.task_filter.assignee,
                state.task_filter.due
            );
            state.set_tasks(cards);
            state.loading = false;
        }

        AppEvent::ListsLoaded(lists) => {
            state.loading = false;
            state.set_card_lists(lists);
            if state.mode == InputMode::CreatingCard && state.new_card_list.is_none() {
                state.message = "There is no list to put a card in.".to_string();
            }
        }

        AppEvent::MembersLoaded(card, members) => {
            state.loading = false;
            if state.assign.as_ref().is_some_and(|d| d.card == card) {
                state.message = if members.is_empty() {
                    "No board members found; m toggles yourself.".to_string()
                } else {
                    format!("{} members.", members.len())
                };
                state.set_members(members);
            }
        }

        AppEvent::AssigneesSaved(draft) => {
            draft.apply_to(&mut state.tasks);
            state.board.set_assignees(draft.card, &draft.assignees);
            state.calendar.set_assignees(draft.card, &draft.assignees);
            state.message = "Assignees saved.".to_string();
        }

        AppEvent::CardCreated(card) => {
            state.message = format!("Created '{}'.", card.title);
            let on_board = state.board.lists().iter().any(|l| l.id == card.list);
            state.tasks.insert(0, card);
            if on_board {
                return reload_action(state, Screen::Board);
            }
        }
    }
    None
}

/// Action that refreshes the data behind `screen`.
pub fn reload_action(state: &mut AppState, screen: Screen) -> Option<Action> {
    state.loading = true;
    match screen {
        Screen::Courses => Some(Action::LoadBoards),
        Screen::Board => match state.board.target_board() {
            Some(id) => {
                state.board.begin_load(id);
                Some(Action::LoadBoard(id))
            }
            None => {
                state.loading = false;
                state.message = "Pick a course first.".to_string();
                None
            }
        },
        Screen::Calendar => Some(Action::LoadCalendar),
        Screen::Tasks => Some(Action::LoadTasks(state.task_filter)),
    }
}

fn switch_to(state: &mut AppState, screen: Screen) -> Option<Action> {
    if state.screen == screen {
        return None;
    }
    state.screen = screen;
    match screen {
        Screen::Calendar if state.calendar.cards().is_empty() => reload_action(state, screen),
        Screen::Tasks if state.tasks.is_empty() => reload_action(state, screen),
        _ => None,
    }
}

fn submit_card(state: &mut AppState, text: &str) -> Option<Action> {
    let card = NewCardForm::from_input(state.new_card_list, text).and_then(|f| f.validate());
    match card {
        Ok(card) => {
            state.message = format!("Creating '{}'...", card.title);
            Some(Action::CreateCard(card))
        }
        Err(msg) => {
            state.message = msg;
            None
        }
    }
}

fn handle_input(key: KeyEvent, state: &mut AppState) -> Option<Action> {
    match key.code {
        KeyCode::Esc => {
            state.mode = InputMode::Normal;
            state.input_buffer.clear();
            None
        }
        KeyCode::Backspace => {
            state.input_buffer.pop();
            None
        }
        KeyCode::Tab if state.mode == InputMode::CreatingCard => {
            state.cycle_new_card_list();
            None
        }
        KeyCode::Char(c) => {
            state.input_buffer.push(c);
            None
        }
        KeyCode::Enter => {
            let text = std::mem::take(&mut state.input_buffer);
            let mode = state.mode;
            state.mode = InputMode::Normal;
            let text = text.trim();
            if text.is_empty() {
                return None;
            }
            match mode {
                InputMode::CreatingBoard => Some(Action::CreateBoard(NewBoard::named(text))),
                InputMode::Inviting => state
                    .selected_board()
                    .map(|b| Action::InviteMember(b.id, text.to_string())),
                InputMode::CreatingCard => submit_card(state, text),
                _ => None,
            }
        }
        _ => None,
    }
}

fn handle_template_key(key: KeyEvent, state: &mut AppState) -> Option<Action> {
    match key.code {
        KeyCode::Esc => state.mode = InputMode::Normal,
        KeyCode::Char('j') | KeyCode::Down => {
            step(&mut state.template_list, state.templates.len(), 1)
        }
        KeyCode::Char('k') | KeyCode::Up => {
            step(&mut state.template_list, state.templates.len(), -1)
        }
        KeyCode::Enter => {
            let board = NewBoard::from_template(state.selected_template()?);
            state.mode = InputMode::Normal;
            state.message = format!("Creating '{}'...", board.name);
            return Some(Action::CreateBoard(board));
        }
        _ => {}
    }
    None
}

fn handle_assign_key(key: KeyEvent, state: &mut AppState) -> Option<Action> {
    match key.code {
        KeyCode::Esc => {
            state.assign = None;
            state.mode = InputMode::Normal;
        }
        KeyCode::Char('j') | KeyCode::Down => step(&mut state.member_list, state.members.len(), 1),
        KeyCode::Char('k') | KeyCode::Up => step(&mut state.member_list, state.members.len(), -1),
        KeyCode::Char(' ') => {
            let user = state.selected_member()?.id;
            if let Some(draft) = state.assign.as_mut() {
                draft.toggle(user);
            }
        }
        KeyCode::Char('m') => {
            let me = state.my_id()?;
            if let Some(draft) = state.assign.as_mut() {
                draft.toggle(me);
            }
        }
        KeyCode::Enter => {
            let draft = state.assign.take()?;
            state.mode = InputMode::Normal;
            state.message = format!("Saving {} assignees...", draft.assignees.len());
            return Some(Action::SaveAssignees(draft));
        }
        _ => {}
    }
    None
}

fn drop_at(state: &mut AppState, target: Option<(ListId, i64)>) -> Option<Action> {
    if state.board.pending().is_some() {
        state.message = "Previous move still in flight.".to_string();
        return None;
    }
    let (list, index) = target?;
    let pending = state.board.begin_move(list, index)?;
    state.message = "Moving...".to_string();
    Some(Action::MoveCard(pending))
}

fn handle_board_key(key: KeyEvent, state: &mut AppState) -> Option<Action> {
    match key.code {
        KeyCode::Char('h') | KeyCode::Left => state.move_column(-1),
        KeyCode::Char('l') | KeyCode::Right => state.move_column(1),
        KeyCode::Char(' ') => {
            let under = state.card_under_cursor().map(|c| c.id);
            let armed = state.board.armed().map(|c| c.id);
            match under {
                Some(id) if armed == Some(id) => {
                    state.board.disarm();
                    state.message = "Put the card back.".to_string();
                }
                Some(id) => {
                    if state.board.arm(id) {
                        state.board.clear_error();
                        state.message =
                            "Picked up card. Move and press Enter to drop.".to_string();
                    }
                }
                None if armed.is_some() => {
                    state.board.disarm();
                    state.message = "Put the card back.".to_string();
                }
                None => {}
            }
        }
        KeyCode::Enter => {
            let target = state.drop_target();
            return drop_at(state, target);
        }
        KeyCode::End | KeyCode::Char('G') => {
            let target = state.tail_target();
            return drop_at(state, target);
        }
        KeyCode::Char('n') => {
            if state.current_list().is_some() {
                state.card_lists = state.board.lists().to_vec();
                state.new_card_list = state.current_list();
                state.mode = InputMode::CreatingCard;
                state.input_buffer.clear();
            }
        }
        _ => {}
    }
    None
}

fn handle_calendar_key(key: KeyEvent, state: &mut AppState) -> Option<Action> {
    match key.code {
        KeyCode::Char('h') | KeyCode::Left => state.calendar.move_selection(-1),
        KeyCode::Char('l') | KeyCode::Right => state.calendar.move_selection(1),
        KeyCode::Char('[') => state.calendar.prev_month(),
        KeyCode::Char(']') => state.calendar.next_month(),
        _ => {}
    }
    None
}

fn handle_courses_key(key: KeyEvent, state: &mut AppState) -> Option<Action> {
    match key.code {
        KeyCode::Enter => {
            let id = state.selected_board()?.id;
            state.board = Default::default();
            state.board.begin_load(id);
            state.column = 0;
            state.row = 0;
            state.screen = Screen::Board;
            state.loading = true;
            Some(Action::LoadBoard(id))
        }
        KeyCode::Char('n') if state.is_teacher() => {
            state.mode = InputMode::CreatingBoard;
            state.input_buffer.clear();
            None
        }
        KeyCode::Char('p') if state.is_teacher() => {
            state.loading = true;
            state.message = "Loading course templates...".to_string();
            Some(Action::LoadTemplates)
        }
        KeyCode::Char('i') if state.is_teacher() && state.selected_board().is_some() => {
            state.mode = InputMode::Inviting;
            state.input_buffer.clear();
            None
        }
        _ => None,
    }
}

fn handle_tasks_key(key: KeyEvent, state: &mut AppState) -> Option<Action> {
    match key.code {
        KeyCode::Char('f') => {
            state.task_filter.assignee = state.task_filter.assignee.cycle();
            reload_action(state, Screen::Tasks)
        }
        KeyCode::Char('d') => {
            state.task_filter.due = state.task_filter.due.cycle();
            reload_action(state, Screen::Tasks)
        }
        KeyCode::Char('a') => {
            let card = state.selected_task()?;
            let (id, list, board) = (card.id, card.list, card.board);
            state.assign = Some(AssignDraft::for_card(card));
            state.set_members(Vec::new());
            state.mode = InputMode::PickingAssignees;
            state.loading = true;
            state.message = "Loading board members...".to_string();
            Some(Action::LoadMembers {
                card: id,
                list,
                board,
            })
        }
        KeyCode::Char('n') => {
            state.mode = InputMode::CreatingCard;
            state.input_buffer.clear();
            state.loading = true;
            Some(Action::LoadLists)
        }
        _ => None,
    }
}

pub fn handle_key_event(key: KeyEvent, state: &mut AppState) -> Option<Action> {
    match state.mode {
        InputMode::Normal => {}
        InputMode::PickingTemplate => return handle_template_key(key, state),
        InputMode::PickingAssignees => return handle_assign_key(key, state),
        _ => return handle_input(key, state),
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Action::Quit);
    }

    match key.code {
        KeyCode::Char('q') => return Some(Action::Quit),
        KeyCode::Char('1') => return switch_to(state, Screen::Courses),
        KeyCode::Char('2') => return switch_to(state, Screen::Board),
        KeyCode::Char('3') => return switch_to(state, Screen::Calendar),
        KeyCode::Char('4') => return switch_to(state, Screen::Tasks),
        KeyCode::Tab => return switch_to(state, state.screen.next()),
        KeyCode::Char('t') => {
            state.toggle_theme();
            return None;
        }
        KeyCode::Char('r') => return reload_action(state, state.screen),
        KeyCode::Char('j') | KeyCode::Down => {
            state.next();
            return None;
        }
        KeyCode::Char('k') | KeyCode::Up => {
            state.previous();
            return None;
        }
        _ => {}
    }

    match state.screen {
        Screen::Courses => handle_courses_key(key, state),
        Screen::Board => handle_board_key(key, state),
        Screen::Calendar => handle_calendar_key(key, state),
        Screen::Tasks => handle_tasks_key(key, state),
    }
}
