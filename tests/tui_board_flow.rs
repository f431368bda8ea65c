#![cfg(feature = "tui")]
// Drives the TUI handlers and the network actor together against a mock server.
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use mockito::{Matcher, Server};
use serde_json::json;
use std::sync::Arc;
use tablero::client::ApiClient;
use tablero::config::{AppTheme, Config};
use tablero::context::{SharedContext, TestContext};
use tablero::model::{Priority, Role};
use tablero::session::{Session, SessionStore};
use tablero::tui::action::{Action, AppEvent, Screen};
use tablero::tui::handlers::{handle_app_event, handle_key_event};
use tablero::tui::network::run_network_actor;
use tablero::tui::state::{AppState, InputMode};
use tokio::sync::mpsc;

fn key(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
}

fn enter() -> KeyEvent {
    KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)
}

fn esc() -> KeyEvent {
    KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)
}

fn type_text(state: &mut AppState, text: &str) {
    for c in text.chars() {
        assert!(handle_key_event(key(c), state).is_none());
    }
}

fn teacher() -> SessionStore {
    SessionStore::with_session(Session {
        access: "tok".to_string(),
        refresh: None,
        role: Some(Role::Teacher),
        username: Some("prof".to_string()),
        user_id: Some(1),
        is_staff: false,
    })
}

fn board_state(session: SessionStore) -> AppState {
    let ctx: SharedContext = Arc::new(TestContext::new());
    let mut state = AppState::new(ctx, Config::default(), session);
    let snapshot = tablero::board::BoardSnapshot::from_parts(
        7,
        serde_json::from_value(json!([
            {"id": 1, "board": 7, "title": "To do", "position": 0},
            {"id": 2, "board": 7, "title": "Done", "position": 1}
        ]))
        .unwrap(),
        serde_json::from_value(json!([
            {"id": 10, "list": 1, "title": "A", "position": 0},
            {"id": 11, "list": 1, "title": "B", "position": 1}
        ]))
        .unwrap(),
    );
    state.board.begin_load(7);
    handle_app_event(&mut state, AppEvent::BoardLoaded(7, Ok(snapshot)));
    state.screen = Screen::Board;
    state
}

fn student() -> SessionStore {
    SessionStore::with_session(Session {
        access: "tok".to_string(),
        refresh: None,
        role: Some(Role::Student),
        username: Some("ana".to_string()),
        user_id: Some(4),
        is_staff: false,
    })
}

#[tokio::test]
async fn test_drag_and_drop_round_trip() {
    let mut server = Server::new_async().await;
    let _boards = server
        .mock("GET", "/api/boards/")
        .with_status(200)
        .with_body(r##"[{"id":7,"name":"Algebra","color":"#0d6efd","members":[]}]"##)
        .create_async()
        .await;
    let _lists = server
        .mock("GET", "/api/lists/")
        .with_status(200)
        .with_body(
            r#"[{"id":1,"board":7,"title":"To do","position":0},
                {"id":2,"board":7,"title":"Done","position":1}]"#,
        )
        .create_async()
        .await;
    let _cards = server
        .mock("GET", "/api/cards/")
        .with_status(200)
        .with_body(
            r#"[{"id":10,"list":1,"title":"A","position":0},
                {"id":11,"list":1,"title":"B","position":1}]"#,
        )
        .create_async()
        .await;
    let m_move = server
        .mock("PATCH", "/api/cards/11/move/")
        .match_body(Matcher::Json(json!({"list": 2, "position": 0})))
        .with_status(200)
        .with_body("{}")
        .expect(1)
        .create_async()
        .await;

    let ctx: SharedContext = Arc::new(TestContext::new());
    let session = student();
    let base = format!("{}/api", server.url());
    let client = ApiClient::new(&base, session.clone(), false).unwrap();
    let mut state = AppState::new(ctx, Config::default(), session);

    let (action_tx, action_rx) = mpsc::channel(10);
    let (event_tx, mut event_rx) = mpsc::channel(10);
    let actor = tokio::spawn(run_network_actor(client, action_rx, event_tx));

    // Courses
    action_tx.send(Action::LoadBoards).await.unwrap();
    let event = event_rx.recv().await.unwrap();
    assert!(matches!(event, AppEvent::BoardsLoaded(ref b) if b.len() == 1));
    assert!(handle_app_event(&mut state, event).is_none());

    // Open the board
    let open = handle_key_event(enter(), &mut state).unwrap();
    assert!(matches!(open, Action::LoadBoard(7)));
    assert_eq!(state.screen, Screen::Board);
    action_tx.send(open).await.unwrap();
    let loaded = event_rx.recv().await.unwrap();
    handle_app_event(&mut state, loaded);
    assert_eq!(state.board.lists().len(), 2);
    assert_eq!(state.board.cards().len(), 2);

    // Pick up card 11 and drop it on the empty second column.
    assert!(handle_key_event(key('j'), &mut state).is_none());
    assert!(handle_key_event(key(' '), &mut state).is_none());
    assert_eq!(state.board.armed().map(|c| c.id), Some(11));
    handle_key_event(key('l'), &mut state);
    assert_eq!(state.drop_target(), Some((2, 0)));

    let dropped = handle_key_event(enter(), &mut state).unwrap();
    assert!(matches!(dropped, Action::MoveCard(p) if p.card == 11 && p.target_list == 2));
    // Nothing moves before the server answers.
    assert_eq!(state.board.card(11).unwrap().list, 1);
    assert!(handle_key_event(enter(), &mut state).is_none());

    action_tx.send(dropped).await.unwrap();
    let finished = event_rx.recv().await.unwrap();
    assert!(matches!(finished, AppEvent::MoveFinished(Ok(()))));
    handle_app_event(&mut state, finished);

    let grouped = state.board.group_by_list();
    assert_eq!(grouped[&1].iter().map(|c| c.id).collect::<Vec<_>>(), vec![10]);
    assert_eq!(grouped[&2].iter().map(|c| c.id).collect::<Vec<_>>(), vec![11]);
    assert!(state.board.pending().is_none());
    m_move.assert_async().await;

    action_tx.send(Action::Quit).await.unwrap();
    actor.await.unwrap();
}

#[tokio::test]
async fn test_failed_move_reports_and_keeps_card() {
    let mut server = Server::new_async().await;
    let _m = server
        .mock("PATCH", "/api/cards/11/move/")
        .with_status(400)
        .with_body(r#"{"detail":"Invalid list"}"#)
        .create_async()
        .await;

    let session = student();
    let base = format!("{}/api", server.url());
    let client = ApiClient::new(&base, session.clone(), false).unwrap();
    let ctx: SharedContext = Arc::new(TestContext::new());
    let mut state = AppState::new(ctx, Config::default(), session);

    let snapshot = tablero::board::BoardSnapshot::from_parts(
        7,
        serde_json::from_value(json!([
            {"id": 1, "board": 7, "title": "To do", "position": 0},
            {"id": 2, "board": 7, "title": "Done", "position": 1}
        ]))
        .unwrap(),
        serde_json::from_value(json!([{"id": 11, "list": 1, "title": "B", "position": 0}]))
            .unwrap(),
    );
    state.board.begin_load(7);
    handle_app_event(&mut state, AppEvent::BoardLoaded(7, Ok(snapshot)));
    state.screen = Screen::Board;

    handle_key_event(key(' '), &mut state);
    handle_key_event(key('l'), &mut state);
    let dropped = handle_key_event(enter(), &mut state).unwrap();

    let (action_tx, action_rx) = mpsc::channel(4);
    let (event_tx, mut event_rx) = mpsc::channel(4);
    let actor = tokio::spawn(run_network_actor(client, action_rx, event_tx));
    action_tx.send(dropped).await.unwrap();
    let finished = event_rx.recv().await.unwrap();
    handle_app_event(&mut state, finished);

    assert_eq!(state.board.card(11).unwrap().list, 1);
    assert!(state.message.contains("Invalid list"));
    assert!(state.board.armed().is_none());

    // Closing the channel stops the actor.
    drop(action_tx);
    actor.await.unwrap();
}

#[test]
fn test_theme_toggle_is_persisted() {
    let ctx: SharedContext = Arc::new(TestContext::new());
    let mut state = AppState::new(ctx.clone(), Config::default(), SessionStore::in_memory());
    assert_eq!(state.theme, AppTheme::Dark);

    handle_key_event(key('t'), &mut state);
    assert_eq!(state.theme, AppTheme::Light);
    assert_eq!(Config::load(ctx.as_ref()).unwrap().theme, AppTheme::Light);
}

#[test]
fn test_students_cannot_open_course_creation() {
    let ctx: SharedContext = Arc::new(TestContext::new());
    let mut state = AppState::new(ctx, Config::default(), student());
    handle_key_event(key('n'), &mut state);
    assert_eq!(state.mode, tablero::tui::state::InputMode::Normal);
    assert!(matches!(
        handle_key_event(key('q'), &mut state),
        Some(Action::Quit)
    ));
}

#[test]
fn test_end_key_drops_after_the_last_card() {
    let ctx: SharedContext = Arc::new(TestContext::new());
    let mut state = AppState::new(ctx, Config::default(), student());
    let snapshot = tablero::board::BoardSnapshot::from_parts(
        7,
        serde_json::from_value(json!([{"id": 1, "board": 7, "title": "To do", "position": 0}]))
            .unwrap(),
        serde_json::from_value(json!([
            {"id": 10, "list": 1, "title": "A", "position": 0},
            {"id": 11, "list": 1, "title": "B", "position": 1}
        ]))
        .unwrap(),
    );
    state.board.begin_load(7);
    handle_app_event(&mut state, AppEvent::BoardLoaded(7, Ok(snapshot)));
    state.screen = Screen::Board;

    handle_key_event(key(' '), &mut state);
    let action = handle_key_event(key('G'), &mut state).unwrap();
    assert!(matches!(
        action,
        Action::MoveCard(p) if p.card == 10 && p.target_list == 1 && p.target_index == 2
    ));
}

#[test]
fn test_space_on_another_card_rearms() {
    let mut state = board_state(student());

    handle_key_event(key(' '), &mut state);
    assert_eq!(state.board.armed().map(|c| c.id), Some(10));
    handle_key_event(key('j'), &mut state);
    handle_key_event(key(' '), &mut state);
    assert_eq!(state.board.armed().map(|c| c.id), Some(11));

    let action = handle_key_event(key('G'), &mut state).unwrap();
    assert!(matches!(
        action,
        Action::MoveCard(p) if p.card == 11 && p.target_list == 1 && p.target_index == 2
    ));
}

#[test]
fn test_space_on_the_armed_card_disarms() {
    let mut state = board_state(student());
    handle_key_event(key(' '), &mut state);
    handle_key_event(key(' '), &mut state);
    assert!(state.board.armed().is_none());
    assert!(handle_key_event(enter(), &mut state).is_none());
}

#[test]
fn test_dated_card_from_the_tasks_screen() {
    let ctx: SharedContext = Arc::new(TestContext::new());
    let mut state = AppState::new(ctx, Config::default(), student());
    state.screen = Screen::Tasks;

    assert!(matches!(handle_key_event(key('n'), &mut state), Some(Action::LoadLists)));
    assert_eq!(state.mode, InputMode::CreatingCard);
    handle_app_event(
        &mut state,
        AppEvent::ListsLoaded(
            serde_json::from_value(json!([
                {"id": 3, "board": 7, "title": "Backlog", "position": 0},
                {"id": 4, "board": 7, "title": "Doing", "position": 1}
            ]))
            .unwrap(),
        ),
    );
    assert_eq!(state.new_card_list, Some(3));
    handle_key_event(KeyEvent::new(KeyCode::Tab, KeyModifiers::NONE), &mut state);
    assert_eq!(state.new_card_list_title(), Some("Doing"));

    type_text(&mut state, "Lab report | 2025-06-01 | high | 3 pages");
    let action = handle_key_event(enter(), &mut state).unwrap();
    let card = match action {
        Action::CreateCard(card) => card,
        other => panic!("expected CreateCard, got {:?}", other),
    };
    assert_eq!(card.list, 4);
    assert_eq!(card.title, "Lab report");
    assert_eq!(card.priority, Priority::High);
    assert_eq!(card.description.as_deref(), Some("3 pages"));
    assert_eq!(
        card.due_date.map(|d| d.date_in(&chrono::Utc).to_string()),
        Some("2025-06-01".to_string())
    );
    assert_eq!(state.mode, InputMode::Normal);
}

#[test]
fn test_bad_new_card_line_is_reported() {
    let mut state = board_state(student());
    handle_key_event(key('n'), &mut state);
    assert_eq!(state.new_card_list, Some(1));

    type_text(&mut state, "Quiz | someday");
    assert!(handle_key_event(enter(), &mut state).is_none());
    assert!(state.message.contains("someday"));

    handle_key_event(key('n'), &mut state);
    type_text(&mut state, "Quiz | | urgent");
    assert!(handle_key_event(enter(), &mut state).is_none());
    assert!(state.message.contains("urgent"));
}

#[test]
fn test_created_course_goes_first() {
    let ctx: SharedContext = Arc::new(TestContext::new());
    let mut state = AppState::new(ctx, Config::default(), teacher());
    handle_app_event(
        &mut state,
        AppEvent::BoardsLoaded(
            serde_json::from_value(json!([
                {"id": 1, "name": "Old", "color": "#0d6efd", "members": []},
                {"id": 2, "name": "Older", "color": "#0d6efd", "members": []}
            ]))
            .unwrap(),
        ),
    );
    handle_key_event(key('j'), &mut state);
    handle_app_event(
        &mut state,
        AppEvent::BoardCreated(
            serde_json::from_value(json!({"id": 3, "name": "New", "color": "#1976d2", "members": []}))
                .unwrap(),
        ),
    );
    assert_eq!(state.boards.iter().map(|b| b.id).collect::<Vec<_>>(), vec![3, 1, 2]);
    assert_eq!(state.selected_board().map(|b| b.id), Some(3));
}

#[test]
fn test_late_answer_for_a_left_board_is_ignored() {
    let ctx: SharedContext = Arc::new(TestContext::new());
    let mut state = AppState::new(ctx, Config::default(), student());
    handle_app_event(
        &mut state,
        AppEvent::BoardsLoaded(
            serde_json::from_value(json!([
                {"id": 7, "name": "Algebra", "color": "#0d6efd", "members": []},
                {"id": 8, "name": "Physics", "color": "#0d6efd", "members": []}
            ]))
            .unwrap(),
        ),
    );
    assert!(matches!(handle_key_event(enter(), &mut state), Some(Action::LoadBoard(7))));
    handle_key_event(key('1'), &mut state);
    handle_key_event(key('j'), &mut state);
    assert!(matches!(handle_key_event(enter(), &mut state), Some(Action::LoadBoard(8))));
    assert_eq!(state.board.loading_board(), Some(8));

    let seven = tablero::board::BoardSnapshot::from_parts(
        7,
        serde_json::from_value(json!([{"id": 1, "board": 7, "title": "To do", "position": 0}]))
            .unwrap(),
        Vec::new(),
    );
    handle_app_event(&mut state, AppEvent::BoardLoaded(7, Ok(seven)));
    assert!(state.board.lists().is_empty());
    assert_eq!(state.board.loading_board(), Some(8));

    // A reload while 8 is in flight asks for 8 again.
    assert!(matches!(handle_key_event(key('r'), &mut state), Some(Action::LoadBoard(8))));

    let eight = tablero::board::BoardSnapshot::from_parts(
        8,
        serde_json::from_value(json!([{"id": 5, "board": 8, "title": "Labs", "position": 0}]))
            .unwrap(),
        Vec::new(),
    );
    handle_app_event(&mut state, AppEvent::BoardLoaded(8, Ok(eight)));
    assert_eq!(state.board.board_id(), Some(8));
    assert_eq!(state.board.lists()[0].title, "Labs");
}

#[test]
fn test_saved_assignees_reach_every_copy() {
    let mut state = board_state(student());
    let card = state.board.card(10).cloned().unwrap();
    state.calendar.set_cards(vec![card.clone()]);
    state.set_tasks(vec![card.clone()]);

    let mut draft = tablero::tasks::AssignDraft::for_card(&card);
    draft.toggle(4);
    draft.toggle(5);
    handle_app_event(&mut state, AppEvent::AssigneesSaved(draft));

    assert_eq!(state.board.card(10).unwrap().assignees, vec![4, 5]);
    assert_eq!(state.calendar.cards()[0].assignees, vec![4, 5]);
    assert_eq!(state.tasks[0].assignees, vec![4, 5]);
}

#[tokio::test]
async fn test_member_picker_saves_the_chosen_members() {
    let mut server = Server::new_async().await;
    let _lists = server
        .mock("GET", "/api/lists/")
        .with_status(200)
        .with_body(r#"[{"id":1,"board":7,"title":"To do","position":0}]"#)
        .create_async()
        .await;
    let _members = server
        .mock("GET", "/api/boards/7/members/")
        .with_status(200)
        .with_body(r#"[{"id":4,"username":"ana"},{"id":5,"username":"ben"}]"#)
        .create_async()
        .await;
    let m_save = server
        .mock("PATCH", "/api/cards/10/")
        .match_body(Matcher::Json(json!({"assignees": [5]})))
        .with_status(200)
        .with_body("{}")
        .expect(1)
        .create_async()
        .await;

    let session = student();
    let base = format!("{}/api", server.url());
    let client = ApiClient::new(&base, session.clone(), false).unwrap();
    let ctx: SharedContext = Arc::new(TestContext::new());
    let mut state = AppState::new(ctx, Config::default(), session);
    state.screen = Screen::Tasks;
    state.set_tasks(
        serde_json::from_value(json!([
            {"id": 10, "list": 1, "title": "A", "position": 0, "assignees": [4]}
        ]))
        .unwrap(),
    );

    let (action_tx, action_rx) = mpsc::channel(4);
    let (event_tx, mut event_rx) = mpsc::channel(4);
    let actor = tokio::spawn(run_network_actor(client, action_rx, event_tx));

    let load = handle_key_event(key('a'), &mut state).unwrap();
    assert!(matches!(
        load,
        Action::LoadMembers { card: 10, list: 1, board: None }
    ));
    assert_eq!(state.mode, InputMode::PickingAssignees);
    action_tx.send(load).await.unwrap();
    let loaded = event_rx.recv().await.unwrap();
    handle_app_event(&mut state, loaded);
    assert_eq!(state.members.len(), 2);

    // Drop ana (me), add ben.
    handle_key_event(key('m'), &mut state);
    handle_key_event(key('j'), &mut state);
    handle_key_event(key(' '), &mut state);
    let save = handle_key_event(enter(), &mut state).unwrap();
    assert!(matches!(save, Action::SaveAssignees(ref d) if d.assignees == vec![5]));
    assert_eq!(state.mode, InputMode::Normal);

    action_tx.send(save).await.unwrap();
    let saved = event_rx.recv().await.unwrap();
    handle_app_event(&mut state, saved);
    assert_eq!(state.tasks[0].assignees, vec![5]);
    m_save.assert_async().await;

    // Esc leaves the picker without saving.
    handle_key_event(key('a'), &mut state);
    assert!(handle_key_event(esc(), &mut state).is_none());
    assert_eq!(state.mode, InputMode::Normal);
    assert!(state.assign.is_none());

    drop(action_tx);
    actor.await.unwrap();
}

#[tokio::test]
async fn test_teacher_creates_a_course_from_a_template() {
    let mut server = Server::new_async().await;
    let _templates = server
        .mock("GET", "/api/default-courses/")
        .with_status(200)
        .with_body(
            r#"[{"id":1,"code":"MAT101","name":"Calculus I","room":"A1"},
                {"id":2,"code":"PHY110","name":"Physics","room":null}]"#,
        )
        .create_async()
        .await;
    let m_create = server
        .mock("POST", "/api/boards/")
        .match_body(Matcher::Json(json!({"name": "Physics", "color": "#1976d2"})))
        .with_status(201)
        .with_body(r##"{"id":9,"name":"Physics","color":"#1976d2","members":[]}"##)
        .expect(1)
        .create_async()
        .await;

    let session = teacher();
    let base = format!("{}/api", server.url());
    let client = ApiClient::new(&base, session.clone(), false).unwrap();
    let ctx: SharedContext = Arc::new(TestContext::new());
    let mut state = AppState::new(ctx, Config::default(), session);

    let (action_tx, action_rx) = mpsc::channel(4);
    let (event_tx, mut event_rx) = mpsc::channel(4);
    let actor = tokio::spawn(run_network_actor(client, action_rx, event_tx));

    let load = handle_key_event(key('p'), &mut state).unwrap();
    assert!(matches!(load, Action::LoadTemplates));
    action_tx.send(load).await.unwrap();
    let loaded = event_rx.recv().await.unwrap();
    handle_app_event(&mut state, loaded);
    assert_eq!(state.mode, InputMode::PickingTemplate);
    assert_eq!(state.templates[1].room, "");

    handle_key_event(key('j'), &mut state);
    let create = handle_key_event(enter(), &mut state).unwrap();
    assert_eq!(state.mode, InputMode::Normal);
    action_tx.send(create).await.unwrap();
    let created = event_rx.recv().await.unwrap();
    handle_app_event(&mut state, created);
    assert_eq!(state.boards[0].name, "Physics");
    m_create.assert_async().await;

    drop(action_tx);
    actor.await.unwrap();
}

#[test]
fn test_students_cannot_open_templates() {
    let ctx: SharedContext = Arc::new(TestContext::new());
    let mut state = AppState::new(ctx, Config::default(), student());
    assert!(handle_key_event(key('p'), &mut state).is_none());
    assert_eq!(state.mode, InputMode::Normal);
}
