// Board loading, grouping and the two-phase card move.
use http::StatusCode;
use std::sync::Mutex;
use tablero::board::{BoardApi, BoardError, BoardReconciler, BoardSnapshot, MoveOutcome};
use tablero::client::ApiError;
use tablero::model::{Card, CardId, CardList, ListId, Priority};

fn list(id: ListId, board: i64, position: i64) -> CardList {
    CardList {
        id,
        board,
        title: format!("List {}", id),
        position,
    }
}

fn card(id: CardId, list: ListId, position: i64) -> Card {
    Card {
        id,
        list,
        title: format!("Card {}", id),
        description: String::new(),
        position,
        due_date: None,
        priority: Priority::Low,
        assignees: vec![],
        created_by: None,
        board: None,
    }
}

fn server_error() -> ApiError {
    ApiError::Status {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: "boom".to_string(),
    }
}

struct FakeApi {
    lists: Result<Vec<CardList>, ApiError>,
    cards: Result<Vec<Card>, ApiError>,
    fail_moves: bool,
    moves: Mutex<Vec<(CardId, ListId, i64)>>,
}

impl FakeApi {
    fn new(lists: Vec<CardList>, cards: Vec<Card>) -> Self {
        Self {
            lists: Ok(lists),
            cards: Ok(cards),
            fail_moves: false,
            moves: Mutex::new(vec![]),
        }
    }

    fn sent_moves(&self) -> Vec<(CardId, ListId, i64)> {
        self.moves.lock().unwrap().clone()
    }
}

impl BoardApi for FakeApi {
    async fn fetch_lists(&self) -> Result<Vec<CardList>, ApiError> {
        self.lists.clone()
    }

    async fn fetch_cards(&self) -> Result<Vec<Card>, ApiError> {
        self.cards.clone()
    }

    async fn move_card(&self, card: CardId, list: ListId, position: i64) -> Result<(), ApiError> {
        self.moves.lock().unwrap().push((card, list, position));
        if self.fail_moves {
            Err(server_error())
        } else {
            Ok(())
        }
    }
}

fn scenario_api() -> FakeApi {
    FakeApi::new(
        vec![list(1, 7, 0), list(2, 7, 1)],
        vec![card(10, 1, 0), card(11, 1, 1)],
    )
}

fn ids(cards: &[&Card]) -> Vec<CardId> {
    cards.iter().map(|c| c.id).collect()
}

#[tokio::test]
async fn load_filters_other_boards_and_sorts_lists() {
    let api = FakeApi::new(
        vec![list(3, 7, 5), list(1, 7, 0), list(9, 8, 0), list(2, 7, 2)],
        vec![card(10, 1, 0), card(20, 9, 0), card(30, 3, 0), card(40, 99, 0)],
    );
    let mut board = BoardReconciler::new();
    board.load(&api, 7).await.unwrap();

    let list_ids: Vec<ListId> = board.lists().iter().map(|l| l.id).collect();
    assert_eq!(list_ids, vec![1, 2, 3]);
    let mut card_ids: Vec<CardId> = board.cards().iter().map(|c| c.id).collect();
    card_ids.sort();
    assert_eq!(card_ids, vec![10, 30]);
    assert_eq!(board.board_id(), Some(7));
    assert!(!board.is_loading());
    assert!(board.error().is_none());
}

#[tokio::test]
async fn group_by_list_has_one_sorted_entry_per_list() {
    let api = FakeApi::new(
        vec![list(1, 7, 0), list(2, 7, 1), list(3, 7, 2)],
        vec![
            card(10, 1, 4),
            card(11, 1, 0),
            card(12, 2, 3),
            card(13, 1, 2),
            card(14, 2, 3),
            card(15, 2, 1),
        ],
    );
    let mut board = BoardReconciler::new();
    board.load(&api, 7).await.unwrap();
    let grouped = board.group_by_list();

    assert_eq!(grouped.len(), 3);
    for (list_id, cards) in &grouped {
        assert!(cards.iter().all(|c| c.list == *list_id));
        assert!(cards.windows(2).all(|w| w[0].position <= w[1].position));
    }
    assert_eq!(ids(&grouped[&1]), vec![11, 13, 10]);
    // Equal positions keep input order.
    assert_eq!(ids(&grouped[&2]), vec![15, 12, 14]);
    // Empty list is present, not absent.
    assert!(grouped[&3].is_empty());

    let columns = board.columns();
    assert_eq!(columns.len(), 3);
    assert_eq!(columns[2].list.id, 3);
    assert!(columns[2].cards.is_empty());
}

#[tokio::test]
async fn moving_a_card_to_another_list() {
    let api = scenario_api();
    let mut board = BoardReconciler::new();
    board.load(&api, 7).await.unwrap();

    let outcome = board.move_card(&api, 11, 2, 0).await.unwrap();
    assert!(outcome.is_applied());
    assert_eq!(api.sent_moves(), vec![(11, 2, 0)]);

    let grouped = board.group_by_list();
    assert_eq!(ids(&grouped[&1]), vec![10]);
    assert_eq!(ids(&grouped[&2]), vec![11]);
    let moved = board.card(11).unwrap();
    assert_eq!((moved.list, moved.position), (2, 0));
    assert!(board.armed().is_none());
    assert!(board.pending().is_none());
}

#[tokio::test]
async fn failed_cards_fetch_applies_nothing() {
    let mut api = scenario_api();
    api.cards = Err(server_error());
    let mut board = BoardReconciler::new();

    let err = board.load(&api, 7).await.unwrap_err();
    assert!(matches!(err, BoardError::Load(_)));
    assert!(board.lists().is_empty());
    assert!(board.cards().is_empty());
    assert!(board.group_by_list().is_empty());
    assert!(matches!(board.error(), Some(BoardError::Load(_))));
    assert!(err.to_string().contains("Could not load the board"));
}

#[tokio::test]
async fn failed_reload_keeps_previous_data() {
    let mut api = scenario_api();
    let mut board = BoardReconciler::new();
    board.load(&api, 7).await.unwrap();

    api.lists = Err(ApiError::Transport("connection refused".to_string()));
    assert!(board.load(&api, 7).await.is_err());
    assert_eq!(board.lists().len(), 2);
    assert_eq!(board.cards().len(), 2);
    assert!(board.error().is_some());

    api.lists = Ok(vec![list(1, 7, 0), list(2, 7, 1)]);
    board.load(&api, 7).await.unwrap();
    assert!(board.error().is_none());
}

#[tokio::test]
async fn failed_load_of_another_board_keeps_the_shown_board() {
    let mut api = scenario_api();
    let mut board = BoardReconciler::new();
    board.load(&api, 7).await.unwrap();

    api.cards = Err(server_error());
    board.begin_load(8);
    assert_eq!(board.board_id(), Some(7));
    assert_eq!(board.loading_board(), Some(8));
    assert_eq!(board.target_board(), Some(8));

    let result = BoardSnapshot::fetch(&api, 8).await;
    assert!(board.apply_load(result).is_err());
    assert_eq!(board.board_id(), Some(7));
    assert_eq!(board.loading_board(), None);
    assert_eq!(board.lists().len(), 2);
    assert!(board.lists().iter().all(|l| l.board == 7));
}

#[tokio::test]
async fn pending_move_is_not_visible_as_applied() {
    let api = scenario_api();
    let mut board = BoardReconciler::new();
    board.load(&api, 7).await.unwrap();

    assert!(board.arm(11));
    let pending = board.begin_move(2, 0).unwrap();
    assert_eq!((pending.card, pending.target_list, pending.target_index), (11, 2, 0));

    // In flight: arm consumed, card untouched.
    assert!(board.armed().is_none());
    assert_eq!(board.pending(), Some(&pending));
    let card = board.card(11).unwrap();
    assert_eq!((card.list, card.position), (1, 1));
    assert_eq!(ids(&board.group_by_list()[&1]), vec![10, 11]);

    let outcome = board.finish_move(Ok(()));
    assert!(matches!(outcome, MoveOutcome::Applied(p) if p == pending));
    assert_eq!(board.card(11).unwrap().list, 2);
}

#[tokio::test]
async fn failed_move_leaves_state_untouched() {
    let mut api = scenario_api();
    api.fail_moves = true;
    let mut board = BoardReconciler::new();
    board.load(&api, 7).await.unwrap();
    let before = board.cards().to_vec();

    let outcome = board.move_card(&api, 11, 2, 0).await.unwrap();
    assert!(matches!(outcome, MoveOutcome::Failed(_, BoardError::Move(_))));
    assert_eq!(board.cards(), before.as_slice());
    assert!(board.armed().is_none());
    assert!(board.pending().is_none());
    assert!(matches!(board.error(), Some(BoardError::Move(_))));
}

#[tokio::test]
async fn drop_without_armed_card_is_a_no_op() {
    let api = scenario_api();
    let mut board = BoardReconciler::new();
    board.load(&api, 7).await.unwrap();

    assert!(board.drop_armed(&api, 2, 0).await.is_none());
    assert!(board.begin_move(2, 0).is_none());
    assert!(api.sent_moves().is_empty());
    assert!(matches!(board.finish_move(Ok(())), MoveOutcome::NoPending));
}

#[tokio::test]
async fn arming_replaces_the_previous_card() {
    let api = scenario_api();
    let mut board = BoardReconciler::new();
    board.load(&api, 7).await.unwrap();

    assert!(board.arm(10));
    assert!(board.arm(11));
    assert_eq!(board.armed().map(|c| c.id), Some(11));
    assert!(!board.arm(999));
    assert_eq!(board.armed().map(|c| c.id), Some(11));

    board.drop_armed(&api, 2, 0).await.unwrap();
    assert_eq!(api.sent_moves(), vec![(11, 2, 0)]);

    board.arm(10);
    board.disarm();
    assert!(board.armed().is_none());
}

#[tokio::test]
async fn repeated_moves_settle_on_the_arguments() {
    let api = scenario_api();
    let mut board = BoardReconciler::new();
    board.load(&api, 7).await.unwrap();

    for _ in 0..3 {
        board.move_card(&api, 10, 2, 1).await.unwrap();
        let c = board.card(10).unwrap();
        assert_eq!((c.list, c.position), (2, 1));
    }
    assert_eq!(api.sent_moves().len(), 3);
    assert_eq!(board.cards().len(), 2);
}

#[tokio::test]
async fn drop_index_is_not_clamped() {
    let api = scenario_api();
    let mut board = BoardReconciler::new();
    board.load(&api, 7).await.unwrap();

    board.move_card(&api, 10, 2, 42).await.unwrap();
    assert_eq!(api.sent_moves(), vec![(10, 2, 42)]);
    assert_eq!(board.card(10).unwrap().position, 42);
    // Siblings keep their positions.
    assert_eq!(board.card(11).unwrap().position, 1);
}

#[test]
fn snapshot_apply_is_all_or_nothing() {
    let snapshot = BoardSnapshot::from_parts(
        7,
        vec![list(2, 7, 1), list(1, 7, 0)],
        vec![card(10, 1, 0), card(20, 5, 0)],
    );
    assert_eq!(snapshot.lists[0].id, 1);
    assert_eq!(snapshot.cards.len(), 1);

    let mut board = BoardReconciler::new();
    board.begin_load(7);
    assert!(board.is_loading());
    board.apply_load(Ok(snapshot)).unwrap();
    assert_eq!(board.lists().len(), 2);

    assert!(board.apply_load(Err(server_error())).is_err());
    assert_eq!(board.lists().len(), 2);
    assert_eq!(board.cards().len(), 1);
}
