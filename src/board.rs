// File: ./src/board.rs
/*! Local state of one board: its lists, its cards and card moves.

The reconciler is a read-through copy of server data. `load` rebuilds it
from two concurrent fetches; a successful move patches the moved card in
place without re-fetching. Moves go through two explicit phases:

1. `begin_move` takes the armed card and records a `PendingMove`. Card data
   is untouched.
2. `finish_move` receives the server's answer and either applies the new
   `(list, position)` or records the failure.
*/

use crate::client::ApiError;
use crate::model::{BoardId, Card, CardId, CardList, ListId, UserId};
use std::collections::{BTreeMap, HashSet};
use std::future::Future;
use thiserror::Error;

/// What the reconciler needs from the backend.
pub trait BoardApi {
    fn fetch_lists(&self) -> impl Future<Output = Result<Vec<CardList>, ApiError>> + Send;
    fn fetch_cards(&self) -> impl Future<Output = Result<Vec<Card>, ApiError>> + Send;
    fn move_card(
        &self,
        card: CardId,
        list: ListId,
        position: i64,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;
}

#[derive(Debug, Clone, Error)]
pub enum BoardError {
    #[error("Could not load the board: {}", .0.user_message())]
    Load(#[source] ApiError),
    #[error("Could not move the card: {}", .0.user_message())]
    Move(#[source] ApiError),
}

/// Lists and cards of one board, already filtered and ordered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardSnapshot {
    pub board: BoardId,
    pub lists: Vec<CardList>,
    pub cards: Vec<Card>,
}

impl BoardSnapshot {
    /// Keeps the lists of `board` (sorted by position) and the cards living in them.
    pub fn from_parts(board: BoardId, lists: Vec<CardList>, cards: Vec<Card>) -> Self {
        let mut lists: Vec<CardList> = lists.into_iter().filter(|l| l.board == board).collect();
        lists.sort_by_key(|l| l.position);

        let ids: HashSet<ListId> = lists.iter().map(|l| l.id).collect();
        let cards = cards.into_iter().filter(|c| ids.contains(&c.list)).collect();

        Self {
            board,
            lists,
            cards,
        }
    }

    /// Fetches lists and cards concurrently. Either failure fails the whole fetch.
    pub async fn fetch<A: BoardApi>(api: &A, board: BoardId) -> Result<Self, ApiError> {
        let (lists, cards) = tokio::try_join!(api.fetch_lists(), api.fetch_cards())?;
        Ok(Self::from_parts(board, lists, cards))
    }
}

/// A move sent to the server and not answered yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingMove {
    pub card: CardId,
    pub target_list: ListId,
    pub target_index: i64,
}

#[derive(Debug, Clone)]
pub enum MoveOutcome {
    Applied(PendingMove),
    Failed(PendingMove, BoardError),
    /// An answer arrived with no move in flight.
    NoPending,
}

impl MoveOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, MoveOutcome::Applied(_))
    }
}

/// One rendered column.
#[derive(Debug, Clone)]
pub struct Column<'a> {
    pub list: &'a CardList,
    pub cards: Vec<&'a Card>,
}

#[derive(Debug, Default)]
pub struct BoardReconciler {
    board: Option<BoardId>,
    /// Board of the fetch in flight, committed to `board` on success.
    loading_board: Option<BoardId>,
    lists: Vec<CardList>,
    cards: Vec<Card>,
    armed: Option<CardId>,
    pending: Option<PendingMove>,
    error: Option<BoardError>,
    loading: bool,
}

impl BoardReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Board whose data is on display.
    pub fn board_id(&self) -> Option<BoardId> {
        self.board
    }

    pub fn loading_board(&self) -> Option<BoardId> {
        self.loading_board
    }

    /// Board being loaded, else the one on display.
    pub fn target_board(&self) -> Option<BoardId> {
        self.loading_board.or(self.board)
    }

    pub fn lists(&self) -> &[CardList] {
        &self.lists
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn card(&self, id: CardId) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == id)
    }

    pub fn error(&self) -> Option<&BoardError> {
        self.error.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    // --- LOADING ---

    /// Marks a load of `board` as started. The previous data, and its board
    /// id, stay in place until the fetch succeeds.
    pub fn begin_load(&mut self, board: BoardId) {
        self.loading_board = Some(board);
        self.loading = true;
        self.error = None;
    }

    /// Applies the result of a fetch. Lists and cards are replaced together
    /// or not at all.
    pub fn apply_load(&mut self, result: Result<BoardSnapshot, ApiError>) -> Result<(), BoardError> {
        self.loading = false;
        self.loading_board = None;
        match result {
            Ok(snapshot) => {
                log::debug!(
                    "Board {} loaded: {} lists, {} cards",
                    snapshot.board,
                    snapshot.lists.len(),
                    snapshot.cards.len()
                );
                self.board = Some(snapshot.board);
                self.lists = snapshot.lists;
                self.cards = snapshot.cards;
                self.error = None;
                if let Some(armed) = self.armed
                    && self.card(armed).is_none()
                {
                    self.armed = None;
                }
                Ok(())
            }
            Err(e) => {
                log::warn!("Board load failed: {}", e);
                let err = BoardError::Load(e);
                self.error = Some(err.clone());
                Err(err)
            }
        }
    }

    pub async fn load<A: BoardApi>(&mut self, api: &A, board: BoardId) -> Result<(), BoardError> {
        self.begin_load(board);
        let result = BoardSnapshot::fetch(api, board).await;
        self.apply_load(result)
    }

    /// Mirrors saved assignees into the local copy of `card`.
    pub fn set_assignees(&mut self, card: CardId, assignees: &[UserId]) -> bool {
        match self.cards.iter_mut().find(|c| c.id == card) {
            Some(c) => {
                c.assignees = assignees.to_vec();
                true
            }
            None => false,
        }
    }

    // --- DERIVED VIEWS ---

    /// Cards of every list, ordered by position. Lists without cards map
    /// to an empty vector.
    pub fn group_by_list(&self) -> BTreeMap<ListId, Vec<&Card>> {
        let mut map: BTreeMap<ListId, Vec<&Card>> =
            self.lists.iter().map(|l| (l.id, Vec::new())).collect();
        for card in &self.cards {
            if let Some(bucket) = map.get_mut(&card.list) {
                bucket.push(card);
            }
        }
        for bucket in map.values_mut() {
            bucket.sort_by_key(|c| c.position);
        }
        map
    }

    /// Same grouping, in column order.
    pub fn columns(&self) -> Vec<Column<'_>> {
        let mut grouped = self.group_by_list();
        self.lists
            .iter()
            .map(|list| Column {
                list,
                cards: grouped.remove(&list.id).unwrap_or_default(),
            })
            .collect()
    }

    // --- DRAG & DROP ---

    /// Selects the card to move next, replacing any earlier choice.
    /// Returns false for a card that is not on this board.
    pub fn arm(&mut self, card: CardId) -> bool {
        if self.card(card).is_none() {
            return false;
        }
        self.armed = Some(card);
        true
    }

    pub fn disarm(&mut self) {
        self.armed = None;
    }

    pub fn armed(&self) -> Option<&Card> {
        self.armed.and_then(|id| self.card(id))
    }

    pub fn pending(&self) -> Option<&PendingMove> {
        self.pending.as_ref()
    }

    /// First phase of a move: consumes the armed card. `None` when nothing
    /// is armed. Neither index nor list is validated; the server decides.
    pub fn begin_move(&mut self, target_list: ListId, target_index: i64) -> Option<PendingMove> {
        let card = self.armed.take()?;
        self.card(card)?;
        let pending = PendingMove {
            card,
            target_list,
            target_index,
        };
        self.pending = Some(pending);
        Some(pending)
    }

    /// Second phase of a move. On success the card takes the requested list
    /// and the raw index as its position; siblings are not renumbered.
    pub fn finish_move(&mut self, result: Result<(), ApiError>) -> MoveOutcome {
        let Some(pending) = self.pending.take() else {
            return MoveOutcome::NoPending;
        };

        match result {
            Ok(()) => {
                if let Some(idx) = self.cards.iter().position(|c| c.id == pending.card) {
                    let mut moved = self.cards.remove(idx);
                    moved.list = pending.target_list;
                    moved.position = pending.target_index;
                    self.cards.push(moved);
                }
                self.error = None;
                MoveOutcome::Applied(pending)
            }
            Err(e) => {
                log::warn!("Moving card {} failed: {}", pending.card, e);
                let err = BoardError::Move(e);
                self.error = Some(err.clone());
                MoveOutcome::Failed(pending, err)
            }
        }
    }

    /// Drops the armed card on `target_list` at `target_index`. `None` when
    /// nothing was armed.
    pub async fn drop_armed<A: BoardApi>(
        &mut self,
        api: &A,
        target_list: ListId,
        target_index: i64,
    ) -> Option<MoveOutcome> {
        let pending = self.begin_move(target_list, target_index)?;
        let result = api
            .move_card(pending.card, pending.target_list, pending.target_index)
            .await;
        Some(self.finish_move(result))
    }

    /// Arms `card` and drops it in one go.
    pub async fn move_card<A: BoardApi>(
        &mut self,
        api: &A,
        card: CardId,
        target_list: ListId,
        target_index: i64,
    ) -> Option<MoveOutcome> {
        if !self.arm(card) {
            return None;
        }
        self.drop_armed(api, target_list, target_index).await
    }
}
