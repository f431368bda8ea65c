// Manages background network operations for the TUI.
use crate::board::{BoardApi, BoardSnapshot};
use crate::client::ApiClient;
use crate::tasks::TaskFilter;
use crate::tui::action::{Action, AppEvent};
use tokio::sync::mpsc::{Receiver, Sender};

/// Runs requests for the UI loop. Every action answers with one or more events;
/// errors travel back as `AppEvent::Error` and never end the actor.
pub async fn run_network_actor(
    client: ApiClient,
    mut action_rx: Receiver<Action>,
    event_tx: Sender<AppEvent>,
) {
    while let Some(action) = action_rx.recv().await {
        let event = match action {
            Action::Quit => break,

            Action::LoadBoards => match client.get_boards().await {
                Ok(boards) => AppEvent::BoardsLoaded(boards),
                Err(e) => AppEvent::Error(e),
            },

            Action::LoadTemplates => match client.get_default_courses().await {
                Ok(templates) => AppEvent::TemplatesLoaded(templates),
                Err(e) => AppEvent::Error(e),
            },

            Action::CreateBoard(new_board) => match client.create_board(&new_board).await {
                Ok(board) => AppEvent::BoardCreated(board),
                Err(e) => AppEvent::Error(e),
            },

            Action::InviteMember(board, username) => {
                match client.invite_member(board, &username).await {
                    Ok(()) => AppEvent::Status(format!("Invited {}.", username)),
                    Err(e) => AppEvent::Error(e),
                }
            }

            Action::LoadBoard(board) => {
                AppEvent::BoardLoaded(board, BoardSnapshot::fetch(&client, board).await)
            }

            Action::MoveCard(pending) => AppEvent::MoveFinished(
                BoardApi::move_card(
                    &client,
                    pending.card,
                    pending.target_list,
                    pending.target_index,
                )
                .await,
            ),

            Action::LoadCalendar => match client.get_cards().await {
                Ok(cards) => AppEvent::CalendarLoaded(cards),
                Err(e) => AppEvent::Error(e),
            },

            Action::LoadTasks(filter) => {
                let my_id = client.session().user_id();
                let today = TaskFilter::today();
                match client.query_cards(&filter.to_query(my_id, today)).await {
                    Ok(cards) => AppEvent::TasksLoaded(filter.apply(cards, my_id, today)),
                    Err(e) => AppEvent::Error(e),
                }
            }

            Action::LoadLists => match client.get_lists().await {
                Ok(lists) => AppEvent::ListsLoaded(lists),
                Err(e) => AppEvent::Error(e),
            },

            Action::LoadMembers { card, list, board } => {
                let board = match board {
                    Some(id) => Ok(Some(id)),
                    None => client.board_of_list(list).await,
                };
                let members = match board {
                    Ok(Some(id)) => client.get_members(id).await,
                    Ok(None) => Ok(Vec::new()),
                    Err(e) => Err(e),
                };
                match members {
                    Ok(users) => AppEvent::MembersLoaded(card, users),
                    Err(e) => AppEvent::Error(e),
                }
            }

            Action::SaveAssignees(draft) => {
                match client.set_assignees(draft.card, &draft.assignees).await {
                    Ok(()) => AppEvent::AssigneesSaved(draft),
                    Err(e) => AppEvent::Error(e),
                }
            }

            Action::CreateCard(new_card) => match client.create_card(&new_card).await {
                Ok(card) => AppEvent::CardCreated(card),
                Err(e) => AppEvent::Error(e),
            },
        };

        if event_tx.send(event).await.is_err() {
            break;
        }
    }
    log::debug!("Network actor stopped");
}
