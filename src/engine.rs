//! Stateful picker engine.
//!
//! The engine is a synchronous state machine. Every entry point is one
//! serialized event; async work is never awaited here but returned as
//! [`Command`]s for the caller (normally [`crate::runtime::SelectorRuntime`])
//! to execute and report back.

use tracing::{debug, info, warn};

use crate::aggregate::{self, Sources};
use crate::contact::{Contact, DirectoryState, HistoryEntry, Section};
use crate::error::SelectorError;
use crate::fold::{FoldState, FoldStateMachine};
use crate::phone::{self, NormalizedPhone};
use crate::providers::PermissionStatus;
use crate::search;
use crate::selection::{self, Position, SelectionState};
use crate::snapshot::{self, RenderContext, RenderedSection, Snapshot, Style};

pub const DEFAULT_HISTORY_LIMIT: usize = 5;

/// Async work requested by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    FetchDirectory,
    FetchHistory { operation: String, limit: usize },
    RequestAccess,
    ShowAccessDenied,
}

#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub show_self: bool,
    pub self_contact: Option<Contact>,
    pub read_only: bool,
    /// History is only requested when set.
    pub operation: Option<String>,
    pub history_limit: usize,
    /// Also raise the access-denied prompt for a denial found at startup.
    pub alert_on_startup_denial: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            show_self: false,
            self_contact: None,
            read_only: false,
            operation: None,
            history_limit: DEFAULT_HISTORY_LIMIT,
            alert_on_startup_denial: false,
        }
    }
}

/// Receives snapshots and selection events from the engine.
///
/// Implementations must not call back into the engine from these methods.
pub trait SelectorObserver {
    fn render(&mut self, snapshot: &Snapshot);

    fn contact_selected(&mut self, _contact: &Contact) {}

    fn closed(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub struct SelectorEngine {
    options: EngineOptions,
    permission: PermissionStatus,
    directory: DirectoryState,
    directory_in_flight: bool,
    history_in_flight: bool,
    access_in_flight: bool,
    history: Vec<HistoryEntry>,
    search: NormalizedPhone,
    selection: SelectionState,
    fold: FoldStateMachine,
    observers: Vec<(SubscriptionId, Box<dyn SelectorObserver>)>,
    next_subscription: u64,
    last_published: Option<Snapshot>,
}

impl SelectorEngine {
    pub fn new(options: EngineOptions) -> Self {
        Self {
            options,
            permission: PermissionStatus::NotDetermined,
            directory: DirectoryState::Unknown,
            directory_in_flight: false,
            history_in_flight: false,
            access_in_flight: false,
            history: Vec::new(),
            search: NormalizedPhone::default(),
            selection: SelectionState::default(),
            fold: FoldStateMachine::default(),
            observers: Vec::new(),
            next_subscription: 0,
            last_published: None,
        }
    }

    /// Register an observer. It immediately receives the last published
    /// snapshot, if any.
    pub fn subscribe(&mut self, mut observer: Box<dyn SelectorObserver>) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        if let Some(snapshot) = &self.last_published {
            observer.render(snapshot);
        }
        self.observers.push((id, observer));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> Result<(), SelectorError> {
        let index = self
            .observers
            .iter()
            .position(|(existing, _)| *existing == id)
            .ok_or(SelectorError::UnknownSubscription(id.0))?;
        self.observers.remove(index);
        Ok(())
    }

    pub fn permission(&self) -> PermissionStatus {
        self.permission
    }

    pub fn directory(&self) -> &DirectoryState {
        &self.directory
    }

    pub fn fold_state(&self) -> FoldState {
        self.fold.state()
    }

    pub fn is_directory_available(&self) -> bool {
        self.permission.is_authorized()
    }

    /// Begin a session with the permission status found at startup.
    #[must_use]
    pub fn start(&mut self, status: PermissionStatus) -> Vec<Command> {
        debug!(?status, "starting picker");
        self.permission = status;
        let mut commands = Vec::new();

        match status {
            PermissionStatus::Authorized => commands.extend(self.fetch_directory()),
            PermissionStatus::NotDetermined => {}
            PermissionStatus::Denied | PermissionStatus::Restricted => {
                warn!(?status, "directory access unavailable at startup");
                self.directory = DirectoryState::Unavailable;
                if self.options.alert_on_startup_denial {
                    commands.push(Command::ShowAccessDenied);
                }
            }
        }

        if let Some(operation) = self.options.operation.clone() {
            if !self.history_in_flight {
                self.history_in_flight = true;
                commands.push(Command::FetchHistory {
                    operation,
                    limit: self.options.history_limit,
                });
            }
        }

        self.publish();
        commands
    }

    pub fn search_text_changed(&mut self, text: &str) {
        let normalized = phone::normalize(text);
        if normalized.display_text == self.search.display_text {
            return;
        }
        debug!(text = %normalized.display_text, "search text changed");
        self.selection.text_changed(&normalized);
        self.search = normalized;
        self.publish();
    }

    /// Row tap on the currently rendered snapshot.
    ///
    /// Contact rows select the contact; the "not found" entry selects the
    /// typed number and the "grant access" entry asks for permission.
    pub fn select_row(&mut self, position: Position) -> Result<Vec<Command>, SelectorError> {
        if self.options.read_only {
            return Err(SelectorError::ReadOnly);
        }
        let no_row = SelectorError::NoSuchRow {
            section: position.section,
            row: position.row,
        };

        let sections = self.rendered_sections();
        match sections.get(position.section) {
            Some(RenderedSection::Contacts { rows, .. }) => {
                let row = rows.get(position.row).ok_or(no_row)?;
                let contact = row.contact.clone();
                self.fold.request_toggle();
                self.selection.select_row(contact.clone(), position);
                self.announce_selection(&contact);
                Ok(Vec::new())
            }
            Some(RenderedSection::NotFound { .. }) if position.row == 0 => {
                self.select_not_found();
                Ok(Vec::new())
            }
            Some(RenderedSection::Access) if position.row == 0 => Ok(self.request_access()),
            _ => Err(no_row),
        }
    }

    /// Pick the number typed into the search field. Does nothing while the
    /// text has no digits.
    pub fn select_not_found(&mut self) {
        let Some(contact) = selection::synthetic_contact(&self.search) else {
            debug!("ignoring not-found selection without digits");
            return;
        };
        self.fold.request_toggle();
        self.selection.select_unlisted(contact.clone());
        self.announce_selection(&contact);
    }

    #[must_use]
    pub fn request_access(&mut self) -> Vec<Command> {
        if self.access_in_flight {
            return Vec::new();
        }
        self.access_in_flight = true;
        vec![Command::RequestAccess]
    }

    /// Result of a [`Command::RequestAccess`].
    #[must_use]
    pub fn access_resolved(&mut self, granted: bool) -> Vec<Command> {
        self.access_in_flight = false;

        if granted {
            info!("directory access granted");
            self.permission = PermissionStatus::Authorized;
            let commands = self.fetch_directory().into_iter().collect();
            self.publish();
            return commands;
        }

        if self.permission == PermissionStatus::NotDetermined {
            // The user just declined the system prompt; no second prompt.
            debug!("directory access declined");
            self.permission = PermissionStatus::Denied;
            self.directory = DirectoryState::Unavailable;
            self.publish();
            return Vec::new();
        }

        vec![Command::ShowAccessDenied]
    }

    /// Result of a [`Command::FetchDirectory`].
    pub fn directory_loaded(&mut self, contacts: Vec<Contact>) {
        info!(count = contacts.len(), "directory loaded");
        self.directory_in_flight = false;
        self.directory = DirectoryState::Available(contacts);
        self.publish();
    }

    /// Result of a [`Command::FetchHistory`]; failures arrive as an empty list.
    pub fn history_loaded(&mut self, entries: Vec<HistoryEntry>) {
        debug!(count = entries.len(), "history loaded");
        self.history_in_flight = false;
        self.history = entries;
        self.publish();
    }

    /// The renderer finished a fold transition.
    pub fn confirm_fold(&mut self, state: FoldState) {
        debug!(state = state.label(), "fold confirmed");
        self.fold.confirm(state);
        self.publish();
    }

    pub fn close(&mut self) {
        for (_, observer) in &mut self.observers {
            observer.closed();
        }
    }

    /// Current state, including any pending fold request.
    pub fn snapshot(&self) -> Snapshot {
        self.build_snapshot(self.fold.requested())
    }

    fn fetch_directory(&mut self) -> Option<Command> {
        if self.directory_in_flight || matches!(self.directory, DirectoryState::Available(_)) {
            return None;
        }
        self.directory_in_flight = true;
        self.directory = DirectoryState::Unknown;
        Some(Command::FetchDirectory)
    }

    fn announce_selection(&mut self, contact: &Contact) {
        self.publish();
        for (_, observer) in &mut self.observers {
            observer.contact_selected(contact);
        }
    }

    fn aggregated(&self) -> Vec<Section> {
        let history = aggregate::merge_history(&self.history, self.directory.contacts());
        aggregate::aggregate(Sources {
            show_self: self.options.show_self,
            self_contact: self.options.self_contact.as_ref(),
            history: &history,
            directory: &self.directory,
        })
    }

    fn filtered(&self) -> Vec<Section> {
        search::filter(&self.aggregated(), &self.search.display_text)
    }

    fn rendered_sections(&self) -> Vec<RenderedSection> {
        let filtered = self.filtered();
        snapshot::render_sections(&filtered, &self.render_context(&filtered))
    }

    // A row highlight only survives while the same contact sits at that
    // position.
    fn highlighted(&self, filtered: &[Section]) -> Option<Position> {
        let selection = self.selection.current()?;
        let position = selection.position?;
        let contact = filtered.get(position.section)?.rows.get(position.row)?;
        (*contact == selection.contact).then_some(position)
    }

    fn render_context<'a>(&'a self, filtered: &[Section]) -> RenderContext<'a> {
        RenderContext {
            self_contact: self.options.self_contact.as_ref(),
            selected: self.highlighted(filtered),
            fold: self.fold.state(),
            read_only: self.options.read_only,
            directory_available: self.is_directory_available(),
            search_text: &self.search.display_text,
            country_name: self.search.country_name.as_deref(),
        }
    }

    fn build_snapshot(&self, notify_state: Option<FoldState>) -> Snapshot {
        let filtered = self.filtered();
        let ctx = self.render_context(&filtered);
        Snapshot {
            selection: self.selection.current().cloned(),
            sections: snapshot::render_sections(&filtered, &ctx),
            search_text: self.search.display_text.clone(),
            country_name: self.search.country_name.clone(),
            fold: self.fold.state(),
            notify_state,
            style: if self.options.read_only {
                Style::Fixed
            } else {
                Style::Usual
            },
        }
    }

    fn publish(&mut self) {
        let notify_state = self.fold.take_requested();
        let snapshot = self.build_snapshot(notify_state);
        if self.last_published.as_ref() == Some(&snapshot) {
            return;
        }
        for (_, observer) in &mut self.observers {
            observer.render(&snapshot);
        }
        self.last_published = Some(snapshot);
    }
}
