//! Async driver for [`SelectorEngine`].
//!
//! One task owns the engine. User input arrives on an mpsc channel and the
//! provider fetches the engine asks for are polled on the same task, so
//! every completion re-enters the engine as an ordinary serialized event.

use std::future::Future;
use std::pin::Pin;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::contact::{Contact, HistoryEntry};
use crate::engine::{Command, SelectorEngine};
use crate::fold::FoldState;
use crate::providers::{AlertRouter, DirectoryProvider, HistoryProvider, PermissionGate};
use crate::selection::Position;

type LocalBoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// User input forwarded to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    SearchText(String),
    SelectRow(Position),
    SelectNotFound,
    RequestAccess,
    ConfirmFold(FoldState),
    Close,
}

pub struct Collaborators<G, D, H, A> {
    pub gate: G,
    pub directory: D,
    pub history: H,
    pub alerts: A,
}

pub struct SelectorRuntime<G, D, H, A> {
    engine: SelectorEngine,
    collaborators: Collaborators<G, D, H, A>,
}

/// Fetches currently awaited by the runtime, at most one of each kind.
struct InFlight<'a> {
    directory: Option<LocalBoxFuture<'a, Result<Vec<Contact>>>>,
    history: Option<LocalBoxFuture<'a, Result<Vec<HistoryEntry>>>>,
    access: Option<LocalBoxFuture<'a, bool>>,
}

impl<'a> InFlight<'a> {
    fn new() -> Self {
        Self {
            directory: None,
            history: None,
            access: None,
        }
    }

    fn dispatch<G, D, H, A>(&mut self, commands: Vec<Command>, collaborators: &'a Collaborators<G, D, H, A>)
    where
        G: PermissionGate + 'static,
        D: DirectoryProvider + 'static,
        H: HistoryProvider + 'static,
        A: AlertRouter,
    {
        for command in commands {
            debug!(?command, "dispatching");
            match command {
                Command::FetchDirectory if self.directory.is_none() => {
                    self.directory = Some(Box::pin(collaborators.directory.fetch_all()));
                }
                Command::FetchHistory { operation, limit } if self.history.is_none() => {
                    let history = &collaborators.history;
                    self.history = Some(Box::pin(async move {
                        history.fetch_recent(&operation, limit).await
                    }));
                }
                Command::RequestAccess if self.access.is_none() => {
                    self.access = Some(Box::pin(collaborators.gate.request_access()));
                }
                Command::ShowAccessDenied => collaborators.alerts.show_access_denied_prompt(),
                command => debug!(?command, "already in flight"),
            }
        }
    }
}

async fn poll_slot<T>(slot: &mut Option<LocalBoxFuture<'_, T>>) -> T {
    match slot {
        Some(future) => future.await,
        None => std::future::pending().await,
    }
}

impl<G, D, H, A> SelectorRuntime<G, D, H, A>
where
    G: PermissionGate + 'static,
    D: DirectoryProvider + 'static,
    H: HistoryProvider + 'static,
    A: AlertRouter,
{
    pub fn new(engine: SelectorEngine, collaborators: Collaborators<G, D, H, A>) -> Self {
        Self {
            engine,
            collaborators,
        }
    }

    /// For registering observers before the session starts.
    pub fn engine_mut(&mut self) -> &mut SelectorEngine {
        &mut self.engine
    }

    /// Run the session until `inputs` is closed and no fetch is outstanding.
    /// Returns the engine in its final state.
    pub async fn run(self, mut inputs: mpsc::UnboundedReceiver<Input>) -> SelectorEngine {
        let SelectorRuntime {
            mut engine,
            collaborators,
        } = self;
        let mut in_flight = InFlight::new();
        let mut open = true;

        let status = collaborators.gate.check_status();
        in_flight.dispatch(engine.start(status), &collaborators);

        loop {
            tokio::select! {
                input = inputs.recv(), if open => match input {
                    Some(input) => {
                        let commands = apply(&mut engine, input);
                        in_flight.dispatch(commands, &collaborators);
                    }
                    None => open = false,
                },
                result = poll_slot(&mut in_flight.directory), if in_flight.directory.is_some() => {
                    in_flight.directory = None;
                    let contacts = result.unwrap_or_else(|err| {
                        warn!("directory fetch failed: {:#}", err);
                        Vec::new()
                    });
                    engine.directory_loaded(contacts);
                }
                result = poll_slot(&mut in_flight.history), if in_flight.history.is_some() => {
                    in_flight.history = None;
                    let entries = result.unwrap_or_else(|err| {
                        warn!("history fetch failed: {:#}", err);
                        Vec::new()
                    });
                    engine.history_loaded(entries);
                }
                granted = poll_slot(&mut in_flight.access), if in_flight.access.is_some() => {
                    in_flight.access = None;
                    let commands = engine.access_resolved(granted);
                    in_flight.dispatch(commands, &collaborators);
                }
                else => break,
            }
        }

        engine
    }
}

fn apply(engine: &mut SelectorEngine, input: Input) -> Vec<Command> {
    match input {
        Input::SearchText(text) => {
            engine.search_text_changed(&text);
            Vec::new()
        }
        Input::SelectRow(position) => engine.select_row(position).unwrap_or_else(|err| {
            debug!("ignoring row selection: {}", err);
            Vec::new()
        }),
        Input::SelectNotFound => {
            engine.select_not_found();
            Vec::new()
        }
        Input::RequestAccess => engine.request_access(),
        Input::ConfirmFold(state) => {
            engine.confirm_fold(state);
            Vec::new()
        }
        Input::Close => {
            engine.close();
            Vec::new()
        }
    }
}
