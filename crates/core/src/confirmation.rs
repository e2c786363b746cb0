//! Confirmation gate.
//!
//! Turns a user-facing yes/no prompt into a future. Each call to
//! [`ConfirmationGate::request_confirmation`] opens its own single-use channel keyed by a fresh
//! [`ConfirmationId`]; the surface that renders the prompt routes the user's click back with
//! [`ConfirmationGate::confirm`], [`ConfirmationGate::cancel`] or [`ConfirmationGate::dismiss`].
//!
//! Only one prompt is shown at a time. A new request supersedes the active one: the stale
//! request resolves to `false` and the new prompt replaces it. Every [`Confirmation`] settles
//! exactly once:
//!
//! - `true` on confirm,
//! - `false` on cancel, dismissal, supersession, or when the gate itself is dropped.
//!
//! There is no timeout. Callers that need one can wrap the future in `tokio::time::timeout`.

use serde::Serialize;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::task::{Context, Poll};
use tokio::sync::{oneshot, watch};
use uuid::Uuid;

/// Identity of one confirmation request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ConfirmationId(Uuid);

impl ConfirmationId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(input: &str) -> Option<Self> {
        Uuid::parse_str(input).ok().map(Self)
    }
}

impl std::fmt::Display for ConfirmationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// The prompt a surface should currently show.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Prompt {
    pub id: ConfirmationId,
    /// What the decision is about, e.g. the record a delete targets. Lets a surface that
    /// shares the gate tell its own prompt apart from one opened elsewhere.
    pub subject: Option<String>,
    pub message: String,
}

/// What the user did with a prompt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Confirm,
    Cancel,
    /// The prompt was closed without clicking either button.
    Dismiss,
}

impl Decision {
    fn confirmed(self) -> bool {
        matches!(self, Decision::Confirm)
    }
}

/// Outcome of routing a decision to the gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    Resolved,
    /// The request was already settled (answered, superseded or withdrawn), or never existed.
    AlreadySettled,
}

struct Pending {
    prompt: Prompt,
    reply: oneshot::Sender<bool>,
}

struct Shared {
    active: Mutex<Option<Pending>>,
    prompts: watch::Sender<Option<Prompt>>,
}

impl Shared {
    fn active(&self) -> MutexGuard<'_, Option<Pending>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Removes the active request if it is `id`, without replying.
    fn withdraw(&self, id: ConfirmationId) -> Option<Pending> {
        let mut active = self.active();
        if !active.as_ref().is_some_and(|p| p.prompt.id == id) {
            return None;
        }
        let pending = active.take();
        self.prompts.send_replace(None);
        pending
    }
}

/// Single-prompt confirmation gate. Cheap to clone; clones share the active prompt.
#[derive(Clone)]
pub struct ConfirmationGate {
    shared: Arc<Shared>,
}

impl Default for ConfirmationGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfirmationGate {
    pub fn new() -> Self {
        let (prompts, _) = watch::channel(None);
        Self {
            shared: Arc::new(Shared {
                active: Mutex::new(None),
                prompts,
            }),
        }
    }

    /// Shows `message` and returns a future that settles with the user's decision.
    ///
    /// Never blocks. Any request still pending is resolved to `false` first.
    pub fn request_confirmation(&self, message: impl Into<String>) -> Confirmation {
        self.open(None, message.into())
    }

    /// Like [`ConfirmationGate::request_confirmation`], tagging the prompt with `subject`.
    pub fn request_confirmation_about(
        &self,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Confirmation {
        self.open(Some(subject.into()), message.into())
    }

    fn open(&self, subject: Option<String>, message: String) -> Confirmation {
        let (reply, rx) = oneshot::channel();
        let prompt = Prompt {
            id: ConfirmationId::generate(),
            subject,
            message,
        };
        let id = prompt.id;

        let mut active = self.shared.active();
        let stale = active.replace(Pending {
            prompt: prompt.clone(),
            reply,
        });
        self.shared.prompts.send_replace(Some(prompt));
        drop(active);

        if let Some(stale) = stale {
            tracing::debug!(superseded = %stale.prompt.id, by = %id, "confirmation superseded");
            // The stale caller may already be gone; nothing to report then.
            let _ = stale.reply.send(false);
        }
        tracing::debug!(%id, "confirmation requested");

        Confirmation {
            id,
            rx,
            gate: Arc::downgrade(&self.shared),
        }
    }

    /// Routes `decision` to the request `id`.
    ///
    /// Returns [`Resolution::AlreadySettled`] when `id` is not the active request, so a
    /// double click or a late dismissal can never settle a request twice.
    pub fn resolve(&self, id: ConfirmationId, decision: Decision) -> Resolution {
        let Some(pending) = self.shared.withdraw(id) else {
            tracing::warn!(%id, ?decision, "decision for a confirmation that is no longer pending");
            return Resolution::AlreadySettled;
        };

        if pending.reply.send(decision.confirmed()).is_err() {
            tracing::debug!(%id, "confirmation caller went away before the decision");
        }
        tracing::debug!(%id, ?decision, "confirmation resolved");
        Resolution::Resolved
    }

    pub fn confirm(&self, id: ConfirmationId) -> Resolution {
        self.resolve(id, Decision::Confirm)
    }

    pub fn cancel(&self, id: ConfirmationId) -> Resolution {
        self.resolve(id, Decision::Cancel)
    }

    pub fn dismiss(&self, id: ConfirmationId) -> Resolution {
        self.resolve(id, Decision::Dismiss)
    }

    /// The prompt to render, if any.
    pub fn current_prompt(&self) -> Option<Prompt> {
        self.shared.active().as_ref().map(|p| p.prompt.clone())
    }

    /// Watches prompt changes. `None` means no prompt is shown.
    pub fn subscribe(&self) -> watch::Receiver<Option<Prompt>> {
        self.shared.prompts.subscribe()
    }
}

/// Future returned by [`ConfirmationGate::request_confirmation`].
///
/// Dropping it before it settles withdraws the prompt.
#[must_use = "a confirmation does nothing unless awaited"]
pub struct Confirmation {
    id: ConfirmationId,
    rx: oneshot::Receiver<bool>,
    gate: Weak<Shared>,
}

impl Confirmation {
    pub fn id(&self) -> ConfirmationId {
        self.id
    }
}

impl Future for Confirmation {
    type Output = bool;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<bool> {
        // A closed channel means the gate was dropped; that counts as "no".
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|decision| decision.unwrap_or(false))
    }
}

impl Drop for Confirmation {
    fn drop(&mut self) {
        if let Some(shared) = self.gate.upgrade() {
            if shared.withdraw(self.id).is_some() {
                tracing::debug!(id = %self.id, "confirmation withdrawn by caller");
            }
        }
    }
}
