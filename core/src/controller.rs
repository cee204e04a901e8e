//! Conversation View Controller
//!
//! Owns everything a surface shows: the selected user, the transcript, the
//! input buffer and the send/input locks. Surfaces call the operations here
//! and render the accessors; they never talk to the backend themselves.
//!
//! # Split-phase operations
//!
//! Operations that need the network ([`ChatController::select_user`],
//! [`ChatController::submit`]) update local state immediately and hand back a
//! [`Job`]. The surface runs the job wherever it likes (the TUI spawns it on
//! the runtime) and feeds the [`Outcome`] to [`ChatController::apply`].
//!
//! Every job is tagged with the selection epoch it was issued under. Selecting
//! a user bumps the epoch, so a late outcome for an earlier selection is
//! dropped instead of overwriting the newer session.
//!
//! ```text
//! Unselected ──select──▶ Resolving ──resolved──▶ Active ──quota hit──▶ QuotaLocked
//!      ▲                     │                     │                      │
//!      └──────select none────┴─────────────────────┴───────select─────────┘
//! ```

use std::sync::Arc;

use thiserror::Error;

use crate::client::{ClientError, ConversationBackend};
use crate::config::ChatConfig;
use crate::messages::{count_user_messages, Conversation, ConversationId, Message};
use crate::store::{ConversationCache, StoreError};
use crate::users::User;

/// Prompt shown when nobody is selected
pub const SELECT_USER_PROMPT: &str = "please select user";

/// Prompt shown when a Free-tier user hits the quota
pub const UPGRADE_PROMPT: &str = "please upgrade your plan";

/// Failures while resolving or sending
#[derive(Debug, Error)]
pub enum SessionError {
    /// Backend call failed
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Conversation store failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Session phase of the controller
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Nobody selected
    Unselected,
    /// Waiting for (or failed to get) the user's conversation
    Resolving {
        /// Selected user
        user: User,
    },
    /// Conversation loaded, input enabled
    Active {
        /// Selected user
        user: User,
        /// The user's conversation
        conversation_id: ConversationId,
    },
    /// Free-tier cap reached, input hidden until another selection
    QuotaLocked {
        /// Selected user
        user: User,
        /// The user's conversation
        conversation_id: ConversationId,
    },
}

impl SessionState {
    /// Selected user, if any
    #[must_use]
    pub fn user(&self) -> Option<&User> {
        match self {
            SessionState::Unselected => None,
            SessionState::Resolving { user }
            | SessionState::Active { user, .. }
            | SessionState::QuotaLocked { user, .. } => Some(user),
        }
    }

    /// Resolved conversation, if any
    #[must_use]
    pub fn conversation_id(&self) -> Option<&ConversationId> {
        match self {
            SessionState::Active {
                conversation_id, ..
            }
            | SessionState::QuotaLocked {
                conversation_id, ..
            } => Some(conversation_id),
            SessionState::Unselected | SessionState::Resolving { .. } => None,
        }
    }

    /// Short name for logs and status lines
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Unselected => "unselected",
            SessionState::Resolving { .. } => "resolving",
            SessionState::Active { .. } => "active",
            SessionState::QuotaLocked { .. } => "quota-locked",
        }
    }
}

/// Network work issued by the controller
pub struct Job {
    epoch: u64,
    kind: JobKind,
    backend: Arc<dyn ConversationBackend>,
    cache: ConversationCache,
}

enum JobKind {
    Resolve {
        user: User,
        slug: String,
    },
    Send {
        conversation_id: ConversationId,
        text: String,
    },
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.kind {
            JobKind::Resolve { .. } => "resolve",
            JobKind::Send { .. } => "send",
        };
        f.debug_struct("Job")
            .field("epoch", &self.epoch)
            .field("kind", &kind)
            .finish_non_exhaustive()
    }
}

impl Job {
    /// Selection epoch this job belongs to
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Whether this job posts a message
    #[must_use]
    pub fn is_send(&self) -> bool {
        matches!(self.kind, JobKind::Send { .. })
    }

    /// Run the job against the backend
    pub async fn run(self) -> Outcome {
        let epoch = self.epoch;
        match self.kind {
            JobKind::Resolve { user, slug } => {
                match resolve(self.backend.as_ref(), &self.cache, &user, &slug).await {
                    Ok(conversation) => Outcome::Resolved {
                        epoch,
                        conversation,
                    },
                    Err(error) => Outcome::ResolveFailed { epoch, error },
                }
            }
            JobKind::Send {
                conversation_id,
                text,
            } => match send(self.backend.as_ref(), &conversation_id, &text).await {
                Ok(history) => Outcome::Sent { epoch, history },
                Err(error) => Outcome::SendFailed { epoch, error },
            },
        }
    }
}

/// Result of a [`Job`]
#[derive(Debug)]
pub enum Outcome {
    /// The user's conversation is known and its history loaded
    Resolved {
        /// Issuing epoch
        epoch: u64,
        /// Cached or created conversation with its history
        conversation: Conversation,
    },
    /// Resolution failed
    ResolveFailed {
        /// Issuing epoch
        epoch: u64,
        /// Cause
        error: SessionError,
    },
    /// Message posted and history re-fetched
    Sent {
        /// Issuing epoch
        epoch: u64,
        /// Server history
        history: Vec<Message>,
    },
    /// Posting or re-fetching failed
    SendFailed {
        /// Issuing epoch
        epoch: u64,
        /// Cause
        error: SessionError,
    },
}

impl Outcome {
    /// Issuing epoch
    #[must_use]
    pub fn epoch(&self) -> u64 {
        match self {
            Outcome::Resolved { epoch, .. }
            | Outcome::ResolveFailed { epoch, .. }
            | Outcome::Sent { epoch, .. }
            | Outcome::SendFailed { epoch, .. } => *epoch,
        }
    }
}

async fn resolve(
    backend: &dyn ConversationBackend,
    cache: &ConversationCache,
    user: &User,
    slug: &str,
) -> Result<Conversation, SessionError> {
    if user.email.trim().is_empty() {
        return Err(ClientError::MissingEmail.into());
    }

    // Held until the created id is cached
    let claim = cache.claim(&user.email).await;

    if let Some(conversation_id) = cache.lookup(&user.email).await? {
        drop(claim);
        tracing::debug!(email = %user.email, %conversation_id, "resuming cached conversation");
        let history = backend.fetch_conversation(&conversation_id).await?;
        return Ok(Conversation {
            conversation_id,
            history,
        });
    }

    let created = backend.create_conversation(slug, &user.email).await?;

    // Kept even if the selection moved on; the conversation exists server-side
    if let Err(e) = cache.remember(&user.email, &created.conversation_id).await {
        tracing::error!(
            email = %user.email,
            conversation_id = %created.conversation_id,
            error = %e,
            "failed to cache conversation id"
        );
    }

    Ok(Conversation {
        conversation_id: created.conversation_id,
        history: created.messages,
    })
}

async fn send(
    backend: &dyn ConversationBackend,
    conversation_id: &ConversationId,
    text: &str,
) -> Result<Vec<Message>, SessionError> {
    backend.post_message(conversation_id, text).await?;
    Ok(backend.fetch_conversation(conversation_id).await?)
}

/// Chat session controller
pub struct ChatController {
    backend: Arc<dyn ConversationBackend>,
    cache: ConversationCache,
    slug: String,
    free_message_limit: usize,
    users: Vec<User>,
    selected: Option<usize>,
    highlighted: Option<usize>,
    state: SessionState,
    messages: Vec<Message>,
    input: String,
    in_flight: bool,
    epoch: u64,
    last_error: Option<String>,
}

impl ChatController {
    /// Create a controller with nobody selected
    pub fn new(
        backend: Arc<dyn ConversationBackend>,
        cache: ConversationCache,
        config: &ChatConfig,
    ) -> Self {
        Self {
            backend,
            cache,
            slug: config.slug.clone(),
            free_message_limit: config.free_message_limit,
            users: config.users.clone(),
            selected: None,
            highlighted: None,
            state: SessionState::Unselected,
            messages: Vec::new(),
            input: String::new(),
            in_flight: false,
            epoch: 0,
            last_error: None,
        }
    }

    // === Accessors ===

    /// Current phase
    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Transcript to display
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Input buffer
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Selectable users
    #[must_use]
    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// Index of the selected user in [`Self::users`]
    #[must_use]
    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    /// Roster entry under the cursor, not yet committed
    #[must_use]
    pub fn highlighted_index(&self) -> Option<usize> {
        self.highlighted
    }

    /// Whether committing the highlight would do anything
    ///
    /// True when the cursor sits on a different entry than the selection, or
    /// on the selected user while their session is stuck (resolution failed
    /// or quota locked) and nothing is in flight.
    #[must_use]
    pub fn is_highlight_pending(&self) -> bool {
        if self.highlighted != self.selected {
            return true;
        }
        !self.in_flight
            && matches!(
                self.state,
                SessionState::Resolving { .. } | SessionState::QuotaLocked { .. }
            )
    }

    /// Selected user
    #[must_use]
    pub fn selected_user(&self) -> Option<&User> {
        self.state.user()
    }

    /// Resolved conversation of the selected user
    #[must_use]
    pub fn conversation_id(&self) -> Option<&ConversationId> {
        self.state.conversation_id()
    }

    /// True exactly while a job is in flight
    #[must_use]
    pub fn is_send_disabled(&self) -> bool {
        self.in_flight
    }

    /// True once the quota lock engaged
    #[must_use]
    pub fn is_input_locked(&self) -> bool {
        matches!(self.state, SessionState::QuotaLocked { .. })
    }

    /// Whether a surface should show the input line
    #[must_use]
    pub fn is_input_visible(&self) -> bool {
        matches!(
            self.state,
            SessionState::Resolving { .. } | SessionState::Active { .. }
        )
    }

    /// Banner for the current phase, if any
    #[must_use]
    pub fn prompt(&self) -> Option<&'static str> {
        match self.state {
            SessionState::Unselected => Some(SELECT_USER_PROMPT),
            SessionState::QuotaLocked { .. } => Some(UPGRADE_PROMPT),
            SessionState::Resolving { .. } | SessionState::Active { .. } => None,
        }
    }

    /// Current selection epoch
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Most recent failure for the status line
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    // === Input editing ===

    /// Replace the input buffer
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Append a character to the input buffer
    pub fn push_input(&mut self, c: char) {
        self.input.push(c);
    }

    /// Delete the last character of the input buffer
    pub fn backspace(&mut self) {
        self.input.pop();
    }

    // === Transitions ===

    /// Select a roster entry (`None` clears the selection)
    ///
    /// Always clears the quota lock. Returns the resolution job for a user.
    pub fn select_user(&mut self, index: Option<usize>) -> Option<Job> {
        self.epoch += 1;
        self.last_error = None;

        let chosen = index.and_then(|i| self.users.get(i).cloned().map(|u| (i, u)));
        if index.is_some() && chosen.is_none() {
            tracing::warn!(?index, "selection out of range, clearing");
        }

        let Some((i, user)) = chosen else {
            self.selected = None;
            self.highlighted = None;
            self.state = SessionState::Unselected;
            self.messages.clear();
            self.in_flight = false;
            tracing::debug!(epoch = self.epoch, "selection cleared");
            return None;
        };

        tracing::info!(
            epoch = self.epoch,
            email = %user.email,
            program_type = %user.program_type,
            "user selected"
        );

        self.selected = Some(i);
        self.highlighted = Some(i);
        self.messages = vec![Message::placeholder()];
        self.in_flight = true;
        self.state = SessionState::Resolving { user: user.clone() };

        Some(self.job(JobKind::Resolve {
            user,
            slug: self.slug.clone(),
        }))
    }

    /// Move the highlight one step through `[none, users...]`
    ///
    /// Only the cursor moves; nothing is resolved until
    /// [`Self::commit_highlight`].
    pub fn cycle_highlight(&mut self, forward: bool) {
        let slots = self.users.len() + 1;
        let current = self.highlighted.map_or(0, |i| i + 1);
        let next = if forward {
            (current + 1) % slots
        } else {
            (current + slots - 1) % slots
        };
        self.highlighted = next.checked_sub(1);
    }

    /// Select the highlighted entry
    pub fn commit_highlight(&mut self) -> Option<Job> {
        self.select_user(self.highlighted)
    }

    /// Submit the input buffer
    ///
    /// Ignored while a job is in flight or the input is blank. A Free-tier
    /// user who already has the capped number of messages in the transcript
    /// is locked out instead; no job is issued.
    pub fn submit(&mut self) -> Option<Job> {
        if self.in_flight || self.input.trim().is_empty() {
            return None;
        }

        let (user, conversation_id) = match &self.state {
            SessionState::Active {
                user,
                conversation_id,
            } => (user.clone(), conversation_id.clone()),
            SessionState::Resolving { user } => {
                tracing::warn!(email = %user.email, "conversation not ready, submit ignored");
                return None;
            }
            SessionState::Unselected | SessionState::QuotaLocked { .. } => return None,
        };

        if let Some(limit) = user.program_type.message_limit(self.free_message_limit) {
            let sent = count_user_messages(&self.messages);
            if sent >= limit {
                tracing::info!(email = %user.email, sent, limit, "free-tier quota reached");
                self.input.clear();
                self.in_flight = false;
                self.state = SessionState::QuotaLocked {
                    user,
                    conversation_id,
                };
                return None;
            }
        }

        let text = std::mem::take(&mut self.input);
        self.messages.push(Message::user(text.clone()));
        self.messages.push(Message::placeholder());
        self.in_flight = true;

        tracing::debug!(epoch = self.epoch, %conversation_id, "sending message");
        Some(self.job(JobKind::Send {
            conversation_id,
            text,
        }))
    }

    /// Apply a job outcome
    ///
    /// Returns `false` if the outcome belongs to an earlier selection and was
    /// dropped.
    pub fn apply(&mut self, outcome: Outcome) -> bool {
        if outcome.epoch() != self.epoch {
            tracing::debug!(
                outcome_epoch = outcome.epoch(),
                epoch = self.epoch,
                "dropping stale outcome"
            );
            return false;
        }

        match outcome {
            Outcome::Resolved {
                conversation:
                    Conversation {
                        conversation_id,
                        history,
                    },
                ..
            } => {
                if let SessionState::Resolving { user } = &self.state {
                    tracing::info!(
                        email = %user.email,
                        %conversation_id,
                        messages = history.len(),
                        "conversation ready"
                    );
                    self.state = SessionState::Active {
                        user: user.clone(),
                        conversation_id,
                    };
                    self.messages = history;
                }
                self.in_flight = false;
            }
            Outcome::ResolveFailed { error, .. } => {
                tracing::error!(error = %error, "conversation resolution failed");
                self.last_error = Some(error.to_string());
                self.in_flight = false;
            }
            Outcome::Sent { history, .. } => {
                self.messages = history;
                self.last_error = None;
                self.in_flight = false;
            }
            Outcome::SendFailed { error, .. } => {
                tracing::error!(error = %error, "send failed");
                if self.messages.last().is_some_and(Message::is_placeholder) {
                    self.messages.pop();
                }
                self.last_error = Some(error.to_string());
                self.in_flight = false;
            }
        }
        true
    }

    // === Convenience (headless use) ===

    /// Select a user and wait for the conversation to resolve
    pub async fn choose_user(&mut self, index: Option<usize>) {
        if let Some(job) = self.select_user(index) {
            let outcome = job.run().await;
            self.apply(outcome);
        }
    }

    /// Put `text` in the input buffer, submit it, and wait for the reply
    pub async fn send_message(&mut self, text: impl Into<String>) {
        self.set_input(text);
        if let Some(job) = self.submit() {
            let outcome = job.run().await;
            self.apply(outcome);
        }
    }

    fn job(&self, kind: JobKind) -> Job {
        Job {
            epoch: self.epoch,
            kind,
            backend: Arc::clone(&self.backend),
            cache: self.cache.clone(),
        }
    }
}
