use std::cell::RefCell;
use std::time::Duration;

use futures::future::{AbortHandle, AbortRegistration, Abortable, LocalBoxFuture};
use partial_playground_protocol::{ParamMap, RenderRequest, RenderResponse, RequestError};
use thiserror::Error;

use super::debounce::{DebounceTicket, Debouncer, Deadline};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// The request was superseded by a newer one. Never shown to the user.
    #[error("render request canceled")]
    Canceled,
    #[error("render request failed: {0}")]
    Transport(String),
    #[error("server responded with status {status}")]
    Status { status: u16 },
    #[error("malformed render response: {0}")]
    Decode(String),
    #[error(transparent)]
    Request(#[from] RequestError),
}

/// Seam to the server-side rendering collaborator.
///
/// Dropping the returned future must be safe; implementations backed by a
/// real transport should abort the underlying request when dropped.
pub trait RenderBackend {
    fn render(
        &self,
        request: RenderRequest,
    ) -> LocalBoxFuture<'static, Result<RenderResponse, RenderError>>;
}

/// Identifies one issued render request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestTicket(u64);

/// A request that has been registered as in flight and still has to be sent.
#[derive(Debug)]
pub struct PendingRender {
    pub ticket: RequestTicket,
    pub request: RenderRequest,
    pub registration: AbortRegistration,
}

#[derive(Debug)]
struct InFlight {
    ticket: RequestTicket,
    abort: AbortHandle,
}

/// What the adapter has to do once a request settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Replace the preview content with this markup, then revive scripts.
    Rendered(String),
    /// Success without markup: keep the current preview, say nothing.
    Unchanged,
    /// Canceled or overtaken by a newer request: do nothing.
    Superseded,
    /// Keep the current preview and tell the user.
    Failed(RenderError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Transient user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: &'static str,
}

impl Notice {
    pub const PREVIEW_UPDATED: Notice = Notice {
        level: NoticeLevel::Success,
        text: "Preview updated successfully",
    };
    pub const PREVIEW_UPDATE_FAILED: Notice = Notice {
        level: NoticeLevel::Error,
        text: "An error occurred while updating the preview",
    };
    pub const PARTIAL_RESET: Notice = Notice {
        level: NoticeLevel::Success,
        text: "The partial has been reset successfully",
    };
    pub const CODE_COPIED: Notice = Notice {
        level: NoticeLevel::Success,
        text: "Code copied to clipboard successfully",
    };
    pub const CODE_COPY_FAILED: Notice = Notice {
        level: NoticeLevel::Error,
        text: "An error occurred while copying the code",
    };
}

impl UpdateOutcome {
    pub fn notice(&self) -> Option<Notice> {
        match self {
            UpdateOutcome::Rendered(_) => Some(Notice::PREVIEW_UPDATED),
            UpdateOutcome::Failed(_) => Some(Notice::PREVIEW_UPDATE_FAILED),
            UpdateOutcome::Unchanged | UpdateOutcome::Superseded => None,
        }
    }
}

/// Keeps the preview in step with the form: one debounced edit pending and
/// at most one render request in flight.
#[derive(Debug)]
pub struct PreviewSync {
    partial: Option<String>,
    debouncer: Debouncer<ParamMap>,
    in_flight: Option<InFlight>,
    next_ticket: u64,
}

impl PreviewSync {
    pub fn new(debounce: Duration) -> Self {
        Self {
            partial: None,
            debouncer: Debouncer::new(debounce),
            in_flight: None,
            next_ticket: 0,
        }
    }

    pub fn partial(&self) -> Option<&str> {
        self.partial.as_deref()
    }

    /// Address another partial. Pending edits and the in-flight request
    /// belong to the previous one and are dropped.
    pub fn select_partial(&mut self, key: impl Into<String>) {
        self.cancel_all();
        self.partial = Some(key.into());
    }

    /// Debounce a form change. The returned deadline tells the host when to
    /// call [`PreviewSync::fire`] (or [`PreviewSync::take_due`]).
    pub fn schedule_update(&mut self, now: Duration, params: ParamMap) -> Deadline {
        self.debouncer.schedule(now, params)
    }

    pub fn fire(&mut self, ticket: DebounceTicket) -> Option<ParamMap> {
        self.debouncer.fire(ticket)
    }

    pub fn take_due(&mut self, now: Duration) -> Option<ParamMap> {
        self.debouncer.take_due(now)
    }

    pub fn debounce_delay(&self) -> Duration {
        self.debouncer.delay()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Drop the pending debounced edit and abort the in-flight request.
    pub fn cancel_all(&mut self) {
        self.debouncer.cancel();
        self.cancel_in_flight();
    }

    fn cancel_in_flight(&mut self) {
        if let Some(previous) = self.in_flight.take() {
            tracing::debug!(ticket = previous.ticket.0, "superseding render request");
            previous.abort.abort();
        }
    }

    /// Register a new request as the only one in flight, aborting any
    /// predecessor first.
    pub fn begin(&mut self, params: ParamMap) -> Result<PendingRender, RequestError> {
        let request = RenderRequest::new(self.partial.clone().unwrap_or_default(), params)?;
        self.cancel_in_flight();

        self.next_ticket += 1;
        let ticket = RequestTicket(self.next_ticket);
        let (abort, registration) = AbortHandle::new_pair();
        self.in_flight = Some(InFlight { ticket, abort });
        Ok(PendingRender {
            ticket,
            request,
            registration,
        })
    }

    /// Settle the request identified by `ticket`.
    ///
    /// Only the current in-flight request clears the slot and may produce a
    /// visible outcome; anything else is reported as superseded, even if its
    /// transport reported success.
    pub fn finish(
        &mut self,
        ticket: RequestTicket,
        result: Result<RenderResponse, RenderError>,
    ) -> UpdateOutcome {
        let current = self
            .in_flight
            .as_ref()
            .is_some_and(|in_flight| in_flight.ticket == ticket);
        if !current {
            tracing::debug!(ticket = ticket.0, "dropping stale render result");
            return UpdateOutcome::Superseded;
        }
        self.in_flight = None;

        match result {
            Ok(response) => match response.markup() {
                Some(html) => UpdateOutcome::Rendered(html.to_string()),
                None => UpdateOutcome::Unchanged,
            },
            Err(RenderError::Canceled) => UpdateOutcome::Superseded,
            Err(err) => {
                tracing::warn!(error = %err, "preview update failed");
                UpdateOutcome::Failed(err)
            }
        }
    }
}

/// Issue one render request for `params` and classify its result.
///
/// Starting the request aborts any predecessor, whose own `run_update` then
/// resolves to [`UpdateOutcome::Superseded`]. The `RefCell` is never borrowed
/// across the round trip.
pub async fn run_update<B>(
    sync: &RefCell<PreviewSync>,
    backend: &B,
    params: ParamMap,
) -> UpdateOutcome
where
    B: RenderBackend + ?Sized,
{
    let begun = sync.borrow_mut().begin(params);
    let PendingRender {
        ticket,
        request,
        registration,
    } = match begun {
        Ok(pending) => pending,
        Err(err) => return UpdateOutcome::Failed(err.into()),
    };

    let result = Abortable::new(backend.render(request), registration)
        .await
        .unwrap_or(Err(RenderError::Canceled));

    sync.borrow_mut().finish(ticket, result)
}

/// Drop any pending edit and render the partial with its default values.
pub async fn run_reset<B>(
    sync: &RefCell<PreviewSync>,
    backend: &B,
    defaults: ParamMap,
) -> UpdateOutcome
where
    B: RenderBackend + ?Sized,
{
    sync.borrow_mut().cancel_all();
    run_update(sync, backend, defaults).await
}
