//! Step-up confirmation for sensitive mutations.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::{debug, warn};

use super::code::TotpCode;
use crate::{Error, Result};

/// Where a gate is in its confirmation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TotpPhase {
    /// No command pending
    Idle,
    /// A command is waiting for the operator's code
    AwaitingCode,
    /// The command is executing with a submitted code
    Submitting,
}

/// Presentation state of the code prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModalState {
    /// Prompt is shown
    pub open: bool,
    /// Input is disabled
    pub disabled: bool,
    /// A submission is in flight
    pub loading: bool,
    /// Error attached to the code field
    pub totp_error: Option<String>,
}

impl ModalState {
    fn opened() -> Self {
        Self {
            open: true,
            ..Self::default()
        }
    }

    fn submitting() -> Self {
        Self {
            open: true,
            disabled: true,
            loading: true,
            totp_error: None,
        }
    }

    fn field_error(message: impl Into<String>) -> Self {
        Self {
            open: true,
            totp_error: Some(message.into()),
            ..Self::default()
        }
    }
}

/// How a submission ended when it did not fail outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TotpResolution<T> {
    /// The command ran and the gate is idle again
    Completed(T),
    /// The server rejected the code; the command is still pending
    Rejected(String),
}

enum GateState<C> {
    Idle,
    AwaitingCode(C),
    Submitting(C),
}

impl<C> GateState<C> {
    fn phase(&self) -> TotpPhase {
        match self {
            GateState::Idle => TotpPhase::Idle,
            GateState::AwaitingCode(_) => TotpPhase::AwaitingCode,
            GateState::Submitting(_) => TotpPhase::Submitting,
        }
    }
}

/// Holds one sensitive command until the operator confirms it with a code.
///
/// A gate carries at most one pending command. The command is executed by
/// the closure passed to [`submit`](Self::submit), which receives the code
/// to place in the request's `totp` field. A server rejection of the code
/// (an exception with `param == "totp"`) keeps the command pending so the
/// operator can retry; any other outcome returns the gate to idle.
///
/// # Example
///
/// ```no_run
/// use adminpanel_rs::{AdminClient, CacheCommand, TotpGate, TotpResolution};
///
/// # async fn example(client: AdminClient) -> adminpanel_rs::Result<()> {
/// let gate = TotpGate::new();
/// gate.request(CacheCommand::Flush).await?;
///
/// let caching = client.caching();
/// match gate
///     .submit("123456", |cmd, totp| async move { caching.execute(cmd, &totp).await })
///     .await?
/// {
///     TotpResolution::Completed(()) => println!("cache flushed"),
///     TotpResolution::Rejected(msg) => println!("try again: {msg}"),
/// }
/// # Ok(())
/// # }
/// ```
pub struct TotpGate<C> {
    state: Mutex<GateState<C>>,
    modal: watch::Sender<ModalState>,
}

impl<C: Clone + Send> TotpGate<C> {
    /// Create an idle gate with the prompt closed.
    pub fn new() -> Self {
        let (modal, _) = watch::channel(ModalState::default());
        Self {
            state: Mutex::new(GateState::Idle),
            modal,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, GateState<C>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Park `command` and open the prompt.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TotpPending`] if another command is already waiting
    /// or executing.
    pub async fn request(&self, command: C) -> Result<()> {
        let mut state = self.lock_state();
        if !matches!(*state, GateState::Idle) {
            warn!(phase = ?state.phase(), "TOTP confirmation already pending");
            return Err(Error::TotpPending);
        }
        *state = GateState::AwaitingCode(command);
        self.modal.send_replace(ModalState::opened());
        debug!("TOTP confirmation requested");
        Ok(())
    }

    /// Drop the waiting command and close the prompt.
    ///
    /// Returns the dropped command, or `None` if nothing was waiting. A
    /// command that is already executing cannot be cancelled; drop the
    /// [`submit`](Self::submit) future instead.
    pub async fn cancel(&self) -> Option<C> {
        let mut state = self.lock_state();
        match std::mem::replace(&mut *state, GateState::Idle) {
            GateState::AwaitingCode(command) => {
                self.modal.send_replace(ModalState::default());
                debug!("TOTP confirmation cancelled");
                Some(command)
            }
            other => {
                *state = other;
                None
            }
        }
    }

    /// Validate `input` and, if it is a well-formed code, execute the
    /// waiting command with it.
    ///
    /// `exec` runs at most once per call and never while the gate's lock is
    /// held. Dropping the returned future while `exec` is in flight abandons
    /// the command: the gate goes back to idle and the prompt closes.
    ///
    /// # Errors
    ///
    /// - [`Error::TotpState`] if no command is waiting.
    /// - [`Error::InvalidInput`] if `input` is not six digits; the command
    ///   stays pending and the prompt shows the message.
    /// - Any error from `exec` other than a code rejection; the gate is
    ///   idle again.
    pub async fn submit<T, F, Fut>(&self, input: &str, exec: F) -> Result<TotpResolution<T>>
    where
        F: FnOnce(C, TotpCode) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let (command, code) = {
            let mut state = self.lock_state();
            let command = match &*state {
                GateState::AwaitingCode(command) => command.clone(),
                GateState::Submitting(_) => {
                    return Err(Error::TotpState(
                        "A TOTP submission is already in progress".to_string(),
                    ))
                }
                GateState::Idle => {
                    return Err(Error::TotpState(
                        "No action is awaiting TOTP confirmation".to_string(),
                    ))
                }
            };

            let code = match TotpCode::parse(input) {
                Ok(code) => code,
                Err(err) => {
                    if let Error::InvalidInput(message) = &err {
                        self.modal.send_replace(ModalState::field_error(message.clone()));
                    }
                    return Err(err);
                }
            };

            *state = GateState::Submitting(command.clone());
            self.modal.send_replace(ModalState::submitting());
            (command, code)
        };

        let mut in_flight = SubmitGuard { gate: self, armed: true };

        debug!("submitting TOTP-confirmed command");
        let outcome = exec(command, code).await;
        in_flight.armed = false;

        let mut state = self.lock_state();
        let command = match std::mem::replace(&mut *state, GateState::Idle) {
            GateState::Submitting(command) | GateState::AwaitingCode(command) => Some(command),
            GateState::Idle => None,
        };

        match outcome {
            Ok(value) => {
                self.modal.send_replace(ModalState::default());
                debug!("TOTP-confirmed command completed");
                Ok(TotpResolution::Completed(value))
            }
            Err(err) if err.is_totp_rejection() => {
                let message = rejection_message(&err);
                if let Some(command) = command {
                    *state = GateState::AwaitingCode(command);
                }
                self.modal
                    .send_replace(ModalState::field_error(message.clone()));
                debug!(%message, "TOTP code rejected by server");
                Ok(TotpResolution::Rejected(message))
            }
            Err(err) => {
                self.modal.send_replace(ModalState::default());
                debug!(error = %err, "TOTP-confirmed command failed");
                Err(err)
            }
        }
    }

    /// Current phase.
    pub async fn phase(&self) -> TotpPhase {
        self.lock_state().phase()
    }

    /// The command waiting for, or executing with, a code.
    pub async fn pending(&self) -> Option<C> {
        match &*self.lock_state() {
            GateState::AwaitingCode(command) | GateState::Submitting(command) => {
                Some(command.clone())
            }
            GateState::Idle => None,
        }
    }

    /// Watch the prompt state.
    pub fn subscribe(&self) -> watch::Receiver<ModalState> {
        self.modal.subscribe()
    }

    /// Snapshot of the prompt state.
    pub fn modal(&self) -> ModalState {
        self.modal.borrow().clone()
    }
}

impl<C: Clone + Send> Default for TotpGate<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> std::fmt::Debug for TotpGate<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TotpGate")
            .field("modal", &*self.modal.borrow())
            .finish_non_exhaustive()
    }
}

/// Resets a gate whose `submit` future was dropped mid-flight.
struct SubmitGuard<'a, C> {
    gate: &'a TotpGate<C>,
    armed: bool,
}

impl<C> Drop for SubmitGuard<'_, C> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.gate.state.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(*state, GateState::Submitting(_)) {
            *state = GateState::Idle;
            self.gate.modal.send_replace(ModalState::default());
            warn!("TOTP submission abandoned before completion");
        }
    }
}

fn rejection_message(err: &Error) -> String {
    match err {
        Error::Api { exception, .. } => exception.message.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ApiException;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, PartialEq)]
    enum Cmd {
        Flush,
        Delete(String),
    }

    fn totp_rejection() -> Error {
        Error::Api {
            exception: ApiException::new("Incorrect TOTP code").with_param("totp"),
            warnings: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_request_opens_modal() {
        let gate = TotpGate::new();
        gate.request(Cmd::Flush).await.unwrap();
        assert_eq!(gate.phase().await, TotpPhase::AwaitingCode);
        assert_eq!(gate.pending().await, Some(Cmd::Flush));
        assert!(gate.modal().open);
    }

    #[tokio::test]
    async fn test_second_request_is_rejected() {
        let gate = TotpGate::new();
        gate.request(Cmd::Flush).await.unwrap();
        let err = gate.request(Cmd::Delete("k1".into())).await.unwrap_err();
        assert!(matches!(err, Error::TotpPending));
        assert_eq!(gate.pending().await, Some(Cmd::Flush));
    }

    #[tokio::test]
    async fn test_invalid_code_never_executes() {
        let gate = TotpGate::new();
        gate.request(Cmd::Flush).await.unwrap();
        let calls = AtomicUsize::new(0);

        for input in ["", "12345", "abcdef", "1234567"] {
            let result = gate
                .submit(input, |_, _| async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .await;
            assert!(matches!(result, Err(Error::InvalidInput(_))));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(gate.phase().await, TotpPhase::AwaitingCode);
        assert_eq!(
            gate.modal().totp_error.as_deref(),
            Some("Incomplete/Invalid TOTP code")
        );
    }

    #[tokio::test]
    async fn test_valid_code_executes_once_and_closes() {
        let gate = TotpGate::new();
        gate.request(Cmd::Delete("k1".into())).await.unwrap();
        let calls = AtomicUsize::new(0);

        let result = gate
            .submit("123456", |cmd, code| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    assert_eq!(cmd, Cmd::Delete("k1".into()));
                    assert_eq!(code.as_str(), "123456");
                    Ok(7)
                }
            })
            .await
            .unwrap();

        assert_eq!(result, TotpResolution::Completed(7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(gate.phase().await, TotpPhase::Idle);
        assert_eq!(gate.modal(), ModalState::default());
    }

    #[tokio::test]
    async fn test_rejected_code_keeps_command() {
        let gate = TotpGate::new();
        gate.request(Cmd::Flush).await.unwrap();

        let result = gate
            .submit("111111", |_, _| async { Err::<(), _>(totp_rejection()) })
            .await
            .unwrap();

        assert_eq!(
            result,
            TotpResolution::Rejected("Incorrect TOTP code".to_string())
        );
        assert_eq!(gate.phase().await, TotpPhase::AwaitingCode);
        let modal = gate.modal();
        assert!(modal.open && !modal.disabled && !modal.loading);
        assert_eq!(modal.totp_error.as_deref(), Some("Incorrect TOTP code"));

        let retry = gate
            .submit("222222", |cmd, _| async move {
                assert_eq!(cmd, Cmd::Flush);
                Ok(())
            })
            .await
            .unwrap();
        assert_eq!(retry, TotpResolution::Completed(()));
        assert_eq!(gate.phase().await, TotpPhase::Idle);
    }

    #[tokio::test]
    async fn test_other_errors_close_gate() {
        let gate = TotpGate::new();
        gate.request(Cmd::Flush).await.unwrap();

        let err = gate
            .submit("123456", |_, _| async {
                Err::<(), _>(Error::Api {
                    exception: ApiException::new("Insufficient privileges"),
                    warnings: Vec::new(),
                })
            })
            .await
            .unwrap_err();

        assert_eq!(err.param(), None);
        assert_eq!(gate.phase().await, TotpPhase::Idle);
        assert!(!gate.modal().open);
    }

    #[tokio::test]
    async fn test_submit_and_cancel_when_idle() {
        let gate: TotpGate<Cmd> = TotpGate::new();
        let err = gate
            .submit("123456", |_, _| async { Ok(()) })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::TotpState(_)));
        assert_eq!(gate.cancel().await, None);

        gate.request(Cmd::Flush).await.unwrap();
        assert_eq!(gate.cancel().await, Some(Cmd::Flush));
        assert_eq!(gate.phase().await, TotpPhase::Idle);
        assert!(!gate.modal().open);
    }

    #[tokio::test]
    async fn test_dropped_submission_resets_gate() {
        let gate = TotpGate::new();
        gate.request(Cmd::Flush).await.unwrap();

        let abandoned = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            gate.submit("123456", |_, _| async {
                tokio::time::sleep(std::time::Duration::from_secs(60)).await;
                Ok(())
            }),
        )
        .await;
        assert!(abandoned.is_err());

        assert_eq!(gate.phase().await, TotpPhase::Idle);
        assert_eq!(gate.pending().await, None);
        assert_eq!(gate.modal(), ModalState::default());

        gate.request(Cmd::Delete("k2".into())).await.unwrap();
        assert_eq!(gate.pending().await, Some(Cmd::Delete("k2".into())));
    }

    #[tokio::test]
    async fn test_modal_is_observable() {
        let gate = TotpGate::new();
        let mut modal = gate.subscribe();
        gate.request(Cmd::Flush).await.unwrap();
        modal.changed().await.unwrap();
        assert!(modal.borrow_and_update().open);
    }
}
