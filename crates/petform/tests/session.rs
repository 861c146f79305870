//! Tests for form sessions: visibility, submission and observation.

mod common;
use common::*;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use petform::{
    DispatchError, FormEvent, FormPayload, FormSession, RuleKind, SelectOption, SubmissionError,
    SubmitBehavior, SubmitStatus, ValidationBehavior,
};
use tokio::sync::Notify;

fn fill_tutor(session: &FormSession) {
    session.set_value("name", "Ana Souza").unwrap();
    session.set_value("cpf", VALID_CPF).unwrap();
    session.set_value("phone", VALID_PHONE).unwrap();
}

/// A session whose dispatcher blocks until `gate` is notified.
fn gated_session(gate: Arc<Notify>, calls: Arc<AtomicUsize>) -> FormSession {
    let config = tutor_form(
        SubmitBehavior::DispatchExternal,
        ValidationBehavior::OnChange,
    );
    FormSession::with_dispatcher(config, move |_: FormPayload| {
        calls.fetch_add(1, Ordering::SeqCst);
        let gate = Arc::clone(&gate);
        async move {
            gate.notified().await;
            Ok::<(), DispatchError>(())
        }
    })
    .unwrap()
}

/// A session whose first dispatch blocks until `gate` is notified; later
/// dispatches succeed at once.
fn first_dispatch_gated(gate: Arc<Notify>, calls: Arc<AtomicUsize>) -> FormSession {
    let config = tutor_form(
        SubmitBehavior::DispatchExternal,
        ValidationBehavior::OnChange,
    );
    FormSession::with_dispatcher(config, move |_: FormPayload| {
        let attempt = calls.fetch_add(1, Ordering::SeqCst);
        let gate = Arc::clone(&gate);
        async move {
            if attempt == 0 {
                gate.notified().await;
            }
            Ok::<(), DispatchError>(())
        }
    })
    .unwrap()
}

async fn wait_for_dispatch(session: &FormSession) {
    while session.status() != SubmitStatus::Submitting {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn hidden_fields_are_excluded() {
    let session = FormSession::new(tutor_form(
        SubmitBehavior::LocalOnly,
        ValidationBehavior::OnChange,
    ))
    .unwrap();
    fill_tutor(&session);

    let payload = session.submit().await.unwrap();
    assert!(!payload.contains_key("clinic"));
    assert_eq!(payload.get("cpf").map(String::as_str), Some(VALID_CPF));
    assert_eq!(payload.get("referred").map(String::as_str), Some("false"));

    session.set_value("referred", "true").unwrap();
    let err = session.submit().await.unwrap_err();
    let SubmissionError::Invalid(errors) = &err else {
        panic!("expected validation failure, got {err:?}");
    };
    assert_eq!(errors.len(), 1);
    assert!(errors.has_field("clinic"));
    assert_eq!(errors.of_kind(RuleKind::Required).count(), 1);

    session.set_value("clinic", "Clinica Bichos").unwrap();
    let payload = session.submit().await.unwrap();
    assert_eq!(
        payload.get("clinic").map(String::as_str),
        Some("Clinica Bichos")
    );
}

#[tokio::test]
async fn double_submit_dispatches_once() {
    let gate = Arc::new(Notify::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let session = gated_session(Arc::clone(&gate), Arc::clone(&calls));
    fill_tutor(&session);

    let first = tokio::spawn({
        let session = session.clone();
        async move { session.submit().await }
    });
    wait_for_dispatch(&session).await;

    assert_eq!(session.submit().await, Err(SubmissionError::InProgress));

    gate.notify_one();
    let payload = first.await.unwrap().unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(session.status(), SubmitStatus::Succeeded(payload));
}

#[tokio::test]
async fn dropped_submit_frees_the_form() {
    let gate = Arc::new(Notify::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let session = first_dispatch_gated(Arc::clone(&gate), Arc::clone(&calls));
    fill_tutor(&session);
    let mut events = session.subscribe();

    let timed_out = tokio::time::timeout(Duration::from_millis(50), session.submit()).await;
    assert!(timed_out.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(session.status(), SubmitStatus::Idle);

    let mut released = false;
    while let Ok(event) = events.try_recv() {
        released = event == FormEvent::StatusChanged(SubmitStatus::Idle);
    }
    assert!(released);

    let payload = session.submit().await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(session.status(), SubmitStatus::Succeeded(payload));
}

#[tokio::test]
async fn replacing_configuration_frees_a_busy_form() {
    let gate = Arc::new(Notify::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let session = first_dispatch_gated(Arc::clone(&gate), Arc::clone(&calls));
    fill_tutor(&session);

    let stale = tokio::spawn({
        let session = session.clone();
        async move { session.submit().await }
    });
    wait_for_dispatch(&session).await;
    assert_eq!(session.submit().await, Err(SubmissionError::InProgress));

    session.replace_configuration(None).unwrap();
    assert_eq!(session.status(), SubmitStatus::Idle);

    fill_tutor(&session);
    let payload = session.submit().await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    gate.notify_one();
    assert_eq!(stale.await.unwrap(), Err(SubmissionError::Superseded));
    assert_eq!(session.status(), SubmitStatus::Succeeded(payload));
}

#[tokio::test]
async fn replacing_configuration_supersedes_dispatch() {
    let gate = Arc::new(Notify::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let session = gated_session(Arc::clone(&gate), Arc::clone(&calls));
    fill_tutor(&session);
    let mut events = session.subscribe();

    let pending = tokio::spawn({
        let session = session.clone();
        async move { session.submit().await }
    });
    wait_for_dispatch(&session).await;

    session.replace_configuration(None).unwrap();
    assert_eq!(session.state("name").unwrap().raw_value, "");

    gate.notify_one();
    assert_eq!(pending.await.unwrap(), Err(SubmissionError::Superseded));
    assert_eq!(session.status(), SubmitStatus::Idle);

    while let Ok(event) = events.try_recv() {
        assert!(
            !matches!(event, FormEvent::FormSubmitted { is_valid: true, .. }),
            "superseded submission must not report success"
        );
    }
}

#[tokio::test]
async fn failed_dispatch_allows_retry() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&attempts);
    let config = tutor_form(
        SubmitBehavior::DispatchExternal,
        ValidationBehavior::OnChange,
    );
    let session = FormSession::with_dispatcher(config, move |_: FormPayload| {
        let attempt = counter.fetch_add(1, Ordering::SeqCst);
        async move {
            if attempt == 0 {
                Err(DispatchError::new("timeout"))
            } else {
                Ok(())
            }
        }
    })
    .unwrap();
    fill_tutor(&session);

    let err = session.submit().await.unwrap_err();
    assert!(matches!(err, SubmissionError::Dispatch(_)));
    assert_eq!(session.state("phone").unwrap().raw_value, VALID_PHONE);

    session.submit().await.unwrap();
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn watchers_see_field_updates() {
    let session = FormSession::new(tutor_form(
        SubmitBehavior::LocalOnly,
        ValidationBehavior::OnBlur,
    ))
    .unwrap();
    let mut cpf = session.watch("cpf").unwrap();

    let writer = session.clone();
    tokio::spawn(async move {
        writer.set_value("cpf", "12345678900").unwrap();
    });

    cpf.changed().await.unwrap();
    let state = cpf.borrow_and_update().clone();
    assert_eq!(state.display_value, "123.456.789-00");
    assert!(!state.is_touched);
    assert!(state.is_valid());

    session.touch("cpf").unwrap();
    cpf.changed().await.unwrap();
    assert_eq!(cpf.borrow().errors[0].kind, RuleKind::Cpf);
}

#[tokio::test]
async fn options_arrive_after_render() {
    let session = FormSession::new(tutor_form(
        SubmitBehavior::LocalOnly,
        ValidationBehavior::OnChange,
    ))
    .unwrap();
    let mut events = session.subscribe();
    assert!(session.store().options("veterinarian").is_empty());

    let loader = session.clone();
    let handle = tokio::spawn(async move {
        loader.set_options(
            "veterinarian",
            vec![
                SelectOption::new("vet-1", "Dr. Ramos"),
                SelectOption::new("vet-2", "Dra. Melo"),
            ],
        )
    });
    handle.await.unwrap().unwrap();

    match events.recv().await.unwrap() {
        FormEvent::OptionsChanged { field_id, options } => {
            assert_eq!(field_id, "veterinarian");
            assert_eq!(options.len(), 2);
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert_eq!(session.store().options("veterinarian")[1].key, "vet-2");
}
