//! Upgrades for runs marshaled before `had_input`, `webhook` and
//! `wait_count` were stored directly. Each missing field is inferred from
//! the run's event log.

use super::RunEnvelope;
use crate::events::{Event, EventKind};
use crate::types::WebhookCall;

pub(super) fn upgrade(run: &mut RunEnvelope) {
    if run.had_input.is_none() && run.events.iter().any(is_msg_received) {
        run.had_input = Some(true);
    }

    if run.webhook.is_none() {
        run.webhook = infer_webhook(&run.events);
    }

    if run.wait_count.is_none() {
        let waits = run
            .events
            .iter()
            .filter(|e| matches!(e.kind, EventKind::MsgWait { .. }))
            .count();
        if waits > 0 {
            run.wait_count = Some(u32::try_from(waits).unwrap_or(u32::MAX));
        }
    }
}

fn is_msg_received(event: &Event) -> bool {
    matches!(event.kind, EventKind::MsgReceived { .. })
}

/// The last `webhook_called` event whose step also saved a result carrying
/// the parsed response as `extra`.
fn infer_webhook(events: &[Event]) -> Option<WebhookCall> {
    events.iter().rev().find_map(|called| {
        let EventKind::WebhookCalled {
            url,
            status_code,
            elapsed_ms,
            request,
            response,
        } = &called.kind
        else {
            return None;
        };
        let step_uuid = called.step_uuid?;

        let extra = events.iter().find_map(|e| match &e.kind {
            EventKind::RunResultChanged {
                extra: Some(extra), ..
            } if e.step_uuid == Some(step_uuid) => Some(extra.clone()),
            _ => None,
        })?;

        Some(WebhookCall {
            url: url.clone(),
            method: request_method(request),
            status_code: *status_code,
            request: request.clone(),
            response: response.clone(),
            response_json: Some(extra),
            elapsed_ms: *elapsed_ms,
            created_on: called.created_on,
        })
    })
}

/// Method from the request line of a raw HTTP trace, e.g. `POST /x HTTP/1.1`.
fn request_method(request: &str) -> String {
    request
        .split_whitespace()
        .next()
        .filter(|m| !m.is_empty() && m.chars().all(|c| c.is_ascii_uppercase()))
        .unwrap_or("GET")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn legacy_run(events: serde_json::Value) -> RunEnvelope {
        serde_json::from_value(json!({
            "uuid": "2a4a0b0a-25e4-4a2d-8b28-5d1b9a6c7e10",
            "flow": {"uuid": "50c3706e-fedb-42c0-8eab-dda3335714b7", "name": "Registration"},
            "status": "completed",
            "created_on": "2026-03-01T10:00:00Z",
            "modified_on": "2026-03-01T10:05:00Z",
            "events": events
        }))
        .unwrap()
    }

    const STEP1: &str = "f8b2f1a5-1c3e-4a63-b8a1-6a3f8c1e2d01";
    const STEP2: &str = "f8b2f1a5-1c3e-4a63-b8a1-6a3f8c1e2d02";

    #[test]
    fn infers_fields_from_events() {
        let mut run = legacy_run(json!([
            {"type": "msg_wait", "created_on": "2026-03-01T10:00:01Z", "step_uuid": STEP1},
            {"type": "msg_received", "created_on": "2026-03-01T10:01:00Z", "step_uuid": STEP1,
             "msg": {"uuid": "9bf91c2b-ce58-4cef-aacc-281e03f69ab5", "text": "yes"}},
            {"type": "webhook_called", "created_on": "2026-03-01T10:01:01Z", "step_uuid": STEP2,
             "url": "http://example.com/lookup", "status_code": 200, "elapsed_ms": 12,
             "request": "POST /lookup HTTP/1.1", "response": "{\"ok\":true}"},
            {"type": "run_result_changed", "created_on": "2026-03-01T10:01:01Z", "step_uuid": STEP2,
             "name": "Lookup", "value": "200", "category": "Success", "extra": {"ok": true}},
            {"type": "msg_wait", "created_on": "2026-03-01T10:01:02Z", "step_uuid": STEP2}
        ]));
        upgrade(&mut run);

        assert_eq!(run.had_input, Some(true));
        assert_eq!(run.wait_count, Some(2));
        let webhook = run.webhook.expect("webhook inferred");
        assert_eq!(webhook.method, "POST");
        assert_eq!(webhook.status_code, 200);
        assert_eq!(webhook.elapsed_ms, 12);
        assert_eq!(webhook.response_json, Some(json!({"ok": true})));
    }

    #[test]
    fn webhook_needs_a_result_on_the_same_step() {
        let mut run = legacy_run(json!([
            {"type": "webhook_called", "created_on": "2026-03-01T10:01:01Z", "step_uuid": STEP2,
             "url": "http://example.com/lookup", "status_code": 200},
            {"type": "run_result_changed", "created_on": "2026-03-01T10:01:01Z", "step_uuid": STEP1,
             "name": "Lookup", "value": "200", "extra": {"ok": true}}
        ]));
        upgrade(&mut run);
        assert!(run.webhook.is_none());
        assert_eq!(run.had_input, None);
        assert_eq!(run.wait_count, None);
    }

    #[test]
    fn present_fields_are_left_alone() {
        let mut run = legacy_run(json!([
            {"type": "msg_wait", "created_on": "2026-03-01T10:00:01Z", "step_uuid": STEP1}
        ]));
        run.wait_count = Some(5);
        upgrade(&mut run);
        assert_eq!(run.wait_count, Some(5));
    }

    #[test]
    fn request_method_falls_back_to_get() {
        assert_eq!(request_method("PUT /x HTTP/1.1"), "PUT");
        assert_eq!(request_method(""), "GET");
        assert_eq!(request_method("garbage"), "GET");
    }
}
