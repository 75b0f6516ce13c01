//! Event predicates and extractors.

use hearth_proto::v1::event_message::Value;
use hearth_proto::v1::notification::Payload;
use hearth_proto::v1::{EventMessage, RequestToJoin};

/// Account id carried by an account-show event.
pub fn account_id(msg: &EventMessage) -> Option<&str> {
    match &msg.value {
        Some(Value::AccountShow(show)) => show
            .account
            .as_ref()
            .map(|a| a.id.as_str())
            .filter(|id| !id.is_empty()),
        _ => None,
    }
}

/// An account became available.
pub fn account_available(msg: &EventMessage) -> bool {
    account_id(msg).is_some()
}

pub fn request_to_join(msg: &EventMessage) -> Option<&RequestToJoin> {
    match &msg.value {
        Some(Value::NotificationSend(send)) => match send.notification.as_ref()?.payload.as_ref()? {
            Payload::RequestToJoin(req) => Some(req),
        },
        _ => None,
    }
}

/// A join request for `space_id` arrived.
pub fn join_request_for(space_id: &str) -> impl Fn(&EventMessage) -> bool + Send + Sync + 'static {
    let space_id = space_id.to_string();
    move |msg: &EventMessage| request_to_join(msg).is_some_and(|req| req.space_id == space_id)
}


#[cfg(test)]
mod tests {
    use super::fixtures::{account_show, join_request};
    use super::*;

    #[test]
    fn account_show_matches() {
        let msg = account_show("acc-1");
        assert!(account_available(&msg));
        assert_eq!(account_id(&msg), Some("acc-1"));
    }

    #[test]
    fn account_show_without_id_does_not_match() {
        assert!(!account_available(&account_show("")));
        assert!(!account_available(&EventMessage::default()));
    }

    #[test]
    fn join_request_filters_by_space() {
        let pred = join_request_for("space-a");
        assert!(pred(&join_request("space-a", "id-1")));
        assert!(!pred(&join_request("space-b", "id-1")));
        assert!(!pred(&account_show("acc")));
    }
}
