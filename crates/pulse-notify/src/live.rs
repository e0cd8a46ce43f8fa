//! Mapping server-pushed events to notification payloads

use crate::format::excerpt;
use pulse_core::{NotificationData, RemoteEvent, UserId};

/// Payload for a remote event, or `None` when it should not notify
///
/// Presence events never notify. Events caused by `current_user` are
/// dropped, and assignments only notify their assignee. Without a known
/// current user every event is taken at face value.
#[must_use]
pub fn notification_for(
    event: &RemoteEvent,
    current_user: Option<&UserId>,
    excerpt_chars: usize,
) -> Option<NotificationData> {
    let is_me = |id: Option<&UserId>| match (id, current_user) {
        (Some(id), Some(me)) => id == me,
        _ => false,
    };

    match event {
        RemoteEvent::TaskAssigned {
            task_id,
            task_name,
            assignee_id,
            actor_id,
            actor_name,
            project_name,
        } => {
            let for_me = current_user.map_or(true, |me| me == assignee_id);
            (for_me && !is_me(actor_id.as_ref())).then(|| NotificationData::TaskAssigned {
                task_id: *task_id,
                task_name: task_name.clone(),
                assigned_by: actor_name.clone(),
                project_name: project_name.clone(),
            })
        }
        RemoteEvent::TaskUpdated {
            task_id,
            task_name,
            changes,
            actor_id,
            actor_name,
        } => (!is_me(actor_id.as_ref())).then(|| NotificationData::TaskUpdated {
            task_id: *task_id,
            task_name: task_name.clone(),
            updated_by: actor_name.clone(),
            changes: changes.clone(),
        }),
        RemoteEvent::TaskCompleted {
            task_id,
            task_name,
            actor_id,
            actor_name,
        } => (!is_me(actor_id.as_ref())).then(|| NotificationData::TaskCompleted {
            task_id: *task_id,
            task_name: task_name.clone(),
            completed_by: actor_name.clone(),
        }),
        RemoteEvent::ProjectUpdated {
            project_id,
            project_name,
            summary,
            actor_id,
        } => (!is_me(actor_id.as_ref())).then(|| NotificationData::ProjectUpdate {
            project_id: *project_id,
            project_name: project_name.clone(),
            summary: summary.clone(),
        }),
        RemoteEvent::CommentAdded {
            entity,
            author_id,
            author_name,
            body,
        } => (!is_me(Some(author_id))).then(|| NotificationData::CommentAdded {
            entity: *entity,
            author: author_name.clone(),
            excerpt: excerpt(body, excerpt_chars),
        }),
        RemoteEvent::Mentioned {
            entity,
            author_id,
            author_name,
            body,
        } => (!is_me(Some(author_id))).then(|| NotificationData::Mention {
            entity: *entity,
            author: author_name.clone(),
            excerpt: excerpt(body, excerpt_chars),
        }),
        RemoteEvent::TeamUpdated {
            member_name,
            message,
        } => Some(NotificationData::TeamUpdate {
            member_name: member_name.clone(),
            message: message.clone(),
        }),
        RemoteEvent::BudgetThreshold {
            project_id,
            project_name,
            percent_used,
        } => Some(NotificationData::BudgetAlert {
            project_id: *project_id,
            project_name: project_name.clone(),
            percent_used: *percent_used,
        }),
        RemoteEvent::SystemMessage { message } => Some(NotificationData::System {
            message: message.clone(),
        }),
        RemoteEvent::UserJoined { .. }
        | RemoteEvent::UserLeft { .. }
        | RemoteEvent::UserTyping { .. }
        | RemoteEvent::PresenceUpdate { .. }
        | RemoteEvent::LocationRoster { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_core::{EntityRef, Location, NotificationKind};

    fn assigned(assignee: &str, actor: &str) -> RemoteEvent {
        RemoteEvent::TaskAssigned {
            task_id: 5,
            task_name: "Wireframes".into(),
            assignee_id: UserId::new(assignee),
            actor_id: Some(UserId::new(actor)),
            actor_name: Some(actor.to_uppercase()),
            project_name: Some("Website Redesign".into()),
        }
    }

    #[test]
    fn assignment_notifies_only_the_assignee() {
        let me = UserId::new("me");
        let data = notification_for(&assigned("me", "boss"), Some(&me), 120).unwrap();
        assert_eq!(data.kind(), NotificationKind::TaskAssigned);
        assert!(notification_for(&assigned("other", "boss"), Some(&me), 120).is_none());
    }

    #[test]
    fn own_actions_are_ignored() {
        let me = UserId::new("me");
        assert!(notification_for(&assigned("me", "me"), Some(&me), 120).is_none());

        let comment = RemoteEvent::CommentAdded {
            entity: EntityRef::Task(2),
            author_id: me.clone(),
            author_name: "Me".into(),
            body: "note to self".into(),
        };
        assert!(notification_for(&comment, Some(&me), 120).is_none());
        assert!(notification_for(&comment, None, 120).is_some());
    }

    #[test]
    fn mention_body_is_excerpted() {
        let event = RemoteEvent::Mentioned {
            entity: EntityRef::Project(1),
            author_id: UserId::new("ana"),
            author_name: "Ana".into(),
            body: "@me could you take a look at the new hero section today".into(),
        };
        let Some(NotificationData::Mention { excerpt, .. }) =
            notification_for(&event, Some(&UserId::new("me")), 12)
        else {
            panic!("expected mention");
        };
        assert_eq!(excerpt, "@me could yo…");
    }

    #[test]
    fn presence_events_never_notify() {
        let event = RemoteEvent::UserLeft {
            user_id: UserId::new("ana"),
            location: Location::project(1),
        };
        assert!(notification_for(&event, None, 120).is_none());
    }
}
