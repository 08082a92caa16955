use crate::{Call, CallType, Direction, Note};

/// Unarchived answered inbound call with no notes.
pub fn call(id: &str) -> Call {
    Call {
        id: id.to_string(),
        call_type: CallType::Answered,
        direction: Direction::Inbound,
        duration: 120,
        from: "+33100000000".to_string(),
        to: "+33200000000".to_string(),
        via: "+33300000000".to_string(),
        created_at: "2024-03-01T10:00:00.000Z".to_string(),
        is_archived: false,
        notes: Vec::new(),
    }
}

/// Call with the given type and archive flag.
pub fn call_with(id: &str, call_type: CallType, is_archived: bool) -> Call {
    Call {
        call_type,
        is_archived,
        ..call(id)
    }
}

/// A mixed page: every call type, archived and not.
pub fn mixed_page() -> Vec<Call> {
    vec![
        call_with("c-1", CallType::Missed, false),
        call_with("c-2", CallType::Answered, true),
        call_with("c-3", CallType::VoiceMail, false),
        call_with("c-4", CallType::Missed, true),
        call_with("c-5", CallType::Answered, false),
        call_with("c-6", CallType::Other("forwarded".into()), false),
    ]
}

/// Note with a generated id.
pub fn note(content: &str, created_at: &str) -> Note {
    Note {
        id: Some(format!("note-{}", next_id())),
        content: content.to_string(),
        created_at: Some(created_at.to_string()),
    }
}

fn next_id() -> u32 {
    use std::sync::atomic::{AtomicU32, Ordering};
    static COUNTER: AtomicU32 = AtomicU32::new(0);
    COUNTER.fetch_add(1, Ordering::Relaxed)
}
