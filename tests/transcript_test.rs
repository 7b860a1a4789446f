use colloquy::application::session::{EntryId, Transcript};
use colloquy::domain::{MessageId, MessageRole};

#[test]
fn given_pushed_entries_then_order_is_preserved() {
    let mut transcript = Transcript::new();
    transcript.push(MessageRole::User, "first");
    transcript.push(MessageRole::Assistant, "second");

    let contents: Vec<&str> = transcript
        .entries()
        .iter()
        .map(|e| e.content.as_str())
        .collect();
    assert_eq!(contents, vec!["first", "second"]);
}

#[test]
fn given_retagged_entry_then_content_and_position_survive() {
    let mut transcript = Transcript::new();
    let local = transcript.push(MessageRole::User, "hello");
    transcript.push(MessageRole::Assistant, "hi");

    let server_id = MessageId::new();
    assert!(transcript.retag(local, server_id));

    let entry = transcript
        .get(EntryId::Server(server_id))
        .expect("reachable under the server id");
    assert_eq!(entry.content, "hello");
    assert_eq!(transcript.entries()[0].id, EntryId::Server(server_id));
    assert!(transcript.get(local).is_none(), "local id no longer resolves");
}

#[test]
fn given_removed_entry_then_later_entries_stay_addressable() {
    let mut transcript = Transcript::new();
    let first = transcript.push(MessageRole::User, "a");
    let second = transcript.push(MessageRole::Assistant, "b");
    let third = transcript.push(MessageRole::User, "c");

    let removed = transcript.remove(first).expect("removed");
    assert_eq!(removed.content, "a");
    assert_eq!(transcript.len(), 2);

    // Index survives the shift.
    assert_eq!(transcript.get(second).expect("second").content, "b");
    assert_eq!(transcript.get(third).expect("third").content, "c");
}

#[test]
fn given_unknown_id_then_updates_report_failure() {
    let mut transcript = Transcript::new();
    let entry = transcript.push(MessageRole::User, "hello");
    transcript.remove(entry);

    assert!(!transcript.set_content(entry, "too late"));
    assert!(!transcript.retag(entry, MessageId::new()));
    assert!(transcript.remove(entry).is_none());
}

#[test]
fn given_streamed_fragments_then_set_content_replaces_in_place() {
    let mut transcript = Transcript::new();
    transcript.push(MessageRole::User, "prompt");
    let reply = transcript.push(MessageRole::Assistant, "");

    for accumulated in ["Hel", "Hello", "Hello, world!"] {
        assert!(transcript.set_content(reply, accumulated));
    }

    assert_eq!(transcript.entries()[1].content, "Hello, world!");
    assert_eq!(transcript.len(), 2);
}
