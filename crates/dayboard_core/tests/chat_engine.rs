use chrono::TimeDelta;
use dayboard_core::{
    local_timestamp, Author, ChatEngine, ChatMessage, ChatThread, Clock, DeliveryStatus,
    LoopbackTransport, ManualClock, MessageTransport, RecencyBucket, RegenerateError, Responder,
    ThreadId, TransportError,
};
use std::cell::RefCell;
use std::rc::Rc;

fn clock_at_jan_14() -> ManualClock {
    ManualClock::new(local_timestamp(2024, 1, 14, 12, 0, 0).unwrap())
}

fn engine_with_thread(clock: &ManualClock) -> (ChatEngine, ThreadId) {
    let mut chat = ChatEngine::new(clock.shared());
    let thread_id = chat.create_thread("Current Conversation");
    (chat, thread_id)
}

#[test]
fn sent_then_reply_lifecycle() {
    let clock = clock_at_jan_14();
    let (mut chat, thread_id) = engine_with_thread(&clock);

    chat.set_input("hi");
    let message_id = chat.send().unwrap();
    assert_eq!(chat.input(), "");

    let thread = chat.thread(thread_id).unwrap();
    assert_eq!(thread.message_count(), 1);
    assert_eq!(thread.messages[0].content, "hi");
    assert_eq!(thread.messages[0].status, Some(DeliveryStatus::Sending));
    assert!(chat.is_typing());

    clock.advance_ms(1_000);
    assert_eq!(chat.tick(), 1);
    let sent = chat.thread(thread_id).unwrap().message(message_id).unwrap();
    assert_eq!(sent.status, Some(DeliveryStatus::Sent));
    assert!(chat.is_typing());

    clock.advance_ms(1_000);
    assert_eq!(chat.tick(), 1);
    let thread = chat.thread(thread_id).unwrap();
    assert_eq!(thread.message_count(), 2);
    assert_eq!(thread.messages[1].author, Author::Assistant);
    assert_eq!(thread.messages[1].status, None);
    assert!(!chat.is_typing());
    assert!(!chat.has_pending_timers());
}

#[test]
fn send_trims_content() {
    let clock = clock_at_jan_14();
    let (mut chat, thread_id) = engine_with_thread(&clock);

    chat.send_message("  hello there \n").unwrap();
    assert_eq!(
        chat.thread(thread_id).unwrap().messages[0].content,
        "hello there"
    );
}

#[test]
fn overlapping_sends_keep_independent_timers() {
    let clock = clock_at_jan_14();
    let (mut chat, thread_id) = engine_with_thread(&clock);

    chat.send_message("first").unwrap();
    clock.advance_ms(500);
    chat.send_message("second").unwrap();

    clock.advance_ms(1_500);
    chat.tick();
    let thread = chat.thread(thread_id).unwrap();
    assert!(thread
        .messages
        .iter()
        .filter(|message| message.is_user())
        .all(|message| message.status == Some(DeliveryStatus::Sent)));
    assert_eq!(thread.message_count(), 3);
    assert!(!chat.is_typing());

    clock.advance_ms(500);
    chat.tick();
    assert_eq!(chat.thread(thread_id).unwrap().message_count(), 4);
}

#[test]
fn regenerate_moves_the_replacement_to_the_bottom() {
    let clock = clock_at_jan_14();
    let (mut chat, thread_id) = engine_with_thread(&clock);

    chat.send_message("question one").unwrap();
    clock.advance_ms(2_000);
    chat.tick();
    chat.send_message("question two").unwrap();
    clock.advance_ms(2_000);
    chat.tick();

    let before: Vec<_> = chat.thread(thread_id).unwrap().messages.clone();
    assert_eq!(before.len(), 4);
    let target = before[1].id;

    chat.regenerate(thread_id, target).unwrap();
    assert!(chat.is_typing());
    clock.advance_ms(2_000);
    chat.tick();

    let after = &chat.thread(thread_id).unwrap().messages;
    assert_eq!(after.len(), 4);
    assert!(after.iter().all(|message| message.id != target));
    let kept: Vec<_> = after[..3].iter().map(|message| message.id).collect();
    assert_eq!(kept, vec![before[0].id, before[2].id, before[3].id]);
    assert_eq!(after[3].author, Author::Assistant);
    assert!(after[3].content.contains("regenerated"));
    assert!(!chat.is_typing());
}

#[test]
fn regenerate_rejects_user_messages_and_unknown_ids() {
    let clock = clock_at_jan_14();
    let (mut chat, thread_id) = engine_with_thread(&clock);
    let user_message = chat.send_message("hi").unwrap();

    assert_eq!(
        chat.regenerate(thread_id, user_message),
        Err(RegenerateError::NotAssistantMessage(user_message))
    );
    let missing = uuid::Uuid::new_v4();
    assert_eq!(
        chat.regenerate(thread_id, missing),
        Err(RegenerateError::MessageNotFound(missing))
    );
    assert_eq!(
        chat.regenerate(missing, user_message),
        Err(RegenerateError::ThreadNotFound(missing))
    );
}

#[test]
fn timers_for_a_deleted_thread_are_no_ops() {
    let clock = clock_at_jan_14();
    let (mut chat, thread_id) = engine_with_thread(&clock);
    let other = chat.create_thread("Other");
    chat.select_thread(thread_id);
    chat.send_message("hi").unwrap();

    assert!(chat.delete_thread(thread_id));
    assert_eq!(chat.active_thread_id(), Some(other));

    clock.advance_ms(5_000);
    assert_eq!(chat.tick(), 2);
    assert_eq!(chat.thread(other).unwrap().message_count(), 0);
}

#[test]
fn deleting_the_last_thread_leaves_none_active() {
    let clock = clock_at_jan_14();
    let (mut chat, thread_id) = engine_with_thread(&clock);

    assert!(chat.delete_thread(thread_id));
    assert!(!chat.delete_thread(thread_id));
    assert_eq!(chat.active_thread_id(), None);
    assert!(!chat.select_thread(thread_id));
}

#[test]
fn threads_bucket_by_recency() {
    let clock = clock_at_jan_14();
    let now = local_timestamp(2024, 1, 14, 12, 0, 0).unwrap();
    let mut chat = ChatEngine::new(clock.shared());
    let threads = [
        ChatThread::new("Today", now),
        ChatThread::new("Yesterday", now - TimeDelta::days(1)),
        ChatThread::new("Older", now - TimeDelta::days(10)),
    ];
    let [today, yesterday, older] = [threads[0].id, threads[1].id, threads[2].id];
    for thread in threads {
        assert!(chat.insert_thread(thread));
    }

    let groups = chat.grouped_threads("");
    let buckets: Vec<_> = groups.iter().map(|group| group.bucket).collect();
    assert_eq!(
        buckets,
        vec![
            RecencyBucket::Today,
            RecencyBucket::Yesterday,
            RecencyBucket::Older
        ]
    );
    assert_eq!(groups[0].items[0].id, today);
    assert_eq!(groups[1].items[0].id, yesterday);
    assert_eq!(groups[2].items[0].id, older);

    let searched = chat.grouped_threads("OLD");
    assert_eq!(searched.len(), 1);
    assert_eq!(searched[0].bucket, RecencyBucket::Older);
}

#[test]
fn message_appends_do_not_touch_thread_updated_at() {
    let clock = clock_at_jan_14();
    let (mut chat, thread_id) = engine_with_thread(&clock);
    let created = chat.thread(thread_id).unwrap().updated_at;

    clock.advance_ms(60_000);
    chat.send_message("hi").unwrap();
    clock.advance_ms(2_000);
    chat.tick();
    assert_eq!(chat.thread(thread_id).unwrap().updated_at, created);
}

struct OfflineTransport;

impl MessageTransport for OfflineTransport {
    fn send(&mut self, _thread_id: ThreadId, _message: &ChatMessage) -> Result<(), TransportError> {
        Err(TransportError::Offline)
    }
}

#[test]
fn transport_failure_marks_error_and_sent_timer_keeps_it() {
    let clock = clock_at_jan_14();
    let (mut chat, thread_id) = engine_with_thread(&clock);
    chat.set_transport(OfflineTransport);

    let message_id = chat.send_message("hi").unwrap();
    clock.advance_ms(1_000);
    chat.tick();

    let message = chat.thread(thread_id).unwrap().message(message_id).unwrap();
    assert_eq!(message.status, Some(DeliveryStatus::Error));
}

#[test]
fn mark_failed_only_applies_while_sending() {
    let clock = clock_at_jan_14();
    let (mut chat, thread_id) = engine_with_thread(&clock);
    let failing = chat.send_message("first").unwrap();
    assert!(chat.mark_failed(thread_id, failing));

    let delivered = chat.send_message("second").unwrap();
    clock.advance_ms(1_000);
    chat.tick();
    assert!(!chat.mark_failed(thread_id, delivered));
    assert_eq!(
        chat.thread(thread_id).unwrap().message(failing).unwrap().status,
        Some(DeliveryStatus::Error)
    );
}

#[derive(Clone, Default)]
struct RecordingResponder {
    prompts: Rc<RefCell<Vec<String>>>,
}

impl Responder for RecordingResponder {
    fn reply(&mut self, _thread: &ChatThread, prompt: &str) -> String {
        self.prompts.borrow_mut().push(prompt.to_string());
        format!("echo: {prompt}")
    }

    fn regenerate(&mut self, _thread: &ChatThread, previous: &ChatMessage) -> String {
        format!("{} (again)", previous.content)
    }
}

#[test]
fn responder_port_supplies_reply_content() {
    let clock = clock_at_jan_14();
    let (mut chat, thread_id) = engine_with_thread(&clock);
    let responder = RecordingResponder::default();
    chat.set_responder(responder.clone());

    chat.send_message(" ping ").unwrap();
    clock.advance_ms(2_000);
    chat.tick();

    assert_eq!(*responder.prompts.borrow(), vec!["ping".to_string()]);
    let reply = &chat.thread(thread_id).unwrap().messages[1];
    assert_eq!(reply.content, "echo: ping");
}

#[test]
fn input_status_and_export() {
    let clock = clock_at_jan_14();
    let (mut chat, thread_id) = engine_with_thread(&clock);

    chat.set_input("héllo");
    let status = chat.input_status();
    assert_eq!(status.label(), "5/2000");
    assert!(!status.is_over_limit());

    chat.send().unwrap();
    let json = chat.export_thread(thread_id).unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["title"], "Current Conversation");
    assert_eq!(value["messages"][0]["author"], "user");
    assert_eq!(value["messages"][0]["status"], "sending");
    assert!(chat.export_thread(uuid::Uuid::new_v4()).is_none());
}

#[test]
fn insert_thread_ignores_a_taken_id() {
    let clock = clock_at_jan_14();
    let mut chat = ChatEngine::new(clock.shared());
    let original = ChatThread::new("Original", clock.now());
    let mut impostor = ChatThread::new("Impostor", clock.now());
    impostor.id = original.id;

    assert!(chat.insert_thread(original.clone()));
    assert!(!chat.insert_thread(impostor));
    assert_eq!(chat.threads().len(), 1);
    assert_eq!(chat.thread(original.id).unwrap().title, "Original");
    assert_eq!(chat.active_thread_id(), Some(original.id));
}

#[test]
fn view_tracks_typing_input_and_history_across_a_send() {
    let clock = clock_at_jan_14();
    let (mut chat, thread_id) = engine_with_thread(&clock);
    chat.set_input("draft");

    let idle = chat.view("");
    assert_eq!(idle.active.map(|thread| thread.id), Some(thread_id));
    assert!(!idle.is_typing);
    assert_eq!(idle.input.chars, 5);
    assert_eq!(idle.input.max, 2_000);

    chat.send().unwrap();
    let sending = chat.view("");
    assert!(sending.is_typing);
    assert_eq!(sending.input.chars, 0);
    assert_eq!(sending.active.unwrap().message_count(), 1);
    assert_eq!(sending.history.len(), 1);
    assert_eq!(sending.history[0].bucket, RecencyBucket::Today);
    assert_eq!(sending.history[0].items[0].id, thread_id);

    clock.advance_ms(2_000);
    chat.tick();
    let replied = chat.view("");
    assert!(!replied.is_typing);
    assert_eq!(replied.active.unwrap().message_count(), 2);
    assert!(chat.view("no such title").history.is_empty());
}

#[test]
fn summaries_report_counts_and_the_active_thread() {
    let clock = clock_at_jan_14();
    let (mut chat, first) = engine_with_thread(&clock);
    chat.send_message("hello").unwrap();
    let second = chat.create_thread("Second");

    let summaries = chat.summaries("");
    let rows: Vec<_> = summaries
        .iter()
        .map(|summary| (summary.thread.id, summary.message_count, summary.is_active))
        .collect();
    assert_eq!(rows, vec![(second, 0, true), (first, 1, false)]);

    let searched = chat.summaries("current");
    assert_eq!(searched.len(), 1);
    assert_eq!(searched[0].thread.id, first);
    assert!(!searched[0].is_active);
}

#[test]
fn typing_is_tracked_per_thread() {
    let clock = clock_at_jan_14();
    let (mut chat, first) = engine_with_thread(&clock);
    chat.send_message("hello").unwrap();
    let second = chat.create_thread("Second");

    assert!(chat.is_typing_in(first));
    assert!(!chat.is_typing_in(second));
    assert!(!chat.is_typing());

    chat.select_thread(first);
    assert!(chat.is_typing());
    clock.advance_ms(2_000);
    chat.tick();
    assert!(!chat.is_typing_in(first));
}

#[test]
fn shared_loopback_counts_deliveries() {
    let clock = clock_at_jan_14();
    let (mut chat, _) = engine_with_thread(&clock);
    let transport = LoopbackTransport::shared();
    chat.set_transport(transport.clone());

    chat.send_message("one").unwrap();
    chat.send_message("two").unwrap();
    assert_eq!(transport.borrow().delivered(), 2);
}

#[test]
fn late_tick_stamps_the_reply_with_its_scheduled_time() {
    let clock = clock_at_jan_14();
    let (mut chat, thread_id) = engine_with_thread(&clock);
    let sent_at = clock.now();
    chat.send_message("hi").unwrap();

    clock.advance_ms(7_500);
    assert_eq!(chat.tick(), 2);
    let reply = &chat.thread(thread_id).unwrap().messages[1];
    assert_eq!(reply.author, Author::Assistant);
    assert_eq!(reply.timestamp, sent_at + TimeDelta::milliseconds(2_000));
}

#[test]
fn late_tick_stamps_a_regeneration_with_its_scheduled_time() {
    let clock = clock_at_jan_14();
    let (mut chat, thread_id) = engine_with_thread(&clock);
    chat.send_message("hi").unwrap();
    clock.advance_ms(2_000);
    chat.tick();
    let target = chat.thread(thread_id).unwrap().messages[1].id;

    let requested_at = clock.now();
    chat.regenerate(thread_id, target).unwrap();
    clock.advance_ms(30_000);
    chat.tick();
    let replacement = &chat.thread(thread_id).unwrap().messages[1];
    assert_ne!(replacement.id, target);
    assert_eq!(
        replacement.timestamp,
        requested_at + TimeDelta::milliseconds(2_000)
    );
}

#[test]
fn second_regeneration_of_a_pending_target_is_a_no_op() {
    let clock = clock_at_jan_14();
    let (mut chat, thread_id) = engine_with_thread(&clock);
    chat.send_message("hi").unwrap();
    clock.advance_ms(2_000);
    chat.tick();
    let target = chat.thread(thread_id).unwrap().messages[1].id;

    chat.regenerate(thread_id, target).unwrap();
    clock.advance_ms(500);
    chat.regenerate(thread_id, target).unwrap();

    clock.advance_ms(1_500);
    assert_eq!(chat.tick(), 1);
    assert!(!chat.is_typing());
    clock.advance_ms(500);
    assert_eq!(chat.tick(), 1);

    let messages = &chat.thread(thread_id).unwrap().messages;
    assert_eq!(messages.len(), 2);
    assert!(messages.iter().all(|message| message.id != target));
    let replacements = messages
        .iter()
        .filter(|message| message.content.contains("regenerated"))
        .count();
    assert_eq!(replacements, 1);
    assert!(!chat.is_typing());
    assert!(!chat.has_pending_timers());
}
