//! End-to-end repost runs over an in-memory group history

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::TimeZone;
use chrono::Utc;
use memsbot::config::ScanConfig;
use memsbot::models::Attachment;
use memsbot::models::Message;
use memsbot::models::SenderKind;
use memsbot::registry::BotRegistry;
use memsbot::registry::MemoryBotRegistry;
use memsbot::repost::Publisher;
use memsbot::repost::Repost;
use memsbot::scan::DateMessageAggregator;
use memsbot::scan::MessageSelector;
use memsbot::scan::MessageSource;
use memsbot::service::RepostService;
use memsbot::service::RunOutcome;
use memsbot::MemsBotError;
use memsbot::Result;

struct Chat {
    members: i64,
    /// Newest first
    messages: Vec<Message>,
}

#[derive(Default)]
struct InMemoryGroups {
    groups: HashMap<String, Chat>,
    fail_on_page: Option<usize>,
    pages_served: Mutex<usize>,
}

impl InMemoryGroups {
    fn with_group(mut self, group_id: &str, members: i64, messages: Vec<Message>) -> Self {
        self.groups
            .insert(group_id.to_string(), Chat { members, messages });
        self
    }
}

#[async_trait]
impl MessageSource for InMemoryGroups {
    async fn fetch_message_batch(
        &self,
        group_id: &str,
        before_id: Option<&str>,
        limit: u32,
    ) -> Result<Vec<Message>> {
        {
            let mut served = self.pages_served.lock().unwrap();
            *served += 1;
            if self.fail_on_page == Some(*served) {
                return Err(MemsBotError::Api {
                    status: 502,
                    message: "bad gateway".to_string(),
                });
            }
        }
        let chat = self
            .groups
            .get(group_id)
            .ok_or_else(|| MemsBotError::GroupNotFound(group_id.to_string()))?;
        let start = before_id.map_or(0, |id| {
            chat.messages
                .iter()
                .position(|m| m.id == id)
                .map_or(chat.messages.len(), |i| i + 1)
        });
        Ok(chat.messages[start..]
            .iter()
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn current_member_count(&self, group_id: &str) -> Result<i64> {
        self.groups
            .get(group_id)
            .map(|chat| chat.members)
            .ok_or_else(|| MemsBotError::GroupNotFound(group_id.to_string()))
    }
}

#[derive(Default)]
struct RecordingPublisher {
    posts: Mutex<Vec<(String, Repost)>>,
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(&self, bot_id: &str, repost: &Repost) -> Result<()> {
        self.posts
            .lock()
            .unwrap()
            .push((bot_id.to_string(), repost.clone()));
        Ok(())
    }
}

fn noon(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 17, 0, 0).unwrap()
}

fn msg(id: &str, text: &str, likes: usize, at: DateTime<Utc>) -> Message {
    Message {
        id: id.to_string(),
        name: "Alice".to_string(),
        text: text.to_string(),
        created_at: at.timestamp(),
        favorited_by: (0..likes).map(|i| format!("u{i}")).collect(),
        ..Default::default()
    }
}

fn bot_repost(id: &str, text: &str, at: DateTime<Utc>) -> Message {
    Message {
        id: id.to_string(),
        name: "MemsBot".to_string(),
        text: text.to_string(),
        sender_type: SenderKind::Bot,
        created_at: at.timestamp(),
        ..Default::default()
    }
}

struct Harness {
    service: RepostService,
    publisher: Arc<RecordingPublisher>,
    registry: Arc<MemoryBotRegistry>,
}

async fn harness(source: InMemoryGroups) -> Harness {
    let publisher = Arc::new(RecordingPublisher::default());
    let registry = Arc::new(MemoryBotRegistry::new());
    registry.add_bot("a", "bot-a").await.unwrap();
    registry.add_bot("b", "bot-b").await.unwrap();

    let service = RepostService::new(
        DateMessageAggregator::new(ScanConfig::default()),
        MessageSelector::with_seed(11),
        Arc::new(source),
        publisher.clone(),
        registry.clone(),
    );
    Harness {
        service,
        publisher,
        registry,
    }
}

#[tokio::test]
async fn test_posts_popular_message_and_records_it() {
    let source = InMemoryGroups::default().with_group(
        "a",
        4,
        vec![
            msg("3", "today", 4, noon(2024, 3, 4)),
            msg("2", "not enough", 2, noon(2022, 3, 4)),
            msg("1", "classic", 3, noon(2020, 3, 4)),
        ],
    );
    let mut h = harness(source).await;

    let outcome = h
        .service
        .run_for_group("a", None, noon(2024, 3, 4), false)
        .await
        .unwrap();

    let RunOutcome::Posted {
        bot_id,
        candidate,
        repost,
        published,
    } = outcome
    else {
        panic!("expected a post");
    };
    assert_eq!(bot_id, "bot-a");
    assert_eq!(candidate.message.id, "1");
    assert!(published);
    assert_eq!(repost.text, "\"classic\" \n\n- Alice | 3/4/20 | ❤️x3");

    let posts = h.publisher.posts.lock().unwrap().clone();
    assert_eq!(posts, vec![("bot-a".to_string(), repost)]);
    let record = h.registry.bot_for_group("a").await.unwrap().unwrap();
    assert_eq!(record.last_message_id.as_deref(), Some("1"));
}

#[tokio::test]
async fn test_dry_run_neither_posts_nor_records() {
    let source = InMemoryGroups::default().with_group(
        "a",
        4,
        vec![msg("1", "classic", 3, noon(2020, 3, 4))],
    );
    let mut h = harness(source).await;

    let outcome = h
        .service
        .run_for_group("a", None, noon(2024, 3, 4), true)
        .await
        .unwrap();

    assert!(matches!(outcome, RunOutcome::Posted { published: false, .. }));
    assert!(h.publisher.posts.lock().unwrap().is_empty());
    let record = h.registry.bot_for_group("a").await.unwrap().unwrap();
    assert_eq!(record.last_message_id, None);
}

#[tokio::test]
async fn test_nothing_popular_posts_nothing() {
    let source = InMemoryGroups::default().with_group(
        "a",
        20,
        vec![
            msg("2", "lukewarm", 7, noon(2022, 3, 4)),
            msg("1", "Like this if you are coming", 19, noon(2021, 3, 4)),
        ],
    );
    let mut h = harness(source).await;

    let outcome = h
        .service
        .run_for_group("a", None, noon(2024, 3, 4), false)
        .await
        .unwrap();

    assert_eq!(outcome, RunOutcome::NothingToPost);
    assert!(h.publisher.posts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_message_without_likes_is_never_posted() {
    // a one-member group needs zero likes to be popular
    let source = InMemoryGroups::default().with_group(
        "a",
        1,
        vec![msg("1", "nobody liked this", 0, noon(2020, 3, 4))],
    );
    let mut h = harness(source).await;

    let outcome = h
        .service
        .run_for_group("a", None, noon(2024, 3, 4), false)
        .await
        .unwrap();

    assert_eq!(outcome, RunOutcome::NothingToPost);
    assert!(h.publisher.posts.lock().unwrap().is_empty());
    let record = h.registry.bot_for_group("a").await.unwrap().unwrap();
    assert_eq!(record.last_message_id, None);
}

#[tokio::test]
async fn test_unregistered_group_without_bot_id_fails() {
    let source = InMemoryGroups::default().with_group("c", 4, Vec::new());
    let mut h = harness(source).await;

    let err = h
        .service
        .run_for_group("c", None, noon(2024, 3, 4), false)
        .await
        .unwrap_err();
    assert!(matches!(err, MemsBotError::BotNotFound(g) if g == "c"));
}

#[tokio::test]
async fn test_override_bot_posts_without_recording() {
    let source = InMemoryGroups::default().with_group(
        "a",
        4,
        vec![msg("1", "classic", 3, noon(2020, 3, 4))],
    );
    let mut h = harness(source).await;

    h.service
        .run_for_group("a", Some("test-bot"), noon(2024, 3, 4), false)
        .await
        .unwrap();

    let posts = h.publisher.posts.lock().unwrap().clone();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].0, "test-bot");
    let record = h.registry.bot_for_group("a").await.unwrap().unwrap();
    assert_eq!(record.last_message_id, None);
}

#[tokio::test]
async fn test_transport_error_aborts_run_without_posting() {
    let mut messages = Vec::new();
    for i in (0..250).rev() {
        messages.push(msg(&i.to_string(), "classic", 3, noon(2020, 3, 4)));
    }
    let mut source = InMemoryGroups::default().with_group("a", 4, messages);
    source.fail_on_page = Some(2);
    let mut h = harness(source).await;

    let err = h
        .service
        .run_for_group("a", None, noon(2024, 3, 4), false)
        .await
        .unwrap_err();

    assert!(matches!(err, MemsBotError::Api { status: 502, .. }));
    assert!(h.publisher.posts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_old_repost_is_posted_when_nothing_fresh() {
    let source = InMemoryGroups::default().with_group(
        "a",
        4,
        vec![
            bot_repost("9", "\"classic\" \n\n- Alice | 3/4/20 | ❤️x3", noon(2022, 3, 4)),
            msg("1", "classic", 3, noon(2020, 3, 4)),
        ],
    );
    let mut h = harness(source).await;

    let outcome = h
        .service
        .run_for_group("a", None, noon(2024, 3, 4), false)
        .await
        .unwrap();

    let RunOutcome::Posted { candidate, .. } = outcome else {
        panic!("expected the fallback pool to be used");
    };
    assert_eq!(candidate.message.id, "1");
}

#[tokio::test]
async fn test_groups_do_not_share_repost_history() {
    let picture = "https://i.groupme.com/cat.jpeg";
    let mut pic = msg("1", "", 3, noon(2020, 3, 4));
    pic.attachments = vec![Attachment {
        kind: "image".to_string(),
        url: Some(picture.to_string()),
    }];
    let mut reposted = bot_repost("9", " \n\n- Alice | 3/4/20 | ❤️x3", noon(2023, 3, 4));
    reposted.attachments = pic.attachments.clone();

    let source = InMemoryGroups::default()
        .with_group("a", 4, vec![reposted, pic.clone()])
        .with_group("b", 4, vec![pic]);
    let mut h = harness(source).await;

    let in_a = h
        .service
        .run_for_group("a", None, noon(2024, 3, 4), false)
        .await
        .unwrap();
    let in_b = h
        .service
        .run_for_group("b", None, noon(2024, 3, 4), false)
        .await
        .unwrap();

    // reposted in "a" last year, still fresh in "b"
    assert_eq!(in_a, RunOutcome::NothingToPost);
    let RunOutcome::Posted { repost, bot_id, .. } = in_b else {
        panic!("expected a post in b");
    };
    assert_eq!(bot_id, "bot-b");
    assert_eq!(repost.picture_url.as_deref(), Some(picture));
    assert_eq!(repost.text, " \n\n- Alice | 3/4/20 | ❤️x3");
}
