//! Self-destruct timers: when a countdown starts, and what happens to the
//! media once it runs out.

use tracing::debug;

use quill_types::attributes::VIEW_ONCE_TIMEOUT;
use quill_types::{Media, Message, MessageAttribute};

/// Whether starting a countdown should also check for immediate expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryCheck {
    Deferred,
    Immediate { now: i32 },
}

#[derive(Debug, Default, PartialEq)]
pub struct CountdownStart {
    /// Timer attributes whose countdown was started by this call.
    pub timers: Vec<MessageAttribute>,
    /// Replacement media list when a started timer had already run out.
    pub expired_media: Option<Vec<Media>>,
}

impl CountdownStart {
    pub fn started(&self) -> bool {
        !self.timers.is_empty()
    }
}

/// Widens `timeout` to the media's playback length. View-once is never widened.
pub fn widen_timeout(timeout: i32, media_duration: Option<i32>) -> i32 {
    match media_duration {
        Some(duration) if timeout != VIEW_ONCE_TIMEOUT => timeout.max(duration),
        _ => timeout,
    }
}

pub fn is_elapsed(timeout: i32, countdown_begin_time: i32, now: i32) -> bool {
    timeout == VIEW_ONCE_TIMEOUT || i64::from(now) >= i64::from(countdown_begin_time) + i64::from(timeout)
}

fn countdown_pending(countdown_begin_time: Option<i32>) -> bool {
    matches!(countdown_begin_time, None | Some(0))
}

/// Swaps every destructible media item for its expired placeholder.
pub fn expire_media(media: &[Media]) -> Vec<Media> {
    media
        .iter()
        .map(|item| match item.expired_placeholder() {
            Some(content) => Media::Expired { content },
            None => item.clone(),
        })
        .collect()
}

/// Starts every timer on `message` that has not started yet, anchored at `anchor`.
///
/// Only messages carrying self-destructing media are affected. In secret chats
/// the peer's own timer destroys content, so no expiry is evaluated there.
pub fn begin_countdown(message: &Message, anchor: i32, check: ExpiryCheck) -> CountdownStart {
    if !message.contains_secret_media() {
        return CountdownStart::default();
    }

    let duration = message.secret_media_duration();
    let mut result = CountdownStart::default();
    let mut elapsed = false;

    for attribute in &message.attributes {
        let (timeout, started) = match *attribute {
            MessageAttribute::AutoremoveTimeout { timeout, countdown_begin_time }
                if countdown_pending(countdown_begin_time) =>
            {
                let timeout = widen_timeout(timeout, duration);
                let started = MessageAttribute::AutoremoveTimeout {
                    timeout,
                    countdown_begin_time: Some(anchor),
                };
                (timeout, started)
            }
            MessageAttribute::AutoclearTimeout { timeout, countdown_begin_time }
                if countdown_pending(countdown_begin_time) =>
            {
                let timeout = widen_timeout(timeout, duration);
                let started = MessageAttribute::AutoclearTimeout {
                    timeout,
                    countdown_begin_time: Some(anchor),
                };
                (timeout, started)
            }
            _ => continue,
        };

        if let ExpiryCheck::Immediate { now } = check {
            elapsed |= !message.is_secret_chat() && is_elapsed(timeout, anchor, now);
        }
        result.timers.push(started);
    }

    if elapsed {
        debug!("Self-destruct timer on {} already elapsed, expiring media", message.id);
        result.expired_media = Some(expire_media(&message.media));
    }
    result
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use quill_types::ids::namespaces;
    use quill_types::models::{ExpiredContent, FileKind, FileMedia};
    use quill_types::{AttributeSet, MessageId, PeerId, PeerNamespace};

    fn file(kind: FileKind) -> Media {
        Media::File(FileMedia {
            id: 1,
            mime_type: "application/octet-stream".into(),
            size: Some(10),
            kind,
        })
    }

    fn message(peer: PeerNamespace, timer: MessageAttribute, media: Vec<Media>) -> Message {
        Message {
            id: MessageId::new(PeerId::new(peer, 1), namespaces::CLOUD, 1),
            globally_unique_id: Some(1),
            timestamp: 0,
            incoming: true,
            tags: BTreeSet::new(),
            forward_info: None,
            author_id: None,
            text: String::new(),
            attributes: AttributeSet::from(vec![timer]),
            media,
        }
    }

    #[test]
    fn widen_takes_the_longer_duration() {
        assert_eq!(widen_timeout(10, Some(25)), 25);
        assert_eq!(widen_timeout(30, Some(25)), 30);
        assert_eq!(widen_timeout(10, None), 10);
        assert_eq!(widen_timeout(VIEW_ONCE_TIMEOUT, Some(25)), VIEW_ONCE_TIMEOUT);
    }

    #[test]
    fn elapsed_handles_view_once_and_overflow() {
        assert!(is_elapsed(VIEW_ONCE_TIMEOUT, 100, 100));
        assert!(is_elapsed(10, 100, 110));
        assert!(!is_elapsed(10, 100, 109));
        assert!(!is_elapsed(i32::MAX - 1, i32::MAX - 5, i32::MAX));
    }

    #[test]
    fn expire_media_keeps_non_destructible_items() {
        let media = vec![
            Media::Image { id: 1 },
            file(FileKind::InstantVideo { duration: 5 }),
            file(FileKind::Voice { duration: 5 }),
            file(FileKind::Document),
            Media::WebPage { url: "https://example.org".into() },
        ];
        assert_eq!(
            expire_media(&media),
            vec![
                Media::Expired { content: ExpiredContent::Image },
                Media::Expired { content: ExpiredContent::VideoMessage },
                Media::Expired { content: ExpiredContent::VoiceMessage },
                Media::Expired { content: ExpiredContent::File },
                Media::WebPage { url: "https://example.org".into() },
            ]
        );
    }

    #[test]
    fn countdown_starts_once_and_widens_for_voice() {
        let timer = MessageAttribute::AutoremoveTimeout { timeout: 5, countdown_begin_time: None };
        let msg = message(PeerNamespace::User, timer, vec![file(FileKind::Voice { duration: 12 })]);

        let start = begin_countdown(&msg, 1000, ExpiryCheck::Deferred);
        assert_eq!(
            start.timers,
            vec![MessageAttribute::AutoremoveTimeout { timeout: 12, countdown_begin_time: Some(1000) }]
        );
        assert!(start.expired_media.is_none());

        let running = MessageAttribute::AutoremoveTimeout { timeout: 12, countdown_begin_time: Some(1000) };
        let msg = message(PeerNamespace::User, running, vec![file(FileKind::Voice { duration: 12 })]);
        assert!(!begin_countdown(&msg, 2000, ExpiryCheck::Deferred).started());
    }

    #[test]
    fn zero_begin_time_counts_as_unset() {
        let timer = MessageAttribute::AutoclearTimeout { timeout: 5, countdown_begin_time: Some(0) };
        let msg = message(PeerNamespace::User, timer, vec![Media::Image { id: 1 }]);
        assert!(begin_countdown(&msg, 50, ExpiryCheck::Deferred).started());
    }

    #[test]
    fn immediate_check_expires_past_consumption() {
        let timer = MessageAttribute::AutoremoveTimeout { timeout: 10, countdown_begin_time: None };
        let msg = message(PeerNamespace::User, timer, vec![Media::Image { id: 1 }]);

        let late = begin_countdown(&msg, 100, ExpiryCheck::Immediate { now: 200 });
        assert_eq!(late.expired_media, Some(vec![Media::Expired { content: ExpiredContent::Image }]));

        let fresh = begin_countdown(&msg, 195, ExpiryCheck::Immediate { now: 200 });
        assert!(fresh.started());
        assert!(fresh.expired_media.is_none());
    }

    #[test]
    fn secret_chats_never_expire_locally() {
        let timer = MessageAttribute::AutoclearTimeout { timeout: VIEW_ONCE_TIMEOUT, countdown_begin_time: None };
        let msg = message(PeerNamespace::SecretChat, timer, vec![Media::Image { id: 1 }]);
        let start = begin_countdown(&msg, 100, ExpiryCheck::Immediate { now: 100 });
        assert!(start.started());
        assert!(start.expired_media.is_none());
    }

    #[test]
    fn messages_without_secret_media_are_ignored() {
        let timer = MessageAttribute::AutoremoveTimeout { timeout: 10, countdown_begin_time: None };
        let msg = message(PeerNamespace::User, timer, vec![]);
        assert_eq!(begin_countdown(&msg, 100, ExpiryCheck::Immediate { now: 500 }), CountdownStart::default());
    }
}
