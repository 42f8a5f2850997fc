use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static LAST_STAMP: AtomicU64 = AtomicU64::new(0);

const DEFAULT_PREFIX: &str = "session";

pub fn unix_millis(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Claims a millisecond stamp strictly greater than any stamp handed out
/// before in this process.
fn claim_stamp(millis: u64) -> u64 {
    let mut current = LAST_STAMP.load(Ordering::Relaxed);
    loop {
        let next = millis.max(current + 1);
        match LAST_STAMP.compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Relaxed)
        {
            Ok(_) => return next,
            Err(actual) => current = actual,
        }
    }
}

/// Keeps `[A-Za-z0-9_-]`, replacing everything else with `_`.
pub fn sanitize_prefix(prefix: &str) -> String {
    let cleaned: String = prefix
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        DEFAULT_PREFIX.to_string()
    } else {
        cleaned
    }
}

/// `<prefix>_<purpose>_<unix-millis>.wav`, unique within the process.
pub fn destination_name(prefix: &str, purpose: &str, time: SystemTime) -> String {
    let stamp = claim_stamp(unix_millis(time));
    format!(
        "{}_{}_{}.wav",
        sanitize_prefix(prefix),
        sanitize_prefix(purpose),
        stamp
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::time::Duration;

    #[test]
    fn name_has_prefix_purpose_and_extension() {
        let name = destination_name("practice_Morning", "longform", SystemTime::now());
        assert!(name.starts_with("practice_Morning_longform_"));
        assert!(name.ends_with(".wav"));

        let stamp = name
            .trim_start_matches("practice_Morning_longform_")
            .trim_end_matches(".wav");
        assert!(stamp.parse::<u64>().is_ok());
    }

    #[test]
    fn prefix_is_reduced_to_safe_characters() {
        assert_eq!(sanitize_prefix("activation Jaguar/Ñ"), "activation_Jaguar__");
        assert_eq!(sanitize_prefix("  "), "session");
    }

    #[test]
    fn same_millisecond_names_do_not_collide() {
        let at = UNIX_EPOCH + Duration::from_millis(1_700_000_000_000);
        let names: HashSet<String> = (0..50)
            .map(|_| destination_name("session", "longform", at))
            .collect();
        assert_eq!(names.len(), 50);
    }

    #[test]
    fn concurrent_names_do_not_collide() {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                std::thread::spawn(|| {
                    (0..100)
                        .map(|_| destination_name("session", "longform", SystemTime::now()))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let names: HashSet<String> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        assert_eq!(names.len(), 800);
    }
}
