use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub type SynthesisError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T> = std::result::Result<T, SynthesisError>;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Text-to-speech backend.
///
/// `synthesize` returns base64-encoded, headerless, mono 16-bit little-endian
/// PCM at 24 kHz. `Ok(None)` means the backend answered without audio.
///
/// # Object safety
///
/// The trait is object-safe via the explicit `BoxFuture` return type, so
/// callers can hold an `Arc<dyn SpeechSynthesizer>`.
pub trait SpeechSynthesizer: Send + Sync {
    fn synthesize<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Option<String>>>;
}

impl<T: SpeechSynthesizer + ?Sized> SpeechSynthesizer for Arc<T> {
    fn synthesize<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Option<String>>> {
        (**self).synthesize(text)
    }
}

impl<T: SpeechSynthesizer + ?Sized> SpeechSynthesizer for Box<T> {
    fn synthesize<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Option<String>>> {
        (**self).synthesize(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl SpeechSynthesizer for Echo {
        fn synthesize<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Option<String>>> {
            Box::pin(async move {
                if text.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(text.to_uppercase()))
                }
            })
        }
    }

    #[tokio::test]
    async fn usable_through_trait_objects() {
        let shared: Arc<dyn SpeechSynthesizer> = Arc::new(Echo);
        assert_eq!(shared.synthesize("ab").await.unwrap().as_deref(), Some("AB"));

        let boxed: Box<dyn SpeechSynthesizer> = Box::new(Echo);
        assert_eq!(boxed.synthesize("").await.unwrap(), None);
    }
}
