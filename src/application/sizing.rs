use crate::domain::ports::TextModelBox;
use std::fmt;
use tracing::warn;

/// Low temperature keeps the answer literal.
pub const SIZING_TEMPERATURE: f32 = 0.2;

pub const SIZING_FALLBACK: &str =
    "Unable to determine size automatically. Please check our manual dimensions.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageSize {
    Small,
    Medium,
    Large,
}

impl PackageSize {
    pub const ALL: [PackageSize; 3] = [PackageSize::Small, PackageSize::Medium, PackageSize::Large];

    /// Upper bounds in inches: length, width, height.
    pub fn max_dimensions(&self) -> (u32, u32, u32) {
        match self {
            PackageSize::Small => (8, 5, 2),
            PackageSize::Medium => (12, 9, 6),
            PackageSize::Large => (18, 12, 12),
        }
    }
}

impl fmt::Display for PackageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PackageSize::Small => "Small",
            PackageSize::Medium => "Medium",
            PackageSize::Large => "Large",
        };
        f.write_str(label)
    }
}

pub fn sizing_prompt(description: &str) -> String {
    let mut prompt = format!(
        "Determine which package size (Small, Medium, Large) fits best for: \"{}\".\n",
        description.trim()
    );
    for size in PackageSize::ALL {
        let (l, w, h) = size.max_dimensions();
        prompt.push_str(&format!("{}: up to {}x{}x{} inches.\n", size, l, w, h));
    }
    prompt.push_str("Return a brief recommendation.");
    prompt
}

/// Suggests a package size for a free-text item description.
pub struct SizingAdvisor {
    model: TextModelBox,
}

impl SizingAdvisor {
    pub fn new(model: TextModelBox) -> Self {
        Self { model }
    }

    /// The model's answer verbatim, or [`SIZING_FALLBACK`] if anything fails.
    pub async fn suggest(&self, description: &str) -> String {
        match self
            .model
            .generate(&sizing_prompt(description), SIZING_TEMPERATURE)
            .await
        {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                warn!("sizing model returned an empty answer");
                SIZING_FALLBACK.to_string()
            }
            Err(e) => {
                warn!(error = %e, "sizing model failed");
                SIZING_FALLBACK.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::TextModel;
    use crate::error::{CheckoutError, Result};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    struct Recording {
        reply: Option<String>,
        seen: Arc<Mutex<Vec<(String, f32)>>>,
    }

    #[async_trait]
    impl TextModel for Recording {
        async fn generate(&self, prompt: &str, temperature: f32) -> Result<String> {
            self.seen
                .lock()
                .unwrap()
                .push((prompt.to_string(), temperature));
            self.reply
                .clone()
                .ok_or_else(|| CheckoutError::ValidationError("quota exceeded".to_string()))
        }
    }

    #[test]
    fn test_prompt_lists_all_tiers() {
        let prompt = sizing_prompt("two paperback books");
        assert!(prompt.contains("\"two paperback books\""));
        assert!(prompt.contains("Small: up to 8x5x2 inches."));
        assert!(prompt.contains("Medium: up to 12x9x6 inches."));
        assert!(prompt.contains("Large: up to 18x12x12 inches."));
    }

    #[tokio::test]
    async fn test_returns_model_text_verbatim() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let advisor = SizingAdvisor::new(Box::new(Recording {
            reply: Some("Medium fits a pair of shoes.\n".to_string()),
            seen: seen.clone(),
        }));

        let answer = advisor.suggest("running shoes").await;
        assert_eq!(answer, "Medium fits a pair of shoes.\n");

        let calls = seen.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, SIZING_TEMPERATURE);
    }

    #[tokio::test]
    async fn test_falls_back_on_failure_or_silence() {
        let failing = SizingAdvisor::new(Box::new(Recording {
            reply: None,
            seen: Arc::default(),
        }));
        assert_eq!(failing.suggest("a lamp").await, SIZING_FALLBACK);

        let silent = SizingAdvisor::new(Box::new(Recording {
            reply: Some("  ".to_string()),
            seen: Arc::default(),
        }));
        assert_eq!(silent.suggest("a lamp").await, SIZING_FALLBACK);
    }
}
