/// Reaction that answers "yes" to a confirmation.
pub const AFFIRM: &str = "✅";
/// Reaction that answers "no" to a confirmation.
pub const DENY: &str = "❌";

/// Ordered, duplicate-free set of allowed reaction emotes.
///
/// An empty set accepts any reaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmoteSet(Vec<String>);

impl EmoteSet {
    /// The set that accepts any reaction.
    pub fn any() -> Self {
        Self::default()
    }

    /// `{✅, ❌}`, in that order.
    pub fn confirmation() -> Self {
        Self::from_iter([AFFIRM, DENY])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, emote: &str) -> bool {
        self.0.iter().any(|e| e == emote)
    }

    /// Whether `emote` satisfies this set (always true for the empty set).
    pub fn accepts(&self, emote: &str) -> bool {
        self.is_empty() || self.contains(emote)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl<S: Into<String>> FromIterator<S> for EmoteSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut out: Vec<String> = Vec::new();
        for emote in iter {
            let emote = emote.into();
            if !out.contains(&emote) {
                out.push(emote);
            }
        }
        Self(out)
    }
}
