//! Message tables: error tiers, success phrases, complaint templates.

use rand::seq::IndexedRandom;

/// A `(threshold, message)` pair in the error-tier table.
#[derive(Debug, Clone, Copy)]
pub struct ErrorTier {
    /// Minimum error count for this tier to apply.
    pub threshold: u32,
    /// The message shown at this tier.
    pub message: &'static str,
}

/// The error-tier table, monotonically increasing by threshold.
pub const ERROR_TIERS: [ErrorTier; 5] = [
    ErrorTier {
        threshold: 1,
        message: "uh oh, that one's on you",
    },
    ErrorTier {
        threshold: 2,
        message: "two errors? things are getting shaky",
    },
    ErrorTier {
        threshold: 3,
        message: "THREE errors. deep breaths",
    },
    ErrorTier {
        threshold: 4,
        message: "this is a lot of red squiggles",
    },
    ErrorTier {
        threshold: 5,
        message: "WHAT IS HAPPENING IN HERE",
    },
];

/// Celebratory phrases shown on a fresh commit.
const SUCCESS_PHRASES: [&str; 2] = ["SHIP IT", "COMMIT OF THE YEAR"];

/// Complaint templates for long functions. `{name}` and `{lines}` are
/// interpolated by [`complaint_for`].
const COMPLAINT_TEMPLATES: [&str; 4] = [
    "\"{name}\" is {lines} lines?? go for a walk",
    "a {lines}-line \"{name}\"... who hurt you",
    "\"{name}\" at {lines} lines is a short story, not a function",
    "break up \"{name}\" please ({lines} lines is not okay)",
];

/// Returns the tier message for an error count.
///
/// Picks the message of the highest threshold not exceeding the count; a
/// count below every threshold (but still nonzero) gets the first tier's
/// message.
#[must_use]
pub fn error_message_for_count(error_count: u32) -> &'static str {
    let mut message = ERROR_TIERS[0].message;
    for tier in &ERROR_TIERS {
        if error_count >= tier.threshold {
            message = tier.message;
        }
    }
    message
}

/// Picks a success phrase uniformly at random.
#[must_use]
pub fn random_success_phrase() -> &'static str {
    SUCCESS_PHRASES
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(SUCCESS_PHRASES[0])
}

/// Renders a complaint about the longest offender, chosen uniformly among
/// the templates. When several functions qualify at once, one extra
/// candidate calls that out instead of naming the single offender.
#[must_use]
pub fn complaint_for(name: &str, lines: usize, offender_count: usize) -> String {
    let mut candidates: Vec<String> = COMPLAINT_TEMPLATES
        .iter()
        .map(|template| {
            template
                .replace("{name}", name)
                .replace("{lines}", &lines.to_string())
        })
        .collect();
    if offender_count > 1 {
        candidates.push(format!(
            "found {offender_count} long functions... we need to talk"
        ));
    } else {
        candidates.push(format!("{lines} lines in one function?? be serious"));
    }
    candidates
        .choose(&mut rand::rng())
        .cloned()
        .unwrap_or_else(|| candidates[0].clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(1, "uh oh, that one's on you" ; "first tier")]
    #[test_case(2, "two errors? things are getting shaky" ; "second tier")]
    #[test_case(3, "THREE errors. deep breaths" ; "third tier")]
    #[test_case(5, "WHAT IS HAPPENING IN HERE" ; "top tier")]
    #[test_case(50, "WHAT IS HAPPENING IN HERE" ; "clamped to top tier")]
    fn test_tier_selection(count: u32, expected: &str) {
        assert_eq!(error_message_for_count(count), expected);
    }

    #[test]
    fn test_tiers_monotonically_increasing() {
        for window in ERROR_TIERS.windows(2) {
            assert!(window[0].threshold < window[1].threshold);
        }
    }

    #[test]
    fn test_complaint_interpolates_offender() {
        for _ in 0..32 {
            let complaint = complaint_for("handle_everything", 42, 1);
            assert!(complaint.contains("42"));
        }
    }

    #[test]
    fn test_multi_offender_candidate_mentions_count() {
        let seen_multi = (0..256)
            .map(|_| complaint_for("f", 11, 3))
            .any(|c| c.contains("3 long functions"));
        assert!(seen_multi, "multi-offender template never selected");
    }
}
