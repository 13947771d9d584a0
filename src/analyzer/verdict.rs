//! Suspicion rules
//!
//! Four independent rules, evaluated in order. Any number can fire; each
//! firing marks the file suspicious and appends its reason(s).
//!
//! 1. **Extension mismatch**: the header matched something, but not the
//!    claimed extension.
//! 2. **No signature**: the header matched nothing at all.
//! 3. **Embedded file**: one reason per detection past offset 0. Offset 0 is
//!    the header itself and is already judged by rules 1 and 2.
//! 4. **High entropy**: content looks compressed, encrypted or packed.

use crate::signature::Detection;

/// Placeholder shown for a file without an extension
pub const NO_EXTENSION: &str = "(none)";

/// Everything the rules look at
#[derive(Debug, Clone, Copy)]
pub struct Evidence<'a> {
    /// Lower-cased extension without the dot, empty if the path has none
    pub extension: &'a str,
    pub detected: &'a [String],
    pub embedded: &'a [Detection],
    pub entropy: f64,
    pub entropy_threshold: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Verdict {
    pub suspicious: bool,
    pub reasons: Vec<String>,
}

impl Verdict {
    fn flag(&mut self, reason: String) {
        self.suspicious = true;
        self.reasons.push(reason);
    }
}

pub fn synthesize(evidence: &Evidence<'_>) -> Verdict {
    let mut verdict = Verdict::default();

    // Rule 1
    if !evidence.detected.is_empty() && !evidence.detected.iter().any(|d| d == evidence.extension) {
        let shown = if evidence.extension.is_empty() {
            NO_EXTENSION
        } else {
            evidence.extension
        };
        verdict.flag(format!(
            "Extension '{}' does not match detected type(s): {}",
            shown,
            label_list(evidence.detected)
        ));
    }

    // Rule 2
    if evidence.detected.is_empty() {
        verdict.flag("No known file signature detected — possible obfuscation.".to_string());
    }

    // Rule 3
    for detection in evidence.embedded.iter().filter(|d| d.offset > 0) {
        verdict.flag(format!(
            "Embedded file detected: {} at offset {}",
            detection.label, detection.offset
        ));
    }

    // Rule 4
    if evidence.entropy > evidence.entropy_threshold {
        verdict.flag(format!(
            "High entropy ({:.2}) — likely encrypted or packed.",
            evidence.entropy
        ));
    }

    verdict
}

/// `['jpg', 'png']`
fn label_list(labels: &[String]) -> String {
    let quoted: Vec<String> = labels.iter().map(|l| format!("'{}'", l)).collect();
    format!("[{}]", quoted.join(", "))
}
