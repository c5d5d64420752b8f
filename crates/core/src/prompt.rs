//! Priming prompts that open a chat screen.
//!
//! These are sent to the oracle but never rendered as user turns; the system
//! instruction itself lives in `prompts/system_prompt.md` and is loaded by
//! the service at startup.

use crate::catalog::{ModuleDef, Track};

/// Opens a study session focused on one module.
pub fn study_priming_prompt(track: Track, module: &ModuleDef) -> String {
    format!(
        "I want to start a study session for **{}**, focusing on the **{}** category.",
        track.name(),
        module.name
    )
}

/// Opens a comprehensive mock test covering the whole track.
pub fn mock_test_priming_prompt(track: Track) -> String {
    format!(
        "I'm ready to start a mock test for the **{}** exam. Please begin.",
        track.name()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;

    #[test]
    fn study_prompt_names_track_and_module() {
        let module = catalog::module(Track::LeedV41, "water-efficiency").unwrap();
        let prompt = study_priming_prompt(Track::LeedV41, module);
        assert!(prompt.contains("LEED AP v4.1"));
        assert!(prompt.contains("Water Efficiency (WE)"));
    }

    #[test]
    fn mock_test_prompt_names_track() {
        let prompt = mock_test_priming_prompt(Track::Pmp);
        assert!(prompt.contains("mock test"));
        assert!(prompt.contains("**PMP**"));
    }
}
