//! Name-uniqueness service.

use crate::base::constants::FALLBACK_PROFILE_NAME;

/// Produces container names/ids that collide with nothing already registered.
pub trait UniqueNames {
    /// True if any container uses `candidate` as its id or its name.
    fn is_name_taken(&self, candidate: &str) -> bool;

    /// Make `candidate` unique.
    ///
    /// `*` characters and a trailing ` #N` counter are stripped first, so
    /// renaming "Fine #2" again yields "Fine #3" rather than "Fine #2 #2".
    /// Blank input becomes "Profile".
    fn unique_name(&self, candidate: &str) -> String {
        let cleaned = candidate.replace('*', "");
        let mut base = strip_number_suffix(cleaned.trim()).to_string();
        if base.is_empty() {
            base = FALLBACK_PROFILE_NAME.to_string();
        }

        let mut unique = base.clone();
        let mut counter = 1;
        while self.is_name_taken(&unique) {
            counter += 1;
            unique = format!("{base} #{counter}");
        }
        unique
    }
}

/// Remove a trailing `#N` counter (and the whitespace before it).
pub fn strip_number_suffix(name: &str) -> &str {
    let Some(hash) = name.rfind('#') else {
        return name;
    };
    let digits = &name[hash + 1..];
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return name;
    }
    name[..hash].trim_end()
}
